//! The decision core for imported bank transactions: rule-based and
//! heuristic categorization, candidate matching against accounting records,
//! and reconciliation outcomes. Everything here is synchronous and operates
//! on record sets the caller has already fetched; persistence lives in
//! `lekha-storage`.

pub mod categorize;
pub mod heuristic;
pub mod matcher;
pub mod reconcile;
pub mod rules;

pub use categorize::{categorize, CategorizationOutcome, CategorizationResult};
pub use heuristic::{AccountRef, PartyRef};
pub use matcher::{
    find_match, ExpenseRecord, MatchCandidates, MatchResult, OpenBill, OpenInvoice, PaymentRecord,
};
pub use reconcile::{journal_entry_for_transaction, qualifying_match, AUTO_MATCH_THRESHOLD};
pub use rules::{
    draft_rule_from_description, CategorizationRule, RuleCondition, RuleDraft, RuleField,
    RuleOperator, RuleSet, TransactionView,
};
