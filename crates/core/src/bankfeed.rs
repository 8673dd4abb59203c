use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::account::{AccountId, BankAccountId, CompanyId, PartyId};
use super::money::Money;

/// Where a suggested categorization came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CategorizationSource {
    Rule,
    Ml,
    Manual,
}

impl CategorizationSource {
    pub fn as_str(self) -> &'static str {
        match self {
            CategorizationSource::Rule => "rule",
            CategorizationSource::Ml => "ml",
            CategorizationSource::Manual => "manual",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "rule" => Some(CategorizationSource::Rule),
            "ml" => Some(CategorizationSource::Ml),
            "manual" => Some(CategorizationSource::Manual),
            _ => None,
        }
    }
}

/// Reconciliation lifecycle. `Pending` is the only non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReconStatus {
    Pending,
    Matched,
    Created,
    Excluded,
}

impl ReconStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ReconStatus::Pending => "pending",
            ReconStatus::Matched => "matched",
            ReconStatus::Created => "created",
            ReconStatus::Excluded => "excluded",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(ReconStatus::Pending),
            "matched" => Some(ReconStatus::Matched),
            "created" => Some(ReconStatus::Created),
            "excluded" => Some(ReconStatus::Excluded),
            _ => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, ReconStatus::Pending)
    }

    pub fn can_transition_to(self, next: ReconStatus) -> bool {
        matches!(self, ReconStatus::Pending) && next.is_terminal()
    }
}

/// The kind of accounting record a bank-feed transaction was matched to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchKind {
    Invoice,
    Bill,
    PaymentReceived,
    PaymentMade,
    Expense,
    JournalEntry,
}

impl MatchKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MatchKind::Invoice => "invoice",
            MatchKind::Bill => "bill",
            MatchKind::PaymentReceived => "payment_received",
            MatchKind::PaymentMade => "payment_made",
            MatchKind::Expense => "expense",
            MatchKind::JournalEntry => "journal_entry",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "invoice" => Some(MatchKind::Invoice),
            "bill" => Some(MatchKind::Bill),
            "payment_received" => Some(MatchKind::PaymentReceived),
            "payment_made" => Some(MatchKind::PaymentMade),
            "expense" => Some(MatchKind::Expense),
            "journal_entry" => Some(MatchKind::JournalEntry),
            _ => None,
        }
    }
}

/// An imported bank statement line. The financial facts are immutable; the
/// suggestion and reconciliation fields are written back as the transaction
/// moves through categorize → match → reconcile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankFeedTransaction {
    pub id: i64,
    pub company_id: CompanyId,
    pub bank_account_id: BankAccountId,
    pub transaction_date: NaiveDate,
    pub description: String,
    pub reference_number: Option<String>,
    pub debit_amount: Option<Money>,
    pub credit_amount: Option<Money>,
    pub running_balance: Option<Money>,
    pub suggested_account_id: Option<AccountId>,
    pub suggested_party_id: Option<PartyId>,
    pub suggested_confidence: Option<u8>,
    pub suggestion_source: Option<CategorizationSource>,
    pub status: ReconStatus,
    pub matched_entity: Option<(MatchKind, i64)>,
    pub imported_at: Option<DateTime<Utc>>,
}

impl BankFeedTransaction {
    /// Money in (deposit) when a credit amount is present and positive.
    pub fn is_credit(&self) -> bool {
        self.credit_amount.map(Money::is_positive).unwrap_or(false)
    }

    /// Money out (withdrawal).
    pub fn is_debit(&self) -> bool {
        self.debit_amount.map(Money::is_positive).unwrap_or(false)
    }

    /// The magnitude used for amount comparisons: debit if present, else
    /// credit, else zero.
    pub fn amount(&self) -> Money {
        self.debit_amount
            .or(self.credit_amount)
            .unwrap_or_else(Money::zero)
    }

    /// Status/entity agreement: `matched` requires a matched entity,
    /// `created` requires a journal-entry link, the other states carry none.
    pub fn state_is_consistent(&self) -> bool {
        match self.status {
            ReconStatus::Matched => matches!(
                self.matched_entity,
                Some((kind, _)) if kind != MatchKind::JournalEntry
            ),
            ReconStatus::Created => {
                matches!(self.matched_entity, Some((MatchKind::JournalEntry, _)))
            }
            ReconStatus::Pending | ReconStatus::Excluded => self.matched_entity.is_none(),
        }
    }
}
