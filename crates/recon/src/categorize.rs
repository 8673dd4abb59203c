use lekha_core::{AccountId, CategorizationSource, PartyId};

use crate::heuristic::{heuristic_categorize, AccountRef, PartyRef};
use crate::rules::{RuleSet, TransactionView};

/// Confidence assigned when a categorization rule fires.
pub const RULE_CONFIDENCE: u8 = 95;

/// The suggestion persisted onto a bank-feed transaction. A zero-confidence
/// `Manual` result means "uncategorized" — it is not an error.
#[derive(Debug, Clone, PartialEq)]
pub struct CategorizationResult {
    pub account_id: Option<AccountId>,
    pub party_id: Option<PartyId>,
    pub confidence: u8,
    pub source: CategorizationSource,
}

impl CategorizationResult {
    pub fn uncategorized() -> Self {
        CategorizationResult {
            account_id: None,
            party_id: None,
            confidence: 0,
            source: CategorizationSource::Manual,
        }
    }
}

/// Result plus the id of the rule that fired, so the caller can bump its
/// usage counter (at-least-once).
#[derive(Debug, Clone)]
pub struct CategorizationOutcome {
    pub result: CategorizationResult,
    pub fired_rule_id: Option<i64>,
}

/// Rules first, heuristics second, uncategorized last. A rule hit never
/// falls through to the heuristic pass.
pub fn categorize(
    rules: &RuleSet,
    accounts: &[AccountRef],
    parties: &[PartyRef],
    txn: &TransactionView<'_>,
) -> CategorizationOutcome {
    if let Some(rule) = rules.first_match(txn) {
        return CategorizationOutcome {
            result: CategorizationResult {
                account_id: Some(rule.account_id),
                party_id: rule.party_id,
                confidence: RULE_CONFIDENCE,
                source: CategorizationSource::Rule,
            },
            fired_rule_id: Some(rule.id),
        };
    }

    if let Some(hit) = heuristic_categorize(txn.description, accounts, parties) {
        return CategorizationOutcome {
            result: CategorizationResult {
                account_id: Some(hit.account_id),
                party_id: hit.party_id,
                confidence: hit.confidence,
                source: CategorizationSource::Ml,
            },
            fired_rule_id: None,
        };
    }

    CategorizationOutcome {
        result: CategorizationResult::uncategorized(),
        fired_rule_id: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{CategorizationRule, RuleCondition, RuleField, RuleOperator};
    use lekha_core::CompanyId;

    fn rule_set(keyword: &str, account: i64) -> RuleSet {
        RuleSet::new(vec![CategorizationRule {
            id: 1,
            company_id: CompanyId(1),
            priority: 1,
            conditions: vec![RuleCondition {
                field: RuleField::Description,
                operator: RuleOperator::Contains,
                value: keyword.to_string(),
                case_sensitive: false,
            }],
            account_id: AccountId(account),
            party_id: None,
            is_active: true,
            usage_count: 0,
            last_used_at: None,
        }])
    }

    fn accounts() -> Vec<AccountRef> {
        vec![AccountRef {
            id: AccountId(50),
            name: "Sales".to_string(),
        }]
    }

    fn view(description: &'static str) -> TransactionView<'static> {
        TransactionView {
            description,
            reference_number: None,
            debit_amount: None,
            credit_amount: Some("100.00".parse().unwrap()),
        }
    }

    #[test]
    fn rule_hit_preempts_heuristics() {
        // "UPI" would heuristically resolve to Sales(50); the rule targets 7.
        let out = categorize(&rule_set("swiggy", 7), &accounts(), &[], &view("UPI/SWIGGY"));
        assert_eq!(out.result.source, CategorizationSource::Rule);
        assert_eq!(out.result.account_id, Some(AccountId(7)));
        assert_eq!(out.result.confidence, RULE_CONFIDENCE);
        assert_eq!(out.fired_rule_id, Some(1));
    }

    #[test]
    fn heuristic_used_when_no_rule_matches() {
        let out = categorize(&rule_set("zomato", 7), &accounts(), &[], &view("UPI/SWIGGY"));
        assert_eq!(out.result.source, CategorizationSource::Ml);
        assert_eq!(out.result.account_id, Some(AccountId(50)));
        assert_eq!(out.fired_rule_id, None);
    }

    #[test]
    fn uncategorized_is_zero_confidence_manual() {
        let out = categorize(&RuleSet::new(vec![]), &[], &[], &view("OPAQUE NARRATION"));
        assert_eq!(out.result, CategorizationResult::uncategorized());
        assert_eq!(out.result.confidence, 0);
        assert_eq!(out.fired_rule_id, None);
    }

    #[test]
    fn categorize_is_idempotent_for_unchanged_inputs() {
        let rules = rule_set("swiggy", 7);
        let accounts = accounts();
        let a = categorize(&rules, &accounts, &[], &view("UPI/SWIGGY"));
        let b = categorize(&rules, &accounts, &[], &view("UPI/SWIGGY"));
        assert_eq!(a.result, b.result);
        assert_eq!(a.fired_rule_id, b.fired_rule_id);
    }
}
