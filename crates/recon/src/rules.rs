use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use lekha_core::{AccountId, BankFeedTransaction, CompanyId, Money, PartyId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleField {
    Description,
    ReferenceNumber,
    Amount,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleOperator {
    Contains,
    Equals,
    StartsWith,
    EndsWith,
    GreaterThan,
    LessThan,
}

/// One condition in a rule's AND-combined list. Case sensitivity applies to
/// string comparisons only and defaults to insensitive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleCondition {
    pub field: RuleField,
    pub operator: RuleOperator,
    pub value: String,
    #[serde(default)]
    pub case_sensitive: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategorizationRule {
    pub id: i64,
    pub company_id: CompanyId,
    pub priority: i32,
    pub conditions: Vec<RuleCondition>,
    pub account_id: AccountId,
    pub party_id: Option<PartyId>,
    pub is_active: bool,
    pub usage_count: i64,
    pub last_used_at: Option<DateTime<Utc>>,
}

/// The projection of a bank transaction that rules evaluate against.
#[derive(Debug, Clone, Copy)]
pub struct TransactionView<'a> {
    pub description: &'a str,
    pub reference_number: Option<&'a str>,
    pub debit_amount: Option<Money>,
    pub credit_amount: Option<Money>,
}

impl<'a> TransactionView<'a> {
    pub fn of(txn: &'a BankFeedTransaction) -> Self {
        TransactionView {
            description: &txn.description,
            reference_number: txn.reference_number.as_deref(),
            debit_amount: txn.debit_amount,
            credit_amount: txn.credit_amount,
        }
    }

    /// Debit if present, else credit, else zero.
    fn amount(&self) -> Money {
        self.debit_amount
            .or(self.credit_amount)
            .unwrap_or_else(Money::zero)
    }
}

fn string_condition_matches(cond: &RuleCondition, actual: &str) -> bool {
    let (actual, expected) = if cond.case_sensitive {
        (actual.to_string(), cond.value.clone())
    } else {
        (actual.to_lowercase(), cond.value.to_lowercase())
    };

    match cond.operator {
        RuleOperator::Contains => actual.contains(&expected),
        RuleOperator::Equals => actual == expected,
        RuleOperator::StartsWith => actual.starts_with(&expected),
        RuleOperator::EndsWith => actual.ends_with(&expected),
        // Numeric operators are meaningless on string fields.
        RuleOperator::GreaterThan | RuleOperator::LessThan => false,
    }
}

fn amount_condition_matches(cond: &RuleCondition, amount: Money) -> bool {
    let Ok(expected) = Decimal::from_str(cond.value.trim()) else {
        return false;
    };
    let expected = Money::from_decimal(expected);

    match cond.operator {
        RuleOperator::Equals => amount.approx_eq(expected),
        RuleOperator::GreaterThan => amount > expected,
        RuleOperator::LessThan => amount < expected,
        // String operators are meaningless on the amount field.
        _ => false,
    }
}

fn condition_matches(cond: &RuleCondition, txn: &TransactionView<'_>) -> bool {
    match cond.field {
        RuleField::Description => string_condition_matches(cond, txn.description),
        RuleField::ReferenceNumber => {
            string_condition_matches(cond, txn.reference_number.unwrap_or(""))
        }
        RuleField::Amount => amount_condition_matches(cond, txn.amount()),
    }
}

/// True iff every condition is satisfied. An empty condition list never
/// matches.
pub fn rule_matches(rule: &CategorizationRule, txn: &TransactionView<'_>) -> bool {
    !rule.conditions.is_empty() && rule.conditions.iter().all(|c| condition_matches(c, txn))
}

/// A company's active rules, held in descending priority order so the first
/// full match wins.
pub struct RuleSet {
    rules: Vec<CategorizationRule>,
}

impl RuleSet {
    pub fn new(rules: Vec<CategorizationRule>) -> Self {
        let mut rules: Vec<_> = rules.into_iter().filter(|r| r.is_active).collect();
        rules.sort_by(|a, b| b.priority.cmp(&a.priority));
        Self { rules }
    }

    pub fn first_match(&self, txn: &TransactionView<'_>) -> Option<&CategorizationRule> {
        self.rules.iter().find(|r| rule_matches(r, txn))
    }

    pub fn max_priority(&self) -> i32 {
        self.rules.iter().map(|r| r.priority).max().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Tokens too generic to anchor a learned rule on.
const STOP_WORDS: &[&str] = &[
    "the", "and", "for", "from", "with", "upi", "neft", "imps", "rtgs", "pos", "atm", "txn",
    "ref", "payment", "paid", "transfer", "pvt", "ltd", "india", "bank",
];

/// Keywords worth learning from a description: lowercased alphanumeric
/// tokens, minus stop words and anything shorter than three characters,
/// de-duplicated in order of appearance.
pub fn extract_keywords(description: &str) -> Vec<String> {
    let mut seen = Vec::new();
    for token in description
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
    {
        if token.len() < 3 || STOP_WORDS.contains(&token) {
            continue;
        }
        if !seen.iter().any(|s| s == token) {
            seen.push(token.to_string());
        }
    }
    seen
}

/// A learned rule before it has an id; persisted by the caller.
#[derive(Debug, Clone)]
pub struct RuleDraft {
    pub priority: i32,
    pub conditions: Vec<RuleCondition>,
    pub account_id: AccountId,
    pub party_id: Option<PartyId>,
}

/// Derive a single-condition `contains` rule from a manual categorization.
/// Returns `None` when no keyword survives extraction — not an error.
pub fn draft_rule_from_description(
    description: &str,
    account_id: AccountId,
    party_id: Option<PartyId>,
    max_existing_priority: i32,
) -> Option<RuleDraft> {
    let keyword = extract_keywords(description).into_iter().next()?;
    Some(RuleDraft {
        priority: max_existing_priority + 1,
        conditions: vec![RuleCondition {
            field: RuleField::Description,
            operator: RuleOperator::Contains,
            value: keyword,
            case_sensitive: false,
        }],
        account_id,
        party_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(description: &'static str, reference: Option<&'static str>, debit: Option<&str>, credit: Option<&str>) -> TransactionView<'static> {
        TransactionView {
            description,
            reference_number: reference,
            debit_amount: debit.map(|s| s.parse().unwrap()),
            credit_amount: credit.map(|s| s.parse().unwrap()),
        }
    }

    fn cond(field: RuleField, operator: RuleOperator, value: &str) -> RuleCondition {
        RuleCondition {
            field,
            operator,
            value: value.to_string(),
            case_sensitive: false,
        }
    }

    fn rule(priority: i32, conditions: Vec<RuleCondition>) -> CategorizationRule {
        CategorizationRule {
            id: priority as i64,
            company_id: CompanyId(1),
            priority,
            conditions,
            account_id: AccountId(10),
            party_id: None,
            is_active: true,
            usage_count: 0,
            last_used_at: None,
        }
    }

    #[test]
    fn contains_is_case_insensitive_by_default() {
        let r = rule(1, vec![cond(RuleField::Description, RuleOperator::Contains, "swiggy")]);
        assert!(rule_matches(&r, &view("UPI/SWIGGY/ORDER", None, Some("450.00"), None)));
    }

    #[test]
    fn case_sensitive_flag_is_honored() {
        let mut c = cond(RuleField::Description, RuleOperator::Contains, "swiggy");
        c.case_sensitive = true;
        let r = rule(1, vec![c]);
        assert!(!rule_matches(&r, &view("UPI/SWIGGY/ORDER", None, None, Some("450.00"))));
        assert!(rule_matches(&r, &view("upi/swiggy/order", None, None, Some("450.00"))));
    }

    #[test]
    fn all_conditions_must_hold() {
        let r = rule(
            1,
            vec![
                cond(RuleField::Description, RuleOperator::Contains, "rent"),
                cond(RuleField::Amount, RuleOperator::GreaterThan, "10000"),
            ],
        );
        assert!(rule_matches(&r, &view("RENT JUNE", None, Some("25000.00"), None)));
        assert!(!rule_matches(&r, &view("RENT JUNE", None, Some("5000.00"), None)));
        assert!(!rule_matches(&r, &view("GROCERIES", None, Some("25000.00"), None)));
    }

    #[test]
    fn removing_a_satisfied_condition_keeps_the_match() {
        // AND monotonicity: a passing rule still passes with fewer conditions.
        let t = view("RENT JUNE", None, Some("25000.00"), None);
        let full = rule(
            1,
            vec![
                cond(RuleField::Description, RuleOperator::Contains, "rent"),
                cond(RuleField::Amount, RuleOperator::GreaterThan, "10000"),
            ],
        );
        assert!(rule_matches(&full, &t));
        let reduced = rule(1, vec![cond(RuleField::Description, RuleOperator::Contains, "rent")]);
        assert!(rule_matches(&reduced, &t));
    }

    #[test]
    fn empty_condition_list_never_matches() {
        let r = rule(1, vec![]);
        assert!(!rule_matches(&r, &view("ANYTHING", None, Some("1.00"), None)));
    }

    #[test]
    fn malformed_numeric_value_fails_closed() {
        let r = rule(1, vec![cond(RuleField::Amount, RuleOperator::Equals, "not-a-number")]);
        assert!(!rule_matches(&r, &view("X", None, Some("100.00"), None)));
    }

    #[test]
    fn numeric_operator_on_string_field_fails_closed() {
        let r = rule(1, vec![cond(RuleField::Description, RuleOperator::GreaterThan, "100")]);
        assert!(!rule_matches(&r, &view("200", None, Some("100.00"), None)));
    }

    #[test]
    fn amount_uses_debit_then_credit() {
        let r = rule(1, vec![cond(RuleField::Amount, RuleOperator::Equals, "100.00")]);
        assert!(rule_matches(&r, &view("X", None, Some("100.00"), None)));
        assert!(rule_matches(&r, &view("X", None, None, Some("100.00"))));
        // Debit wins when both are present.
        assert!(!rule_matches(&r, &view("X", None, Some("50.00"), Some("100.00"))));
    }

    #[test]
    fn reference_field_with_no_reference_fails_contains() {
        let r = rule(1, vec![cond(RuleField::ReferenceNumber, RuleOperator::Contains, "1001")]);
        assert!(!rule_matches(&r, &view("X", None, Some("100.00"), None)));
        assert!(rule_matches(&r, &view("X", Some("UTR-1001"), Some("100.00"), None)));
    }

    #[test]
    fn highest_priority_rule_wins() {
        let low = rule(1, vec![cond(RuleField::Description, RuleOperator::Contains, "amazon")]);
        let mut high = rule(10, vec![cond(RuleField::Description, RuleOperator::Contains, "amazon")]);
        high.account_id = AccountId(99);
        let set = RuleSet::new(vec![low, high]);
        let hit = set.first_match(&view("AMAZON ORDER", None, Some("999.00"), None)).unwrap();
        assert_eq!(hit.account_id, AccountId(99));
    }

    #[test]
    fn inactive_rules_are_skipped() {
        let mut r = rule(5, vec![cond(RuleField::Description, RuleOperator::Contains, "amazon")]);
        r.is_active = false;
        let set = RuleSet::new(vec![r]);
        assert!(set.first_match(&view("AMAZON", None, Some("1.00"), None)).is_none());
        assert!(set.is_empty());
    }

    #[test]
    fn keyword_extraction_drops_noise() {
        let kws = extract_keywords("UPI/customer-paid-inv-1001");
        assert_eq!(kws, vec!["customer", "inv", "1001"]);
    }

    #[test]
    fn keyword_extraction_dedupes_in_order() {
        let kws = extract_keywords("SWIGGY ORDER swiggy order");
        assert_eq!(kws, vec!["swiggy", "order"]);
    }

    #[test]
    fn draft_rule_uses_first_keyword_and_next_priority() {
        let draft =
            draft_rule_from_description("UPI/SWIGGY/bangalore", AccountId(7), None, 12).unwrap();
        assert_eq!(draft.priority, 13);
        assert_eq!(draft.conditions.len(), 1);
        assert_eq!(draft.conditions[0].value, "swiggy");
        assert!(matches!(draft.conditions[0].operator, RuleOperator::Contains));
    }

    #[test]
    fn draft_rule_silently_declines_noise_only_descriptions() {
        assert!(draft_rule_from_description("UPI NEFT TXN", AccountId(7), None, 0).is_none());
    }

    #[test]
    fn conditions_survive_json_round_trip() {
        let c = cond(RuleField::ReferenceNumber, RuleOperator::StartsWith, "UTR");
        let json = serde_json::to_string(&vec![c]).unwrap();
        assert!(json.contains("reference_number"));
        assert!(json.contains("starts_with"));
        let back: Vec<RuleCondition> = serde_json::from_str(&json).unwrap();
        assert_eq!(back[0].value, "UTR");
        assert!(!back[0].case_sensitive);
    }
}
