use chrono::NaiveDate;

use lekha_core::{BankFeedTransaction, DateRange, MatchKind, Money};

pub const REFERENCE_CONFIDENCE: u8 = 95;
pub const BALANCE_DUE_CONFIDENCE: u8 = 90;
pub const PAYMENT_CONFIDENCE: u8 = 88;
pub const TOTAL_AMOUNT_CONFIDENCE: u8 = 85;
pub const EXPENSE_CONFIDENCE: u8 = 85;

/// Payments and expenses must fall within this many days of the bank
/// transaction, inclusive on both sides.
pub const PAYMENT_WINDOW_DAYS: i64 = 5;

/// An open invoice (status sent / partially_paid / overdue). Status
/// filtering happens at the query layer.
#[derive(Debug, Clone)]
pub struct OpenInvoice {
    pub id: i64,
    pub number: String,
    pub total_amount: Money,
    pub balance_due: Money,
}

#[derive(Debug, Clone)]
pub struct OpenBill {
    pub id: i64,
    pub number: String,
    pub vendor_bill_number: Option<String>,
    pub total_amount: Money,
    pub balance_due: Money,
}

/// A recorded payment (received or made) or expense.
#[derive(Debug, Clone)]
pub struct PaymentRecord {
    pub id: i64,
    pub date: NaiveDate,
    pub amount: Money,
}

#[derive(Debug, Clone)]
pub struct ExpenseRecord {
    pub id: i64,
    pub date: NaiveDate,
    pub amount: Money,
}

/// Everything the match finder searches, pre-fetched for one tenant.
#[derive(Debug, Clone, Default)]
pub struct MatchCandidates {
    pub invoices: Vec<OpenInvoice>,
    pub bills: Vec<OpenBill>,
    pub payments_received: Vec<PaymentRecord>,
    pub payments_made: Vec<PaymentRecord>,
    pub expenses: Vec<ExpenseRecord>,
}

/// Produced fresh on every attempt, never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
    pub kind: Option<MatchKind>,
    pub matched_id: Option<i64>,
    pub confidence: u8,
    pub reason: String,
}

impl MatchResult {
    pub fn none() -> Self {
        MatchResult {
            kind: None,
            matched_id: None,
            confidence: 0,
            reason: "no matching record found".to_string(),
        }
    }

    fn hit(kind: MatchKind, id: i64, confidence: u8, reason: String) -> Self {
        MatchResult {
            kind: Some(kind),
            matched_id: Some(id),
            confidence,
            reason,
        }
    }
}

fn reference_match(reference: &str, candidates: &MatchCandidates) -> Option<MatchResult> {
    let needle = reference.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }

    for inv in &candidates.invoices {
        if inv.number.to_lowercase().contains(&needle) {
            return Some(MatchResult::hit(
                MatchKind::Invoice,
                inv.id,
                REFERENCE_CONFIDENCE,
                format!("reference '{reference}' found in invoice {}", inv.number),
            ));
        }
    }

    for bill in &candidates.bills {
        let in_number = bill.number.to_lowercase().contains(&needle);
        let in_vendor_number = bill
            .vendor_bill_number
            .as_deref()
            .map(|n| n.to_lowercase().contains(&needle))
            .unwrap_or(false);
        if in_number || in_vendor_number {
            return Some(MatchResult::hit(
                MatchKind::Bill,
                bill.id,
                REFERENCE_CONFIDENCE,
                format!("reference '{reference}' found in bill {}", bill.number),
            ));
        }
    }

    None
}

fn credit_match(amount: Money, date: NaiveDate, candidates: &MatchCandidates) -> Option<MatchResult> {
    for inv in &candidates.invoices {
        if amount.approx_eq(inv.balance_due) {
            return Some(MatchResult::hit(
                MatchKind::Invoice,
                inv.id,
                BALANCE_DUE_CONFIDENCE,
                format!("amount equals balance due of invoice {}", inv.number),
            ));
        }
    }

    for inv in &candidates.invoices {
        if amount.approx_eq(inv.total_amount) {
            return Some(MatchResult::hit(
                MatchKind::Invoice,
                inv.id,
                TOTAL_AMOUNT_CONFIDENCE,
                format!("amount equals total of invoice {}", inv.number),
            ));
        }
    }

    let window = DateRange::around(date, PAYMENT_WINDOW_DAYS);
    for pay in &candidates.payments_received {
        if window.contains(pay.date) && amount.approx_eq(pay.amount) {
            return Some(MatchResult::hit(
                MatchKind::PaymentReceived,
                pay.id,
                PAYMENT_CONFIDENCE,
                format!("payment received of {amount} within {PAYMENT_WINDOW_DAYS} days"),
            ));
        }
    }

    None
}

fn debit_match(amount: Money, date: NaiveDate, candidates: &MatchCandidates) -> Option<MatchResult> {
    for bill in &candidates.bills {
        if amount.approx_eq(bill.balance_due) {
            return Some(MatchResult::hit(
                MatchKind::Bill,
                bill.id,
                BALANCE_DUE_CONFIDENCE,
                format!("amount equals balance due of bill {}", bill.number),
            ));
        }
    }

    for bill in &candidates.bills {
        if amount.approx_eq(bill.total_amount) {
            return Some(MatchResult::hit(
                MatchKind::Bill,
                bill.id,
                TOTAL_AMOUNT_CONFIDENCE,
                format!("amount equals total of bill {}", bill.number),
            ));
        }
    }

    let window = DateRange::around(date, PAYMENT_WINDOW_DAYS);
    for pay in &candidates.payments_made {
        if window.contains(pay.date) && amount.approx_eq(pay.amount) {
            return Some(MatchResult::hit(
                MatchKind::PaymentMade,
                pay.id,
                PAYMENT_CONFIDENCE,
                format!("payment made of {amount} within {PAYMENT_WINDOW_DAYS} days"),
            ));
        }
    }

    for exp in &candidates.expenses {
        if window.contains(exp.date) && amount.approx_eq(exp.amount) {
            return Some(MatchResult::hit(
                MatchKind::Expense,
                exp.id,
                EXPENSE_CONFIDENCE,
                format!("expense of {amount} within {PAYMENT_WINDOW_DAYS} days"),
            ));
        }
    }

    None
}

/// Deterministic, priority-ordered search: reference substring first, then
/// exact-amount matches by direction. First hit wins; no partial or split
/// matching across records.
pub fn find_match(txn: &BankFeedTransaction, candidates: &MatchCandidates) -> MatchResult {
    if let Some(reference) = txn.reference_number.as_deref() {
        if let Some(result) = reference_match(reference, candidates) {
            return result;
        }
    }

    if txn.is_credit() {
        if let Some(result) = credit_match(txn.amount(), txn.transaction_date, candidates) {
            return result;
        }
    } else if txn.is_debit() {
        if let Some(result) = debit_match(txn.amount(), txn.transaction_date, candidates) {
            return result;
        }
    }

    MatchResult::none()
}
