use lekha_core::{
    journal_entry_number, AccountId, BankFeedTransaction, JournalLine, LedgerError, MatchKind,
    PostedEntry, UnpostedEntry,
};

use crate::matcher::MatchResult;

/// Matches at or above this confidence may be auto-applied; anything below
/// stays `pending` for a human.
pub const AUTO_MATCH_THRESHOLD: u8 = 85;

/// The entity to link when a match qualifies for auto-application, or
/// `None` when the transaction must stay pending.
pub fn qualifying_match(result: &MatchResult) -> Option<(MatchKind, i64)> {
    if result.confidence < AUTO_MATCH_THRESHOLD {
        return None;
    }
    match (result.kind, result.matched_id) {
        (Some(kind), Some(id)) => Some((kind, id)),
        _ => None,
    }
}

/// Build the balanced two-line journal entry for an unmatched transaction:
/// money in debits the bank ledger account and credits the target; money
/// out is the reverse. The caller supplies the allocated sequence number.
pub fn journal_entry_for_transaction(
    txn: &BankFeedTransaction,
    bank_ledger_account: AccountId,
    target_account: AccountId,
    fiscal_year_label: &str,
    sequence: i64,
) -> Result<PostedEntry, LedgerError> {
    let amount = txn.amount();
    let memo = Some(txn.description.clone());

    let lines = if txn.is_credit() {
        vec![
            JournalLine::debit(bank_ledger_account, amount, memo.clone()),
            JournalLine::credit(target_account, amount, memo),
        ]
    } else {
        vec![
            JournalLine::debit(target_account, amount, memo.clone()),
            JournalLine::credit(bank_ledger_account, amount, memo),
        ]
    };

    let entry = UnpostedEntry {
        company_id: txn.company_id,
        date: txn.transaction_date,
        narration: format!("Bank import: {}", txn.description),
        lines,
    };

    PostedEntry::validate(entry, journal_entry_number(fiscal_year_label, sequence))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use lekha_core::{BankAccountId, CompanyId, Money, ReconStatus};

    fn txn(debit: Option<&str>, credit: Option<&str>) -> BankFeedTransaction {
        BankFeedTransaction {
            id: 1,
            company_id: CompanyId(1),
            bank_account_id: BankAccountId(1),
            transaction_date: NaiveDate::from_ymd_opt(2024, 6, 15).unwrap(),
            description: "NEFT HDFC".to_string(),
            reference_number: None,
            debit_amount: debit.map(|s| s.parse().unwrap()),
            credit_amount: credit.map(|s| s.parse().unwrap()),
            running_balance: None,
            suggested_account_id: None,
            suggested_party_id: None,
            suggested_confidence: None,
            suggestion_source: None,
            status: ReconStatus::Pending,
            matched_entity: None,
            imported_at: None,
        }
    }

    fn result(kind: Option<MatchKind>, id: Option<i64>, confidence: u8) -> MatchResult {
        MatchResult {
            kind,
            matched_id: id,
            confidence,
            reason: String::new(),
        }
    }

    #[test]
    fn threshold_is_inclusive() {
        assert_eq!(
            qualifying_match(&result(Some(MatchKind::Invoice), Some(7), 85)),
            Some((MatchKind::Invoice, 7))
        );
    }

    #[test]
    fn sub_threshold_match_is_not_applied() {
        assert_eq!(qualifying_match(&result(Some(MatchKind::Invoice), Some(7), 80)), None);
    }

    #[test]
    fn null_match_never_qualifies() {
        assert_eq!(qualifying_match(&result(None, None, 100)), None);
    }

    #[test]
    fn credit_debits_bank_and_credits_target() {
        let entry = journal_entry_for_transaction(
            &txn(None, Some("5000.00")),
            AccountId(1),
            AccountId(40),
            "2024-25",
            3,
        )
        .unwrap();
        assert_eq!(entry.entry_number, "JV/2024-25/0003");
        assert_eq!(entry.lines.len(), 2);
        assert_eq!(entry.lines[0].account_id, AccountId(1));
        assert_eq!(entry.lines[0].debit.to_paise(), 500000);
        assert_eq!(entry.lines[1].account_id, AccountId(40));
        assert_eq!(entry.lines[1].credit.to_paise(), 500000);
        assert_eq!(entry.balanced_total, Money::from_paise(500000));
    }

    #[test]
    fn debit_reverses_the_legs() {
        let entry = journal_entry_for_transaction(
            &txn(Some("1200.00"), None),
            AccountId(1),
            AccountId(55),
            "2024-25",
            9,
        )
        .unwrap();
        assert_eq!(entry.lines[0].account_id, AccountId(55));
        assert_eq!(entry.lines[0].debit.to_paise(), 120000);
        assert_eq!(entry.lines[1].account_id, AccountId(1));
        assert_eq!(entry.lines[1].credit.to_paise(), 120000);
    }
}
