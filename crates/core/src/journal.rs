use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::account::{AccountId, CompanyId};
use super::money::Money;

#[derive(Debug, Clone, Error)]
pub enum LedgerError {
    #[error("unbalanced entry: debits={0}, credits={1}")]
    Unbalanced(Money, Money),
    #[error("journal entry must have at least two lines")]
    EmptyEntry,
    #[error("account not found: {0}")]
    AccountNotFound(AccountId),
    #[error("fiscal year is locked")]
    LockedFiscalYear,
    #[error("no fiscal year covers {0}")]
    NoFiscalYear(NaiveDate),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalLine {
    pub account_id: AccountId,
    pub debit: Money,
    pub credit: Money,
    pub memo: Option<String>,
}

impl JournalLine {
    pub fn debit(account_id: AccountId, amount: Money, memo: Option<String>) -> Self {
        JournalLine {
            account_id,
            debit: amount,
            credit: Money::zero(),
            memo,
        }
    }

    pub fn credit(account_id: AccountId, amount: Money, memo: Option<String>) -> Self {
        JournalLine {
            account_id,
            debit: Money::zero(),
            credit: amount,
            memo,
        }
    }
}

/// A journal entry as assembled by callers, before balance validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnpostedEntry {
    pub company_id: CompanyId,
    pub date: NaiveDate,
    pub narration: String,
    pub lines: Vec<JournalLine>,
}

impl UnpostedEntry {
    pub fn total_debits(&self) -> Money {
        self.lines
            .iter()
            .map(|l| l.debit)
            .fold(Money::zero(), |a, b| a + b)
    }

    pub fn total_credits(&self) -> Money {
        self.lines
            .iter()
            .map(|l| l.credit)
            .fold(Money::zero(), |a, b| a + b)
    }
}

/// A balanced entry carrying its allocated document number, e.g.
/// `JV/2024-25/0007`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostedEntry {
    pub id: Option<i64>,
    pub company_id: CompanyId,
    pub entry_number: String,
    pub date: NaiveDate,
    pub narration: String,
    pub lines: Vec<JournalLine>,
    pub balanced_total: Money,
}

impl PostedEntry {
    pub fn validate(entry: UnpostedEntry, entry_number: String) -> Result<PostedEntry, LedgerError> {
        if entry.lines.len() < 2 {
            return Err(LedgerError::EmptyEntry);
        }

        let total_debits = entry.total_debits();
        let total_credits = entry.total_credits();
        if total_debits != total_credits {
            return Err(LedgerError::Unbalanced(total_debits, total_credits));
        }

        Ok(PostedEntry {
            id: None,
            company_id: entry.company_id,
            entry_number,
            date: entry.date,
            narration: entry.narration,
            lines: entry.lines,
            balanced_total: total_debits,
        })
    }
}

/// Document number for manually and automatically created journal vouchers.
pub fn journal_entry_number(fiscal_year_label: &str, sequence: i64) -> String {
    format!("JV/{fiscal_year_label}/{sequence:04}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: i64) -> AccountId {
        AccountId(n)
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn two_line(debit_id: AccountId, credit_id: AccountId, paise: i64) -> UnpostedEntry {
        UnpostedEntry {
            company_id: CompanyId(1),
            date: date(2024, 6, 15),
            narration: "Bank import".to_string(),
            lines: vec![
                JournalLine::debit(debit_id, Money::from_paise(paise), None),
                JournalLine::credit(credit_id, Money::from_paise(paise), None),
            ],
        }
    }

    #[test]
    fn validate_balanced_entry() {
        let entry = two_line(id(1), id(2), 500000);
        let posted = PostedEntry::validate(entry, "JV/2024-25/0001".into()).unwrap();
        assert_eq!(posted.balanced_total.to_paise(), 500000);
        assert_eq!(posted.entry_number, "JV/2024-25/0001");
    }

    #[test]
    fn validate_rejects_unbalanced() {
        let entry = UnpostedEntry {
            company_id: CompanyId(1),
            date: date(2024, 6, 15),
            narration: "Bad".to_string(),
            lines: vec![
                JournalLine::debit(id(1), Money::from_paise(500), None),
                JournalLine::credit(id(2), Money::from_paise(400), None),
            ],
        };
        assert!(matches!(
            PostedEntry::validate(entry, "JV/2024-25/0002".into()),
            Err(LedgerError::Unbalanced(_, _))
        ));
    }

    #[test]
    fn validate_rejects_single_line() {
        let entry = UnpostedEntry {
            company_id: CompanyId(1),
            date: date(2024, 6, 15),
            narration: "Single".to_string(),
            lines: vec![JournalLine::debit(id(1), Money::from_paise(500), None)],
        };
        assert!(matches!(
            PostedEntry::validate(entry, "JV/2024-25/0003".into()),
            Err(LedgerError::EmptyEntry)
        ));
    }

    #[test]
    fn entry_number_format() {
        assert_eq!(journal_entry_number("2024-25", 7), "JV/2024-25/0007");
        assert_eq!(journal_entry_number("2024-25", 12345), "JV/2024-25/12345");
    }
}
