use chrono::NaiveDate;
use thiserror::Error;

use lekha_core::{LedgerError, Money};

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
    #[error("stored amount is not a valid decimal: '{0}'")]
    BadAmount(String),
    #[error("stored date is not ISO: '{0}'")]
    BadDate(String),
    #[error("stored rule conditions are not valid JSON: {0}")]
    BadConditions(#[from] serde_json::Error),
    #[error("{0} not found: {1}")]
    NotFound(&'static str, i64),
    #[error("transaction {0} is not pending")]
    NotPending(i64),
    #[error("no unlocked fiscal year covers {0}")]
    NoOpenFiscalYear(NaiveDate),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

pub(crate) fn parse_money(s: &str) -> Result<Money, StorageError> {
    s.parse().map_err(|_| StorageError::BadAmount(s.to_string()))
}

pub(crate) fn parse_money_opt(s: Option<&str>) -> Result<Option<Money>, StorageError> {
    s.filter(|s| !s.is_empty()).map(parse_money).transpose()
}

pub(crate) fn parse_date(s: &str) -> Result<NaiveDate, StorageError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| StorageError::BadDate(s.to_string()))
}
