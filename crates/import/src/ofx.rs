use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::str::FromStr;
use thiserror::Error;

use lekha_core::Money;

use crate::csv::StatementRow;

/// One `STMTTRN` block. The amount keeps the OFX sign convention:
/// positive is money in, negative is money out.
#[derive(Debug, Clone)]
pub struct OfxTransaction {
    pub fit_id: Option<String>,
    pub date: NaiveDate,
    pub amount: Money,
    pub name: Option<String>,
    pub memo: Option<String>,
}

#[derive(Debug, Clone)]
pub struct OfxStatement {
    pub account_id: Option<String>,
    pub currency: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub transactions: Vec<OfxTransaction>,
}

#[derive(Error, Debug)]
pub enum OfxError {
    #[error("no STMTTRN blocks found")]
    Empty,
}

impl OfxStatement {
    /// Convert to the same row shape the CSV importer produces, so both
    /// paths feed one insert routine.
    pub fn to_rows(&self) -> Vec<StatementRow> {
        self.transactions
            .iter()
            .map(|t| {
                let description = t
                    .name
                    .clone()
                    .or_else(|| t.memo.clone())
                    .unwrap_or_default();
                let magnitude = t.amount.abs();
                let (debit, credit) = if t.amount.is_positive() {
                    (None, Some(magnitude))
                } else {
                    (Some(magnitude), None)
                };
                StatementRow {
                    date: t.date,
                    description,
                    reference: t.fit_id.clone(),
                    debit,
                    credit,
                    balance: None,
                }
            })
            .collect()
    }
}

/// OFX dates are `YYYYMMDD` with optional time and timezone suffixes.
fn parse_ofx_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.len() < 8 {
        return None;
    }
    NaiveDate::parse_from_str(&s[..8], "%Y%m%d").ok()
}

#[derive(Default)]
struct PendingTxn {
    fit_id: Option<String>,
    date: Option<NaiveDate>,
    amount: Option<Money>,
    name: Option<String>,
    memo: Option<String>,
}

impl PendingTxn {
    fn finish(self) -> Option<OfxTransaction> {
        let date = self.date?;
        let amount = self.amount?;
        if amount.is_zero() {
            return None;
        }
        Some(OfxTransaction {
            fit_id: self.fit_id,
            date,
            amount,
            name: self.name,
            memo: self.memo,
        })
    }
}

/// Line-oriented SGML-style OFX parser. Only the statement fields the bank
/// feed needs are read; everything else is ignored. Transactions missing a
/// date or amount are dropped, mirroring the permissive CSV path.
pub fn parse_ofx(data: &str) -> Result<OfxStatement, OfxError> {
    let mut statement = OfxStatement {
        account_id: None,
        currency: None,
        start_date: None,
        end_date: None,
        transactions: Vec::new(),
    };
    let mut current: Option<PendingTxn> = None;

    for line in data.lines() {
        let line = line.trim();
        let Some(rest) = line.strip_prefix('<') else {
            continue;
        };
        let (tag, value) = match rest.split_once('>') {
            Some((tag, value)) => (tag.trim().to_uppercase(), value.trim()),
            None => (rest.trim_end_matches('>').trim().to_uppercase(), ""),
        };

        match tag.as_str() {
            "STMTTRN" => current = Some(PendingTxn::default()),
            "/STMTTRN" => {
                if let Some(txn) = current.take().and_then(PendingTxn::finish) {
                    statement.transactions.push(txn);
                }
            }
            "ACCTID" if !value.is_empty() => statement.account_id = Some(value.to_string()),
            "CURDEF" if !value.is_empty() => statement.currency = Some(value.to_string()),
            "DTSTART" => statement.start_date = parse_ofx_date(value),
            "DTEND" => statement.end_date = parse_ofx_date(value),
            "FITID" if !value.is_empty() => {
                if let Some(txn) = current.as_mut() {
                    txn.fit_id = Some(value.to_string());
                }
            }
            "DTPOSTED" => {
                if let Some(txn) = current.as_mut() {
                    txn.date = parse_ofx_date(value);
                }
            }
            "TRNAMT" => {
                if let Some(txn) = current.as_mut() {
                    txn.amount = Decimal::from_str(value).ok().map(Money::from_decimal);
                }
            }
            "NAME" if !value.is_empty() => {
                if let Some(txn) = current.as_mut() {
                    txn.name = Some(value.to_string());
                }
            }
            "MEMO" if !value.is_empty() => {
                if let Some(txn) = current.as_mut() {
                    txn.memo = Some(value.to_string());
                }
            }
            _ => {}
        }
    }

    if statement.transactions.is_empty() {
        return Err(OfxError::Empty);
    }
    Ok(statement)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
<OFX>
<BANKACCTFROM>
<ACCTID>50100123456789
</BANKACCTFROM>
<CURDEF>INR
<BANKTRANLIST>
<DTSTART>20240601
<DTEND>20240630
<STMTTRN>
<TRNTYPE>CREDIT
<DTPOSTED>20240615120000
<TRNAMT>5000.00
<FITID>UTR1001
<NAME>NEFT FROM ACME
</STMTTRN>
<STMTTRN>
<TRNTYPE>DEBIT
<DTPOSTED>20240616
<TRNAMT>-450.00
<FITID>UTR1002
<MEMO>UPI/SWIGGY
</STMTTRN>
</BANKTRANLIST>
</OFX>";

    #[test]
    fn parses_statement_fields() {
        let stmt = parse_ofx(SAMPLE).unwrap();
        assert_eq!(stmt.account_id.as_deref(), Some("50100123456789"));
        assert_eq!(stmt.currency.as_deref(), Some("INR"));
        assert_eq!(stmt.start_date.unwrap().to_string(), "2024-06-01");
        assert_eq!(stmt.transactions.len(), 2);
    }

    #[test]
    fn sign_maps_to_debit_or_credit_rows() {
        let rows = parse_ofx(SAMPLE).unwrap().to_rows();
        assert_eq!(rows[0].credit.unwrap().to_paise(), 500000);
        assert!(rows[0].debit.is_none());
        assert_eq!(rows[0].reference.as_deref(), Some("UTR1001"));
        assert_eq!(rows[0].description, "NEFT FROM ACME");

        assert_eq!(rows[1].debit.unwrap().to_paise(), 45000);
        assert!(rows[1].credit.is_none());
        assert_eq!(rows[1].description, "UPI/SWIGGY");
    }

    #[test]
    fn transactions_missing_amount_are_dropped() {
        let data = "\
<STMTTRN>
<DTPOSTED>20240616
<FITID>X1
</STMTTRN>
<STMTTRN>
<DTPOSTED>20240617
<TRNAMT>10.00
</STMTTRN>";
        let stmt = parse_ofx(data).unwrap();
        assert_eq!(stmt.transactions.len(), 1);
    }

    #[test]
    fn empty_input_errors() {
        assert!(matches!(parse_ofx("<OFX></OFX>"), Err(OfxError::Empty)));
    }
}
