use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

use lekha_core::Money;

/// One usable statement line. Debit/credit are positive magnitudes; the
/// running balance keeps its sign.
#[derive(Debug, Clone)]
pub struct StatementRow {
    pub date: NaiveDate,
    pub description: String,
    pub reference: Option<String>,
    pub debit: Option<Money>,
    pub credit: Option<Money>,
    pub balance: Option<Money>,
}

/// Column positions, either detected from the header row or supplied as a
/// format hint for headerless exports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatementColumns {
    pub date: usize,
    pub description: usize,
    pub debit: Option<usize>,
    pub credit: Option<usize>,
    pub balance: Option<usize>,
    pub reference: Option<usize>,
}

#[derive(Error, Debug)]
pub enum CsvError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("could not locate a header row with date and description columns")]
    NoHeader,
    #[error("no usable data rows")]
    NoDataRows,
}

const DATE_HEADERS: &[&str] = &["txn date", "transaction date", "value date", "date"];
const DESCRIPTION_HEADERS: &[&str] = &["description", "particulars", "narration"];
const DEBIT_HEADERS: &[&str] = &["debit", "withdrawal"];
const CREDIT_HEADERS: &[&str] = &["credit", "deposit"];
const BALANCE_HEADERS: &[&str] = &["balance"];
const REFERENCE_HEADERS: &[&str] = &["ref", "cheque", "chq", "utr"];

/// Bank exports disagree on date formats; these are the ones seen in the
/// wild from Indian banks.
const DATE_FORMATS: &[&str] = &["%d/%m/%Y", "%d-%m-%Y", "%Y-%m-%d", "%d %b %Y"];

/// How many leading rows to scan for a header. Statements often carry a
/// preamble (bank name, account holder, period) above the real table.
const HEADER_SCAN_ROWS: usize = 10;

fn header_position(cells: &[String], vocabulary: &[&str]) -> Option<usize> {
    cells.iter().position(|cell| {
        let cell = cell.to_lowercase();
        vocabulary.iter().any(|v| cell.contains(v))
    })
}

fn detect_columns(cells: &[String]) -> Option<StatementColumns> {
    let date = header_position(cells, DATE_HEADERS)?;
    let description = header_position(cells, DESCRIPTION_HEADERS)?;
    Some(StatementColumns {
        date,
        description,
        debit: header_position(cells, DEBIT_HEADERS),
        credit: header_position(cells, CREDIT_HEADERS),
        balance: header_position(cells, BALANCE_HEADERS),
        reference: header_position(cells, REFERENCE_HEADERS),
    })
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

/// Strip currency decoration and parse. Parenthesized values are negative.
/// Returns `None` for anything unparseable.
fn parse_amount(s: &str) -> Option<Money> {
    let s = s.trim();
    let (negative, s) = if s.starts_with('(') && s.ends_with(')') {
        (true, &s[1..s.len() - 1])
    } else {
        (false, s)
    };
    let cleaned = s
        .replace("₹", "")
        .replace("Rs.", "")
        .replace("INR", "")
        .replace([',', ' '], "");
    if cleaned.is_empty() {
        return None;
    }
    let mut dec = Decimal::from_str(&cleaned).ok()?;
    if negative {
        dec = -dec;
    }
    Some(Money::from_decimal(dec))
}

/// A debit/credit cell: only positive values count; zero and negative are
/// discarded.
fn parse_side(cells: &[String], col: Option<usize>) -> Option<Money> {
    let value = parse_amount(cells.get(col?)?)?;
    value.is_positive().then_some(value)
}

fn row_cells(record: &csv::StringRecord) -> Vec<String> {
    record.iter().map(|s| s.trim().to_string()).collect()
}

fn parse_row(cells: &[String], columns: &StatementColumns) -> Option<StatementRow> {
    let date = parse_date(cells.get(columns.date)?)?;
    let description = cells.get(columns.description)?.clone();
    if description.is_empty() {
        return None;
    }

    let debit = parse_side(cells, columns.debit);
    let credit = parse_side(cells, columns.credit);
    if debit.is_none() && credit.is_none() {
        return None;
    }

    let reference = columns
        .reference
        .and_then(|c| cells.get(c))
        .filter(|s| !s.is_empty())
        .cloned();
    let balance = columns.balance.and_then(|c| cells.get(c)).and_then(|s| parse_amount(s));

    Some(StatementRow {
        date,
        description,
        reference,
        debit,
        credit,
        balance,
    })
}

/// Parse a raw statement blob. Without a hint the header row is located by
/// vocabulary match within the first few rows; rows that fail to parse are
/// skipped rather than raised, matching how messy real statements are.
pub fn parse_statement(
    text: &str,
    hint: Option<&StatementColumns>,
) -> Result<Vec<StatementRow>, CsvError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut columns = hint.cloned();
    let mut rows = Vec::new();

    for (index, record) in reader.records().enumerate() {
        let record = record?;
        let cells = row_cells(&record);
        if cells.iter().all(|c| c.is_empty()) {
            continue;
        }

        match &columns {
            None => {
                if let Some(found) = detect_columns(&cells) {
                    columns = Some(found);
                } else if index + 1 >= HEADER_SCAN_ROWS {
                    return Err(CsvError::NoHeader);
                }
            }
            Some(cols) => {
                if let Some(row) = parse_row(&cells, cols) {
                    rows.push(row);
                }
            }
        }
    }

    if columns.is_none() {
        return Err(CsvError::NoHeader);
    }
    if rows.is_empty() {
        return Err(CsvError::NoDataRows);
    }
    Ok(rows)
}
