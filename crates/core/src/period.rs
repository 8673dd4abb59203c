use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::account::CompanyId;

/// An Indian fiscal year, April 1 through March 31. The stored value is the
/// calendar year the FY starts in, so `FiscalYear(2024)` is 2024-04-01 to
/// 2025-03-31 and labels itself "2024-25" for document numbering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiscalYear(pub u16);

impl fmt::Display for FiscalYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FiscalYear {
    pub fn new(start_year: u16) -> Self {
        FiscalYear(start_year)
    }

    /// The fiscal year containing `date`.
    pub fn containing(date: NaiveDate) -> Self {
        if date.month() >= 4 {
            FiscalYear(date.year() as u16)
        } else {
            FiscalYear(date.year() as u16 - 1)
        }
    }

    pub fn label(self) -> String {
        format!("{}-{:02}", self.0, (self.0 + 1) % 100)
    }

    pub fn start_date(self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.0 as i32, 4, 1).unwrap()
    }

    pub fn end_date(self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.0 as i32 + 1, 3, 31).unwrap()
    }

    pub fn range(self) -> DateRange {
        DateRange::new(self.start_date(), self.end_date())
    }
}

/// A fiscal year as stored per company. Journal entries may only be posted
/// into an unlocked year.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FiscalYearRecord {
    pub id: i64,
    pub company_id: CompanyId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub is_locked: bool,
}

impl FiscalYearRecord {
    pub fn label(&self) -> String {
        FiscalYear::containing(self.start_date).label()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        DateRange { start, end }
    }

    /// A window of `days` on either side of `anchor`, inclusive.
    pub fn around(anchor: NaiveDate, days: i64) -> Self {
        DateRange {
            start: anchor - chrono::Duration::days(days),
            end: anchor + chrono::Duration::days(days),
        }
    }

    pub fn contains(self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}
