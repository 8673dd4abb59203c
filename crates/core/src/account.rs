use serde::{Deserialize, Serialize};
use std::fmt;

/// Tenant id. Every core row is scoped by one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CompanyId(pub i64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountId(pub i64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PartyId(pub i64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BankAccountId(pub i64);

impl fmt::Display for CompanyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for PartyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for BankAccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountType {
    Asset,
    Liability,
    Equity,
    Income,
    Expense,
}

impl AccountType {
    pub fn as_str(self) -> &'static str {
        match self {
            AccountType::Asset => "Asset",
            AccountType::Liability => "Liability",
            AccountType::Equity => "Equity",
            AccountType::Income => "Income",
            AccountType::Expense => "Expense",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Asset" => Some(AccountType::Asset),
            "Liability" => Some(AccountType::Liability),
            "Equity" => Some(AccountType::Equity),
            "Income" => Some(AccountType::Income),
            "Expense" => Some(AccountType::Expense),
            _ => None,
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A chart-of-accounts row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: Option<AccountId>,
    pub company_id: CompanyId,
    pub code: String,
    pub name: String,
    pub account_type: AccountType,
    pub is_active: bool,
}

impl Account {
    pub fn new(company_id: CompanyId, code: &str, name: &str, account_type: AccountType) -> Self {
        Account {
            id: None,
            company_id,
            code: code.to_string(),
            name: name.to_string(),
            account_type,
            is_active: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PartyKind {
    Customer,
    Vendor,
}

impl PartyKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PartyKind::Customer => "Customer",
            PartyKind::Vendor => "Vendor",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Customer" => Some(PartyKind::Customer),
            "Vendor" => Some(PartyKind::Vendor),
            _ => None,
        }
    }
}

/// A customer or vendor. The default account is where uncategorized
/// receipts/payments for this party land.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Party {
    pub id: Option<PartyId>,
    pub company_id: CompanyId,
    pub name: String,
    pub kind: PartyKind,
    pub default_account_id: Option<AccountId>,
    pub is_active: bool,
}

/// Seed chart for a new company. Heuristic categorization resolves its
/// account-name hints against these names.
pub const DEFAULT_ACCOUNTS: &[(&str, &str, AccountType)] = &[
    ("1000", "Bank", AccountType::Asset),
    ("1100", "Accounts Receivable", AccountType::Asset),
    ("1200", "TDS Receivable", AccountType::Asset),
    ("2000", "Accounts Payable", AccountType::Liability),
    ("2100", "GST Payable", AccountType::Liability),
    ("2110", "TDS Payable", AccountType::Liability),
    ("3000", "Owner's Capital", AccountType::Equity),
    ("4000", "Sales", AccountType::Income),
    ("4100", "Interest Income", AccountType::Income),
    ("4200", "Other Income", AccountType::Income),
    ("5000", "Purchases", AccountType::Expense),
    ("5100", "Salaries", AccountType::Expense),
    ("5200", "Rent", AccountType::Expense),
    ("5300", "Utilities", AccountType::Expense),
    ("5400", "Insurance", AccountType::Expense),
    ("5500", "Bank Charges", AccountType::Expense),
    ("5600", "Office Supplies", AccountType::Expense),
    ("5700", "Freight & Courier", AccountType::Expense),
    ("5900", "Miscellaneous Expenses", AccountType::Expense),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_type_round_trip() {
        for t in [
            AccountType::Asset,
            AccountType::Liability,
            AccountType::Equity,
            AccountType::Income,
            AccountType::Expense,
        ] {
            assert_eq!(AccountType::parse(t.as_str()), Some(t));
        }
        assert_eq!(AccountType::parse("Contra"), None);
    }

    #[test]
    fn default_chart_has_unique_codes() {
        let mut codes: Vec<_> = DEFAULT_ACCOUNTS.iter().map(|(c, _, _)| c).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), DEFAULT_ACCOUNTS.len());
    }

    #[test]
    fn default_chart_covers_heuristic_targets() {
        let names: Vec<_> = DEFAULT_ACCOUNTS.iter().map(|(_, n, _)| *n).collect();
        for hint in ["Sales", "Bank Charges", "Interest Income", "Salaries", "Rent"] {
            assert!(names.contains(&hint), "missing seed account {hint}");
        }
    }
}
