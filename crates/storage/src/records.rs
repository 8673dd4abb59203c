use chrono::NaiveDate;

use lekha_core::{AccountId, CompanyId, Money, PartyId, PartyKind};

use crate::db::DbPool;
use crate::error::StorageError;

/// Minimal writers for the accounting records the match finder searches.
/// Full invoice/bill lifecycle management lives elsewhere; reconciliation
/// only needs the rows to exist.

pub async fn insert_party(
    pool: &DbPool,
    company: CompanyId,
    name: &str,
    kind: PartyKind,
    default_account: Option<AccountId>,
) -> Result<PartyId, StorageError> {
    let id = sqlx::query(
        "INSERT INTO parties (company_id, name, kind, default_account_id) VALUES (?, ?, ?, ?)",
    )
    .bind(company.0)
    .bind(name)
    .bind(kind.as_str())
    .bind(default_account.map(|a| a.0))
    .execute(pool)
    .await?
    .last_insert_rowid();
    Ok(PartyId(id))
}

#[allow(clippy::too_many_arguments)]
pub async fn insert_invoice(
    pool: &DbPool,
    company: CompanyId,
    number: &str,
    party: Option<PartyId>,
    date: NaiveDate,
    total: Money,
    balance_due: Money,
    status: &str,
) -> Result<i64, StorageError> {
    let id = sqlx::query(
        "INSERT INTO invoices (company_id, invoice_number, party_id, invoice_date, total_amount, balance_due, status)
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(company.0)
    .bind(number)
    .bind(party.map(|p| p.0))
    .bind(date.to_string())
    .bind(total.to_plain_string())
    .bind(balance_due.to_plain_string())
    .bind(status)
    .execute(pool)
    .await?
    .last_insert_rowid();
    Ok(id)
}

#[allow(clippy::too_many_arguments)]
pub async fn insert_bill(
    pool: &DbPool,
    company: CompanyId,
    number: &str,
    vendor_bill_number: Option<&str>,
    party: Option<PartyId>,
    date: NaiveDate,
    total: Money,
    balance_due: Money,
    status: &str,
) -> Result<i64, StorageError> {
    let id = sqlx::query(
        "INSERT INTO bills (company_id, bill_number, vendor_bill_number, party_id, bill_date, total_amount, balance_due, status)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(company.0)
    .bind(number)
    .bind(vendor_bill_number)
    .bind(party.map(|p| p.0))
    .bind(date.to_string())
    .bind(total.to_plain_string())
    .bind(balance_due.to_plain_string())
    .bind(status)
    .execute(pool)
    .await?
    .last_insert_rowid();
    Ok(id)
}

pub async fn insert_payment_received(
    pool: &DbPool,
    company: CompanyId,
    party: Option<PartyId>,
    date: NaiveDate,
    amount: Money,
) -> Result<i64, StorageError> {
    let id = sqlx::query(
        "INSERT INTO payments_received (company_id, party_id, payment_date, amount) VALUES (?, ?, ?, ?)",
    )
    .bind(company.0)
    .bind(party.map(|p| p.0))
    .bind(date.to_string())
    .bind(amount.to_plain_string())
    .execute(pool)
    .await?
    .last_insert_rowid();
    Ok(id)
}

pub async fn insert_payment_made(
    pool: &DbPool,
    company: CompanyId,
    party: Option<PartyId>,
    date: NaiveDate,
    amount: Money,
) -> Result<i64, StorageError> {
    let id = sqlx::query(
        "INSERT INTO payments_made (company_id, party_id, payment_date, amount) VALUES (?, ?, ?, ?)",
    )
    .bind(company.0)
    .bind(party.map(|p| p.0))
    .bind(date.to_string())
    .bind(amount.to_plain_string())
    .execute(pool)
    .await?
    .last_insert_rowid();
    Ok(id)
}

pub async fn insert_expense(
    pool: &DbPool,
    company: CompanyId,
    account: Option<AccountId>,
    date: NaiveDate,
    amount: Money,
    description: Option<&str>,
) -> Result<i64, StorageError> {
    let id = sqlx::query(
        "INSERT INTO expenses (company_id, account_id, expense_date, amount, description) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(company.0)
    .bind(account.map(|a| a.0))
    .bind(date.to_string())
    .bind(amount.to_plain_string())
    .bind(description)
    .execute(pool)
    .await?
    .last_insert_rowid();
    Ok(id)
}
