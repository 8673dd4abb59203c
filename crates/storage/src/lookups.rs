use chrono::NaiveDate;
use sqlx::Row;

use lekha_core::{AccountId, BankAccountId, CompanyId, DateRange, FiscalYearRecord, PartyId};
use lekha_recon::{
    AccountRef, ExpenseRecord, MatchCandidates, OpenBill, OpenInvoice, PartyRef, PaymentRecord,
};

use lekha_recon::matcher::PAYMENT_WINDOW_DAYS;

use crate::db::DbPool;
use crate::error::{parse_date, parse_money, StorageError};

pub async fn get_active_account_refs(
    pool: &DbPool,
    company: CompanyId,
) -> Result<Vec<AccountRef>, StorageError> {
    let rows = sqlx::query_as::<_, (i64, String)>(
        "SELECT id, name FROM chart_of_accounts WHERE company_id = ? AND is_active = 1 ORDER BY code",
    )
    .bind(company.0)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(id, name)| AccountRef {
            id: AccountId(id),
            name,
        })
        .collect())
}

pub async fn get_active_party_refs(
    pool: &DbPool,
    company: CompanyId,
) -> Result<Vec<PartyRef>, StorageError> {
    let rows = sqlx::query_as::<_, (i64, String, Option<i64>)>(
        "SELECT id, name, default_account_id FROM parties WHERE company_id = ? AND is_active = 1 ORDER BY id",
    )
    .bind(company.0)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(id, name, account)| PartyRef {
            id: PartyId(id),
            name,
            default_account_id: account.map(AccountId),
        })
        .collect())
}

pub async fn get_open_invoices(
    pool: &DbPool,
    company: CompanyId,
) -> Result<Vec<OpenInvoice>, StorageError> {
    let rows = sqlx::query_as::<_, (i64, String, String, String)>(
        "SELECT id, invoice_number, total_amount, balance_due
         FROM invoices
         WHERE company_id = ? AND status IN ('sent', 'partially_paid', 'overdue')
         ORDER BY invoice_date DESC, id DESC",
    )
    .bind(company.0)
    .fetch_all(pool)
    .await?;

    rows.into_iter()
        .map(|(id, number, total, due)| {
            Ok(OpenInvoice {
                id,
                number,
                total_amount: parse_money(&total)?,
                balance_due: parse_money(&due)?,
            })
        })
        .collect()
}

pub async fn get_open_bills(pool: &DbPool, company: CompanyId) -> Result<Vec<OpenBill>, StorageError> {
    let rows = sqlx::query_as::<_, (i64, String, Option<String>, String, String)>(
        "SELECT id, bill_number, vendor_bill_number, total_amount, balance_due
         FROM bills
         WHERE company_id = ? AND status IN ('open', 'partially_paid', 'overdue')
         ORDER BY bill_date DESC, id DESC",
    )
    .bind(company.0)
    .fetch_all(pool)
    .await?;

    rows.into_iter()
        .map(|(id, number, vendor_number, total, due)| {
            Ok(OpenBill {
                id,
                number,
                vendor_bill_number: vendor_number,
                total_amount: parse_money(&total)?,
                balance_due: parse_money(&due)?,
            })
        })
        .collect()
}

async fn payments_in_window(
    pool: &DbPool,
    company: CompanyId,
    table: &str,
    window: DateRange,
) -> Result<Vec<PaymentRecord>, StorageError> {
    let sql = format!(
        "SELECT id, payment_date, amount FROM {table}
         WHERE company_id = ? AND payment_date >= ? AND payment_date <= ?
         ORDER BY payment_date, id"
    );
    let rows = sqlx::query(&sql)
        .bind(company.0)
        .bind(window.start.to_string())
        .bind(window.end.to_string())
        .fetch_all(pool)
        .await?;

    rows.into_iter()
        .map(|r| {
            Ok(PaymentRecord {
                id: r.get("id"),
                date: parse_date(&r.get::<String, _>("payment_date"))?,
                amount: parse_money(&r.get::<String, _>("amount"))?,
            })
        })
        .collect()
}

pub async fn get_expenses_in_window(
    pool: &DbPool,
    company: CompanyId,
    window: DateRange,
) -> Result<Vec<ExpenseRecord>, StorageError> {
    let rows = sqlx::query(
        "SELECT id, expense_date, amount FROM expenses
         WHERE company_id = ? AND expense_date >= ? AND expense_date <= ?
         ORDER BY expense_date, id",
    )
    .bind(company.0)
    .bind(window.start.to_string())
    .bind(window.end.to_string())
    .fetch_all(pool)
    .await?;

    rows.into_iter()
        .map(|r| {
            Ok(ExpenseRecord {
                id: r.get("id"),
                date: parse_date(&r.get::<String, _>("expense_date"))?,
                amount: parse_money(&r.get::<String, _>("amount"))?,
            })
        })
        .collect()
}

/// Everything the match finder searches, fetched in one pass for a
/// transaction dated `anchor`.
pub async fn fetch_match_candidates(
    pool: &DbPool,
    company: CompanyId,
    anchor: NaiveDate,
) -> Result<MatchCandidates, StorageError> {
    let window = DateRange::around(anchor, PAYMENT_WINDOW_DAYS);
    Ok(MatchCandidates {
        invoices: get_open_invoices(pool, company).await?,
        bills: get_open_bills(pool, company).await?,
        payments_received: payments_in_window(pool, company, "payments_received", window).await?,
        payments_made: payments_in_window(pool, company, "payments_made", window).await?,
        expenses: get_expenses_in_window(pool, company, window).await?,
    })
}

/// The ledger account a bank account posts to.
pub async fn get_bank_ledger_account(
    pool: &DbPool,
    company: CompanyId,
    bank_account: BankAccountId,
) -> Result<AccountId, StorageError> {
    let row: Option<i64> = sqlx::query_scalar(
        "SELECT ledger_account_id FROM bank_accounts WHERE id = ? AND company_id = ?",
    )
    .bind(bank_account.0)
    .bind(company.0)
    .fetch_optional(pool)
    .await?;

    row.map(AccountId)
        .ok_or(StorageError::NotFound("bank account", bank_account.0))
}

/// The unlocked fiscal year covering `date`.
pub async fn get_open_fiscal_year(
    pool: &DbPool,
    company: CompanyId,
    date: NaiveDate,
) -> Result<FiscalYearRecord, StorageError> {
    let row = sqlx::query_as::<_, (i64, String, String)>(
        "SELECT id, start_date, end_date FROM fiscal_years
         WHERE company_id = ? AND is_locked = 0 AND start_date <= ? AND end_date >= ?",
    )
    .bind(company.0)
    .bind(date.to_string())
    .bind(date.to_string())
    .fetch_optional(pool)
    .await?;

    let (id, start, end) = row.ok_or(StorageError::NoOpenFiscalYear(date))?;
    Ok(FiscalYearRecord {
        id,
        company_id: company,
        start_date: parse_date(&start)?,
        end_date: parse_date(&end)?,
        is_locked: false,
    })
}
