use sqlx::{sqlite::SqlitePoolOptions, Pool, Sqlite};
use std::path::Path;

use lekha_core::{BankAccountId, CompanyId, FiscalYear, DEFAULT_ACCOUNTS};

use crate::error::StorageError;

pub type DbPool = Pool<Sqlite>;

pub async fn create_db(path: &Path) -> Result<DbPool, StorageError> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect(&format!("sqlite:{}?mode=rwc", path.display()))
        .await?;

    sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;
    sqlx::query("PRAGMA foreign_keys = ON").execute(&pool).await?;
    sqlx::query("PRAGMA synchronous = NORMAL").execute(&pool).await?;
    sqlx::query("PRAGMA busy_timeout = 5000").execute(&pool).await?;

    run_migrations(&pool).await?;

    Ok(pool)
}

async fn run_migrations(pool: &DbPool) -> Result<(), StorageError> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS companies (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            gstin TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS chart_of_accounts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            company_id INTEGER NOT NULL REFERENCES companies(id),
            code TEXT NOT NULL,
            name TEXT NOT NULL,
            account_type TEXT NOT NULL,
            is_active INTEGER NOT NULL DEFAULT 1,
            UNIQUE (company_id, code)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS parties (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            company_id INTEGER NOT NULL REFERENCES companies(id),
            name TEXT NOT NULL,
            kind TEXT NOT NULL,
            default_account_id INTEGER REFERENCES chart_of_accounts(id),
            is_active INTEGER NOT NULL DEFAULT 1
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS bank_accounts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            company_id INTEGER NOT NULL REFERENCES companies(id),
            name TEXT NOT NULL,
            account_number TEXT,
            ledger_account_id INTEGER NOT NULL REFERENCES chart_of_accounts(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS fiscal_years (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            company_id INTEGER NOT NULL REFERENCES companies(id),
            start_date TEXT NOT NULL,
            end_date TEXT NOT NULL,
            is_locked INTEGER NOT NULL DEFAULT 0,
            UNIQUE (company_id, start_date)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS bank_feed_transactions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            company_id INTEGER NOT NULL REFERENCES companies(id),
            bank_account_id INTEGER NOT NULL REFERENCES bank_accounts(id),
            transaction_date TEXT NOT NULL,
            description TEXT NOT NULL,
            reference_number TEXT,
            debit_amount TEXT,
            credit_amount TEXT,
            running_balance TEXT,
            suggested_account_id INTEGER REFERENCES chart_of_accounts(id),
            suggested_party_id INTEGER REFERENCES parties(id),
            suggested_confidence INTEGER,
            suggestion_source TEXT,
            status TEXT NOT NULL DEFAULT 'pending',
            matched_entity_kind TEXT,
            matched_entity_id INTEGER,
            imported_at TEXT NOT NULL DEFAULT (datetime('now'))
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS categorization_rules (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            company_id INTEGER NOT NULL REFERENCES companies(id),
            priority INTEGER NOT NULL,
            conditions TEXT NOT NULL,
            account_id INTEGER NOT NULL REFERENCES chart_of_accounts(id),
            party_id INTEGER REFERENCES parties(id),
            is_active INTEGER NOT NULL DEFAULT 1,
            usage_count INTEGER NOT NULL DEFAULT 0,
            last_used_at TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS invoices (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            company_id INTEGER NOT NULL REFERENCES companies(id),
            invoice_number TEXT NOT NULL,
            party_id INTEGER REFERENCES parties(id),
            invoice_date TEXT NOT NULL,
            total_amount TEXT NOT NULL,
            balance_due TEXT NOT NULL,
            status TEXT NOT NULL,
            UNIQUE (company_id, invoice_number)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS bills (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            company_id INTEGER NOT NULL REFERENCES companies(id),
            bill_number TEXT NOT NULL,
            vendor_bill_number TEXT,
            party_id INTEGER REFERENCES parties(id),
            bill_date TEXT NOT NULL,
            total_amount TEXT NOT NULL,
            balance_due TEXT NOT NULL,
            status TEXT NOT NULL,
            UNIQUE (company_id, bill_number)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS payments_received (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            company_id INTEGER NOT NULL REFERENCES companies(id),
            party_id INTEGER REFERENCES parties(id),
            payment_date TEXT NOT NULL,
            amount TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS payments_made (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            company_id INTEGER NOT NULL REFERENCES companies(id),
            party_id INTEGER REFERENCES parties(id),
            payment_date TEXT NOT NULL,
            amount TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS expenses (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            company_id INTEGER NOT NULL REFERENCES companies(id),
            account_id INTEGER REFERENCES chart_of_accounts(id),
            expense_date TEXT NOT NULL,
            amount TEXT NOT NULL,
            description TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    // The UNIQUE constraint backs sequential entry-number allocation: a
    // concurrent allocation of the same number fails the insert instead of
    // silently duplicating.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS journal_entries (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            company_id INTEGER NOT NULL REFERENCES companies(id),
            entry_number TEXT NOT NULL,
            entry_date TEXT NOT NULL,
            narration TEXT NOT NULL,
            balanced_total TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE (company_id, entry_number)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS journal_entry_lines (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            journal_entry_id INTEGER NOT NULL REFERENCES journal_entries(id) ON DELETE CASCADE,
            account_id INTEGER NOT NULL REFERENCES chart_of_accounts(id),
            debit TEXT NOT NULL DEFAULT '0.00',
            credit TEXT NOT NULL DEFAULT '0.00',
            memo TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn create_company(pool: &DbPool, name: &str) -> Result<CompanyId, StorageError> {
    let id = sqlx::query("INSERT INTO companies (name) VALUES (?)")
        .bind(name)
        .execute(pool)
        .await?
        .last_insert_rowid();
    Ok(CompanyId(id))
}

pub async fn seed_default_accounts(pool: &DbPool, company: CompanyId) -> Result<(), StorageError> {
    for (code, name, account_type) in DEFAULT_ACCOUNTS {
        sqlx::query(
            "INSERT OR IGNORE INTO chart_of_accounts (company_id, code, name, account_type) VALUES (?, ?, ?, ?)",
        )
        .bind(company.0)
        .bind(code)
        .bind(name)
        .bind(account_type.as_str())
        .execute(pool)
        .await?;
    }
    Ok(())
}

pub async fn create_fiscal_year(
    pool: &DbPool,
    company: CompanyId,
    fy: FiscalYear,
) -> Result<i64, StorageError> {
    let id = sqlx::query(
        "INSERT INTO fiscal_years (company_id, start_date, end_date) VALUES (?, ?, ?)",
    )
    .bind(company.0)
    .bind(fy.start_date().to_string())
    .bind(fy.end_date().to_string())
    .execute(pool)
    .await?
    .last_insert_rowid();
    Ok(id)
}

pub async fn create_bank_account(
    pool: &DbPool,
    company: CompanyId,
    name: &str,
    ledger_account_id: i64,
) -> Result<BankAccountId, StorageError> {
    let id = sqlx::query(
        "INSERT INTO bank_accounts (company_id, name, ledger_account_id) VALUES (?, ?, ?)",
    )
    .bind(company.0)
    .bind(name)
    .bind(ledger_account_id)
    .execute(pool)
    .await?
    .last_insert_rowid();
    Ok(BankAccountId(id))
}
