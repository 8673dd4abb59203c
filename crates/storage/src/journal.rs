use lekha_core::{AccountId, BankFeedTransaction};
use lekha_recon::journal_entry_for_transaction;

use crate::db::DbPool;
use crate::error::StorageError;

/// Create the balancing journal entry for an unmatched bank transaction and
/// mark the transaction `created`, all inside one database transaction.
///
/// Sequence allocation is a read-then-insert; the enclosing transaction on
/// a single-connection pool serializes it, and the UNIQUE(company_id,
/// entry_number) constraint turns any remaining race into an insert error
/// rather than a duplicate number.
pub async fn post_bank_entry(
    pool: &DbPool,
    txn: &BankFeedTransaction,
    bank_ledger_account: AccountId,
    target_account: AccountId,
    fiscal_year_label: &str,
) -> Result<(i64, String), StorageError> {
    let mut db_txn = pool.begin().await?;

    let sequence: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) + 1 FROM journal_entries WHERE company_id = ? AND entry_number LIKE ?",
    )
    .bind(txn.company_id.0)
    .bind(format!("JV/{fiscal_year_label}/%"))
    .fetch_one(&mut *db_txn)
    .await?;

    let entry = journal_entry_for_transaction(
        txn,
        bank_ledger_account,
        target_account,
        fiscal_year_label,
        sequence,
    )?;

    let entry_id = sqlx::query(
        "INSERT INTO journal_entries (company_id, entry_number, entry_date, narration, balanced_total)
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(entry.company_id.0)
    .bind(&entry.entry_number)
    .bind(entry.date.to_string())
    .bind(&entry.narration)
    .bind(entry.balanced_total.to_plain_string())
    .execute(&mut *db_txn)
    .await?
    .last_insert_rowid();

    for line in &entry.lines {
        sqlx::query(
            "INSERT INTO journal_entry_lines (journal_entry_id, account_id, debit, credit, memo)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(entry_id)
        .bind(line.account_id.0)
        .bind(line.debit.to_plain_string())
        .bind(line.credit.to_plain_string())
        .bind(&line.memo)
        .execute(&mut *db_txn)
        .await?;
    }

    let affected = sqlx::query(
        "UPDATE bank_feed_transactions
         SET status = 'created', matched_entity_kind = 'journal_entry', matched_entity_id = ?
         WHERE id = ? AND status = 'pending'",
    )
    .bind(entry_id)
    .bind(txn.id)
    .execute(&mut *db_txn)
    .await?
    .rows_affected();

    if affected == 0 {
        db_txn.rollback().await?;
        return Err(StorageError::NotPending(txn.id));
    }

    db_txn.commit().await?;

    tracing::info!(
        txn_id = txn.id,
        entry_number = %entry.entry_number,
        "journal entry created from bank transaction"
    );
    Ok((entry_id, entry.entry_number))
}
