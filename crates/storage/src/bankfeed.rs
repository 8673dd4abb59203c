use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use lekha_core::{
    AccountId, BankAccountId, BankFeedTransaction, CategorizationSource, CompanyId, MatchKind,
    PartyId, ReconStatus,
};
use lekha_import::StatementRow;
use lekha_recon::CategorizationResult;

use crate::db::DbPool;
use crate::error::{parse_date, parse_money_opt, StorageError};

#[derive(Debug, Clone, Copy, Default)]
pub struct ImportSummary {
    pub imported: usize,
    pub duplicates: usize,
}

/// Columns written back onto a transaction row. Used by tests and the
/// service layer to keep updates in one place.
#[derive(Debug, Clone)]
pub enum TxnUpdate {
    Suggestion(CategorizationResult),
    Matched(MatchKind, i64),
    Created { journal_entry_id: i64 },
    Excluded,
}

fn row_to_txn(company: CompanyId, r: &SqliteRow) -> Result<BankFeedTransaction, StorageError> {
    let status = ReconStatus::parse(&r.get::<String, _>("status")).unwrap_or(ReconStatus::Pending);
    let matched_entity = match (
        r.get::<Option<String>, _>("matched_entity_kind"),
        r.get::<Option<i64>, _>("matched_entity_id"),
    ) {
        (Some(kind), Some(id)) => MatchKind::parse(&kind).map(|k| (k, id)),
        _ => None,
    };

    Ok(BankFeedTransaction {
        id: r.get("id"),
        company_id: company,
        bank_account_id: BankAccountId(r.get("bank_account_id")),
        transaction_date: parse_date(&r.get::<String, _>("transaction_date"))?,
        description: r.get("description"),
        reference_number: r.get("reference_number"),
        debit_amount: parse_money_opt(r.get::<Option<String>, _>("debit_amount").as_deref())?,
        credit_amount: parse_money_opt(r.get::<Option<String>, _>("credit_amount").as_deref())?,
        running_balance: parse_money_opt(r.get::<Option<String>, _>("running_balance").as_deref())?,
        suggested_account_id: r.get::<Option<i64>, _>("suggested_account_id").map(AccountId),
        suggested_party_id: r.get::<Option<i64>, _>("suggested_party_id").map(PartyId),
        suggested_confidence: r
            .get::<Option<i64>, _>("suggested_confidence")
            .map(|c| c.clamp(0, 100) as u8),
        suggestion_source: r
            .get::<Option<String>, _>("suggestion_source")
            .and_then(|s| CategorizationSource::parse(&s)),
        status,
        matched_entity,
        imported_at: None,
    })
}

const TXN_COLUMNS: &str = "id, bank_account_id, transaction_date, description, reference_number, \
    debit_amount, credit_amount, running_balance, suggested_account_id, suggested_party_id, \
    suggested_confidence, suggestion_source, status, matched_entity_kind, matched_entity_id";

pub async fn get_transaction(
    pool: &DbPool,
    company: CompanyId,
    id: i64,
) -> Result<BankFeedTransaction, StorageError> {
    let sql = format!("SELECT {TXN_COLUMNS} FROM bank_feed_transactions WHERE id = ? AND company_id = ?");
    let row = sqlx::query(&sql)
        .bind(id)
        .bind(company.0)
        .fetch_optional(pool)
        .await?
        .ok_or(StorageError::NotFound("bank feed transaction", id))?;
    row_to_txn(company, &row)
}

/// All transactions still awaiting reconciliation, optionally narrowed to an
/// explicit id set.
pub async fn get_pending_transactions(
    pool: &DbPool,
    company: CompanyId,
    ids: Option<&[i64]>,
) -> Result<Vec<BankFeedTransaction>, StorageError> {
    let sql = format!(
        "SELECT {TXN_COLUMNS} FROM bank_feed_transactions
         WHERE company_id = ? AND status = 'pending'
         ORDER BY transaction_date, id"
    );
    let rows = sqlx::query(&sql).bind(company.0).fetch_all(pool).await?;

    let mut txns = Vec::new();
    for row in rows {
        let txn = row_to_txn(company, &row)?;
        if let Some(ids) = ids {
            if !ids.contains(&txn.id) {
                continue;
            }
        }
        txns.push(txn);
    }
    Ok(txns)
}

/// Insert parsed statement rows. Duplicate detection is a best-effort
/// equality check on (bank account, date, description); a race between two
/// concurrent imports of the same file can still double-insert.
pub async fn insert_statement_rows(
    pool: &DbPool,
    company: CompanyId,
    bank_account: BankAccountId,
    rows: &[StatementRow],
) -> Result<ImportSummary, StorageError> {
    let mut summary = ImportSummary::default();

    for row in rows {
        let exists: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM bank_feed_transactions
             WHERE bank_account_id = ? AND transaction_date = ? AND description = ?",
        )
        .bind(bank_account.0)
        .bind(row.date.to_string())
        .bind(&row.description)
        .fetch_one(pool)
        .await?;

        if exists > 0 {
            summary.duplicates += 1;
            continue;
        }

        sqlx::query(
            "INSERT INTO bank_feed_transactions
             (company_id, bank_account_id, transaction_date, description, reference_number,
              debit_amount, credit_amount, running_balance)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(company.0)
        .bind(bank_account.0)
        .bind(row.date.to_string())
        .bind(&row.description)
        .bind(&row.reference)
        .bind(row.debit.map(|m| m.to_plain_string()))
        .bind(row.credit.map(|m| m.to_plain_string()))
        .bind(row.balance.map(|m| m.to_plain_string()))
        .execute(pool)
        .await?;
        summary.imported += 1;
    }

    tracing::info!(
        imported = summary.imported,
        duplicates = summary.duplicates,
        "statement import finished"
    );
    Ok(summary)
}

pub async fn save_suggestion(
    pool: &DbPool,
    txn_id: i64,
    result: &CategorizationResult,
) -> Result<(), StorageError> {
    sqlx::query(
        "UPDATE bank_feed_transactions
         SET suggested_account_id = ?, suggested_party_id = ?, suggested_confidence = ?,
             suggestion_source = ?
         WHERE id = ?",
    )
    .bind(result.account_id.map(|a| a.0))
    .bind(result.party_id.map(|p| p.0))
    .bind(result.confidence as i64)
    .bind(result.source.as_str())
    .bind(txn_id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Move a pending transaction into a terminal state. The `status =
/// 'pending'` guard makes terminal states sticky; touching a settled row is
/// reported as `NotPending`.
pub async fn apply_update(pool: &DbPool, txn_id: i64, update: &TxnUpdate) -> Result<(), StorageError> {
    let affected = match update {
        TxnUpdate::Suggestion(result) => {
            save_suggestion(pool, txn_id, result).await?;
            return Ok(());
        }
        TxnUpdate::Matched(kind, entity_id) => sqlx::query(
            "UPDATE bank_feed_transactions
             SET status = 'matched', matched_entity_kind = ?, matched_entity_id = ?
             WHERE id = ? AND status = 'pending'",
        )
        .bind(kind.as_str())
        .bind(entity_id)
        .bind(txn_id)
        .execute(pool)
        .await?
        .rows_affected(),
        TxnUpdate::Created { journal_entry_id } => sqlx::query(
            "UPDATE bank_feed_transactions
             SET status = 'created', matched_entity_kind = 'journal_entry', matched_entity_id = ?
             WHERE id = ? AND status = 'pending'",
        )
        .bind(journal_entry_id)
        .bind(txn_id)
        .execute(pool)
        .await?
        .rows_affected(),
        TxnUpdate::Excluded => sqlx::query(
            "UPDATE bank_feed_transactions
             SET status = 'excluded'
             WHERE id = ? AND status = 'pending'",
        )
        .bind(txn_id)
        .execute(pool)
        .await?
        .rows_affected(),
    };

    if affected == 0 {
        return Err(StorageError::NotPending(txn_id));
    }
    Ok(())
}
