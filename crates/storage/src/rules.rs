use sqlx::Row;

use lekha_core::{AccountId, CompanyId, PartyId};
use lekha_recon::{CategorizationRule, RuleCondition, RuleDraft};

use crate::db::DbPool;
use crate::error::StorageError;

/// All active rules for a company, highest priority first. Conditions are
/// stored as a JSON array in one column.
pub async fn get_active_rules(
    pool: &DbPool,
    company: CompanyId,
) -> Result<Vec<CategorizationRule>, StorageError> {
    let rows = sqlx::query(
        "SELECT id, priority, conditions, account_id, party_id, is_active, usage_count, last_used_at
         FROM categorization_rules
         WHERE company_id = ? AND is_active = 1
         ORDER BY priority DESC, id ASC",
    )
    .bind(company.0)
    .fetch_all(pool)
    .await?;

    rows.into_iter()
        .map(|r| {
            let conditions: Vec<RuleCondition> =
                serde_json::from_str(&r.get::<String, _>("conditions"))?;
            Ok(CategorizationRule {
                id: r.get("id"),
                company_id: company,
                priority: r.get("priority"),
                conditions,
                account_id: AccountId(r.get("account_id")),
                party_id: r.get::<Option<i64>, _>("party_id").map(PartyId),
                is_active: r.get::<i64, _>("is_active") != 0,
                usage_count: r.get("usage_count"),
                last_used_at: None,
            })
        })
        .collect()
}

pub async fn insert_rule(
    pool: &DbPool,
    company: CompanyId,
    draft: &RuleDraft,
) -> Result<i64, StorageError> {
    let conditions = serde_json::to_string(&draft.conditions)?;
    let id = sqlx::query(
        "INSERT INTO categorization_rules (company_id, priority, conditions, account_id, party_id)
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(company.0)
    .bind(draft.priority)
    .bind(conditions)
    .bind(draft.account_id.0)
    .bind(draft.party_id.map(|p| p.0))
    .execute(pool)
    .await?
    .last_insert_rowid();

    tracing::info!(rule_id = id, priority = draft.priority, "categorization rule created");
    Ok(id)
}

/// Next free priority slot: existing max + 1.
pub async fn next_rule_priority(pool: &DbPool, company: CompanyId) -> Result<i32, StorageError> {
    let max: Option<i32> =
        sqlx::query_scalar("SELECT MAX(priority) FROM categorization_rules WHERE company_id = ?")
            .bind(company.0)
            .fetch_one(pool)
            .await?;
    Ok(max.unwrap_or(0) + 1)
}

/// Usage bump when a rule fires. At-least-once: a lost update just
/// undercounts.
pub async fn bump_rule_usage(pool: &DbPool, rule_id: i64) -> Result<(), StorageError> {
    sqlx::query(
        "UPDATE categorization_rules
         SET usage_count = usage_count + 1, last_used_at = datetime('now')
         WHERE id = ?",
    )
    .bind(rule_id)
    .execute(pool)
    .await?;
    Ok(())
}
