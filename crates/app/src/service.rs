//! Orchestration over the decision core and storage: each operation loads
//! what the pure functions in `lekha-recon` need, runs them, and persists
//! the outcome. Bulk operations record per-item failures and keep going.

use std::path::Path;

use lekha_core::{AccountId, CompanyId, MatchKind, PartyId};
use lekha_import::{parse_ofx, parse_statement, CsvError, OfxError};
use lekha_recon::{
    categorize, draft_rule_from_description, find_match, qualifying_match, AccountRef,
    CategorizationOutcome, MatchResult, PartyRef, RuleSet, TransactionView,
};
use lekha_storage::{bankfeed, journal, lookups, rules, DbPool, ImportSummary, StorageError, TxnUpdate};

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Csv(#[from] CsvError),
    #[error(transparent)]
    Ofx(#[from] OfxError),
    #[error("transaction {0} has no suggested account; categorize it first or pass an account")]
    NoTargetAccount(i64),
    #[error("no usable keyword in the description of transaction {0}")]
    NoRuleKeyword(i64),
}

// ── Statement import ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementFormat {
    Csv,
    Ofx,
}

impl StatementFormat {
    /// Guess from the file extension; everything that is not OFX/QFX is
    /// treated as CSV, since that is what banks mostly export.
    pub fn guess(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("ofx") || ext.eq_ignore_ascii_case("qfx") => {
                StatementFormat::Ofx
            }
            _ => StatementFormat::Csv,
        }
    }
}

pub async fn import_statement(
    pool: &DbPool,
    company: CompanyId,
    bank_account: lekha_core::BankAccountId,
    text: &str,
    format: StatementFormat,
) -> Result<ImportSummary, ServiceError> {
    let rows = match format {
        StatementFormat::Csv => parse_statement(text, None)?,
        StatementFormat::Ofx => parse_ofx(text)?.to_rows(),
    };
    let summary = bankfeed::insert_statement_rows(pool, company, bank_account, &rows).await?;
    Ok(summary)
}

// ── Categorization ───────────────────────────────────────────────────────

struct CategorizationContext {
    rule_set: RuleSet,
    accounts: Vec<AccountRef>,
    parties: Vec<PartyRef>,
}

impl CategorizationContext {
    async fn load(pool: &DbPool, company: CompanyId) -> Result<Self, StorageError> {
        Ok(CategorizationContext {
            rule_set: RuleSet::new(rules::get_active_rules(pool, company).await?),
            accounts: lookups::get_active_account_refs(pool, company).await?,
            parties: lookups::get_active_party_refs(pool, company).await?,
        })
    }
}

async fn categorize_one(
    pool: &DbPool,
    ctx: &CategorizationContext,
    txn: &lekha_core::BankFeedTransaction,
) -> Result<CategorizationOutcome, StorageError> {
    let outcome = categorize(
        &ctx.rule_set,
        &ctx.accounts,
        &ctx.parties,
        &TransactionView::of(txn),
    );
    bankfeed::save_suggestion(pool, txn.id, &outcome.result).await?;
    if let Some(rule_id) = outcome.fired_rule_id {
        rules::bump_rule_usage(pool, rule_id).await?;
    }
    Ok(outcome)
}

pub async fn categorize_transaction(
    pool: &DbPool,
    company: CompanyId,
    txn_id: i64,
) -> Result<CategorizationOutcome, ServiceError> {
    let txn = bankfeed::get_transaction(pool, company, txn_id).await?;
    let ctx = CategorizationContext::load(pool, company).await?;
    Ok(categorize_one(pool, &ctx, &txn).await?)
}

#[derive(Debug, Clone)]
pub struct ItemError {
    pub txn_id: i64,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct BulkCategorizeSummary {
    pub processed: usize,
    pub suggested: usize,
    pub errors: Vec<ItemError>,
}

/// Categorize every pending transaction (or the given subset). One bad row
/// never aborts the batch; its error is captured and the loop continues.
pub async fn bulk_categorize(
    pool: &DbPool,
    company: CompanyId,
    ids: Option<&[i64]>,
) -> Result<BulkCategorizeSummary, ServiceError> {
    let ctx = CategorizationContext::load(pool, company).await?;
    let pending = bankfeed::get_pending_transactions(pool, company, ids).await?;

    let mut summary = BulkCategorizeSummary::default();
    for txn in &pending {
        summary.processed += 1;
        match categorize_one(pool, &ctx, txn).await {
            Ok(outcome) if outcome.result.account_id.is_some() => summary.suggested += 1,
            Ok(_) => {}
            Err(e) => summary.errors.push(ItemError {
                txn_id: txn.id,
                message: e.to_string(),
            }),
        }
    }
    Ok(summary)
}

// ── Reconciliation ───────────────────────────────────────────────────────

/// Run the match finder without persisting anything.
pub async fn find_transaction_match(
    pool: &DbPool,
    company: CompanyId,
    txn_id: i64,
) -> Result<MatchResult, ServiceError> {
    let txn = bankfeed::get_transaction(pool, company, txn_id).await?;
    let candidates = lookups::fetch_match_candidates(pool, company, txn.transaction_date).await?;
    Ok(find_match(&txn, &candidates))
}

#[derive(Debug)]
pub enum ReconcileOutcome {
    Matched {
        kind: MatchKind,
        entity_id: i64,
        confidence: u8,
    },
    /// Best match fell below the auto-apply threshold; nothing was written.
    LeftPending(MatchResult),
}

pub async fn reconcile_transaction(
    pool: &DbPool,
    company: CompanyId,
    txn_id: i64,
) -> Result<ReconcileOutcome, ServiceError> {
    let txn = bankfeed::get_transaction(pool, company, txn_id).await?;
    let candidates = lookups::fetch_match_candidates(pool, company, txn.transaction_date).await?;
    let result = find_match(&txn, &candidates);

    match qualifying_match(&result) {
        Some((kind, entity_id)) => {
            bankfeed::apply_update(pool, txn_id, &TxnUpdate::Matched(kind, entity_id)).await?;
            tracing::info!(txn_id, ?kind, entity_id, confidence = result.confidence, "auto-matched");
            Ok(ReconcileOutcome::Matched {
                kind,
                entity_id,
                confidence: result.confidence,
            })
        }
        None => Ok(ReconcileOutcome::LeftPending(result)),
    }
}

pub async fn exclude_transaction(
    pool: &DbPool,
    company: CompanyId,
    txn_id: i64,
) -> Result<(), ServiceError> {
    // Ownership check before the write; apply_update itself is keyed by id.
    bankfeed::get_transaction(pool, company, txn_id).await?;
    bankfeed::apply_update(pool, txn_id, &TxnUpdate::Excluded).await?;
    Ok(())
}

#[derive(Debug, Clone)]
pub struct JournalEntryRef {
    pub id: i64,
    pub entry_number: String,
}

/// Create the balancing journal entry for a transaction with no counterpart
/// record. Target account falls back to the stored suggestion.
pub async fn create_journal_entry_from_transaction(
    pool: &DbPool,
    company: CompanyId,
    txn_id: i64,
    target: Option<AccountId>,
) -> Result<JournalEntryRef, ServiceError> {
    let txn = bankfeed::get_transaction(pool, company, txn_id).await?;
    let target = target
        .or(txn.suggested_account_id)
        .ok_or(ServiceError::NoTargetAccount(txn_id))?;

    let bank_ledger = lookups::get_bank_ledger_account(pool, company, txn.bank_account_id).await?;
    let fy = lookups::get_open_fiscal_year(pool, company, txn.transaction_date).await?;

    let (id, entry_number) = journal::post_bank_entry(pool, &txn, bank_ledger, target, &fy.label()).await?;
    Ok(JournalEntryRef { id, entry_number })
}

#[derive(Debug, Default)]
pub struct BulkReconcileSummary {
    pub processed: usize,
    pub matched: usize,
    pub suggested: usize,
    pub errors: Vec<ItemError>,
}

/// One pass over the pending queue: refresh each transaction's suggestion,
/// then auto-apply any qualifying match. Sub-threshold transactions keep
/// their suggestion and stay pending for review.
pub async fn bulk_auto_reconcile(
    pool: &DbPool,
    company: CompanyId,
    ids: Option<&[i64]>,
) -> Result<BulkReconcileSummary, ServiceError> {
    let ctx = CategorizationContext::load(pool, company).await?;
    let pending = bankfeed::get_pending_transactions(pool, company, ids).await?;

    let mut summary = BulkReconcileSummary::default();
    for txn in &pending {
        summary.processed += 1;
        let step = async {
            let outcome = categorize_one(pool, &ctx, txn).await?;
            let candidates =
                lookups::fetch_match_candidates(pool, company, txn.transaction_date).await?;
            let result = find_match(txn, &candidates);
            if let Some((kind, entity_id)) = qualifying_match(&result) {
                bankfeed::apply_update(pool, txn.id, &TxnUpdate::Matched(kind, entity_id)).await?;
                return Ok::<_, StorageError>((outcome, true));
            }
            Ok((outcome, false))
        };
        match step.await {
            Ok((outcome, matched)) => {
                if matched {
                    summary.matched += 1;
                } else if outcome.result.account_id.is_some() {
                    summary.suggested += 1;
                }
            }
            Err(e) => summary.errors.push(ItemError {
                txn_id: txn.id,
                message: e.to_string(),
            }),
        }
    }

    tracing::info!(
        processed = summary.processed,
        matched = summary.matched,
        suggested = summary.suggested,
        failed = summary.errors.len(),
        "auto-reconcile pass finished"
    );
    Ok(summary)
}

// ── Rule learning ────────────────────────────────────────────────────────

/// Learn a categorization rule from a manual decision on one transaction.
/// The new rule gets the highest priority so it wins over older rules.
pub async fn create_rule_from_transaction(
    pool: &DbPool,
    company: CompanyId,
    txn_id: i64,
    account: AccountId,
    party: Option<PartyId>,
) -> Result<i64, ServiceError> {
    let txn = bankfeed::get_transaction(pool, company, txn_id).await?;
    let next_priority = rules::next_rule_priority(pool, company).await?;

    let draft = draft_rule_from_description(&txn.description, account, party, next_priority - 1)
        .ok_or(ServiceError::NoRuleKeyword(txn_id))?;
    Ok(rules::insert_rule(pool, company, &draft).await?)
}

// ── Status ───────────────────────────────────────────────────────────────

#[derive(Debug, Default, Clone, Copy)]
pub struct StatusSummary {
    pub pending: usize,
    pub matched: usize,
    pub created: usize,
    pub excluded: usize,
}

pub async fn status_summary(
    pool: &DbPool,
    company: CompanyId,
) -> Result<StatusSummary, ServiceError> {
    let rows = sqlx::query_as::<_, (String, i64)>(
        "SELECT status, COUNT(*) FROM bank_feed_transactions WHERE company_id = ? GROUP BY status",
    )
    .bind(company.0)
    .fetch_all(pool)
    .await
    .map_err(StorageError::from)?;

    let mut summary = StatusSummary::default();
    for (status, count) in rows {
        let count = count as usize;
        match status.as_str() {
            "pending" => summary.pending = count,
            "matched" => summary.matched = count,
            "created" => summary.created = count,
            "excluded" => summary.excluded = count,
            _ => {}
        }
    }
    Ok(summary)
}
