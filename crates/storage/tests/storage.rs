use chrono::NaiveDate;

use lekha_core::{AccountId, CompanyId, FiscalYear, MatchKind, Money, ReconStatus};
use lekha_import::StatementRow;
use lekha_recon::{draft_rule_from_description, CategorizationResult};
use lekha_storage::{bankfeed, db, journal, lookups, rules, StorageError};

async fn setup() -> (tempfile::TempDir, db::DbPool, CompanyId) {
    let dir = tempfile::tempdir().unwrap();
    let pool = db::create_db(&dir.path().join("test.db")).await.unwrap();
    let company = db::create_company(&pool, "Test & Co").await.unwrap();
    db::seed_default_accounts(&pool, company).await.unwrap();
    (dir, pool, company)
}

fn row(date: (i32, u32, u32), description: &str, debit: Option<&str>, credit: Option<&str>) -> StatementRow {
    StatementRow {
        date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
        description: description.to_string(),
        reference: None,
        debit: debit.map(|s| s.parse().unwrap()),
        credit: credit.map(|s| s.parse().unwrap()),
        balance: None,
    }
}

#[tokio::test]
async fn import_skips_equal_date_account_description_rows() {
    let (_dir, pool, company) = setup().await;
    let accounts = lookups::get_active_account_refs(&pool, company).await.unwrap();
    let bank = db::create_bank_account(&pool, company, "HDFC Current", accounts[0].id.0)
        .await
        .unwrap();

    let rows = vec![
        row((2024, 6, 15), "UPI/SWIGGY", Some("450.00"), None),
        row((2024, 6, 16), "NEFT SALARY", None, Some("50000.00")),
    ];
    let first = bankfeed::insert_statement_rows(&pool, company, bank, &rows).await.unwrap();
    assert_eq!(first.imported, 2);
    assert_eq!(first.duplicates, 0);

    let second = bankfeed::insert_statement_rows(&pool, company, bank, &rows).await.unwrap();
    assert_eq!(second.imported, 0);
    assert_eq!(second.duplicates, 2);

    let pending = bankfeed::get_pending_transactions(&pool, company, None).await.unwrap();
    assert_eq!(pending.len(), 2);
    assert_eq!(pending[0].debit_amount.unwrap().to_plain_string(), "450.00");
}

#[tokio::test]
async fn rules_round_trip_and_usage_bump() {
    let (_dir, pool, company) = setup().await;

    let draft = draft_rule_from_description("UPI/SWIGGY/bangalore", AccountId(1), None, 0).unwrap();
    let rule_id = rules::insert_rule(&pool, company, &draft).await.unwrap();

    let loaded = rules::get_active_rules(&pool, company).await.unwrap();
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].id, rule_id);
    assert_eq!(loaded[0].priority, 1);
    assert_eq!(loaded[0].conditions[0].value, "swiggy");
    assert_eq!(loaded[0].usage_count, 0);

    rules::bump_rule_usage(&pool, rule_id).await.unwrap();
    rules::bump_rule_usage(&pool, rule_id).await.unwrap();
    let loaded = rules::get_active_rules(&pool, company).await.unwrap();
    assert_eq!(loaded[0].usage_count, 2);

    assert_eq!(rules::next_rule_priority(&pool, company).await.unwrap(), 2);
}

#[tokio::test]
async fn terminal_states_are_sticky() {
    let (_dir, pool, company) = setup().await;
    let accounts = lookups::get_active_account_refs(&pool, company).await.unwrap();
    let bank = db::create_bank_account(&pool, company, "HDFC", accounts[0].id.0).await.unwrap();

    let rows = vec![row((2024, 6, 15), "CHQ DEP", None, Some("1000.00"))];
    bankfeed::insert_statement_rows(&pool, company, bank, &rows).await.unwrap();
    let txn = &bankfeed::get_pending_transactions(&pool, company, None).await.unwrap()[0];

    bankfeed::apply_update(&pool, txn.id, &bankfeed::TxnUpdate::Matched(MatchKind::Invoice, 9))
        .await
        .unwrap();

    let err = bankfeed::apply_update(&pool, txn.id, &bankfeed::TxnUpdate::Excluded)
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::NotPending(_)));

    let reloaded = bankfeed::get_transaction(&pool, company, txn.id).await.unwrap();
    assert_eq!(reloaded.status, ReconStatus::Matched);
    assert_eq!(reloaded.matched_entity, Some((MatchKind::Invoice, 9)));
    assert!(reloaded.state_is_consistent());
}

#[tokio::test]
async fn suggestion_persists_without_state_change() {
    let (_dir, pool, company) = setup().await;
    let accounts = lookups::get_active_account_refs(&pool, company).await.unwrap();
    let bank = db::create_bank_account(&pool, company, "HDFC", accounts[0].id.0).await.unwrap();
    bankfeed::insert_statement_rows(
        &pool,
        company,
        bank,
        &[row((2024, 6, 15), "UPI/ACME", None, Some("100.00"))],
    )
    .await
    .unwrap();
    let txn = &bankfeed::get_pending_transactions(&pool, company, None).await.unwrap()[0];

    let result = CategorizationResult {
        account_id: Some(accounts[1].id),
        party_id: None,
        confidence: 70,
        source: lekha_core::CategorizationSource::Ml,
    };
    bankfeed::save_suggestion(&pool, txn.id, &result).await.unwrap();

    let reloaded = bankfeed::get_transaction(&pool, company, txn.id).await.unwrap();
    assert_eq!(reloaded.status, ReconStatus::Pending);
    assert_eq!(reloaded.suggested_account_id, Some(accounts[1].id));
    assert_eq!(reloaded.suggested_confidence, Some(70));
}

#[tokio::test]
async fn journal_numbers_are_sequential_within_fiscal_year() {
    let (_dir, pool, company) = setup().await;
    let accounts = lookups::get_active_account_refs(&pool, company).await.unwrap();
    let bank_ledger = accounts[0].id;
    let target = accounts[1].id;
    let bank = db::create_bank_account(&pool, company, "HDFC", bank_ledger.0).await.unwrap();
    db::create_fiscal_year(&pool, company, FiscalYear::new(2024)).await.unwrap();

    let rows = vec![
        row((2024, 6, 15), "MISC CREDIT A", None, Some("100.00")),
        row((2024, 6, 16), "MISC DEBIT B", Some("40.00"), None),
    ];
    bankfeed::insert_statement_rows(&pool, company, bank, &rows).await.unwrap();
    let pending = bankfeed::get_pending_transactions(&pool, company, None).await.unwrap();

    let fy = lookups::get_open_fiscal_year(&pool, company, pending[0].transaction_date)
        .await
        .unwrap();
    assert_eq!(fy.label(), "2024-25");

    let (_, first) = journal::post_bank_entry(&pool, &pending[0], bank_ledger, target, &fy.label())
        .await
        .unwrap();
    let (_, second) = journal::post_bank_entry(&pool, &pending[1], bank_ledger, target, &fy.label())
        .await
        .unwrap();
    assert_eq!(first, "JV/2024-25/0001");
    assert_eq!(second, "JV/2024-25/0002");

    let still_pending = bankfeed::get_pending_transactions(&pool, company, None).await.unwrap();
    assert!(still_pending.is_empty());

    // A settled transaction cannot be posted again.
    let reloaded = bankfeed::get_transaction(&pool, company, pending[0].id).await.unwrap();
    let err = journal::post_bank_entry(&pool, &reloaded, bank_ledger, target, &fy.label())
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::NotPending(_)));
}

#[tokio::test]
async fn open_fiscal_year_lookup_honors_lock() {
    let (_dir, pool, company) = setup().await;
    db::create_fiscal_year(&pool, company, FiscalYear::new(2024)).await.unwrap();
    let date = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();

    assert!(lookups::get_open_fiscal_year(&pool, company, date).await.is_ok());

    sqlx::query("UPDATE fiscal_years SET is_locked = 1 WHERE company_id = ?")
        .bind(company.0)
        .execute(&pool)
        .await
        .unwrap();
    let err = lookups::get_open_fiscal_year(&pool, company, date).await.unwrap_err();
    assert!(matches!(err, StorageError::NoOpenFiscalYear(_)));
}

#[tokio::test]
async fn candidate_window_is_tenant_scoped() {
    let (_dir, pool, company) = setup().await;
    let other = db::create_company(&pool, "Other Co").await.unwrap();
    let date = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();

    lekha_storage::records::insert_invoice(
        &pool, company, "INV-1001", None, date,
        Money::from_paise(500000), Money::from_paise(500000), "sent",
    )
    .await
    .unwrap();
    lekha_storage::records::insert_invoice(
        &pool, other, "INV-9999", None, date,
        Money::from_paise(500000), Money::from_paise(500000), "sent",
    )
    .await
    .unwrap();

    let candidates = lookups::fetch_match_candidates(&pool, company, date).await.unwrap();
    assert_eq!(candidates.invoices.len(), 1);
    assert_eq!(candidates.invoices[0].number, "INV-1001");
}
