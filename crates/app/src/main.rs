use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};

use lekha_core::{AccountId, BankAccountId, CompanyId, FiscalYear, PartyId};
use lekha_storage::{bankfeed, db};

use lekha::service::{self, ReconcileOutcome, StatementFormat};

#[derive(Parser)]
#[command(name = "lekha", about = "Bank feed categorization and reconciliation")]
struct Cli {
    /// Database file; LEKHA_DB overrides the default.
    #[arg(long, global = true, env = "LEKHA_DB", default_value = "lekha.db")]
    db: PathBuf,

    /// Company to operate on.
    #[arg(long, global = true, default_value_t = 1)]
    company: i64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database, a company, its chart of accounts, and a bank account.
    Init {
        name: String,
        /// Bank account display name.
        #[arg(long, default_value = "Primary Current Account")]
        bank_name: String,
        /// Calendar year the first fiscal year starts in.
        #[arg(long)]
        fiscal_year: u16,
    },
    /// Import a CSV or OFX bank statement.
    Import {
        file: PathBuf,
        #[arg(long, default_value_t = 1)]
        bank_account: i64,
    },
    /// Suggest accounts for pending transactions (one id, or all).
    Categorize { id: Option<i64> },
    /// Match pending transactions against accounting records.
    Reconcile { id: Option<i64> },
    /// Mark a transaction as not to be accounted for.
    Exclude { id: i64 },
    /// Create a journal entry for a transaction with no counterpart record.
    Post {
        id: i64,
        /// Target ledger account; defaults to the stored suggestion.
        #[arg(long)]
        account: Option<i64>,
    },
    /// Learn a categorization rule from one transaction's description.
    Learn {
        id: i64,
        #[arg(long)]
        account: i64,
        #[arg(long)]
        party: Option<i64>,
    },
    /// Show the reconciliation queue by status.
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let cli = Cli::parse();
    let pool = db::create_db(&cli.db)
        .await
        .with_context(|| format!("opening database {}", cli.db.display()))?;
    let company = CompanyId(cli.company);

    match cli.command {
        Commands::Init {
            name,
            bank_name,
            fiscal_year,
        } => {
            let company = db::create_company(&pool, &name).await?;
            db::seed_default_accounts(&pool, company).await?;
            db::create_fiscal_year(&pool, company, FiscalYear::new(fiscal_year)).await?;
            let accounts = lekha_storage::lookups::get_active_account_refs(&pool, company).await?;
            let ledger = accounts
                .iter()
                .find(|a| a.name == "Bank")
                .context("seed chart has no Bank account")?;
            let bank = db::create_bank_account(&pool, company, &bank_name, ledger.id.0).await?;
            println!("company {company} created with bank account {bank}");
        }
        Commands::Import { file, bank_account } => {
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let format = StatementFormat::guess(&file);
            let summary = service::import_statement(
                &pool,
                company,
                BankAccountId(bank_account),
                &text,
                format,
            )
            .await?;
            println!(
                "imported {} transactions, skipped {} duplicates",
                summary.imported, summary.duplicates
            );
        }
        Commands::Categorize { id } => match id {
            Some(id) => {
                let outcome = service::categorize_transaction(&pool, company, id).await?;
                match outcome.result.account_id {
                    Some(account) => println!(
                        "transaction {id}: account {account} ({}% via {})",
                        outcome.result.confidence,
                        outcome.result.source.as_str()
                    ),
                    None => println!("transaction {id}: no suggestion"),
                }
            }
            None => {
                let summary = service::bulk_categorize(&pool, company, None).await?;
                println!(
                    "{} processed, {} suggested, {} failed",
                    summary.processed,
                    summary.suggested,
                    summary.errors.len()
                );
                for e in &summary.errors {
                    eprintln!("  transaction {}: {}", e.txn_id, e.message);
                }
            }
        },
        Commands::Reconcile { id } => match id {
            Some(id) => match service::reconcile_transaction(&pool, company, id).await? {
                ReconcileOutcome::Matched {
                    kind,
                    entity_id,
                    confidence,
                } => println!("matched {} {entity_id} ({confidence}%)", kind.as_str()),
                ReconcileOutcome::LeftPending(result) => {
                    println!("left pending: {}", result.reason)
                }
            },
            None => {
                let summary = service::bulk_auto_reconcile(&pool, company, None).await?;
                println!(
                    "{} processed, {} matched, {} suggested, {} failed",
                    summary.processed,
                    summary.matched,
                    summary.suggested,
                    summary.errors.len()
                );
                for e in &summary.errors {
                    eprintln!("  transaction {}: {}", e.txn_id, e.message);
                }
            }
        },
        Commands::Exclude { id } => {
            service::exclude_transaction(&pool, company, id).await?;
            println!("transaction {id} excluded");
        }
        Commands::Post { id, account } => {
            let entry = service::create_journal_entry_from_transaction(
                &pool,
                company,
                id,
                account.map(AccountId),
            )
            .await?;
            println!("journal entry {} created", entry.entry_number);
        }
        Commands::Learn { id, account, party } => {
            let rule_id = service::create_rule_from_transaction(
                &pool,
                company,
                id,
                AccountId(account),
                party.map(PartyId),
            )
            .await?;
            println!("rule {rule_id} created");
        }
        Commands::Status => {
            let status = service::status_summary(&pool, company).await?;
            println!("pending   {}", status.pending);
            println!("matched   {}", status.matched);
            println!("created   {}", status.created);
            println!("excluded  {}", status.excluded);

            let pending = bankfeed::get_pending_transactions(&pool, company, None).await?;
            for txn in pending.iter().take(20) {
                println!(
                    "  #{} {} {} {}",
                    txn.id,
                    txn.transaction_date,
                    txn.amount(),
                    txn.description
                );
            }
        }
    }

    Ok(())
}
