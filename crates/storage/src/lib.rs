pub mod bankfeed;
pub mod db;
pub mod error;
pub mod journal;
pub mod lookups;
pub mod records;
pub mod rules;

pub use bankfeed::{ImportSummary, TxnUpdate};
pub use db::{create_db, seed_default_accounts, DbPool};
pub use error::StorageError;
