pub mod service;

pub use service::{
    BulkCategorizeSummary, BulkReconcileSummary, ItemError, JournalEntryRef, ReconcileOutcome,
    ServiceError, StatementFormat, StatusSummary,
};
