pub mod account;
pub mod bankfeed;
pub mod journal;
pub mod money;
pub mod period;

pub use account::{Account, AccountId, AccountType, BankAccountId, CompanyId, Party, PartyId, PartyKind, DEFAULT_ACCOUNTS};
pub use bankfeed::{BankFeedTransaction, CategorizationSource, MatchKind, ReconStatus};
pub use journal::{journal_entry_number, JournalLine, LedgerError, PostedEntry, UnpostedEntry};
pub use money::Money;
pub use period::{DateRange, FiscalYear, FiscalYearRecord};
