pub mod csv;
pub mod ofx;

pub use csv::{parse_statement, CsvError, StatementColumns, StatementRow};
pub use ofx::{parse_ofx, OfxError, OfxStatement, OfxTransaction};
