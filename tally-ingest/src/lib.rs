//! tally-ingest: bank statement CSV loading.

pub mod error;
pub mod loader;
pub mod parsers;
pub mod types;

pub use error::IngestError;
pub use loader::load_statements;
pub use parsers::statement_csv::{parse_statement, parse_statement_reader};
pub use types::Statement;
