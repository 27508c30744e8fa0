pub mod fields;
pub mod statement_csv;
