use tally_core::Transaction;

/// Column names recognised in a statement header
pub mod columns {
    pub const DATE: &str = "Date";
    pub const AMOUNT: &str = "Amount";
    pub const DESCRIPTION: &str = "Description";
    pub const RAW_DESCRIPTION: &str = "RawDescription";
    pub const TYPE: &str = "Type";
    pub const CATEGORY: &str = "Category";
    pub const EXCHANGE: &str = "Exchange";
}

/// All rows of one statement file, in file order
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    /// File name, without directory
    pub name: String,
    pub transactions: Vec<Transaction>,
}
