//! tally-core: transaction records, month keys, and the classification rule set

pub mod month;
pub mod rules;
pub mod transaction;

pub use month::{MonthKey, ParseMonthKeyError};
pub use rules::{compile_pattern, OrderedMap, RuleError, RuleGroup, RuleSet};
pub use transaction::Transaction;
