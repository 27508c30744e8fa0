//! Statement transaction record and its classification fields

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::month::MonthKey;

/// One statement row, plus whatever the classifier derived from it.
///
/// Field names serialize in the statement's own column spelling
/// (`Date`, `Amount`, `RawDescription`, ...), which is what the dashboard reads.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct Transaction {
    pub date: NaiveDate,
    /// Positive = income, negative = expense
    pub amount: f64,
    pub description: String,
    /// Description as it was before a type or normalization rule replaced it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_description: Option<String>,
    /// Payment channel (Direct Debit, Cheque, ...)
    #[serde(rename = "Type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Foreign-exchange annotation, e.g. "USD 19.99 @ RATE 1.2100"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exchange: Option<String>,
    /// Statement columns with no dedicated field (Balance, ...)
    #[serde(flatten)]
    pub extra: BTreeMap<String, String>,
}

impl Transaction {
    /// Create an unclassified transaction
    pub fn new(date: NaiveDate, amount: f64, description: impl Into<String>) -> Self {
        Self {
            date,
            amount,
            description: description.into(),
            raw_description: None,
            kind: None,
            category: None,
            exchange: None,
            extra: BTreeMap::new(),
        }
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_exchange(mut self, exchange: impl Into<String>) -> Self {
        self.exchange = Some(exchange.into());
        self
    }

    /// Keep an extra statement column
    pub fn with_extra(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(column.into(), value.into());
        self
    }

    /// Month bucket this transaction belongs to
    pub fn month(&self) -> MonthKey {
        MonthKey::from_date(self.date)
    }

    /// Returns true if this is income (positive amount)
    pub fn is_income(&self) -> bool {
        self.amount > 0.0
    }

    /// Returns true if this is an expense (negative amount)
    pub fn is_expense(&self) -> bool {
        self.amount < 0.0
    }

    /// Category label, or `fallback` when unclassified
    pub fn category_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        match self.category.as_deref() {
            Some(c) if !c.is_empty() => c,
            _ => fallback,
        }
    }

    /// True when the transaction sits in `category`
    pub fn in_category(&self, category: &str) -> bool {
        self.category.as_deref() == Some(category)
    }
}
