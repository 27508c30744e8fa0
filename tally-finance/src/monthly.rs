//! Month buckets: the dashboard data feed, and the per-month aggregates
//! computed from it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tally_core::{MonthKey, Transaction};

/// Category whose transactions are left out of every total
pub const DEFAULT_IGNORED_CATEGORY: &str = "(Ignored)";

/// Label for transactions with no category
pub const UNSORTED: &str = "Unsorted";

/// Month key -> that month's transactions, in insertion order.
///
/// Serializes as `{"2023-03": [...], "2023-04": [...]}` with months ascending.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MonthlyBuckets {
    months: BTreeMap<MonthKey, Vec<Transaction>>,
}

/// Income and expense totals for one month
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MonthTotals {
    pub month: MonthKey,
    /// Sum of positive amounts
    pub income: f64,
    /// Sum of negative amounts (zero or below)
    pub expense: f64,
}

impl MonthTotals {
    pub fn difference(&self) -> f64 {
        self.income + self.expense
    }
}

/// Occurrence count and summed amount of one description
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Tally {
    pub count: usize,
    pub amount: f64,
}

impl Tally {
    pub fn add(&mut self, amount: f64) {
        self.count += 1;
        self.amount += amount;
    }

    pub fn merge(&mut self, other: &Tally) {
        self.count += other.count;
        self.amount += other.amount;
    }
}

/// Month -> description -> tally
pub type DescriptionTallies = BTreeMap<MonthKey, BTreeMap<String, Tally>>;

/// Money in or money out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Income,
    Expenses,
}

impl Flow {
    /// Zero amounts count as expenses
    pub fn includes(&self, txn: &Transaction) -> bool {
        match self {
            Flow::Income => txn.amount > 0.0,
            Flow::Expenses => txn.amount <= 0.0,
        }
    }
}

/// One slice of a category breakdown
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryShare {
    pub category: String,
    /// Absolute total
    pub total: f64,
}

/// Monthly spend of one category across every bucketed month
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySeries {
    pub category: String,
    pub points: Vec<(MonthKey, f64)>,
    pub total: f64,
}

impl MonthlyBuckets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_transactions(txns: impl IntoIterator<Item = Transaction>) -> Self {
        let mut buckets = Self::new();
        for txn in txns {
            buckets.push(txn);
        }
        buckets
    }

    /// Append to the transaction's month
    pub fn push(&mut self, txn: Transaction) {
        self.months.entry(txn.month()).or_default().push(txn);
    }

    pub fn get(&self, month: &MonthKey) -> Option<&[Transaction]> {
        self.months.get(month).map(Vec::as_slice)
    }

    pub fn months(&self) -> impl Iterator<Item = &MonthKey> {
        self.months.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&MonthKey, &[Transaction])> {
        self.months.iter().map(|(k, v)| (k, v.as_slice()))
    }

    /// Months from `from` through `to`, inclusive
    pub fn range(
        &self,
        from: MonthKey,
        to: MonthKey,
    ) -> impl Iterator<Item = (&MonthKey, &[Transaction])> {
        let (from, to) = if from <= to { (from, to) } else { (to, from) };
        self.months.range(from..=to).map(|(k, v)| (k, v.as_slice()))
    }

    pub fn transactions(&self) -> impl Iterator<Item = &Transaction> {
        self.months.values().flatten()
    }

    pub fn len(&self) -> usize {
        self.months.len()
    }

    pub fn is_empty(&self) -> bool {
        self.months.is_empty()
    }

    pub fn transaction_count(&self) -> usize {
        self.months.values().map(Vec::len).sum()
    }

    /// Income/expense per month, skipping the ignored category
    pub fn totals(&self, ignored: &str) -> Vec<MonthTotals> {
        self.iter()
            .map(|(month, txns)| {
                let mut totals = MonthTotals {
                    month: *month,
                    income: 0.0,
                    expense: 0.0,
                };
                for txn in txns.iter().filter(|t| !t.in_category(ignored)) {
                    if txn.amount < 0.0 {
                        totals.expense += txn.amount;
                    } else {
                        totals.income += txn.amount;
                    }
                }
                totals
            })
            .collect()
    }

    /// Per-month, per-description counts and amounts, skipping the ignored
    /// category. Months with nothing left are absent.
    pub fn description_tallies(&self, ignored: &str) -> DescriptionTallies {
        let mut out = DescriptionTallies::new();
        for txn in self.transactions().filter(|t| !t.in_category(ignored)) {
            out.entry(txn.month())
                .or_default()
                .entry(txn.description.clone())
                .or_default()
                .add(txn.amount);
        }
        out
    }

    /// Absolute totals per category over an inclusive month range, largest
    /// first. Uncategorized rows are grouped under [`UNSORTED`].
    pub fn category_breakdown(
        &self,
        from: MonthKey,
        to: MonthKey,
        flow: Flow,
        ignored: &str,
    ) -> Vec<CategoryShare> {
        let mut totals: BTreeMap<&str, f64> = BTreeMap::new();
        for (_, txns) in self.range(from, to) {
            for txn in txns.iter().filter(|t| flow.includes(t)) {
                let category = txn.category_or(UNSORTED);
                if category == ignored {
                    continue;
                }
                *totals.entry(category).or_default() += txn.amount.abs();
            }
        }

        let mut shares: Vec<CategoryShare> = totals
            .into_iter()
            .map(|(category, total)| CategoryShare {
                category: category.to_string(),
                total,
            })
            .collect();
        shares.sort_by(|a, b| b.total.total_cmp(&a.total));
        shares
    }

    /// Expense series per category, one zero-filled point per bucketed
    /// month, smallest total first (stacking order).
    pub fn category_series(&self, ignored: &str) -> Vec<CategorySeries> {
        let mut spend: BTreeMap<&str, BTreeMap<MonthKey, f64>> = BTreeMap::new();
        for (month, txns) in self.iter() {
            for txn in txns.iter().filter(|t| t.is_expense()) {
                let category = txn.category_or(UNSORTED);
                if category == ignored {
                    continue;
                }
                *spend.entry(category).or_default().entry(*month).or_default() -= txn.amount;
            }
        }

        let mut series: Vec<CategorySeries> = spend
            .into_iter()
            .map(|(category, by_month)| {
                let points: Vec<(MonthKey, f64)> = self
                    .months()
                    .map(|m| (*m, by_month.get(m).copied().unwrap_or(0.0)))
                    .collect();
                let total = points.iter().map(|(_, v)| v).sum();
                CategorySeries {
                    category: category.to_string(),
                    points,
                    total,
                }
            })
            .collect();
        series.sort_by(|a, b| a.total.total_cmp(&b.total));
        series
    }
}
