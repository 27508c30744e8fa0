//! The batch transform: load statements, classify, bucket by month.

use anyhow::{Context, Result};
use std::path::Path;
use tally_core::Transaction;
use tally_finance::{Classifier, ClassifyStats, MonthlyBuckets};
use tally_ingest::load_statements;
use tracing::info;

use crate::config::Config;

pub struct Ledger {
    pub buckets: MonthlyBuckets,
    pub stats: ClassifyStats,
}

impl Ledger {
    /// Every transaction outside the ignored category
    pub fn counted<'a>(&'a self, ignored: &'a str) -> impl Iterator<Item = &'a Transaction> {
        self.buckets.transactions().filter(move |t| !t.in_category(ignored))
    }
}

pub fn build_ledger(cfg: &Config, statements_dir: &Path) -> Result<Ledger> {
    let classifier = Classifier::new(&cfg.rules).context("compile classification rules")?;

    let statements = load_statements(statements_dir)
        .with_context(|| format!("load statements from {}", statements_dir.display()))?;
    let files = statements.len();

    let mut txns: Vec<Transaction> = statements
        .into_iter()
        .flat_map(|s| s.transactions)
        .collect();
    let stats = classifier.classify_all(&mut txns);

    if cfg.chronological {
        txns.sort_by_key(|t| t.date);
    }
    let buckets = MonthlyBuckets::from_transactions(txns);

    info!(
        files,
        transactions = stats.total,
        months = buckets.len(),
        uncategorized = stats.uncategorized,
        "built ledger"
    );
    Ok(Ledger { buckets, stats })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn statements_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .parent()
            .unwrap()
            .join("fixtures")
            .join("statements")
    }

    #[test]
    fn test_build_ledger_from_fixtures() {
        let ledger = build_ledger(&Config::default(), &statements_dir()).unwrap();
        assert_eq!(ledger.stats.total, 19);
        assert_eq!(ledger.stats.typed, 15);
        assert_eq!(ledger.stats.normalized, 4);
        assert_eq!(ledger.buckets.len(), 4);
        // The internal transfer is the only ignored row
        assert_eq!(ledger.counted("(Ignored)").count(), 18);
    }

    #[test]
    fn test_row_order_unless_chronological() {
        let march = "2023-03".parse().unwrap();

        let ledger = build_ledger(&Config::default(), &statements_dir()).unwrap();
        let rows = ledger.buckets.get(&march).unwrap();
        assert_eq!(rows[0].description, "LANDLORD RENT");
        // The statement lists the 10th before the 6th
        assert_eq!(rows[2].description, "Steam");
        assert_eq!(rows[3].description, "Cash Withdrawal");

        let cfg = Config {
            chronological: true,
            ..Config::default()
        };
        let ledger = build_ledger(&cfg, &statements_dir()).unwrap();
        let dates: Vec<_> = ledger.buckets.get(&march).unwrap().iter().map(|t| t.date).collect();
        assert!(dates.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_invalid_rule_fails_the_run() {
        let mut cfg = Config::default();
        cfg.rules.rules.insert("(oops", "Broken".to_string());
        let err = build_ledger(&cfg, &statements_dir()).err().unwrap();
        assert!(format!("{err:#}").contains("(oops"));
    }
}
