//! Rule-driven transaction classifier.
//!
//! Four ordered stages, each reading the description left by the one before:
//!   1. exchange-rate annotation   "AMAZON (USD 9.99 @ RATE 1.21)"
//!   2. type prefix                "DC - AMAZON"     -> Type = Debit Card
//!   3. description normalization  "AMAZON.CO.UK*12" -> "Amazon"
//!   4. category                   "Amazon"          -> Entertainment
//!
//! Every stage is first-match-wins; a stage with no matching rule leaves
//! its field unset.

use regex::Regex;
use tally_core::{compile_pattern, RuleError, RuleGroup, RuleSet, Transaction};
use tracing::debug;

const EXCHANGE_PATTERN: &str = r"^(.*?)\s*\((.*? @ RATE .*?)\)$";

struct TypeRule {
    prefix: String,
    label: String,
    generic: bool,
}

impl TypeRule {
    fn matches(&self, description: &str) -> bool {
        description.starts_with(&self.prefix)
    }

    fn apply(&self, txn: &mut Transaction) {
        txn.kind = Some(self.label.clone());
        if self.generic {
            let original = std::mem::replace(&mut txn.description, self.label.clone());
            txn.raw_description = Some(original);
        } else {
            txn.description = txn.description[self.prefix.len()..].to_string();
        }
    }
}

struct NormalizeRule {
    pattern: Regex,
    replacement: String,
}

impl NormalizeRule {
    fn apply(&self, txn: &mut Transaction) {
        let original = std::mem::replace(&mut txn.description, self.replacement.clone());
        if is_unset(&txn.raw_description) {
            txn.raw_description = Some(original);
        }
    }
}

struct CategoryRule {
    label: String,
    patterns: Vec<Regex>,
}

impl CategoryRule {
    fn matches(&self, description: &str) -> bool {
        self.patterns.iter().any(|p| p.is_match(description))
    }
}

/// Which stages changed a transaction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Applied {
    pub exchange: bool,
    pub kind: bool,
    pub normalized: bool,
    pub category: bool,
}

/// Per-batch counters, for logging
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassifyStats {
    pub total: usize,
    pub exchange: usize,
    pub typed: usize,
    pub normalized: usize,
    pub categorized: usize,
    pub uncategorized: usize,
}

impl ClassifyStats {
    fn record(&mut self, applied: Applied, txn: &Transaction) {
        self.total += 1;
        self.exchange += applied.exchange as usize;
        self.typed += applied.kind as usize;
        self.normalized += applied.normalized as usize;
        self.categorized += applied.category as usize;
        if txn.category.is_none() {
            self.uncategorized += 1;
        }
    }
}

/// A compiled, read-only rule set
pub struct Classifier {
    exchange: Regex,
    types: Vec<TypeRule>,
    rules: Vec<NormalizeRule>,
    categories: Vec<CategoryRule>,
}

fn is_unset(field: &Option<String>) -> bool {
    field.as_deref().is_none_or(str::is_empty)
}

impl Classifier {
    /// Compile `rules`. Any invalid regex fails construction.
    pub fn new(rules: &RuleSet) -> Result<Self, RuleError> {
        let types = rules
            .types
            .iter()
            .map(|(prefix, label)| TypeRule {
                prefix: prefix.to_string(),
                label: label.clone(),
                generic: rules.is_generic(label),
            })
            .collect();

        let normalize = rules
            .rules
            .iter()
            .map(|(pattern, replacement)| -> Result<NormalizeRule, RuleError> {
                Ok(NormalizeRule {
                    pattern: compile_pattern(RuleGroup::Rules, pattern)?,
                    replacement: replacement.clone(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let categories = rules
            .categories
            .iter()
            .map(|(label, patterns)| -> Result<CategoryRule, RuleError> {
                let patterns = patterns
                    .iter()
                    .map(|p| compile_pattern(RuleGroup::Categories, p))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(CategoryRule {
                    label: label.to_string(),
                    patterns,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            exchange: compile_pattern(RuleGroup::Exchange, EXCHANGE_PATTERN)?,
            types,
            rules: normalize,
            categories,
        })
    }

    /// Classify a single transaction
    pub fn classify(&self, mut txn: Transaction) -> Transaction {
        self.apply(&mut txn);
        txn
    }

    /// Classify in place, reporting which stages fired.
    ///
    /// A transaction that arrives with both `raw_description` and a category
    /// set came out of an earlier pass and skips stage 3, so reclassifying is
    /// a no-op. A raw description alone (say from an export column) does not
    /// stop normalization.
    pub fn apply(&self, txn: &mut Transaction) -> Applied {
        let mut applied = Applied::default();
        let already_normalized = !is_unset(&txn.raw_description) && !is_unset(&txn.category);

        if is_unset(&txn.exchange) {
            if let Some(caps) = self.exchange.captures(&txn.description) {
                let (stripped, exchange) = (caps[1].to_string(), caps[2].to_string());
                txn.description = stripped;
                txn.exchange = Some(exchange);
                applied.exchange = true;
            }
        }

        if is_unset(&txn.kind) {
            if let Some(rule) = self.types.iter().find(|r| r.matches(&txn.description)) {
                rule.apply(txn);
                applied.kind = true;
            }
        }

        if !already_normalized {
            if let Some(rule) = self.rules.iter().find(|r| r.pattern.is_match(&txn.description)) {
                rule.apply(txn);
                applied.normalized = true;
            }
        }

        if is_unset(&txn.category) {
            txn.category = None;
            if let Some(rule) = self.categories.iter().find(|c| c.matches(&txn.description)) {
                txn.category = Some(rule.label.clone());
                applied.category = true;
            }
        }

        applied
    }

    /// Classify a batch in place
    pub fn classify_all(&self, txns: &mut [Transaction]) -> ClassifyStats {
        let mut stats = ClassifyStats::default();
        for txn in txns.iter_mut() {
            let applied = self.apply(txn);
            stats.record(applied, txn);
        }
        debug!(
            total = stats.total,
            typed = stats.typed,
            normalized = stats.normalized,
            categorized = stats.categorized,
            uncategorized = stats.uncategorized,
            "classified transactions"
        );
        stats
    }
}
