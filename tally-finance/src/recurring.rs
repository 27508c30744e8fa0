//! Recurring-payment detection.
//!
//! A description is recurring when it occurs often enough, the gaps between
//! consecutive occurrences are steady (deviation / mean below a threshold),
//! and the mean gap lands in a weekly or monthly band.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tally_core::Transaction;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Weekly,
    Monthly,
}

impl Frequency {
    /// Occurrences in a month
    pub fn per_month(&self) -> f64 {
        match self {
            Frequency::Weekly => 4.0,
            Frequency::Monthly => 1.0,
        }
    }
}

/// Inclusive range of mean gaps, in days
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DayBand {
    pub min: f64,
    pub max: f64,
}

impl DayBand {
    pub fn contains(&self, days: f64) -> bool {
        self.min <= days && days <= self.max
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecurrenceThresholds {
    pub min_occurrences: usize,
    /// Upper bound (exclusive) on deviation / mean of the gaps
    pub max_stability: f64,
    pub weekly: DayBand,
    pub monthly: DayBand,
}

impl Default for RecurrenceThresholds {
    fn default() -> Self {
        Self {
            min_occurrences: 3,
            max_stability: 0.5,
            weekly: DayBand { min: 5.0, max: 9.0 },
            monthly: DayBand { min: 27.0, max: 32.0 },
        }
    }
}

impl RecurrenceThresholds {
    fn frequency(&self, mean_days: f64) -> Option<Frequency> {
        if self.weekly.contains(mean_days) {
            Some(Frequency::Weekly)
        } else if self.monthly.contains(mean_days) {
            Some(Frequency::Monthly)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecurringPayment {
    pub description: String,
    /// Category of the latest occurrence
    pub category: Option<String>,
    pub frequency: Frequency,
    pub occurrences: usize,
    pub mean_period_days: f64,
    pub deviation_days: f64,
    pub stability: f64,
    pub average_amount: f64,
    /// average amount scaled to one month
    pub monthly_equivalent: f64,
    pub last_seen: NaiveDate,
}

/// Mean and population standard deviation
fn mean_and_deviation(values: &[f64]) -> (f64, f64) {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, variance.sqrt())
}

fn detect_one(
    description: &str,
    mut occurrences: Vec<&Transaction>,
    thresholds: &RecurrenceThresholds,
) -> Option<RecurringPayment> {
    if occurrences.len() < thresholds.min_occurrences.max(2) {
        return None;
    }
    occurrences.sort_by_key(|t| t.date);

    let gaps: Vec<f64> = occurrences
        .windows(2)
        .map(|w| (w[1].date - w[0].date).num_days() as f64)
        .collect();
    let (mean, deviation) = mean_and_deviation(&gaps);
    if mean <= 0.0 {
        return None;
    }

    let stability = deviation / mean;
    if stability >= thresholds.max_stability {
        return None;
    }
    let frequency = thresholds.frequency(mean)?;

    let average_amount =
        occurrences.iter().map(|t| t.amount).sum::<f64>() / occurrences.len() as f64;
    let last = occurrences.last()?;

    Some(RecurringPayment {
        description: description.to_string(),
        category: last.category.clone(),
        frequency,
        occurrences: occurrences.len(),
        mean_period_days: mean,
        deviation_days: deviation,
        stability,
        average_amount,
        monthly_equivalent: average_amount * frequency.per_month(),
        last_seen: last.date,
    })
}

/// Find recurring payments, ordered by description
pub fn detect_recurring<'a>(
    txns: impl IntoIterator<Item = &'a Transaction>,
    thresholds: &RecurrenceThresholds,
) -> Vec<RecurringPayment> {
    let mut by_description: BTreeMap<&str, Vec<&Transaction>> = BTreeMap::new();
    for txn in txns {
        by_description
            .entry(txn.description.as_str())
            .or_default()
            .push(txn);
    }

    let found: Vec<RecurringPayment> = by_description
        .into_iter()
        .filter_map(|(description, occurrences)| detect_one(description, occurrences, thresholds))
        .collect();
    debug!(count = found.len(), "detected recurring payments");
    found
}

/// Sum of monthly equivalents
pub fn monthly_commitment(payments: &[RecurringPayment]) -> f64 {
    payments.iter().map(|p| p.monthly_equivalent).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn series(desc: &str, start: NaiveDate, gaps: &[i64], amount: f64) -> Vec<Transaction> {
        let mut date = start;
        let mut out = vec![Transaction::new(date, amount, desc)];
        for gap in gaps {
            date += Duration::days(*gap);
            out.push(Transaction::new(date, amount, desc));
        }
        out
    }

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 3, 1).unwrap()
    }

    #[test]
    fn test_weekly_payment() {
        let txns = series("PURE GYM", start(), &[7, 7, 7, 7], -7.5);
        let found = detect_recurring(&txns, &RecurrenceThresholds::default());
        assert_eq!(found.len(), 1);
        let gym = &found[0];
        assert_eq!(gym.frequency, Frequency::Weekly);
        assert_eq!(gym.occurrences, 5);
        assert_eq!(gym.mean_period_days, 7.0);
        assert_eq!(gym.stability, 0.0);
        assert_eq!(gym.monthly_equivalent, -30.0);
        assert_eq!(gym.last_seen, NaiveDate::from_ymd_opt(2023, 3, 29).unwrap());
    }

    #[test]
    fn test_monthly_payment_with_uneven_month_lengths() {
        let txns = series("RENT", NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(), &[31, 28, 31], -750.0);
        let found = detect_recurring(&txns, &RecurrenceThresholds::default());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].frequency, Frequency::Monthly);
        assert_eq!(found[0].mean_period_days, 30.0);
        assert_eq!(found[0].monthly_equivalent, -750.0);
    }

    #[test]
    fn test_needs_three_occurrences() {
        let txns = series("RENT", start(), &[30], -750.0);
        assert!(detect_recurring(&txns, &RecurrenceThresholds::default()).is_empty());
    }

    #[test]
    fn test_irregular_gaps_are_rejected() {
        // mean 7, but wildly uneven
        let txns = series("TAKEAWAY", start(), &[1, 13, 2, 12], -20.0);
        assert!(detect_recurring(&txns, &RecurrenceThresholds::default()).is_empty());
    }

    #[test]
    fn test_mean_outside_bands_is_rejected() {
        let txns = series("FORTNIGHTLY", start(), &[14, 14, 14], -10.0);
        assert!(detect_recurring(&txns, &RecurrenceThresholds::default()).is_empty());
    }

    #[test]
    fn test_same_day_repeats_are_not_recurring() {
        let txns = series("COFFEE", start(), &[0, 0, 0], -3.0);
        assert!(detect_recurring(&txns, &RecurrenceThresholds::default()).is_empty());
    }

    #[test]
    fn test_unsorted_input_and_mixed_descriptions() {
        let mut txns = series("PURE GYM", start(), &[7, 7, 7], -7.5);
        txns.reverse();
        txns.push(Transaction::new(start(), -4.0, "ONE OFF"));
        let found = detect_recurring(&txns, &RecurrenceThresholds::default());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].description, "PURE GYM");
        assert_eq!(monthly_commitment(&found), -30.0);
    }

    #[test]
    fn test_custom_bands() {
        let thresholds = RecurrenceThresholds {
            weekly: DayBand { min: 13.0, max: 15.0 },
            ..RecurrenceThresholds::default()
        };
        let txns = series("FORTNIGHTLY", start(), &[14, 14, 14], -10.0);
        let found = detect_recurring(&txns, &thresholds);
        assert_eq!(found[0].frequency, Frequency::Weekly);
    }
}
