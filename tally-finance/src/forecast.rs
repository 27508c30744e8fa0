//! Next-month spend estimate from recent per-description tallies.
//!
//! For each description seen in the lookback window:
//!   P(occurs in a month)  = months seen / lookback
//!   expected              = P * avg occurrences per month seen * avg amount

use serde::Serialize;
use std::collections::BTreeMap;
use tally_core::MonthKey;

use crate::monthly::{DescriptionTallies, Tally};

pub const DEFAULT_LOOKBACK_MONTHS: usize = 6;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub description: String,
    pub probability: f64,
    pub average_count: f64,
    pub average_amount: f64,
    /// Signed expected amount next month
    pub expected: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Forecast {
    /// Months the estimate was drawn from, newest first
    pub months: Vec<MonthKey>,
    /// Largest absolute expectation first
    pub predictions: Vec<Prediction>,
    pub total: f64,
}

/// Estimate next month from the `lookback` most recent months that have tallies.
pub fn forecast_next_month(tallies: &DescriptionTallies, lookback: usize) -> Forecast {
    let months: Vec<MonthKey> = tallies.keys().rev().take(lookback).copied().collect();

    let mut by_description: BTreeMap<&str, (usize, Tally)> = BTreeMap::new();
    for month in &months {
        for (description, tally) in &tallies[month] {
            let (seen, sum) = by_description.entry(description.as_str()).or_default();
            *seen += 1;
            sum.merge(tally);
        }
    }

    let mut predictions: Vec<Prediction> = by_description
        .into_iter()
        .filter(|(_, (_, sum))| sum.count > 0)
        .map(|(description, (seen, sum))| {
            let probability = seen as f64 / lookback as f64;
            let average_count = sum.count as f64 / seen as f64;
            let average_amount = sum.amount / sum.count as f64;
            Prediction {
                description: description.to_string(),
                probability,
                average_count,
                average_amount,
                expected: probability * average_count * average_amount,
            }
        })
        .collect();
    predictions.sort_by(|a, b| b.expected.abs().total_cmp(&a.expected.abs()));

    let total = predictions.iter().map(|p| p.expected).sum();
    Forecast {
        months,
        predictions,
        total,
    }
}
