//! Plain-text reports and the dashboard feed.

use anyhow::{Context, Result};
use tally_finance::{CategoryShare, Forecast, MonthTotals, MonthlyBuckets, RecurringPayment};

/// The month-keyed feed as JSON, or as a `var data = ...;` script
pub fn render_feed(buckets: &MonthlyBuckets, js: bool) -> Result<String> {
    if js {
        let json = serde_json::to_string(buckets).context("serialize feed")?;
        Ok(format!("var data = {json};\n"))
    } else {
        let mut json = serde_json::to_string_pretty(buckets).context("serialize feed")?;
        json.push('\n');
        Ok(json)
    }
}

pub fn render_summary(totals: &[MonthTotals]) -> String {
    let mut s = format!("{:<8} {:>12} {:>12} {:>12}\n", "Month", "In", "Out", "Change");
    for t in totals {
        s.push_str(&format!(
            "{:<8} {:>12.2} {:>12.2} {:>12.2}\n",
            t.month.to_string(),
            t.income,
            -t.expense,
            t.difference()
        ));
    }
    s
}

pub fn render_breakdown(shares: &[CategoryShare]) -> String {
    let total: f64 = shares.iter().map(|c| c.total).sum();
    let mut s = String::new();
    for c in shares {
        let pct = if total > 0.0 { c.total / total * 100.0 } else { 0.0 };
        s.push_str(&format!("{:<20} {:>12.2} {:>5.1}%\n", c.category, c.total, pct));
    }
    s.push_str(&format!("{:<20} {:>12.2}\n", "Total", total));
    s
}

pub fn render_recurring(payments: &[RecurringPayment], commitment: f64) -> String {
    let mut s: String = payments
        .iter()
        .map(|p| {
            format!(
                "[{:?}] {} | every {:.1} days (stability {:.2}) | x{} | avg {:.2} | per month {:.2}\n",
                p.frequency,
                p.description,
                p.mean_period_days,
                p.stability,
                p.occurrences,
                p.average_amount,
                p.monthly_equivalent
            )
        })
        .collect();
    s.push_str(&format!("\nMonthly equivalent: {commitment:.2}\n"));
    s
}

pub fn render_forecast(forecast: &Forecast, limit: usize) -> String {
    let months: Vec<String> = forecast.months.iter().map(|m| m.to_string()).collect();
    let mut s = format!("Based on: {}\n\n", months.join(", "));
    for p in forecast.predictions.iter().take(limit) {
        s.push_str(&format!(
            "- {} | P={:.2} | {:.1}/month | avg {:.2} | expect {:.2}\n",
            p.description, p.probability, p.average_count, p.average_amount, p.expected
        ));
    }
    s.push_str(&format!("\nPredicted next month: {:.2}\n", forecast.total));
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tally_core::Transaction;

    #[test]
    fn test_js_feed_is_a_script() {
        let buckets = MonthlyBuckets::from_transactions([Transaction::new(
            NaiveDate::from_ymd_opt(2023, 3, 1).unwrap(),
            -5.0,
            "Tesco",
        )]);
        let js = render_feed(&buckets, true).unwrap();
        assert!(js.starts_with("var data = {\"2023-03\":[{"));
        assert!(js.ends_with("};\n"));
    }

    #[test]
    fn test_summary_shows_spend_as_positive() {
        let totals = [MonthTotals {
            month: "2023-03".parse().unwrap(),
            income: 100.0,
            expense: -40.0,
        }];
        let out = render_summary(&totals);
        let row = out.lines().nth(1).unwrap();
        assert!(row.starts_with("2023-03"));
        assert!(row.contains("40.00"));
        assert!(row.contains("60.00"));
        assert!(!row.contains("-40.00"));
    }

    #[test]
    fn test_forecast_lists_months_and_total() {
        let forecast = Forecast {
            months: vec!["2023-04".parse().unwrap(), "2023-03".parse().unwrap()],
            predictions: Vec::new(),
            total: -12.5,
        };
        let out = render_forecast(&forecast, 10);
        assert!(out.starts_with("Based on: 2023-04, 2023-03\n"));
        assert!(out.ends_with("Predicted next month: -12.50\n"));
    }

    #[test]
    fn test_breakdown_percentages() {
        let shares = [
            CategoryShare { category: "Unsorted".into(), total: 75.0 },
            CategoryShare { category: "Groceries".into(), total: 25.0 },
        ];
        let out = render_breakdown(&shares);
        assert!(out.contains("75.0%"));
        assert!(out.contains("25.0%"));
        assert!(out.lines().last().unwrap().contains("100.00"));
    }
}
