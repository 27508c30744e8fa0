//! Cell parsers for statement columns.
//!
//! Exports write day-first dates, with either a two- or four-digit year:
//!   01/03/23    01/03/2023
//! Re-imported feeds use ISO dates (2023-03-01).

use chrono::{Datelike, NaiveDate};

/// Parse a statement date cell. Years outside 0..=9999 have no month key
/// and are rejected.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    let format = if s.len() == 8 { "%d/%m/%y" } else { "%d/%m/%Y" };
    NaiveDate::parse_from_str(s, format)
        .or_else(|_| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .ok()
        .filter(|d| (0..=9999).contains(&d.year()))
}

/// Parse a signed amount cell. An empty cell is zero.
pub fn parse_amount(s: &str) -> Option<f64> {
    let cleaned: String = s
        .trim()
        .chars()
        .filter(|c| !matches!(c, ',' | '£' | '$' | ' '))
        .collect();
    if cleaned.is_empty() {
        return Some(0.0);
    }
    cleaned.parse().ok()
}

/// Empty cells mean "not set"
pub fn optional(s: Option<&str>) -> Option<String> {
    s.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_day_first_dates() {
        assert_eq!(parse_date("01/03/2023"), Some(ymd(2023, 3, 1)));
        assert_eq!(parse_date("01/03/23"), Some(ymd(2023, 3, 1)));
        assert_eq!(parse_date(" 31/12/2022 "), Some(ymd(2022, 12, 31)));
    }

    #[test]
    fn test_iso_dates() {
        assert_eq!(parse_date("2023-04-15"), Some(ymd(2023, 4, 15)));
    }

    #[test]
    fn test_bad_dates() {
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("31/02/2023"), None);
        assert_eq!(parse_date("yesterday"), None);
        // A five-digit year would not fit a YYYY-MM key
        assert_eq!(parse_date("01/03/20230"), None);
    }

    #[test]
    fn test_amounts() {
        assert_eq!(parse_amount("-5.00"), Some(-5.0));
        assert_eq!(parse_amount("1,250.50"), Some(1250.5));
        assert_eq!(parse_amount("£12.40"), Some(12.4));
        assert_eq!(parse_amount(""), Some(0.0));
        assert_eq!(parse_amount("n/a"), None);
    }

    #[test]
    fn test_optional_cells() {
        assert_eq!(optional(Some("  ")), None);
        assert_eq!(optional(None), None);
        assert_eq!(optional(Some(" Cheque ")), Some("Cheque".to_string()));
    }
}
