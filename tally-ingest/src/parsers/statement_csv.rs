//! Generic bank statement CSV parser.
//!
//! Expected layout (column order is free, extra columns are kept):
//!   Date,Description,Amount,Balance
//!   01/03/2023,DC - TESCO STORES 1234,-5.00,995.00
//!
//! Pre-classified exports may also carry Type, Category, Exchange and
//! RawDescription columns; empty cells there mean "not set".
//!
//! Cells that are not valid UTF-8 (Latin-1 "£" from older exports) are
//! decoded lossily rather than rejected.

use csv::{ByteRecord, StringRecord};
use tracing::warn;
use std::fs::File;
use std::io;
use std::path::Path;
use tally_core::Transaction;

use super::fields::{optional, parse_amount, parse_date};
use crate::error::IngestError;
use crate::types::columns;

/// Column positions resolved from a header row
struct Layout {
    date: usize,
    amount: usize,
    description: usize,
    raw_description: Option<usize>,
    kind: Option<usize>,
    category: Option<usize>,
    exchange: Option<usize>,
    extra: Vec<(usize, String)>,
}

impl Layout {
    fn from_headers(source_name: &str, headers: &StringRecord) -> Result<Self, IngestError> {
        let names: Vec<&str> = headers
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').trim())
            .collect();
        let find = |column: &str| names.iter().position(|h| *h == column);
        let require = |column: &'static str| {
            find(column).ok_or_else(|| IngestError::MissingColumn {
                source_name: source_name.to_string(),
                column,
            })
        };

        let known = [
            columns::DATE,
            columns::AMOUNT,
            columns::DESCRIPTION,
            columns::RAW_DESCRIPTION,
            columns::TYPE,
            columns::CATEGORY,
            columns::EXCHANGE,
        ];
        let extra = names
            .iter()
            .enumerate()
            .filter(|(_, h)| !h.is_empty() && !known.contains(*h))
            .map(|(i, h)| (i, h.to_string()))
            .collect();

        Ok(Self {
            date: require(columns::DATE)?,
            amount: require(columns::AMOUNT)?,
            description: require(columns::DESCRIPTION)?,
            raw_description: find(columns::RAW_DESCRIPTION),
            kind: find(columns::TYPE),
            category: find(columns::CATEGORY),
            exchange: find(columns::EXCHANGE),
            extra,
        })
    }

    fn read(
        &self,
        source_name: &str,
        line: u64,
        record: &StringRecord,
    ) -> Result<Transaction, IngestError> {
        let cell = move |i: usize| record.get(i).unwrap_or("").trim();
        let maybe = move |i: Option<usize>| optional(i.and_then(|i| record.get(i)));

        let date = parse_date(cell(self.date)).ok_or_else(|| IngestError::InvalidDate {
            source_name: source_name.to_string(),
            line,
            value: cell(self.date).to_string(),
        })?;
        let amount = parse_amount(cell(self.amount)).unwrap_or_else(|| {
            warn!(file = %source_name, line, value = cell(self.amount), "unreadable amount, using 0");
            0.0
        });

        let mut txn = Transaction::new(date, amount, cell(self.description));
        txn.raw_description = maybe(self.raw_description);
        txn.kind = maybe(self.kind);
        txn.category = maybe(self.category);
        txn.exchange = maybe(self.exchange);
        for (i, name) in &self.extra {
            txn.extra.insert(name.clone(), cell(*i).to_string());
        }
        Ok(txn)
    }
}

/// Parse one statement file
pub fn parse_statement(path: impl AsRef<Path>) -> Result<Vec<Transaction>, IngestError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| IngestError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_statement_reader(&path.display().to_string(), file)
}

/// Parse statement CSV from any reader. `source_name` only labels errors.
pub fn parse_statement_reader<R: io::Read>(
    source_name: &str,
    reader: R,
) -> Result<Vec<Transaction>, IngestError> {
    let csv_err = |source: csv::Error| IngestError::Csv {
        source_name: source_name.to_string(),
        source,
    };

    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = StringRecord::from_byte_record_lossy(rdr.byte_headers().map_err(csv_err)?.clone());
    let layout = Layout::from_headers(source_name, &headers)?;

    let mut raw = ByteRecord::new();
    let mut txns = Vec::new();
    while rdr.read_byte_record(&mut raw).map_err(csv_err)? {
        let line = raw.position().map(|p| p.line()).unwrap_or(0);
        let record = StringRecord::from_byte_record_lossy(raw.clone());
        // Trailing separator-only lines carry no data
        if record.iter().all(|c| c.trim().is_empty()) {
            continue;
        }
        txns.push(layout.read(source_name, line, &record)?);
    }

    Ok(txns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_parse_basic_statement() {
        let csv = "\
Date,Description,Amount,Balance
01/03/2023,TESCO STORES 1234,-5.00,995.00
02/03/2023,Bank Credit - ACME LTD,2000.00,2995.00
";
        let txns = parse_statement_reader("basic.csv", csv.as_bytes()).unwrap();
        assert_eq!(txns.len(), 2);
        assert_eq!(txns[0].date, NaiveDate::from_ymd_opt(2023, 3, 1).unwrap());
        assert_eq!(txns[0].amount, -5.0);
        assert_eq!(txns[0].description, "TESCO STORES 1234");
        assert_eq!(txns[0].extra.get("Balance").map(String::as_str), Some("995.00"));
        assert_eq!(txns[0].kind, None);
        assert_eq!(txns[1].amount, 2000.0);
    }

    #[test]
    fn test_headers_and_cells_are_trimmed() {
        let csv = " Date , Amount , Description \n 05/01/2023 , -1.50 ,  SUBWAY 22  \n";
        let txns = parse_statement_reader("padded.csv", csv.as_bytes()).unwrap();
        assert_eq!(txns[0].description, "SUBWAY 22");
        assert_eq!(txns[0].amount, -1.5);
    }

    #[test]
    fn test_preclassified_columns() {
        let csv = "\
Date,Description,Type,Category,Exchange,Amount
01/04/23,LANDLORD RENT,Standing Order,,,-750.00
";
        let txns = parse_statement_reader("card.csv", csv.as_bytes()).unwrap();
        assert_eq!(txns[0].kind.as_deref(), Some("Standing Order"));
        assert_eq!(txns[0].category, None);
        assert_eq!(txns[0].exchange, None);
        assert!(txns[0].extra.is_empty());
    }

    #[test]
    fn test_missing_required_column() {
        let csv = "Date,Amount\n01/03/2023,-5.00\n";
        let err = parse_statement_reader("short.csv", csv.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            IngestError::MissingColumn { column: "Description", .. }
        ));
    }

    #[test]
    fn test_invalid_date_reports_line() {
        let csv = "Date,Description,Amount\n01/03/2023,A,-1\nnot a date,B,-2\n";
        let err = parse_statement_reader("bad.csv", csv.as_bytes()).unwrap_err();
        match err {
            IngestError::InvalidDate { line, value, .. } => {
                assert_eq!(line, 3);
                assert_eq!(value, "not a date");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unreadable_amount_is_zero() {
        let csv = "Date,Description,Amount\n01/03/2023,A,n/a\n02/03/2023,B,-2\n";
        let txns = parse_statement_reader("amounts.csv", csv.as_bytes()).unwrap();
        assert_eq!(txns.len(), 2);
        assert_eq!(txns[0].amount, 0.0);
        assert_eq!(txns[1].amount, -2.0);
    }

    #[test]
    fn test_latin1_bytes_are_decoded_lossily() {
        let csv: &[u8] =
            b"Date,Description,Amount\n01/03/2023,TESCO \xa3 STORES,-5.00\n02/03/2023,SUBWAY,-3.00\n";
        let txns = parse_statement_reader("latin1.csv", csv).unwrap();
        assert_eq!(txns.len(), 2);
        assert_eq!(txns[0].description, "TESCO \u{fffd} STORES");
        assert_eq!(txns[0].amount, -5.0);
        assert_eq!(txns[1].description, "SUBWAY");
    }

    #[test]
    fn test_five_digit_year_is_an_invalid_date() {
        let csv = "Date,Description,Amount\n01/03/20230,A,-1\n";
        let err = parse_statement_reader("year.csv", csv.as_bytes()).unwrap_err();
        assert!(matches!(err, IngestError::InvalidDate { line: 2, .. }));
    }

    #[test]
    fn test_short_rows_and_blank_lines() {
        let csv = "Date,Description,Amount,Category\n01/03/2023,A,-1\n,,,\n";
        let txns = parse_statement_reader("ragged.csv", csv.as_bytes()).unwrap();
        assert_eq!(txns.len(), 1);
        assert_eq!(txns[0].category, None);
    }
}
