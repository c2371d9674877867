//! CSV ingest.
//!
//! Both inputs are positional:
//!
//! - gas: `Pwf, m(p), Qg` per row, `m(p)` may be left empty
//! - oil: a single row `Pb, Pws, Pwf, Qwf[, Pwf1, Qwf1]`, `Pb` may be left empty
//!
//! A header row is optional: a first row is a header only when none of its first three
//! fields is a number. Bad gas rows are
//! skipped and reported with their line number; good rows are still used.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;
use tracing::{debug, warn};

use crate::domain::{GasDataset, GasTestPoint, OilInput, RateTest, ReservoirState};
use crate::error::{AppError, IprError};

/// A row-level error encountered during ingest.
#[derive(Debug, Clone, PartialEq)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Gas ingest output: validated dataset plus the rows that were rejected.
#[derive(Debug, Clone)]
pub struct GasIngest {
    pub dataset: GasDataset,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
}

pub fn load_gas_csv(path: &Path) -> Result<GasIngest, AppError> {
    parse_gas_csv(open(path)?)
}

pub fn parse_gas_csv<R: Read>(reader: R) -> Result<GasIngest, AppError> {
    let mut points = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (line, result) in records(reader) {
        let record = match result {
            Ok(r) => r,
            Err(message) => {
                row_errors.push(RowError { line, message });
                continue;
            }
        };
        if is_blank(&record) || (rows_read == 0 && is_header(&record)) {
            continue;
        }
        rows_read += 1;
        match parse_gas_row(&record) {
            Ok(p) => points.push(p),
            Err(message) => row_errors.push(RowError { line, message }),
        }
    }

    for e in &row_errors {
        warn!(line = e.line, "skipping gas row: {}", e.message);
    }
    if points.is_empty() {
        return Err(IprError::validation("no valid gas test rows in the input").into());
    }
    debug!(rows_read, rows_used = points.len(), "gas CSV ingested");

    Ok(GasIngest {
        dataset: GasDataset::new(points)?,
        row_errors,
        rows_read,
    })
}

fn parse_gas_row(record: &StringRecord) -> Result<GasTestPoint, String> {
    if record.len() < 3 {
        return Err(format!("expected 3 fields (Pwf, m(p), Qg), found {}", record.len()));
    }
    let pwf = required(record, 0, "Pwf")?;
    let pseudopressure = optional(record, 1, "m(p)")?;
    let rate = required(record, 2, "Qg")?;
    Ok(GasTestPoint { pwf, rate, pseudopressure })
}

pub fn load_oil_csv(path: &Path) -> Result<OilInput, AppError> {
    parse_oil_csv(open(path)?)
}

/// Read the first data row as an oil input record. Later rows are ignored.
pub fn parse_oil_csv<R: Read>(reader: R) -> Result<OilInput, AppError> {
    let mut found = None;
    for (line, result) in records(reader) {
        let record = result.map_err(|e| row_error(line, &e))?;
        if is_blank(&record) || (found.is_none() && is_header(&record)) {
            continue;
        }
        if found.is_some() {
            warn!(line, "oil input takes a single row; ignoring the rest");
            break;
        }
        found = Some(parse_oil_row(&record).map_err(|e| row_error(line, &e))?);
    }
    found.ok_or_else(|| IprError::validation("oil input has no data row").into())
}

fn parse_oil_row(record: &StringRecord) -> Result<OilInput, String> {
    if record.len() != 4 && record.len() != 6 {
        return Err(format!(
            "expected 4 fields (Pb, Pws, Pwf, Qwf) or 6 (plus Pwf1, Qwf1), found {}",
            record.len()
        ));
    }
    let pb = optional(record, 0, "Pb")?;
    let pws = required(record, 1, "Pws")?;
    let test = RateTest {
        pwf: required(record, 2, "Pwf")?,
        rate: required(record, 3, "Qwf")?,
    };
    let second_test = if record.len() == 6 {
        match (optional(record, 4, "Pwf1")?, optional(record, 5, "Qwf1")?) {
            (Some(pwf), Some(rate)) => Some(RateTest { pwf, rate }),
            (None, None) => None,
            _ => return Err("Pwf1 and Qwf1 must be given together".to_string()),
        }
    } else {
        None
    };
    Ok(OilInput {
        reservoir: ReservoirState { pws, pb },
        test,
        second_test,
    })
}

fn open(path: &Path) -> Result<File, AppError> {
    File::open(path).map_err(|e| AppError::new(2, format!("Failed to open CSV '{}': {e}", path.display())))
}

/// Records paired with their 1-based line numbers.
fn records<R: Read>(reader: R) -> impl Iterator<Item = (usize, Result<StringRecord, String>)> {
    csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader)
        .into_records()
        .enumerate()
        .map(|(idx, result)| match result {
            Ok(r) => {
                let line = r.position().map(|p| p.line() as usize).unwrap_or(idx + 1);
                (line, Ok(r))
            }
            Err(e) => {
                let line = e.position().map(|p| p.line() as usize).unwrap_or(idx + 1);
                (line, Err(format!("CSV parse error: {e}")))
            }
        })
}

fn row_error(line: usize, message: &str) -> AppError {
    AppError::new(2, format!("line {line}: {message}"))
}

fn cell(record: &StringRecord, idx: usize) -> &str {
    // Excel likes to prefix UTF-8 files with a BOM.
    record.get(idx).unwrap_or("").trim_start_matches('\u{feff}').trim()
}

fn is_blank(record: &StringRecord) -> bool {
    record.iter().all(|f| f.trim().is_empty())
}

fn is_header(record: &StringRecord) -> bool {
    (0..3).all(|idx| cell(record, idx).parse::<f64>().is_err())
}

fn optional(record: &StringRecord, idx: usize, name: &str) -> Result<Option<f64>, String> {
    let raw = cell(record, idx);
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse::<f64>()
        .map(Some)
        .map_err(|_| format!("{name}: '{raw}' is not a number"))
}

fn required(record: &StringRecord, idx: usize, name: &str) -> Result<f64, String> {
    optional(record, idx, name)?.ok_or_else(|| format!("{name} is missing"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gas_with_header_and_bad_rows() {
        let csv = "Pwf,m(p),Qg\n3000,6e8,0\n2500,4.3e8,1200\nabc,1,2\n2000,,2600\n1500,1.6e8\n";
        let ingest = parse_gas_csv(csv.as_bytes()).unwrap();
        let pts = ingest.dataset.points();
        assert_eq!(pts.len(), 3);
        assert_eq!(pts[2].pseudopressure, None);
        assert_eq!(ingest.rows_read, 5);
        assert_eq!(ingest.row_errors.len(), 2);
        assert_eq!(ingest.row_errors[0].line, 4);
        assert!(ingest.row_errors[0].message.contains("Pwf"));
        assert_eq!(ingest.row_errors[1].line, 6);
    }

    #[test]
    fn gas_without_header() {
        let ingest = parse_gas_csv("3000, 6e8, 0\n2500, 4.3e8, 1200\n".as_bytes()).unwrap();
        assert_eq!(ingest.dataset.points().len(), 2);
        assert!(ingest.row_errors.is_empty());
        assert_eq!(ingest.dataset.reservoir_pressure(), 3000.0);
    }

    #[test]
    fn malformed_first_row_is_reported_not_taken_as_header() {
        let ingest = parse_gas_csv("abc,1,2\n3000,6e8,0\n2500,4.3e8,1200\n".as_bytes()).unwrap();
        assert_eq!(ingest.dataset.points().len(), 2);
        assert_eq!(ingest.rows_read, 3);
        assert_eq!(ingest.row_errors.len(), 1);
        assert_eq!(ingest.row_errors[0].line, 1);
        assert!(ingest.row_errors[0].message.contains("Pwf"));
    }

    #[test]
    fn gas_with_no_valid_rows_is_input_error() {
        let err = parse_gas_csv("Pwf,m,Qg\nx,y,z\n".as_bytes()).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn oil_single_row_with_second_test() {
        let input = parse_oil_csv("Pb,Pws,Pwf,Qwf,Pwf1,Qwf1\n2500,2000,1500,300,1000,450\n".as_bytes()).unwrap();
        assert_eq!(input.reservoir, ReservoirState { pws: 2000.0, pb: Some(2500.0) });
        assert_eq!(input.second_test, Some(RateTest { pwf: 1000.0, rate: 450.0 }));
    }

    #[test]
    fn oil_without_bubble_point() {
        let input = parse_oil_csv(",2000,1500,300\n".as_bytes()).unwrap();
        assert_eq!(input.reservoir.pb, None);
        assert_eq!(input.second_test, None);
    }

    #[test]
    fn oil_rejects_half_second_test() {
        let err = parse_oil_csv("2500,2000,1500,300,1000,\n".as_bytes()).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("line 1"));
    }
}
