//! Export the comparison table to CSV.
//!
//! One row per grid pressure, one column per method, easy to pull into a spreadsheet.

use std::io::Write;
use std::path::Path;

use crate::domain::ComparisonTable;
use crate::error::AppError;

/// Write the comparison table to a CSV file.
pub fn write_comparison_csv(path: &Path, table: &ComparisonTable) -> Result<(), AppError> {
    let writer = csv::Writer::from_path(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display())))?;
    write_comparison(writer, table)
}

/// Write the comparison table to any CSV writer.
pub fn write_comparison<W: Write>(mut writer: csv::Writer<W>, table: &ComparisonTable) -> Result<(), AppError> {
    let header = std::iter::once("pwf").chain(table.columns.iter().map(|c| c.method.column_label()));
    writer
        .write_record(header)
        .map_err(|e| AppError::new(2, format!("Failed to write export CSV header: {e}")))?;

    for (i, p) in table.pressures.iter().enumerate() {
        let row = std::iter::once(format!("{p:.4}"))
            .chain(table.columns.iter().map(|c| format!("{:.4}", c.rates[i])));
        writer
            .write_record(row)
            .map_err(|e| AppError::new(2, format!("Failed to write export CSV row: {e}")))?;
    }

    writer
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush export CSV: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ComparisonColumn, Method};

    #[test]
    fn writes_header_and_rows() {
        let table = ComparisonTable {
            pressures: vec![2000.0, 0.0],
            columns: vec![
                ComparisonColumn { method: Method::Vogel, rates: vec![0.0, 750.0] },
                ComparisonColumn { method: Method::ConstantJ, rates: vec![0.0, 1200.0] },
            ],
        };
        let mut buf = Vec::new();
        write_comparison(csv::Writer::from_writer(&mut buf), &table).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(
            text,
            "pwf,vogel,constant_j\n2000.0000,0.0000,0.0000\n0.0000,750.0000,1200.0000\n"
        );
    }
}
