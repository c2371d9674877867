//! Read/write run JSON files.
//!
//! A run file is the portable record of one `ipr gas` / `ipr oil` run:
//! - fitted parameters, equation and AOF per method
//! - every predicted curve
//! - deviation reports against the baseline
//!
//! `ipr plot` re-renders it without refitting. The schema is `domain::RunFile`.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use crate::domain::RunFile;
use crate::error::AppError;

/// Write a run JSON file.
pub fn write_run_json(path: &Path, run: &RunFile) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create run JSON '{}': {e}", path.display())))?;

    serde_json::to_writer_pretty(BufWriter::new(file), run)
        .map_err(|e| AppError::new(2, format!("Failed to write run JSON: {e}")))?;

    Ok(())
}

/// Read a run JSON file.
pub fn read_run_json(path: &Path) -> Result<RunFile, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open run JSON '{}': {e}", path.display())))?;
    let run: RunFile =
        serde_json::from_reader(file).map_err(|e| AppError::new(2, format!("Invalid run JSON: {e}")))?;
    if run.curves.is_empty() {
        return Err(AppError::new(2, "Run JSON contains no curves."));
    }
    Ok(run)
}
