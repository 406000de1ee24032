//! Daily case report loading.
//!
//! Reports are read with an explicitly declared schema; cells that fail to
//! parse as their declared type become nulls. A file whose header differs
//! from the fixed layout is rejected as a whole.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use polars::prelude::*;
use tracing::{debug, info, warn};

use cfv_model::PeriodSelector;
use cfv_model::schema::case;

use crate::LoadedBatch;
use crate::discovery::discover_case_files;
use crate::error::{IngestError, Result};

/// The declared Polars schema of a daily case report.
pub fn case_schema() -> Schema {
    case::DAILY_COLUMNS
        .iter()
        .map(|&name| {
            let dtype = match name {
                case::LAT | case::LONG | case::INCIDENT_RATE | case::CASE_FATALITY_RATIO => {
                    DataType::Float64
                }
                case::CONFIRMED | case::DEATHS | case::RECOVERED | case::ACTIVE => DataType::Int64,
                _ => DataType::String,
            };
            Field::new(name.into(), dtype)
        })
        .collect()
}

fn normalize_header(raw: &str) -> String {
    raw.trim().trim_matches('\u{feff}').trim().to_string()
}

/// Check that a report's header matches the fixed 14-column layout.
///
/// Older reports use `Country/Region` and lack `Admin2`; those files are
/// rejected here rather than read with shifted columns.
pub fn validate_case_header(path: &Path) -> Result<()> {
    let file = File::open(path).map_err(|e| IngestError::open(path, e))?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(file);
    let headers = reader.headers().map_err(|e| IngestError::csv(path, e))?;
    if headers.is_empty() {
        return Err(IngestError::EmptyCsv {
            path: path.to_path_buf(),
        });
    }
    let found: Vec<String> = headers.iter().map(normalize_header).collect();
    if found.iter().map(String::as_str).ne(case::DAILY_COLUMNS.iter().copied()) {
        return Err(IngestError::SchemaMismatch {
            path: path.to_path_buf(),
            expected: case::DAILY_COLUMNS.join(","),
            found: found.join(","),
        });
    }
    Ok(())
}

/// Read one daily report into a DataFrame with the declared schema.
pub fn read_case_report(path: &Path) -> Result<DataFrame> {
    validate_case_header(path)?;
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_schema(Some(Arc::new(case_schema())))
        .with_ignore_errors(true)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .map_err(|e| IngestError::csv(path, e))?
        .finish()
        .map_err(|e| IngestError::csv(path, e))?;
    Ok(df)
}

/// Load every daily report selected by `selector` from `dir`.
///
/// Unreadable or malformed files are skipped with a warning.
pub fn load_case_reports(dir: &Path, selector: PeriodSelector) -> Result<LoadedBatch> {
    let start = Instant::now();
    let files = discover_case_files(dir, selector)?;
    debug!(
        dir = %dir.display(),
        period = %selector,
        file_count = files.len(),
        "discovered case reports"
    );

    let mut batch = LoadedBatch::default();
    for file in files {
        match read_case_report(&file.path) {
            Ok(df) => {
                debug!(path = %file.path.display(), rows = df.height(), "read case report");
                batch.push(file.path, df)?;
            }
            Err(error) => {
                warn!(path = %file.path.display(), %error, "skipping case report");
                batch.skip(file.path, error.to_string());
            }
        }
    }

    info!(
        period = %selector,
        loaded = batch.loaded.len(),
        skipped = batch.skipped.len(),
        rows = batch.row_count(),
        duration_ms = start.elapsed().as_millis(),
        "case reports loaded"
    );
    Ok(batch)
}
