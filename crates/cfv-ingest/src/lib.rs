//! Input loading for the case/flight pipeline.
//!
//! This crate discovers and reads the three kinds of raw input into Polars
//! DataFrames or lookup tables:
//!
//! - **Daily case reports**: `MM-DD-YYYY.csv`, fixed 14-column schema
//! - **Monthly flight lists**: `flightlist_YYYYMMDD_YYYYMMDD.csv[.gz]`
//! - **Reference tables**: `airports.csv` and `countries.csv`
//!
//! Per-file failures for case and flight inputs are reported back to the
//! caller as skipped files rather than errors; only the reference tables are
//! required for a run.
//!
//! # Example
//!
//! ```ignore
//! use std::path::Path;
//! use cfv_ingest::{load_case_reports, load_reference_tables};
//!
//! let data = Path::new("data");
//! let reference = load_reference_tables(data)?;
//! let cases = load_case_reports(&data.join("csse_covid_19_daily_reports"), "202101".parse()?)?;
//! ```

mod case;
mod discovery;
mod error;
mod flight;
mod reference;

// === Error Types ===
pub use error::{IngestError, Result};

// === File Discovery ===
pub use discovery::{
    DiscoveredFile, discover_case_files, discover_flight_files, flight_file_start, list_files,
};

// === Case Reports ===
pub use case::{case_schema, load_case_reports, read_case_report, validate_case_header};

// === Flight Lists ===
pub use flight::{load_flight_lists, read_flight_list};

// === Reference Tables ===
pub use reference::{ReferenceTables, load_reference_tables};

use std::path::PathBuf;

use polars::prelude::DataFrame;

/// A file that was discovered but could not be used.
#[derive(Debug, Clone)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// Result of loading every file selected for a period.
///
/// `frame` is `None` when no file loaded; the period then has no data for
/// this source and the run continues.
#[derive(Debug, Default)]
pub struct LoadedBatch {
    pub frame: Option<DataFrame>,
    pub loaded: Vec<PathBuf>,
    pub skipped: Vec<SkippedFile>,
}

impl LoadedBatch {
    pub fn row_count(&self) -> usize {
        self.frame.as_ref().map_or(0, DataFrame::height)
    }

    pub(crate) fn push(&mut self, path: PathBuf, frame: DataFrame) -> Result<()> {
        match self.frame.as_mut() {
            Some(existing) => {
                existing.vstack_mut(&frame)?;
            }
            None => self.frame = Some(frame),
        }
        self.loaded.push(path);
        Ok(())
    }

    pub(crate) fn skip(&mut self, path: PathBuf, reason: impl Into<String>) {
        self.skipped.push(SkippedFile {
            path,
            reason: reason.into(),
        });
    }
}
