//! Input file discovery for case and flight folders.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::debug;

use cfv_model::PeriodSelector;

use crate::error::{IngestError, Result};

/// A discovered input file with the date encoded in its name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredFile {
    pub path: PathBuf,
    pub date: NaiveDate,
}

/// Lists regular files in a directory, sorted by file name.
pub fn list_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(IngestError::DirectoryNotFound {
            path: dir.to_path_buf(),
        });
    }

    let entries = std::fs::read_dir(dir).map_err(|e| IngestError::DirectoryRead {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let mut files = Vec::new();
    for entry_result in entries {
        let entry = entry_result.map_err(|e| IngestError::DirectoryRead {
            path: dir.to_path_buf(),
            source: e,
        })?;
        let path = entry.path();
        if path.is_file() {
            files.push(path);
        }
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

fn file_name(path: &Path) -> Option<&str> {
    path.file_name().and_then(|name| name.to_str())
}

/// Parse the report date from a daily case file name (`MM-DD-YYYY.csv`).
fn case_file_date(name: &str) -> Option<NaiveDate> {
    let stem = name
        .strip_suffix(".csv")
        .or_else(|| name.strip_suffix(".CSV"))?;
    NaiveDate::parse_from_str(stem, "%m-%d-%Y").ok()
}

/// Parse the start date from a flight list name
/// (`flightlist_YYYYMMDD_YYYYMMDD.csv` or `.csv.gz`).
pub fn flight_file_start(name: &str) -> Option<NaiveDate> {
    let rest = name.strip_prefix("flightlist_")?;
    let stem = rest
        .strip_suffix(".csv.gz")
        .or_else(|| rest.strip_suffix(".csv"))?;
    let (start, end) = stem.split_once('_')?;
    if start.len() != 8 || end.len() != 8 {
        return None;
    }
    NaiveDate::parse_from_str(end, "%Y%m%d").ok()?;
    NaiveDate::parse_from_str(start, "%Y%m%d").ok()
}

fn discover(
    dir: &Path,
    selector: PeriodSelector,
    parse: impl Fn(&str) -> Option<NaiveDate>,
) -> Result<Vec<DiscoveredFile>> {
    let mut found = Vec::new();
    for path in list_files(dir)? {
        let Some(date) = file_name(&path).and_then(&parse) else {
            debug!(path = %path.display(), "ignoring file with unrecognised name");
            continue;
        };
        if selector.contains(date) {
            found.push(DiscoveredFile { path, date });
        }
    }
    found.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.path.cmp(&b.path)));
    Ok(found)
}

/// Daily case reports whose file date falls in the selected period, oldest first.
pub fn discover_case_files(dir: &Path, selector: PeriodSelector) -> Result<Vec<DiscoveredFile>> {
    discover(dir, selector, case_file_date)
}

/// Flight lists whose start date falls in the selected period, oldest first.
pub fn discover_flight_files(dir: &Path, selector: PeriodSelector) -> Result<Vec<DiscoveredFile>> {
    discover(dir, selector, flight_file_start)
}
