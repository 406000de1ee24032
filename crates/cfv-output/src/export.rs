use std::fs::{self, File};
use std::path::{Path, PathBuf};

use polars::prelude::{CsvWriter, DataFrame, SerWriter};
use tracing::{debug, info};

use cfv_model::PeriodSelector;

use crate::error::{OutputError, Result};

/// Which pipeline output a file holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataKind {
    Covid,
    Flight,
}

impl DataKind {
    pub fn prefix(self) -> &'static str {
        match self {
            DataKind::Covid => "covid",
            DataKind::Flight => "flight",
        }
    }
}

/// A CSV written by [`export_frame`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFile {
    pub kind: DataKind,
    pub path: PathBuf,
    pub rows: usize,
}

/// `<kind>_<period>_<scope>.csv`
pub fn export_file_name(kind: DataKind, period: PeriodSelector, scope: &str) -> String {
    format!("{}_{}_{}.csv", kind.prefix(), period.file_token(), scope)
}

/// Create the save directory when it is missing.
pub fn ensure_output_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(|source| OutputError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })
}

/// Write `df` as `<kind>_<period>_<scope>.csv` under `dir`.
///
/// An existing file with the same name is overwritten.
pub fn export_frame(
    df: &DataFrame,
    dir: &Path,
    kind: DataKind,
    period: PeriodSelector,
    scope: &str,
) -> Result<ExportedFile> {
    ensure_output_dir(dir)?;
    let path = dir.join(export_file_name(kind, period, scope));
    debug!(path = %path.display(), rows = df.height(), "writing CSV");

    let mut file = File::create(&path).map_err(|source| OutputError::CreateFile {
        path: path.clone(),
        source,
    })?;
    let mut frame = df.clone();
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(&mut frame)
        .map_err(|e| OutputError::Write {
            path: path.clone(),
            message: e.to_string(),
        })?;

    info!(
        kind = kind.prefix(),
        path = %path.display(),
        rows = df.height(),
        "exported"
    );
    Ok(ExportedFile {
        kind,
        path,
        rows: df.height(),
    })
}
