//! Error types for CSV export.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OutputError {
    /// Could not create the save directory.
    #[error("failed to create output directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not create an output file.
    #[error("failed to create {path}: {source}")]
    CreateFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Polars failed to serialize the frame.
    #[error("failed to write CSV {path}: {message}")]
    Write { path: PathBuf, message: String },
}

/// Result type for export operations.
pub type Result<T> = std::result::Result<T, OutputError>;
