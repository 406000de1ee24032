//! Error types for the dashboard data layer.

use std::path::PathBuf;
use thiserror::Error;

use cfv_model::ModelError;

#[derive(Debug, Error)]
pub enum DashboardError {
    // === Source Errors ===
    /// A required environment variable is unset or empty.
    #[error("environment variable {var} is not set")]
    MissingEnv { var: &'static str },

    /// Local processed-data directory is missing.
    #[error("processed data directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    /// Local file system failure.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Object store request failed.
    #[error("request to {url} failed: {message}")]
    Http { url: String, message: String },

    /// No file matched a required pattern.
    #[error("no files matching {pattern} in {source_desc}")]
    NoFiles {
        pattern: String,
        source_desc: String,
    },

    // === Data Errors ===
    /// A processed file could not be parsed.
    #[error("failed to parse {name}: {message}")]
    Csv { name: String, message: String },

    /// A processed file lacks a column the dashboard needs.
    #[error("required column '{column}' not found in {name}")]
    MissingColumn { column: String, name: String },

    /// Month range with start after end.
    #[error("invalid month range: {start} is after {end}")]
    InvalidRange { start: String, end: String },

    /// Failed DataFrame operation.
    #[error("DataFrame operation failed: {message}")]
    DataFrame { message: String },

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("failed to serialize figure: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<polars::prelude::PolarsError> for DashboardError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        Self::DataFrame {
            message: err.to_string(),
        }
    }
}

impl From<cfv_transform::TransformError> for DashboardError {
    fn from(err: cfv_transform::TransformError) -> Self {
        Self::DataFrame {
            message: err.to_string(),
        }
    }
}

impl DashboardError {
    pub(crate) fn http(url: &str, err: impl std::fmt::Display) -> Self {
        Self::Http {
            url: url.to_string(),
            message: err.to_string(),
        }
    }
}

/// Result type for dashboard operations.
pub type Result<T> = std::result::Result<T, DashboardError>;
