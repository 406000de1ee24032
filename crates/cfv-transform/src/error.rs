//! Error types for aggregation and mapping.

use thiserror::Error;

/// Errors raised while transforming loaded tables.
///
/// Bad rows are never errors; they are counted and dropped. These variants
/// cover structural problems with the input frames themselves.
#[derive(Debug, Error)]
pub enum TransformError {
    /// A column the stage depends on is absent.
    #[error("required column '{column}' not found in {stage} input")]
    MissingColumn { column: String, stage: &'static str },

    /// Failed DataFrame operation.
    #[error("DataFrame operation failed: {message}")]
    DataFrame { message: String },
}

impl From<polars::prelude::PolarsError> for TransformError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        Self::DataFrame {
            message: err.to_string(),
        }
    }
}

/// Result type for transform operations.
pub type Result<T> = std::result::Result<T, TransformError>;

pub(crate) fn require_columns(
    df: &polars::prelude::DataFrame,
    columns: &[&str],
    stage: &'static str,
) -> Result<()> {
    for column in columns {
        if df.column(column).is_err() {
            return Err(TransformError::MissingColumn {
                column: (*column).to_string(),
                stage,
            });
        }
    }
    Ok(())
}
