//! Polars column helpers.
//!
//! Whole-column extraction used by the aggregation and dashboard crates when
//! they need row-wise access, plus per-column null counts for data-quality
//! logging.

use polars::prelude::*;

/// Reads a column as optional strings, casting non-string columns first.
///
/// Empty strings are kept as `Some("")`; only nulls become `None`.
pub fn column_strings(df: &DataFrame, name: &str) -> PolarsResult<Vec<Option<String>>> {
    let column = df.column(name)?.cast(&DataType::String)?;
    Ok(column
        .str()?
        .into_iter()
        .map(|value| value.map(str::to_string))
        .collect())
}

/// Reads a column as optional `i64` values (non-strict cast).
pub fn column_i64(df: &DataFrame, name: &str) -> PolarsResult<Vec<Option<i64>>> {
    let column = df.column(name)?.cast(&DataType::Int64)?;
    Ok(column.i64()?.into_iter().collect())
}

/// Reads a column as optional `f64` values (non-strict cast).
pub fn column_f64(df: &DataFrame, name: &str) -> PolarsResult<Vec<Option<f64>>> {
    let column = df.column(name)?.cast(&DataType::Float64)?;
    Ok(column.f64()?.into_iter().collect())
}

/// Null count per column, in frame order.
pub fn null_counts(df: &DataFrame) -> Vec<(String, usize)> {
    df.get_columns()
        .iter()
        .map(|column| (column.name().to_string(), column.null_count()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_extraction() {
        let df = df!(
            "country" => [Some("US"), None, Some("Italy")],
            "count" => [Some(1i64), Some(2), None],
        )
        .unwrap();

        let names = column_strings(&df, "country").unwrap();
        assert_eq!(names, vec![Some("US".to_string()), None, Some("Italy".to_string())]);

        let counts = column_i64(&df, "count").unwrap();
        assert_eq!(counts, vec![Some(1), Some(2), None]);

        let floats = column_f64(&df, "count").unwrap();
        assert_eq!(floats, vec![Some(1.0), Some(2.0), None]);

        let nulls = null_counts(&df);
        assert_eq!(
            nulls,
            vec![("country".to_string(), 1), ("count".to_string(), 1)]
        );
    }
}
