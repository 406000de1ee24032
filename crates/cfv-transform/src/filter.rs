//! Row filters shared by the case and flight stages.

use std::collections::HashSet;

use polars::prelude::{BooleanChunked, DataFrame, NewChunkedArray};

use cfv_common::column_strings;

use crate::error::Result;

/// Keep rows whose `column` value is one of `allowed`.
///
/// Nulls never match. An empty allow-list keeps nothing.
pub fn filter_values(df: &DataFrame, column: &str, allowed: &[String]) -> Result<DataFrame> {
    let allowed: HashSet<&str> = allowed.iter().map(String::as_str).collect();
    let keep: Vec<bool> = column_strings(df, column)?
        .iter()
        .map(|value| value.as_deref().is_some_and(|v| allowed.contains(v)))
        .collect();
    let mask = BooleanChunked::from_slice("allowed".into(), &keep);
    Ok(df.filter(&mask)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    #[test]
    fn test_filter_values() {
        let df = df!(
            "Country_Region" => [Some("US"), Some("Italy"), None, Some("US")],
            "Confirmed" => [1i64, 2, 3, 4],
        )
        .unwrap();

        let kept = filter_values(&df, "Country_Region", &["US".to_string()]).unwrap();
        assert_eq!(kept.height(), 2);

        let none = filter_values(&df, "Country_Region", &[]).unwrap();
        assert_eq!(none.height(), 0);
    }
}
