//! Loading processed CSV files into normalized frames.
//!
//! Files are read with every column as a string and then cast explicitly,
//! so a column that happens to be empty in one file does not change type
//! between files.

use std::io::Cursor;

use polars::prelude::*;
use tracing::{debug, info, warn};

use cfv_common::column_strings;
use cfv_model::CaseStat;
use cfv_model::schema::{case, flight, time};

use crate::error::{DashboardError, Result};
use crate::pattern::wildcard_match;
use crate::source::FileSource;

/// Parse raw CSV bytes with all columns as strings.
pub fn read_csv_bytes(name: &str, bytes: Vec<u8>) -> Result<DataFrame> {
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .into_reader_with_file_handle(Cursor::new(bytes))
        .finish()
        .map_err(|e| DashboardError::Csv {
            name: name.to_string(),
            message: e.to_string(),
        })
}

fn require(df: &DataFrame, column: &str, name: &str) -> Result<()> {
    if df.column(column).is_err() {
        return Err(DashboardError::MissingColumn {
            column: column.to_string(),
            name: name.to_string(),
        });
    }
    Ok(())
}

fn float_or_null(df: &DataFrame, column: &str) -> Expr {
    if df.column(column).is_ok() {
        col(column).cast(DataType::Float64)
    } else {
        lit(NULL).cast(DataType::Float64).alias(column)
    }
}

/// Keep `year_month`, `Country_Region` and the four cumulative counters
/// as `Float64`. Monthly-new columns are dropped; they are recomputed
/// after merging.
pub fn normalize_case_frame(df: &DataFrame, name: &str) -> Result<DataFrame> {
    require(df, time::YEAR_MONTH, name)?;
    require(df, case::COUNTRY_REGION, name)?;

    let mut columns = vec![
        col(time::YEAR_MONTH).cast(DataType::String),
        col(case::COUNTRY_REGION).cast(DataType::String),
    ];
    for stat in CaseStat::ALL {
        let column = stat.cumulative_column();
        columns.push(float_or_null(df, &column));
    }
    Ok(df.clone().lazy().select(columns).collect()?)
}

/// Keep `year_month`, the four endpoint columns and `flight_count` as
/// `Int64`. Day-granularity files get `year_month` from their `day`.
pub fn normalize_flight_frame(df: &DataFrame, name: &str) -> Result<DataFrame> {
    for column in [
        flight::ORIGIN_COUNTRY,
        flight::ORIGIN_COUNTRY_CODE,
        flight::DESTINATION_COUNTRY,
        flight::DESTINATION_COUNTRY_CODE,
        flight::FLIGHT_COUNT,
    ] {
        require(df, column, name)?;
    }

    let mut frame = df.clone();
    if frame.column(time::YEAR_MONTH).is_err() {
        require(&frame, time::DAY, name)?;
        let months: Vec<Option<String>> = column_strings(&frame, time::DAY)?
            .into_iter()
            .map(|day| day.and_then(|d| d.get(..7).map(str::to_string)))
            .collect();
        frame.with_column(Series::new(time::YEAR_MONTH.into(), months).into_column())?;
    }

    let normalized = frame
        .lazy()
        .select([
            col(time::YEAR_MONTH).cast(DataType::String),
            col(flight::ORIGIN_COUNTRY).cast(DataType::String),
            col(flight::ORIGIN_COUNTRY_CODE).cast(DataType::String),
            col(flight::DESTINATION_COUNTRY).cast(DataType::String),
            col(flight::DESTINATION_COUNTRY_CODE).cast(DataType::String),
            col(flight::FLIGHT_COUNT)
                .cast(DataType::Float64)
                .cast(DataType::Int64),
        ])
        .collect()?;
    Ok(normalized)
}

/// Read and stack every file in `source` whose name matches `pattern`.
///
/// Returns `None` when nothing matches. Each file passes through
/// `normalize` before stacking.
pub fn load_matching(
    source: &dyn FileSource,
    pattern: &str,
    normalize: fn(&DataFrame, &str) -> Result<DataFrame>,
) -> Result<Option<DataFrame>> {
    let names: Vec<String> = source
        .list()?
        .into_iter()
        .filter(|name| wildcard_match(pattern, name))
        .collect();
    if names.is_empty() {
        warn!(pattern, source = %source.describe(), "no processed files matched");
        return Ok(None);
    }

    let mut stacked: Option<DataFrame> = None;
    for name in &names {
        let raw = read_csv_bytes(name, source.fetch(name)?)?;
        let frame = normalize(&raw, name)?;
        debug!(file = %name, rows = frame.height(), "loaded processed file");
        match stacked.as_mut() {
            Some(existing) => {
                existing.vstack_mut(&frame)?;
            }
            None => stacked = Some(frame),
        }
    }

    let rows = stacked.as_ref().map_or(0, DataFrame::height);
    info!(pattern, files = names.len(), rows, "processed files loaded");
    Ok(stacked)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cfv_common::{column_f64, column_i64};

    #[test]
    fn test_case_frame_is_normalized() {
        let raw = read_csv_bytes(
            "covid_202101_all.csv",
            b"year_month,Country_Region,Confirmed_cumulative,Confirmed_monthly_new,Deaths_cumulative\n\
              2021-01,US,190,90,\n"
                .to_vec(),
        )
        .unwrap();
        let df = normalize_case_frame(&raw, "covid_202101_all.csv").unwrap();
        assert_eq!(df.width(), 6);
        assert_eq!(column_f64(&df, "Confirmed_cumulative").unwrap(), vec![Some(190.0)]);
        assert_eq!(column_f64(&df, "Deaths_cumulative").unwrap(), vec![None]);
        assert_eq!(column_f64(&df, "Active_cumulative").unwrap(), vec![None]);
        assert!(df.column("Confirmed_monthly_new").is_err());
    }

    #[test]
    fn test_day_flight_file_gets_year_month() {
        let raw = read_csv_bytes(
            "flight_202101_US.csv",
            b"day,origin_country,origin_country_code,destination_country,destination_country_code,flight_count\n\
              2021-01-03,Germany,DE,United States,US,4\n"
                .to_vec(),
        )
        .unwrap();
        let df = normalize_flight_frame(&raw, "flight_202101_US.csv").unwrap();
        assert_eq!(
            column_strings(&df, "year_month").unwrap(),
            vec![Some("2021-01".to_string())]
        );
        assert_eq!(column_i64(&df, "flight_count").unwrap(), vec![Some(4)]);
    }

    #[test]
    fn test_missing_column_names_file() {
        let raw = read_csv_bytes("covid_x_all.csv", b"month,country\n2021-01,US\n".to_vec()).unwrap();
        let err = normalize_case_frame(&raw, "covid_x_all.csv").unwrap_err();
        assert_eq!(
            err.to_string(),
            "required column 'year_month' not found in covid_x_all.csv"
        );
    }
}
