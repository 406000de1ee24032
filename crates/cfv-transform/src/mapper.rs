//! Airport-to-country resolution for flight itineraries.

use chrono::NaiveDate;
use polars::prelude::*;
use tracing::{info, warn};

use cfv_common::{column_strings, null_counts};
use cfv_ingest::ReferenceTables;
use cfv_model::YearMonth;
use cfv_model::schema::{flight, time};

use crate::dates::parse_flight_day;
use crate::error::{Result, require_columns};

/// Mapped itineraries plus the per-column missing counts seen before
/// unresolved rows were dropped.
#[derive(Debug, Clone)]
pub struct MappedFlights {
    pub frame: DataFrame,
    pub input_rows: usize,
    pub missing: Vec<(String, usize)>,
}

impl MappedFlights {
    pub fn dropped_rows(&self) -> usize {
        self.input_rows - self.frame.height()
    }
}

struct Endpoint<'a> {
    icao: Option<&'a str>,
    code: Option<&'a str>,
    country: Option<&'a str>,
}

fn resolve<'a>(tables: &'a ReferenceTables, icao: Option<&'a str>) -> Endpoint<'a> {
    let code = icao.and_then(|icao| tables.airport_country(icao));
    let country = code.and_then(|code| tables.country_name(code));
    Endpoint {
        icao,
        code,
        country,
    }
}

fn pick<'a>(
    ends: &[Endpoint<'a>],
    field: impl Fn(&Endpoint<'a>) -> Option<&'a str>,
) -> Vec<Option<&'a str>> {
    ends.iter().map(field).collect()
}

fn string_column(name: &str, values: Vec<Option<&str>>) -> Column {
    Series::new(name.into(), values).into_column()
}

/// Resolve origin and destination airports to countries.
///
/// Rows whose day, origin country or destination country cannot be resolved
/// are dropped after the missing counts are logged.
pub fn map_flights(raw: &DataFrame, tables: &ReferenceTables) -> Result<MappedFlights> {
    require_columns(
        raw,
        &[flight::DAY, flight::ORIGIN, flight::DESTINATION],
        "flight mapper",
    )?;

    let days = column_strings(raw, flight::DAY)?;
    let origins = column_strings(raw, flight::ORIGIN)?;
    let destinations = column_strings(raw, flight::DESTINATION)?;

    let parsed: Vec<Option<NaiveDate>> = days
        .iter()
        .map(|day| day.as_deref().and_then(parse_flight_day))
        .collect();
    let day_values: Vec<Option<String>> = parsed
        .iter()
        .map(|day| day.map(|d| d.format("%Y-%m-%d").to_string()))
        .collect();
    let month_values: Vec<Option<String>> = parsed
        .iter()
        .map(|day| day.map(|d| YearMonth::from_date(d).to_string()))
        .collect();

    let origin: Vec<Endpoint<'_>> = origins
        .iter()
        .map(|icao| resolve(tables, icao.as_deref()))
        .collect();
    let destination: Vec<Endpoint<'_>> = destinations
        .iter()
        .map(|icao| resolve(tables, icao.as_deref()))
        .collect();

    let keep: Vec<bool> = parsed
        .iter()
        .zip(origin.iter().zip(&destination))
        .map(|(day, (from, to))| day.is_some() && from.country.is_some() && to.country.is_some())
        .collect();

    let frame = DataFrame::new(vec![
        Series::new(time::DAY.into(), day_values).into_column(),
        Series::new(time::YEAR_MONTH.into(), month_values).into_column(),
        string_column(flight::ORIGIN_COUNTRY, pick(&origin, |e| e.country)),
        string_column(flight::ORIGIN_COUNTRY_CODE, pick(&origin, |e| e.code)),
        string_column(flight::DESTINATION_COUNTRY, pick(&destination, |e| e.country)),
        string_column(flight::DESTINATION_COUNTRY_CODE, pick(&destination, |e| e.code)),
        string_column(flight::ORIGIN_ICAO, pick(&origin, |e| e.icao)),
        string_column(flight::DESTINATION_ICAO, pick(&destination, |e| e.icao)),
    ])?;

    let missing: Vec<(String, usize)> = null_counts(&frame)
        .into_iter()
        .filter(|(_, nulls)| *nulls > 0)
        .collect();
    for (column, nulls) in &missing {
        warn!(column = %column, nulls, "unresolved values in mapped flights");
    }

    let input_rows = frame.height();
    let frame = frame.filter(&BooleanChunked::from_slice("resolved".into(), &keep))?;
    info!(
        input_rows,
        mapped_rows = frame.height(),
        dropped = input_rows - frame.height(),
        "flight mapping complete"
    );

    Ok(MappedFlights {
        frame,
        input_rows,
        missing,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn tables() -> ReferenceTables {
        let airports = HashMap::from([
            ("KJFK".to_string(), "US".to_string()),
            ("EDDF".to_string(), "DE".to_string()),
            ("ZZZZ".to_string(), "XX".to_string()),
        ]);
        let countries = HashMap::from([
            ("US".to_string(), "United States".to_string()),
            ("DE".to_string(), "Germany".to_string()),
        ]);
        ReferenceTables::new(airports, countries)
    }

    #[test]
    fn test_maps_and_drops_unresolved() {
        let raw = df!(
            "day" => [
                Some("2021-01-01 00:00:00+00:00"),
                Some("2021-01-02 00:00:00+00:00"),
                Some("2021-01-03 00:00:00+00:00"),
                None,
            ],
            "origin" => [Some("EDDF"), Some("ZZZZ"), None, Some("EDDF")],
            "destination" => [Some("KJFK"), Some("KJFK"), Some("KJFK"), Some("KJFK")],
        )
        .unwrap();

        let mapped = map_flights(&raw, &tables()).unwrap();
        assert_eq!(mapped.frame.height(), 1);
        assert_eq!(mapped.dropped_rows(), 3);

        let row = &mapped.frame;
        assert_eq!(
            column_strings(row, "origin_country").unwrap(),
            vec![Some("Germany".to_string())]
        );
        assert_eq!(
            column_strings(row, "destination_country_code").unwrap(),
            vec![Some("US".to_string())]
        );
        assert_eq!(
            column_strings(row, "year_month").unwrap(),
            vec![Some("2021-01".to_string())]
        );
        assert_eq!(
            column_strings(row, "day").unwrap(),
            vec![Some("2021-01-01".to_string())]
        );

        let missing: HashMap<String, usize> = mapped.missing.into_iter().collect();
        assert_eq!(missing.get("origin_country"), Some(&2));
        assert_eq!(missing.get("origin_country_code"), Some(&1));
        assert_eq!(missing.get("day"), Some(&1));
    }
}
