//! Daily case reports to country-month summaries.
//!
//! The aggregation runs in three steps:
//!
//! 1. [`derive_case_dates`]: parse `Last_Update` into `date` and `year_month`,
//!    dropping rows whose date is unparseable or outside the plausible window
//! 2. [`daily_case_table`]: sum counters per (date, country) and compute
//!    day-over-day deltas within each country
//! 3. [`monthly_case_summary`]: roll the daily table up to (month, country)

use chrono::NaiveDate;
use polars::prelude::*;
use tracing::{debug, info};

use cfv_common::{column_strings, null_counts};
use cfv_model::schema::{case, time};
use cfv_model::{CaseStat, DateWindow, YearMonth};

use crate::dates::parse_report_date;
use crate::error::{Result, require_columns};
use crate::filter::filter_values;
use crate::monotonic::{CumulativeDecrease, check_cumulative_monotonic};

const STAGE: &str = "case aggregator";

/// Number of offending rows logged when dates are dropped.
const BAD_DATE_SAMPLE: usize = 10;

/// Row counts from the date-cleaning step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateCleaning {
    pub input_rows: usize,
    /// Null or unparseable `Last_Update`.
    pub unparseable: usize,
    /// Parsed, but the year falls outside the window.
    pub out_of_range: usize,
}

impl DateCleaning {
    pub fn dropped_rows(&self) -> usize {
        self.unparseable + self.out_of_range
    }

    pub fn kept_rows(&self) -> usize {
        self.input_rows - self.dropped_rows()
    }

    pub fn dropped_pct(&self) -> f64 {
        if self.input_rows == 0 {
            0.0
        } else {
            self.dropped_rows() as f64 * 100.0 / self.input_rows as f64
        }
    }
}

/// Output of [`aggregate_cases`].
#[derive(Debug, Clone)]
pub struct CaseSummary {
    /// One row per (date, country) with `<Stat>_cumulative` and `<Stat>_daily_new`.
    pub daily: DataFrame,
    /// One row per (year_month, country) with `<Stat>_cumulative` and `<Stat>_monthly_new`.
    pub monthly: DataFrame,
    pub dates: DateCleaning,
    pub decreases: Vec<CumulativeDecrease>,
}

/// Add `date` and `year_month` columns derived from `Last_Update` and drop
/// rows whose date is missing or outside `window`.
pub fn derive_case_dates(raw: &DataFrame, window: DateWindow) -> Result<(DataFrame, DateCleaning)> {
    require_columns(raw, &[case::LAST_UPDATE, case::COUNTRY_REGION], STAGE)?;

    let mut cleaning = DateCleaning {
        input_rows: raw.height(),
        ..DateCleaning::default()
    };

    let parsed: Vec<Option<NaiveDate>> = column_strings(raw, case::LAST_UPDATE)?
        .iter()
        .map(|stamp| match stamp.as_deref().and_then(parse_report_date) {
            None => {
                cleaning.unparseable += 1;
                None
            }
            Some(date) if !window.contains(date) => {
                cleaning.out_of_range += 1;
                None
            }
            Some(date) => Some(date),
        })
        .collect();

    if cleaning.dropped_rows() > 0 {
        let bad: Vec<bool> = parsed.iter().map(Option::is_none).collect();
        let sample = raw
            .filter(&BooleanChunked::from_slice("bad_date".into(), &bad))?
            .select([case::LAST_UPDATE, case::COUNTRY_REGION])?
            .head(Some(BAD_DATE_SAMPLE));
        let pct = format!("{:.2}", cleaning.dropped_pct());
        info!(
            dropped = cleaning.dropped_rows(),
            unparseable = cleaning.unparseable,
            out_of_range = cleaning.out_of_range,
            pct = %pct,
            min_year = window.min_year(),
            max_year = window.max_year(),
            "dropping case rows with invalid dates"
        );
        info!("sample of rows with invalid dates:\n{sample}");
    }

    let dates: Vec<Option<String>> = parsed
        .iter()
        .map(|date| date.map(|d| d.format("%Y-%m-%d").to_string()))
        .collect();
    let months: Vec<Option<String>> = parsed
        .iter()
        .map(|date| date.map(|d| YearMonth::from_date(d).to_string()))
        .collect();
    let keep: Vec<bool> = parsed.iter().map(Option::is_some).collect();

    let mut dated = raw.clone();
    dated.with_column(Series::new(time::DATE.into(), dates).into_column())?;
    dated.with_column(Series::new(time::YEAR_MONTH.into(), months).into_column())?;
    let dated = dated.filter(&BooleanChunked::from_slice("valid_date".into(), &keep))?;

    Ok((dated, cleaning))
}

/// Sum the counters per (date, country) and compute daily deltas.
///
/// Deltas are taken within each country's own rows in date order; the first
/// day of a country's series has a null delta.
pub fn daily_case_table(dated: &DataFrame) -> Result<DataFrame> {
    let mut required = vec![time::DATE, time::YEAR_MONTH, case::COUNTRY_REGION];
    required.extend(CaseStat::ALL.iter().map(|stat| stat.as_str()));
    require_columns(dated, &required, STAGE)?;

    let sums: Vec<Expr> = CaseStat::ALL
        .iter()
        .map(|stat| col(stat.as_str()).sum())
        .collect();

    let mut outputs = vec![col(time::DATE), col(time::YEAR_MONTH), col(case::COUNTRY_REGION)];
    for stat in CaseStat::ALL {
        let counter = col(stat.as_str());
        outputs.push(counter.clone().alias(stat.cumulative_column()));
        outputs.push(
            (counter.clone() - counter.shift(lit(1)).over([col(case::COUNTRY_REGION)]))
                .alias(stat.daily_new_column()),
        );
    }

    let daily = dated
        .clone()
        .lazy()
        .filter(col(case::COUNTRY_REGION).is_not_null())
        .group_by([col(time::DATE), col(time::YEAR_MONTH), col(case::COUNTRY_REGION)])
        .agg(sums)
        .sort(
            [case::COUNTRY_REGION, time::DATE],
            SortMultipleOptions::default(),
        )
        .select(outputs)
        .collect()?;

    Ok(daily)
}

/// Roll the daily table up to one row per (year_month, country).
///
/// `<Stat>_cumulative` is the month's maximum and `<Stat>_monthly_new` the sum
/// of its non-null daily deltas, null when the month has none.
pub fn monthly_case_summary(daily: &DataFrame) -> Result<DataFrame> {
    require_columns(daily, &[time::YEAR_MONTH, case::COUNTRY_REGION], STAGE)?;

    let mut aggs = Vec::with_capacity(CaseStat::ALL.len() * 2);
    for stat in CaseStat::ALL {
        aggs.push(
            col(stat.cumulative_column())
                .max()
                .alias(stat.cumulative_column()),
        );
        let delta = col(stat.daily_new_column());
        aggs.push(
            when(delta.clone().count().gt(lit(0)))
                .then(delta.sum())
                .otherwise(lit(NULL).cast(DataType::Int64))
                .alias(stat.monthly_new_column()),
        );
    }

    let monthly = daily
        .clone()
        .lazy()
        .group_by([col(time::YEAR_MONTH), col(case::COUNTRY_REGION)])
        .agg(aggs)
        .sort(
            [case::COUNTRY_REGION, time::YEAR_MONTH],
            SortMultipleOptions::default(),
        )
        .collect()?;

    Ok(monthly)
}

/// Aggregate a raw daily case table into daily and monthly country tables.
///
/// With `countries`, only those `Country_Region` values are aggregated.
pub fn aggregate_cases(
    raw: &DataFrame,
    window: DateWindow,
    countries: Option<&[String]>,
) -> Result<CaseSummary> {
    let scoped = match countries {
        Some(list) => filter_values(raw, case::COUNTRY_REGION, list)?,
        None => raw.clone(),
    };

    let (dated, dates) = derive_case_dates(&scoped, window)?;
    let daily = daily_case_table(&dated)?;
    for (column, nulls) in null_counts(&daily) {
        debug!(column = %column, nulls, "daily case table null count");
    }

    let monthly = monthly_case_summary(&daily)?;
    let decreases = check_cumulative_monotonic(&monthly)?;

    info!(
        input_rows = dates.input_rows,
        kept_rows = dates.kept_rows(),
        daily_rows = daily.height(),
        monthly_rows = monthly.height(),
        "case aggregation complete"
    );

    Ok(CaseSummary {
        daily,
        monthly,
        dates,
        decreases,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(rows: &[(&str, &str, i64)]) -> DataFrame {
        let countries: Vec<&str> = rows.iter().map(|r| r.0).collect();
        let stamps: Vec<&str> = rows.iter().map(|r| r.1).collect();
        let confirmed: Vec<i64> = rows.iter().map(|r| r.2).collect();
        let zeros = vec![0i64; rows.len()];
        df!(
            "Country_Region" => countries,
            "Last_Update" => stamps,
            "Confirmed" => confirmed,
            "Deaths" => zeros.clone(),
            "Recovered" => zeros.clone(),
            "Active" => zeros,
        )
        .unwrap()
    }

    fn i64_values(df: &DataFrame, name: &str) -> Vec<Option<i64>> {
        df.column(name).unwrap().i64().unwrap().into_iter().collect()
    }

    #[test]
    fn test_three_march_days() {
        let df = raw(&[
            ("Italy", "2020-03-01 10:00:00", 100),
            ("Italy", "2020-03-02 10:00:00", 140),
            ("Italy", "2020-03-03 10:00:00", 190),
        ]);
        let summary = aggregate_cases(&df, DateWindow::default(), None).unwrap();

        assert_eq!(
            i64_values(&summary.daily, "Confirmed_daily_new"),
            vec![None, Some(40), Some(50)]
        );
        assert_eq!(summary.monthly.height(), 1);
        assert_eq!(i64_values(&summary.monthly, "Confirmed_cumulative"), vec![Some(190)]);
        assert_eq!(i64_values(&summary.monthly, "Confirmed_monthly_new"), vec![Some(90)]);
    }

    #[test]
    fn test_provinces_are_summed_per_day() {
        let df = raw(&[
            ("Canada", "2020-04-01 10:00:00", 10),
            ("Canada", "2020-04-01 11:00:00", 5),
            ("Canada", "2020-04-02 10:00:00", 20),
        ]);
        let summary = aggregate_cases(&df, DateWindow::default(), None).unwrap();
        assert_eq!(
            i64_values(&summary.daily, "Confirmed_cumulative"),
            vec![Some(15), Some(20)]
        );
    }

    #[test]
    fn test_deltas_do_not_cross_countries() {
        let df = raw(&[
            ("Italy", "2020-03-01 10:00:00", 100),
            ("Spain", "2020-03-01 10:00:00", 5),
            ("Italy", "2020-03-02 10:00:00", 140),
            ("Spain", "2020-03-02 10:00:00", 8),
        ]);
        let summary = aggregate_cases(&df, DateWindow::default(), None).unwrap();
        assert_eq!(
            column_strings(&summary.daily, "Country_Region").unwrap(),
            vec![
                Some("Italy".to_string()),
                Some("Italy".to_string()),
                Some("Spain".to_string()),
                Some("Spain".to_string()),
            ]
        );
        assert_eq!(
            i64_values(&summary.daily, "Confirmed_daily_new"),
            vec![None, Some(40), None, Some(3)]
        );
    }

    #[test]
    fn test_out_of_range_and_garbage_dates_dropped() {
        let df = raw(&[
            ("Italy", "2020-03-01 10:00:00", 100),
            ("Italy", "2682-01-01 00:00:00", 999),
            ("Italy", "not a date", 5),
        ]);
        let (dated, cleaning) = derive_case_dates(&df, DateWindow::default()).unwrap();
        assert_eq!(dated.height(), 1);
        assert_eq!(cleaning.out_of_range, 1);
        assert_eq!(cleaning.unparseable, 1);
        assert_eq!(cleaning.kept_rows(), 1);
    }

    #[test]
    fn test_single_day_month_has_null_monthly_new() {
        let df = raw(&[
            ("Italy", "2020-03-31 10:00:00", 100),
            ("Italy", "2020-04-01 10:00:00", 130),
        ]);
        let summary = aggregate_cases(&df, DateWindow::default(), None).unwrap();
        assert_eq!(
            i64_values(&summary.monthly, "Confirmed_monthly_new"),
            vec![None, Some(30)]
        );
    }

    #[test]
    fn test_country_allow_list() {
        let df = raw(&[
            ("Italy", "2020-03-01 10:00:00", 100),
            ("US", "2020-03-01 10:00:00", 50),
        ]);
        let summary =
            aggregate_cases(&df, DateWindow::default(), Some(&["US".to_string()])).unwrap();
        assert_eq!(summary.monthly.height(), 1);
        assert_eq!(
            column_strings(&summary.monthly, "Country_Region").unwrap(),
            vec![Some("US".to_string())]
        );
    }

    #[test]
    fn test_missing_column_is_error() {
        let df = df!("Country_Region" => ["Italy"]).unwrap();
        assert!(aggregate_cases(&df, DateWindow::default(), None).is_err());
    }
}
