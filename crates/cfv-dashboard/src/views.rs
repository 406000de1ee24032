//! Derived views: focus-country time series, world choropleths and
//! per-stat correlation with flight volume.

use std::collections::BTreeSet;

use polars::prelude::*;

use cfv_common::{column_f64, column_strings};
use cfv_model::schema::{case, flight, time};
use cfv_model::{CaseStat, CountryAliases, SelectedStat, YearMonth};

use crate::correlation::pearson;
use crate::error::{DashboardError, Result};

/// Month the default range ends at when the data reaches it.
pub const DEFAULT_RANGE_END: YearMonth = match YearMonth::checked(2020, 8) {
    Some(ym) => ym,
    None => panic!("invalid default range end"),
};

/// Merged tables the dashboard draws from.
#[derive(Debug, Clone)]
pub struct DashboardData {
    /// Focus country used in file patterns, e.g. `US`.
    pub focus: String,
    /// Every country, from `covid_*_all.csv`.
    pub cases_all: Option<DataFrame>,
    /// The focus country, from `covid_*_<focus>.csv`.
    pub cases_focus: DataFrame,
    /// Flights into the focus country, from `flight_*_<focus>.csv`.
    pub flights_focus: Option<DataFrame>,
    /// Maps the focus name onto the flight tables' country names.
    pub aliases: CountryAliases,
}

impl DashboardData {
    /// `Country_Region` values the focus token stands for. File tokens
    /// write spaces as `_`.
    fn focus_names(&self) -> Vec<String> {
        let spaced = self.focus.replace('_', " ");
        if spaced == self.focus {
            vec![spaced]
        } else {
            vec![self.focus.clone(), spaced]
        }
    }

    /// Focus cases only; multi-country exports also match the focus pattern.
    fn focus_cases(&self) -> LazyFrame {
        let names = self.focus_names();
        let predicate = names
            .iter()
            .map(|name| col(case::COUNTRY_REGION).eq(lit(name.as_str())))
            .reduce(Expr::or)
            .unwrap_or_else(|| lit(false));
        self.cases_focus.clone().lazy().filter(predicate)
    }

    /// Flights into the focus country, matched on its reference-table name.
    fn focus_flights(&self) -> Option<LazyFrame> {
        let names: Vec<String> = self
            .focus_names()
            .iter()
            .map(|name| self.aliases.resolve(name).to_string())
            .collect();
        let predicate = names
            .iter()
            .map(|name| col(flight::DESTINATION_COUNTRY).eq(lit(name.as_str())))
            .reduce(Expr::or)
            .unwrap_or_else(|| lit(false));
        self.flights_focus
            .as_ref()
            .map(|flights| flights.clone().lazy().filter(predicate))
    }
}

/// Inclusive month range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthRange {
    pub start: YearMonth,
    pub end: YearMonth,
}

impl MonthRange {
    pub fn new(start: YearMonth, end: YearMonth) -> Result<Self> {
        if start > end {
            return Err(DashboardError::InvalidRange {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(Self { start, end })
    }

    /// Polars predicate on a `YYYY-MM` string column.
    fn predicate(self) -> Expr {
        col(time::YEAR_MONTH)
            .gt_eq(lit(self.start.to_string()))
            .and(col(time::YEAR_MONTH).lt_eq(lit(self.end.to_string())))
    }
}

/// Focus-country statistics and inbound flights per month.
#[derive(Debug, Clone, Default)]
pub struct TimeSeries {
    pub months: Vec<String>,
    pub stats: Vec<(SelectedStat, Vec<Option<f64>>)>,
    pub flights: Vec<Option<f64>>,
}

impl TimeSeries {
    pub fn values(&self, stat: SelectedStat) -> Option<&[Option<f64>]> {
        self.stats
            .iter()
            .find(|(candidate, _)| *candidate == stat)
            .map(|(_, values)| values.as_slice())
    }

    /// Pearson correlation of `stat` with flight volume over the series.
    pub fn correlation(&self, stat: SelectedStat) -> Option<f64> {
        let values = self.values(stat)?;
        let pairs: Vec<(Option<f64>, Option<f64>)> = values
            .iter()
            .copied()
            .zip(self.flights.iter().copied())
            .collect();
        pearson(&pairs)
    }
}

/// Values for the two world maps.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Choropleth {
    /// Flights into the focus country summed by origin country.
    pub flights_by_origin: Vec<(String, f64)>,
    /// Largest `Confirmed_monthly_new` per country.
    pub cases_by_country: Vec<(String, f64)>,
    /// Colour scale caps over all months, so maps stay comparable as the
    /// range changes.
    pub flights_zmax: Option<f64>,
    pub cases_zmax: Option<f64>,
}

/// Everything the renderer needs.
#[derive(Debug, Clone)]
pub struct DashboardView {
    pub focus: String,
    pub range: MonthRange,
    pub selected: SelectedStat,
    pub series: TimeSeries,
    pub choropleth: Choropleth,
    pub correlations: Vec<(SelectedStat, Option<f64>)>,
}

fn months_of(df: &DataFrame) -> Result<Vec<YearMonth>> {
    Ok(column_strings(df, time::YEAR_MONTH)?
        .into_iter()
        .flatten()
        .filter_map(|month| month.parse().ok())
        .collect())
}

/// Distinct months present in the focus case and flight tables, sorted.
pub fn available_months(data: &DashboardData) -> Result<Vec<YearMonth>> {
    let cases = data.focus_cases().collect()?;
    let mut months: BTreeSet<YearMonth> = months_of(&cases)?.into_iter().collect();
    if let Some(flights) = data.focus_flights() {
        months.extend(months_of(&flights.collect()?)?);
    }
    Ok(months.into_iter().collect())
}

/// First available month through `2020-08` when present, else through the
/// last available month.
pub fn default_range(months: &[YearMonth]) -> Option<MonthRange> {
    let start = *months.first()?;
    let end = if months.contains(&DEFAULT_RANGE_END) {
        DEFAULT_RANGE_END
    } else {
        *months.last()?
    };
    Some(MonthRange { start, end })
}

fn sum_or_null(name: &str) -> Expr {
    when(col(name).count().gt(lit(0)))
        .then(col(name).sum())
        .otherwise(lit(NULL).cast(DataType::Float64))
        .alias(name)
}

/// Join focus case statistics with total inbound flights per month.
pub fn time_series(data: &DashboardData, range: MonthRange) -> Result<TimeSeries> {
    let stats = SelectedStat::all();
    let columns: Vec<String> = stats.iter().map(|stat| stat.column()).collect();

    // One row per month even when several focus rows share a month.
    let cases = data
        .focus_cases()
        .group_by([col(time::YEAR_MONTH)])
        .agg(columns.iter().map(|c| sum_or_null(c)).collect::<Vec<_>>());

    let joined = match data.focus_flights() {
        Some(flights) => {
            let per_month = flights
                .group_by([col(time::YEAR_MONTH)])
                .agg([col(flight::FLIGHT_COUNT)
                    .sum()
                    .cast(DataType::Float64)
                    .alias(flight::FLIGHT_COUNT)]);
            cases.join(
                per_month,
                [col(time::YEAR_MONTH)],
                [col(time::YEAR_MONTH)],
                JoinArgs::new(JoinType::Left),
            )
        }
        None => cases.with_column(
            lit(NULL)
                .cast(DataType::Float64)
                .alias(flight::FLIGHT_COUNT),
        ),
    }
    .filter(range.predicate())
    .sort([time::YEAR_MONTH], SortMultipleOptions::default())
    .collect()?;

    let mut series = TimeSeries {
        months: column_strings(&joined, time::YEAR_MONTH)?
            .into_iter()
            .map(Option::unwrap_or_default)
            .collect(),
        flights: column_f64(&joined, flight::FLIGHT_COUNT)?,
        stats: Vec::with_capacity(stats.len()),
    };
    for (stat, column) in stats.into_iter().zip(&columns) {
        series.stats.push((stat, column_f64(&joined, column)?));
    }
    Ok(series)
}

fn pairs(df: &DataFrame, key: &str, value: &str) -> Result<Vec<(String, f64)>> {
    let keys = column_strings(df, key)?;
    let values = column_f64(df, value)?;
    Ok(keys
        .into_iter()
        .zip(values)
        .filter_map(|(k, v)| Some((k?, v?)))
        .collect())
}

fn max_value(df: &DataFrame, column: &str) -> Result<Option<f64>> {
    Ok(column_f64(df, column)?
        .into_iter()
        .flatten()
        .filter(|v| v.is_finite())
        .reduce(f64::max))
}

/// Flight volume by origin and peak monthly confirmed cases by country.
pub fn choropleth(data: &DashboardData, range: MonthRange) -> Result<Choropleth> {
    let mut out = Choropleth::default();

    if let Some(flights) = data.focus_flights() {
        let by_origin = |lf: LazyFrame| -> PolarsResult<DataFrame> {
            lf.group_by([col(flight::ORIGIN_COUNTRY)])
                .agg([col(flight::FLIGHT_COUNT).sum().cast(DataType::Float64)])
                .sort([flight::ORIGIN_COUNTRY], SortMultipleOptions::default())
                .collect()
        };
        let all_time = by_origin(flights.clone())?;
        let in_range = by_origin(flights.filter(range.predicate()))?;
        out.flights_zmax = max_value(&all_time, flight::FLIGHT_COUNT)?;
        out.flights_by_origin = pairs(&in_range, flight::ORIGIN_COUNTRY, flight::FLIGHT_COUNT)?;
    }

    if let Some(cases) = &data.cases_all {
        let column = CaseStat::Confirmed.monthly_new_column();
        let in_range = cases
            .clone()
            .lazy()
            .filter(range.predicate())
            .group_by([col(case::COUNTRY_REGION)])
            .agg([col(column.as_str()).max()])
            .sort([case::COUNTRY_REGION], SortMultipleOptions::default())
            .collect()?;
        out.cases_zmax = max_value(cases, &column)?;
        out.cases_by_country = pairs(&in_range, case::COUNTRY_REGION, &column)?;
    }

    Ok(out)
}

/// Assemble every view for one stat and month range.
///
/// Without an explicit range the default range is used.
pub fn build_view(
    data: &DashboardData,
    selected: SelectedStat,
    start: Option<YearMonth>,
    end: Option<YearMonth>,
) -> Result<DashboardView> {
    let months = available_months(data)?;
    let fallback = default_range(&months);
    let start = start
        .or(fallback.map(|r| r.start))
        .ok_or_else(|| DashboardError::InvalidRange {
            start: "?".to_string(),
            end: "?".to_string(),
        })?;
    let end = end
        .or(fallback.map(|r| r.end))
        .or(months.last().copied())
        .unwrap_or(start);
    let range = MonthRange::new(start, end)?;

    let series = time_series(data, range)?;
    let correlations = SelectedStat::all()
        .into_iter()
        .map(|stat| (stat, series.correlation(stat)))
        .collect();
    let choropleth = choropleth(data, range)?;

    Ok(DashboardView {
        focus: data.focus.clone(),
        range,
        selected,
        series,
        choropleth,
        correlations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::{CaseMerge, merge_cases};
    use cfv_model::StatKind;

    fn ym(raw: &str) -> YearMonth {
        raw.parse().unwrap()
    }

    fn data() -> DashboardData {
        let cases = df!(
            "year_month" => ["2020-06", "2020-07", "2020-08", "2020-09"],
            "Country_Region" => ["US", "US", "US", "US"],
            "Confirmed_cumulative" => [100.0, 300.0, 600.0, 1000.0],
            "Deaths_cumulative" => [1.0, 2.0, 3.0, 4.0],
            "Recovered_cumulative" => [0.0, 0.0, 0.0, 0.0],
            "Active_cumulative" => [0.0, 0.0, 0.0, 0.0],
        )
        .unwrap();
        let cases = merge_cases(&cases, CaseMerge::Sum).unwrap();
        let flights = df!(
            "year_month" => ["2020-07", "2020-07", "2020-08", "2020-09"],
            "origin_country" => ["Germany", "France", "Germany", "Germany"],
            "origin_country_code" => ["DE", "FR", "DE", "DE"],
            "destination_country" => ["United States"; 4],
            "destination_country_code" => ["US"; 4],
            "flight_count" => [10i64, 5, 30, 50],
        )
        .unwrap();
        DashboardData {
            focus: "US".to_string(),
            cases_all: Some(cases.clone()),
            cases_focus: cases,
            flights_focus: Some(flights),
            aliases: CountryAliases::default(),
        }
    }

    #[test]
    fn test_focus_views_ignore_other_countries() {
        let cases = df!(
            "year_month" => ["2020-07", "2020-07"],
            "Country_Region" => ["Italy", "United Kingdom"],
            "Confirmed_cumulative" => [1000.0, 300.0],
            "Deaths_cumulative" => [0.0, 0.0],
            "Recovered_cumulative" => [0.0, 0.0],
            "Active_cumulative" => [0.0, 0.0],
        )
        .unwrap();
        let flights = df!(
            "year_month" => ["2020-07", "2020-07"],
            "origin_country" => ["Germany", "France"],
            "origin_country_code" => ["DE", "FR"],
            "destination_country" => ["Italy", "United Kingdom of Great Britain"],
            "destination_country_code" => ["IT", "GB"],
            "flight_count" => [500i64, 6],
        )
        .unwrap();
        let mut aliases = CountryAliases::empty();
        aliases.insert("United Kingdom", "United Kingdom of Great Britain");
        let data = DashboardData {
            focus: "United_Kingdom".to_string(),
            cases_all: None,
            cases_focus: merge_cases(&cases, CaseMerge::Sum).unwrap(),
            flights_focus: Some(flights),
            aliases,
        };

        let range = MonthRange::new(ym("2020-07"), ym("2020-07")).unwrap();
        let series = time_series(&data, range).unwrap();
        assert_eq!(series.flights, vec![Some(6.0)]);
        let cumulative = SelectedStat::new(CaseStat::Confirmed, StatKind::Cumulative);
        assert_eq!(series.values(cumulative).unwrap(), &[Some(300.0)]);

        let maps = choropleth(&data, range).unwrap();
        assert_eq!(maps.flights_by_origin, vec![("France".to_string(), 6.0)]);
    }

    #[test]
    fn test_default_range_ends_at_august_2020() {
        let months = available_months(&data()).unwrap();
        let range = default_range(&months).unwrap();
        assert_eq!(range.start, ym("2020-06"));
        assert_eq!(range.end, ym("2020-08"));

        let later = [ym("2021-01"), ym("2021-02")];
        assert_eq!(default_range(&later).unwrap().end, ym("2021-02"));
        assert!(default_range(&[]).is_none());
    }

    #[test]
    fn test_time_series_left_joins_flights() {
        let range = MonthRange::new(ym("2020-06"), ym("2020-08")).unwrap();
        let series = time_series(&data(), range).unwrap();
        assert_eq!(series.months, vec!["2020-06", "2020-07", "2020-08"]);
        assert_eq!(series.flights, vec![None, Some(15.0), Some(30.0)]);
        assert_eq!(
            series.values(SelectedStat::default()).unwrap(),
            &[None, Some(200.0), Some(300.0)]
        );
    }

    #[test]
    fn test_choropleth_caps_use_all_months() {
        let range = MonthRange::new(ym("2020-07"), ym("2020-07")).unwrap();
        let maps = choropleth(&data(), range).unwrap();
        assert_eq!(
            maps.flights_by_origin,
            vec![("France".to_string(), 5.0), ("Germany".to_string(), 10.0)]
        );
        assert_eq!(maps.flights_zmax, Some(90.0));
        assert_eq!(maps.cases_by_country, vec![("US".to_string(), 200.0)]);
        assert_eq!(maps.cases_zmax, Some(400.0));
    }

    #[test]
    fn test_build_view_correlations() {
        let view = build_view(&data(), SelectedStat::default(), None, Some(ym("2020-09"))).unwrap();
        assert_eq!(view.correlations.len(), 8);
        let confirmed = view
            .correlations
            .iter()
            .find(|(stat, _)| *stat == SelectedStat::default())
            .and_then(|(_, r)| *r)
            .unwrap();
        assert!(confirmed > 0.9);
    }

    #[test]
    fn test_inverted_range_rejected() {
        let err = build_view(
            &data(),
            SelectedStat::default(),
            Some(ym("2020-09")),
            Some(ym("2020-06")),
        )
        .unwrap_err();
        assert!(matches!(err, DashboardError::InvalidRange { .. }));
    }
}
