//! Merging overlapping processed files and recomputing monthly deltas.
//!
//! Runs over several periods can export overlapping months (`covid_2021_all`
//! and `covid_202101_all`). Rows are re-aggregated by key so each
//! (month, country) appears once.

use std::fmt;
use std::str::FromStr;

use polars::prelude::*;

use cfv_model::schema::{case, time};
use cfv_model::{CaseStat, Direction, Granularity};
use cfv_transform::merge_flight_summaries;

use crate::error::Result;

/// How duplicate (month, country) case rows are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaseMerge {
    /// Add the cumulative values of duplicates.
    ///
    /// Exports from overlapping runs (`covid_2021_US.csv` next to
    /// `covid_202101_US.csv`) repeat the same month and are double-counted;
    /// use [`CaseMerge::Max`] for such folders.
    #[default]
    Sum,
    /// Keep the largest cumulative value among duplicates.
    Max,
}

impl CaseMerge {
    pub fn as_str(self) -> &'static str {
        match self {
            CaseMerge::Sum => "sum",
            CaseMerge::Max => "max",
        }
    }
}

impl fmt::Display for CaseMerge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CaseMerge {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sum" => Ok(CaseMerge::Sum),
            "max" => Ok(CaseMerge::Max),
            other => Err(format!("unknown case merge strategy: {other}")),
        }
    }
}

/// Combine duplicate (month, country) rows, filling null counters with 0,
/// then recompute `<Stat>_monthly_new` from the merged cumulative values.
pub fn merge_cases(stacked: &DataFrame, strategy: CaseMerge) -> Result<DataFrame> {
    let cumulative: Vec<String> = CaseStat::ALL
        .iter()
        .map(|stat| stat.cumulative_column())
        .collect();

    let merged = stacked
        .clone()
        .lazy()
        .with_columns(
            cumulative
                .iter()
                .map(|name| col(name.as_str()).fill_null(lit(0.0)))
                .collect::<Vec<_>>(),
        )
        .group_by([col(time::YEAR_MONTH), col(case::COUNTRY_REGION)])
        .agg(
            cumulative
                .iter()
                .map(|name| match strategy {
                    CaseMerge::Sum => col(name.as_str()).sum(),
                    CaseMerge::Max => col(name.as_str()).max(),
                })
                .collect::<Vec<_>>(),
        )
        .sort(
            [case::COUNTRY_REGION, time::YEAR_MONTH],
            SortMultipleOptions::default(),
        )
        .collect()?;

    recompute_monthly_new(&merged)
}

/// `<Stat>_monthly_new` as the month-over-month difference of
/// `<Stat>_cumulative` within each country. Each country's first month is
/// null. Expects rows sorted by (country, month).
pub fn recompute_monthly_new(merged: &DataFrame) -> Result<DataFrame> {
    let deltas: Vec<Expr> = CaseStat::ALL
        .iter()
        .map(|stat| {
            let cumulative = col(stat.cumulative_column());
            (cumulative.clone() - cumulative.shift(lit(1)).over([col(case::COUNTRY_REGION)]))
                .alias(stat.monthly_new_column())
        })
        .collect();
    Ok(merged.clone().lazy().with_columns(deltas).collect()?)
}

/// Re-sum flight counts by (month, origin, destination).
pub fn merge_flights(stacked: &DataFrame) -> Result<DataFrame> {
    let merged = merge_flight_summaries(
        std::slice::from_ref(stacked),
        Direction::Destination,
        Granularity::YearMonth,
    )?;
    Ok(merged.unwrap_or_else(|| stacked.clone()))
}
