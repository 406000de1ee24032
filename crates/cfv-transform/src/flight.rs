//! Flight volume aggregation.

use polars::prelude::*;
use tracing::info;

use cfv_model::schema::flight;
use cfv_model::{Direction, Granularity};

use crate::error::{Result, require_columns};
use crate::filter::filter_values;

/// Parameters for [`aggregate_flights`].
#[derive(Debug, Clone, Default)]
pub struct FlightOptions {
    pub direction: Direction,
    pub granularity: Granularity,
    /// Country names matched against `<direction>_country`.
    pub countries: Option<Vec<String>>,
}

const ENDPOINT_COLUMNS: [&str; 4] = [
    flight::ORIGIN_COUNTRY,
    flight::ORIGIN_COUNTRY_CODE,
    flight::DESTINATION_COUNTRY,
    flight::DESTINATION_COUNTRY_CODE,
];

fn key_exprs(granularity: Granularity) -> Vec<Expr> {
    std::iter::once(granularity.column())
        .chain(ENDPOINT_COLUMNS)
        .map(col)
        .collect()
}

fn sort_columns(direction: Direction, granularity: Granularity) -> [&'static str; 3] {
    [
        direction.country_code_column(),
        direction.opposite().country_code_column(),
        granularity.column(),
    ]
}

/// Count cross-border itineraries per time bucket and country pair.
///
/// Domestic itineraries (equal origin and destination country codes) are
/// excluded before counting.
pub fn aggregate_flights(mapped: &DataFrame, options: &FlightOptions) -> Result<DataFrame> {
    let mut required = vec![options.granularity.column()];
    required.extend(ENDPOINT_COLUMNS);
    require_columns(mapped, &required, "flight aggregator")?;

    let scoped = match options.countries.as_deref() {
        Some(list) => filter_values(mapped, options.direction.country_column(), list)?,
        None => mapped.clone(),
    };

    let summary = scoped
        .lazy()
        .filter(
            col(flight::ORIGIN_COUNTRY_CODE).neq(col(flight::DESTINATION_COUNTRY_CODE)),
        )
        .group_by(key_exprs(options.granularity))
        .agg([len().cast(DataType::Int64).alias(flight::FLIGHT_COUNT)])
        .sort(
            sort_columns(options.direction, options.granularity),
            SortMultipleOptions::default(),
        )
        .collect()?;

    info!(
        direction = %options.direction,
        granularity = %options.granularity,
        input_rows = mapped.height(),
        groups = summary.height(),
        "flight aggregation complete"
    );
    Ok(summary)
}

/// Stack flight summaries and re-sum `flight_count` by key.
///
/// Summaries built from disjoint itinerary sets merge to the same totals as
/// aggregating the union directly.
pub fn merge_flight_summaries(
    summaries: &[DataFrame],
    direction: Direction,
    granularity: Granularity,
) -> Result<Option<DataFrame>> {
    let Some((first, rest)) = summaries.split_first() else {
        return Ok(None);
    };
    let mut stacked = first.clone();
    for summary in rest {
        stacked.vstack_mut(summary)?;
    }

    let merged = stacked
        .lazy()
        .with_column(col(flight::FLIGHT_COUNT).cast(DataType::Int64).fill_null(lit(0)))
        .group_by(key_exprs(granularity))
        .agg([col(flight::FLIGHT_COUNT).sum()])
        .sort(
            sort_columns(direction, granularity),
            SortMultipleOptions::default(),
        )
        .collect()?;
    Ok(Some(merged))
}
