//! Month-over-month check on cumulative counters.

use polars::prelude::{DataFrame, SortMultipleOptions};
use tracing::warn;

use cfv_common::{column_i64, column_strings};
use cfv_model::CaseStat;
use cfv_model::schema::{case, time};

use crate::error::{Result, require_columns};

/// A cumulative counter that went down from one month to the next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CumulativeDecrease {
    pub country: String,
    pub stat: CaseStat,
    pub year_month: String,
    pub previous: i64,
    pub current: i64,
}

/// Find every (country, stat, month) whose cumulative value is lower than
/// the country's previous month. Each one is logged at warn; none is fixed.
///
/// Months with a null cumulative are skipped and do not reset the
/// comparison.
pub fn check_cumulative_monotonic(monthly: &DataFrame) -> Result<Vec<CumulativeDecrease>> {
    require_columns(monthly, &[case::COUNTRY_REGION, time::YEAR_MONTH], "monotonic check")?;
    let sorted = monthly.sort(
        [case::COUNTRY_REGION, time::YEAR_MONTH],
        SortMultipleOptions::default(),
    )?;
    let countries = column_strings(&sorted, case::COUNTRY_REGION)?;
    let months = column_strings(&sorted, time::YEAR_MONTH)?;

    let mut decreases = Vec::new();
    for stat in CaseStat::ALL {
        let column = stat.cumulative_column();
        if sorted.column(&column).is_err() {
            continue;
        }
        let values = column_i64(&sorted, &column)?;

        let mut previous: Option<(&str, i64)> = None;
        for ((country, month), value) in countries.iter().zip(&months).zip(values) {
            let (Some(country), Some(value)) = (country.as_deref(), value) else {
                continue;
            };
            if let Some((prev_country, prev_value)) = previous
                && prev_country == country
                && value < prev_value
            {
                let year_month = month.clone().unwrap_or_default();
                warn!(
                    country,
                    stat = %stat,
                    year_month = %year_month,
                    previous = prev_value,
                    current = value,
                    "cumulative count decreased"
                );
                decreases.push(CumulativeDecrease {
                    country: country.to_string(),
                    stat,
                    year_month,
                    previous: prev_value,
                    current: value,
                });
            }
            previous = Some((country, value));
        }
    }
    Ok(decreases)
}
