//! Read-only dashboard over the processed case and flight tables.
//!
//! The dashboard reads three file families from a [`FileSource`]:
//!
//! - `covid_*_all.csv`: every country, used for the case world map
//! - `covid_*_<focus>.csv`: the focus country, used for the time series
//! - `flight_*_<focus>.csv`: flights into the focus country
//!
//! Files for overlapping periods are merged by key, monthly deltas are
//! recomputed from the merged cumulative values, and the result is
//! rendered as a self-contained HTML page with Plotly figures.

mod correlation;
mod error;
mod load;
mod merge;
mod pattern;
mod render;
mod source;
mod views;

use std::path::PathBuf;

use polars::prelude::DataFrame;
use tracing::{info, warn};

use cfv_model::{CountryAliases, SelectedStat, YearMonth};

pub use correlation::pearson;
pub use error::{DashboardError, Result};
pub use load::{load_matching, normalize_case_frame, normalize_flight_frame, read_csv_bytes};
pub use merge::{CaseMerge, merge_cases, merge_flights, recompute_monthly_new};
pub use pattern::wildcard_match;
pub use render::{choropleth_figure, format_correlation, render_html, time_series_figure, write_html};
pub use source::{
    ACCESS_TOKEN_ENV, BUCKET_NAME_ENV, DataSource, FileSource, GcsSource, LocalSource,
    ObjectStoreLocation, PROCESSED_PREFIX, PROJECT_ID_ENV,
};
pub use views::{
    Choropleth, DEFAULT_RANGE_END, DashboardData, DashboardView, MonthRange, TimeSeries,
    available_months, build_view, choropleth, default_range, time_series,
};

/// Default focus country token.
pub const DEFAULT_FOCUS: &str = "US";

/// Everything needed to build one dashboard.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub source: DataSource,
    pub focus: String,
    pub stat: SelectedStat,
    pub start: Option<YearMonth>,
    pub end: Option<YearMonth>,
    pub case_merge: CaseMerge,
    /// Maps the focus name onto the flight tables' country names.
    pub aliases: CountryAliases,
    pub output: PathBuf,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            source: DataSource::Local(PathBuf::from("processed_data")),
            focus: DEFAULT_FOCUS.to_string(),
            stat: SelectedStat::default(),
            start: None,
            end: None,
            case_merge: CaseMerge::default(),
            aliases: CountryAliases::default(),
            output: PathBuf::from("dashboard.html"),
        }
    }
}

/// File patterns for a focus country: (global cases, focus cases, focus flights).
pub fn file_patterns(focus: &str) -> (String, String, String) {
    (
        "covid_*_all.csv".to_string(),
        format!("covid_*_{focus}.csv"),
        format!("flight_*_{focus}.csv"),
    )
}

/// Load and merge the three file families for `focus`.
///
/// Focus-country case files are required; the global case files and the
/// flight files are optional and only thin out the views when absent.
/// The focus pattern also matches multi-country exports such as
/// `covid_202007_Italy__US.csv`; views keep only the focus rows.
pub fn load_dashboard_data(
    source: &dyn FileSource,
    focus: &str,
    case_merge: CaseMerge,
) -> Result<DashboardData> {
    let (all_pattern, focus_pattern, flight_pattern) = file_patterns(focus);

    let cases_focus = load_matching(source, &focus_pattern, normalize_case_frame)?
        .ok_or_else(|| DashboardError::NoFiles {
            pattern: focus_pattern.clone(),
            source_desc: source.describe(),
        })?;
    let cases_focus = merge_cases(&cases_focus, case_merge)?;

    let cases_all = match load_matching(source, &all_pattern, normalize_case_frame)? {
        Some(frame) => Some(merge_cases(&frame, case_merge)?),
        None => None,
    };
    let flights_focus = match load_matching(source, &flight_pattern, normalize_flight_frame)? {
        Some(frame) => Some(merge_flights(&frame)?),
        None => {
            warn!(pattern = %flight_pattern, "no flight files; flight series will be empty");
            None
        }
    };

    info!(
        focus,
        case_merge = %case_merge,
        focus_rows = cases_focus.height(),
        global_rows = cases_all.as_ref().map_or(0, DataFrame::height),
        flight_rows = flights_focus.as_ref().map_or(0, DataFrame::height),
        "dashboard data loaded"
    );

    Ok(DashboardData {
        focus: focus.to_string(),
        cases_all,
        cases_focus,
        flights_focus,
        aliases: CountryAliases::default(),
    })
}

/// Load, build views and write the HTML page described by `config`.
pub fn build_dashboard(config: &DashboardConfig) -> Result<DashboardView> {
    let source = config.source.open()?;
    let mut data = load_dashboard_data(source.as_ref(), &config.focus, config.case_merge)?;
    data.aliases = config.aliases.clone();
    let view = build_view(&data, config.stat, config.start, config.end)?;
    write_html(&view, &config.output)?;
    info!(
        output = %config.output.display(),
        start = %view.range.start,
        end = %view.range.end,
        "dashboard written"
    );
    Ok(view)
}
