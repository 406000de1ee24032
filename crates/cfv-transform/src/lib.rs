//! Aggregation stages of the case/flight pipeline.
//!
//! - **Case aggregation**: daily reports to per-country daily deltas and a
//!   country-month summary, with date cleaning and a cumulative
//!   monotonicity check
//! - **Flight mapping**: airport ICAO codes to country codes and names
//! - **Flight aggregation**: cross-border itinerary counts per time bucket
//!
//! Every stage takes a frame by reference and returns a new one. Rows that
//! cannot be used are counted, logged and dropped rather than reported as
//! errors.

mod case;
mod dates;
mod error;
mod filter;
mod flight;
mod mapper;
mod monotonic;

pub use case::{
    CaseSummary, DateCleaning, aggregate_cases, daily_case_table, derive_case_dates,
    monthly_case_summary,
};
pub use dates::{parse_flight_day, parse_report_date};
pub use error::{Result, TransformError};
pub use filter::filter_values;
pub use flight::{FlightOptions, aggregate_flights, merge_flight_summaries};
pub use mapper::{MappedFlights, map_flights};
pub use monotonic::{CumulativeDecrease, check_cumulative_monotonic};
