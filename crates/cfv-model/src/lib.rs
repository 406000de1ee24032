//! Domain types shared by every stage of the case/flight pipeline.
//!
//! - **schema**: column-name constants for raw and derived tables
//! - **period**: `YearMonth` and the `PeriodSelector` that picks input files
//! - **stats**: case counters and the eight selectable dashboard statistics
//! - **flight**: aggregation direction and time granularity
//! - **scope**: country filters, export scope tokens, and name aliases
//! - **window**: the plausible calendar span for case records

pub mod error;
pub mod flight;
pub mod period;
pub mod schema;
pub mod scope;
pub mod stats;
pub mod window;

pub use error::{ModelError, Result};
pub use flight::{Direction, Granularity};
pub use period::{PeriodSelector, YearMonth};
pub use scope::{CountryAliases, CountryFilter};
pub use stats::{CaseStat, SelectedStat, StatKind};
pub use window::DateWindow;
