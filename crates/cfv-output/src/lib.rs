//! Export of aggregated tables to CSV.
//!
//! File names encode the data kind, the period and the country scope:
//! `covid_202101_all.csv`, `flight_2021_United_Kingdom.csv`.

mod error;
mod export;

pub use error::{OutputError, Result};
pub use export::{DataKind, ExportedFile, ensure_output_dir, export_file_name, export_frame};
