//! Shared utilities for the case/flight pipeline crates.
//!
//! Everything here works on Polars frames and carries no knowledge of case
//! or flight semantics.

pub mod polars;

pub use polars::{column_f64, column_i64, column_strings, null_counts};
