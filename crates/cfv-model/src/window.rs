use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

/// Plausible calendar span for case records, inclusive on both ends.
///
/// Reports occasionally carry corrupt timestamps such as `2682-01-01`; rows
/// dated outside the window are dropped before aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    min_year: i32,
    max_year: i32,
}

impl DateWindow {
    pub fn new(min_year: i32, max_year: i32) -> Result<Self> {
        if min_year > max_year {
            return Err(ModelError::InvalidDateWindow {
                min: min_year,
                max: max_year,
            });
        }
        Ok(Self { min_year, max_year })
    }

    pub fn min_year(self) -> i32 {
        self.min_year
    }

    pub fn max_year(self) -> i32 {
        self.max_year
    }

    pub fn contains(self, date: NaiveDate) -> bool {
        (self.min_year..=self.max_year).contains(&date.year())
    }
}

impl Default for DateWindow {
    fn default() -> Self {
        Self {
            min_year: 2020,
            max_year: 2024,
        }
    }
}
