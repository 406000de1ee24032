//! Flight aggregation parameters.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};
use crate::schema::{flight, time};

/// Which end of an itinerary the aggregation is keyed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Origin,
    #[default]
    Destination,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Origin => "origin",
            Direction::Destination => "destination",
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Direction::Origin => Direction::Destination,
            Direction::Destination => Direction::Origin,
        }
    }

    pub fn country_column(self) -> &'static str {
        match self {
            Direction::Origin => flight::ORIGIN_COUNTRY,
            Direction::Destination => flight::DESTINATION_COUNTRY,
        }
    }

    pub fn country_code_column(self) -> &'static str {
        match self {
            Direction::Origin => flight::ORIGIN_COUNTRY_CODE,
            Direction::Destination => flight::DESTINATION_COUNTRY_CODE,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "origin" => Ok(Direction::Origin),
            "destination" => Ok(Direction::Destination),
            _ => Err(ModelError::UnknownDirection(s.to_string())),
        }
    }
}

/// Time bucket used when counting itineraries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    Day,
    #[default]
    YearMonth,
}

impl Granularity {
    /// Column holding the bucket value.
    pub fn column(self) -> &'static str {
        match self {
            Granularity::Day => time::DAY,
            Granularity::YearMonth => time::YEAR_MONTH,
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

impl FromStr for Granularity {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "day" => Ok(Granularity::Day),
            "year_month" | "month" => Ok(Granularity::YearMonth),
            _ => Err(ModelError::UnknownGranularity(s.to_string())),
        }
    }
}
