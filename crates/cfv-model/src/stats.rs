//! Case counters and the statistics derived from them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};
use crate::schema::{case, suffix};

/// One of the four counters carried by a daily case report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CaseStat {
    Confirmed,
    Deaths,
    Recovered,
    Active,
}

impl CaseStat {
    pub const ALL: [CaseStat; 4] = [
        CaseStat::Confirmed,
        CaseStat::Deaths,
        CaseStat::Recovered,
        CaseStat::Active,
    ];

    /// Raw column name in the daily report.
    pub fn as_str(self) -> &'static str {
        match self {
            CaseStat::Confirmed => case::CONFIRMED,
            CaseStat::Deaths => case::DEATHS,
            CaseStat::Recovered => case::RECOVERED,
            CaseStat::Active => case::ACTIVE,
        }
    }

    pub fn cumulative_column(self) -> String {
        format!("{}{}", self.as_str(), suffix::CUMULATIVE)
    }

    pub fn daily_new_column(self) -> String {
        format!("{}{}", self.as_str(), suffix::DAILY_NEW)
    }

    pub fn monthly_new_column(self) -> String {
        format!("{}{}", self.as_str(), suffix::MONTHLY_NEW)
    }
}

impl fmt::Display for CaseStat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a monthly statistic is the running total or the month's increment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatKind {
    Cumulative,
    MonthlyNew,
}

/// A statistic selectable on the dashboard, e.g. `Confirmed_monthly_new`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SelectedStat {
    pub stat: CaseStat,
    pub kind: StatKind,
}

impl SelectedStat {
    pub const fn new(stat: CaseStat, kind: StatKind) -> Self {
        Self { stat, kind }
    }

    /// All eight selectable statistics, monthly-new first as on the dashboard.
    pub fn all() -> Vec<SelectedStat> {
        let mut out = Vec::with_capacity(8);
        for kind in [StatKind::MonthlyNew, StatKind::Cumulative] {
            for stat in CaseStat::ALL {
                out.push(SelectedStat::new(stat, kind));
            }
        }
        out
    }

    /// Column name in the monthly summary table.
    pub fn column(self) -> String {
        match self.kind {
            StatKind::Cumulative => self.stat.cumulative_column(),
            StatKind::MonthlyNew => self.stat.monthly_new_column(),
        }
    }

    /// Human label: `Confirmed_monthly_new` becomes `Confirmed Monthly New`.
    pub fn label(self) -> String {
        self.column()
            .split('_')
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Default for SelectedStat {
    fn default() -> Self {
        Self::new(CaseStat::Confirmed, StatKind::MonthlyNew)
    }
}

impl fmt::Display for SelectedStat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.column())
    }
}

impl FromStr for SelectedStat {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        Self::all()
            .into_iter()
            .find(|candidate| candidate.column().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| ModelError::UnknownStat(s.to_string()))
    }
}

impl TryFrom<String> for SelectedStat {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<SelectedStat> for String {
    fn from(value: SelectedStat) -> Self {
        value.column()
    }
}
