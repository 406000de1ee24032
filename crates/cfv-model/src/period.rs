//! Calendar months and the selector that picks which input files a run reads.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

/// A calendar month, rendered as `YYYY-MM`.
///
/// Ordering is chronological, so `YearMonth` can be used directly as a sort
/// key and range bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(ModelError::InvalidYearMonth(format!("{year:04}-{month:02}")));
        }
        Ok(Self { year, month })
    }

    /// Const-friendly constructor; `None` when the month is out of range.
    pub const fn checked(year: i32, month: u32) -> Option<Self> {
        if month >= 1 && month <= 12 {
            Some(Self { year, month })
        } else {
            None
        }
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(self) -> i32 {
        self.year
    }

    pub fn month(self) -> u32 {
        self.month
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = ModelError;

    /// Accepts `YYYY-MM` and the compact `YYYYMM`.
    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let invalid = || ModelError::InvalidYearMonth(s.to_string());
        let (year, month) = match trimmed.split_once('-') {
            Some((year, month)) => (year, month),
            None if trimmed.len() == 6 && trimmed.is_char_boundary(4) => trimmed.split_at(4),
            None => return Err(invalid()),
        };
        if year.len() != 4 || month.is_empty() || month.len() > 2 {
            return Err(invalid());
        }
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        Self::new(year, month).map_err(|_| invalid())
    }
}

impl TryFrom<String> for YearMonth {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<YearMonth> for String {
    fn from(value: YearMonth) -> Self {
        value.to_string()
    }
}

/// Which period a pipeline run processes.
///
/// Parsed from the CLI token: `YYYYMM` selects one month, `YYYY` a whole
/// year, and `*` (or an empty token) everything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PeriodSelector {
    #[default]
    All,
    Year(i32),
    Month(YearMonth),
}

impl PeriodSelector {
    /// Whether a date belongs to the selected period.
    pub fn contains(self, date: NaiveDate) -> bool {
        match self {
            Self::All => true,
            Self::Year(year) => date.year() == year,
            Self::Month(ym) => YearMonth::from_date(date) == ym,
        }
    }

    /// Token used in exported file names: `202101`, `2021`, or `all`.
    pub fn file_token(self) -> String {
        match self {
            Self::All => "all".to_string(),
            Self::Year(year) => format!("{year:04}"),
            Self::Month(ym) => format!("{:04}{:02}", ym.year(), ym.month()),
        }
    }
}

impl fmt::Display for PeriodSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("*"),
            Self::Year(year) => write!(f, "{year:04}"),
            Self::Month(ym) => write!(f, "{:04}{:02}", ym.year(), ym.month()),
        }
    }
}

impl FromStr for PeriodSelector {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let invalid = || ModelError::InvalidPeriod(s.to_string());
        if trimmed.is_empty() || trimmed == "*" {
            return Ok(Self::All);
        }
        if !trimmed.chars().all(|ch| ch.is_ascii_digit()) {
            return Err(invalid());
        }
        match trimmed.len() {
            4 => trimmed.parse().map(Self::Year).map_err(|_| invalid()),
            6 => YearMonth::from_str(trimmed)
                .map(Self::Month)
                .map_err(|_| invalid()),
            _ => Err(invalid()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn year_month_parses_both_forms() {
        let dashed: YearMonth = "2021-03".parse().unwrap();
        let compact: YearMonth = "202103".parse().unwrap();
        assert_eq!(dashed, compact);
        assert_eq!(dashed.to_string(), "2021-03");
    }

    #[test]
    fn year_month_rejects_bad_month() {
        assert!("2021-13".parse::<YearMonth>().is_err());
        assert!("2021-00".parse::<YearMonth>().is_err());
        assert!("21-01".parse::<YearMonth>().is_err());
    }

    #[test]
    fn selector_parses_tokens() {
        assert_eq!("*".parse::<PeriodSelector>().unwrap(), PeriodSelector::All);
        assert_eq!(
            "2021".parse::<PeriodSelector>().unwrap(),
            PeriodSelector::Year(2021)
        );
        assert_eq!(
            "202101".parse::<PeriodSelector>().unwrap(),
            PeriodSelector::Month(YearMonth::new(2021, 1).unwrap())
        );
        assert!("2021-01".parse::<PeriodSelector>().is_err());
        assert!("20211".parse::<PeriodSelector>().is_err());
    }

    #[test]
    fn selector_contains_dates() {
        let jan = PeriodSelector::Month(YearMonth::new(2021, 1).unwrap());
        let date = NaiveDate::from_ymd_opt(2021, 1, 31).unwrap();
        let other = NaiveDate::from_ymd_opt(2020, 12, 31).unwrap();
        assert!(jan.contains(date));
        assert!(!jan.contains(other));
        assert!(PeriodSelector::Year(2020).contains(other));
        assert!(PeriodSelector::All.contains(other));
    }

    #[test]
    fn selector_file_tokens() {
        assert_eq!(PeriodSelector::All.file_token(), "all");
        assert_eq!(PeriodSelector::Year(2020).file_token(), "2020");
        assert_eq!(
            PeriodSelector::Month(YearMonth::new(2020, 3).unwrap()).file_token(),
            "202003"
        );
    }

    #[test]
    fn year_month_serde_uses_display_form() {
        let ym = YearMonth::new(2020, 8).unwrap();
        let json = serde_json::to_string(&ym).unwrap();
        assert_eq!(json, "\"2020-08\"");
        let back: YearMonth = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ym);
    }

    proptest! {
        #[test]
        fn selector_display_parses_back(year in 1900i32..2100, month in 1u32..=12) {
            let selector = PeriodSelector::Month(YearMonth::new(year, month).unwrap());
            let parsed: PeriodSelector = selector.to_string().parse().unwrap();
            prop_assert_eq!(parsed, selector);
        }

        #[test]
        fn year_month_order_matches_text_order(
            a_year in 2000i32..2030, a_month in 1u32..=12,
            b_year in 2000i32..2030, b_month in 1u32..=12,
        ) {
            let a = YearMonth::new(a_year, a_month).unwrap();
            let b = YearMonth::new(b_year, b_month).unwrap();
            prop_assert_eq!(a.cmp(&b), a.to_string().cmp(&b.to_string()));
        }
    }
}
