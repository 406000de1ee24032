use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("invalid period selector '{0}' (expected YYYYMM, YYYY or *)")]
    InvalidPeriod(String),
    #[error("invalid year-month '{0}' (expected YYYY-MM)")]
    InvalidYearMonth(String),
    #[error("unknown case statistic '{0}'")]
    UnknownStat(String),
    #[error("unknown direction '{0}' (expected origin or destination)")]
    UnknownDirection(String),
    #[error("unknown granularity '{0}' (expected day or year_month)")]
    UnknownGranularity(String),
    #[error("invalid alias '{0}' (expected FROM=TO)")]
    InvalidAlias(String),
    #[error("invalid date window: min year {min} is after max year {max}")]
    InvalidDateWindow { min: i32, max: i32 },
}

pub type Result<T> = std::result::Result<T, ModelError>;
