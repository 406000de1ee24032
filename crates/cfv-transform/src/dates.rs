//! Timestamp parsing for case reports and flight lists.
//!
//! Only the calendar date is kept. The time part is never validated.

use chrono::NaiveDate;

/// Parse the date part of a case report `Last_Update` value.
///
/// Accepts `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DDTHH:MM:SS`, `M/D/YYYY HH:MM`,
/// `M/D/YY HH:MM` and a bare date in any of those shapes.
pub fn parse_report_date(raw: &str) -> Option<NaiveDate> {
    let date_part = raw
        .trim()
        .split(|c: char| c == ' ' || c == 'T')
        .next()
        .filter(|part| !part.is_empty())?;

    if date_part.contains('-') {
        return NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok();
    }

    // Two-digit years need %y; %Y would read "21" as year 21.
    let year = date_part.rsplit('/').next()?;
    let format = match year.len() {
        2 => "%m/%d/%y",
        4 => "%m/%d/%Y",
        _ => return None,
    };
    NaiveDate::parse_from_str(date_part, format).ok()
}

/// Parse a flight list `day` value from its leading `YYYY-MM-DD`.
pub fn parse_flight_day(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    let head = trimmed.get(..10)?;
    NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
}
