//! Conversions between NASA calendar dates and [`NaiveDateTime`].
//!
//! Close approach data stamps each event in UTC as `YYYY-Mon-DD HH:MM`
//! (e.g. `2020-Dec-31 12:00`). Output uses ISO-style `YYYY-MM-DD HH:MM`.
//! Neither side carries seconds.

use chrono::NaiveDateTime;

const CALENDAR_FORMAT: &str = "%Y-%b-%d %H:%M";
const OUTPUT_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Parses a NASA-formatted calendar date such as `2020-Dec-31 12:00`.
pub fn cd_to_datetime(calendar_date: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    NaiveDateTime::parse_from_str(calendar_date.trim(), CALENDAR_FORMAT)
}

/// Formats a timestamp as `YYYY-MM-DD HH:MM`.
pub fn datetime_to_str(dt: &NaiveDateTime) -> String {
    dt.format(OUTPUT_FORMAT).to_string()
}
