//! Portal date/time parsing and the source timezone.
//!
//! Ride dates come in the portal's own format (e.g. `2024年6月10日(月)`), and
//! clock times carry decorations like `10:00発`. This module turns both into
//! chrono values and provides [`YearMonth`], the month key used to bound the
//! calendar purge sweep.

use std::fmt;
use std::sync::LazyLock;

use chrono::{FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// IANA name of the fixed source timezone.
pub const TOKYO_TZ_NAME: &str = "Asia/Tokyo";

/// The fixed UTC+9 offset of the source timezone.
pub fn tokyo_offset() -> FixedOffset {
    FixedOffset::east_opt(9 * 3600).expect("valid fixed offset")
}

/// A `year/month` key.
///
/// Displays without zero padding (`2024/6`), matching the form used to
/// compare against calendar event starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    /// Creates a year/month key.
    pub fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    /// Builds the key from a date.
    pub fn from_date(date: NaiveDate) -> Self {
        use chrono::Datelike;
        Self {
            year: date.year(),
            month: date.month(),
        }
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.year, self.month)
    }
}

/// Characters that separate the date parts in portal text.
static DATE_SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[年月日（）]").expect("valid regex"));

/// Parses a portal ride-date string into a date.
///
/// The portal separators (`年月日` and full-width parentheses) are replaced
/// by hyphens and the first three numeric parts are taken, so the weekday
/// suffix is ignored whether or not it survived normalization.
pub fn parse_ride_date(value: &str) -> Option<NaiveDate> {
    let separated = DATE_SEPARATORS.replace_all(value, "-");
    let mut parts = separated
        .trim_matches('-')
        .split('-')
        .filter(|p| !p.is_empty());

    let year: i32 = parts.next()?.trim().parse().ok()?;
    let month: u32 = parts.next()?.trim().parse().ok()?;
    let day: u32 = {
        // Strip anything after the day digits, e.g. `10(月)`.
        let raw = parts.next()?;
        let digits: String = raw.chars().take_while(|c| c.is_ascii_digit()).collect();
        digits.parse().ok()?
    };

    NaiveDate::from_ymd_opt(year, month, day)
}

/// Parses a portal clock-time string (`10:00発`, `11:52着`) into a time.
///
/// Everything but digits and the colon is stripped first.
pub fn parse_clock_time(value: &str) -> Option<NaiveTime> {
    let cleaned: String = value
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ':')
        .collect();
    let (hour, minute) = cleaned.split_once(':')?;
    NaiveTime::from_hms_opt(hour.parse().ok()?, minute.parse().ok()?, 0)
}

/// Combines a ride-date string and a clock-time string into a naive stamp.
pub fn ride_datetime(date_text: &str, time_text: &str) -> Option<NaiveDateTime> {
    let date = parse_ride_date(date_text)?;
    let time = parse_clock_time(time_text)?;
    Some(date.and_time(time))
}
