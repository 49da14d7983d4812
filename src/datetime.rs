//! Date/time utilities for Stowage.
//!
//! Timestamps are persisted as UTC text in SQLite's `datetime('now')` format,
//! so range filters on them compare lexicographically. The daily upload quota
//! is measured over a calendar day in a configurable [`Zone`].

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Local, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;

/// Storage format for timestamps (`YYYY-MM-DD HH:MM:SS`, UTC).
pub const DB_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Zone whose calendar day bounds the daily quota.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zone {
    /// The process' local timezone.
    Local,
    /// A named IANA timezone.
    Named(Tz),
}

impl Default for Zone {
    fn default() -> Self {
        Zone::Local
    }
}

impl FromStr for Zone {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("local") {
            return Ok(Zone::Local);
        }
        s.parse::<Tz>()
            .map(Zone::Named)
            .map_err(|_| format!("unknown timezone: {s}"))
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Zone::Local => write!(f, "local"),
            Zone::Named(tz) => write!(f, "{}", tz.name()),
        }
    }
}

/// Inclusive UTC range covering one local calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayBounds {
    /// First instant of the day.
    pub start: DateTime<Utc>,
    /// Last instant of the day (one millisecond before the next midnight).
    pub end: DateTime<Utc>,
}

impl DayBounds {
    /// Check whether an instant falls within the day.
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at <= self.end
    }
}

/// Bounds of the calendar day containing `now`, as seen in `zone`.
pub fn day_bounds(now: DateTime<Utc>, zone: Zone) -> DayBounds {
    match zone {
        Zone::Local => bounds_in(now, &Local),
        Zone::Named(tz) => bounds_in(now, &tz),
    }
}

fn bounds_in<Z: TimeZone>(now: DateTime<Utc>, tz: &Z) -> DayBounds {
    let today = now.with_timezone(tz).date_naive();
    let start = local_midnight(tz, today);
    let next = match today.succ_opt() {
        Some(tomorrow) => local_midnight(tz, tomorrow),
        None => start + TimeDelta::days(1),
    };
    DayBounds {
        start,
        end: next - TimeDelta::milliseconds(1),
    }
}

/// First valid instant of `day` in `tz`.
///
/// Midnight can be skipped by a DST transition; the day then starts at the
/// first instant that exists.
fn local_midnight<Z: TimeZone>(tz: &Z, day: NaiveDate) -> DateTime<Utc> {
    let midnight = day.and_time(NaiveTime::MIN);
    match tz.from_local_datetime(&midnight) {
        LocalResult::Single(dt) => dt.with_timezone(&Utc),
        LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
        LocalResult::None => {
            // Transitions are at most an hour long; walk forward a minute at a time.
            (1..=180)
                .map(|m| midnight + TimeDelta::minutes(m))
                .find_map(|t| tz.from_local_datetime(&t).earliest())
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|| midnight.and_utc())
        }
    }
}

/// Format a UTC instant in the storage format.
pub fn to_db(dt: &DateTime<Utc>) -> String {
    dt.format(DB_DATETIME_FORMAT).to_string()
}

/// Parse a stored timestamp.
///
/// Accepts the storage format and RFC3339.
pub fn from_db(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, DB_DATETIME_FORMAT) {
        return Some(naive.and_utc());
    }
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
