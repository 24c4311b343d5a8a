//! Bucket keys: (series, calendar day) pairs.

use crate::reading::{Reading, SeriesId};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use std::fmt::Display;

/// Truncate a timestamp to its calendar day.
///
/// Every path that derives a day from a timestamp goes through here, so a
/// reading taken at 23:59 lands in the same bucket whether it arrives via
/// the import pipeline or a direct add.
pub fn day_of(ts: NaiveDateTime) -> NaiveDate {
    ts.date()
}

/// Identity of one aggregation bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BucketKey {
    pub series: SeriesId,
    pub day: NaiveDate,
}

impl BucketKey {
    pub fn new(series: SeriesId, day: NaiveDate) -> Self {
        Self { series, day }
    }

    pub fn for_reading(series: SeriesId, reading: &Reading) -> Self {
        Self {
            series,
            day: day_of(reading.taken_at),
        }
    }
}

impl Display for BucketKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.series, self.day)
    }
}

/// Parse a date cell from an import payload.
///
/// Accepts ISO dates plus the day-first forms the lab exports use.
/// Fails closed: anything else is `None` and the caller skips the row.
pub fn parse_day(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    for fmt in ["%Y-%m-%d", "%d-%m-%Y", "%d/%m/%Y"] {
        if let Ok(day) = NaiveDate::parse_from_str(raw, fmt) {
            return Some(day);
        }
    }
    None
}

/// Parse a time-of-day cell, with or without seconds.
pub fn parse_time_of_day(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    for fmt in ["%H:%M:%S", "%H:%M"] {
        if let Ok(time) = NaiveTime::parse_from_str(raw, fmt) {
            return Some(time);
        }
    }
    None
}
