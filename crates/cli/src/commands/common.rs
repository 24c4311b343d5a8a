use chrono::{Local, NaiveDate, NaiveDateTime};
use greensand_core::{bucket, limits::SpecLimits};

use crate::commands::error::ArgsError;

const TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"];

/// Resolve the shared `--day` / `--start` / `--end` args into an inclusive
/// day range. With none of them set, the range is today.
pub fn resolve_range(
    day: Option<String>,
    start: Option<String>,
    end: Option<String>,
) -> Result<(NaiveDate, NaiveDate), ArgsError> {
    if let Some(day) = day {
        let day = parse_day_arg(&day)?;
        return Ok((day, day));
    }
    match (start, end) {
        (Some(start), Some(end)) => Ok((parse_day_arg(&start)?, parse_day_arg(&end)?)),
        (None, None) => {
            let today = Local::now().date_naive();
            Ok((today, today))
        }
        _ => Err(ArgsError::RangeIncomplete),
    }
}

pub fn parse_day_arg(raw: &str) -> Result<NaiveDate, ArgsError> {
    bucket::parse_day(raw).ok_or_else(|| ArgsError::DayInvalid(raw.to_owned()))
}

/// Parse `--at`, defaulting to the present wall-clock time.
pub fn resolve_timestamp(at: Option<String>) -> Result<NaiveDateTime, ArgsError> {
    let Some(raw) = at else {
        return Ok(Local::now().naive_local());
    };
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(&raw, fmt).ok())
        .ok_or(ArgsError::TimestampInvalid(raw))
}

/// Resolve a `--lower`/`--upper` pair. clap enforces the pairing already;
/// the validating constructor rejects inverted or non-finite bands.
pub fn resolve_limits(
    lower: Option<f64>,
    upper: Option<f64>,
) -> Result<Option<SpecLimits>, ArgsError> {
    match (lower, upper) {
        (Some(lower), Some(upper)) => Ok(Some(SpecLimits::new(lower, upper)?)),
        (None, None) => Ok(None),
        _ => Err(ArgsError::LimitsIncomplete),
    }
}
