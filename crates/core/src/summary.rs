//! Range summaries: one overall statistic block over a date span, plus the
//! per-day breakdown from the persisted aggregates.

use crate::{
    bucket::BucketKey,
    db::{Aggregate, ReadingStore},
    error::GreensandError,
    limits::SpecLimits,
    reading::{SeriesId, StoredReading},
    Result,
};
use chrono::NaiveDate;
use serde::Serialize;

/// One day's slice of a range summary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DailySlice {
    pub day: NaiveDate,
    pub aggregate: Aggregate,
}

/// Summary of one series over an inclusive date range.
#[derive(Debug, Clone, Serialize)]
pub struct RangeSummary {
    pub series: SeriesId,
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Recomputed flat over every reading in range, not merged from the
    /// daily rows.
    pub overall: Aggregate,
    /// Persisted daily aggregates with at least one reading, in day order.
    pub daily: Vec<DailySlice>,
}

/// Summarize `series` over `start..=end`.
///
/// Returns `Ok(None)` when the range holds no readings. When `limits` is
/// `None`, the overall capability is computed against the daily buckets'
/// own limits if every bucket in range carries the same band, and omitted
/// otherwise.
pub fn summarize(
    store: &impl ReadingStore,
    series: SeriesId,
    start: NaiveDate,
    end: NaiveDate,
    limits: Option<SpecLimits>,
) -> Result<Option<RangeSummary>> {
    if start > end {
        return Err(GreensandError::InvalidRange { start, end });
    }

    let readings = store
        .find_readings_in_range(series, start, end)
        .map_err(|e| e.into())?;
    if readings.is_empty() {
        return Ok(None);
    }

    let daily = store
        .get_aggregates_in_range(series, start, end)
        .map_err(|e| e.into())?
        .into_iter()
        .filter(|(_, agg)| agg.stats.count > 0)
        .map(|(day, aggregate)| DailySlice { day, aggregate })
        .collect::<Vec<_>>();

    let effective = limits.or_else(|| shared_limits(&daily));
    let values = readings
        .iter()
        .map(|(_, r)| r.reading.value)
        .collect::<Vec<_>>();
    let overall = Aggregate::compute(&values, effective);

    Ok(Some(RangeSummary {
        series,
        start,
        end,
        overall,
        daily,
    }))
}

/// The one limits band shared by every slice, if there is exactly one.
fn shared_limits(daily: &[DailySlice]) -> Option<SpecLimits> {
    let mut iter = daily.iter().map(|slice| slice.aggregate.limits);
    let first = iter.next()??;
    iter.all(|l| l == Some(first)).then_some(first)
}

/// Convenience for single-day summaries keyed like a bucket.
pub fn summarize_bucket(
    store: &impl ReadingStore,
    key: &BucketKey,
) -> Result<Option<RangeSummary>> {
    summarize(store, key.series, key.day, key.day, None)
}

/// The raw readings behind a range, with their days, in day-then-id order.
pub fn list_readings(
    store: &impl ReadingStore,
    series: SeriesId,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<(NaiveDate, StoredReading)>> {
    if start > end {
        return Err(GreensandError::InvalidRange { start, end });
    }
    let rows = store
        .find_readings_in_range(series, start, end)
        .map_err(|e| e.into())?;
    Ok(rows)
}
