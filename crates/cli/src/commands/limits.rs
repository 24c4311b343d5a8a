use greensand_core::{
    bucket::BucketKey,
    db::ReadingStore,
    limits::LimitsUpdate,
    reading::SeriesId,
    upsert,
};
use tracing::info;

use crate::commands::{common, error::ArgsError, Result};

/// Set or clear one bucket's specification limits and recompute it. Works
/// on buckets with no readings yet; the limits wait there for data.
pub async fn set_limits(
    db: &impl ReadingStore,
    series: String,
    day: String,
    lower: Option<f64>,
    upper: Option<f64>,
    clear: bool,
) -> Result<()> {
    let series: SeriesId = series.parse()?;
    let day = common::parse_day_arg(&day)?;
    let key = BucketKey::new(series, day);

    let update = if clear {
        LimitsUpdate::Clear
    } else {
        match common::resolve_limits(lower, upper)? {
            Some(limits) => LimitsUpdate::Set(limits),
            None => return Err(ArgsError::LimitsUpdateMissing.into()),
        }
    };

    let aggregate = upsert::upsert_bucket(db, &key, update)?;
    match aggregate.limits {
        Some(limits) => info!(
            "{key} limits set to {limits}; recomputed over {} readings",
            aggregate.stats.count
        ),
        None => info!("{key} limits cleared"),
    }
    Ok(())
}
