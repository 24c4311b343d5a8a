use greensand_core::{
    db::ReadingStore,
    limits::LimitsUpdate,
    reading::{Reading, SeriesId},
    upsert,
};
use tracing::info;

use crate::commands::{common, Result};

/// Record one measurement. The daily bucket is derived from the timestamp
/// and recomputed; limits already set on the bucket are kept.
pub async fn add(
    db: &impl ReadingStore,
    series: String,
    value: f64,
    at: Option<String>,
    remark: Option<String>,
) -> Result<()> {
    let series: SeriesId = series.parse()?;
    let taken_at = common::resolve_timestamp(at)?;
    let reading = Reading::new(taken_at, value, remark)?;

    let aggregate = upsert::add_reading(db, series, &reading, LimitsUpdate::Keep)?;
    info!(
        "recorded {series} = {value} {} at {taken_at}; bucket now holds {} readings",
        series.unit(),
        aggregate.stats.count
    );
    Ok(())
}
