//! Aggregate upserts: the single path through which persisted aggregates
//! change. Every mutation of a bucket's readings funnels into
//! [`upsert_bucket`], which recomputes the row from scratch and replaces it
//! atomically.

use crate::{
    bucket::BucketKey,
    db::{Aggregate, ReadingStore},
    error::GreensandError,
    limits::LimitsUpdate,
    reading::{Reading, SeriesId},
    Result,
};
use tracing::debug;

/// Recompute and persist one bucket's aggregate.
///
/// Loads the bucket's full reading set, resolves the limits to apply, and
/// writes the freshly computed row back in a single keyed upsert. Running
/// this twice with no intervening writes stores an identical row, so
/// retries and replays are harmless.
pub fn upsert_bucket(
    store: &impl ReadingStore,
    key: &BucketKey,
    limits: LimitsUpdate,
) -> Result<Aggregate> {
    let effective = match limits {
        LimitsUpdate::Keep => store
            .get_aggregate(key)
            .map_err(|e| e.into())?
            .and_then(|a| a.limits),
        LimitsUpdate::Set(limits) => Some(limits),
        LimitsUpdate::Clear => None,
    };
    let readings = store.find_readings(key).map_err(|e| e.into())?;
    let values = readings
        .iter()
        .map(|r| r.reading.value)
        .collect::<Vec<_>>();
    let aggregate = Aggregate::compute(&values, effective);
    store
        .upsert_aggregate(key, &aggregate)
        .map_err(|e| e.into())?;
    debug!("upserted {key}, count={}", aggregate.stats.count);
    Ok(aggregate)
}

/// Append readings to one bucket and recompute its aggregate, once.
///
/// Callers must have bucketed the readings already: every reading's
/// timestamp falls on `key.day`.
pub fn record_readings(
    store: &impl ReadingStore,
    key: &BucketKey,
    readings: &[Reading],
    limits: LimitsUpdate,
) -> Result<Aggregate> {
    store.append_readings(key, readings).map_err(|e| e.into())?;
    upsert_bucket(store, key, limits)
}

/// Record one manually-entered reading. The bucket is derived from the
/// reading's own timestamp; no duplicate check is applied.
pub fn add_reading(
    store: &impl ReadingStore,
    series: SeriesId,
    reading: &Reading,
    limits: LimitsUpdate,
) -> Result<Aggregate> {
    let key = BucketKey::for_reading(series, reading);
    record_readings(store, &key, std::slice::from_ref(reading), limits)
}

/// Change a stored reading's value and/or remark, then recompute its
/// bucket. `remark: Some(None)` clears the remark.
pub fn edit_reading(
    store: &impl ReadingStore,
    id: i64,
    value: Option<f64>,
    remark: Option<Option<String>>,
) -> Result<Aggregate> {
    if let Some(value) = value {
        if !value.is_finite() {
            return Err(GreensandError::NonFiniteValue(value));
        }
    }
    let key = store
        .update_reading(id, value, remark)
        .map_err(|e| e.into())?
        .ok_or(GreensandError::ReadingNotFound(id))?;
    upsert_bucket(store, &key, LimitsUpdate::Keep)
}

/// Remove a stored reading and recompute the bucket it belonged to.
///
/// The aggregate row itself is kept even when the bucket empties out
/// (count drops to 0), so limits set on the bucket survive the delete.
pub fn delete_reading(store: &impl ReadingStore, id: i64) -> Result<Aggregate> {
    let key = store
        .delete_reading(id)
        .map_err(|e| e.into())?
        .ok_or(GreensandError::ReadingNotFound(id))?;
    upsert_bucket(store, &key, LimitsUpdate::Keep)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MockStore;
    use crate::limits::SpecLimits;
    use crate::reading::SandParameter;
    use chrono::{NaiveDate, NaiveDateTime};

    fn ts(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn moisture_key(day: u32) -> BucketKey {
        BucketKey::new(
            SeriesId::Sand(SandParameter::Moisture),
            NaiveDate::from_ymd_opt(2025, 3, day).unwrap(),
        )
    }

    fn reading(day: u32, hour: u32, value: f64) -> Reading {
        Reading::new(ts(day, hour), value, None).unwrap()
    }

    #[test]
    fn records_and_aggregates() {
        let store = MockStore::new();
        let key = moisture_key(14);
        let limits = SpecLimits::new(5.0, 20.0).unwrap();

        let agg = record_readings(
            &store,
            &key,
            &[reading(14, 8, 10.0), reading(14, 12, 12.0), reading(14, 16, 14.0)],
            LimitsUpdate::Set(limits),
        )
        .unwrap();

        assert_eq!(agg.stats.count, 3);
        assert_eq!(agg.stats.average, Some(12.0));
        assert_eq!(agg.limits, Some(limits));
        assert_eq!(store.get_aggregate(&key).unwrap(), Some(agg));
    }

    #[test]
    fn repeated_upsert_is_identical() {
        let store = MockStore::new();
        let key = moisture_key(14);
        record_readings(
            &store,
            &key,
            &[reading(14, 8, 3.1), reading(14, 12, 3.4)],
            LimitsUpdate::Set(SpecLimits::new(2.8, 4.2).unwrap()),
        )
        .unwrap();

        let first = upsert_bucket(&store, &key, LimitsUpdate::Keep).unwrap();
        let second = upsert_bucket(&store, &key, LimitsUpdate::Keep).unwrap();
        assert_eq!(first, second);
        assert_eq!(store.get_aggregate(&key).unwrap(), Some(second));
    }

    #[test]
    fn keep_preserves_and_clear_drops_limits() {
        let store = MockStore::new();
        let key = moisture_key(14);
        let limits = SpecLimits::new(2.8, 4.2).unwrap();

        record_readings(&store, &key, &[reading(14, 8, 3.1)], LimitsUpdate::Set(limits)).unwrap();

        let kept = upsert_bucket(&store, &key, LimitsUpdate::Keep).unwrap();
        assert_eq!(kept.limits, Some(limits));

        let cleared = upsert_bucket(&store, &key, LimitsUpdate::Clear).unwrap();
        assert_eq!(cleared.limits, None);
        assert!(cleared.stats.cp.is_none());
    }

    #[test]
    fn add_derives_bucket_from_timestamp() {
        let store = MockStore::new();
        let series = SeriesId::Sand(SandParameter::Moisture);

        add_reading(&store, series, &reading(14, 9, 3.2), LimitsUpdate::Keep).unwrap();
        add_reading(&store, series, &reading(15, 9, 3.4), LimitsUpdate::Keep).unwrap();

        let day_one = store.get_aggregate(&moisture_key(14)).unwrap().unwrap();
        let day_two = store.get_aggregate(&moisture_key(15)).unwrap().unwrap();
        assert_eq!(day_one.stats.count, 1);
        assert_eq!(day_two.stats.count, 1);
        assert_eq!(day_one.stats.average, Some(3.2));
    }

    #[test]
    fn edit_recomputes_the_bucket() {
        let store = MockStore::new();
        let key = moisture_key(14);
        record_readings(
            &store,
            &key,
            &[reading(14, 8, 10.0), reading(14, 12, 14.0)],
            LimitsUpdate::Keep,
        )
        .unwrap();
        let id = store.find_readings(&key).unwrap()[0].id;

        let agg = edit_reading(&store, id, Some(12.0), None).unwrap();
        assert_eq!(agg.stats.average, Some(13.0));
        assert_eq!(agg.stats.min, Some(12.0));
    }

    #[test]
    fn edit_rejects_unknown_id_and_bad_value() {
        let store = MockStore::new();
        assert!(matches!(
            edit_reading(&store, 99, Some(1.0), None),
            Err(GreensandError::ReadingNotFound(99))
        ));
        assert!(matches!(
            edit_reading(&store, 1, Some(f64::NAN), None),
            Err(GreensandError::NonFiniteValue(_))
        ));
    }

    #[test]
    fn delete_keeps_empty_aggregate_with_limits() {
        let store = MockStore::new();
        let key = moisture_key(14);
        let limits = SpecLimits::new(2.8, 4.2).unwrap();
        record_readings(&store, &key, &[reading(14, 8, 3.1)], LimitsUpdate::Set(limits)).unwrap();
        let id = store.find_readings(&key).unwrap()[0].id;

        let agg = delete_reading(&store, id).unwrap();
        assert_eq!(agg.stats.count, 0);
        assert_eq!(agg.stats.average, None);
        assert_eq!(agg.limits, Some(limits));
        assert_eq!(store.get_aggregate(&key).unwrap(), Some(agg));
    }
}
