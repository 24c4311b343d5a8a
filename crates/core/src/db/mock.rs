use super::{Aggregate, ReadingStore, StoreError};
use crate::{
    bucket::BucketKey,
    reading::{Reading, SeriesId, StoredReading},
};
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

/// In-memory store. Behaves like the real thing (ids, ordering, upsert
/// semantics) so engine code can be tested without a database file.
#[derive(Default)]
pub struct MockStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    next_id: i64,
    readings: HashMap<BucketKey, Vec<StoredReading>>,
    aggregates: HashMap<BucketKey, Aggregate>,
}

#[derive(Debug)]
pub enum MockError {
    Poisoned,
}

impl std::fmt::Display for MockError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "mock store lock poisoned")
    }
}

impl std::error::Error for MockError {}

impl From<MockError> for StoreError {
    fn from(value: MockError) -> Self {
        StoreError::Internal(value.to_string())
    }
}

impl From<MockError> for crate::error::GreensandError {
    fn from(value: MockError) -> Self {
        Self::Store(value.into())
    }
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, MockError> {
        self.inner.lock().map_err(|_| MockError::Poisoned)
    }
}

impl ReadingStore for MockStore {
    type Error = MockError;

    fn create_tables(&self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn append_readings(
        &self,
        key: &BucketKey,
        readings: &[Reading],
    ) -> Result<(), Self::Error> {
        let mut inner = self.lock()?;
        for reading in readings {
            inner.next_id += 1;
            let id = inner.next_id;
            inner.readings.entry(*key).or_default().push(StoredReading {
                id,
                reading: reading.clone(),
            });
        }
        Ok(())
    }

    fn find_readings(&self, key: &BucketKey) -> Result<Vec<StoredReading>, Self::Error> {
        let inner = self.lock()?;
        Ok(inner.readings.get(key).cloned().unwrap_or_default())
    }

    fn find_readings_in_range(
        &self,
        series: SeriesId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<(NaiveDate, StoredReading)>, Self::Error> {
        let inner = self.lock()?;
        let mut rows = vec![];
        for (key, readings) in &inner.readings {
            if key.series == series && key.day >= start && key.day <= end {
                rows.extend(readings.iter().map(|r| (key.day, r.clone())));
            }
        }
        rows.sort_by_key(|(day, r)| (*day, r.id));
        Ok(rows)
    }

    fn get_reading(&self, id: i64) -> Result<Option<(BucketKey, StoredReading)>, Self::Error> {
        let inner = self.lock()?;
        for (key, readings) in &inner.readings {
            if let Some(found) = readings.iter().find(|r| r.id == id) {
                return Ok(Some((*key, found.clone())));
            }
        }
        Ok(None)
    }

    fn update_reading(
        &self,
        id: i64,
        value: Option<f64>,
        remark: Option<Option<String>>,
    ) -> Result<Option<BucketKey>, Self::Error> {
        let mut inner = self.lock()?;
        for (key, readings) in inner.readings.iter_mut() {
            if let Some(found) = readings.iter_mut().find(|r| r.id == id) {
                if let Some(value) = value {
                    found.reading.value = value;
                }
                if let Some(remark) = remark {
                    found.reading.remark = remark;
                }
                return Ok(Some(*key));
            }
        }
        Ok(None)
    }

    fn delete_reading(&self, id: i64) -> Result<Option<BucketKey>, Self::Error> {
        let mut inner = self.lock()?;
        for (key, readings) in inner.readings.iter_mut() {
            if readings.iter().any(|r| r.id == id) {
                let key = *key;
                readings.retain(|r| r.id != id);
                return Ok(Some(key));
            }
        }
        Ok(None)
    }

    fn upsert_aggregate(
        &self,
        key: &BucketKey,
        aggregate: &Aggregate,
    ) -> Result<(), Self::Error> {
        let mut inner = self.lock()?;
        inner.aggregates.insert(*key, *aggregate);
        Ok(())
    }

    fn get_aggregate(&self, key: &BucketKey) -> Result<Option<Aggregate>, Self::Error> {
        let inner = self.lock()?;
        Ok(inner.aggregates.get(key).copied())
    }

    fn get_aggregates_in_range(
        &self,
        series: SeriesId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<(NaiveDate, Aggregate)>, Self::Error> {
        let inner = self.lock()?;
        let mut rows: Vec<_> = inner
            .aggregates
            .iter()
            .filter(|(key, _)| key.series == series && key.day >= start && key.day <= end)
            .map(|(key, agg)| (key.day, *agg))
            .collect();
        rows.sort_by_key(|(day, _)| *day);
        Ok(rows)
    }

    fn version(&self) -> u64 {
        u64::MAX
    }
}
