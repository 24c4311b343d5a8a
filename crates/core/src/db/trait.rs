use chrono::NaiveDate;

use crate::{
    bucket::BucketKey,
    db::{Aggregate, StoreError},
    reading::{Reading, SeriesId, StoredReading},
};

pub trait ReadingStore {
    type Error: Into<StoreError>;

    fn create_tables(&self) -> Result<(), Self::Error>;

    /// Append readings to one bucket, atomically. Ids are assigned by the
    /// store and strictly increase in insertion order.
    fn append_readings(&self, key: &BucketKey, readings: &[Reading])
        -> Result<(), Self::Error>;

    /// All readings in one bucket, ordered by id.
    fn find_readings(&self, key: &BucketKey) -> Result<Vec<StoredReading>, Self::Error>;

    /// All readings of a series whose day falls in `start..=end`, ordered
    /// by day then id.
    fn find_readings_in_range(
        &self,
        series: SeriesId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<(NaiveDate, StoredReading)>, Self::Error>;

    fn get_reading(&self, id: i64) -> Result<Option<(BucketKey, StoredReading)>, Self::Error>;

    /// Update a reading's value and/or remark. `remark` is doubly
    /// optional: `None` leaves it alone, `Some(None)` clears it. Returns
    /// the bucket key of the touched reading, or `None` for an unknown id.
    fn update_reading(
        &self,
        id: i64,
        value: Option<f64>,
        remark: Option<Option<String>>,
    ) -> Result<Option<BucketKey>, Self::Error>;

    /// Delete a reading. Returns the bucket key it belonged to, or `None`
    /// for an unknown id.
    fn delete_reading(&self, id: i64) -> Result<Option<BucketKey>, Self::Error>;

    /// Write a bucket's aggregate, replacing any existing row in a single
    /// atomic statement keyed on the bucket identity.
    fn upsert_aggregate(&self, key: &BucketKey, aggregate: &Aggregate)
        -> Result<(), Self::Error>;

    fn get_aggregate(&self, key: &BucketKey) -> Result<Option<Aggregate>, Self::Error>;

    /// Aggregates of a series whose day falls in `start..=end`, ordered by
    /// day.
    fn get_aggregates_in_range(
        &self,
        series: SeriesId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<(NaiveDate, Aggregate)>, Self::Error>;

    fn version(&self) -> u64;
}
