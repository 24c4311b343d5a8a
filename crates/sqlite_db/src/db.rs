use crate::{Error, Result};
use chrono::{NaiveDate, NaiveDateTime};
use greensand_core::{
    bucket::BucketKey,
    db::{Aggregate, ReadingStore},
    limits::SpecLimits,
    reading::{Reading, SeriesId, StoredReading},
    stats::SampleStats,
};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, types::FromSql, Row};
use std::time::Duration;
use tracing::debug;

use crate::DB_VERSION;

/// Wall-clock format used for the `taken_at` column.
const TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug)]
struct SqliteConnectionCustomizer;

impl r2d2::CustomizeConnection<rusqlite::Connection, rusqlite::Error>
    for SqliteConnectionCustomizer
{
    fn on_acquire(
        &self,
        conn: &mut rusqlite::Connection,
    ) -> std::result::Result<(), rusqlite::Error> {
        // WAL keeps readers from blocking the importer's write transactions.
        conn.execute_batch("PRAGMA journal_mode = WAL;")?;
        // Writers retry for a while instead of failing when the file is locked.
        conn.execute_batch("PRAGMA busy_timeout = 5000;")?;
        Ok(())
    }
}

#[derive(Clone)]
pub struct SqliteDb {
    pool: Pool<SqliteConnectionManager>,
}

impl SqliteDb {
    pub fn from_file(file: &str) -> Result<Self> {
        let manager = SqliteConnectionManager::file(file);
        let pool = Pool::builder()
            .max_size(4)
            .connection_timeout(Duration::from_secs(30))
            .connection_customizer(Box::new(SqliteConnectionCustomizer))
            .build(manager)?;
        Ok(Self { pool })
    }

    pub fn new_memory() -> Self {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .connection_customizer(Box::new(SqliteConnectionCustomizer))
            .build(manager)
            .expect("failed to create connection pool");
        Self { pool }
    }

    fn get_pool(&self) -> Result<PooledConnection<SqliteConnectionManager>> {
        Ok(self.pool.get()?)
    }

    fn execute<P: rusqlite::Params>(&self, query: &str, params: P) -> Result<()> {
        self.get_pool()?.execute(query, params)?;
        Ok(())
    }

    pub fn table_exists(&self, table_name: &str) -> Result<bool> {
        let exists: bool = self
            .query_row(
                "SELECT name FROM sqlite_master WHERE type='table' AND name=?1",
                params![table_name],
                |_| Ok(true),
            )
            .unwrap_or(false);
        Ok(exists)
    }

    fn query_row<
        T: FromSql,
        P: rusqlite::Params,
        F: FnOnce(&Row<'_>) -> std::result::Result<T, rusqlite::Error>,
    >(
        &self,
        query: &str,
        params: P,
        with_row: F,
    ) -> Result<T> {
        debug!("executing query: {query}");
        Ok(self.get_pool()?.query_row(query, params, with_row)?)
    }
}

#[derive(Debug)]
struct ReadingRow {
    id: i64,
    day: String,
    taken_at: String,
    value: f64,
    remark: Option<String>,
}

impl ReadingRow {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            day: row.get(1)?,
            taken_at: row.get(2)?,
            value: row.get(3)?,
            remark: row.get(4)?,
        })
    }

    /// # panics
    /// if the day column is not a valid date.
    fn day(&self) -> NaiveDate {
        self.day.parse().expect("invalid day in readings table")
    }
}

impl From<ReadingRow> for StoredReading {
    /// # panics
    /// if the taken_at column is not a valid timestamp.
    fn from(row: ReadingRow) -> Self {
        let taken_at = NaiveDateTime::parse_from_str(&row.taken_at, TS_FORMAT)
            .expect("invalid timestamp in readings table");
        Self {
            id: row.id,
            reading: Reading {
                taken_at,
                value: row.value,
                remark: row.remark,
            },
        }
    }
}

#[derive(Debug)]
struct AggregateRow {
    day: String,
    lower_limit: Option<f64>,
    upper_limit: Option<f64>,
    count: u64,
    average: Option<f64>,
    min_value: Option<f64>,
    max_value: Option<f64>,
    std_dev: Option<f64>,
    three_sigma: Option<f64>,
    six_sigma: Option<f64>,
    cp: Option<f64>,
    cpk_upper: Option<f64>,
    cpk_lower: Option<f64>,
    cpk: Option<f64>,
}

impl AggregateRow {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            day: row.get(0)?,
            lower_limit: row.get(1)?,
            upper_limit: row.get(2)?,
            count: row.get(3)?,
            average: row.get(4)?,
            min_value: row.get(5)?,
            max_value: row.get(6)?,
            std_dev: row.get(7)?,
            three_sigma: row.get(8)?,
            six_sigma: row.get(9)?,
            cp: row.get(10)?,
            cpk_upper: row.get(11)?,
            cpk_lower: row.get(12)?,
            cpk: row.get(13)?,
        })
    }

    /// # panics
    /// if the day column is not a valid date.
    fn day(&self) -> NaiveDate {
        self.day.parse().expect("invalid day in aggregates table")
    }
}

impl From<AggregateRow> for Aggregate {
    fn from(row: AggregateRow) -> Self {
        let limits = row
            .lower_limit
            .zip(row.upper_limit)
            .map(|(lower, upper)| SpecLimits { lower, upper });
        Self {
            limits,
            stats: SampleStats {
                count: row.count,
                average: row.average,
                min: row.min_value,
                max: row.max_value,
                std_dev: row.std_dev,
                three_sigma: row.three_sigma,
                six_sigma: row.six_sigma,
                cp: row.cp,
                cpk_upper: row.cpk_upper,
                cpk_lower: row.cpk_lower,
                cpk: row.cpk,
            },
        }
    }
}

impl ReadingStore for SqliteDb {
    type Error = Error;

    fn version(&self) -> u64 {
        self.query_row("PRAGMA user_version", params![], |row| row.get(0))
            .unwrap_or(0)
    }

    fn create_tables(&self) -> Result<()> {
        let queries = [
            "PRAGMA foreign_keys = ON;",
            &format!("PRAGMA user_version = {DB_VERSION};"),
            "CREATE TABLE IF NOT EXISTS readings (
                id INTEGER PRIMARY KEY,
                series TEXT NOT NULL,
                day TEXT NOT NULL,
                taken_at TEXT NOT NULL,
                value REAL NOT NULL,
                remark TEXT
            )",
            "CREATE INDEX IF NOT EXISTS idx_readings_series_day
                ON readings (series, day)",
            "CREATE TABLE IF NOT EXISTS aggregates (
                series TEXT NOT NULL,
                day TEXT NOT NULL,
                lower_limit REAL,
                upper_limit REAL,
                count INTEGER NOT NULL,
                average REAL,
                min_value REAL,
                max_value REAL,
                std_dev REAL,
                three_sigma REAL,
                six_sigma REAL,
                cp REAL,
                cpk_upper REAL,
                cpk_lower REAL,
                cpk REAL,
                PRIMARY KEY (series, day)
            )",
        ];

        for query in queries {
            self.execute(query, params![])?;
        }

        Ok(())
    }

    fn append_readings(&self, key: &BucketKey, readings: &[Reading]) -> Result<()> {
        let mut conn = self.get_pool()?;
        let tx = conn.transaction()?;

        for reading in readings {
            tx.execute(
                "INSERT INTO readings (series, day, taken_at, value, remark) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    key.series.to_string(),
                    key.day.to_string(),
                    reading.taken_at.format(TS_FORMAT).to_string(),
                    reading.value,
                    reading.remark,
                ],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    fn find_readings(&self, key: &BucketKey) -> Result<Vec<StoredReading>> {
        let pool = self.get_pool()?;
        let mut stmt = pool.prepare(
            "SELECT id, day, taken_at, value, remark FROM readings
             WHERE series = ?1 AND day = ?2 ORDER BY id ASC",
        )?;

        let rows = stmt.query_map(
            params![key.series.to_string(), key.day.to_string()],
            ReadingRow::from_row,
        )?;
        let res = rows
            .map(|r| r.map(|r| r.into()))
            .map(|r| r.map_err(|e| e.into()))
            .collect::<Result<Vec<StoredReading>>>()?;
        Ok(res)
    }

    fn find_readings_in_range(
        &self,
        series: SeriesId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<(NaiveDate, StoredReading)>> {
        let pool = self.get_pool()?;
        let mut stmt = pool.prepare(
            "SELECT id, day, taken_at, value, remark FROM readings
             WHERE series = ?1 AND day >= ?2 AND day <= ?3 ORDER BY day ASC, id ASC",
        )?;

        let rows = stmt.query_map(
            params![series.to_string(), start.to_string(), end.to_string()],
            ReadingRow::from_row,
        )?;
        let res = rows
            .map(|r| r.map(|r| (r.day(), r.into())))
            .map(|r| r.map_err(|e| e.into()))
            .collect::<Result<Vec<(NaiveDate, StoredReading)>>>()?;
        Ok(res)
    }

    fn get_reading(&self, id: i64) -> Result<Option<(BucketKey, StoredReading)>> {
        let pool = self.get_pool()?;
        let mut stmt = pool.prepare(
            "SELECT id, day, taken_at, value, remark, series FROM readings WHERE id = ?1",
        )?;

        let rows = stmt.query_map(params![id], |row| {
            let series: String = row.get(5)?;
            Ok((series, ReadingRow::from_row(row)?))
        })?;
        let res = rows.last().transpose()?;
        Ok(res.map(|(series, row)| {
            let series: SeriesId = series.parse().expect("unknown series in readings table");
            (BucketKey::new(series, row.day()), row.into())
        }))
    }

    fn update_reading(
        &self,
        id: i64,
        value: Option<f64>,
        remark: Option<Option<String>>,
    ) -> Result<Option<BucketKey>> {
        let Some((key, existing)) = self.get_reading(id)? else {
            return Ok(None);
        };
        let value = value.unwrap_or(existing.reading.value);
        let remark = match remark {
            Some(remark) => remark,
            None => existing.reading.remark,
        };
        self.execute(
            "UPDATE readings SET value = ?1, remark = ?2 WHERE id = ?3",
            params![value, remark, id],
        )?;
        Ok(Some(key))
    }

    fn delete_reading(&self, id: i64) -> Result<Option<BucketKey>> {
        let Some((key, _)) = self.get_reading(id)? else {
            return Ok(None);
        };
        self.execute("DELETE FROM readings WHERE id = ?1", params![id])?;
        Ok(Some(key))
    }

    fn upsert_aggregate(&self, key: &BucketKey, aggregate: &Aggregate) -> Result<()> {
        let stats = &aggregate.stats;
        self.execute(
            "INSERT INTO aggregates (
                series, day, lower_limit, upper_limit, count, average, min_value,
                max_value, std_dev, three_sigma, six_sigma, cp, cpk_upper, cpk_lower, cpk
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
            ON CONFLICT (series, day) DO UPDATE SET
                lower_limit = excluded.lower_limit,
                upper_limit = excluded.upper_limit,
                count = excluded.count,
                average = excluded.average,
                min_value = excluded.min_value,
                max_value = excluded.max_value,
                std_dev = excluded.std_dev,
                three_sigma = excluded.three_sigma,
                six_sigma = excluded.six_sigma,
                cp = excluded.cp,
                cpk_upper = excluded.cpk_upper,
                cpk_lower = excluded.cpk_lower,
                cpk = excluded.cpk",
            params![
                key.series.to_string(),
                key.day.to_string(),
                aggregate.limits.map(|l| l.lower),
                aggregate.limits.map(|l| l.upper),
                stats.count,
                stats.average,
                stats.min,
                stats.max,
                stats.std_dev,
                stats.three_sigma,
                stats.six_sigma,
                stats.cp,
                stats.cpk_upper,
                stats.cpk_lower,
                stats.cpk,
            ],
        )
    }

    fn get_aggregate(&self, key: &BucketKey) -> Result<Option<Aggregate>> {
        let pool = self.get_pool()?;
        let mut stmt = pool.prepare(
            "SELECT day, lower_limit, upper_limit, count, average, min_value, max_value,
                    std_dev, three_sigma, six_sigma, cp, cpk_upper, cpk_lower, cpk
             FROM aggregates WHERE series = ?1 AND day = ?2",
        )?;

        let rows = stmt.query_map(
            params![key.series.to_string(), key.day.to_string()],
            AggregateRow::from_row,
        )?;
        let res = rows.last().transpose()?.map(|r| r.into());
        Ok(res)
    }

    fn get_aggregates_in_range(
        &self,
        series: SeriesId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<(NaiveDate, Aggregate)>> {
        let pool = self.get_pool()?;
        let mut stmt = pool.prepare(
            "SELECT day, lower_limit, upper_limit, count, average, min_value, max_value,
                    std_dev, three_sigma, six_sigma, cp, cpk_upper, cpk_lower, cpk
             FROM aggregates WHERE series = ?1 AND day >= ?2 AND day <= ?3 ORDER BY day ASC",
        )?;

        let rows = stmt.query_map(
            params![series.to_string(), start.to_string(), end.to_string()],
            AggregateRow::from_row,
        )?;
        let res = rows
            .map(|r| r.map(|r| (r.day(), r.into())))
            .map(|r| r.map_err(|e| e.into()))
            .collect::<Result<Vec<(NaiveDate, Aggregate)>>>()?;
        Ok(res)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use greensand_core::{
        import::import_batch,
        limits::{LimitsConfig, LimitsUpdate},
        reading::{Family, SandParameter},
        summary::{list_readings, summarize, summarize_bucket},
        upsert::{add_reading, delete_reading, edit_reading, record_readings, upsert_bucket},
    };

    fn moisture() -> SeriesId {
        SeriesId::Sand(SandParameter::Moisture)
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 4, d).unwrap()
    }

    fn reading(d: u32, hour: u32, value: f64) -> Reading {
        Reading::new(day(d).and_hms_opt(hour, 0, 0).unwrap(), value, None).unwrap()
    }

    fn new_db() -> SqliteDb {
        let db = SqliteDb::new_memory();
        db.create_tables().unwrap();
        db
    }

    #[test]
    fn creates_tables() {
        let db = new_db();
        assert_eq!(db.version(), DB_VERSION);
        assert!(db.table_exists("readings").unwrap());
        assert!(db.table_exists("aggregates").unwrap());
        assert!(!db.table_exists("pours").unwrap());

        // re-running the migration is harmless
        db.create_tables().unwrap();
    }

    #[test]
    fn appends_and_reads_back() {
        let db = new_db();
        let key = BucketKey::new(moisture(), day(14));
        let noted = Reading::new(
            day(14).and_hms_opt(8, 30, 15).unwrap(),
            3.1,
            Some("after mixer maintenance".to_string()),
        )
        .unwrap();

        db.append_readings(&key, &[noted.clone(), reading(14, 12, 3.4)])
            .unwrap();

        let rows = db.find_readings(&key).unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows[0].id < rows[1].id);
        assert_eq!(rows[0].reading, noted);
        assert_eq!(rows[1].reading.value, 3.4);
        assert_eq!(rows[1].reading.remark, None);
    }

    #[test]
    fn range_query_orders_by_day() {
        let db = new_db();
        // inserted out of day order on purpose
        db.append_readings(&BucketKey::new(moisture(), day(16)), &[reading(16, 8, 3.6)])
            .unwrap();
        db.append_readings(&BucketKey::new(moisture(), day(14)), &[reading(14, 8, 3.1)])
            .unwrap();
        db.append_readings(&BucketKey::new(moisture(), day(15)), &[reading(15, 8, 3.4)])
            .unwrap();

        let rows = db
            .find_readings_in_range(moisture(), day(14), day(16))
            .unwrap();
        let days = rows.iter().map(|(d, _)| *d).collect::<Vec<_>>();
        assert_eq!(days, vec![day(14), day(15), day(16)]);

        let clipped = db
            .find_readings_in_range(moisture(), day(15), day(16))
            .unwrap();
        assert_eq!(clipped.len(), 2);
    }

    #[test]
    fn gets_updates_and_deletes_by_id() {
        let db = new_db();
        let key = BucketKey::new(moisture(), day(14));
        db.append_readings(&key, &[reading(14, 8, 3.1)]).unwrap();
        let id = db.find_readings(&key).unwrap()[0].id;

        let (found_key, found) = db.get_reading(id).unwrap().unwrap();
        assert_eq!(found_key, key);
        assert_eq!(found.reading.value, 3.1);

        let touched = db
            .update_reading(id, Some(3.3), Some(Some("corrected".to_string())))
            .unwrap();
        assert_eq!(touched, Some(key));
        let (_, updated) = db.get_reading(id).unwrap().unwrap();
        assert_eq!(updated.reading.value, 3.3);
        assert_eq!(updated.reading.remark.as_deref(), Some("corrected"));

        // Some(None) clears the remark, None leaves the value alone
        db.update_reading(id, None, Some(None)).unwrap();
        let (_, cleared) = db.get_reading(id).unwrap().unwrap();
        assert_eq!(cleared.reading.value, 3.3);
        assert_eq!(cleared.reading.remark, None);

        assert_eq!(db.delete_reading(id).unwrap(), Some(key));
        assert!(db.get_reading(id).unwrap().is_none());
        assert_eq!(db.update_reading(id, Some(1.0), None).unwrap(), None);
        assert_eq!(db.delete_reading(id).unwrap(), None);
    }

    #[test]
    fn upsert_replaces_the_row() {
        let db = new_db();
        let key = BucketKey::new(moisture(), day(14));
        let limits = SpecLimits::new(2.8, 4.2).unwrap();

        db.upsert_aggregate(&key, &Aggregate::compute(&[3.1], Some(limits)))
            .unwrap();
        let replacement = Aggregate::compute(&[3.1, 3.4, 3.6], Some(limits));
        db.upsert_aggregate(&key, &replacement).unwrap();

        assert_eq!(db.get_aggregate(&key).unwrap(), Some(replacement));
        let count: i64 = db
            .get_pool()
            .unwrap()
            .query_row("SELECT COUNT(*) FROM aggregates", params![], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn aggregate_nulls_round_trip() {
        let db = new_db();
        let empty_key = BucketKey::new(moisture(), day(1));
        let empty = Aggregate::compute(&[], None);
        db.upsert_aggregate(&empty_key, &empty).unwrap();
        assert_eq!(db.get_aggregate(&empty_key).unwrap(), Some(empty));

        let full_key = BucketKey::new(moisture(), day(2));
        let full = Aggregate::compute(&[10.0, 12.0, 14.0], Some(SpecLimits::new(5.0, 20.0).unwrap()));
        db.upsert_aggregate(&full_key, &full).unwrap();
        assert_eq!(db.get_aggregate(&full_key).unwrap(), Some(full));

        assert_eq!(db.get_aggregate(&BucketKey::new(moisture(), day(3))).unwrap(), None);
    }

    #[test]
    fn aggregates_in_range_skip_other_series() {
        let db = new_db();
        let comp = SeriesId::Sand(SandParameter::Compactability);
        db.upsert_aggregate(
            &BucketKey::new(moisture(), day(14)),
            &Aggregate::compute(&[3.1], None),
        )
        .unwrap();
        db.upsert_aggregate(
            &BucketKey::new(comp, day(14)),
            &Aggregate::compute(&[41.0], None),
        )
        .unwrap();

        let rows = db.get_aggregates_in_range(moisture(), day(1), day(28)).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].1.stats.average, Some(3.1));
    }

    #[test]
    fn engine_runs_end_to_end() {
        let db = new_db();
        let mut defaults = LimitsConfig::default();
        defaults.insert(moisture(), SpecLimits::new(2.8, 4.2).unwrap());

        let payload = "\
date,time,parameter,value
14-04-2025,08:00,moisture,3.1
14-04-2025,12:00,moisture,3.4
15-04-2025,08:00,moisture,3.6
";
        let outcome = import_batch(&db, Family::Sand, payload, &defaults).unwrap();
        assert_eq!(outcome.imported, 3);
        assert_eq!(outcome.created_buckets, 2);

        let replay = import_batch(&db, Family::Sand, payload, &defaults).unwrap();
        assert_eq!(replay.imported, 0);
        assert_eq!(replay.duplicates.len(), 3);

        // single-day summary agrees with the persisted aggregate
        let key = BucketKey::new(moisture(), day(14));
        let direct = db.get_aggregate(&key).unwrap().unwrap();
        let bucket_summary = summarize_bucket(&db, &key).unwrap().unwrap();
        assert_eq!(bucket_summary.overall, direct);
        assert_eq!(direct.limits, Some(SpecLimits::new(2.8, 4.2).unwrap()));

        // manual add, edit, delete all keep the aggregates in step
        add_reading(&db, moisture(), &reading(15, 12, 3.2), LimitsUpdate::Keep).unwrap();
        let day15 = db
            .get_aggregate(&BucketKey::new(moisture(), day(15)))
            .unwrap()
            .unwrap();
        assert_eq!(day15.stats.count, 2);

        let id = db.find_readings(&key).unwrap()[0].id;
        let edited = edit_reading(&db, id, Some(3.0), None).unwrap();
        assert_eq!(edited.stats.min, Some(3.0));

        delete_reading(&db, id).unwrap();
        let after = db.get_aggregate(&key).unwrap().unwrap();
        assert_eq!(after.stats.count, 1);
        assert_eq!(after.limits, Some(SpecLimits::new(2.8, 4.2).unwrap()));

        let summary = summarize(&db, moisture(), day(14), day(15), None)
            .unwrap()
            .unwrap();
        assert_eq!(summary.overall.stats.count, 3);
        assert_eq!(summary.daily.len(), 2);
        assert!(summary.overall.stats.cpk.is_some());

        // recomputing a bucket with no pending changes is a no-op
        let before = db.get_aggregate(&key).unwrap().unwrap();
        let recomputed = upsert_bucket(&db, &key, LimitsUpdate::Keep).unwrap();
        assert_eq!(before, recomputed);

        // readings from both days, in day order
        let rows = db
            .find_readings_in_range(moisture(), day(14), day(15))
            .unwrap();
        assert_eq!(rows.len(), 3);
        let listed = list_readings(&db, moisture(), day(14), day(15)).unwrap();
        assert_eq!(listed.len(), rows.len());

        let day16 = record_readings(
            &db,
            &BucketKey::new(moisture(), day(16)),
            &[reading(16, 8, 3.5)],
            LimitsUpdate::Keep,
        )
        .unwrap();
        assert_eq!(day16.stats.count, 1);
    }
}
