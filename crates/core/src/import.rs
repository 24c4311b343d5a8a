//! Batch import of delimited-text reading payloads.
//!
//! One payload carries one reading family. Rows are validated one at a
//! time: a bad date, value, or series name skips that row with a reason
//! and never aborts the batch. Surviving rows are grouped by bucket,
//! checked against already-stored readings for time-of-day duplicates,
//! and each affected bucket is recomputed exactly once.

use crate::{
    bucket::{parse_day, parse_time_of_day, BucketKey},
    db::ReadingStore,
    error::GreensandError,
    limits::{LimitsConfig, LimitsUpdate},
    reading::{Family, Reading, SeriesId},
    upsert::record_readings,
    Result,
};
use chrono::NaiveTime;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::info;

/// A row the pipeline refused, with a 1-based data row number (the header
/// row is not counted) and a human-readable reason.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowIssue {
    pub row: usize,
    pub detail: String,
}

impl RowIssue {
    fn new(row: usize, detail: impl Into<String>) -> Self {
        Self {
            row,
            detail: detail.into(),
        }
    }
}

/// Accounting for one import run.
///
/// `total_rows == imported + duplicates.len() + skipped.len()` always
/// holds; every data row lands in exactly one of the three.
#[derive(Debug, Default, Serialize)]
pub struct ImportOutcome {
    pub total_rows: usize,
    pub imported: usize,
    /// Buckets that had no aggregate before this run.
    pub created_buckets: usize,
    pub duplicates: Vec<RowIssue>,
    pub skipped: Vec<RowIssue>,
}

/// Import a CSV payload of readings for one family.
///
/// The header must name a date column, a value column, and the family's
/// series column: `parameter` (alias `param`) for sand payloads, `type`
/// (alias `metric`) for runner payloads. A `time` column is optional;
/// rows without one are keyed to midnight. Unrecognized columns are
/// ignored.
///
/// Buckets created by this run are stamped with the default limits from
/// `defaults`, if the series has an entry; existing buckets keep whatever
/// limits they already carry.
pub fn import_batch(
    store: &impl ReadingStore,
    family: Family,
    payload: &str,
    defaults: &LimitsConfig,
) -> Result<ImportOutcome> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(payload.as_bytes());

    let headers = reader.headers()?.clone();
    let (series_col, series_names): (&str, &[&str]) = match family {
        Family::Sand => ("parameter", &["parameter", "param"]),
        Family::Runner => ("type", &["type", "metric"]),
    };
    let date_idx =
        find_column(&headers, &["date", "day"]).ok_or(GreensandError::MissingColumn("date"))?;
    let value_idx =
        find_column(&headers, &["value"]).ok_or(GreensandError::MissingColumn("value"))?;
    let series_idx =
        find_column(&headers, series_names).ok_or(GreensandError::MissingColumn(series_col))?;
    let time_idx = find_column(&headers, &["time"]);
    let remark_idx = find_column(&headers, &["remark", "note"]);

    let mut outcome = ImportOutcome::default();
    let mut groups: HashMap<BucketKey, Vec<Reading>> = HashMap::new();
    // Times already claimed per bucket, seeded from the store on first touch.
    let mut taken: HashMap<BucketKey, HashSet<NaiveTime>> = HashMap::new();

    for (i, record) in reader.records().enumerate() {
        let row = i + 1;
        outcome.total_rows += 1;

        let record = match record {
            Ok(record) => record,
            Err(e) => {
                outcome.skipped.push(RowIssue::new(row, format!("malformed row: {e}")));
                continue;
            }
        };

        let series = match required_cell(&record, series_idx) {
            Some(raw) => match SeriesId::parse_in_family(raw, family) {
                Ok(series) => series,
                Err(e) => {
                    outcome.skipped.push(RowIssue::new(row, e.to_string()));
                    continue;
                }
            },
            None => {
                outcome
                    .skipped
                    .push(RowIssue::new(row, format!("missing {series_col}")));
                continue;
            }
        };

        let day = match required_cell(&record, date_idx) {
            Some(raw) => match parse_day(raw) {
                Some(day) => day,
                None => {
                    outcome
                        .skipped
                        .push(RowIssue::new(row, format!("unparseable date '{raw}'")));
                    continue;
                }
            },
            None => {
                outcome.skipped.push(RowIssue::new(row, "missing date"));
                continue;
            }
        };

        let time = match time_idx.and_then(|idx| required_cell(&record, idx)) {
            Some(raw) => match parse_time_of_day(raw) {
                Some(time) => time,
                None => {
                    outcome
                        .skipped
                        .push(RowIssue::new(row, format!("unparseable time '{raw}'")));
                    continue;
                }
            },
            None => NaiveTime::MIN,
        };

        let value = match required_cell(&record, value_idx) {
            Some(raw) => match raw.parse::<f64>() {
                Ok(value) if value.is_finite() => value,
                _ => {
                    outcome
                        .skipped
                        .push(RowIssue::new(row, format!("invalid value '{raw}'")));
                    continue;
                }
            },
            None => {
                outcome.skipped.push(RowIssue::new(row, "missing value"));
                continue;
            }
        };

        let remark = remark_idx
            .and_then(|idx| required_cell(&record, idx))
            .map(str::to_owned);

        let key = BucketKey::new(series, day);
        if !taken.contains_key(&key) {
            let existing = store.find_readings(&key).map_err(|e| e.into())?;
            taken.insert(
                key,
                existing.iter().map(|r| r.reading.time_of_day()).collect(),
            );
        }
        let bucket_times = taken.entry(key).or_default();
        if bucket_times.contains(&time) {
            outcome
                .duplicates
                .push(RowIssue::new(row, format!("{key} at {time} already recorded")));
            continue;
        }
        bucket_times.insert(time);

        // value checked finite above
        groups.entry(key).or_default().push(Reading {
            taken_at: day.and_time(time),
            value,
            remark,
        });
    }

    let mut keys = groups.keys().copied().collect::<Vec<_>>();
    keys.sort_by_key(|k| (k.day, k.series.to_string()));

    for key in keys {
        let readings = &groups[&key];
        let is_new = store.get_aggregate(&key).map_err(|e| e.into())?.is_none();
        let limits = if is_new {
            defaults
                .get(key.series)
                .map(LimitsUpdate::Set)
                .unwrap_or_default()
        } else {
            LimitsUpdate::Keep
        };
        record_readings(store, &key, readings, limits)?;
        outcome.imported += readings.len();
        if is_new {
            outcome.created_buckets += 1;
        }
    }

    info!(
        "imported {}/{} rows ({} duplicates, {} skipped, {} new buckets)",
        outcome.imported,
        outcome.total_rows,
        outcome.duplicates.len(),
        outcome.skipped.len(),
        outcome.created_buckets
    );
    Ok(outcome)
}

/// Case-insensitive header lookup over a set of accepted spellings.
fn find_column(headers: &csv::StringRecord, names: &[&str]) -> Option<usize> {
    headers
        .iter()
        .position(|h| names.contains(&h.trim().to_ascii_lowercase().as_str()))
}

/// A cell that must be non-empty to count as present.
fn required_cell<'a>(record: &'a csv::StringRecord, idx: usize) -> Option<&'a str> {
    record.get(idx).map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MockStore;
    use crate::limits::SpecLimits;
    use crate::reading::SandParameter;
    use chrono::NaiveDate;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, d).unwrap()
    }

    fn moisture() -> SeriesId {
        SeriesId::Sand(SandParameter::Moisture)
    }

    #[test]
    fn accounts_for_every_row() {
        let store = MockStore::new();
        let payload = "\
date,time,parameter,value,remark
13-01-2025,08:00,moisture,3.1,
13-01-2025,12:00,moisture,3.4,shift change
13-01-2025,12:00,moisture,3.9,
14-01-2025,08:00,compactability,41.0,
not-a-date,08:00,moisture,3.2,
15-01-2025,08:00,moisture,oops,
15-01-2025,08:00,wet_sand_index,3.0,
";
        let outcome = import_batch(&store, Family::Sand, payload, &LimitsConfig::default()).unwrap();

        assert_eq!(outcome.total_rows, 7);
        assert_eq!(outcome.imported, 3);
        assert_eq!(outcome.duplicates.len(), 1);
        assert_eq!(outcome.skipped.len(), 3);
        assert_eq!(
            outcome.total_rows,
            outcome.imported + outcome.duplicates.len() + outcome.skipped.len()
        );
        assert_eq!(outcome.created_buckets, 2);

        // the 12:00 duplicate kept the first value
        let agg = store
            .get_aggregate(&BucketKey::new(moisture(), day(13)))
            .unwrap()
            .unwrap();
        assert_eq!(agg.stats.count, 2);
        assert_eq!(agg.stats.max, Some(3.4));
    }

    #[test]
    fn reimport_reports_only_duplicates() {
        let store = MockStore::new();
        let payload = "\
date,time,parameter,value
13-01-2025,08:00,moisture,3.1
13-01-2025,12:00,moisture,3.4
14-01-2025,08:00,moisture,3.2
";
        let first = import_batch(&store, Family::Sand, payload, &LimitsConfig::default()).unwrap();
        assert_eq!(first.imported, 3);
        assert_eq!(first.created_buckets, 2);

        let second = import_batch(&store, Family::Sand, payload, &LimitsConfig::default()).unwrap();
        assert_eq!(second.imported, 0);
        assert_eq!(second.duplicates.len(), 3);
        assert_eq!(second.created_buckets, 0);

        // aggregates unchanged by the replay
        let agg = store
            .get_aggregate(&BucketKey::new(moisture(), day(13)))
            .unwrap()
            .unwrap();
        assert_eq!(agg.stats.count, 2);
    }

    #[test]
    fn rows_without_time_key_to_midnight() {
        let store = MockStore::new();
        let payload = "date,parameter,value\n13-01-2025,moisture,3.1\n";
        import_batch(&store, Family::Sand, payload, &LimitsConfig::default()).unwrap();

        let second = import_batch(&store, Family::Sand, payload, &LimitsConfig::default()).unwrap();
        assert_eq!(second.imported, 0);
        assert_eq!(second.duplicates.len(), 1);
    }

    #[test]
    fn new_buckets_get_default_limits() {
        let store = MockStore::new();
        let mut defaults = LimitsConfig::default();
        defaults.insert(moisture(), SpecLimits::new(2.8, 4.2).unwrap());

        let payload = "\
date,time,parameter,value
13-01-2025,08:00,moisture,3.1
13-01-2025,12:00,moisture,3.4
";
        import_batch(&store, Family::Sand, payload, &defaults).unwrap();

        let agg = store
            .get_aggregate(&BucketKey::new(moisture(), day(13)))
            .unwrap()
            .unwrap();
        assert_eq!(agg.limits, Some(SpecLimits::new(2.8, 4.2).unwrap()));
        assert!(agg.stats.cp.is_some());
    }

    #[test]
    fn existing_buckets_keep_their_limits() {
        let store = MockStore::new();
        let pinned = SpecLimits::new(3.0, 4.0).unwrap();
        crate::upsert::add_reading(
            &store,
            moisture(),
            &Reading::new(day(13).and_hms_opt(7, 0, 0).unwrap(), 3.5, None).unwrap(),
            LimitsUpdate::Set(pinned),
        )
        .unwrap();

        let mut defaults = LimitsConfig::default();
        defaults.insert(moisture(), SpecLimits::new(2.8, 4.2).unwrap());
        let payload = "date,time,parameter,value\n13-01-2025,08:00,moisture,3.1\n";
        let outcome = import_batch(&store, Family::Sand, payload, &defaults).unwrap();
        assert_eq!(outcome.created_buckets, 0);

        let agg = store
            .get_aggregate(&BucketKey::new(moisture(), day(13)))
            .unwrap()
            .unwrap();
        assert_eq!(agg.limits, Some(pinned));
    }

    #[test]
    fn runner_payloads_use_the_type_column() {
        let store = MockStore::new();
        let payload = "\
date,time,type,value
13-01-2025,09:15,pouring_temperature,1402.0
13-01-2025,09:15:30,pouring_time,12.4
13-01-2025,10:05,moisture,3.1
";
        let outcome =
            import_batch(&store, Family::Runner, payload, &LimitsConfig::default()).unwrap();

        assert_eq!(outcome.imported, 2);
        assert_eq!(outcome.skipped.len(), 1);
        assert!(outcome.skipped[0].detail.contains("runner"));
        assert_eq!(outcome.created_buckets, 2);
    }

    #[test]
    fn series_column_is_scoped_to_the_family() {
        let store = MockStore::new();
        // a sand payload reads `parameter` even when an unrelated `type`
        // column sits to its left
        let payload = "\
date,type,parameter,value
13-01-2025,silica,moisture,3.1
";
        let outcome = import_batch(&store, Family::Sand, payload, &LimitsConfig::default()).unwrap();
        assert_eq!(outcome.imported, 1);
        assert!(outcome.skipped.is_empty());
        assert!(store
            .get_aggregate(&BucketKey::new(moisture(), day(13)))
            .unwrap()
            .is_some());

        // and a runner payload ignores `parameter` the same way
        let payload = "\
date,parameter,type,value
14-01-2025,mixer-2,pouring_time,12.4
";
        let outcome =
            import_batch(&store, Family::Runner, payload, &LimitsConfig::default()).unwrap();
        assert_eq!(outcome.imported, 1);
        assert!(outcome.skipped.is_empty());
    }

    #[test]
    fn missing_series_column_rejects_the_batch() {
        let store = MockStore::new();
        let payload = "date,value\n13-01-2025,3.1\n";
        let err =
            import_batch(&store, Family::Sand, payload, &LimitsConfig::default()).unwrap_err();
        assert!(err.to_string().contains("parameter"));

        let err =
            import_batch(&store, Family::Runner, payload, &LimitsConfig::default()).unwrap_err();
        assert!(err.to_string().contains("type"));
    }

    #[test]
    fn short_rows_are_skipped_not_fatal() {
        let store = MockStore::new();
        let payload = "\
date,time,parameter,value
13-01-2025,08:00,moisture,3.1
14-01-2025
";
        let outcome =
            import_batch(&store, Family::Sand, payload, &LimitsConfig::default()).unwrap();
        assert_eq!(outcome.imported, 1);
        assert_eq!(outcome.skipped.len(), 1);
    }
}
