use std::fs;

use greensand_core::{
    db::ReadingStore,
    import::{import_batch, ImportOutcome},
    limits::LimitsConfig,
    reading::Family,
};

use crate::{
    commands::{error::ArgsError, Result},
    util::bold,
};

/// Import a CSV payload for one family, then print the per-row accounting.
pub async fn import(
    db: &impl ReadingStore,
    family: String,
    path: String,
    limits: Option<String>,
) -> Result<()> {
    let family: Family = family.parse().map_err(|_| ArgsError::FamilyInvalid(family))?;
    let defaults = match limits {
        Some(limits_path) => LimitsConfig::from_file(&limits_path)?,
        None => LimitsConfig::default(),
    };
    let payload = fs::read_to_string(&path)?;

    let outcome = import_batch(db, family, &payload, &defaults)?;
    print_outcome(&outcome);
    Ok(())
}

fn print_outcome(outcome: &ImportOutcome) {
    println!(
        "imported {} of {} rows ({} new buckets)",
        outcome.imported, outcome.total_rows, outcome.created_buckets
    );
    if !outcome.duplicates.is_empty() {
        let header = format!("{} duplicate rows:", outcome.duplicates.len());
        println!("{}", bold(header));
        for issue in &outcome.duplicates {
            println!("  row {}: {}", issue.row, issue.detail);
        }
    }
    if !outcome.skipped.is_empty() {
        let header = format!("{} skipped rows:", outcome.skipped.len());
        println!("{}", bold(header));
        for issue in &outcome.skipped {
            println!("  row {}: {}", issue.row, issue.detail);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use greensand_core::bucket::BucketKey;
    use greensand_sqlite::SqliteDb;
    use tempfile::TempDir;

    #[tokio::test]
    async fn imports_a_payload_with_default_limits() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let payload_path = temp_dir.path().join("sand.csv");
        std::fs::write(
            &payload_path,
            "date,time,parameter,value\n\
             13-01-2025,08:00,moisture,10.0\n\
             13-01-2025,09:00,moisture,12.0\n\
             13-01-2025,09:00,moisture,12.0\n\
             13-01-2025,10:00,moisture,14.0\n",
        )
        .expect("Failed to write payload");
        let limits_path = temp_dir.path().join("limits.toml");
        std::fs::write(&limits_path, "[moisture]\nlower = 5.0\nupper = 20.0\n")
            .expect("Failed to write limits file");

        let db = SqliteDb::new_memory();
        db.create_tables().expect("Failed to create tables");

        import(
            &db,
            "sand".to_owned(),
            payload_path.to_str().unwrap().to_owned(),
            Some(limits_path.to_str().unwrap().to_owned()),
        )
        .await
        .expect("Failed to import payload");

        // three distinct times; the repeated 09:00 row is a duplicate
        let key = BucketKey::new(
            "moisture".parse().unwrap(),
            NaiveDate::from_ymd_opt(2025, 1, 13).unwrap(),
        );
        let aggregate = db
            .get_aggregate(&key)
            .expect("query failed")
            .expect("bucket has no aggregate");
        assert_eq!(aggregate.stats.count, 3);
        assert_eq!(aggregate.stats.average, Some(12.0));

        let limits = aggregate.limits.expect("default limits not applied");
        assert_eq!((limits.lower, limits.upper), (5.0, 20.0));
        assert!(aggregate.stats.cpk.is_some());
    }

    #[tokio::test]
    async fn unknown_family_is_rejected() {
        let db = SqliteDb::new_memory();
        db.create_tables().expect("Failed to create tables");

        let imported = import(&db, "plastic".to_owned(), "unused.csv".to_owned(), None).await;
        assert!(imported.is_err());
    }
}
