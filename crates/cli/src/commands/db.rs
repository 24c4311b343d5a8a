use crate::{commands::Result, util::error::UtilError};
use greensand_core::db::ReadingStore;
use greensand_sqlite::SqliteDb;
use std::{fs, path::PathBuf};
use tracing::info;

/// Delete the database file, if it exists.
pub async fn drop_db(db_path: &str) -> Result<()> {
    if fs::metadata(db_path).is_ok() {
        fs::remove_file(db_path)?;
        info!("deleted database file '{db_path}'");
    } else {
        info!("database file '{db_path}' does not exist");
    }
    Ok(())
}

/// Drop the database file and recreate it with empty tables.
pub async fn reset_db(db_path: &str) -> Result<()> {
    drop_db(db_path).await?;

    // reopening the path creates a fresh empty file for the new tables
    let db = SqliteDb::from_file(db_path).expect("failed to open greensand DB file");
    db.create_tables()?;
    info!("database reset; tables recreated");
    Ok(())
}

/// Copy the live database file to `target_path`.
pub async fn export_db(src_path: &str, target_path: PathBuf) -> Result<()> {
    if fs::metadata(src_path).is_err() {
        return Err(UtilError::DBDoesNotExist.into());
    }

    fs::copy(src_path, &target_path).map_err(UtilError::DBExportFailed)?;
    info!("database exported to '{}'", target_path.display());
    Ok(())
}

/// Replace the live database file with `src_path`, keeping a backup of
/// whatever was there.
pub async fn import_db(src_path: PathBuf, target_path: &str) -> Result<()> {
    if !src_path.exists() {
        return Err(UtilError::DBDoesNotExist.into());
    }

    if fs::metadata(target_path).is_ok() {
        let backup_path = format!("{target_path}.backup");
        fs::copy(target_path, &backup_path).map_err(UtilError::DBBackupFailed)?;
        info!("created backup of the existing database at '{backup_path}'");
    }

    fs::copy(&src_path, target_path).map_err(UtilError::DBImportFailed)?;
    info!("database imported from '{}'", src_path.display());
    Ok(())
}
