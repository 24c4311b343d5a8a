use greensand_core::{db::ReadingStore, upsert};
use tracing::info;

use crate::commands::{error::ArgsError, Result};

/// Patch a stored reading by id and recompute its bucket.
pub async fn edit(
    db: &impl ReadingStore,
    id: i64,
    value: Option<f64>,
    remark: Option<String>,
    clear_remark: bool,
) -> Result<()> {
    if value.is_none() && remark.is_none() && !clear_remark {
        return Err(ArgsError::EditArgsMissing.into());
    }
    // doubly-optional remark: None leaves it alone, Some(None) clears it
    let remark = if clear_remark {
        Some(None)
    } else {
        remark.map(Some)
    };

    let aggregate = upsert::edit_reading(db, id, value, remark)?;
    info!(
        "reading {id} updated; bucket recomputed over {} readings",
        aggregate.stats.count
    );
    Ok(())
}
