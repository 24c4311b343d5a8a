use greensand_core::{db::ReadingStore, upsert};
use tracing::info;

use crate::commands::Result;

/// Remove a stored reading by id and recompute its bucket. The bucket's
/// aggregate row survives even when this empties it, so its limits stay.
pub async fn delete(db: &impl ReadingStore, id: i64) -> Result<()> {
    let aggregate = upsert::delete_reading(db, id)?;
    info!(
        "reading {id} deleted; bucket recomputed over {} readings",
        aggregate.stats.count
    );
    Ok(())
}
