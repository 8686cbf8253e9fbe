// Commit half of a pass: append records to history, then empty staging.
//
// At-least-once: inserts are individual statements with no transaction across
// the pass. If insert k of n fails, records 0..k stay written and staging is
// left intact, so the next pass re-aggregates the same raw samples (merged
// with anything appended since) and may write duplicate or skewed records.

use tracing::{debug, warn};

use super::{DrainMode, PassError, PassPlan, PassSummary};
use crate::store::RollupStore;

pub async fn drain(
    store: &dyn RollupStore,
    plan: &PassPlan,
    mode: DrainMode,
) -> Result<PassSummary, PassError> {
    let total = plan.records.len();
    for (written, record) in plan.records.iter().enumerate() {
        if let Err(source) = store.insert_consolidated(record).await {
            warn!(
                error = %source,
                operation = "insert_consolidated",
                device_id = %record.device_id,
                stat = %record.stat,
                written,
                total,
                "aborting pass; staging left intact"
            );
            return Err(PassError::Insert {
                written,
                total,
                source,
            });
        }
    }

    let drained = match mode {
        DrainMode::Snapshot => match plan.cursor {
            Some(cursor) => store.drain_through(cursor).await,
            None => Ok(0),
        },
        DrainMode::ClearAll => store.clear_staging().await,
    }
    .map_err(|source| PassError::Drain {
        written: total,
        source,
    })?;

    debug!(operation = "drain", drained, ?mode, "staging drained");

    Ok(PassSummary {
        bucket: plan.bucket,
        samples_read: plan.samples_read,
        groups: plan.groups,
        records_written: total,
        filtered_out: plan.filtered_out,
        drained,
    })
}
