// Rollup core: snapshot staging, group per (device_id, stat), apply the
// numeric-mean / latest-value policy, then commit and drain (see `drain`).
//
// Computation (`Aggregator::plan`, `consolidate`) never touches history or
// staging contents; `drain` is the only step with side effects.

pub mod drain;
pub mod numeric;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, DurationRound, TimeDelta, Utc};
use serde::Deserialize;
use tracing::{info, instrument};

use crate::models::{ConsolidatedRecord, RawSample, StagedSample, StagingCursor};
use crate::store::{RollupStore, StoreError};

pub use drain::drain;

/// How staging is emptied after a pass commits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrainMode {
    /// Delete only the rows the pass snapshot read (`id <= cursor`). Samples
    /// appended while the pass runs stay for the next pass.
    #[default]
    Snapshot,
    /// Delete everything in staging. Samples appended between the snapshot and
    /// the clear are lost without being aggregated.
    ClearAll,
}

#[derive(Debug, thiserror::Error)]
pub enum PassError {
    #[error("staging snapshot failed: {0}")]
    Snapshot(#[source] StoreError),
    #[error("history insert failed after {written} of {total} records written: {source}")]
    Insert {
        written: usize,
        total: usize,
        #[source]
        source: StoreError,
    },
    #[error("staging drain failed after all {written} records written: {source}")]
    Drain {
        written: usize,
        #[source]
        source: StoreError,
    },
}

/// Output of the compute half of a pass.
#[derive(Debug, Clone)]
pub struct PassPlan {
    pub bucket: DateTime<Utc>,
    /// Records to persist, after the allow-list filter.
    pub records: Vec<ConsolidatedRecord>,
    /// Highest staged id in the snapshot; `None` for an empty snapshot.
    pub cursor: Option<StagingCursor>,
    pub samples_read: usize,
    pub groups: usize,
    /// Groups computed but not persisted because their stat is not allow-listed.
    pub filtered_out: usize,
}

/// Outcome of a committed pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassSummary {
    pub bucket: DateTime<Utc>,
    pub samples_read: usize,
    pub groups: usize,
    pub records_written: usize,
    pub filtered_out: usize,
    pub drained: u64,
}

/// Pass start floored to the minute; the shared timestamp of every record in a pass.
pub fn floor_to_minute(now: DateTime<Utc>) -> DateTime<Utc> {
    now.duration_trunc(TimeDelta::minutes(1)).unwrap_or(now)
}

/// Groups `snapshot` by (device_id, stat) and builds one record per group,
/// ordered by device_id then stat. Within a group, snapshot order is kept.
pub fn consolidate(snapshot: &[StagedSample], bucket: DateTime<Utc>) -> Vec<ConsolidatedRecord> {
    type Key<'a> = (&'a str, &'a str);
    let mut by_key: HashMap<Key<'_>, Vec<&RawSample>> = HashMap::new();
    for staged in snapshot {
        let s = &staged.sample;
        by_key
            .entry((s.device_id.as_str(), s.stat.as_str()))
            .or_default()
            .push(s);
    }

    let mut out: Vec<ConsolidatedRecord> = by_key
        .into_iter()
        .filter_map(|((device_id, stat), group)| {
            let value = consolidate_values(&group)?;
            Some(ConsolidatedRecord {
                device_id: device_id.to_string(),
                stat: stat.to_string(),
                timestamp: bucket,
                value,
                sample_count: u32::try_from(group.len()).unwrap_or(u32::MAX),
            })
        })
        .collect();
    out.sort_by(|a, b| (&a.device_id, &a.stat).cmp(&(&b.device_id, &b.stat)));
    out
}

/// Numeric group: mean to two decimals. Otherwise the value with the latest
/// timestamp; among equal timestamps the one read last wins.
fn consolidate_values(group: &[&RawSample]) -> Option<String> {
    if let Some(mean) = numeric::numeric_mean(group.iter().map(|s| s.value.as_str())) {
        return Some(numeric::format_mean(mean));
    }
    // max_by_key returns the last of equal maxima.
    group
        .iter()
        .max_by_key(|s| s.timestamp)
        .map(|s| s.value.clone())
}

/// Compute half of a pass: one staging read, then pure consolidation.
pub struct Aggregator {
    store: Arc<dyn RollupStore>,
    allow_listed_stats: Option<HashSet<String>>,
}

impl Aggregator {
    /// `allow_listed_stats = None` persists every group.
    pub fn new(store: Arc<dyn RollupStore>, allow_listed_stats: Option<Vec<String>>) -> Self {
        Self {
            store,
            allow_listed_stats: allow_listed_stats.map(|v| v.into_iter().collect()),
        }
    }

    pub async fn plan(&self, now: DateTime<Utc>) -> Result<PassPlan, PassError> {
        let snapshot = self
            .store
            .snapshot_staging()
            .await
            .map_err(PassError::Snapshot)?;
        let bucket = floor_to_minute(now);
        let all = consolidate(&snapshot, bucket);
        let groups = all.len();

        let records: Vec<ConsolidatedRecord> = match &self.allow_listed_stats {
            Some(allowed) => all
                .into_iter()
                .filter(|r| allowed.contains(&r.stat))
                .collect(),
            None => all,
        };

        Ok(PassPlan {
            bucket,
            filtered_out: groups - records.len(),
            records,
            cursor: StagingCursor::from_snapshot(&snapshot),
            samples_read: snapshot.len(),
            groups,
        })
    }
}

/// One full pass: plan, then commit and drain.
pub struct Rollup {
    aggregator: Aggregator,
    store: Arc<dyn RollupStore>,
    drain_mode: DrainMode,
}

impl Rollup {
    pub fn new(
        store: Arc<dyn RollupStore>,
        allow_listed_stats: Option<Vec<String>>,
        drain_mode: DrainMode,
    ) -> Self {
        Self {
            aggregator: Aggregator::new(store.clone(), allow_listed_stats),
            store,
            drain_mode,
        }
    }

    pub fn aggregator(&self) -> &Aggregator {
        &self.aggregator
    }

    /// Runs one pass. On error nothing has been drained; records inserted
    /// before an insert failure stay written, so the retry may duplicate them.
    #[instrument(skip(self), fields(drain_mode = ?self.drain_mode))]
    pub async fn run_pass(&self, now: DateTime<Utc>) -> Result<PassSummary, PassError> {
        let plan = self.aggregator.plan(now).await?;
        let summary = drain(self.store.as_ref(), &plan, self.drain_mode).await?;
        info!(
            samples_read = summary.samples_read,
            groups = summary.groups,
            records_written = summary.records_written,
            filtered_out = summary.filtered_out,
            drained = summary.drained,
            "Processed {} staged samples at {}",
            summary.samples_read,
            summary.bucket.to_rfc3339(),
        );
        Ok(summary)
    }
}
