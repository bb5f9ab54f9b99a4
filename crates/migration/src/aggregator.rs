//! Result aggregation for bulk runs.
//!
//! [`ResultAggregator`] is a plain accumulator. During a run it is owned by a
//! single task ([`AggregatorHandle::spawn`]) and workers reach it only through
//! a [`ResultRecorder`] channel, so no counters are shared between workers.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::warn;

use variantforge_catalog::MaterialId;
use variantforge_core::UserId;

use crate::error::MigrationError;
use crate::result::{BulkCompletion, BulkMigrationResult, MigrationResult, MigrationSummary};

/// Accumulates per-item results into a [`BulkMigrationResult`].
#[derive(Debug)]
pub struct ResultAggregator {
    requested_by: UserId,
    started_at: DateTime<Utc>,
    // Keyed by submission position so completion order does not matter.
    slots: BTreeMap<usize, MigrationResult>,
    seen: HashSet<MaterialId>,
    successful: usize,
    failed: usize,
    batches_processed: usize,
    completion: BulkCompletion,
}

impl ResultAggregator {
    pub fn new(requested_by: UserId, started_at: DateTime<Utc>) -> Self {
        Self {
            requested_by,
            started_at,
            slots: BTreeMap::new(),
            seen: HashSet::new(),
            successful: 0,
            failed: 0,
            batches_processed: 0,
            completion: BulkCompletion::Completed,
        }
    }

    /// Record the result submitted at `position`.
    ///
    /// Returns `false` (and records nothing) if the position or the material
    /// was already recorded.
    pub fn record(&mut self, position: usize, result: MigrationResult) -> bool {
        if self.slots.contains_key(&position) || !self.seen.insert(result.material_id) {
            warn!(
                position,
                material_id = %result.material_id,
                "duplicate migration result ignored"
            );
            return false;
        }

        if result.success {
            self.successful += 1;
        } else {
            self.failed += 1;
        }
        self.slots.insert(position, result);
        true
    }

    pub fn batch_completed(&mut self) {
        self.batches_processed += 1;
    }

    /// First abort wins; cancellation never overrides an abort.
    pub fn mark_aborted(&mut self, material_id: MaterialId) {
        if self.completion == BulkCompletion::Completed {
            self.completion = BulkCompletion::Aborted { material_id };
        }
    }

    pub fn mark_cancelled(&mut self) {
        if self.completion == BulkCompletion::Completed {
            self.completion = BulkCompletion::Cancelled;
        }
    }

    pub fn total_processed(&self) -> usize {
        self.slots.len()
    }

    pub fn finalize(self, completed_at: DateTime<Utc>) -> BulkMigrationResult {
        let results: Vec<MigrationResult> = self.slots.into_values().collect();
        let total_processed = results.len();

        let mut failures_by_kind = BTreeMap::new();
        let mut migrated_with_warnings = 0;
        for result in &results {
            if result.success {
                if !result.warnings.is_empty() {
                    migrated_with_warnings += 1;
                }
            } else if let Some(kind) = result.error_kind {
                *failures_by_kind.entry(kind).or_insert(0) += 1;
            }
        }

        let success_rate = if total_processed == 0 {
            0.0
        } else {
            self.successful as f64 / total_processed as f64
        };
        let elapsed_ms = (completed_at - self.started_at)
            .num_milliseconds()
            .max(0) as u64;

        BulkMigrationResult {
            total_processed,
            successful_migrations: self.successful,
            failed_migrations: self.failed,
            results,
            completion: self.completion,
            summary: MigrationSummary {
                success_rate,
                migrated_with_warnings,
                failures_by_kind,
                batches_processed: self.batches_processed,
                elapsed_ms,
            },
            requested_by: self.requested_by,
            started_at: self.started_at,
            completed_at,
        }
    }
}

#[derive(Debug)]
enum AggregatorMessage {
    Record {
        position: usize,
        result: Box<MigrationResult>,
    },
    BatchCompleted,
    Aborted(MaterialId),
    Cancelled,
    Finish,
}

/// Cloneable sending side handed to workers.
#[derive(Debug, Clone)]
pub struct ResultRecorder {
    tx: mpsc::UnboundedSender<AggregatorMessage>,
}

impl ResultRecorder {
    pub fn record(&self, position: usize, result: MigrationResult) {
        self.send(AggregatorMessage::Record {
            position,
            result: Box::new(result),
        });
    }

    pub fn batch_completed(&self) {
        self.send(AggregatorMessage::BatchCompleted);
    }

    pub fn aborted(&self, material_id: MaterialId) {
        self.send(AggregatorMessage::Aborted(material_id));
    }

    pub fn cancelled(&self) {
        self.send(AggregatorMessage::Cancelled);
    }

    fn send(&self, message: AggregatorMessage) {
        // Only fails once the aggregator task is gone; finalize reports that.
        if self.tx.send(message).is_err() {
            warn!("result aggregator is no longer running; message dropped");
        }
    }
}

/// Owner of the running aggregator task.
#[derive(Debug)]
pub struct AggregatorHandle {
    recorder: ResultRecorder,
    task: JoinHandle<ResultAggregator>,
}

impl AggregatorHandle {
    pub fn spawn(mut aggregator: ResultAggregator) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel();

        let task = tokio::spawn(async move {
            while let Some(message) = rx.recv().await {
                match message {
                    AggregatorMessage::Record { position, result } => {
                        aggregator.record(position, *result);
                    }
                    AggregatorMessage::BatchCompleted => aggregator.batch_completed(),
                    AggregatorMessage::Aborted(material_id) => aggregator.mark_aborted(material_id),
                    AggregatorMessage::Cancelled => aggregator.mark_cancelled(),
                    AggregatorMessage::Finish => break,
                }
            }
            aggregator
        });

        Self {
            recorder: ResultRecorder { tx },
            task,
        }
    }

    pub fn recorder(&self) -> ResultRecorder {
        self.recorder.clone()
    }

    /// Stop accepting messages and build the report.
    ///
    /// Every worker must have finished sending before this is called;
    /// anything sent afterwards is dropped.
    pub async fn finalize(self) -> Result<BulkMigrationResult, MigrationError> {
        self.recorder.send(AggregatorMessage::Finish);
        let aggregator = self
            .task
            .await
            .map_err(|e| MigrationError::Aggregation(e.to_string()))?;
        Ok(aggregator.finalize(Utc::now()))
    }
}
