//! Batched, partial-failure-tolerant migration of many materials.
//!
//! ## Execution model
//!
//! - The material set is resolved once, up front (snapshot semantics).
//! - Ids are split into consecutive batches of `batch_size`, processed one
//!   after another.
//! - Inside a batch up to `worker_count()` items run concurrently, each on its
//!   own task holding a semaphore permit.
//! - Workers report to the aggregator task by position, so the final list is
//!   in submission order no matter who finishes first.
//! - Cancellation stops new items from starting; running items finish.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use tokio::sync::Semaphore;
use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use variantforge_catalog::MaterialId;
use variantforge_core::UserId;

use crate::aggregator::{AggregatorHandle, ResultAggregator, ResultRecorder};
use crate::error::MigrationError;
use crate::options::{BulkMigrationOptions, MigrationFlags};
use crate::ports::MaterialReader;
use crate::result::{BulkMigrationResult, MigrationResult};
use crate::single::SingleMigrator;

/// How a batch ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BatchEnd {
    Finished,
    Aborted,
    Cancelled,
}

/// Per-run state shared by every batch.
struct RunContext {
    flags: MigrationFlags,
    user: UserId,
    workers: usize,
    stop_on_error: bool,
    recorder: ResultRecorder,
    aborted: Arc<AtomicBool>,
    cancel: CancellationToken,
}

/// Drives [`SingleMigrator`] over a material set.
#[derive(Clone)]
pub struct BatchOrchestrator {
    materials: Arc<dyn MaterialReader>,
    migrator: SingleMigrator,
}

impl BatchOrchestrator {
    pub fn new(materials: Arc<dyn MaterialReader>, migrator: SingleMigrator) -> Self {
        Self { materials, migrator }
    }

    /// Run a bulk migration.
    ///
    /// Per-item failures never surface as `Err`: they are recorded in the
    /// result. `Err` means the run could not start (invalid options, the
    /// material set could not be resolved) or the aggregator died.
    pub async fn migrate_bulk(
        &self,
        options: &BulkMigrationOptions,
        user: UserId,
        cancel: CancellationToken,
    ) -> Result<BulkMigrationResult, MigrationError> {
        options.validate()?;
        let ids = self.resolve(options).await?;

        let handle = AggregatorHandle::spawn(ResultAggregator::new(user, Utc::now()));
        let ctx = RunContext {
            flags: options.flags(),
            user,
            workers: options.worker_count(),
            stop_on_error: !options.continue_on_error,
            recorder: handle.recorder(),
            aborted: Arc::new(AtomicBool::new(false)),
            cancel,
        };

        let batch_count = ids.len().div_ceil(options.batch_size);
        info!(
            materials = ids.len(),
            batches = batch_count,
            batch_size = options.batch_size,
            workers = ctx.workers,
            skip_validation = options.skip_validation,
            force_migration = options.force_migration,
            continue_on_error = options.continue_on_error,
            requested_by = %user,
            "bulk migration started"
        );

        for (index, batch) in ids.chunks(options.batch_size).enumerate() {
            if ctx.cancel.is_cancelled() {
                ctx.recorder.cancelled();
                break;
            }

            let offset = index * options.batch_size;
            debug!(batch = index + 1, of = batch_count, size = batch.len(), "batch started");
            let end = self.run_batch(batch, offset, &ctx).await;
            ctx.recorder.batch_completed();

            match end {
                BatchEnd::Finished => {}
                BatchEnd::Aborted => {
                    warn!(batch = index + 1, "bulk migration aborted on first failure");
                    break;
                }
                BatchEnd::Cancelled => {
                    warn!(batch = index + 1, "bulk migration cancelled");
                    ctx.recorder.cancelled();
                    break;
                }
            }
        }

        drop(ctx);
        let report = handle.finalize().await?;

        info!(
            total = report.total_processed,
            successful = report.successful_migrations,
            failed = report.failed_migrations,
            completion = ?report.completion,
            elapsed_ms = report.summary.elapsed_ms,
            "bulk migration finished"
        );
        Ok(report)
    }

    /// Ids to migrate, in order, without duplicates.
    async fn resolve(&self, options: &BulkMigrationOptions) -> Result<Vec<MaterialId>, MigrationError> {
        let ids = match options.explicit_ids() {
            Some(ids) => ids.to_vec(),
            None => self
                .materials
                .get_all()
                .await
                .map_err(MigrationError::Resolution)?
                .into_iter()
                .map(|m| m.id)
                .collect(),
        };
        Ok(dedup_in_order(ids))
    }

    async fn run_batch(&self, batch: &[MaterialId], offset: usize, ctx: &RunContext) -> BatchEnd {
        let semaphore = Arc::new(Semaphore::new(ctx.workers));
        let mut in_flight = Vec::with_capacity(batch.len());
        let mut end = BatchEnd::Finished;

        for (i, &material_id) in batch.iter().enumerate() {
            let permit = tokio::select! {
                biased;
                _ = ctx.cancel.cancelled() => {
                    end = BatchEnd::Cancelled;
                    break;
                }
                permit = semaphore.clone().acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
            };
            // A permit frees up only after the previous holder has recorded
            // its result and, on failure, raised the abort flag.
            if ctx.aborted.load(Ordering::SeqCst) {
                end = BatchEnd::Aborted;
                break;
            }

            let position = offset + i;
            let migrator = self.migrator.clone();
            let recorder = ctx.recorder.clone();
            let aborted = ctx.aborted.clone();
            let (flags, user, stop_on_error) = (ctx.flags, ctx.user, ctx.stop_on_error);

            let task = tokio::spawn(async move {
                let _permit = permit;
                // Run the item on its own task so a panic turns into a result
                // here, while the permit is still held.
                let item = tokio::spawn(async move { migrator.migrate_one(material_id, flags, user).await });
                let result = match item.await {
                    Ok(result) => result,
                    Err(e) => worker_died(material_id, position, &e, user),
                };
                if !result.success && stop_on_error && !aborted.swap(true, Ordering::SeqCst) {
                    recorder.aborted(material_id);
                }
                recorder.record(position, result);
            });
            in_flight.push((position, material_id, task));
        }

        for (position, material_id, task) in in_flight {
            if let Err(e) = task.await {
                let result = worker_died(material_id, position, &e, ctx.user);
                if ctx.stop_on_error && !ctx.aborted.swap(true, Ordering::SeqCst) {
                    ctx.recorder.aborted(material_id);
                }
                ctx.recorder.record(position, result);
            }
        }

        if end == BatchEnd::Finished && ctx.aborted.load(Ordering::SeqCst) {
            end = BatchEnd::Aborted;
        }
        end
    }
}

fn worker_died(material_id: MaterialId, position: usize, error: &JoinError, user: UserId) -> MigrationResult {
    error!(%material_id, position, error = %error, "migration worker died");
    MigrationResult::internal(material_id, format!("migration worker died: {error}"), user, Utc::now())
}

fn dedup_in_order(ids: Vec<MaterialId>) -> Vec<MaterialId> {
    let mut seen = HashSet::with_capacity(ids.len());
    let before = ids.len();
    let unique: Vec<MaterialId> = ids.into_iter().filter(|id| seen.insert(*id)).collect();
    if unique.len() != before {
        warn!(dropped = before - unique.len(), "duplicate material ids ignored");
    }
    unique
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BulkCompletion;
    use crate::error::MigrationErrorKind;
    use crate::testing::{FakeMaterials, FakeReferences, FakeWriter, RecordingPublisher};
    use crate::transform::Transformer;
    use variantforge_catalog::Material;

    struct Fixture {
        refs: Arc<FakeReferences>,
        writer: Arc<FakeWriter>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                refs: Arc::new(FakeReferences::seeded()),
                writer: Arc::new(FakeWriter::default()),
            }
        }

        /// Materials named `M1..=Mn`; the positions (1-based) in `invalid`
        /// lack a category.
        fn materials(&self, n: usize, invalid: &[usize]) -> Vec<Material> {
            (1..=n)
                .map(|i| {
                    let m = Material::new(MaterialId::new(), format!("M{i}"))
                        .with_unit(self.refs.unit(), 1.0)
                        .with_quantity(i as f64);
                    if invalid.contains(&i) { m } else { m.with_category(self.refs.category()) }
                })
                .collect()
        }

        fn orchestrator(&self, materials: FakeMaterials) -> BatchOrchestrator {
            let materials = Arc::new(materials);
            let migrator = SingleMigrator::new(
                materials.clone(),
                self.writer.clone(),
                self.refs.clone(),
                Arc::new(RecordingPublisher::default()),
                Transformer::new(),
            );
            BatchOrchestrator::new(materials, migrator)
        }
    }

    #[tokio::test]
    async fn continues_past_failures_and_keeps_order() {
        let fx = Fixture::new();
        let materials = fx.materials(25, &[7, 19]);
        let ids: Vec<MaterialId> = materials.iter().map(|m| m.id).collect();
        let options = BulkMigrationOptions::for_materials(ids.clone()).with_batch_size(10);

        let report = fx
            .orchestrator(FakeMaterials::with(materials))
            .migrate_bulk(&options, UserId::new(), CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.total_processed, 25);
        assert_eq!(report.successful_migrations, 23);
        assert_eq!(report.failed_migrations, 2);
        assert_eq!(report.summary.batches_processed, 3);
        assert_eq!(report.completion, BulkCompletion::Completed);
        let order: Vec<MaterialId> = report.results.iter().map(|r| r.material_id).collect();
        assert_eq!(order, ids);
        assert!(!report.results[6].success);
        assert!(!report.results[18].success);
    }

    #[tokio::test]
    async fn stops_at_first_failure_when_not_continuing() {
        let fx = Fixture::new();
        let materials = fx.materials(25, &[7, 19]);
        let ids: Vec<MaterialId> = materials.iter().map(|m| m.id).collect();
        let options = BulkMigrationOptions::for_materials(ids.clone())
            .with_batch_size(10)
            .with_continue_on_error(false);

        let report = fx
            .orchestrator(FakeMaterials::with(materials))
            .migrate_bulk(&options, UserId::new(), CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.total_processed, 7);
        assert_eq!(report.successful_migrations, 6);
        assert_eq!(report.failed_migrations, 1);
        assert_eq!(report.completion, BulkCompletion::Aborted { material_id: ids[6] });
        assert_eq!(fx.writer.variant_count(), 6);
    }

    #[tokio::test]
    async fn resolves_all_materials_when_no_ids_given() {
        let fx = Fixture::new();
        let materials = fx.materials(4, &[]);
        let ids: Vec<MaterialId> = materials.iter().map(|m| m.id).collect();

        let report = fx
            .orchestrator(FakeMaterials::with(materials))
            .migrate_bulk(&BulkMigrationOptions::default(), UserId::new(), CancellationToken::new())
            .await
            .unwrap();

        let order: Vec<MaterialId> = report.results.iter().map(|r| r.material_id).collect();
        assert_eq!(order, ids);
        assert_eq!(report.successful_migrations, 4);
    }

    #[tokio::test]
    async fn resolution_failure_is_an_engine_error() {
        let fx = Fixture::new();

        let err = fx
            .orchestrator(FakeMaterials::default().failing_get_all())
            .migrate_bulk(&BulkMigrationOptions::default(), UserId::new(), CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, MigrationError::Resolution(_)));
    }

    #[tokio::test]
    async fn duplicate_ids_are_migrated_once() {
        let fx = Fixture::new();
        let materials = fx.materials(2, &[]);
        let (a, b) = (materials[0].id, materials[1].id);
        let options = BulkMigrationOptions::for_materials([a, b, a, b, a]);

        let report = fx
            .orchestrator(FakeMaterials::with(materials))
            .migrate_bulk(&options, UserId::new(), CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.total_processed, 2);
        assert_eq!(fx.writer.variant_count(), 2);
    }

    #[tokio::test]
    async fn unknown_ids_are_recorded_as_not_found() {
        let fx = Fixture::new();
        let materials = fx.materials(1, &[]);
        let missing = MaterialId::new();
        let options = BulkMigrationOptions::for_materials([materials[0].id, missing]);

        let report = fx
            .orchestrator(FakeMaterials::with(materials))
            .migrate_bulk(&options, UserId::new(), CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.successful_migrations, 1);
        assert_eq!(report.results[1].material_id, missing);
        assert_eq!(report.results[1].error_kind, Some(MigrationErrorKind::NotFound));
    }

    #[tokio::test]
    async fn panicking_item_becomes_internal_failure() {
        let fx = Fixture::new();
        let materials = fx.materials(5, &[]);
        let ids: Vec<MaterialId> = materials.iter().map(|m| m.id).collect();
        let reader = FakeMaterials::with(materials).panicking_on(ids[1]);
        let options = BulkMigrationOptions::for_materials(ids.clone()).with_max_concurrency(3);

        let report = fx
            .orchestrator(reader)
            .migrate_bulk(&options, UserId::new(), CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.total_processed, 5);
        assert_eq!(report.successful_migrations, 4);
        assert_eq!(report.failed_migrations, 1);
        assert_eq!(report.completion, BulkCompletion::Completed);
        let order: Vec<MaterialId> = report.results.iter().map(|r| r.material_id).collect();
        assert_eq!(order, ids);
        let died = &report.results[1];
        assert_eq!(died.error_kind, Some(MigrationErrorKind::Internal));
        assert_eq!(died.failed_stage, None);
        assert!(died.error_message.as_deref().is_some_and(|m| m.contains("worker died")));
        assert_eq!(report.summary.failures_by_kind.get(&MigrationErrorKind::Internal), Some(&1));
    }

    #[tokio::test]
    async fn panicking_item_stops_the_run_when_not_continuing() {
        let fx = Fixture::new();
        let materials = fx.materials(5, &[]);
        let ids: Vec<MaterialId> = materials.iter().map(|m| m.id).collect();
        let reader = FakeMaterials::with(materials).panicking_on(ids[1]);
        let options = BulkMigrationOptions::for_materials(ids.clone()).with_continue_on_error(false);

        let report = fx
            .orchestrator(reader)
            .migrate_bulk(&options, UserId::new(), CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.total_processed, 2);
        assert_eq!(report.successful_migrations, 1);
        assert_eq!(report.results[1].error_kind, Some(MigrationErrorKind::Internal));
        assert_eq!(report.completion, BulkCompletion::Aborted { material_id: ids[1] });
        assert_eq!(fx.writer.variant_count(), 1);
    }

    #[tokio::test]
    async fn pre_cancelled_run_processes_nothing() {
        let fx = Fixture::new();
        let materials = fx.materials(5, &[]);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let report = fx
            .orchestrator(FakeMaterials::with(materials))
            .migrate_bulk(&BulkMigrationOptions::default(), UserId::new(), cancel)
            .await
            .unwrap();

        assert_eq!(report.total_processed, 0);
        assert_eq!(report.completion, BulkCompletion::Cancelled);
        assert_eq!(fx.writer.base_count(), 0);
    }

    #[tokio::test]
    async fn invalid_options_are_rejected_up_front() {
        let fx = Fixture::new();

        let err = fx
            .orchestrator(FakeMaterials::default())
            .migrate_bulk(
                &BulkMigrationOptions::default().with_batch_size(0),
                UserId::new(),
                CancellationToken::new(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, MigrationError::InvalidOptions(_)));
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 32,
                ..ProptestConfig::default()
            })]

            /// Property: with continue_on_error every id is attempted exactly
            /// once, in order, whatever the batch size and worker count.
            #[test]
            fn every_material_attempted_once_in_order(
                n in 0usize..40,
                batch_size in 1usize..12,
                workers in 1usize..6,
                invalid in proptest::collection::vec(1usize..40, 0..8),
            ) {
                let runtime = tokio::runtime::Runtime::new().unwrap();
                let fx = Fixture::new();
                let materials = fx.materials(n, &invalid);
                let ids: Vec<MaterialId> = materials.iter().map(|m| m.id).collect();
                let options = BulkMigrationOptions::for_materials(ids.clone())
                    .with_batch_size(batch_size)
                    .with_max_concurrency(workers);

                let report = runtime
                    .block_on(fx.orchestrator(FakeMaterials::with(materials)).migrate_bulk(
                        &options,
                        UserId::new(),
                        CancellationToken::new(),
                    ))
                    .unwrap();

                let expected_failures = (1..=n).filter(|i| invalid.contains(i)).count();
                prop_assert_eq!(report.total_processed, n);
                prop_assert_eq!(report.failed_migrations, expected_failures);
                prop_assert_eq!(
                    report.successful_migrations + report.failed_migrations,
                    report.total_processed
                );
                let order: Vec<MaterialId> = report.results.iter().map(|r| r.material_id).collect();
                prop_assert_eq!(order, ids);
            }
        }
    }
}
