//! Single-material migration: validate → transform → persist → publish.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, warn};

use variantforge_catalog::{BaseProduct, BaseProductId, MaterialId, MaterialMigrated, ProductVariant};
use variantforge_core::UserId;

use crate::error::MigrationErrorKind;
use crate::options::MigrationFlags;
use crate::ports::{MaterialReader, MigrationEventPublisher, ProductWriter, ReferenceChecker};
use crate::result::{MigrationResult, MigrationStage};
use crate::transform::{NewIdentities, Transformer};
use crate::validation::{ValidationGate, ValidationOutcome};

/// Persisting failed; `orphaned` is set when compensation failed too.
struct PersistFailure {
    message: String,
    orphaned: Option<BaseProductId>,
}

/// Migrates one material per call. No retries: any failing stage yields a
/// failed [`MigrationResult`] and the caller decides what happens next.
///
/// Cheap to clone; every collaborator is shared.
#[derive(Clone)]
pub struct SingleMigrator {
    materials: Arc<dyn MaterialReader>,
    writer: Arc<dyn ProductWriter>,
    gate: ValidationGate,
    transformer: Transformer,
    publisher: Arc<dyn MigrationEventPublisher>,
}

impl SingleMigrator {
    pub fn new(
        materials: Arc<dyn MaterialReader>,
        writer: Arc<dyn ProductWriter>,
        references: Arc<dyn ReferenceChecker>,
        publisher: Arc<dyn MigrationEventPublisher>,
        transformer: Transformer,
    ) -> Self {
        Self {
            materials,
            writer,
            gate: ValidationGate::new(references),
            transformer,
            publisher,
        }
    }

    pub async fn migrate_one(
        &self,
        material_id: MaterialId,
        flags: MigrationFlags,
        user: UserId,
    ) -> MigrationResult {
        let fail = |kind, stage, message: String| {
            MigrationResult::failed(material_id, kind, stage, message, user, Utc::now())
        };

        // Validating
        let material = match self.materials.get_by_id(material_id).await {
            Ok(Some(material)) => material,
            Ok(None) => {
                debug!(%material_id, "material not found");
                return fail(
                    MigrationErrorKind::NotFound,
                    MigrationStage::Validating,
                    format!("material {material_id} not found"),
                );
            }
            Err(e) => {
                warn!(%material_id, error = %e, "material could not be read");
                return fail(
                    MigrationErrorKind::Validation,
                    MigrationStage::Validating,
                    format!("material could not be read: {e}"),
                );
            }
        };

        let outcome = self.gate.validate(&material, flags).await;
        if !outcome.may_proceed() {
            let issues = outcome.messages();
            debug!(%material_id, issues = ?issues, "material rejected by validation");
            return fail(
                MigrationErrorKind::Validation,
                MigrationStage::Validating,
                issues.join("; "),
            );
        }
        let forced = matches!(outcome, ValidationOutcome::PassedWithWarnings(_));
        let warnings = outcome.messages();
        if forced {
            warn!(%material_id, warnings = ?warnings, "forcing migration past failed validation");
        }
        let material = outcome.apply_defaults(&material);

        // Transforming
        let (base, variant) =
            match self
                .transformer
                .transform(&material, NewIdentities::generate(), Utc::now())
            {
                Ok(pair) => pair,
                Err(e) => {
                    error!(%material_id, error = %e, "unexpected transform failure");
                    return fail(
                        MigrationErrorKind::Transform,
                        MigrationStage::Transforming,
                        e.to_string(),
                    )
                    .with_warnings(warnings);
                }
            };

        // Persisting
        if let Err(failure) = self.persist(&base, &variant).await {
            let result = fail(
                MigrationErrorKind::Persistence,
                MigrationStage::Persisting,
                failure.message,
            )
            .with_warnings(warnings);
            return match failure.orphaned {
                Some(id) => result.with_orphaned_base_product(id),
                None => result,
            };
        }

        let now = Utc::now();
        let event = MaterialMigrated {
            material_id,
            base_product_id: base.id,
            product_variant_id: variant.id,
            migrated_by: user,
            forced,
            warnings: warnings.clone(),
            occurred_at: now,
        };
        if let Err(e) = self.publisher.publish(event) {
            warn!(%material_id, error = %e, "failed to publish material migrated event");
        }

        debug!(
            %material_id,
            base_product_id = %base.id,
            product_variant_id = %variant.id,
            "material migrated"
        );
        MigrationResult::succeeded(material_id, base.id, variant.id, warnings, user, now)
    }

    /// Base product first, then the variant. A failed variant write deletes
    /// the base product again so no variant-less product is left behind.
    async fn persist(&self, base: &BaseProduct, variant: &ProductVariant) -> Result<(), PersistFailure> {
        self.writer
            .create_base_product(base)
            .await
            .map_err(|e| PersistFailure {
                message: format!("failed to create base product: {e}"),
                orphaned: None,
            })?;

        let Err(e) = self.writer.create_variant(variant).await else {
            return Ok(());
        };

        match self.writer.delete_base_product(base.id).await {
            Ok(()) => {
                warn!(base_product_id = %base.id, error = %e, "variant write failed; base product rolled back");
                Err(PersistFailure {
                    message: format!("failed to create product variant: {e}; base product rolled back"),
                    orphaned: None,
                })
            }
            Err(cleanup) => {
                error!(
                    base_product_id = %base.id,
                    error = %e,
                    cleanup_error = %cleanup,
                    "variant write failed and base product cleanup failed; base product orphaned"
                );
                Err(PersistFailure {
                    message: format!(
                        "failed to create product variant: {e}; cleanup of base product {} failed: {cleanup}; base product left orphaned",
                        base.id
                    ),
                    orphaned: Some(base.id),
                })
            }
        }
    }
}
