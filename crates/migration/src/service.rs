//! Public entry points of the migration engine.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

use variantforge_catalog::MaterialId;
use variantforge_core::UserId;

use crate::bulk::BatchOrchestrator;
use crate::config::MigrationConfig;
use crate::error::MigrationError;
use crate::options::{BulkMigrationOptions, MigrationFlags};
use crate::ports::{MaterialReader, MigrationEventPublisher, ProductWriter, ReferenceChecker};
use crate::result::{BulkMigrationResult, MigrationResult};
use crate::single::SingleMigrator;
use crate::transform::Transformer;

/// Migration engine facade, wired once with its collaborators.
///
/// Cheap to clone; clones share the same collaborators.
#[derive(Clone)]
pub struct MigrationService {
    config: MigrationConfig,
    migrator: SingleMigrator,
    orchestrator: BatchOrchestrator,
}

impl MigrationService {
    pub fn new(
        materials: Arc<dyn MaterialReader>,
        writer: Arc<dyn ProductWriter>,
        references: Arc<dyn ReferenceChecker>,
        publisher: Arc<dyn MigrationEventPublisher>,
        config: MigrationConfig,
    ) -> Self {
        let transformer = match &config.photo_base_url {
            Some(base) => Transformer::new().with_photo_base_url(base.clone()),
            None => Transformer::new(),
        };
        let migrator = SingleMigrator::new(materials.clone(), writer, references, publisher, transformer);
        let orchestrator = BatchOrchestrator::new(materials, migrator.clone());
        Self {
            config,
            migrator,
            orchestrator,
        }
    }

    pub fn config(&self) -> &MigrationConfig {
        &self.config
    }

    /// Migrate one material.
    ///
    /// Returns the succeeded result (possibly carrying warnings when forced),
    /// or the failure as a typed error.
    #[instrument(skip_all, fields(%material_id, %user_id))]
    pub async fn migrate_material_to_product_variant(
        &self,
        material_id: MaterialId,
        user_id: UserId,
        flags: MigrationFlags,
    ) -> Result<MigrationResult, MigrationError> {
        let result = self.migrator.migrate_one(material_id, flags, user_id).await;
        match result.to_error() {
            Some(error) => Err(error),
            None => {
                info!(
                    base_product_id = ?result.base_product_id,
                    product_variant_id = ?result.product_variant_id,
                    warnings = result.warnings.len(),
                    "material migrated"
                );
                Ok(result)
            }
        }
    }

    /// Migrate many materials in batches. See [`BatchOrchestrator::migrate_bulk`].
    pub async fn bulk_migrate_materials_to_product_variants(
        &self,
        user_id: UserId,
        options: &BulkMigrationOptions,
    ) -> Result<BulkMigrationResult, MigrationError> {
        self.bulk_migrate_materials_to_product_variants_cancellable(
            user_id,
            options,
            CancellationToken::new(),
        )
        .await
    }

    /// Like [`Self::bulk_migrate_materials_to_product_variants`], stopping
    /// before the next item once `cancel` fires.
    pub async fn bulk_migrate_materials_to_product_variants_cancellable(
        &self,
        user_id: UserId,
        options: &BulkMigrationOptions,
        cancel: CancellationToken,
    ) -> Result<BulkMigrationResult, MigrationError> {
        self.orchestrator.migrate_bulk(options, user_id, cancel).await
    }
}
