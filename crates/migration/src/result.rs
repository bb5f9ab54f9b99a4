//! Per-item and aggregate migration reports.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use variantforge_catalog::{BaseProductId, MaterialId, ProductVariantId};
use variantforge_core::UserId;

use crate::error::{MigrationError, MigrationErrorKind};

/// Lifecycle of one item migration.
///
/// `Pending → Validating → Transforming → Persisting → {Succeeded | Failed}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrationStage {
    Pending,
    Validating,
    Transforming,
    Persisting,
    Succeeded,
    Failed,
}

/// Outcome of migrating one material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationResult {
    pub material_id: MaterialId,
    /// Set on success. On a persistence failure it is only set when the base
    /// product could not be cleaned up and is left orphaned.
    pub base_product_id: Option<BaseProductId>,
    pub product_variant_id: Option<ProductVariantId>,
    pub success: bool,
    /// Failure reason, or the non-fatal warnings of a forced migration.
    pub error_message: Option<String>,
    pub error_kind: Option<MigrationErrorKind>,
    /// Stage that failed; `None` on success and for `Internal` failures,
    /// where the worker died at an unknown point.
    pub failed_stage: Option<MigrationStage>,
    pub warnings: Vec<String>,
    pub migrated_by: UserId,
    pub timestamp: DateTime<Utc>,
}

impl MigrationResult {
    pub fn succeeded(
        material_id: MaterialId,
        base_product_id: BaseProductId,
        product_variant_id: ProductVariantId,
        warnings: Vec<String>,
        migrated_by: UserId,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let error_message =
            (!warnings.is_empty()).then(|| format!("migrated with warnings: {}", warnings.join("; ")));

        Self {
            material_id,
            base_product_id: Some(base_product_id),
            product_variant_id: Some(product_variant_id),
            success: true,
            error_message,
            error_kind: None,
            failed_stage: None,
            warnings,
            migrated_by,
            timestamp,
        }
    }

    pub fn failed(
        material_id: MaterialId,
        kind: MigrationErrorKind,
        stage: MigrationStage,
        message: impl Into<String>,
        migrated_by: UserId,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            material_id,
            base_product_id: None,
            product_variant_id: None,
            success: false,
            error_message: Some(message.into()),
            error_kind: Some(kind),
            failed_stage: Some(stage),
            warnings: Vec::new(),
            migrated_by,
            timestamp,
        }
    }

    /// The worker migrating the item died before producing a result.
    pub fn internal(
        material_id: MaterialId,
        message: impl Into<String>,
        migrated_by: UserId,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            failed_stage: None,
            ..Self::failed(
                material_id,
                MigrationErrorKind::Internal,
                MigrationStage::Failed,
                message,
                migrated_by,
                timestamp,
            )
        }
    }

    /// Attach the id of a base product that was written but could not be
    /// removed after the variant write failed.
    pub fn with_orphaned_base_product(mut self, id: BaseProductId) -> Self {
        self.base_product_id = Some(id);
        self
    }

    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings = warnings;
        self
    }

    pub fn stage(&self) -> MigrationStage {
        if self.success {
            MigrationStage::Succeeded
        } else {
            MigrationStage::Failed
        }
    }

    /// The failure as an error, `None` for a successful result.
    pub fn to_error(&self) -> Option<MigrationError> {
        if self.success {
            return None;
        }
        let kind = self.error_kind.unwrap_or(MigrationErrorKind::Internal);
        let message = self.error_message.clone().unwrap_or_default();
        Some(MigrationError::for_item(kind, self.material_id, message))
    }
}

/// Why a bulk run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BulkCompletion {
    /// Every resolved material was attempted.
    Completed,
    /// `continue_on_error` was off and this material failed.
    Aborted { material_id: MaterialId },
    /// Cancelled from outside; in-flight items were allowed to finish.
    Cancelled,
}

/// Summary statistics over one bulk run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MigrationSummary {
    /// `successful / total`, 0.0 for an empty run.
    pub success_rate: f64,
    /// Successful items that carried force-migration warnings.
    pub migrated_with_warnings: usize,
    pub failures_by_kind: BTreeMap<MigrationErrorKind, usize>,
    pub batches_processed: usize,
    pub elapsed_ms: u64,
}

/// Aggregate outcome of a bulk run.
///
/// `results` is in submission order, regardless of which worker finished first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkMigrationResult {
    pub total_processed: usize,
    pub successful_migrations: usize,
    pub failed_migrations: usize,
    pub results: Vec<MigrationResult>,
    pub completion: BulkCompletion,
    pub summary: MigrationSummary,
    pub requested_by: UserId,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

impl BulkMigrationResult {
    pub fn failures(&self) -> impl Iterator<Item = &MigrationResult> {
        self.results.iter().filter(|r| !r.success)
    }

    pub fn is_complete(&self) -> bool {
        self.completion == BulkCompletion::Completed
    }
}
