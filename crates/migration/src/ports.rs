//! Collaborator interfaces consumed by the engine.
//!
//! The engine owns none of the stores it touches. Adapters (SQL, HTTP, the
//! in-memory versions in `variantforge-infra`) implement these traits.

use async_trait::async_trait;

use variantforge_catalog::{
    BaseProduct, BaseProductId, CategoryId, Material, MaterialId, MaterialMigrated,
    ProductVariant, UnitOfMeasureId,
};

use crate::error::{PublishError, StoreError};

/// Read access to the legacy material catalog.
#[async_trait]
pub trait MaterialReader: Send + Sync {
    /// Fetch one material. `Ok(None)` means it does not exist.
    async fn get_by_id(&self, id: MaterialId) -> Result<Option<Material>, StoreError>;

    /// Fetch every material, in the store's natural (stable) order.
    async fn get_all(&self) -> Result<Vec<Material>, StoreError>;
}

/// Write access to the new product catalog.
///
/// Writes are two-step: the base product first, then its variant. Stores that
/// cannot make the pair atomic must support `delete_base_product` so the
/// engine can compensate when the variant write fails.
#[async_trait]
pub trait ProductWriter: Send + Sync {
    async fn create_base_product(&self, product: &BaseProduct) -> Result<(), StoreError>;

    /// The owning base product has already been created.
    async fn create_variant(&self, variant: &ProductVariant) -> Result<(), StoreError>;

    /// Remove a base product that has no variants (compensation only).
    async fn delete_base_product(&self, id: BaseProductId) -> Result<(), StoreError>;
}

/// Existence checks for references a material points at.
#[async_trait]
pub trait ReferenceChecker: Send + Sync {
    async fn category_exists(&self, id: CategoryId) -> Result<bool, StoreError>;

    async fn unit_exists(&self, id: UnitOfMeasureId) -> Result<bool, StoreError>;
}

/// Publish-only notification sink.
///
/// Fire-and-forget from the engine's point of view: a failed publish is logged
/// and never turns a successful migration into a failure.
pub trait MigrationEventPublisher: Send + Sync {
    fn publish(&self, event: MaterialMigrated) -> Result<(), PublishError>;
}
