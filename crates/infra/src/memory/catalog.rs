use std::collections::HashSet;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use variantforge_catalog::{BaseProduct, BaseProductId, ProductVariant, ProductVariantId};
use variantforge_migration::{ProductWriter, StoreError};

use super::poisoned;

/// Called after every stored variant with the number of variants stored so far.
type VariantHook = Arc<dyn Fn(usize) + Send + Sync>;

/// Everything written to the product catalog, in write order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogExport {
    pub base_products: Vec<BaseProduct>,
    pub variants: Vec<ProductVariant>,
}

impl CatalogExport {
    pub fn variants_of(&self, base_product_id: BaseProductId) -> impl Iterator<Item = &ProductVariant> {
        self.variants
            .iter()
            .filter(move |v| v.base_product_id == base_product_id)
    }
}

#[derive(Default)]
struct Faults {
    variant_names: HashSet<String>,
    deletes: bool,
}

/// New product catalog held in memory.
///
/// Enforces the same rules a relational store would: unique ids, a variant
/// needs an existing base product, a base product with variants cannot be
/// deleted.
#[derive(Default)]
pub struct InMemoryProductCatalog {
    state: RwLock<CatalogExport>,
    faults: Faults,
    on_variant: Option<VariantHook>,
}

impl InMemoryProductCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject variants with this name (constraint violation).
    pub fn failing_variants_named(mut self, name: impl Into<String>) -> Self {
        self.faults.variant_names.insert(name.into());
        self
    }

    /// Reject every compensating delete.
    pub fn failing_deletes(mut self) -> Self {
        self.faults.deletes = true;
        self
    }

    pub fn on_variant_created(mut self, hook: impl Fn(usize) + Send + Sync + 'static) -> Self {
        self.on_variant = Some(Arc::new(hook));
        self
    }

    pub fn base_product(&self, id: BaseProductId) -> Option<BaseProduct> {
        let state = self.state.read().ok()?;
        state.base_products.iter().find(|p| p.id == id).cloned()
    }

    pub fn variant(&self, id: ProductVariantId) -> Option<ProductVariant> {
        let state = self.state.read().ok()?;
        state.variants.iter().find(|v| v.id == id).cloned()
    }

    pub fn base_product_count(&self) -> usize {
        self.state.read().map(|s| s.base_products.len()).unwrap_or(0)
    }

    pub fn variant_count(&self) -> usize {
        self.state.read().map(|s| s.variants.len()).unwrap_or(0)
    }

    /// Snapshot of the catalog contents.
    pub fn export(&self) -> CatalogExport {
        self.state.read().map(|s| s.clone()).unwrap_or_default()
    }
}

impl core::fmt::Debug for InMemoryProductCatalog {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("InMemoryProductCatalog")
            .field("base_products", &self.base_product_count())
            .field("variants", &self.variant_count())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ProductWriter for InMemoryProductCatalog {
    async fn create_base_product(&self, product: &BaseProduct) -> Result<(), StoreError> {
        let mut state = self.state.write().map_err(|_| poisoned())?;
        if state.base_products.iter().any(|p| p.id == product.id) {
            return Err(StoreError::Constraint(format!(
                "base product {} already exists",
                product.id
            )));
        }
        state.base_products.push(product.clone());
        debug!(base_product_id = %product.id, "base product stored");
        Ok(())
    }

    async fn create_variant(&self, variant: &ProductVariant) -> Result<(), StoreError> {
        if self.faults.variant_names.contains(&variant.name) {
            return Err(StoreError::Constraint(format!(
                "variant name {:?} rejected",
                variant.name
            )));
        }

        let stored = {
            let mut state = self.state.write().map_err(|_| poisoned())?;
            if !state.base_products.iter().any(|p| p.id == variant.base_product_id) {
                return Err(StoreError::Constraint(format!(
                    "base product {} does not exist",
                    variant.base_product_id
                )));
            }
            if state.variants.iter().any(|v| v.id == variant.id) {
                return Err(StoreError::Constraint(format!(
                    "variant {} already exists",
                    variant.id
                )));
            }
            state.variants.push(variant.clone());
            state.variants.len()
        };
        debug!(product_variant_id = %variant.id, "variant stored");

        if let Some(hook) = &self.on_variant {
            hook(stored);
        }
        Ok(())
    }

    async fn delete_base_product(&self, id: BaseProductId) -> Result<(), StoreError> {
        if self.faults.deletes {
            return Err(StoreError::Unavailable("product catalog rejected delete".to_string()));
        }
        let mut state = self.state.write().map_err(|_| poisoned())?;
        if state.variants.iter().any(|v| v.base_product_id == id) {
            return Err(StoreError::Constraint(format!(
                "base product {id} still has variants"
            )));
        }
        let before = state.base_products.len();
        state.base_products.retain(|p| p.id != id);
        if state.base_products.len() == before {
            return Err(StoreError::NotFound(format!("base product {id}")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use variantforge_catalog::PropertyBag;

    fn base(name: &str) -> BaseProduct {
        BaseProduct::new(BaseProductId::new(), name, None, None, Utc::now()).unwrap()
    }

    fn variant_of(base: &BaseProduct) -> ProductVariant {
        let now = Utc::now();
        ProductVariant {
            id: ProductVariantId::new(),
            base_product_id: base.id,
            name: base.name.clone(),
            stock_quantity: 1.0,
            unit_id: None,
            unit_value: 0.0,
            usage_notes: None,
            photo_urls: vec![],
            properties: PropertyBag::new(),
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn variant_requires_existing_base_product() {
        let catalog = InMemoryProductCatalog::new();
        let orphan = variant_of(&base("Paint"));

        let err = catalog.create_variant(&orphan).await.unwrap_err();

        assert!(matches!(err, StoreError::Constraint(_)));
        assert_eq!(catalog.variant_count(), 0);
    }

    #[tokio::test]
    async fn duplicate_base_product_is_rejected() {
        let catalog = InMemoryProductCatalog::new();
        let product = base("Paint");
        catalog.create_base_product(&product).await.unwrap();

        assert!(matches!(
            catalog.create_base_product(&product).await,
            Err(StoreError::Constraint(_))
        ));
    }

    #[tokio::test]
    async fn base_product_with_variants_cannot_be_deleted() {
        let catalog = InMemoryProductCatalog::new();
        let product = base("Paint");
        catalog.create_base_product(&product).await.unwrap();
        catalog.create_variant(&variant_of(&product)).await.unwrap();

        assert!(catalog.delete_base_product(product.id).await.is_err());
        assert!(catalog.base_product(product.id).is_some());
    }

    #[tokio::test]
    async fn delete_removes_childless_base_product() {
        let catalog = InMemoryProductCatalog::new();
        let product = base("Paint");
        catalog.create_base_product(&product).await.unwrap();

        catalog.delete_base_product(product.id).await.unwrap();

        assert_eq!(catalog.base_product_count(), 0);
        assert!(matches!(
            catalog.delete_base_product(product.id).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn hook_sees_running_variant_count() {
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = seen.clone();
        let catalog = InMemoryProductCatalog::new().on_variant_created(move |n| sink.lock().unwrap().push(n));

        for name in ["A", "B"] {
            let product = base(name);
            catalog.create_base_product(&product).await.unwrap();
            catalog.create_variant(&variant_of(&product)).await.unwrap();
        }

        assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
        let export = catalog.export();
        assert_eq!(export.variants_of(export.base_products[0].id).count(), 1);
    }
}
