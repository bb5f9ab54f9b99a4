//! In-crate fakes for the collaborator ports.

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;

use variantforge_catalog::{
    BaseProduct, BaseProductId, CategoryId, Material, MaterialId, MaterialMigrated,
    ProductVariant, UnitOfMeasureId,
};

use crate::error::{PublishError, StoreError};
use crate::ports::{MaterialReader, MigrationEventPublisher, ProductWriter, ReferenceChecker};

#[derive(Debug, Default)]
pub struct FakeMaterials {
    materials: Mutex<Vec<Material>>,
    fail_get_all: bool,
    panic_on: HashSet<MaterialId>,
}

impl FakeMaterials {
    pub fn with(materials: Vec<Material>) -> Self {
        Self {
            materials: Mutex::new(materials),
            fail_get_all: false,
            panic_on: HashSet::new(),
        }
    }

    /// `get_by_id` panics for this material.
    pub fn panicking_on(mut self, id: MaterialId) -> Self {
        self.panic_on.insert(id);
        self
    }

    pub fn failing_get_all(mut self) -> Self {
        self.fail_get_all = true;
        self
    }
}

#[async_trait]
impl MaterialReader for FakeMaterials {
    async fn get_by_id(&self, id: MaterialId) -> Result<Option<Material>, StoreError> {
        if self.panic_on.contains(&id) {
            panic!("legacy row {id} is corrupt");
        }
        let materials = self.materials.lock().unwrap();
        Ok(materials.iter().find(|m| m.id == id).cloned())
    }

    async fn get_all(&self) -> Result<Vec<Material>, StoreError> {
        if self.fail_get_all {
            return Err(StoreError::Unavailable("legacy catalog offline".into()));
        }
        Ok(self.materials.lock().unwrap().clone())
    }
}

#[derive(Debug, Default)]
pub struct FakeWriter {
    pub base_products: Mutex<Vec<BaseProduct>>,
    pub variants: Mutex<Vec<ProductVariant>>,
    pub deleted: Mutex<Vec<BaseProductId>>,
    fail_variant_names: HashSet<String>,
    fail_delete: bool,
}

impl FakeWriter {
    pub fn failing_variant(mut self, name: &str) -> Self {
        self.fail_variant_names.insert(name.to_string());
        self
    }

    pub fn failing_delete(mut self) -> Self {
        self.fail_delete = true;
        self
    }

    pub fn base_count(&self) -> usize {
        self.base_products.lock().unwrap().len()
    }

    pub fn variant_count(&self) -> usize {
        self.variants.lock().unwrap().len()
    }
}

#[async_trait]
impl ProductWriter for FakeWriter {
    async fn create_base_product(&self, product: &BaseProduct) -> Result<(), StoreError> {
        self.base_products.lock().unwrap().push(product.clone());
        Ok(())
    }

    async fn create_variant(&self, variant: &ProductVariant) -> Result<(), StoreError> {
        if self.fail_variant_names.contains(&variant.name) {
            return Err(StoreError::Constraint(format!("variant {} rejected", variant.name)));
        }
        self.variants.lock().unwrap().push(variant.clone());
        Ok(())
    }

    async fn delete_base_product(&self, id: BaseProductId) -> Result<(), StoreError> {
        if self.fail_delete {
            return Err(StoreError::Unavailable("writer lost connection".into()));
        }
        self.base_products.lock().unwrap().retain(|p| p.id != id);
        self.deleted.lock().unwrap().push(id);
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct FakeReferences {
    categories: HashSet<CategoryId>,
    units: HashSet<UnitOfMeasureId>,
    fail_lookups: bool,
}

impl FakeReferences {
    /// One known category and one known unit.
    pub fn seeded() -> Self {
        let mut refs = Self::default();
        refs.categories.insert(CategoryId::new());
        refs.units.insert(UnitOfMeasureId::new());
        refs
    }

    pub fn failing_lookups(mut self) -> Self {
        self.fail_lookups = true;
        self
    }

    pub fn category(&self) -> CategoryId {
        *self.categories.iter().next().expect("seeded category")
    }

    pub fn unit(&self) -> UnitOfMeasureId {
        *self.units.iter().next().expect("seeded unit")
    }
}

#[async_trait]
impl ReferenceChecker for FakeReferences {
    async fn category_exists(&self, id: CategoryId) -> Result<bool, StoreError> {
        if self.fail_lookups {
            return Err(StoreError::Unavailable("reference service down".into()));
        }
        Ok(self.categories.contains(&id))
    }

    async fn unit_exists(&self, id: UnitOfMeasureId) -> Result<bool, StoreError> {
        if self.fail_lookups {
            return Err(StoreError::Unavailable("reference service down".into()));
        }
        Ok(self.units.contains(&id))
    }
}

#[derive(Debug, Default)]
pub struct RecordingPublisher {
    pub events: Mutex<Vec<MaterialMigrated>>,
    fail: bool,
}

impl RecordingPublisher {
    pub fn failing() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn count(&self) -> usize {
        self.events.lock().unwrap().len()
    }
}

impl MigrationEventPublisher for RecordingPublisher {
    fn publish(&self, event: MaterialMigrated) -> Result<(), PublishError> {
        if self.fail {
            return Err(PublishError("bus closed".into()));
        }
        self.events.lock().unwrap().push(event);
        Ok(())
    }
}
