use std::collections::HashSet;
use std::sync::RwLock;

use async_trait::async_trait;

use variantforge_catalog::{CategoryId, UnitOfMeasureId};
use variantforge_migration::{ReferenceChecker, StoreError};

use super::poisoned;

/// Known categories and units of measure.
#[derive(Debug, Default)]
pub struct InMemoryReferenceDirectory {
    categories: RwLock<HashSet<CategoryId>>,
    units: RwLock<HashSet<UnitOfMeasureId>>,
}

impl InMemoryReferenceDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_category(&self, id: CategoryId) {
        if let Ok(mut categories) = self.categories.write() {
            categories.insert(id);
        }
    }

    pub fn add_unit(&self, id: UnitOfMeasureId) {
        if let Ok(mut units) = self.units.write() {
            units.insert(id);
        }
    }

    pub fn with_category(self, id: CategoryId) -> Self {
        self.add_category(id);
        self
    }

    pub fn with_unit(self, id: UnitOfMeasureId) -> Self {
        self.add_unit(id);
        self
    }
}

#[async_trait]
impl ReferenceChecker for InMemoryReferenceDirectory {
    async fn category_exists(&self, id: CategoryId) -> Result<bool, StoreError> {
        Ok(self.categories.read().map_err(|_| poisoned())?.contains(&id))
    }

    async fn unit_exists(&self, id: UnitOfMeasureId) -> Result<bool, StoreError> {
        Ok(self.units.read().map_err(|_| poisoned())?.contains(&id))
    }
}
