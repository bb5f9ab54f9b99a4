use std::sync::RwLock;

use async_trait::async_trait;

use variantforge_catalog::{Material, MaterialId};
use variantforge_migration::{MaterialReader, StoreError};

use super::poisoned;

/// Legacy material catalog held in memory.
///
/// `get_all` returns materials in insertion order.
#[derive(Debug, Default)]
pub struct InMemoryMaterialStore {
    materials: RwLock<Vec<Material>>,
    unavailable: bool,
}

impl InMemoryMaterialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_materials(materials: impl IntoIterator<Item = Material>) -> Self {
        Self {
            materials: RwLock::new(materials.into_iter().collect()),
            unavailable: false,
        }
    }

    /// Every read fails with `StoreError::Unavailable`.
    pub fn unavailable() -> Self {
        Self {
            materials: RwLock::default(),
            unavailable: true,
        }
    }

    /// Insert or replace a material, keeping its original position on replace.
    pub fn upsert(&self, material: Material) {
        if let Ok(mut materials) = self.materials.write() {
            match materials.iter_mut().find(|m| m.id == material.id) {
                Some(existing) => *existing = material,
                None => materials.push(material),
            }
        }
    }

    pub fn len(&self) -> usize {
        self.materials.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable {
            return Err(StoreError::Unavailable("legacy material store is offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl MaterialReader for InMemoryMaterialStore {
    async fn get_by_id(&self, id: MaterialId) -> Result<Option<Material>, StoreError> {
        self.check_available()?;
        let materials = self.materials.read().map_err(|_| poisoned())?;
        Ok(materials.iter().find(|m| m.id == id).cloned())
    }

    async fn get_all(&self) -> Result<Vec<Material>, StoreError> {
        self.check_available()?;
        let materials = self.materials.read().map_err(|_| poisoned())?;
        Ok(materials.clone())
    }
}
