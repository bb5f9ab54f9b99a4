//! JSON snapshot of a legacy catalog.
//!
//! ```json
//! {
//!   "categories": [{ "id": "…", "name": "Paints" }],
//!   "units_of_measure": [{ "id": "…", "name": "Litre", "symbol": "L" }],
//!   "materials": [{ "id": "…", "name": "Paint 5L", "category_id": "…", … }]
//! }
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use variantforge_catalog::{CategoryId, Material, UnitOfMeasureId};

use crate::memory::{InMemoryMaterialStore, InMemoryReferenceDirectory};

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to read snapshot {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed snapshot: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRecord {
    pub id: CategoryId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitRecord {
    pub id: UnitOfMeasureId,
    pub name: String,
    #[serde(default)]
    pub symbol: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    #[serde(default)]
    pub categories: Vec<CategoryRecord>,
    #[serde(default)]
    pub units_of_measure: Vec<UnitRecord>,
    #[serde(default)]
    pub materials: Vec<Material>,
}

impl CatalogSnapshot {
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| SnapshotError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let snapshot = Self::from_json(&json)?;
        info!(
            path = %path.display(),
            materials = snapshot.materials.len(),
            categories = snapshot.categories.len(),
            units = snapshot.units_of_measure.len(),
            "catalog snapshot loaded"
        );
        Ok(snapshot)
    }

    /// Split into the adapters the migration engine reads from.
    ///
    /// A material id listed twice keeps its first record.
    pub fn into_stores(self) -> (InMemoryMaterialStore, InMemoryReferenceDirectory) {
        let references = InMemoryReferenceDirectory::new();
        for category in &self.categories {
            references.add_category(category.id);
        }
        for unit in &self.units_of_measure {
            references.add_unit(unit.id);
        }

        let mut seen = HashSet::new();
        let materials: Vec<Material> = self
            .materials
            .into_iter()
            .filter(|m| {
                let first = seen.insert(m.id);
                if !first {
                    warn!(material_id = %m.id, "duplicate material in snapshot ignored");
                }
                first
            })
            .collect();

        (InMemoryMaterialStore::with_materials(materials), references)
    }
}
