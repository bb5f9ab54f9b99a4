//! Legacy material record.
//!
//! Materials are owned by the legacy catalog store. This crate only ever reads
//! them; nothing here mutates a stored material.

use serde::{Deserialize, Serialize};

use crate::PropertyBag;
use crate::ids::{CategoryId, MaterialId, UnitOfMeasureId};

/// Flat legacy catalog entry: one purchasable item with quantity and unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub id: MaterialId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    #[serde(default)]
    pub unit_id: Option<UnitOfMeasureId>,
    /// Amount of `unit_id` one item holds (5.0 for a 5 litre can).
    #[serde(default)]
    pub unit_value: f64,
    /// Units in stock.
    #[serde(default)]
    pub quantity: f64,
    #[serde(default)]
    pub usage_notes: Option<String>,
    /// Photo references as stored by the legacy system (file keys or URLs).
    #[serde(default)]
    pub photos: Vec<String>,
    #[serde(default)]
    pub properties: PropertyBag,
}

impl Material {
    /// Minimal material with a name and nothing else; fill the rest with the
    /// `with_*` helpers.
    pub fn new(id: MaterialId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            description: None,
            category_id: None,
            unit_id: None,
            unit_value: 0.0,
            quantity: 0.0,
            usage_notes: None,
            photos: Vec::new(),
            properties: PropertyBag::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_category(mut self, category_id: CategoryId) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub fn with_unit(mut self, unit_id: UnitOfMeasureId, unit_value: f64) -> Self {
        self.unit_id = Some(unit_id);
        self.unit_value = unit_value;
        self
    }

    pub fn with_quantity(mut self, quantity: f64) -> Self {
        self.quantity = quantity;
        self
    }

    pub fn with_usage_notes(mut self, notes: impl Into<String>) -> Self {
        self.usage_notes = Some(notes.into());
        self
    }

    pub fn with_photo(mut self, reference: impl Into<String>) -> Self {
        self.photos.push(reference.into());
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.properties.insert(key.into(), value);
        self
    }

    /// Name with surrounding whitespace removed; `None` when nothing is left.
    pub fn trimmed_name(&self) -> Option<&str> {
        let name = self.name.trim();
        (!name.is_empty()).then_some(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_sparse_legacy_record() {
        let id = MaterialId::new();
        let json = serde_json::json!({ "id": id, "name": "Primer" });

        let material: Material = serde_json::from_value(json).unwrap();

        assert_eq!(material, Material::new(id, "Primer"));
    }

    #[test]
    fn trimmed_name_ignores_whitespace_only_names() {
        let id = MaterialId::new();
        assert_eq!(Material::new(id, "  Paint-5L ").trimmed_name(), Some("Paint-5L"));
        assert_eq!(Material::new(id, "   ").trimmed_name(), None);
    }
}
