use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use variantforge_core::{DomainError, DomainResult};

use crate::PropertyBag;
use crate::ids::{BaseProductId, ProductVariantId, UnitOfMeasureId};

/// One concrete purchasable unit under a [`BaseProduct`](crate::BaseProduct).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductVariant {
    pub id: ProductVariantId,
    pub base_product_id: BaseProductId,
    pub name: String,
    pub stock_quantity: f64,
    pub unit_id: Option<UnitOfMeasureId>,
    pub unit_value: f64,
    pub usage_notes: Option<String>,
    pub photo_urls: Vec<String>,
    pub properties: PropertyBag,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProductVariant {
    /// Check the invariants every persisted variant must satisfy.
    pub fn check_invariants(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::invariant("variant name cannot be empty"));
        }
        if !self.stock_quantity.is_finite() {
            return Err(DomainError::invariant(format!(
                "stock quantity must be a finite number (got {})",
                self.stock_quantity
            )));
        }
        if !self.unit_value.is_finite() {
            return Err(DomainError::invariant(format!(
                "unit value must be a finite number (got {})",
                self.unit_value
            )));
        }
        Ok(())
    }
}
