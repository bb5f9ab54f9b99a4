//! Material → (BaseProduct, ProductVariant) mapping.
//!
//! Deterministic: the same material, identities and timestamp always yield
//! the same pair. Identities and time are inputs so callers (and tests) stay
//! in control of them.

use chrono::{DateTime, Utc};
use thiserror::Error;

use variantforge_catalog::{
    BaseProduct, BaseProductId, Material, MaterialId, ProductVariant, ProductVariantId,
};
use variantforge_core::DomainError;

/// Identities for the entities created from one material.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewIdentities {
    pub base_product_id: BaseProductId,
    pub product_variant_id: ProductVariantId,
}

impl NewIdentities {
    pub fn generate() -> Self {
        Self {
            base_product_id: BaseProductId::new(),
            product_variant_id: ProductVariantId::new(),
        }
    }
}

/// Mapping hit an internal invariant violation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct TransformError(pub DomainError);

impl From<DomainError> for TransformError {
    fn from(value: DomainError) -> Self {
        Self(value)
    }
}

/// Maps one legacy material into the two-tier product model.
#[derive(Debug, Clone, Default)]
pub struct Transformer {
    photo_base_url: Option<String>,
}

impl Transformer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Join relative photo references onto `base_url`.
    pub fn with_photo_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.photo_base_url = Some(base_url.into());
        self
    }

    pub fn transform(
        &self,
        material: &Material,
        ids: NewIdentities,
        at: DateTime<Utc>,
    ) -> Result<(BaseProduct, ProductVariant), TransformError> {
        // Single variant per material: both tiers share the material's name.
        let name = material
            .trimmed_name()
            .map(str::to_string)
            .unwrap_or_else(|| fallback_name(material.id));

        let base = BaseProduct::new(
            ids.base_product_id,
            name.clone(),
            non_blank(material.description.as_deref()),
            material.category_id,
            at,
        )?;

        let variant = ProductVariant {
            id: ids.product_variant_id,
            base_product_id: base.id,
            name,
            stock_quantity: material.quantity,
            unit_id: material.unit_id,
            unit_value: material.unit_value,
            usage_notes: non_blank(material.usage_notes.as_deref()),
            photo_urls: material
                .photos
                .iter()
                .filter_map(|reference| self.photo_url(reference))
                .collect(),
            properties: material.properties.clone(),
            created_at: at,
            updated_at: at,
        };
        variant.check_invariants()?;

        Ok((base, variant))
    }

    /// Absolute URLs pass through, relative references are joined onto the
    /// base URL when one is configured, blanks are dropped.
    fn photo_url(&self, reference: &str) -> Option<String> {
        let reference = reference.trim();
        if reference.is_empty() {
            return None;
        }
        if is_absolute(reference) {
            return Some(reference.to_string());
        }
        match &self.photo_base_url {
            Some(base) => Some(format!(
                "{}/{}",
                base.trim_end_matches('/'),
                reference.trim_start_matches('/')
            )),
            None => Some(reference.to_string()),
        }
    }
}

/// Name used when a forced migration carries a material without one.
pub fn fallback_name(id: MaterialId) -> String {
    format!("Unnamed material {id}")
}

fn is_absolute(reference: &str) -> bool {
    ["http://", "https://", "data:"]
        .iter()
        .any(|scheme| reference.starts_with(scheme))
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
