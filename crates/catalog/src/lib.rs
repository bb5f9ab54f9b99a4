//! Catalog domain module.
//!
//! Holds the legacy `Material` record and the two-tier `BaseProduct` /
//! `ProductVariant` model that replaces it, plus the `MaterialMigrated` fact
//! emitted when one becomes the other. Pure data + rules; no IO.

pub mod events;
pub mod ids;
pub mod material;
pub mod product;
pub mod variant;

pub use events::{MaterialMigrated, MigrationEnvelope};
pub use ids::{BaseProductId, CategoryId, MaterialId, ProductVariantId, UnitOfMeasureId};
pub use material::Material;
pub use product::BaseProduct;
pub use variant::ProductVariant;

/// Free-form, dynamic attributes carried over verbatim from legacy records.
///
/// A `BTreeMap` keeps key order stable so serialized output is deterministic.
pub type PropertyBag = std::collections::BTreeMap<String, serde_json::Value>;
