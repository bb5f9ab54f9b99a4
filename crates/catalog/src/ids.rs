//! Catalog identifiers.

use variantforge_core::uuid_newtype;

uuid_newtype!(
    /// Identifier of a legacy material record.
    MaterialId,
    "MaterialId"
);

uuid_newtype!(
    /// Identifier of a base product.
    BaseProductId,
    "BaseProductId"
);

uuid_newtype!(
    /// Identifier of a product variant.
    ProductVariantId,
    "ProductVariantId"
);

uuid_newtype!(
    /// Identifier of a catalog category.
    CategoryId,
    "CategoryId"
);

uuid_newtype!(
    /// Identifier of a unit of measure (litre, kilogram, piece, ...).
    UnitOfMeasureId,
    "UnitOfMeasureId"
);

impl From<MaterialId> for variantforge_core::EntityId {
    fn from(value: MaterialId) -> Self {
        variantforge_core::EntityId::from_uuid(value.0)
    }
}

impl From<BaseProductId> for variantforge_core::EntityId {
    fn from(value: BaseProductId) -> Self {
        variantforge_core::EntityId::from_uuid(value.0)
    }
}
