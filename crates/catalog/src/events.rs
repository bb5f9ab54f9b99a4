//! Catalog domain events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use variantforge_core::UserId;
use variantforge_events::{Event, EventEnvelope};

use crate::ids::{BaseProductId, MaterialId, ProductVariantId};

/// Event: a legacy material now lives on as a base product + variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialMigrated {
    pub material_id: MaterialId,
    pub base_product_id: BaseProductId,
    pub product_variant_id: ProductVariantId,
    pub migrated_by: UserId,
    /// Validation was bypassed via force migration.
    pub forced: bool,
    pub warnings: Vec<String>,
    pub occurred_at: DateTime<Utc>,
}

/// What travels on the bus: the event plus routing/audit metadata.
pub type MigrationEnvelope = EventEnvelope<MaterialMigrated>;

impl MaterialMigrated {
    pub const EVENT_TYPE: &'static str = "catalog.material.migrated";
}

impl Event for MaterialMigrated {
    fn event_type(&self) -> &'static str {
        Self::EVENT_TYPE
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }
}
