//! Publishes migration facts onto an [`EventBus`].

use variantforge_catalog::{MaterialMigrated, MigrationEnvelope};
use variantforge_events::{EventBus, EventEnvelope};
use variantforge_migration::{MigrationEventPublisher, PublishError};

/// Subject type stamped on every envelope this publisher emits.
pub const MATERIAL_SUBJECT: &str = "catalog.material";

/// Wraps each [`MaterialMigrated`] in an [`EventEnvelope`] about the source
/// material, with the migrating user as actor.
#[derive(Debug, Clone)]
pub struct BusEventPublisher<B> {
    bus: B,
}

impl<B> BusEventPublisher<B>
where
    B: EventBus<MigrationEnvelope>,
{
    pub fn new(bus: B) -> Self {
        Self { bus }
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }
}

impl<B> MigrationEventPublisher for BusEventPublisher<B>
where
    B: EventBus<MigrationEnvelope>,
    B::Error: core::fmt::Display,
{
    fn publish(&self, event: MaterialMigrated) -> Result<(), PublishError> {
        let envelope = EventEnvelope::wrap(
            event.material_id.into(),
            MATERIAL_SUBJECT,
            event.migrated_by,
            event,
        );
        self.bus
            .publish(envelope)
            .map_err(|e| PublishError(e.to_string()))
    }
}
