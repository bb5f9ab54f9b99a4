//! Legacy material → base product / variant migration engine.
//!
//! ```text
//! MigrationService
//!   ├─ migrate_material_to_product_variant ──────────────┐
//!   └─ bulk_migrate_materials_to_product_variants         │
//!        └─ BatchOrchestrator (batches, worker pool)      │
//!             └─ SingleMigrator ◄────────────────────────┘
//!                  ├─ ValidationGate   (skip / force overrides)
//!                  ├─ Transformer      (Material → BaseProduct + ProductVariant)
//!                  ├─ ProductWriter    (persist, compensate on failure)
//!                  └─ MigrationEventPublisher (fire-and-forget)
//!             └─ ResultAggregator (single-owner task, fed by a channel)
//! ```
//!
//! All IO goes through the traits in [`ports`]; this crate never touches a
//! database or a broker directly.

pub mod aggregator;
pub mod bulk;
pub mod config;
pub mod error;
pub mod options;
pub mod ports;
pub mod result;
pub mod service;
pub mod single;
pub mod transform;
pub mod validation;

#[cfg(test)]
pub(crate) mod testing;

pub use aggregator::{AggregatorHandle, ResultAggregator, ResultRecorder};
pub use bulk::BatchOrchestrator;
pub use config::MigrationConfig;
pub use error::{MigrationError, MigrationErrorKind, PublishError, StoreError};
pub use options::{BulkMigrationOptions, MigrationFlags};
pub use ports::{MaterialReader, MigrationEventPublisher, ProductWriter, ReferenceChecker};
pub use result::{
    BulkCompletion, BulkMigrationResult, MigrationResult, MigrationStage, MigrationSummary,
};
pub use service::MigrationService;
pub use single::SingleMigrator;
pub use transform::{NewIdentities, TransformError, Transformer};
pub use validation::{Reference, ValidationGate, ValidationIssue, ValidationOutcome};

pub use tokio_util::sync::CancellationToken;
