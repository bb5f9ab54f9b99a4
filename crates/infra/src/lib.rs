//! Infrastructure layer: adapters behind the migration engine's ports.
//!
//! - [`memory`]: in-memory legacy catalog, product catalog and reference
//!   directory (tests, dev, snapshot runs)
//! - [`publisher`]: `MaterialMigrated` → event bus
//! - [`snapshot`]: JSON snapshot of a legacy catalog

pub mod memory;
pub mod publisher;
pub mod snapshot;


pub use memory::{CatalogExport, InMemoryMaterialStore, InMemoryProductCatalog, InMemoryReferenceDirectory};
pub use publisher::BusEventPublisher;
pub use snapshot::{CatalogSnapshot, CategoryRecord, SnapshotError, UnitRecord};
