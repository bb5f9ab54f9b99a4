//! In-memory adapters for tests/dev.
//!
//! Backed by `std::sync` locks; a poisoned lock surfaces as
//! `StoreError::Storage` rather than a panic.

mod catalog;
mod materials;
mod references;

pub use catalog::{CatalogExport, InMemoryProductCatalog};
pub use materials::InMemoryMaterialStore;
pub use references::InMemoryReferenceDirectory;

use variantforge_migration::StoreError;

fn poisoned() -> StoreError {
    StoreError::Storage("lock poisoned".to_string())
}
