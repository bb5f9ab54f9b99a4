//! Migration error model.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use variantforge_catalog::MaterialId;

/// Classification of a per-item failure, stored on every failed
/// [`MigrationResult`](crate::MigrationResult).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrationErrorKind {
    /// Required-field or referential checks failed (or the material was unreadable).
    Validation,
    /// Mapping hit an internal invariant violation.
    Transform,
    /// The product store rejected or failed a write.
    Persistence,
    /// The material does not exist.
    NotFound,
    /// The worker migrating the item died unexpectedly.
    Internal,
}

impl core::fmt::Display for MigrationErrorKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = match self {
            MigrationErrorKind::Validation => "validation",
            MigrationErrorKind::Transform => "transform",
            MigrationErrorKind::Persistence => "persistence",
            MigrationErrorKind::NotFound => "not_found",
            MigrationErrorKind::Internal => "internal",
        };
        f.write_str(s)
    }
}

/// Error returned by the migration entry points.
///
/// Per-item variants are only produced by the single-item path; the bulk path
/// records them inside the result instead. `Resolution`, `InvalidOptions` and
/// `Aggregation` are engine-level faults and can come from either path.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MigrationError {
    #[error("material {material_id} failed validation: {message}")]
    Validation { material_id: MaterialId, message: String },

    #[error("material {material_id} could not be transformed: {message}")]
    Transform { material_id: MaterialId, message: String },

    #[error("material {material_id} could not be persisted: {message}")]
    Persistence { material_id: MaterialId, message: String },

    #[error("material {material_id} not found")]
    NotFound { material_id: MaterialId },

    #[error("migration of material {material_id} failed unexpectedly: {message}")]
    Internal { material_id: MaterialId, message: String },

    /// Enumerating the material set failed.
    #[error("failed to resolve materials to migrate: {0}")]
    Resolution(StoreError),

    #[error("invalid migration options: {0}")]
    InvalidOptions(String),

    /// The result aggregator task died before producing a report.
    #[error("result aggregation failed: {0}")]
    Aggregation(String),
}

impl MigrationError {
    /// Per-item failure kind, `None` for engine-level faults.
    pub fn kind(&self) -> Option<MigrationErrorKind> {
        match self {
            MigrationError::Validation { .. } => Some(MigrationErrorKind::Validation),
            MigrationError::Transform { .. } => Some(MigrationErrorKind::Transform),
            MigrationError::Persistence { .. } => Some(MigrationErrorKind::Persistence),
            MigrationError::NotFound { .. } => Some(MigrationErrorKind::NotFound),
            MigrationError::Internal { .. } => Some(MigrationErrorKind::Internal),
            MigrationError::Resolution(_)
            | MigrationError::InvalidOptions(_)
            | MigrationError::Aggregation(_) => None,
        }
    }

    pub(crate) fn for_item(kind: MigrationErrorKind, material_id: MaterialId, message: String) -> Self {
        match kind {
            MigrationErrorKind::Validation => MigrationError::Validation { material_id, message },
            MigrationErrorKind::Transform => MigrationError::Transform { material_id, message },
            MigrationErrorKind::Persistence => MigrationError::Persistence { material_id, message },
            MigrationErrorKind::NotFound => MigrationError::NotFound { material_id },
            MigrationErrorKind::Internal => MigrationError::Internal { material_id, message },
        }
    }
}

/// Failure reported by a store collaborator (material reader, product writer,
/// reference checker).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("constraint violated: {0}")]
    Constraint(String),

    #[error("record not found: {0}")]
    NotFound(String),

    #[error("storage error: {0}")]
    Storage(String),
}

/// Event publication failed. Never fatal for a migration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("event publication failed: {0}")]
pub struct PublishError(pub String);
