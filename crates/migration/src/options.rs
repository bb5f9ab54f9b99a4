//! Request options for single and bulk migrations.

use serde::{Deserialize, Serialize};

use variantforge_catalog::MaterialId;

use crate::config::{DEFAULT_BATCH_SIZE, DEFAULT_MAX_CONCURRENCY};
use crate::error::MigrationError;

/// Per-item override flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationFlags {
    /// Bypass validation entirely (trusted re-runs).
    pub skip_validation: bool,
    /// Proceed despite failed validation, recording warnings instead.
    pub force_migration: bool,
}

impl MigrationFlags {
    pub fn with_skip_validation(mut self, skip: bool) -> Self {
        self.skip_validation = skip;
        self
    }

    pub fn with_force_migration(mut self, force: bool) -> Self {
        self.force_migration = force;
        self
    }
}

/// Options for a bulk migration run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkMigrationOptions {
    /// Materials to migrate. `None` or empty means every material, resolved
    /// when the run starts.
    pub material_ids: Option<Vec<MaterialId>>,
    pub batch_size: usize,
    pub skip_validation: bool,
    pub continue_on_error: bool,
    pub force_migration: bool,
    /// Upper bound on items migrated concurrently inside one batch.
    pub max_concurrency: usize,
}

impl Default for BulkMigrationOptions {
    fn default() -> Self {
        Self {
            material_ids: None,
            batch_size: DEFAULT_BATCH_SIZE,
            skip_validation: false,
            continue_on_error: true,
            force_migration: false,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }
}

impl BulkMigrationOptions {
    pub fn for_materials(ids: impl IntoIterator<Item = MaterialId>) -> Self {
        Self {
            material_ids: Some(ids.into_iter().collect()),
            ..Self::default()
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_skip_validation(mut self, skip: bool) -> Self {
        self.skip_validation = skip;
        self
    }

    pub fn with_continue_on_error(mut self, continue_on_error: bool) -> Self {
        self.continue_on_error = continue_on_error;
        self
    }

    pub fn with_force_migration(mut self, force: bool) -> Self {
        self.force_migration = force;
        self
    }

    pub fn with_max_concurrency(mut self, max: usize) -> Self {
        self.max_concurrency = max;
        self
    }

    pub fn flags(&self) -> MigrationFlags {
        MigrationFlags {
            skip_validation: self.skip_validation,
            force_migration: self.force_migration,
        }
    }

    /// Explicit ids to migrate, or `None` when the whole catalog is meant.
    pub fn explicit_ids(&self) -> Option<&[MaterialId]> {
        self.material_ids.as_deref().filter(|ids| !ids.is_empty())
    }

    pub fn validate(&self) -> Result<(), MigrationError> {
        if self.batch_size == 0 {
            return Err(MigrationError::InvalidOptions(
                "batch size must be greater than zero".to_string(),
            ));
        }
        if self.max_concurrency == 0 {
            return Err(MigrationError::InvalidOptions(
                "max concurrency must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Worker pool size for one batch.
    ///
    /// Stop-on-first-failure runs one item at a time so that nothing after the
    /// failing item is ever written.
    pub fn worker_count(&self) -> usize {
        if !self.continue_on_error {
            return 1;
        }
        self.max_concurrency.min(self.batch_size).max(1)
    }
}
