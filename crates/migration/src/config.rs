//! Engine configuration, loaded from the environment.

use tracing::warn;

use crate::options::{BulkMigrationOptions, MigrationFlags};

pub const DEFAULT_BATCH_SIZE: usize = 10;
pub const DEFAULT_MAX_CONCURRENCY: usize = 4;

pub const ENV_BATCH_SIZE: &str = "VARIANTFORGE_BATCH_SIZE";
pub const ENV_MAX_CONCURRENCY: &str = "VARIANTFORGE_MAX_CONCURRENCY";
pub const ENV_PHOTO_BASE_URL: &str = "VARIANTFORGE_PHOTO_BASE_URL";
pub const ENV_SKIP_VALIDATION: &str = "VARIANTFORGE_SKIP_VALIDATION";
pub const ENV_FORCE_MIGRATION: &str = "VARIANTFORGE_FORCE_MIGRATION";
pub const ENV_CONTINUE_ON_ERROR: &str = "VARIANTFORGE_CONTINUE_ON_ERROR";

/// Migration engine configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationConfig {
    /// Batch size used when a bulk request does not pick one.
    pub default_batch_size: usize,
    /// Upper bound on items migrated concurrently inside one batch.
    pub max_concurrency: usize,
    /// Prefix for relative photo references (e.g. a CDN root).
    pub photo_base_url: Option<String>,
    pub skip_validation: bool,
    pub force_migration: bool,
    pub continue_on_error: bool,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            default_batch_size: DEFAULT_BATCH_SIZE,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            photo_base_url: None,
            skip_validation: false,
            force_migration: false,
            continue_on_error: true,
        }
    }
}

impl MigrationConfig {
    /// Load from `VARIANTFORGE_*` environment variables.
    ///
    /// Unparseable values are logged and replaced by their defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key/value source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        Self {
            default_batch_size: positive(&lookup, ENV_BATCH_SIZE, defaults.default_batch_size),
            max_concurrency: positive(&lookup, ENV_MAX_CONCURRENCY, defaults.max_concurrency),
            photo_base_url: lookup(ENV_PHOTO_BASE_URL)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
            skip_validation: flag(&lookup, ENV_SKIP_VALIDATION, defaults.skip_validation),
            force_migration: flag(&lookup, ENV_FORCE_MIGRATION, defaults.force_migration),
            continue_on_error: flag(&lookup, ENV_CONTINUE_ON_ERROR, defaults.continue_on_error),
        }
    }

    pub fn with_photo_base_url(mut self, url: impl Into<String>) -> Self {
        self.photo_base_url = Some(url.into());
        self
    }

    pub fn with_max_concurrency(mut self, max: usize) -> Self {
        self.max_concurrency = max;
        self
    }

    /// Default flags for single-item migrations.
    pub fn flags(&self) -> MigrationFlags {
        MigrationFlags {
            skip_validation: self.skip_validation,
            force_migration: self.force_migration,
        }
    }

    /// Default options for a bulk run over all materials.
    pub fn bulk_options(&self) -> BulkMigrationOptions {
        BulkMigrationOptions::default()
            .with_batch_size(self.default_batch_size)
            .with_max_concurrency(self.max_concurrency)
            .with_skip_validation(self.skip_validation)
            .with_force_migration(self.force_migration)
            .with_continue_on_error(self.continue_on_error)
    }
}

fn positive(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: usize) -> usize {
    let Some(raw) = lookup(key) else {
        return default;
    };
    match raw.trim().parse::<usize>() {
        Ok(v) if v > 0 => v,
        _ => {
            warn!(key, value = %raw, default, "invalid positive integer; using default");
            default
        }
    }
}

fn flag(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: bool) -> bool {
    let Some(raw) = lookup(key) else {
        return default;
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => {
            warn!(key, value = %raw, default, "invalid boolean; using default");
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_yields_defaults() {
        assert_eq!(MigrationConfig::from_lookup(lookup(&[])), MigrationConfig::default());
    }

    #[test]
    fn reads_every_variable() {
        let config = MigrationConfig::from_lookup(lookup(&[
            (ENV_BATCH_SIZE, "25"),
            (ENV_MAX_CONCURRENCY, "2"),
            (ENV_PHOTO_BASE_URL, " https://cdn.example.com/media "),
            (ENV_SKIP_VALIDATION, "yes"),
            (ENV_FORCE_MIGRATION, "TRUE"),
            (ENV_CONTINUE_ON_ERROR, "0"),
        ]));

        assert_eq!(config.default_batch_size, 25);
        assert_eq!(config.max_concurrency, 2);
        assert_eq!(config.photo_base_url.as_deref(), Some("https://cdn.example.com/media"));
        assert!(config.skip_validation);
        assert!(config.force_migration);
        assert!(!config.continue_on_error);
    }

    #[test]
    fn invalid_values_fall_back_to_defaults() {
        let config = MigrationConfig::from_lookup(lookup(&[
            (ENV_BATCH_SIZE, "0"),
            (ENV_MAX_CONCURRENCY, "many"),
            (ENV_PHOTO_BASE_URL, "   "),
            (ENV_CONTINUE_ON_ERROR, "maybe"),
        ]));

        assert_eq!(config, MigrationConfig::default());
    }

    #[test]
    fn bulk_options_carry_config_defaults() {
        let config = MigrationConfig {
            default_batch_size: 50,
            max_concurrency: 8,
            force_migration: true,
            ..MigrationConfig::default()
        };

        let options = config.bulk_options();

        assert_eq!(options.batch_size, 50);
        assert_eq!(options.max_concurrency, 8);
        assert!(options.force_migration);
        assert!(options.continue_on_error);
        assert!(options.material_ids.is_none());
    }
}
