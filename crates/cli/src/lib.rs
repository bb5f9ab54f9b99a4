//! `variantforge`: migrate a legacy catalog snapshot into base products and
//! variants.
//!
//! Settings come from `VARIANTFORGE_*` environment variables
//! ([`MigrationConfig::from_env`]); command-line flags override them.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use variantforge_catalog::{MaterialId, MigrationEnvelope};
use variantforge_core::UserId;
use variantforge_events::{EventBus, InMemoryEventBus};
use variantforge_infra::{BusEventPublisher, CatalogExport, CatalogSnapshot, InMemoryProductCatalog};
use variantforge_migration::{
    BulkMigrationOptions, BulkMigrationResult, CancellationToken, MigrationConfig, MigrationService,
};

pub const ENV_USER_ID: &str = "VARIANTFORGE_USER_ID";
pub const ENV_OUTPUT: &str = "VARIANTFORGE_OUTPUT";

/// Command-line arguments for variantforge
#[derive(Parser, Debug, Clone)]
#[command(name = "variantforge")]
#[command(about = "Migrate legacy materials into base products and product variants")]
#[command(version)]
pub struct Args {
    /// Catalog snapshot (JSON) holding materials, categories and units
    pub snapshot: PathBuf,

    /// Migrate only these materials (repeatable); all materials when omitted
    #[arg(short, long = "material", value_name = "MATERIAL_ID")]
    pub materials: Vec<MaterialId>,

    /// User recorded as the author of the migration
    #[arg(short, long, env = ENV_USER_ID)]
    pub user: Option<UserId>,

    #[arg(long)]
    pub batch_size: Option<usize>,

    #[arg(long)]
    pub max_concurrency: Option<usize>,

    /// Bypass validation entirely
    #[arg(long)]
    pub skip_validation: bool,

    /// Migrate materials that fail validation, recording warnings
    #[arg(long)]
    pub force: bool,

    /// Stop at the first failed material
    #[arg(long)]
    pub stop_on_error: bool,

    /// Base URL for relative photo references
    #[arg(long)]
    pub photo_base_url: Option<String>,

    /// Write the resulting product catalog (JSON) here
    #[arg(short, long, env = ENV_OUTPUT)]
    pub output: Option<PathBuf>,
}

impl Args {
    /// Apply command-line overrides on top of the environment configuration.
    pub fn apply(&self, config: MigrationConfig) -> MigrationConfig {
        let mut config = match &self.photo_base_url {
            Some(url) => config.with_photo_base_url(url.clone()),
            None => config,
        };
        if let Some(batch_size) = self.batch_size {
            config.default_batch_size = batch_size;
        }
        if let Some(max) = self.max_concurrency {
            config = config.with_max_concurrency(max);
        }
        config.skip_validation |= self.skip_validation;
        config.force_migration |= self.force;
        config.continue_on_error &= !self.stop_on_error;
        config
    }

    pub fn options(&self, config: &MigrationConfig) -> BulkMigrationOptions {
        let options = config.bulk_options();
        if self.materials.is_empty() {
            options
        } else {
            BulkMigrationOptions {
                material_ids: Some(self.materials.clone()),
                ..options
            }
        }
    }
}

/// Everything a run produced.
#[derive(Debug)]
pub struct RunOutcome {
    pub report: BulkMigrationResult,
    pub catalog: CatalogExport,
    pub events: Vec<MigrationEnvelope>,
}

/// Load the snapshot, migrate it, and collect the results.
pub async fn run(args: &Args, config: MigrationConfig, cancel: CancellationToken) -> Result<RunOutcome> {
    let snapshot = CatalogSnapshot::load(&args.snapshot)
        .with_context(|| format!("failed to load snapshot {}", args.snapshot.display()))?;
    let (materials, references) = snapshot.into_stores();

    let catalog = Arc::new(InMemoryProductCatalog::new());
    let bus: Arc<InMemoryEventBus<MigrationEnvelope>> = Arc::new(InMemoryEventBus::new());
    let subscription = bus.subscribe();

    let user = args.user.unwrap_or_else(|| {
        let user = UserId::new();
        warn!(%user, "{ENV_USER_ID} not set; attributing migration to a generated user id");
        user
    });

    let options = args.options(&config);
    let service = MigrationService::new(
        Arc::new(materials),
        catalog.clone(),
        Arc::new(references),
        Arc::new(BusEventPublisher::new(bus)),
        config,
    );

    let report = service
        .bulk_migrate_materials_to_product_variants_cancellable(user, &options, cancel)
        .await
        .context("bulk migration failed")?;

    let events = subscription.drain();
    info!(events = events.len(), "migration events published");

    Ok(RunOutcome {
        report,
        catalog: catalog.export(),
        events,
    })
}
