use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use variantforge_cli::{Args, run};
use variantforge_migration::{CancellationToken, MigrationConfig};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    variantforge_observability::init();

    let args = Args::parse();
    let config = args.apply(MigrationConfig::from_env());

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received; letting in-flight migrations finish");
            on_interrupt.cancel();
        }
    });

    let outcome = run(&args, config, cancel).await?;

    if let Some(path) = &args.output {
        let json = serde_json::to_string_pretty(&outcome.catalog)?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write catalog to {}", path.display()))?;
        info!(path = %path.display(), "product catalog written");
    }

    println!("{}", serde_json::to_string_pretty(&outcome.report)?);

    let clean = outcome.report.is_complete() && outcome.report.failed_migrations == 0;
    Ok(if clean { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}
