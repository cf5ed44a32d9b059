//! ssot - reconcile upstream inventory sources into NetBox
//!
//! Loads the configuration, initialises logging and performs one run: every
//! configured source is synced into the inventory, then records no source
//! reported any more are aged out.

use std::path::PathBuf;

use clap::Parser;
use ssot_engine::{Config, Engine};
use tracing::info;

mod error;
mod logging;

use error::{AppError, AppResult};

/// Reconcile upstream inventory sources into NetBox
#[derive(Debug, Parser)]
#[command(name = "ssot")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the YAML configuration file
    #[arg(short, long, env = "SSOT_CONFIG", default_value = "config.yaml")]
    config: PathBuf,

    /// Validate the configuration and exit
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            e.print();
            std::process::exit(e.exit_code());
        }
    }
}

async fn run(cli: Cli) -> AppResult<()> {
    let config = Config::load(&cli.config)?;
    if cli.check {
        println!(
            "Configuration OK: {} source(s), inventory at {}://{}:{}",
            config.sources.len(),
            config.netbox.http_scheme,
            config.netbox.hostname,
            config.netbox.port
        );
        return Ok(());
    }

    logging::init_logging(&config.logger)?;
    info!(
        config = %cli.config.display(),
        sources = config.sources.len(),
        "Starting ssot"
    );

    let report = Engine::from_config(config).run().await?;
    if !report.is_success() {
        return Err(AppError::PartialRun {
            failed: report.sources_failed,
        });
    }
    info!(sources = report.sources_ok.len(), "Run completed");
    Ok(())
}
