//! Run orchestration.
//!
//! A run warm-loads the inventory, initialises every configured source,
//! syncs them concurrently against the shared inventory and, only when
//! every source succeeded, sweeps records no source observed.

use std::collections::HashMap;
use std::sync::Arc;

use ssot_client::NetboxClient;
use ssot_inventory::{Inventory, SourceCtx, SweepOptions, SweepReport};
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::colors::tag_color;
use crate::config::{Config, SourceConfig};
use crate::error::{EngineError, SourceError};
use crate::registry::SourceRegistry;
use crate::source::BoxedSource;

/// Outcome of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub sources_ok: Vec<String>,
    pub sources_failed: Vec<String>,
    /// `None` when the sweep was disabled or skipped.
    pub sweep: Option<SweepReport>,
}

impl RunReport {
    /// Every source initialised and synced without error.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.sources_failed.is_empty()
    }
}

pub struct Engine {
    config: Config,
    registry: SourceRegistry,
    sweep: Option<SweepOptions>,
}

impl Engine {
    #[must_use]
    pub fn new(config: Config, registry: SourceRegistry) -> Self {
        let sweep = config.sweep_options();
        Self {
            config,
            registry,
            sweep,
        }
    }

    /// Engine with the built-in drivers.
    #[must_use]
    pub fn from_config(config: Config) -> Self {
        Self::new(config, SourceRegistry::with_builtin())
    }

    /// Override the sweep settings derived from the configuration.
    #[must_use]
    pub fn with_sweep(mut self, sweep: Option<SweepOptions>) -> Self {
        self.sweep = sweep;
        self
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Connect, warm-load the inventory and run every source.
    pub async fn run(&self) -> Result<RunReport, EngineError> {
        let client = NetboxClient::new(self.config.client_config()?)?;
        let inventory = Inventory::load(client, self.config.inventory_config()).await?;
        let report = self.run_with(Arc::new(inventory)).await;
        Ok(report)
    }

    /// Run every source against an already-loaded inventory.
    pub async fn run_with(&self, inventory: Arc<Inventory>) -> RunReport {
        let mut report = RunReport::default();

        let mut join_set = JoinSet::new();
        let mut names = HashMap::new();
        for source_config in &self.config.sources {
            let (source, ctx) = match self.prepare(source_config, &inventory).await {
                Ok(prepared) => prepared,
                Err(e) => {
                    error!(
                        source = %source_config.name,
                        source_type = %source_config.source_type,
                        error = %e,
                        "Source initialisation failed, skipping"
                    );
                    report.sources_failed.push(source_config.name.clone());
                    continue;
                }
            };
            let inventory = Arc::clone(&inventory);
            let handle = join_set.spawn(async move { source.sync(&ctx, &inventory).await });
            names.insert(handle.id(), source_config.name.clone());
        }

        while let Some(joined) = join_set.join_next_with_id().await {
            let (id, result) = match joined {
                Ok((id, result)) => (id, result.map_err(|e| e.to_string())),
                Err(e) => (e.id(), Err(format!("task panicked: {e}"))),
            };
            let name = names.remove(&id).unwrap_or_default();
            match result {
                Ok(()) => {
                    info!(source = %name, "Source synced");
                    report.sources_ok.push(name);
                }
                Err(error) => {
                    error!(source = %name, %error, "Source sync failed");
                    report.sources_failed.push(name);
                }
            }
        }
        report.sources_ok.sort();
        report.sources_failed.sort();

        match &self.sweep {
            Some(options) if report.is_success() => {
                report.sweep = Some(inventory.sweep(options).await);
            }
            Some(_) => {
                warn!(
                    failed_sources = ?report.sources_failed,
                    "Skipping orphan sweep because not every source succeeded"
                );
            }
            None => info!("Orphan removal disabled"),
        }

        let stats = inventory.stats().await;
        info!(
            objects = stats.total(),
            owned = stats.owned,
            sources_ok = report.sources_ok.len(),
            sources_failed = report.sources_failed.len(),
            "Run finished"
        );
        report
    }

    /// Build and initialise a source, then create its tags.
    async fn prepare(
        &self,
        config: &SourceConfig,
        inventory: &Inventory,
    ) -> Result<(BoxedSource, SourceCtx), SourceError> {
        let mut source = self.registry.create(config)?;
        source.init().await?;

        let ctx = SourceCtx::new(source.name(), source.source_type());
        let source_color = if config.tag_color.is_empty() {
            tag_color(&config.name)
        } else {
            config.tag_color.as_str()
        };
        let tags = inventory
            .add_source_tags(
                &ctx,
                config.tag_override(),
                source_color,
                tag_color(&config.source_type),
            )
            .await?;
        Ok((source, ctx.with_tags(tags)))
    }
}
