//! Source driver trait.

use async_trait::async_trait;
use ssot_inventory::{Inventory, SourceCtx};

use crate::error::SourceError;

/// An upstream system whose observed state is reconciled into the
/// inventory.
///
/// A run calls [`Source::init`] once, then [`Source::sync`] concurrently
/// with every other source. Sources never read each other's data; they
/// only meet in the inventory's upserts.
#[async_trait]
pub trait Source: Send + Sync {
    /// Configured source name, stamped on every record it writes.
    fn name(&self) -> &str;

    /// Driver type, e.g. `static`.
    fn source_type(&self) -> &str;

    /// Open connections and prefetch whatever `sync` needs.
    async fn init(&mut self) -> Result<(), SourceError>;

    /// Push the observed state into `inventory` on behalf of `ctx`.
    async fn sync(&self, ctx: &SourceCtx, inventory: &Inventory) -> Result<(), SourceError>;
}

/// Boxed source as produced by a registry factory.
pub type BoxedSource = Box<dyn Source>;
