//! # Inventory Cache
//!
//! Authoritative in-memory mirror of the remote inventory for the duration
//! of one reconciliation run.
//!
//! - [`Inventory`] loads every collection at startup and exposes idempotent
//!   typed upserts (`add_*`) and lookups (`get_*`) to sources.
//! - [`diff`] computes the minimal PATCH body between an observation and
//!   the cached record, honouring [`SourcePriority`].
//! - [`orphan`] tracks owned records no source has observed yet and ages
//!   them out after the run, in dependency order.
//! - [`marshal`] renders records into POST bodies.

pub mod context;
pub mod diff;
pub mod error;
pub mod inventory;
pub mod marshal;
pub mod orphan;
pub mod priority;

pub use context::SourceCtx;
pub use diff::{diff, merge_maps};
pub use error::{DiffError, InventoryError, InventoryResult};
pub use inventory::{Indexed, Inventory, InventoryConfig, InventoryStats};
pub use orphan::{OrphanManager, OrphanMode, SweepOptions, SweepReport, DELETION_ORDER};
pub use priority::SourcePriority;
