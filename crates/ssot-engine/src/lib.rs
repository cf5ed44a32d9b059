//! # Reconciliation Engine
//!
//! Source drivers, configuration and run orchestration on top of the
//! inventory cache.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐
//! │   source A   │   │   source B   │   Source::sync (one task each)
//! └──────┬───────┘   └──────┬───────┘
//!        │   add_* / get_*  │
//!        └────────┬─────────┘
//!          ┌──────▼──────┐
//!          │  Inventory  │  diff, priority, orphan registry
//!          └──────┬──────┘
//!          ┌──────▼──────┐
//!          │ NetboxClient│  REST
//!          └─────────────┘
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use ssot_engine::{Config, Engine};
//!
//! let config = Config::load("config.yaml")?;
//! let report = Engine::from_config(config).run().await?;
//! assert!(report.is_success());
//! ```

pub mod colors;
pub mod config;
pub mod engine;
pub mod error;
pub mod registry;
pub mod relations;
pub mod source;
pub mod sources;

pub use config::{Config, LogFormat, LogLevel, LoggerConfig, NetboxConfig, SourceConfig};
pub use engine::{Engine, RunReport};
pub use error::{ConfigError, EngineError, SourceError};
pub use registry::{SourceFactory, SourceRegistry};
pub use relations::Relations;
pub use source::{BoxedSource, Source};
pub use ssot_model::slug::slugify;
