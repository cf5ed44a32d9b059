//! Source factories keyed by source type.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::SourceConfig;
use crate::error::SourceError;
use crate::source::BoxedSource;
use crate::sources::static_source::{StaticSource, STATIC_SOURCE_TYPE};

/// Builds a driver from its configuration.
pub type SourceFactory = Arc<dyn Fn(&SourceConfig) -> Result<BoxedSource, SourceError> + Send + Sync>;

/// Maps source type strings (`static`, ...) to driver factories.
#[derive(Clone, Default)]
pub struct SourceRegistry {
    factories: BTreeMap<String, SourceFactory>,
}

impl std::fmt::Debug for SourceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceRegistry")
            .field("types", &self.types())
            .finish()
    }
}

impl SourceRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every driver shipped in this crate.
    #[must_use]
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(STATIC_SOURCE_TYPE, |config| {
            Ok(Box::new(StaticSource::from_config(config)?) as BoxedSource)
        });
        registry
    }

    /// Register `factory` for `source_type`, replacing any previous one.
    pub fn register<F>(&mut self, source_type: impl Into<String>, factory: F)
    where
        F: Fn(&SourceConfig) -> Result<BoxedSource, SourceError> + Send + Sync + 'static,
    {
        self.factories.insert(source_type.into(), Arc::new(factory));
    }

    /// Build the driver for `config`.
    pub fn create(&self, config: &SourceConfig) -> Result<BoxedSource, SourceError> {
        let factory = self
            .factories
            .get(&config.source_type)
            .ok_or_else(|| SourceError::UnsupportedType(config.source_type.clone()))?;
        factory(config)
    }

    #[must_use]
    pub fn types(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(source_type: &str) -> SourceConfig {
        SourceConfig {
            name: "srcA".to_string(),
            source_type: source_type.to_string(),
            path: "inventory.yaml".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_builtin_has_static() {
        let registry = SourceRegistry::with_builtin();
        assert_eq!(registry.types(), vec!["static"]);
        let source = registry.create(&config("static")).unwrap();
        assert_eq!(source.name(), "srcA");
        assert_eq!(source.source_type(), "static");
    }

    #[test]
    fn test_unknown_type() {
        let registry = SourceRegistry::with_builtin();
        let err = registry.create(&config("vmware")).err().unwrap();
        assert!(matches!(err, SourceError::UnsupportedType(t) if t == "vmware"));
    }

    #[test]
    fn test_factory_error_is_returned() {
        let mut registry = SourceRegistry::new();
        registry.register("broken", |_| Err(SourceError::Config("missing url".to_string())));
        let err = registry.create(&config("broken")).err().unwrap();
        assert_eq!(err.to_string(), "invalid source configuration: missing url");
    }
}
