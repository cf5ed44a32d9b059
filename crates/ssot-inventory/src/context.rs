//! Per-source call context.

use std::sync::Arc;

use ssot_model::extras::Tag;

/// Identity of the caller of an upsert.
///
/// Every object written through the inventory is stamped with the caller's
/// name in the `source` custom field and carries the caller's tags.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceCtx {
    pub name: String,
    pub source_type: String,
    /// Tags attached to every record this source writes, typically the
    /// `Source: <name>` and `Type: <type>` tags.
    pub tags: Vec<Arc<Tag>>,
}

impl SourceCtx {
    #[must_use]
    pub fn new(name: impl Into<String>, source_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source_type: source_type.into(),
            tags: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_tags(mut self, tags: Vec<Arc<Tag>>) -> Self {
        self.tags = tags;
        self
    }

    /// Context for objects the engine synthesizes itself (default VLAN
    /// groups, source tags). These carry no `source` stamp.
    #[must_use]
    pub fn internal() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_internal(&self) -> bool {
        self.name.is_empty()
    }
}
