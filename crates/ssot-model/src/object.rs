//! Common object header and the traits every inventory record implements.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::{CF_ARP_ENTRY, CF_SOURCE, CF_SOURCE_ID};
use crate::de::null_default;
use crate::extras::Tag;
use crate::field::{Field, FieldValue, ObjRef};

/// Attributes shared by every inventory record.
///
/// Only `id` is assigned by the remote API; zero means "not yet created".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Header {
    pub id: i64,
    #[serde(deserialize_with = "null_default")]
    pub tags: Vec<Arc<Tag>>,
    #[serde(deserialize_with = "null_default")]
    pub description: String,
    #[serde(deserialize_with = "null_default")]
    pub custom_fields: BTreeMap<String, Value>,
}

impl Header {
    /// Whether a tag with this name is attached.
    #[must_use]
    pub fn has_tag(&self, name: &str) -> bool {
        self.tags.iter().any(|t| t.name == name)
    }

    /// Attach a tag unless one with the same name is already present.
    pub fn add_tag(&mut self, tag: Arc<Tag>) {
        if !self.has_tag(&tag.name) {
            self.tags.push(tag);
        }
    }

    /// Detach every tag with this name. Returns whether anything was removed.
    pub fn remove_tag(&mut self, name: &str) -> bool {
        let before = self.tags.len();
        self.tags.retain(|t| t.name != name);
        before != self.tags.len()
    }

    /// Custom field value, treating JSON `null` as absent.
    #[must_use]
    pub fn custom_field(&self, key: &str) -> Option<&Value> {
        self.custom_fields.get(key).filter(|v| !v.is_null())
    }

    pub fn set_custom_field(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.custom_fields.insert(key.into(), value.into());
    }

    /// Name of the source that last wrote the record.
    #[must_use]
    pub fn source_name(&self) -> Option<&str> {
        self.custom_field(CF_SOURCE).and_then(Value::as_str)
    }

    /// Opaque identifier the source assigned to the record.
    #[must_use]
    pub fn source_id(&self) -> Option<&str> {
        self.custom_field(CF_SOURCE_ID).and_then(Value::as_str)
    }

    pub fn set_source_id(&mut self, source_id: impl Into<String>) {
        self.set_custom_field(CF_SOURCE_ID, source_id.into());
    }

    /// Whether the record was learned solely from an ARP table.
    #[must_use]
    pub fn is_arp_entry(&self) -> bool {
        self.custom_field(CF_ARP_ENTRY)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Header fields as they appear flattened into the outer record.
    #[must_use]
    pub fn fields(&self) -> Vec<Field> {
        vec![
            Field::references("tags", &self.tags),
            Field::scalar("description", self.description.clone()),
            Field::map("custom_fields", self.custom_fields.clone()),
        ]
    }
}

/// Object-safe view of an inventory record.
pub trait NetboxObject: fmt::Debug + Send + Sync + 'static {
    fn header(&self) -> &Header;

    fn header_mut(&mut self) -> &mut Header;

    /// REST collection path, e.g. `/api/dcim/devices/`.
    fn api_path(&self) -> &'static str;

    /// Dotted content type, e.g. `dcim.device`.
    fn content_type(&self) -> &'static str;

    /// The record's own fields, excluding `id` and the header.
    fn fields(&self) -> Vec<Field>;

    /// Human-readable identity used in log lines.
    fn display_key(&self) -> String;

    fn id(&self) -> i64 {
        self.header().id
    }

    /// Own fields followed by the flattened header fields.
    fn wire_fields(&self) -> Vec<Field> {
        let mut fields = self.fields();
        fields.extend(self.header().fields());
        fields
    }

    /// Every record this one depends on (weak back-references excluded).
    fn references(&self) -> Vec<ObjRef> {
        field_references(self.wire_fields())
    }
}

/// Strong, non-zero references carried by a list of fields.
#[must_use]
pub fn field_references(fields: Vec<Field>) -> Vec<ObjRef> {
    let mut refs = Vec::new();
    for field in fields.into_iter().filter(|f| !f.weak) {
        match field.value {
            FieldValue::Ref(Some(r)) if r.id != 0 => refs.push(r),
            FieldValue::RefList(list) => refs.extend(list.into_iter().filter(|r| r.id != 0)),
            _ => {}
        }
    }
    refs
}

/// Typed record bound to a REST collection.
pub trait Resource: NetboxObject + Clone + Default + DeserializeOwned {
    const API_PATH: &'static str;
    const CONTENT_TYPE: &'static str;
}

/// Records the engine creates and may later age out.
pub trait OrphanCandidate: NetboxObject {}

/// Implements the header and path accessors of [`NetboxObject`].
macro_rules! object_common {
    () => {
        fn header(&self) -> &$crate::object::Header {
            &self.header
        }

        fn header_mut(&mut self) -> &mut $crate::object::Header {
            &mut self.header
        }

        fn api_path(&self) -> &'static str {
            <Self as $crate::object::Resource>::API_PATH
        }

        fn content_type(&self) -> &'static str {
            <Self as $crate::object::Resource>::CONTENT_TYPE
        }
    };
}

/// Binds a record type to its collection path and content type.
macro_rules! resource {
    ($ty:ty, $path:literal, $content_type:literal) => {
        impl $crate::object::Resource for $ty {
            const API_PATH: &'static str = $path;
            const CONTENT_TYPE: &'static str = $content_type;
        }
    };
    ($ty:ty, $path:literal, $content_type:literal, orphan) => {
        resource!($ty, $path, $content_type);
        impl $crate::object::OrphanCandidate for $ty {}
    };
}
