//! Wire field view.
//!
//! Every record describes its attributes as a list of [`Field`]s. The view
//! records, for each JSON key, which kind of value it carries so the diff
//! engine and the create-payload marshaller can apply kind-specific rules
//! (compare references by id, choices by value, merge maps key by key)
//! without runtime reflection.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;

use crate::choice::Choice;
use crate::object::Resource;

/// Pointer to another record: the target's collection path and id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjRef {
    pub path: &'static str,
    pub id: i64,
}

impl ObjRef {
    #[must_use]
    pub fn new(path: &'static str, id: i64) -> Self {
        Self { path, id }
    }

    /// Build a reference to a concrete record.
    #[must_use]
    pub fn to<T: Resource>(target: &T) -> Self {
        Self::new(T::API_PATH, target.header().id)
    }
}

/// Kind-tagged value of a single field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Plain string/number/bool; zero-ness is decided by the value itself.
    Scalar(Value),
    /// Optional scalar; `Some(false)` or `Some(0)` is a set value, `None` is nil.
    Optional(Option<Value>),
    /// Choice attribute, carried by its canonical value.
    Choice(Option<&'static str>),
    /// Reference to a record that has an id.
    Ref(Option<ObjRef>),
    /// Nested structure without an id, compared and emitted whole.
    Object(Option<Value>),
    /// Set of references.
    RefList(Vec<ObjRef>),
    /// Set of scalars.
    ScalarList(Vec<Value>),
    /// Free-form attribute map, merged key by key.
    Map(BTreeMap<String, Value>),
}

impl FieldValue {
    /// Whether this value counts as "unset" for omit-empty purposes.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        match self {
            FieldValue::Scalar(v) => is_zero_value(v),
            FieldValue::Optional(v) | FieldValue::Object(v) => v.is_none(),
            FieldValue::Choice(v) => v.is_none(),
            FieldValue::Ref(r) => r.map_or(true, |r| r.id == 0),
            FieldValue::RefList(v) => v.is_empty(),
            FieldValue::ScalarList(v) => v.is_empty(),
            FieldValue::Map(m) => m.is_empty(),
        }
    }

    /// Short name of the kind, used in error messages.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            FieldValue::Scalar(_) => "scalar",
            FieldValue::Optional(_) => "optional",
            FieldValue::Choice(_) => "choice",
            FieldValue::Ref(_) => "reference",
            FieldValue::Object(_) => "object",
            FieldValue::RefList(_) => "reference list",
            FieldValue::ScalarList(_) => "scalar list",
            FieldValue::Map(_) => "map",
        }
    }
}

/// Zero value test on raw JSON: null, empty string, 0, false, empty
/// collections.
#[must_use]
pub fn is_zero_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64().map_or(false, |f| f == 0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

/// A named field of a record.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// JSON key on the wire.
    pub name: &'static str,
    pub value: FieldValue,
    /// Weak references (e.g. `primary_ip4`, `primary_mac_address`) point
    /// back at dependents and are not deletion-order edges.
    pub weak: bool,
}

impl Field {
    fn new(name: &'static str, value: FieldValue) -> Self {
        Self {
            name,
            value,
            weak: false,
        }
    }

    /// Mark this field as a weak back-reference.
    #[must_use]
    pub fn weak(mut self) -> Self {
        self.weak = true;
        self
    }

    pub fn scalar(name: &'static str, value: impl Into<Value>) -> Self {
        Self::new(name, FieldValue::Scalar(value.into()))
    }

    pub fn optional<T: Into<Value>>(name: &'static str, value: Option<T>) -> Self {
        Self::new(name, FieldValue::Optional(value.map(Into::into)))
    }

    pub fn choice<C: Choice>(name: &'static str, value: Option<C>) -> Self {
        Self::new(name, FieldValue::Choice(value.map(|c| c.value())))
    }

    pub fn reference<T: Resource>(name: &'static str, target: &Option<Arc<T>>) -> Self {
        Self::new(name, FieldValue::Ref(target.as_deref().map(ObjRef::to)))
    }

    /// Reference expressed as a raw `(path, id)` pair, for polymorphic or
    /// weak back-references resolved through an index.
    pub fn raw_reference(name: &'static str, target: Option<ObjRef>) -> Self {
        Self::new(name, FieldValue::Ref(target))
    }

    pub fn references<T: Resource>(name: &'static str, targets: &[Arc<T>]) -> Self {
        Self::new(name, FieldValue::RefList(targets.iter().map(|t| ObjRef::to(&**t)).collect()))
    }

    pub fn object(name: &'static str, value: Option<Value>) -> Self {
        Self::new(name, FieldValue::Object(value))
    }

    pub fn list(name: &'static str, values: Vec<Value>) -> Self {
        Self::new(name, FieldValue::ScalarList(values))
    }

    pub fn map(name: &'static str, values: BTreeMap<String, Value>) -> Self {
        Self::new(name, FieldValue::Map(values))
    }
}
