//! Structural diff between a new observation and the cached record.
//!
//! The result is a patch map keyed by wire field name whose values are ready
//! to be sent as a PATCH body. Each [`FieldValue`] kind has its own
//! comparison rule:
//!
//! | Kind | Compared by | Emitted as |
//! |---|---|---|
//! | scalar / optional | value | the value |
//! | choice | canonical value | the value string |
//! | reference | id | `{"id": N}` |
//! | nested object | deep equality | the whole object |
//! | reference list | id set | `[id, ...]` |
//! | scalar list | set | the new list |
//! | map | key-by-key merge | the merged map |
//!
//! Unset new values are omitted unless `reset` is requested, in which case
//! they are emitted as `null` (or an empty list) to clear the remote value.
//! When the new observation does not have priority over the existing
//! record, non-empty existing values are never overwritten.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde_json::{json, Map, Value};
use ssot_model::field::is_zero_value;
use ssot_model::{FieldValue, NetboxObject, ObjRef};

use crate::error::DiffError;
use crate::priority::SourcePriority;

/// Compute the minimal patch that moves `existing` towards `new`.
pub fn diff(
    new: &dyn NetboxObject,
    existing: &dyn NetboxObject,
    reset: bool,
    priority: &SourcePriority,
) -> Result<Map<String, Value>, DiffError> {
    if new.content_type() != existing.content_type() {
        return Err(DiffError::TypeMismatch {
            new: new.content_type(),
            existing: existing.content_type(),
        });
    }
    let has_priority = priority.has_priority(new.header(), existing.header());
    let existing_fields: HashMap<&'static str, FieldValue> = existing
        .wire_fields()
        .into_iter()
        .map(|f| (f.name, f.value))
        .collect();

    let mut patch = Map::new();
    for field in new.wire_fields() {
        let Some(old) = existing_fields.get(field.name) else {
            continue;
        };
        if let Some(value) = diff_field(field.name, &field.value, old, reset, has_priority)? {
            patch.insert(field.name.to_string(), value);
        }
    }
    Ok(patch)
}

fn diff_field(
    name: &'static str,
    new: &FieldValue,
    existing: &FieldValue,
    reset: bool,
    has_priority: bool,
) -> Result<Option<Value>, DiffError> {
    let overwrite = has_priority || existing.is_zero();
    let value = match (new, existing) {
        (FieldValue::Scalar(n), FieldValue::Scalar(e)) => {
            if values_equal(n, e) {
                None
            } else if is_zero_value(n) {
                reset.then(|| n.clone())
            } else {
                overwrite.then(|| n.clone())
            }
        }
        (FieldValue::Optional(n), FieldValue::Optional(e))
        | (FieldValue::Object(n), FieldValue::Object(e)) => match n {
            None => (reset && e.is_some()).then_some(Value::Null),
            Some(v) if e.as_ref().is_some_and(|e| values_equal(v, e)) => None,
            Some(v) => overwrite.then(|| v.clone()),
        },
        (FieldValue::Choice(n), FieldValue::Choice(e)) => match n {
            None => (reset && e.is_some()).then_some(Value::Null),
            Some(v) if e == &Some(*v) => None,
            Some(v) => overwrite.then(|| Value::from(*v)),
        },
        (FieldValue::Ref(n), FieldValue::Ref(e)) => {
            let new_id = ref_id(*n);
            let existing_id = ref_id(*e);
            match new_id {
                None => (reset && existing_id.is_some()).then_some(Value::Null),
                Some(id) if existing_id == Some(id) => None,
                Some(id) => overwrite.then(|| json!({ "id": id })),
            }
        }
        (FieldValue::RefList(n), FieldValue::RefList(e)) => {
            let new_ids = id_set(n);
            if new_ids == id_set(e) {
                None
            } else if new_ids.is_empty() {
                reset.then(|| json!([]))
            } else {
                overwrite.then(|| json!(ordered_ids(n)))
            }
        }
        (FieldValue::ScalarList(n), FieldValue::ScalarList(e)) => {
            if same_members(n, e) {
                None
            } else if n.is_empty() {
                reset.then(|| json!([]))
            } else {
                overwrite.then(|| Value::Array(n.clone()))
            }
        }
        (FieldValue::Map(n), FieldValue::Map(e)) => {
            let merged = merge_maps(n, e, has_priority);
            (!maps_equal(&merged, e)).then_some(Value::Object(merged))
        }
        (n, e) => {
            return Err(DiffError::KindMismatch {
                field: name,
                new: n.kind(),
                existing: e.kind(),
            })
        }
    };
    Ok(value)
}

/// Key-by-key merge of a free-form map.
///
/// Keys only in `existing` are kept. Keys only in `new`, or whose existing
/// value is null/empty, take the new value. Conflicting keys take the new
/// value only when `has_priority` holds. Null values in `new` never
/// overwrite anything.
#[must_use]
pub fn merge_maps(
    new: &BTreeMap<String, Value>,
    existing: &BTreeMap<String, Value>,
    has_priority: bool,
) -> Map<String, Value> {
    let mut merged: Map<String, Value> = existing
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    for (key, value) in new {
        if value.is_null() {
            continue;
        }
        match existing.get(key) {
            Some(old) if values_equal(old, value) => {}
            Some(old) if !is_zero_value(old) && !has_priority => {}
            _ => {
                merged.insert(key.clone(), value.clone());
            }
        }
    }
    merged
}

fn maps_equal(merged: &Map<String, Value>, existing: &BTreeMap<String, Value>) -> bool {
    merged.len() == existing.len()
        && existing
            .iter()
            .all(|(k, v)| merged.get(k).is_some_and(|m| values_equal(m, v)))
}

/// Equality that treats `1` and `1.0` as the same number.
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => x == y,
        },
        _ => a == b,
    }
}

fn ref_id(r: Option<ObjRef>) -> Option<i64> {
    r.map(|r| r.id).filter(|id| *id != 0)
}

fn id_set(refs: &[ObjRef]) -> BTreeSet<i64> {
    refs.iter().map(|r| r.id).filter(|id| *id != 0).collect()
}

fn ordered_ids(refs: &[ObjRef]) -> Vec<i64> {
    let mut seen = BTreeSet::new();
    refs.iter()
        .map(|r| r.id)
        .filter(|id| *id != 0 && seen.insert(*id))
        .collect()
}

fn same_members(a: &[Value], b: &[Value]) -> bool {
    a.iter().all(|x| b.iter().any(|y| values_equal(x, y)))
        && b.iter().all(|y| a.iter().any(|x| values_equal(x, y)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ssot_model::constants::CF_SOURCE;
    use ssot_model::prelude::*;
    use ssot_model::Field;
    use std::sync::Arc;

    fn header(id: i64, source: &str) -> Header {
        let mut header = Header {
            id,
            ..Default::default()
        };
        header.set_custom_field(CF_SOURCE, source);
        header
    }

    fn site(id: i64) -> Arc<Site> {
        Arc::new(Site {
            header: Header {
                id,
                ..Default::default()
            },
            ..Default::default()
        })
    }

    fn no_priority() -> SourcePriority {
        SourcePriority::default()
    }

    #[test]
    fn test_identical_objects_produce_empty_patch() {
        let existing = Tenant {
            header: header(7, "srcA"),
            name: "acme".into(),
            slug: "acme".into(),
            ..Default::default()
        };
        let new = Tenant {
            header: header(0, "srcA"),
            ..existing.clone()
        };
        assert!(diff(&new, &existing, false, &no_priority()).unwrap().is_empty());
    }

    #[test]
    fn test_scalar_change_is_emitted() {
        let existing = Device {
            header: header(11, "srcA"),
            name: "n1".into(),
            serial: "OLD".into(),
            ..Default::default()
        };
        let new = Device {
            header: header(0, "srcA"),
            name: "n1".into(),
            serial: "NEW".into(),
            ..Default::default()
        };
        let patch = diff(&new, &existing, false, &no_priority()).unwrap();
        assert_eq!(Value::Object(patch), json!({"serial": "NEW"}));
    }

    #[test]
    fn test_zero_scalar_is_omitted_unless_reset() {
        let existing = Device {
            header: header(11, "srcA"),
            name: "n1".into(),
            comments: "racked".into(),
            ..Default::default()
        };
        let new = Device {
            header: header(0, "srcA"),
            name: "n1".into(),
            ..Default::default()
        };
        assert!(diff(&new, &existing, false, &no_priority()).unwrap().is_empty());
        let patch = diff(&new, &existing, true, &no_priority()).unwrap();
        assert_eq!(patch.get("comments"), Some(&json!("")));
    }

    #[test]
    fn test_reference_compared_by_id() {
        let existing = Device {
            header: header(11, "srcA"),
            name: "n1".into(),
            site: Some(site(4)),
            ..Default::default()
        };
        let mut same_site = existing.clone();
        same_site.site = Some(Arc::new(Site {
            header: Header {
                id: 4,
                ..Default::default()
            },
            name: "a different brief view".into(),
            ..Default::default()
        }));
        assert!(diff(&same_site, &existing, false, &no_priority())
            .unwrap()
            .is_empty());

        let mut moved = existing.clone();
        moved.site = Some(site(5));
        let patch = diff(&moved, &existing, false, &no_priority()).unwrap();
        assert_eq!(patch.get("site"), Some(&json!({"id": 5})));
    }

    #[test]
    fn test_nil_reference_with_reset_emits_null() {
        let existing = Device {
            header: header(11, "srcA"),
            site: Some(site(4)),
            ..Default::default()
        };
        let new = Device {
            header: header(0, "srcA"),
            ..Default::default()
        };
        assert!(diff(&new, &existing, false, &no_priority()).unwrap().get("site").is_none());
        let patch = diff(&new, &existing, true, &no_priority()).unwrap();
        assert_eq!(patch.get("site"), Some(&Value::Null));
    }

    #[test]
    fn test_choice_emits_value_string() {
        let existing = Device {
            header: header(11, "srcA"),
            status: Some(DeviceStatus::Active),
            ..Default::default()
        };
        let new = Device {
            header: header(0, "srcA"),
            status: Some(DeviceStatus::Offline),
            ..Default::default()
        };
        let patch = diff(&new, &existing, false, &no_priority()).unwrap();
        assert_eq!(patch.get("status"), Some(&json!("offline")));
    }

    #[test]
    fn test_optional_false_differs_from_unset() {
        let existing = Interface {
            header: header(9, "srcA"),
            name: "eth0".into(),
            enabled: Some(true),
            ..Default::default()
        };
        let new = Interface {
            header: header(0, "srcA"),
            name: "eth0".into(),
            enabled: Some(false),
            ..Default::default()
        };
        let patch = diff(&new, &existing, false, &no_priority()).unwrap();
        assert_eq!(patch.get("enabled"), Some(&json!(false)));
    }

    #[test]
    fn test_reference_list_compared_as_set() {
        let vlan = |id| {
            Arc::new(Vlan {
                header: Header {
                    id,
                    ..Default::default()
                },
                ..Default::default()
            })
        };
        let existing = Interface {
            header: header(9, "srcA"),
            tagged_vlans: vec![vlan(1), vlan(2)],
            ..Default::default()
        };
        let reordered = Interface {
            header: header(0, "srcA"),
            tagged_vlans: vec![vlan(2), vlan(1)],
            ..Default::default()
        };
        assert!(diff(&reordered, &existing, false, &no_priority())
            .unwrap()
            .is_empty());

        let changed = Interface {
            header: header(0, "srcA"),
            tagged_vlans: vec![vlan(3), vlan(1)],
            ..Default::default()
        };
        let patch = diff(&changed, &existing, false, &no_priority()).unwrap();
        assert_eq!(patch.get("tagged_vlans"), Some(&json!([3, 1])));

        let cleared = Interface {
            header: header(0, "srcA"),
            ..Default::default()
        };
        let patch = diff(&cleared, &existing, true, &no_priority()).unwrap();
        assert_eq!(patch.get("tagged_vlans"), Some(&json!([])));
    }

    #[test]
    fn test_custom_fields_merge_without_reset_by_omission() {
        let mut existing = Tenant {
            header: header(7, "srcA"),
            name: "acme".into(),
            ..Default::default()
        };
        existing.header.set_custom_field("a", 1);
        let mut new = Tenant {
            header: header(0, "srcA"),
            name: "acme".into(),
            ..Default::default()
        };
        new.header.set_custom_field("b", 2);

        let patch = diff(&new, &existing, false, &no_priority()).unwrap();
        assert_eq!(
            patch.get("custom_fields"),
            Some(&json!({"a": 1, "b": 2, "source": "srcA"}))
        );
    }

    #[test]
    fn test_lower_priority_does_not_overwrite() {
        let priority = SourcePriority::from_order(&["srcA", "srcB"]);
        let existing = Vlan {
            header: header(30, "srcA"),
            name: "Ten".into(),
            vid: 10,
            ..Default::default()
        };
        let new = Vlan {
            header: header(0, "srcB"),
            name: "Vlan10".into(),
            vid: 10,
            comments: "from srcB".into(),
            ..Default::default()
        };
        let patch = diff(&new, &existing, false, &priority).unwrap();
        // Empty existing values can still be filled in.
        assert_eq!(Value::Object(patch), json!({"comments": "from srcB"}));
    }

    #[test]
    fn test_higher_priority_overwrites() {
        let priority = SourcePriority::from_order(&["srcA", "srcB"]);
        let existing = Vlan {
            header: header(30, "srcB"),
            name: "Vlan10".into(),
            vid: 10,
            ..Default::default()
        };
        let new = Vlan {
            header: header(0, "srcA"),
            name: "Ten".into(),
            vid: 10,
            ..Default::default()
        };
        let patch = diff(&new, &existing, false, &priority).unwrap();
        assert_eq!(patch.get("name"), Some(&json!("Ten")));
        assert_eq!(patch.get("custom_fields"), Some(&json!({"source": "srcA"})));
    }

    #[test]
    fn test_type_mismatch() {
        let err = diff(&Tenant::default(), &Site::default(), false, &no_priority()).unwrap_err();
        assert_eq!(
            err,
            DiffError::TypeMismatch {
                new: "tenancy.tenant",
                existing: "dcim.site"
            }
        );
    }

    #[derive(Debug, Default)]
    struct Shape {
        header: Header,
        as_list: bool,
    }

    impl NetboxObject for Shape {
        fn header(&self) -> &Header {
            &self.header
        }

        fn header_mut(&mut self) -> &mut Header {
            &mut self.header
        }

        fn api_path(&self) -> &'static str {
            "/api/test/shapes/"
        }

        fn content_type(&self) -> &'static str {
            "test.shape"
        }

        fn fields(&self) -> Vec<Field> {
            if self.as_list {
                vec![Field::list("value", vec![json!(1)])]
            } else {
                vec![Field::scalar("value", 1)]
            }
        }

        fn display_key(&self) -> String {
            "shape".into()
        }
    }

    #[test]
    fn test_kind_mismatch() {
        let new = Shape {
            as_list: true,
            ..Default::default()
        };
        let existing = Shape::default();
        let err = diff(&new, &existing, false, &no_priority()).unwrap_err();
        assert_eq!(
            err,
            DiffError::KindMismatch {
                field: "value",
                new: "scalar list",
                existing: "scalar"
            }
        );
    }
}
