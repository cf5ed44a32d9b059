//! Record → request body conversion.

use serde_json::{Map, Value};
use ssot_model::{Field, FieldValue, Header, NetboxObject};

/// Wire value of a single field, or `None` when the field is unset.
///
/// References collapse to the bare id, choices to their value string.
#[must_use]
pub fn field_to_value(value: &FieldValue) -> Option<Value> {
    if value.is_zero() {
        return None;
    }
    let value = match value {
        FieldValue::Scalar(v) => v.clone(),
        FieldValue::Optional(v) | FieldValue::Object(v) => v.clone()?,
        FieldValue::Choice(v) => Value::from((*v)?),
        FieldValue::Ref(r) => Value::from(r.as_ref()?.id),
        FieldValue::RefList(refs) => refs.iter().map(|r| Value::from(r.id)).collect(),
        FieldValue::ScalarList(values) => Value::Array(values.clone()),
        FieldValue::Map(map) => Value::Object(map.clone().into_iter().collect()),
    };
    Some(value)
}

fn fields_payload(fields: Vec<Field>) -> Map<String, Value> {
    fields
        .into_iter()
        .filter_map(|f| field_to_value(&f.value).map(|v| (f.name.to_string(), v)))
        .collect()
}

/// POST body for a new record: every set field, header flattened in.
#[must_use]
pub fn create_payload(obj: &dyn NetboxObject) -> Map<String, Value> {
    fields_payload(obj.wire_fields())
}

/// Body built from the header fields alone (`tags`, `description`,
/// `custom_fields`).
#[must_use]
pub fn header_payload(header: &Header) -> Map<String, Value> {
    fields_payload(header.fields())
}

/// Sub-map of `payload` restricted to `names`.
#[must_use]
pub fn extract_fields(payload: &Map<String, Value>, names: &[&str]) -> Map<String, Value> {
    payload
        .iter()
        .filter(|(k, _)| names.contains(&k.as_str()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}
