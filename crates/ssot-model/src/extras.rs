//! Tags and custom field definitions.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::de::null_default;
use crate::field::Field;
use crate::object::{Header, NetboxObject};

/// A tag that can be attached to any record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tag {
    #[serde(flatten)]
    pub header: Header,
    pub name: String,
    pub slug: String,
    #[serde(deserialize_with = "null_default")]
    pub color: String,
}

resource!(Tag, "/api/extras/tags/", "extras.tag", orphan);

impl NetboxObject for Tag {
    object_common!();

    fn fields(&self) -> Vec<Field> {
        vec![
            Field::scalar("name", self.name.clone()),
            Field::scalar("slug", self.slug.clone()),
            Field::scalar("color", self.color.clone()),
        ]
    }

    fn display_key(&self) -> String {
        self.name.clone()
    }
}

choice!(
    /// Data type of a custom field.
    CustomFieldType {
        Text => ("text", "Text"),
        LongText => ("longtext", "Text (long)"),
        Integer => ("integer", "Integer"),
        Decimal => ("decimal", "Decimal"),
        Boolean => ("boolean", "Boolean (true/false)"),
        Date => ("date", "Date"),
        DateTime => ("datetime", "Date & time"),
        Url => ("url", "URL"),
        Json => ("json", "JSON"),
        Select => ("select", "Selection"),
        MultiSelect => ("multiselect", "Multiple selection"),
        Object => ("object", "Object"),
        MultiObject => ("multiobject", "Multiple objects"),
    }
);

choice!(
    /// Filter behaviour of a custom field.
    CustomFieldFilterLogic {
        Disabled => ("disabled", "Disabled"),
        Loose => ("loose", "Loose"),
        Exact => ("exact", "Exact"),
    }
);

choice!(
    /// Visibility of a custom field in the web UI.
    CustomFieldUiVisible {
        Always => ("always", "Always"),
        IfSet => ("if-set", "If set"),
        Hidden => ("hidden", "Hidden"),
    }
);

choice!(
    /// Editability of a custom field in the web UI.
    CustomFieldUiEditable {
        Yes => ("yes", "Yes"),
        No => ("no", "No"),
        Hidden => ("hidden", "Hidden"),
    }
);

/// Schema of a user-defined attribute on one or more content types.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomField {
    #[serde(flatten)]
    pub header: Header,
    pub name: String,
    #[serde(deserialize_with = "null_default")]
    pub label: String,
    #[serde(rename = "type")]
    pub field_type: Option<CustomFieldType>,
    #[serde(deserialize_with = "null_default")]
    pub object_types: Vec<String>,
    pub required: bool,
    pub weight: Option<i64>,
    pub filter_logic: Option<CustomFieldFilterLogic>,
    pub ui_visible: Option<CustomFieldUiVisible>,
    pub ui_editable: Option<CustomFieldUiEditable>,
    pub default: Option<Value>,
}

resource!(CustomField, "/api/extras/custom-fields/", "extras.customfield");

impl NetboxObject for CustomField {
    object_common!();

    fn fields(&self) -> Vec<Field> {
        vec![
            Field::scalar("name", self.name.clone()),
            Field::scalar("label", self.label.clone()),
            Field::choice("type", self.field_type),
            Field::list(
                "object_types",
                self.object_types.iter().cloned().map(Value::from).collect(),
            ),
            Field::scalar("required", self.required),
            Field::optional("weight", self.weight),
            Field::choice("filter_logic", self.filter_logic),
            Field::choice("ui_visible", self.ui_visible),
            Field::choice("ui_editable", self.ui_editable),
            Field::optional("default", self.default.clone()),
        ]
    }

    fn display_key(&self) -> String {
        self.name.clone()
    }
}
