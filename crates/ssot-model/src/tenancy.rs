//! Ownership and responsible-party graph.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::de::null_default;
use crate::field::Field;
use crate::object::{Header, NetboxObject};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TenantGroup {
    #[serde(flatten)]
    pub header: Header,
    pub name: String,
    pub slug: String,
    pub parent: Option<Arc<TenantGroup>>,
}

resource!(TenantGroup, "/api/tenancy/tenant-groups/", "tenancy.tenantgroup", orphan);

impl NetboxObject for TenantGroup {
    object_common!();

    fn fields(&self) -> Vec<Field> {
        vec![
            Field::scalar("name", self.name.clone()),
            Field::scalar("slug", self.slug.clone()),
            Field::reference("parent", &self.parent),
        ]
    }

    fn display_key(&self) -> String {
        self.name.clone()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tenant {
    #[serde(flatten)]
    pub header: Header,
    pub name: String,
    pub slug: String,
    pub group: Option<Arc<TenantGroup>>,
}

resource!(Tenant, "/api/tenancy/tenants/", "tenancy.tenant", orphan);

impl NetboxObject for Tenant {
    object_common!();

    fn fields(&self) -> Vec<Field> {
        vec![
            Field::scalar("name", self.name.clone()),
            Field::scalar("slug", self.slug.clone()),
            Field::reference("group", &self.group),
        ]
    }

    fn display_key(&self) -> String {
        self.name.clone()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactGroup {
    #[serde(flatten)]
    pub header: Header,
    pub name: String,
    pub slug: String,
    pub parent: Option<Arc<ContactGroup>>,
}

resource!(ContactGroup, "/api/tenancy/contact-groups/", "tenancy.contactgroup", orphan);

impl NetboxObject for ContactGroup {
    object_common!();

    fn fields(&self) -> Vec<Field> {
        vec![
            Field::scalar("name", self.name.clone()),
            Field::scalar("slug", self.slug.clone()),
            Field::reference("parent", &self.parent),
        ]
    }

    fn display_key(&self) -> String {
        self.name.clone()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactRole {
    #[serde(flatten)]
    pub header: Header,
    pub name: String,
    pub slug: String,
}

resource!(ContactRole, "/api/tenancy/contact-roles/", "tenancy.contactrole", orphan);

impl NetboxObject for ContactRole {
    object_common!();

    fn fields(&self) -> Vec<Field> {
        vec![
            Field::scalar("name", self.name.clone()),
            Field::scalar("slug", self.slug.clone()),
        ]
    }

    fn display_key(&self) -> String {
        self.name.clone()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Contact {
    #[serde(flatten)]
    pub header: Header,
    pub name: String,
    #[serde(deserialize_with = "null_default")]
    pub title: String,
    #[serde(deserialize_with = "null_default")]
    pub phone: String,
    #[serde(deserialize_with = "null_default")]
    pub email: String,
    #[serde(deserialize_with = "null_default")]
    pub address: String,
    #[serde(deserialize_with = "null_default")]
    pub link: String,
    pub group: Option<Arc<ContactGroup>>,
}

resource!(Contact, "/api/tenancy/contacts/", "tenancy.contact", orphan);

impl NetboxObject for Contact {
    object_common!();

    fn fields(&self) -> Vec<Field> {
        vec![
            Field::scalar("name", self.name.clone()),
            Field::scalar("title", self.title.clone()),
            Field::scalar("phone", self.phone.clone()),
            Field::scalar("email", self.email.clone()),
            Field::scalar("address", self.address.clone()),
            Field::scalar("link", self.link.clone()),
            Field::reference("group", &self.group),
        ]
    }

    fn display_key(&self) -> String {
        self.name.clone()
    }
}

choice!(
    /// Priority of a contact assignment.
    ContactPriority {
        Primary => ("primary", "Primary"),
        Secondary => ("secondary", "Secondary"),
        Tertiary => ("tertiary", "Tertiary"),
        Inactive => ("inactive", "Inactive"),
    }
);

/// Links a contact, in a role, to any record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactAssignment {
    #[serde(flatten)]
    pub header: Header,
    /// Dotted content type of the assigned record.
    pub object_type: String,
    pub object_id: i64,
    pub contact: Option<Arc<Contact>>,
    pub role: Option<Arc<ContactRole>>,
    pub priority: Option<ContactPriority>,
}

resource!(
    ContactAssignment,
    "/api/tenancy/contact-assignments/",
    "tenancy.contactassignment",
    orphan
);

impl ContactAssignment {
    #[must_use]
    pub fn contact_id(&self) -> i64 {
        self.contact.as_ref().map_or(0, |c| c.header.id)
    }

    #[must_use]
    pub fn role_id(&self) -> i64 {
        self.role.as_ref().map_or(0, |r| r.header.id)
    }
}

impl NetboxObject for ContactAssignment {
    object_common!();

    fn fields(&self) -> Vec<Field> {
        vec![
            Field::scalar("object_type", self.object_type.clone()),
            Field::scalar("object_id", self.object_id),
            Field::reference("contact", &self.contact),
            Field::reference("role", &self.role),
            Field::choice("priority", self.priority),
        ]
    }

    fn display_key(&self) -> String {
        format!(
            "{}:{} contact={} role={}",
            self.object_type,
            self.object_id,
            self.contact_id(),
            self.role_id()
        )
    }
}
