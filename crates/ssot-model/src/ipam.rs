//! IP address management: prefixes, VLANs and addresses.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::constants::{DEFAULT_VID, MAX_VID};
use crate::dcim::{Interface, Location, Region, Site};
use crate::de::null_default;
use crate::field::{Field, ObjRef};
use crate::object::{field_references, Header, NetboxObject, Resource};
use crate::tenancy::Tenant;
use crate::virtualization::VmInterface;

/// Collection path of the record a `scope_type`/`scope_id` pair points at.
fn scope_ref(scope_type: Option<&str>, scope_id: Option<i64>) -> Option<ObjRef> {
    let path = match scope_type? {
        t if t == Site::CONTENT_TYPE => Site::API_PATH,
        t if t == Region::CONTENT_TYPE => Region::API_PATH,
        t if t == Location::CONTENT_TYPE => Location::API_PATH,
        _ => return None,
    };
    Some(ObjRef::new(path, scope_id?))
}

choice!(
    /// Operational status of a prefix.
    PrefixStatus {
        Container => ("container", "Container"),
        Active => ("active", "Active"),
        Reserved => ("reserved", "Reserved"),
        Deprecated => ("deprecated", "Deprecated"),
    }
);

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Prefix {
    #[serde(flatten)]
    pub header: Header,
    /// CIDR notation, e.g. `10.0.0.0/24`.
    pub prefix: String,
    pub status: Option<PrefixStatus>,
    pub scope_type: Option<String>,
    pub scope_id: Option<i64>,
    pub tenant: Option<Arc<Tenant>>,
    pub vlan: Option<Arc<Vlan>>,
    pub is_pool: Option<bool>,
    #[serde(deserialize_with = "null_default")]
    pub comments: String,
}

resource!(Prefix, "/api/ipam/prefixes/", "ipam.prefix", orphan);

impl NetboxObject for Prefix {
    object_common!();

    fn fields(&self) -> Vec<Field> {
        vec![
            Field::scalar("prefix", self.prefix.clone()),
            Field::choice("status", self.status),
            Field::optional("scope_type", self.scope_type.clone()),
            Field::optional("scope_id", self.scope_id),
            Field::reference("tenant", &self.tenant),
            Field::reference("vlan", &self.vlan),
            Field::optional("is_pool", self.is_pool),
            Field::scalar("comments", self.comments.clone()),
        ]
    }

    fn display_key(&self) -> String {
        self.prefix.clone()
    }

    fn references(&self) -> Vec<ObjRef> {
        let mut refs = field_references(self.wire_fields());
        refs.extend(scope_ref(self.scope_type.as_deref(), self.scope_id));
        refs
    }
}

/// Scoped namespace for VLAN ids.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VlanGroup {
    #[serde(flatten)]
    pub header: Header,
    pub name: String,
    pub slug: String,
    pub scope_type: Option<String>,
    pub scope_id: Option<i64>,
    /// Inclusive `[min, max]` VLAN id ranges.
    #[serde(deserialize_with = "null_default")]
    pub vid_ranges: Vec<[u16; 2]>,
}

resource!(VlanGroup, "/api/ipam/vlan-groups/", "ipam.vlangroup", orphan);

impl VlanGroup {
    /// Every usable VLAN id.
    #[must_use]
    pub fn full_range() -> Vec<[u16; 2]> {
        vec![[DEFAULT_VID, MAX_VID]]
    }

    /// Whether `vid` falls in any configured range. An empty range list
    /// accepts every id.
    #[must_use]
    pub fn contains_vid(&self, vid: u16) -> bool {
        self.vid_ranges.is_empty()
            || self
                .vid_ranges
                .iter()
                .any(|[min, max]| (*min..=*max).contains(&vid))
    }

    /// Site id when the group is scoped to a site.
    #[must_use]
    pub fn site_id(&self) -> Option<i64> {
        match self.scope_type.as_deref() {
            Some(t) if t == Site::CONTENT_TYPE => self.scope_id,
            _ => None,
        }
    }
}

impl NetboxObject for VlanGroup {
    object_common!();

    fn fields(&self) -> Vec<Field> {
        let ranges = (!self.vid_ranges.is_empty()).then(|| json!(self.vid_ranges));
        vec![
            Field::scalar("name", self.name.clone()),
            Field::scalar("slug", self.slug.clone()),
            Field::optional("scope_type", self.scope_type.clone()),
            Field::optional("scope_id", self.scope_id),
            Field::object("vid_ranges", ranges),
        ]
    }

    fn display_key(&self) -> String {
        self.name.clone()
    }

    fn references(&self) -> Vec<ObjRef> {
        let mut refs = field_references(self.wire_fields());
        refs.extend(scope_ref(self.scope_type.as_deref(), self.scope_id));
        refs
    }
}

choice!(
    /// Operational status of a VLAN.
    VlanStatus {
        Active => ("active", "Active"),
        Reserved => ("reserved", "Reserved"),
        Deprecated => ("deprecated", "Deprecated"),
    }
);

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Vlan {
    #[serde(flatten)]
    pub header: Header,
    pub name: String,
    pub vid: u16,
    pub group: Option<Arc<VlanGroup>>,
    pub site: Option<Arc<Site>>,
    pub status: Option<VlanStatus>,
    pub tenant: Option<Arc<Tenant>>,
    #[serde(deserialize_with = "null_default")]
    pub comments: String,
}

resource!(Vlan, "/api/ipam/vlans/", "ipam.vlan", orphan);

impl Vlan {
    #[must_use]
    pub fn group_id(&self) -> i64 {
        self.group.as_ref().map_or(0, |g| g.header.id)
    }
}

impl NetboxObject for Vlan {
    object_common!();

    fn fields(&self) -> Vec<Field> {
        vec![
            Field::scalar("name", self.name.clone()),
            Field::scalar("vid", self.vid),
            Field::reference("group", &self.group),
            Field::reference("site", &self.site),
            Field::choice("status", self.status),
            Field::reference("tenant", &self.tenant),
            Field::scalar("comments", self.comments.clone()),
        ]
    }

    fn display_key(&self) -> String {
        format!("{} (vid {}, group {})", self.name, self.vid, self.group_id())
    }
}

choice!(
    /// Operational status of an IP address.
    IpAddressStatus {
        Active => ("active", "Active"),
        Reserved => ("reserved", "Reserved"),
        Deprecated => ("deprecated", "Deprecated"),
        Dhcp => ("dhcp", "DHCP"),
        Slaac => ("slaac", "SLAAC"),
    }
);

choice!(
    /// Functional role of an IP address.
    IpAddressRole {
        Loopback => ("loopback", "Loopback"),
        Secondary => ("secondary", "Secondary"),
        Anycast => ("anycast", "Anycast"),
        Vip => ("vip", "VIP"),
        Vrrp => ("vrrp", "VRRP"),
        Hsrp => ("hsrp", "HSRP"),
        Glbp => ("glbp", "GLBP"),
        Carp => ("carp", "CARP"),
    }
);

/// Interface an IP address is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssignedObject {
    Interface(i64),
    VmInterface(i64),
}

impl AssignedObject {
    #[must_use]
    pub fn content_type(&self) -> &'static str {
        match self {
            AssignedObject::Interface(_) => Interface::CONTENT_TYPE,
            AssignedObject::VmInterface(_) => VmInterface::CONTENT_TYPE,
        }
    }

    #[must_use]
    pub fn id(&self) -> i64 {
        match self {
            AssignedObject::Interface(id) | AssignedObject::VmInterface(id) => *id,
        }
    }

    #[must_use]
    pub fn obj_ref(&self) -> ObjRef {
        match self {
            AssignedObject::Interface(id) => ObjRef::new(Interface::API_PATH, *id),
            AssignedObject::VmInterface(id) => ObjRef::new(VmInterface::API_PATH, *id),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IpAddress {
    #[serde(flatten)]
    pub header: Header,
    /// Address with mask, e.g. `10.0.0.5/24`.
    pub address: String,
    pub status: Option<IpAddressStatus>,
    pub role: Option<IpAddressRole>,
    #[serde(deserialize_with = "null_default")]
    pub dns_name: String,
    pub tenant: Option<Arc<Tenant>>,
    pub assigned_object_type: Option<String>,
    pub assigned_object_id: Option<i64>,
}

resource!(IpAddress, "/api/ipam/ip-addresses/", "ipam.ipaddress", orphan);

impl IpAddress {
    /// Typed view of the polymorphic assignment. Unknown content types
    /// yield `None`.
    #[must_use]
    pub fn assigned_object(&self) -> Option<AssignedObject> {
        let id = self.assigned_object_id?;
        match self.assigned_object_type.as_deref()? {
            t if t == Interface::CONTENT_TYPE => Some(AssignedObject::Interface(id)),
            t if t == VmInterface::CONTENT_TYPE => Some(AssignedObject::VmInterface(id)),
            _ => None,
        }
    }

    pub fn assign(&mut self, target: AssignedObject) {
        self.assigned_object_type = Some(target.content_type().to_string());
        self.assigned_object_id = Some(target.id());
    }

    /// Address without the mask.
    #[must_use]
    pub fn host(&self) -> &str {
        self.address.split('/').next().unwrap_or_default()
    }
}

impl NetboxObject for IpAddress {
    object_common!();

    fn fields(&self) -> Vec<Field> {
        vec![
            Field::scalar("address", self.address.clone()),
            Field::choice("status", self.status),
            Field::choice("role", self.role),
            Field::scalar("dns_name", self.dns_name.clone()),
            Field::reference("tenant", &self.tenant),
            Field::optional("assigned_object_type", self.assigned_object_type.clone()),
            Field::optional("assigned_object_id", self.assigned_object_id),
        ]
    }

    fn display_key(&self) -> String {
        self.address.clone()
    }

    fn references(&self) -> Vec<ObjRef> {
        let mut refs = field_references(self.wire_fields());
        refs.extend(self.assigned_object().map(|a| a.obj_ref()));
        refs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldValue;

    #[test]
    fn test_ip_address_assignment_round_trip() {
        let mut ip = IpAddress {
            address: "10.0.0.5/24".into(),
            ..Default::default()
        };
        assert_eq!(ip.assigned_object(), None);
        ip.assign(AssignedObject::Interface(9));
        assert_eq!(ip.assigned_object_type.as_deref(), Some("dcim.interface"));
        assert_eq!(ip.assigned_object(), Some(AssignedObject::Interface(9)));
        assert_eq!(
            ip.references(),
            vec![ObjRef::new("/api/dcim/interfaces/", 9)]
        );
        assert_eq!(ip.host(), "10.0.0.5");
    }

    #[test]
    fn test_unknown_assignment_type_is_ignored() {
        let ip = IpAddress {
            assigned_object_type: Some("ipam.fhrpgroup".into()),
            assigned_object_id: Some(3),
            ..Default::default()
        };
        assert_eq!(ip.assigned_object(), None);
    }

    #[test]
    fn test_vlan_group_scope_is_a_dependency() {
        let group = VlanGroup {
            name: "NYC VLAN group".into(),
            slug: "nyc-vlan-group".into(),
            scope_type: Some("dcim.site".into()),
            scope_id: Some(4),
            vid_ranges: VlanGroup::full_range(),
            ..Default::default()
        };
        assert_eq!(group.site_id(), Some(4));
        assert_eq!(group.references(), vec![ObjRef::new("/api/dcim/sites/", 4)]);
        let ranges = group
            .fields()
            .into_iter()
            .find(|f| f.name == "vid_ranges")
            .unwrap();
        assert_eq!(ranges.value, FieldValue::Object(Some(serde_json::json!([[1, 4094]]))));
    }

    #[test]
    fn test_vlan_group_contains_vid() {
        let mut group = VlanGroup::default();
        assert!(group.contains_vid(4000));
        group.vid_ranges = vec![[100, 200]];
        assert!(group.contains_vid(100));
        assert!(!group.contains_vid(201));
    }

    #[test]
    fn test_vlan_from_api_payload() {
        let vlan: Vlan = serde_json::from_value(serde_json::json!({
            "id": 30,
            "name": "mgmt",
            "vid": 10,
            "group": {"id": 2, "name": "Default VLAN group", "slug": "default-vlan-group"},
            "status": {"value": "active", "label": "Active"},
            "comments": null
        }))
        .unwrap();
        assert_eq!(vlan.group_id(), 2);
        assert_eq!(vlan.status, Some(VlanStatus::Active));
    }
}
