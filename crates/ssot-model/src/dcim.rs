//! Physical inventory: sites, devices, interfaces and MAC addresses.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::{
    truncate, MAX_ASSET_TAG_LEN, MAX_DEVICE_NAME_LEN, MAX_INTERFACE_NAME_LEN, MAX_SERIAL_LEN,
};
use crate::de::null_default;
use crate::field::Field;
use crate::ipam::{IpAddress, Vlan};
use crate::object::{Header, NetboxObject};
use crate::tenancy::Tenant;
use crate::virtualization::Cluster;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Region {
    #[serde(flatten)]
    pub header: Header,
    pub name: String,
    pub slug: String,
    pub parent: Option<Arc<Region>>,
}

resource!(Region, "/api/dcim/regions/", "dcim.region", orphan);

impl NetboxObject for Region {
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

choice!(
    /// Operational status of a site.
    SiteStatus {
        Planned => ("planned", "Planned"),
        Staging => ("staging", "Staging"),
        Active => ("active", "Active"),
        Decommissioning => ("decommissioning", "Decommissioning"),
        Retired => ("retired", "Retired"),
    }
);

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Site {
    #[serde(flatten)]
    pub header: Header,
    pub name: String,
    pub slug: String,
    pub status: Option<SiteStatus>,
    pub region: Option<Arc<Region>>,
    pub tenant: Option<Arc<Tenant>>,
    #[serde(deserialize_with = "null_default")]
    pub facility: String,
    #[serde(deserialize_with = "null_default")]
    pub time_zone: String,
    #[serde(deserialize_with = "null_default")]
    pub physical_address: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

resource!(Site, "/api/dcim/sites/", "dcim.site", orphan);

impl NetboxObject for Site {
    object_common!();

    fn fields(&self) -> Vec<Field> {
        vec![
            Field::scalar("name", self.name.clone()),
            Field::scalar("slug", self.slug.clone()),
            Field::choice("status", self.status),
            Field::reference("region", &self.region),
            Field::reference("tenant", &self.tenant),
            Field::scalar("facility", self.facility.clone()),
            Field::scalar("time_zone", self.time_zone.clone()),
            Field::scalar("physical_address", self.physical_address.clone()),
            Field::optional("latitude", self.latitude),
            Field::optional("longitude", self.longitude),
        ]
    }

    fn display_key(&self) -> String {
        self.name.clone()
    }
}

choice!(
    /// Operational status of a location.
    LocationStatus {
        Planned => ("planned", "Planned"),
        Staging => ("staging", "Staging"),
        Active => ("active", "Active"),
        Decommissioning => ("decommissioning", "Decommissioning"),
        Retired => ("retired", "Retired"),
    }
);

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Location {
    #[serde(flatten)]
    pub header: Header,
    pub name: String,
    pub slug: String,
    pub site: Option<Arc<Site>>,
    pub parent: Option<Arc<Location>>,
    pub status: Option<LocationStatus>,
    pub tenant: Option<Arc<Tenant>>,
}

resource!(Location, "/api/dcim/locations/", "dcim.location", orphan);

impl NetboxObject for Location {
    object_common!();

    fn fields(&self) -> Vec<Field> {
        vec![
            Field::scalar("name", self.name.clone()),
            Field::scalar("slug", self.slug.clone()),
            Field::reference("site", &self.site),
            Field::reference("parent", &self.parent),
            Field::choice("status", self.status),
            Field::reference("tenant", &self.tenant),
        ]
    }

    fn display_key(&self) -> String {
        self.name.clone()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Manufacturer {
    #[serde(flatten)]
    pub header: Header,
    pub name: String,
    pub slug: String,
}

resource!(Manufacturer, "/api/dcim/manufacturers/", "dcim.manufacturer", orphan);

impl NetboxObject for Manufacturer {
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
pub struct Platform {
    #[serde(flatten)]
    pub header: Header,
    pub name: String,
    pub slug: String,
    pub manufacturer: Option<Arc<Manufacturer>>,
}

resource!(Platform, "/api/dcim/platforms/", "dcim.platform", orphan);

impl NetboxObject for Platform {
    object_common!();

    fn fields(&self) -> Vec<Field> {
        vec![
            Field::scalar("name", self.name.clone()),
            Field::scalar("slug", self.slug.clone()),
            Field::reference("manufacturer", &self.manufacturer),
        ]
    }

    fn display_key(&self) -> String {
        self.name.clone()
    }
}

/// Hardware model; indexed by `model` rather than name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceType {
    #[serde(flatten)]
    pub header: Header,
    pub model: String,
    pub slug: String,
    pub manufacturer: Option<Arc<Manufacturer>>,
    #[serde(deserialize_with = "null_default")]
    pub part_number: String,
    pub u_height: Option<f64>,
    pub is_full_depth: Option<bool>,
}

resource!(DeviceType, "/api/dcim/device-types/", "dcim.devicetype", orphan);

impl NetboxObject for DeviceType {
    object_common!();

    fn fields(&self) -> Vec<Field> {
        vec![
            Field::scalar("model", self.model.clone()),
            Field::scalar("slug", self.slug.clone()),
            Field::reference("manufacturer", &self.manufacturer),
            Field::scalar("part_number", self.part_number.clone()),
            Field::optional("u_height", self.u_height),
            Field::optional("is_full_depth", self.is_full_depth),
        ]
    }

    fn display_key(&self) -> String {
        self.model.clone()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceRole {
    #[serde(flatten)]
    pub header: Header,
    pub name: String,
    pub slug: String,
    #[serde(deserialize_with = "null_default")]
    pub color: String,
    pub vm_role: bool,
}

resource!(DeviceRole, "/api/dcim/device-roles/", "dcim.devicerole", orphan);

impl NetboxObject for DeviceRole {
    object_common!();

    fn fields(&self) -> Vec<Field> {
        vec![
            Field::scalar("name", self.name.clone()),
            Field::scalar("slug", self.slug.clone()),
            Field::scalar("color", self.color.clone()),
            Field::scalar("vm_role", self.vm_role),
        ]
    }

    fn display_key(&self) -> String {
        self.name.clone()
    }
}

choice!(
    /// Operational status of a device.
    DeviceStatus {
        Offline => ("offline", "Offline"),
        Active => ("active", "Active"),
        Planned => ("planned", "Planned"),
        Staged => ("staged", "Staged"),
        Failed => ("failed", "Failed"),
        Inventory => ("inventory", "Inventory"),
        Decommissioning => ("decommissioning", "Decommissioning"),
    }
);

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Device {
    #[serde(flatten)]
    pub header: Header,
    #[serde(deserialize_with = "null_default")]
    pub name: String,
    pub device_type: Option<Arc<DeviceType>>,
    pub role: Option<Arc<DeviceRole>>,
    pub platform: Option<Arc<Platform>>,
    #[serde(deserialize_with = "null_default")]
    pub serial: String,
    #[serde(deserialize_with = "null_default")]
    pub asset_tag: String,
    pub site: Option<Arc<Site>>,
    pub location: Option<Arc<Location>>,
    pub status: Option<DeviceStatus>,
    pub tenant: Option<Arc<Tenant>>,
    pub cluster: Option<Arc<Cluster>>,
    #[serde(deserialize_with = "null_default")]
    pub comments: String,
    pub primary_ip4: Option<Arc<IpAddress>>,
    pub primary_ip6: Option<Arc<IpAddress>>,
    pub local_context_data: Option<Value>,
}

resource!(Device, "/api/dcim/devices/", "dcim.device", orphan);

impl Device {
    #[must_use]
    pub fn site_id(&self) -> i64 {
        self.site.as_ref().map_or(0, |s| s.header.id)
    }

    /// Clamp length-bounded text fields to the API's hard limits.
    pub fn clamp_lengths(&mut self) {
        self.name = truncate(&self.name, MAX_DEVICE_NAME_LEN);
        self.serial = truncate(&self.serial, MAX_SERIAL_LEN);
        self.asset_tag = truncate(&self.asset_tag, MAX_ASSET_TAG_LEN);
    }
}

impl NetboxObject for Device {
    object_common!();

    fn fields(&self) -> Vec<Field> {
        vec![
            Field::scalar("name", self.name.clone()),
            Field::reference("device_type", &self.device_type),
            Field::reference("role", &self.role),
            Field::reference("platform", &self.platform),
            Field::scalar("serial", self.serial.clone()),
            Field::scalar("asset_tag", self.asset_tag.clone()),
            Field::reference("site", &self.site),
            Field::reference("location", &self.location),
            Field::choice("status", self.status),
            Field::reference("tenant", &self.tenant),
            Field::reference("cluster", &self.cluster),
            Field::scalar("comments", self.comments.clone()),
            Field::reference("primary_ip4", &self.primary_ip4).weak(),
            Field::reference("primary_ip6", &self.primary_ip6).weak(),
            Field::object("local_context_data", self.local_context_data.clone()),
        ]
    }

    fn display_key(&self) -> String {
        self.name.clone()
    }
}

choice!(
    /// Operational status of a virtual device context.
    VirtualDeviceContextStatus {
        Active => ("active", "Active"),
        Planned => ("planned", "Planned"),
        Offline => ("offline", "Offline"),
    }
);

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VirtualDeviceContext {
    #[serde(flatten)]
    pub header: Header,
    pub name: String,
    pub device: Option<Arc<Device>>,
    pub identifier: Option<i64>,
    pub status: Option<VirtualDeviceContextStatus>,
    pub tenant: Option<Arc<Tenant>>,
    pub primary_ip4: Option<Arc<IpAddress>>,
    pub primary_ip6: Option<Arc<IpAddress>>,
}

resource!(
    VirtualDeviceContext,
    "/api/dcim/virtual-device-contexts/",
    "dcim.virtualdevicecontext",
    orphan
);

impl VirtualDeviceContext {
    #[must_use]
    pub fn device_id(&self) -> i64 {
        self.device.as_ref().map_or(0, |d| d.header.id)
    }
}

impl NetboxObject for VirtualDeviceContext {
    object_common!();

    fn fields(&self) -> Vec<Field> {
        vec![
            Field::scalar("name", self.name.clone()),
            Field::reference("device", &self.device),
            Field::optional("identifier", self.identifier),
            Field::choice("status", self.status),
            Field::reference("tenant", &self.tenant),
            Field::reference("primary_ip4", &self.primary_ip4).weak(),
            Field::reference("primary_ip6", &self.primary_ip6).weak(),
        ]
    }

    fn display_key(&self) -> String {
        format!("{} (device {})", self.name, self.device_id())
    }
}

choice!(
    /// Physical or logical interface type.
    InterfaceType {
        Virtual => ("virtual", "Virtual"),
        Bridge => ("bridge", "Bridge"),
        Lag => ("lag", "Link Aggregation Group (LAG)"),
        Base100Fx => ("100base-fx", "100BASE-FX (10/100ME FIBER)"),
        Base100Tx => ("100base-tx", "100BASE-TX (10/100ME)"),
        Base1000T => ("1000base-t", "1000BASE-T (1GE)"),
        Base2500T => ("2.5gbase-t", "2.5GBASE-T (2.5GE)"),
        Base5000T => ("5gbase-t", "5GBASE-T (5GE)"),
        Base10GT => ("10gbase-t", "10GBASE-T (10GE)"),
        Sfp1000 => ("1000base-x-sfp", "SFP (1GE)"),
        SfpPlus10G => ("10gbase-x-sfpp", "SFP+ (10GE)"),
        Sfp28 => ("25gbase-x-sfp28", "SFP28 (25GE)"),
        QsfpPlus40G => ("40gbase-x-qsfpp", "QSFP+ (40GE)"),
        Sfp56 => ("50gbase-x-sfp56", "SFP56 (50GE)"),
        Qsfp28 => ("100gbase-x-qsfp28", "QSFP28 (100GE)"),
        Qsfp56 => ("200gbase-x-qsfp56", "QSFP56 (200GE)"),
        QsfpDd400G => ("400gbase-x-qsfpdd", "QSFP-DD (400GE)"),
        Ieee80211a => ("ieee802.11a", "IEEE 802.11a"),
        Ieee80211g => ("ieee802.11g", "IEEE 802.11b/g"),
        Ieee80211n => ("ieee802.11n", "IEEE 802.11n"),
        Ieee80211ac => ("ieee802.11ac", "IEEE 802.11ac"),
        Ieee80211ad => ("ieee802.11ad", "IEEE 802.11ad"),
        Ieee80211ax => ("ieee802.11ax", "IEEE 802.11ax"),
        Lte => ("lte", "LTE"),
        CiscoStackwise => ("cisco-stackwise", "Cisco StackWise"),
        CiscoStackwisePlus => ("cisco-stackwise-plus", "Cisco StackWise Plus"),
        OtherWireless => ("other-wireless", "Other (Wireless)"),
        Other => ("other", "Other"),
    }
);

impl InterfaceType {
    /// Best-fit copper/fibre type for a link speed in kbps.
    #[must_use]
    pub fn for_speed(speed_kbps: i64) -> Option<Self> {
        match speed_kbps {
            100_000 => Some(InterfaceType::Base100Tx),
            1_000_000 => Some(InterfaceType::Base1000T),
            2_500_000 => Some(InterfaceType::Base2500T),
            5_000_000 => Some(InterfaceType::Base5000T),
            10_000_000 => Some(InterfaceType::SfpPlus10G),
            25_000_000 => Some(InterfaceType::Sfp28),
            40_000_000 => Some(InterfaceType::QsfpPlus40G),
            50_000_000 => Some(InterfaceType::Sfp56),
            100_000_000 => Some(InterfaceType::Qsfp28),
            200_000_000 => Some(InterfaceType::Qsfp56),
            400_000_000 => Some(InterfaceType::QsfpDd400G),
            _ => None,
        }
    }
}

choice!(
    /// Duplex mode of a physical interface.
    InterfaceDuplex {
        Half => ("half", "Half"),
        Full => ("full", "Full"),
        Auto => ("auto", "Auto"),
    }
);

choice!(
    /// 802.1Q mode of an interface.
    InterfaceMode {
        Access => ("access", "Access"),
        Tagged => ("tagged", "Tagged"),
        TaggedAll => ("tagged-all", "Tagged (All)"),
        QInQ => ("q-in-q", "Q-in-Q (802.1ad)"),
    }
);

/// Physical NIC of a device.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Interface {
    #[serde(flatten)]
    pub header: Header,
    pub device: Option<Arc<Device>>,
    pub name: String,
    #[serde(deserialize_with = "null_default")]
    pub label: String,
    #[serde(rename = "type")]
    pub interface_type: Option<InterfaceType>,
    pub enabled: Option<bool>,
    pub parent: Option<Arc<Interface>>,
    pub bridge: Option<Arc<Interface>>,
    pub lag: Option<Arc<Interface>>,
    pub mtu: Option<i64>,
    /// Link speed in kbps.
    pub speed: Option<i64>,
    pub duplex: Option<InterfaceDuplex>,
    pub mode: Option<InterfaceMode>,
    pub mgmt_only: Option<bool>,
    #[serde(deserialize_with = "null_default")]
    pub tagged_vlans: Vec<Arc<Vlan>>,
    pub untagged_vlan: Option<Arc<Vlan>>,
    #[serde(deserialize_with = "null_default")]
    pub vdcs: Vec<Arc<VirtualDeviceContext>>,
    pub primary_mac_address: Option<Arc<MacAddress>>,
    /// Observed MAC. From 4.2 the server derives it from
    /// `primary_mac_address` and the inventory turns it into a
    /// [`MacAddress`] record; older servers take it as a plain field.
    pub mac_address: Option<String>,
}

resource!(Interface, "/api/dcim/interfaces/", "dcim.interface", orphan);

impl Interface {
    #[must_use]
    pub fn device_id(&self) -> i64 {
        self.device.as_ref().map_or(0, |d| d.header.id)
    }

    pub fn clamp_lengths(&mut self) {
        self.name = truncate(&self.name, MAX_INTERFACE_NAME_LEN);
    }
}

impl NetboxObject for Interface {
    object_common!();

    fn fields(&self) -> Vec<Field> {
        vec![
            Field::reference("device", &self.device),
            Field::scalar("name", self.name.clone()),
            Field::scalar("label", self.label.clone()),
            Field::choice("type", self.interface_type),
            Field::optional("enabled", self.enabled),
            Field::reference("parent", &self.parent),
            Field::reference("bridge", &self.bridge),
            Field::reference("lag", &self.lag),
            Field::optional("mtu", self.mtu),
            Field::optional("speed", self.speed),
            Field::choice("duplex", self.duplex),
            Field::choice("mode", self.mode),
            Field::optional("mgmt_only", self.mgmt_only),
            Field::references("tagged_vlans", &self.tagged_vlans),
            Field::reference("untagged_vlan", &self.untagged_vlan),
            Field::references("vdcs", &self.vdcs),
            Field::reference("primary_mac_address", &self.primary_mac_address).weak(),
            Field::optional("mac_address", self.mac_address.clone()),
        ]
    }

    fn display_key(&self) -> String {
        format!("{} (device {})", self.name, self.device_id())
    }
}

/// First-class MAC address record.
///
/// `assigned_object_*` is a weak back-reference to the owning interface,
/// resolved through the interface indexes rather than held as a pointer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MacAddress {
    #[serde(flatten)]
    pub header: Header,
    pub mac_address: String,
    pub assigned_object_type: Option<String>,
    pub assigned_object_id: Option<i64>,
}

resource!(MacAddress, "/api/dcim/mac-addresses/", "dcim.macaddress", orphan);

impl MacAddress {
    /// Canonical upper-case colon-separated form used as the index key.
    #[must_use]
    pub fn normalize(mac: &str) -> String {
        let hex: String = mac
            .chars()
            .filter(char::is_ascii_hexdigit)
            .map(|c| c.to_ascii_uppercase())
            .collect();
        if hex.len() != 12 {
            return mac.trim().to_ascii_uppercase();
        }
        hex.as_bytes()
            .chunks(2)
            .map(|pair| String::from_utf8_lossy(pair).into_owned())
            .collect::<Vec<_>>()
            .join(":")
    }
}

impl NetboxObject for MacAddress {
    object_common!();

    fn fields(&self) -> Vec<Field> {
        vec![
            Field::scalar("mac_address", self.mac_address.clone()),
            Field::optional("assigned_object_type", self.assigned_object_type.clone()),
            Field::optional("assigned_object_id", self.assigned_object_id),
        ]
    }

    fn display_key(&self) -> String {
        self.mac_address.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{FieldValue, ObjRef};
    use serde_json::json;

    #[test]
    fn test_device_from_api_payload() {
        let device: Device = serde_json::from_value(json!({
            "id": 11,
            "name": "n1",
            "serial": "OLD",
            "asset_tag": null,
            "site": {"id": 4, "name": "NYC", "slug": "nyc"},
            "status": {"value": "active", "label": "Active"},
            "primary_ip4": null,
            "tags": [{"id": 1, "name": "netbox-ssot", "slug": "netbox-ssot"}],
            "custom_fields": {"source": "srcA"}
        }))
        .unwrap();
        assert_eq!(device.header.id, 11);
        assert_eq!(device.site_id(), 4);
        assert_eq!(device.status, Some(DeviceStatus::Active));
        assert!(device.header.has_tag("netbox-ssot"));
        assert_eq!(device.asset_tag, "");
    }

    #[test]
    fn test_device_clamp_lengths() {
        let mut device = Device {
            name: "n".repeat(80),
            serial: "s".repeat(60),
            asset_tag: "a".repeat(51),
            ..Default::default()
        };
        device.clamp_lengths();
        assert_eq!(device.name.len(), MAX_DEVICE_NAME_LEN);
        assert_eq!(device.serial.len(), MAX_SERIAL_LEN);
        assert_eq!(device.asset_tag.len(), MAX_ASSET_TAG_LEN);
    }

    #[test]
    fn test_primary_ip_is_not_a_dependency() {
        let device = Device {
            name: "n1".into(),
            site: Some(Arc::new(Site {
                header: Header {
                    id: 4,
                    ..Default::default()
                },
                ..Default::default()
            })),
            primary_ip4: Some(Arc::new(IpAddress {
                header: Header {
                    id: 20,
                    ..Default::default()
                },
                ..Default::default()
            })),
            ..Default::default()
        };
        assert_eq!(device.references(), vec![ObjRef::new("/api/dcim/sites/", 4)]);
    }

    #[test]
    fn test_interface_type_field_uses_wire_value() {
        let iface = Interface {
            name: "eth0".into(),
            interface_type: Some(InterfaceType::Base1000T),
            enabled: Some(false),
            ..Default::default()
        };
        let fields = iface.fields();
        let ty = fields.iter().find(|f| f.name == "type").unwrap();
        assert_eq!(ty.value, FieldValue::Choice(Some("1000base-t")));
        let enabled = fields.iter().find(|f| f.name == "enabled").unwrap();
        assert_eq!(enabled.value, FieldValue::Optional(Some(json!(false))));
    }

    #[test]
    fn test_interface_type_for_speed() {
        assert_eq!(
            InterfaceType::for_speed(1_000_000),
            Some(InterfaceType::Base1000T)
        );
        assert_eq!(InterfaceType::for_speed(7), None);
    }

    #[test]
    fn test_mac_normalize() {
        assert_eq!(MacAddress::normalize("aa-bb-cc-dd-ee-0f"), "AA:BB:CC:DD:EE:0F");
        assert_eq!(MacAddress::normalize("aabb.ccdd.ee0f"), "AA:BB:CC:DD:EE:0F");
        assert_eq!(MacAddress::normalize("zz"), "ZZ");
    }
}
