//! Virtualization clusters, virtual machines and their interfaces.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::constants::{truncate, MAX_INTERFACE_NAME_LEN, MAX_VM_NAME_LEN};
use crate::dcim::{Device, DeviceRole, MacAddress, Platform, Site};
use crate::de::null_default;
use crate::field::Field;
use crate::ipam::{IpAddress, Vlan};
use crate::object::{Header, NetboxObject};
use crate::tenancy::Tenant;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterGroup {
    #[serde(flatten)]
    pub header: Header,
    pub name: String,
    pub slug: String,
}

resource!(
    ClusterGroup,
    "/api/virtualization/cluster-groups/",
    "virtualization.clustergroup",
    orphan
);

impl NetboxObject for ClusterGroup {
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
pub struct ClusterType {
    #[serde(flatten)]
    pub header: Header,
    pub name: String,
    pub slug: String,
}

resource!(
    ClusterType,
    "/api/virtualization/cluster-types/",
    "virtualization.clustertype",
    orphan
);

impl NetboxObject for ClusterType {
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

choice!(
    /// Operational status of a cluster.
    ClusterStatus {
        Planned => ("planned", "Planned"),
        Staging => ("staging", "Staging"),
        Active => ("active", "Active"),
        Decommissioning => ("decommissioning", "Decommissioning"),
        Offline => ("offline", "Offline"),
    }
);

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Cluster {
    #[serde(flatten)]
    pub header: Header,
    pub name: String,
    #[serde(rename = "type")]
    pub cluster_type: Option<Arc<ClusterType>>,
    pub group: Option<Arc<ClusterGroup>>,
    pub status: Option<ClusterStatus>,
    pub tenant: Option<Arc<Tenant>>,
    pub site: Option<Arc<Site>>,
}

resource!(Cluster, "/api/virtualization/clusters/", "virtualization.cluster", orphan);

impl NetboxObject for Cluster {
    object_common!();

    fn fields(&self) -> Vec<Field> {
        vec![
            Field::scalar("name", self.name.clone()),
            Field::reference("type", &self.cluster_type),
            Field::reference("group", &self.group),
            Field::choice("status", self.status),
            Field::reference("tenant", &self.tenant),
            Field::reference("site", &self.site),
        ]
    }

    fn display_key(&self) -> String {
        self.name.clone()
    }
}

choice!(
    /// Operational status of a virtual machine.
    VmStatus {
        Offline => ("offline", "Offline"),
        Active => ("active", "Active"),
        Planned => ("planned", "Planned"),
        Staged => ("staged", "Staged"),
        Failed => ("failed", "Failed"),
        Decommissioning => ("decommissioning", "Decommissioning"),
    }
);

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VirtualMachine {
    #[serde(flatten)]
    pub header: Header,
    pub name: String,
    pub status: Option<VmStatus>,
    pub site: Option<Arc<Site>>,
    pub cluster: Option<Arc<Cluster>>,
    /// Host the VM currently runs on.
    pub device: Option<Arc<Device>>,
    pub role: Option<Arc<DeviceRole>>,
    pub tenant: Option<Arc<Tenant>>,
    pub platform: Option<Arc<Platform>>,
    pub vcpus: Option<f64>,
    /// Memory in MB.
    pub memory: Option<i64>,
    /// Disk in MB.
    pub disk: Option<i64>,
    #[serde(deserialize_with = "null_default")]
    pub serial: String,
    #[serde(deserialize_with = "null_default")]
    pub comments: String,
    pub primary_ip4: Option<Arc<IpAddress>>,
    pub primary_ip6: Option<Arc<IpAddress>>,
}

resource!(
    VirtualMachine,
    "/api/virtualization/virtual-machines/",
    "virtualization.virtualmachine",
    orphan
);

impl VirtualMachine {
    #[must_use]
    pub fn cluster_id(&self) -> i64 {
        self.cluster.as_ref().map_or(0, |c| c.header.id)
    }

    pub fn clamp_lengths(&mut self) {
        self.name = truncate(&self.name, MAX_VM_NAME_LEN);
    }
}

impl NetboxObject for VirtualMachine {
    object_common!();

    fn fields(&self) -> Vec<Field> {
        vec![
            Field::scalar("name", self.name.clone()),
            Field::choice("status", self.status),
            Field::reference("site", &self.site),
            Field::reference("cluster", &self.cluster),
            Field::reference("device", &self.device),
            Field::reference("role", &self.role),
            Field::reference("tenant", &self.tenant),
            Field::reference("platform", &self.platform),
            Field::optional("vcpus", self.vcpus),
            Field::optional("memory", self.memory),
            Field::optional("disk", self.disk),
            Field::scalar("serial", self.serial.clone()),
            Field::scalar("comments", self.comments.clone()),
            Field::reference("primary_ip4", &self.primary_ip4).weak(),
            Field::reference("primary_ip6", &self.primary_ip6).weak(),
        ]
    }

    fn display_key(&self) -> String {
        format!("{} (cluster {})", self.name, self.cluster_id())
    }
}

/// Interface of a virtual machine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VmInterface {
    #[serde(flatten)]
    pub header: Header,
    pub virtual_machine: Option<Arc<VirtualMachine>>,
    pub name: String,
    pub enabled: Option<bool>,
    pub parent: Option<Arc<VmInterface>>,
    pub bridge: Option<Arc<VmInterface>>,
    pub mtu: Option<i64>,
    pub mode: Option<crate::dcim::InterfaceMode>,
    #[serde(deserialize_with = "null_default")]
    pub tagged_vlans: Vec<Arc<Vlan>>,
    pub untagged_vlan: Option<Arc<Vlan>>,
    pub primary_mac_address: Option<Arc<MacAddress>>,
    /// Observed MAC, see [`crate::dcim::Interface::mac_address`].
    pub mac_address: Option<String>,
}

resource!(
    VmInterface,
    "/api/virtualization/interfaces/",
    "virtualization.vminterface",
    orphan
);

impl VmInterface {
    #[must_use]
    pub fn vm_id(&self) -> i64 {
        self.virtual_machine.as_ref().map_or(0, |vm| vm.header.id)
    }

    pub fn clamp_lengths(&mut self) {
        self.name = truncate(&self.name, MAX_INTERFACE_NAME_LEN);
    }
}

impl NetboxObject for VmInterface {
    object_common!();

    fn fields(&self) -> Vec<Field> {
        vec![
            Field::reference("virtual_machine", &self.virtual_machine),
            Field::scalar("name", self.name.clone()),
            Field::optional("enabled", self.enabled),
            Field::reference("parent", &self.parent),
            Field::reference("bridge", &self.bridge),
            Field::optional("mtu", self.mtu),
            Field::choice("mode", self.mode),
            Field::references("tagged_vlans", &self.tagged_vlans),
            Field::reference("untagged_vlan", &self.untagged_vlan),
            Field::reference("primary_mac_address", &self.primary_mac_address).weak(),
            Field::optional("mac_address", self.mac_address.clone()),
        ]
    }

    fn display_key(&self) -> String {
        format!("{} (vm {})", self.name, self.vm_id())
    }
}
