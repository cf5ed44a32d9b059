//! `static` source: a YAML document describing inventory by hand.
//!
//! ```yaml
//! tenants:
//!   - name: Acme
//! sites:
//!   - name: NYC
//!     status: active
//! devices:
//!   - name: nyc-web01
//!     role: Server
//!     deviceType: PowerEdge R650
//!     manufacturer: Dell
//!     serial: ABC123
//!     interfaces:
//!       - name: eth0
//!         mac: "00:11:22:33:44:55"
//!         ips:
//!           - address: 10.0.0.10/24
//!             primary: true
//! ```
//!
//! References are by name. A referenced tenant, site, manufacturer, role,
//! platform, cluster type or device type that neither the document nor the
//! inventory holds is created with just a name and slug. A device without a
//! site takes it from the host→site relations; a device or VM without a
//! tenant, from the host→tenant relations. VLANs resolve missing groups and
//! tenants through the VLAN relations.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use ssot_inventory::{Inventory, InventoryResult, SourceCtx};
use ssot_model::prelude::*;
use ssot_model::slug::slugify;
use tracing::{debug, info, warn};

use crate::colors::tag_color;
use crate::config::{SourceConfig, SourceRelations};
use crate::error::SourceError;
use crate::source::Source;

pub const STATIC_SOURCE_TYPE: &str = "static";

/// Manufacturer of device types the document does not attribute.
const DEFAULT_MANUFACTURER: &str = "Generic";

// ── Document ──────────────────────────────────────────────────────────

/// Root of a static inventory document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StaticDocument {
    pub tags: Vec<TagSpec>,
    pub tenants: Vec<TenantSpec>,
    pub sites: Vec<SiteSpec>,
    pub manufacturers: Vec<ManufacturerSpec>,
    pub platforms: Vec<PlatformSpec>,
    pub device_roles: Vec<DeviceRoleSpec>,
    pub device_types: Vec<DeviceTypeSpec>,
    pub devices: Vec<DeviceSpec>,
    pub clusters: Vec<ClusterSpec>,
    pub virtual_machines: Vec<VmSpec>,
    pub vlan_groups: Vec<VlanGroupSpec>,
    pub vlans: Vec<VlanSpec>,
    pub prefixes: Vec<PrefixSpec>,
    pub contacts: Vec<ContactSpec>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TagSpec {
    pub name: String,
    pub color: Option<String>,
    pub description: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TenantSpec {
    pub name: String,
    pub group: Option<String>,
    pub description: String,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SiteSpec {
    pub name: String,
    pub status: Option<SiteStatus>,
    pub region: Option<String>,
    pub tenant: Option<String>,
    pub facility: String,
    pub time_zone: String,
    pub physical_address: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub description: String,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ManufacturerSpec {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlatformSpec {
    pub name: String,
    pub manufacturer: Option<String>,
    pub description: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeviceRoleSpec {
    pub name: String,
    pub color: Option<String>,
    pub vm_role: bool,
    pub description: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeviceTypeSpec {
    pub model: String,
    pub manufacturer: Option<String>,
    pub part_number: String,
    pub u_height: Option<f64>,
    pub is_full_depth: Option<bool>,
    pub description: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeviceSpec {
    pub name: String,
    pub site: Option<String>,
    pub tenant: Option<String>,
    pub role: Option<String>,
    pub device_type: Option<String>,
    /// Manufacturer of `device_type` when the type is not declared.
    pub manufacturer: Option<String>,
    pub platform: Option<String>,
    pub serial: String,
    pub asset_tag: String,
    pub status: Option<DeviceStatus>,
    pub description: String,
    pub comments: String,
    /// Opaque identifier in the upstream system.
    pub source_id: Option<String>,
    pub tags: Vec<String>,
    pub interfaces: Vec<InterfaceSpec>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InterfaceSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub interface_type: Option<InterfaceType>,
    pub enabled: Option<bool>,
    pub mtu: Option<i64>,
    /// Link speed in kbps.
    pub speed: Option<i64>,
    pub mgmt_only: Option<bool>,
    pub mac: Option<String>,
    pub description: String,
    pub ips: Vec<IpSpec>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IpSpec {
    /// CIDR notation, e.g. `10.0.0.10/24`.
    pub address: String,
    pub status: Option<IpAddressStatus>,
    pub role: Option<IpAddressRole>,
    pub dns_name: String,
    pub tenant: Option<String>,
    pub description: String,
    /// Make this the primary address of its device or VM.
    pub primary: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClusterSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub cluster_type: String,
    pub group: Option<String>,
    pub site: Option<String>,
    pub tenant: Option<String>,
    pub status: Option<ClusterStatus>,
    pub description: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VmSpec {
    pub name: String,
    pub cluster: String,
    pub site: Option<String>,
    pub tenant: Option<String>,
    pub role: Option<String>,
    pub platform: Option<String>,
    pub status: Option<VmStatus>,
    pub vcpus: Option<f64>,
    /// MB
    pub memory: Option<i64>,
    /// MB
    pub disk: Option<i64>,
    pub serial: String,
    pub description: String,
    pub comments: String,
    pub source_id: Option<String>,
    pub tags: Vec<String>,
    pub interfaces: Vec<VmInterfaceSpec>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VmInterfaceSpec {
    pub name: String,
    pub enabled: Option<bool>,
    pub mtu: Option<i64>,
    pub mac: Option<String>,
    pub description: String,
    pub ips: Vec<IpSpec>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VlanGroupSpec {
    pub name: String,
    /// Scope the group to this site.
    pub site: Option<String>,
    /// Inclusive `[min, max]` ranges. Empty means 1-4094.
    pub vid_ranges: Vec<[u16; 2]>,
    pub description: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VlanSpec {
    pub name: String,
    pub vid: u16,
    pub group: Option<String>,
    pub site: Option<String>,
    pub tenant: Option<String>,
    pub status: Option<VlanStatus>,
    pub description: String,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PrefixSpec {
    pub prefix: String,
    pub status: Option<PrefixStatus>,
    pub site: Option<String>,
    pub tenant: Option<String>,
    /// Name of a VLAN declared in the same document.
    pub vlan: Option<String>,
    pub is_pool: Option<bool>,
    pub description: String,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContactSpec {
    pub name: String,
    pub title: String,
    pub phone: String,
    pub email: String,
    pub group: Option<String>,
    pub description: String,
    pub assignments: Vec<ContactAssignmentSpec>,
}

/// Links the contact to exactly one of `site`, `tenant`, `device` or `vm`
/// (devices and VMs declared in the same document).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContactAssignmentSpec {
    pub role: String,
    pub priority: Option<ContactPriority>,
    pub site: Option<String>,
    pub tenant: Option<String>,
    pub device: Option<String>,
    pub vm: Option<String>,
}

// ── Driver ────────────────────────────────────────────────────────────

/// Driver reading a [`StaticDocument`] from a file.
#[derive(Debug)]
pub struct StaticSource {
    name: String,
    path: PathBuf,
    relations: SourceRelations,
    document: Option<StaticDocument>,
}

impl StaticSource {
    pub fn from_config(config: &SourceConfig) -> Result<Self, SourceError> {
        if config.path.trim().is_empty() {
            return Err(SourceError::Config(format!(
                "source {}: path to the inventory document is required",
                config.name
            )));
        }
        let relations = config
            .relations()
            .map_err(|e| SourceError::Config(e.to_string()))?;
        Ok(Self {
            name: config.name.clone(),
            path: PathBuf::from(&config.path),
            relations,
            document: None,
        })
    }

    /// Driver over an already-parsed document.
    #[must_use]
    pub fn from_document(name: impl Into<String>, document: StaticDocument, relations: SourceRelations) -> Self {
        Self {
            name: name.into(),
            path: PathBuf::new(),
            relations,
            document: Some(document),
        }
    }
}

#[async_trait]
impl Source for StaticSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn source_type(&self) -> &str {
        STATIC_SOURCE_TYPE
    }

    async fn init(&mut self) -> Result<(), SourceError> {
        if self.document.is_some() && self.path.as_os_str().is_empty() {
            return Ok(());
        }
        let raw = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            SourceError::Unavailable(format!("failed to read {}: {e}", self.path.display()))
        })?;
        let document: StaticDocument = serde_yaml::from_str(&raw).map_err(|e| {
            SourceError::Config(format!("failed to parse {}: {e}", self.path.display()))
        })?;
        debug!(
            source = %self.name,
            path = %self.path.display(),
            devices = document.devices.len(),
            virtual_machines = document.virtual_machines.len(),
            "Loaded static inventory document"
        );
        self.document = Some(document);
        Ok(())
    }

    async fn sync(&self, ctx: &SourceCtx, inventory: &Inventory) -> Result<(), SourceError> {
        let document = self
            .document
            .as_ref()
            .ok_or_else(|| SourceError::Unavailable(format!("source {} is not initialised", self.name)))?;

        let mut pass = SyncPass::new(ctx, inventory, &self.relations);
        pass.run(document).await;

        info!(
            source = %self.name,
            total = pass.total,
            failed = pass.failed,
            "Static source synced"
        );
        if pass.failed > 0 {
            return Err(SourceError::Partial {
                failed: pass.failed,
                total: pass.total,
            });
        }
        Ok(())
    }
}

// ── Sync pass ─────────────────────────────────────────────────────────

/// State of one sync: counters and the records created so far that later
/// sections refer to by name.
struct SyncPass<'a> {
    ctx: &'a SourceCtx,
    inventory: &'a Inventory,
    relations: &'a SourceRelations,
    total: usize,
    failed: usize,
    device_types: HashMap<String, Arc<DeviceType>>,
    clusters: HashMap<String, Arc<Cluster>>,
    vlan_groups: HashMap<String, Arc<VlanGroup>>,
    vlans: HashMap<String, Arc<Vlan>>,
    devices: HashMap<String, Arc<Device>>,
    vms: HashMap<String, Arc<VirtualMachine>>,
}

/// Resolution of records referenced by name: the cached record when there is
/// one (declared earlier in the document or already in the inventory),
/// otherwise a bare name + slug record.
macro_rules! ensure_named {
    ($($fn_name:ident => $get:ident, $add:ident, $ty:ident;)+) => {
        impl SyncPass<'_> {
            $(
                async fn $fn_name(&mut self, name: &str) -> Option<Arc<$ty>> {
                    if let Some(found) = self.inventory.$get(name).await {
                        return Some(found);
                    }
                    let obj = $ty {
                        name: name.to_string(),
                        slug: slugify(name),
                        ..Default::default()
                    };
                    let result = self.inventory.$add(self.ctx, obj).await;
                    self.record($ty::CONTENT_TYPE, name, result)
                }
            )+
        }
    };
}

ensure_named! {
    ensure_tenant_group => get_tenant_group, add_tenant_group, TenantGroup;
    ensure_tenant => get_tenant, add_tenant, Tenant;
    ensure_region => get_region, add_region, Region;
    ensure_site => get_site, add_site, Site;
    ensure_manufacturer => get_manufacturer, add_manufacturer, Manufacturer;
    ensure_platform => get_platform, add_platform, Platform;
    ensure_device_role => get_device_role, add_device_role, DeviceRole;
    ensure_cluster_type => get_cluster_type, add_cluster_type, ClusterType;
    ensure_cluster_group => get_cluster_group, add_cluster_group, ClusterGroup;
    ensure_contact_group => get_contact_group, add_contact_group, ContactGroup;
    ensure_contact_role => get_contact_role, add_contact_role, ContactRole;
}

fn header(description: &str, tags: Vec<Arc<Tag>>) -> Header {
    Header {
        description: description.to_string(),
        tags,
        ..Default::default()
    }
}

fn is_ipv6(address: &str) -> bool {
    address.contains(':')
}

impl<'a> SyncPass<'a> {
    fn new(ctx: &'a SourceCtx, inventory: &'a Inventory, relations: &'a SourceRelations) -> Self {
        Self {
            ctx,
            inventory,
            relations,
            total: 0,
            failed: 0,
            device_types: HashMap::new(),
            clusters: HashMap::new(),
            vlan_groups: HashMap::new(),
            vlans: HashMap::new(),
            devices: HashMap::new(),
            vms: HashMap::new(),
        }
    }

    async fn run(&mut self, doc: &StaticDocument) {
        for spec in &doc.tags {
            self.sync_tag(spec).await;
        }
        for spec in &doc.tenants {
            self.sync_tenant(spec).await;
        }
        for spec in &doc.sites {
            self.sync_site(spec).await;
        }
        for spec in &doc.manufacturers {
            let result = self
                .inventory
                .add_manufacturer(
                    self.ctx,
                    Manufacturer {
                        header: header(&spec.description, Vec::new()),
                        name: spec.name.clone(),
                        slug: slugify(&spec.name),
                    },
                )
                .await;
            self.record(Manufacturer::CONTENT_TYPE, &spec.name, result);
        }
        for spec in &doc.platforms {
            self.sync_platform(spec).await;
        }
        for spec in &doc.device_roles {
            let color = spec.color.clone().unwrap_or_else(|| tag_color(&spec.name).to_string());
            let result = self
                .inventory
                .add_device_role(
                    self.ctx,
                    DeviceRole {
                        header: header(&spec.description, Vec::new()),
                        name: spec.name.clone(),
                        slug: slugify(&spec.name),
                        color,
                        vm_role: spec.vm_role,
                    },
                )
                .await;
            self.record(DeviceRole::CONTENT_TYPE, &spec.name, result);
        }
        for spec in &doc.device_types {
            self.sync_device_type(spec).await;
        }
        for spec in &doc.vlan_groups {
            self.sync_vlan_group(spec).await;
        }
        for spec in &doc.vlans {
            self.sync_vlan(spec).await;
        }
        for spec in &doc.prefixes {
            self.sync_prefix(spec).await;
        }
        for spec in &doc.devices {
            self.sync_device(spec).await;
        }
        for spec in &doc.clusters {
            self.sync_cluster(spec).await;
        }
        for spec in &doc.virtual_machines {
            self.sync_vm(spec).await;
        }
        for spec in &doc.contacts {
            self.sync_contact(spec).await;
        }
    }

    fn record<T>(&mut self, kind: &str, key: &str, result: InventoryResult<Arc<T>>) -> Option<Arc<T>> {
        self.total += 1;
        match result {
            Ok(obj) => Some(obj),
            Err(e) => {
                self.failed += 1;
                warn!(source = %self.ctx.name, kind, key, error = %e, "Failed to sync object");
                None
            }
        }
    }

    fn unresolved(&mut self, kind: &str, key: &str, reason: &str) {
        self.total += 1;
        self.failed += 1;
        warn!(source = %self.ctx.name, kind, key, reason, "Skipping object");
    }

    async fn ensure_opt_tenant(&mut self, name: Option<&str>) -> Option<Arc<Tenant>> {
        match name {
            Some(name) => self.ensure_tenant(name).await,
            None => None,
        }
    }

    async fn ensure_opt_site(&mut self, name: Option<&str>) -> Option<Arc<Site>> {
        match name {
            Some(name) => self.ensure_site(name).await,
            None => None,
        }
    }

    async fn ensure_opt_platform(&mut self, name: Option<&str>) -> Option<Arc<Platform>> {
        match name {
            Some(name) => self.ensure_platform(name).await,
            None => None,
        }
    }

    async fn ensure_tag(&mut self, name: &str) -> Option<Arc<Tag>> {
        if let Some(tag) = self.inventory.get_tag(name).await {
            return Some(tag);
        }
        let result = self
            .inventory
            .add_tag(
                self.ctx,
                Tag {
                    header: Header::default(),
                    name: name.to_string(),
                    slug: slugify(name),
                    color: tag_color(name).to_string(),
                },
            )
            .await;
        self.record(Tag::CONTENT_TYPE, name, result)
    }

    async fn tags(&mut self, names: &[String]) -> Vec<Arc<Tag>> {
        let mut tags = Vec::with_capacity(names.len());
        for name in names {
            if let Some(tag) = self.ensure_tag(name).await {
                tags.push(tag);
            }
        }
        tags
    }

    async fn sync_tag(&mut self, spec: &TagSpec) {
        let color = spec.color.clone().unwrap_or_else(|| tag_color(&spec.name).to_string());
        let result = self
            .inventory
            .add_tag(
                self.ctx,
                Tag {
                    header: header(&spec.description, Vec::new()),
                    name: spec.name.clone(),
                    slug: slugify(&spec.name),
                    color,
                },
            )
            .await;
        self.record(Tag::CONTENT_TYPE, &spec.name, result);
    }

    async fn sync_tenant(&mut self, spec: &TenantSpec) {
        let group = match spec.group.as_deref() {
            Some(group) => self.ensure_tenant_group(group).await,
            None => None,
        };
        let tags = self.tags(&spec.tags).await;
        let result = self
            .inventory
            .add_tenant(
                self.ctx,
                Tenant {
                    header: header(&spec.description, tags),
                    name: spec.name.clone(),
                    slug: slugify(&spec.name),
                    group,
                },
            )
            .await;
        self.record(Tenant::CONTENT_TYPE, &spec.name, result);
    }

    async fn sync_site(&mut self, spec: &SiteSpec) {
        let region = match spec.region.as_deref() {
            Some(region) => self.ensure_region(region).await,
            None => None,
        };
        let tenant = self.ensure_opt_tenant(spec.tenant.as_deref()).await;
        let tags = self.tags(&spec.tags).await;
        let result = self
            .inventory
            .add_site(
                self.ctx,
                Site {
                    header: header(&spec.description, tags),
                    name: spec.name.clone(),
                    slug: slugify(&spec.name),
                    status: spec.status.or(Some(SiteStatus::Active)),
                    region,
                    tenant,
                    facility: spec.facility.clone(),
                    time_zone: spec.time_zone.clone(),
                    physical_address: spec.physical_address.clone(),
                    latitude: spec.latitude,
                    longitude: spec.longitude,
                },
            )
            .await;
        self.record(Site::CONTENT_TYPE, &spec.name, result);
    }

    async fn sync_platform(&mut self, spec: &PlatformSpec) {
        let manufacturer = match spec.manufacturer.as_deref() {
            Some(m) => self.ensure_manufacturer(m).await,
            None => None,
        };
        let result = self
            .inventory
            .add_platform(
                self.ctx,
                Platform {
                    header: header(&spec.description, Vec::new()),
                    name: spec.name.clone(),
                    slug: slugify(&spec.name),
                    manufacturer,
                },
            )
            .await;
        self.record(Platform::CONTENT_TYPE, &spec.name, result);
    }

    async fn sync_device_type(&mut self, spec: &DeviceTypeSpec) -> Option<Arc<DeviceType>> {
        let manufacturer = spec.manufacturer.as_deref().unwrap_or(DEFAULT_MANUFACTURER);
        let manufacturer = self.ensure_manufacturer(manufacturer).await?;
        let result = self
            .inventory
            .add_device_type(
                self.ctx,
                DeviceType {
                    header: header(&spec.description, Vec::new()),
                    model: spec.model.clone(),
                    slug: slugify(&spec.model),
                    manufacturer: Some(manufacturer),
                    part_number: spec.part_number.clone(),
                    u_height: spec.u_height,
                    is_full_depth: spec.is_full_depth,
                },
            )
            .await;
        let device_type = self.record(DeviceType::CONTENT_TYPE, &spec.model, result)?;
        self.device_types.insert(spec.model.clone(), device_type.clone());
        Some(device_type)
    }

    async fn resolve_device_type(&mut self, model: &str, manufacturer: Option<&str>) -> Option<Arc<DeviceType>> {
        if let Some(device_type) = self.device_types.get(model) {
            return Some(device_type.clone());
        }
        if let Some(device_type) = self.inventory.get_device_type(model).await {
            return Some(device_type);
        }
        let spec = DeviceTypeSpec {
            model: model.to_string(),
            manufacturer: manufacturer.map(str::to_string),
            ..Default::default()
        };
        self.sync_device_type(&spec).await
    }

    async fn sync_vlan_group(&mut self, spec: &VlanGroupSpec) {
        let site = self.ensure_opt_site(spec.site.as_deref()).await;
        let vid_ranges = if spec.vid_ranges.is_empty() {
            VlanGroup::full_range()
        } else {
            spec.vid_ranges.clone()
        };
        let (scope_type, scope_id) = match &site {
            Some(site) => (Some(Site::CONTENT_TYPE.to_string()), Some(site.id())),
            None => (None, None),
        };
        let result = self
            .inventory
            .add_vlan_group(
                self.ctx,
                VlanGroup {
                    header: header(&spec.description, Vec::new()),
                    name: spec.name.clone(),
                    slug: slugify(&spec.name),
                    scope_type,
                    scope_id,
                    vid_ranges,
                },
            )
            .await;
        if let Some(group) = self.record(VlanGroup::CONTENT_TYPE, &spec.name, result) {
            self.vlan_groups.insert(spec.name.clone(), group);
        }
    }

    async fn resolve_vlan_group(&mut self, name: &str) -> Option<Arc<VlanGroup>> {
        if let Some(group) = self.vlan_groups.get(name) {
            return Some(group.clone());
        }
        self.sync_vlan_group(&VlanGroupSpec {
            name: name.to_string(),
            ..Default::default()
        })
        .await;
        self.vlan_groups.get(name).cloned()
    }

    async fn sync_vlan(&mut self, spec: &VlanSpec) {
        let group_name = spec
            .group
            .clone()
            .or_else(|| self.relations.vlan_group.matching(&spec.name).map(str::to_string));
        let group = match group_name.as_deref() {
            Some(name) => match self.resolve_vlan_group(name).await {
                Some(group) => Some(group),
                None => return self.unresolved(Vlan::CONTENT_TYPE, &spec.name, "VLAN group unavailable"),
            },
            None => None,
        };
        let tenant_name = spec
            .tenant
            .clone()
            .or_else(|| self.relations.vlan_tenant.matching(&spec.name).map(str::to_string));
        let tenant = self.ensure_opt_tenant(tenant_name.as_deref()).await;
        let site = self.ensure_opt_site(spec.site.as_deref()).await;
        let tags = self.tags(&spec.tags).await;
        let result = self
            .inventory
            .add_vlan(
                self.ctx,
                Vlan {
                    header: header(&spec.description, tags),
                    name: spec.name.clone(),
                    vid: spec.vid,
                    group,
                    site,
                    status: spec.status.or(Some(VlanStatus::Active)),
                    tenant,
                    comments: String::new(),
                },
            )
            .await;
        if let Some(vlan) = self.record(Vlan::CONTENT_TYPE, &spec.name, result) {
            self.vlans.insert(spec.name.clone(), vlan);
        }
    }

    async fn sync_prefix(&mut self, spec: &PrefixSpec) {
        let site = self.ensure_opt_site(spec.site.as_deref()).await;
        let tenant = self.ensure_opt_tenant(spec.tenant.as_deref()).await;
        let vlan = match spec.vlan.as_deref() {
            Some(name) => match self.vlans.get(name) {
                Some(vlan) => Some(vlan.clone()),
                None => return self.unresolved(Prefix::CONTENT_TYPE, &spec.prefix, "unknown VLAN"),
            },
            None => None,
        };
        let (scope_type, scope_id) = match &site {
            Some(site) => (Some(Site::CONTENT_TYPE.to_string()), Some(site.id())),
            None => (None, None),
        };
        let tags = self.tags(&spec.tags).await;
        let result = self
            .inventory
            .add_prefix(
                self.ctx,
                Prefix {
                    header: header(&spec.description, tags),
                    prefix: spec.prefix.clone(),
                    status: spec.status.or(Some(PrefixStatus::Active)),
                    scope_type,
                    scope_id,
                    tenant,
                    vlan,
                    is_pool: spec.is_pool,
                    comments: String::new(),
                },
            )
            .await;
        self.record(Prefix::CONTENT_TYPE, &spec.prefix, result);
    }

    async fn sync_device(&mut self, spec: &DeviceSpec) {
        let site_name = spec
            .site
            .clone()
            .or_else(|| self.relations.host_site.matching(&spec.name).map(str::to_string));
        let Some(site_name) = site_name else {
            return self.unresolved(Device::CONTENT_TYPE, &spec.name, "no site and no matching host site relation");
        };
        let Some(site) = self.ensure_site(&site_name).await else {
            return;
        };
        let (Some(role), Some(model)) = (spec.role.as_deref(), spec.device_type.as_deref()) else {
            return self.unresolved(Device::CONTENT_TYPE, &spec.name, "role and deviceType are required");
        };
        let Some(role) = self.ensure_device_role(role).await else {
            return;
        };
        let Some(device_type) = self.resolve_device_type(model, spec.manufacturer.as_deref()).await else {
            return;
        };
        let tenant_name = spec
            .tenant
            .clone()
            .or_else(|| self.relations.host_tenant.matching(&spec.name).map(str::to_string));
        let tenant = self.ensure_opt_tenant(tenant_name.as_deref()).await;
        let platform = self.ensure_opt_platform(spec.platform.as_deref()).await;
        let tags = self.tags(&spec.tags).await;

        let mut device = Device {
            header: header(&spec.description, tags),
            name: spec.name.clone(),
            device_type: Some(device_type),
            role: Some(role),
            platform,
            serial: spec.serial.clone(),
            asset_tag: spec.asset_tag.clone(),
            site: Some(site),
            status: spec.status.or(Some(DeviceStatus::Active)),
            tenant,
            comments: spec.comments.clone(),
            ..Default::default()
        };
        if let Some(source_id) = &spec.source_id {
            device.header.set_source_id(source_id.clone());
        }
        let result = self.inventory.add_device(self.ctx, device.clone()).await;
        let Some(stored) = self.record(Device::CONTENT_TYPE, &spec.name, result) else {
            return;
        };

        let mut primary = Primary::default();
        for iface in &spec.interfaces {
            let interface = Interface {
                header: header(&iface.description, Vec::new()),
                device: Some(stored.clone()),
                name: iface.name.clone(),
                interface_type: iface
                    .interface_type
                    .or_else(|| iface.speed.and_then(InterfaceType::for_speed))
                    .or(Some(InterfaceType::Other)),
                enabled: iface.enabled,
                mtu: iface.mtu,
                speed: iface.speed,
                mgmt_only: iface.mgmt_only,
                mac_address: iface.mac.clone(),
                ..Default::default()
            };
            let result = self.inventory.add_interface(self.ctx, interface).await;
            let key = format!("{}/{}", spec.name, iface.name);
            let Some(interface) = self.record(Interface::CONTENT_TYPE, &key, result) else {
                continue;
            };
            for ip in &iface.ips {
                let target = AssignedObject::Interface(interface.id());
                if let Some(address) = self.sync_ip(ip, target).await {
                    primary.offer(ip, address);
                }
            }
        }

        if !primary.is_empty() {
            device.primary_ip4 = primary.v4;
            device.primary_ip6 = primary.v6;
            let result = self.inventory.add_device(self.ctx, device).await;
            if let Some(updated) = self.record(Device::CONTENT_TYPE, &spec.name, result) {
                self.devices.insert(spec.name.clone(), updated);
                return;
            }
        }
        self.devices.insert(spec.name.clone(), stored);
    }

    async fn sync_ip(&mut self, spec: &IpSpec, target: AssignedObject) -> Option<Arc<IpAddress>> {
        let tenant = self.ensure_opt_tenant(spec.tenant.as_deref()).await;
        let mut ip = IpAddress {
            header: header(&spec.description, Vec::new()),
            address: spec.address.clone(),
            status: spec.status.or(Some(IpAddressStatus::Active)),
            role: spec.role,
            dns_name: spec.dns_name.clone(),
            tenant,
            ..Default::default()
        };
        ip.assign(target);
        let result = self.inventory.add_ip_address(self.ctx, ip).await;
        self.record(IpAddress::CONTENT_TYPE, &spec.address, result)
    }

    async fn sync_cluster(&mut self, spec: &ClusterSpec) {
        if spec.cluster_type.is_empty() {
            return self.unresolved(Cluster::CONTENT_TYPE, &spec.name, "type is required");
        }
        let Some(cluster_type) = self.ensure_cluster_type(&spec.cluster_type).await else {
            return;
        };
        let group = match spec.group.as_deref() {
            Some(group) => self.ensure_cluster_group(group).await,
            None => None,
        };
        let site = self.ensure_opt_site(spec.site.as_deref()).await;
        let tenant = self.ensure_opt_tenant(spec.tenant.as_deref()).await;
        let result = self
            .inventory
            .add_cluster(
                self.ctx,
                Cluster {
                    header: header(&spec.description, Vec::new()),
                    name: spec.name.clone(),
                    cluster_type: Some(cluster_type),
                    group,
                    status: spec.status.or(Some(ClusterStatus::Active)),
                    tenant,
                    site,
                },
            )
            .await;
        if let Some(cluster) = self.record(Cluster::CONTENT_TYPE, &spec.name, result) {
            self.clusters.insert(spec.name.clone(), cluster);
        }
    }

    async fn sync_vm(&mut self, spec: &VmSpec) {
        let cluster = match self.clusters.get(&spec.cluster) {
            Some(cluster) => cluster.clone(),
            None => match self.inventory.get_cluster(&spec.cluster).await {
                Some(cluster) => cluster,
                None => return self.unresolved(VirtualMachine::CONTENT_TYPE, &spec.name, "unknown cluster"),
            },
        };
        let site = match spec.site.as_deref() {
            Some(site) => self.ensure_site(site).await,
            None => cluster.site.clone(),
        };
        let tenant_name = spec
            .tenant
            .clone()
            .or_else(|| self.relations.host_tenant.matching(&spec.name).map(str::to_string));
        let tenant = self.ensure_opt_tenant(tenant_name.as_deref()).await;
        let role = match spec.role.as_deref() {
            Some(role) => self.ensure_device_role(role).await,
            None => None,
        };
        let platform = self.ensure_opt_platform(spec.platform.as_deref()).await;
        let tags = self.tags(&spec.tags).await;

        let mut vm = VirtualMachine {
            header: header(&spec.description, tags),
            name: spec.name.clone(),
            status: spec.status.or(Some(VmStatus::Active)),
            site,
            cluster: Some(cluster),
            role,
            tenant,
            platform,
            vcpus: spec.vcpus,
            memory: spec.memory,
            disk: spec.disk,
            serial: spec.serial.clone(),
            comments: spec.comments.clone(),
            ..Default::default()
        };
        if let Some(source_id) = &spec.source_id {
            vm.header.set_source_id(source_id.clone());
        }
        let result = self.inventory.add_vm(self.ctx, vm.clone()).await;
        let Some(stored) = self.record(VirtualMachine::CONTENT_TYPE, &spec.name, result) else {
            return;
        };

        let mut primary = Primary::default();
        for iface in &spec.interfaces {
            let interface = VmInterface {
                header: header(&iface.description, Vec::new()),
                virtual_machine: Some(stored.clone()),
                name: iface.name.clone(),
                enabled: iface.enabled,
                mtu: iface.mtu,
                mac_address: iface.mac.clone(),
                ..Default::default()
            };
            let result = self.inventory.add_vm_interface(self.ctx, interface).await;
            let key = format!("{}/{}", spec.name, iface.name);
            let Some(interface) = self.record(VmInterface::CONTENT_TYPE, &key, result) else {
                continue;
            };
            for ip in &iface.ips {
                let target = AssignedObject::VmInterface(interface.id());
                if let Some(address) = self.sync_ip(ip, target).await {
                    primary.offer(ip, address);
                }
            }
        }

        if !primary.is_empty() {
            vm.primary_ip4 = primary.v4;
            vm.primary_ip6 = primary.v6;
            let result = self.inventory.add_vm(self.ctx, vm).await;
            if let Some(updated) = self.record(VirtualMachine::CONTENT_TYPE, &spec.name, result) {
                self.vms.insert(spec.name.clone(), updated);
                return;
            }
        }
        self.vms.insert(spec.name.clone(), stored);
    }

    async fn sync_contact(&mut self, spec: &ContactSpec) {
        let group = match spec.group.as_deref() {
            Some(group) => self.ensure_contact_group(group).await,
            None => None,
        };
        let result = self
            .inventory
            .add_contact(
                self.ctx,
                Contact {
                    header: header(&spec.description, Vec::new()),
                    name: spec.name.clone(),
                    title: spec.title.clone(),
                    phone: spec.phone.clone(),
                    email: spec.email.clone(),
                    address: String::new(),
                    link: String::new(),
                    group,
                },
            )
            .await;
        let Some(contact) = self.record(Contact::CONTENT_TYPE, &spec.name, result) else {
            return;
        };

        for assignment in &spec.assignments {
            let Some((object_type, object_id)) = self.assignment_target(assignment).await else {
                self.unresolved(
                    ContactAssignment::CONTENT_TYPE,
                    &spec.name,
                    "assignment target missing or unknown",
                );
                continue;
            };
            let Some(role) = self.ensure_contact_role(&assignment.role).await else {
                continue;
            };
            let key = format!("{} ({} {object_id})", spec.name, object_type);
            let result = self
                .inventory
                .add_contact_assignment(
                    self.ctx,
                    ContactAssignment {
                        header: Header::default(),
                        object_type: object_type.to_string(),
                        object_id,
                        contact: Some(contact.clone()),
                        role: Some(role),
                        priority: assignment.priority,
                    },
                )
                .await;
            self.record(ContactAssignment::CONTENT_TYPE, &key, result);
        }
    }

    async fn assignment_target(&mut self, spec: &ContactAssignmentSpec) -> Option<(&'static str, i64)> {
        if let Some(site) = spec.site.as_deref() {
            let site = self.ensure_site(site).await?;
            return Some((Site::CONTENT_TYPE, site.id()));
        }
        if let Some(tenant) = spec.tenant.as_deref() {
            let tenant = self.ensure_tenant(tenant).await?;
            return Some((Tenant::CONTENT_TYPE, tenant.id()));
        }
        if let Some(device) = spec.device.as_deref() {
            let device = self.devices.get(device)?;
            return Some((Device::CONTENT_TYPE, device.id()));
        }
        if let Some(vm) = spec.vm.as_deref() {
            let vm = self.vms.get(vm)?;
            return Some((VirtualMachine::CONTENT_TYPE, vm.id()));
        }
        None
    }
}

/// Primary addresses picked while syncing a host's interfaces. The first
/// address marked primary in each family wins.
#[derive(Default)]
struct Primary {
    v4: Option<Arc<IpAddress>>,
    v6: Option<Arc<IpAddress>>,
}

impl Primary {
    fn offer(&mut self, spec: &IpSpec, address: Arc<IpAddress>) {
        if !spec.primary {
            return;
        }
        let slot = if is_ipv6(&spec.address) { &mut self.v6 } else { &mut self.v4 };
        if slot.is_none() {
            *slot = Some(address);
        }
    }

    fn is_empty(&self) -> bool {
        self.v4.is_none() && self.v6.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_parses_camel_case() {
        let raw = r#"
deviceRoles:
  - name: Server
    vmRole: true
devices:
  - name: nyc-web01
    role: Server
    deviceType: R650
    status: planned
    interfaces:
      - name: eth0
        type: 1000base-t
        mac: "00:11:22:33:44:55"
        ips:
          - address: 10.0.0.10/24
            primary: true
virtualMachines:
  - name: vm1
    cluster: c1
    memory: 2048
vlans:
  - name: office
    vid: 10
"#;
        let doc: StaticDocument = serde_yaml::from_str(raw).unwrap();
        assert!(doc.device_roles[0].vm_role);
        let device = &doc.devices[0];
        assert_eq!(device.device_type.as_deref(), Some("R650"));
        assert_eq!(device.status, Some(DeviceStatus::Planned));
        let iface = &device.interfaces[0];
        assert_eq!(iface.interface_type, Some(InterfaceType::Base1000T));
        assert!(iface.ips[0].primary);
        assert_eq!(doc.virtual_machines[0].memory, Some(2048));
        assert_eq!(doc.vlans[0].vid, 10);
        assert!(doc.sites.is_empty());
    }

    #[test]
    fn test_unknown_choice_is_kept_verbatim() {
        let raw = "devices:\n  - name: a\n    status: exploded\n";
        let doc: StaticDocument = serde_yaml::from_str(raw).unwrap();
        assert_eq!(doc.devices[0].status, Some(DeviceStatus::Unrecognized("exploded")));
    }

    #[test]
    fn test_from_config_requires_path() {
        let config = SourceConfig {
            name: "srcA".to_string(),
            source_type: STATIC_SOURCE_TYPE.to_string(),
            ..Default::default()
        };
        assert!(matches!(StaticSource::from_config(&config), Err(SourceError::Config(_))));
    }

    #[test]
    fn test_primary_picks_first_per_family() {
        let mut primary = Primary::default();
        assert!(primary.is_empty());
        let spec = |address: &str, primary: bool| IpSpec {
            address: address.to_string(),
            primary,
            ..Default::default()
        };
        let ip = |address: &str| {
            Arc::new(IpAddress {
                address: address.to_string(),
                ..Default::default()
            })
        };
        primary.offer(&spec("10.0.0.1/24", false), ip("10.0.0.1/24"));
        assert!(primary.is_empty());
        primary.offer(&spec("10.0.0.2/24", true), ip("10.0.0.2/24"));
        primary.offer(&spec("10.0.0.3/24", true), ip("10.0.0.3/24"));
        primary.offer(&spec("2001:db8::1/64", true), ip("2001:db8::1/64"));
        assert_eq!(primary.v4.unwrap().address, "10.0.0.2/24");
        assert_eq!(primary.v6.unwrap().address, "2001:db8::1/64");
    }

    #[tokio::test]
    async fn test_init_missing_file_is_unavailable() {
        let config = SourceConfig {
            name: "srcA".to_string(),
            source_type: STATIC_SOURCE_TYPE.to_string(),
            path: "/nonexistent/inventory.yaml".to_string(),
            ..Default::default()
        };
        let mut source = StaticSource::from_config(&config).unwrap();
        assert!(matches!(source.init().await, Err(SourceError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_init_malformed_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("inventory.yaml");
        std::fs::write(&path, "devices: {not: [a list").unwrap();
        let config = SourceConfig {
            name: "srcA".to_string(),
            source_type: STATIC_SOURCE_TYPE.to_string(),
            path: path.display().to_string(),
            ..Default::default()
        };
        let mut source = StaticSource::from_config(&config).unwrap();
        assert!(matches!(source.init().await, Err(SourceError::Config(_))));
    }
}
