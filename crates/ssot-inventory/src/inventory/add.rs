//! Typed upserts and lookups.

use std::sync::Arc;

use ssot_model::constants::{site_vlan_group_name, DEFAULT_VLAN_GROUP_NAME, SOURCE_TAG_PREFIX, SOURCE_TYPE_TAG_PREFIX};
use ssot_model::prelude::*;
use ssot_model::slug::slugify;
use tracing::{debug, warn};

use super::{Indexed, Inventory};
use crate::context::SourceCtx;
use crate::error::{InventoryError, InventoryResult};

macro_rules! plain_upserts {
    ($($(#[$meta:meta])* $name:ident => $ty:ty;)+) => {
        impl Inventory {
            $(
                $(#[$meta])*
                pub async fn $name(&self, ctx: &SourceCtx, obj: $ty) -> InventoryResult<Arc<$ty>> {
                    self.upsert(ctx, obj).await
                }
            )+
        }
    };
}

plain_upserts! {
    add_tag => Tag;
    add_tenant_group => TenantGroup;
    add_tenant => Tenant;
    add_contact_group => ContactGroup;
    add_contact_role => ContactRole;
    add_contact => Contact;
    /// Keyed by target, contact and role: the same contact in the same role
    /// may be assigned to any number of records.
    add_contact_assignment => ContactAssignment;
    add_region => Region;
    add_site => Site;
    add_location => Location;
    add_manufacturer => Manufacturer;
    add_platform => Platform;
    add_device_role => DeviceRole;
    add_device_type => DeviceType;
    add_device => Device;
    add_virtual_device_context => VirtualDeviceContext;
    add_mac_address => MacAddress;
    add_cluster_group => ClusterGroup;
    add_cluster_type => ClusterType;
    add_cluster => Cluster;
    add_vm => VirtualMachine;
    add_prefix => Prefix;
    add_vlan_group => VlanGroup;
    add_wireless_lan_group => WirelessLanGroup;
    add_wireless_lan => WirelessLan;
}

macro_rules! name_lookups {
    ($($name:ident => $ty:ty;)+) => {
        impl Inventory {
            $(
                pub async fn $name(&self, name: &str) -> Option<Arc<$ty>> {
                    self.get::<$ty>(&name.to_string()).await
                }
            )+
        }
    };
}

name_lookups! {
    get_tag => Tag;
    get_tenant_group => TenantGroup;
    get_tenant => Tenant;
    get_contact_group => ContactGroup;
    get_contact_role => ContactRole;
    get_contact => Contact;
    get_region => Region;
    get_site => Site;
    get_manufacturer => Manufacturer;
    get_platform => Platform;
    get_device_role => DeviceRole;
    get_device_type => DeviceType;
    get_cluster_group => ClusterGroup;
    get_cluster_type => ClusterType;
    get_cluster => Cluster;
    get_vlan_group => VlanGroup;
    get_prefix => Prefix;
    get_ip_address => IpAddress;
    get_wireless_lan_group => WirelessLanGroup;
    get_wireless_lan => WirelessLan;
}

impl Inventory {
    pub async fn get_device(&self, name: &str, site_id: i64) -> Option<Arc<Device>> {
        self.get::<Device>(&(name.to_string(), site_id)).await
    }

    pub async fn get_vm(&self, name: &str, cluster_id: i64) -> Option<Arc<VirtualMachine>> {
        self.get::<VirtualMachine>(&(name.to_string(), cluster_id))
            .await
    }

    pub async fn get_interface(&self, device_id: i64, name: &str) -> Option<Arc<Interface>> {
        self.get::<Interface>(&(device_id, name.to_string())).await
    }

    pub async fn get_vm_interface(&self, vm_id: i64, name: &str) -> Option<Arc<VmInterface>> {
        self.get::<VmInterface>(&(vm_id, name.to_string())).await
    }

    pub async fn get_vlan(&self, group_id: i64, vid: u16) -> Option<Arc<Vlan>> {
        self.get::<Vlan>(&(group_id, vid)).await
    }

    pub async fn get_mac_address(&self, mac: &str) -> Option<Arc<MacAddress>> {
        self.get::<MacAddress>(&MacAddress::normalize(mac)).await
    }

    // ── Special handlers ──────────────────────────────────────────────

    /// Upsert a VLAN. A VLAN without a group is placed in the default group
    /// of its site (or the global default group), created on demand.
    pub async fn add_vlan(&self, ctx: &SourceCtx, mut vlan: Vlan) -> InventoryResult<Arc<Vlan>> {
        let group = match vlan.group.take() {
            Some(group) => group,
            None => self.default_vlan_group(vlan.site.as_ref()).await?,
        };
        if !group.contains_vid(vlan.vid) {
            return Err(InventoryError::Invalid {
                kind: Vlan::CONTENT_TYPE,
                key: vlan.display_key(),
                message: format!("VID {} is outside the ranges of group {}", vlan.vid, group.name),
            });
        }
        vlan.group = Some(group);
        self.upsert(ctx, vlan).await
    }

    /// The VLAN group unscoped VLANs of `site` belong to.
    pub(crate) async fn default_vlan_group(
        &self,
        site: Option<&Arc<Site>>,
    ) -> InventoryResult<Arc<VlanGroup>> {
        let group = match site.filter(|s| s.id() != 0 && !s.name.is_empty()) {
            Some(site) => {
                let name = site_vlan_group_name(&site.name);
                VlanGroup {
                    slug: slugify(&name),
                    name,
                    scope_type: Some(Site::CONTENT_TYPE.to_string()),
                    scope_id: Some(site.id()),
                    vid_ranges: VlanGroup::full_range(),
                    ..Default::default()
                }
            }
            None => VlanGroup {
                name: DEFAULT_VLAN_GROUP_NAME.to_string(),
                slug: slugify(DEFAULT_VLAN_GROUP_NAME),
                vid_ranges: VlanGroup::full_range(),
                ..Default::default()
            },
        };
        self.upsert(&SourceCtx::internal(), group).await
    }

    /// Upsert an IP address.
    ///
    /// An address already held by a higher-priority source is returned
    /// unchanged. An assignment that does not resolve to a cached interface
    /// is dropped.
    pub async fn add_ip_address(
        &self,
        ctx: &SourceCtx,
        mut ip: IpAddress,
    ) -> InventoryResult<Arc<IpAddress>> {
        self.check_assignment(&mut ip).await;

        self.preprocess(ctx, &mut ip);
        let existing = self.ip_addresses.lock().await.get(&ip.index_key()).cloned();
        if let Some(existing) = existing {
            if !self.config.priority.has_priority(ip.header(), existing.header()) {
                self.orphans.observe(existing.as_ref());
                debug!(
                    address = %ip.address,
                    source = ip.header().source_name().unwrap_or_default(),
                    owner = existing.header().source_name().unwrap_or_default(),
                    "Address held by a higher-priority source, skipping"
                );
                return Ok(existing);
            }
        }
        self.upsert(ctx, ip).await
    }

    async fn check_assignment(&self, ip: &mut IpAddress) {
        if ip.assigned_object_type.is_none() && ip.assigned_object_id.is_none() {
            return;
        }
        let resolved = match ip.assigned_object() {
            Some(AssignedObject::Interface(id)) => {
                self.interfaces.lock().await.by_id(id).is_some()
            }
            Some(AssignedObject::VmInterface(id)) => {
                self.vm_interfaces.lock().await.by_id(id).is_some()
            }
            None => false,
        };
        if !resolved {
            warn!(
                address = %ip.address,
                object_type = ?ip.assigned_object_type,
                object_id = ?ip.assigned_object_id,
                "Assigned interface not found, dropping assignment"
            );
            ip.assigned_object_type = None;
            ip.assigned_object_id = None;
        }
    }

    /// Upsert a device interface together with its primary MAC address.
    ///
    /// The interface is written first, then a MAC address record assigned to
    /// it, then the interface is pointed at that record.
    pub async fn add_interface(
        &self,
        ctx: &SourceCtx,
        mut iface: Interface,
    ) -> InventoryResult<Arc<Interface>> {
        let Some(mac) = self.take_mac(&mut iface.mac_address, &iface.name) else {
            return self.upsert(ctx, iface).await;
        };
        iface.primary_mac_address = None;
        let stored = self.upsert(ctx, iface.clone()).await?;
        let mac = self
            .upsert(
                ctx,
                MacAddress {
                    mac_address: mac,
                    assigned_object_type: Some(Interface::CONTENT_TYPE.to_string()),
                    assigned_object_id: Some(stored.id()),
                    ..Default::default()
                },
            )
            .await?;
        if stored.primary_mac_address.as_ref().map(|m| m.id()) == Some(mac.id()) {
            return Ok(stored);
        }
        iface.primary_mac_address = Some(mac);
        self.upsert(ctx, iface).await
    }

    /// [`Inventory::add_interface`] for VM interfaces.
    pub async fn add_vm_interface(
        &self,
        ctx: &SourceCtx,
        mut iface: VmInterface,
    ) -> InventoryResult<Arc<VmInterface>> {
        let Some(mac) = self.take_mac(&mut iface.mac_address, &iface.name) else {
            return self.upsert(ctx, iface).await;
        };
        iface.primary_mac_address = None;
        let stored = self.upsert(ctx, iface.clone()).await?;
        let mac = self
            .upsert(
                ctx,
                MacAddress {
                    mac_address: mac,
                    assigned_object_type: Some(VmInterface::CONTENT_TYPE.to_string()),
                    assigned_object_id: Some(stored.id()),
                    ..Default::default()
                },
            )
            .await?;
        if stored.primary_mac_address.as_ref().map(|m| m.id()) == Some(mac.id()) {
            return Ok(stored);
        }
        iface.primary_mac_address = Some(mac);
        self.upsert(ctx, iface).await
    }

    /// Normalized MAC to write as a [`MacAddress`] record. Servers without
    /// those records get the normalized MAC back in place, to be sent as the
    /// interface's own `mac_address`.
    fn take_mac(&self, mac: &mut Option<String>, iface: &str) -> Option<String> {
        let observed = mac.take().filter(|m| !m.trim().is_empty())?;
        let normalized = MacAddress::normalize(&observed);
        if !self.supports_mac_addresses {
            debug!(interface = iface, mac = %normalized, "Server has no MAC address records, setting MAC on the interface");
            *mac = Some(normalized);
            return None;
        }
        Some(normalized)
    }

    /// Create or refresh the tags identifying a source: `Source: <name>`
    /// (or `tag_name` when set) and `Type: <source type>`.
    pub async fn add_source_tags(
        &self,
        ctx: &SourceCtx,
        tag_name: Option<&str>,
        source_color: &str,
        type_color: &str,
    ) -> InventoryResult<Vec<Arc<Tag>>> {
        let internal = SourceCtx::internal();
        let source_tag_name = tag_name
            .filter(|n| !n.is_empty())
            .map_or_else(|| format!("{SOURCE_TAG_PREFIX}{}", ctx.name), str::to_string);
        let source_tag = self
            .upsert(
                &internal,
                Tag {
                    header: Header {
                        description: format!("Objects reported by source {}", ctx.name),
                        ..Default::default()
                    },
                    slug: slugify(&source_tag_name),
                    name: source_tag_name,
                    color: source_color.to_string(),
                },
            )
            .await?;

        let type_tag_name = format!("{SOURCE_TYPE_TAG_PREFIX}{}", ctx.source_type);
        let type_tag = self
            .upsert(
                &internal,
                Tag {
                    header: Header {
                        description: format!("Objects reported by {} sources", ctx.source_type),
                        ..Default::default()
                    },
                    slug: slugify(&type_tag_name),
                    name: type_tag_name,
                    color: type_color.to_string(),
                },
            )
            .await?;
        Ok(vec![source_tag, type_tag])
    }
}
