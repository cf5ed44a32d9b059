//! Primary keys of every cached record type.

use ssot_model::prelude::*;

use super::{Index, Indexed, Inventory};

macro_rules! indexed {
    ($ty:ty, $index:ident, $key:ty, |$obj:ident| $key_expr:expr) => {
        impl Indexed for $ty {
            type Key = $key;

            fn index_key(&self) -> $key {
                let $obj = self;
                $key_expr
            }

            fn index(inventory: &Inventory) -> &Index<Self> {
                &inventory.$index
            }
        }
    };
    ($ty:ty, $index:ident, $key:ty, |$obj:ident| $key_expr:expr, prepare = $prepare:expr) => {
        impl Indexed for $ty {
            type Key = $key;

            fn index_key(&self) -> $key {
                let $obj = self;
                $key_expr
            }

            fn index(inventory: &Inventory) -> &Index<Self> {
                &inventory.$index
            }

            fn prepare(&mut self) {
                let prepare: fn(&mut Self) = $prepare;
                prepare(self);
            }
        }
    };
}

// Name-keyed.
indexed!(Tag, tags, String, |t| t.name.clone());
indexed!(CustomField, custom_fields, String, |f| f.name.clone());
indexed!(TenantGroup, tenant_groups, String, |g| g.name.clone());
indexed!(Tenant, tenants, String, |t| t.name.clone());
indexed!(ContactGroup, contact_groups, String, |g| g.name.clone());
indexed!(ContactRole, contact_roles, String, |r| r.name.clone());
indexed!(Contact, contacts, String, |c| c.name.clone());
indexed!(Region, regions, String, |r| r.name.clone());
indexed!(Site, sites, String, |s| s.name.clone());
indexed!(Manufacturer, manufacturers, String, |m| m.name.clone());
indexed!(Platform, platforms, String, |p| p.name.clone());
indexed!(DeviceRole, device_roles, String, |r| r.name.clone());
indexed!(ClusterGroup, cluster_groups, String, |g| g.name.clone());
indexed!(ClusterType, cluster_types, String, |t| t.name.clone());
indexed!(Cluster, clusters, String, |c| c.name.clone());
indexed!(VlanGroup, vlan_groups, String, |g| g.name.clone());
indexed!(WirelessLanGroup, wireless_lan_groups, String, |g| g.name.clone());

indexed!(DeviceType, device_types, String, |t| t.model.clone());
indexed!(WirelessLan, wireless_lans, String, |w| w.ssid.clone());
indexed!(Prefix, prefixes, String, |p| p.prefix.clone());
indexed!(IpAddress, ip_addresses, String, |ip| ip.address.clone());

// `(name, site id)`
indexed!(
    Device,
    devices,
    (String, i64),
    |d| (d.name.clone(), d.site_id()),
    prepare = Device::clamp_lengths
);

// `(site id, name)`
indexed!(Location, locations, (i64, String), |l| (
    l.site.as_ref().map_or(0, |s| s.id()),
    l.name.clone()
));

// `(name, device id)`
indexed!(
    VirtualDeviceContext,
    virtual_device_contexts,
    (String, i64),
    |v| (v.name.clone(), v.device_id())
);

// `(device id, name)`
indexed!(
    Interface,
    interfaces,
    (i64, String),
    |i| (i.device_id(), i.name.clone()),
    prepare = Interface::clamp_lengths
);

// `(name, cluster id)`
indexed!(
    VirtualMachine,
    virtual_machines,
    (String, i64),
    |vm| (vm.name.clone(), vm.cluster_id()),
    prepare = VirtualMachine::clamp_lengths
);

// `(vm id, name)`
indexed!(
    VmInterface,
    vm_interfaces,
    (i64, String),
    |i| (i.vm_id(), i.name.clone()),
    prepare = VmInterface::clamp_lengths
);

// `(group id, vid)`
indexed!(Vlan, vlans, (i64, u16), |v| (v.group_id(), v.vid));

// Canonical MAC
indexed!(
    MacAddress,
    mac_addresses,
    String,
    |m| MacAddress::normalize(&m.mac_address),
    prepare = |m| {
        m.mac_address = MacAddress::normalize(&m.mac_address);
    }
);

// `(object type, object id, contact id, role id)`
indexed!(
    ContactAssignment,
    contact_assignments,
    (String, i64, i64, i64),
    |a| (
        a.object_type.clone(),
        a.object_id,
        a.contact_id(),
        a.role_id()
    )
);
