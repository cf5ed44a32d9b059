//! # Inventory Object Model
//!
//! Typed records for every entity the reconciliation engine reads from and
//! writes to the inventory service.
//!
//! Each record embeds a common [`Header`] (id, tags, description, custom
//! fields) and advertises its REST collection path and dotted content type
//! through the [`Resource`] trait. References to other records are held as
//! `Arc<T>` in memory and rendered as integer ids on the wire.
//!
//! ## Crate Organization
//!
//! - [`object`] - `Header`, `NetboxObject`, `Resource`, `OrphanCandidate`
//! - [`field`] - Wire field view consumed by the diff engine and marshaller
//! - [`choice`] - Enum-like attributes with a canonical wire value
//! - [`constants`] - Engine custom fields, tag names and API limits
//! - [`slug`] - Slug derivation
//! - [`extras`], [`tenancy`], [`dcim`], [`virtualization`], [`ipam`],
//!   [`wireless`] - Entity families

#[macro_use]
pub mod choice;
#[macro_use]
pub mod object;

pub mod constants;
pub mod dcim;
pub mod extras;
pub mod field;
pub mod ipam;
pub mod slug;
pub mod tenancy;
pub mod virtualization;
pub mod wireless;

mod de;

pub use choice::{Choice, UnknownChoice};
pub use field::{Field, FieldValue, ObjRef};
pub use object::{Header, NetboxObject, OrphanCandidate, Resource};

/// Prelude module for convenient imports.
///
/// ```
/// use ssot_model::prelude::*;
/// ```
pub mod prelude {
    pub use crate::choice::Choice;
    pub use crate::dcim::{
        Device, DeviceRole, DeviceStatus, DeviceType, Interface, InterfaceDuplex, InterfaceMode,
        InterfaceType, Location, MacAddress, Manufacturer, Platform, Region, Site, SiteStatus,
        VirtualDeviceContext, VirtualDeviceContextStatus,
    };
    pub use crate::extras::{CustomField, CustomFieldType, Tag};
    pub use crate::field::{Field, FieldValue, ObjRef};
    pub use crate::ipam::{
        AssignedObject, IpAddress, IpAddressRole, IpAddressStatus, Prefix, PrefixStatus, Vlan,
        VlanGroup, VlanStatus,
    };
    pub use crate::object::{Header, NetboxObject, OrphanCandidate, Resource};
    pub use crate::tenancy::{
        Contact, ContactAssignment, ContactGroup, ContactPriority, ContactRole, Tenant,
        TenantGroup,
    };
    pub use crate::virtualization::{
        Cluster, ClusterGroup, ClusterStatus, ClusterType, VirtualMachine, VmInterface, VmStatus,
    };
    pub use crate::wireless::{WirelessLan, WirelessLanGroup, WirelessLanStatus};
}
