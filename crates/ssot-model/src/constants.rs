//! Engine-wide names and API limits.

/// Default name of the tag attached to every record the engine authors.
pub const DEFAULT_IDENTITY_TAG: &str = "netbox-ssot";
pub const DEFAULT_IDENTITY_TAG_COLOR: &str = "00add8";

/// Tag attached to owned records that were not observed by any source.
pub const ORPHAN_TAG: &str = "netbox-ssot-orphan";
pub const ORPHAN_TAG_COLOR: &str = "9e9e9e";

/// Prefix of the per-source tag name (`Source: <name>`).
pub const SOURCE_TAG_PREFIX: &str = "Source: ";
/// Prefix of the per-source-type tag name (`Type: <type>`).
pub const SOURCE_TYPE_TAG_PREFIX: &str = "Type: ";

// Engine custom fields.
pub const CF_SOURCE: &str = "source";
pub const CF_SOURCE_ID: &str = "source_id";
pub const CF_ORPHAN_LAST_SEEN: &str = "orphan_last_seen";
pub const CF_ARP_ENTRY: &str = "arp_entry";

/// Date format of `orphan_last_seen`.
pub const ORPHAN_DATE_FORMAT: &str = "%Y-%m-%d";

// Hard length limits enforced by the inventory API.
pub const MAX_DEVICE_NAME_LEN: usize = 64;
pub const MAX_SERIAL_LEN: usize = 50;
pub const MAX_ASSET_TAG_LEN: usize = 50;
pub const MAX_VM_NAME_LEN: usize = 64;
pub const MAX_INTERFACE_NAME_LEN: usize = 64;
pub const MAX_DESCRIPTION_LEN: usize = 200;

// VLAN id bounds covered by the synthesized default VLAN groups.
pub const DEFAULT_VID: u16 = 1;
pub const MAX_VID: u16 = 4094;

/// Name of the global default VLAN group.
pub const DEFAULT_VLAN_GROUP_NAME: &str = "Default VLAN group";

/// Name of the default VLAN group scoped to a site.
#[must_use]
pub fn site_vlan_group_name(site: &str) -> String {
    format!("{site} VLAN group")
}

/// Truncate `value` to at most `max` characters, on a char boundary.
#[must_use]
pub fn truncate(value: &str, max: usize) -> String {
    value.chars().take(max).collect()
}
