//! In-memory inventory cache.
//!
//! [`Inventory`] holds every record of the remote inventory, indexed by a
//! domain key per type (a tenant by name, a device by name and site, a VLAN
//! by group and VID, ...). Sources write through idempotent upserts: a
//! record whose key is unknown is created, a known record is diffed against
//! the cached copy and patched only when something changed.
//!
//! Each type has its own lock, held across the REST call of an upsert, so
//! concurrent upserts of the same type are linearizable while different
//! types proceed in parallel. The orphan registry lock is always taken
//! after a type lock.

mod add;
mod keys;
mod load;

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use serde_json::{json, Value};
use ssot_client::NetboxClient;
use ssot_model::constants::{
    truncate, CF_ORPHAN_LAST_SEEN, CF_SOURCE, DEFAULT_IDENTITY_TAG, DEFAULT_IDENTITY_TAG_COLOR,
    MAX_DESCRIPTION_LEN, ORPHAN_TAG,
};
use ssot_model::prelude::*;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

use crate::context::SourceCtx;
use crate::diff::{diff, merge_maps};
use crate::error::{InventoryError, InventoryResult};
use crate::marshal::create_payload;
use crate::orphan::{OrphanManager, SweepOptions, SweepReport};
use crate::priority::SourcePriority;

/// Settings fixed for the lifetime of an [`Inventory`].
#[derive(Debug, Clone)]
pub struct InventoryConfig {
    /// Name of the tag marking records this engine owns.
    pub identity_tag: String,
    pub identity_tag_color: String,
    pub priority: SourcePriority,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            identity_tag: DEFAULT_IDENTITY_TAG.to_string(),
            identity_tag_color: DEFAULT_IDENTITY_TAG_COLOR.to_string(),
            priority: SourcePriority::default(),
        }
    }
}

/// A record type with a primary index in the cache.
pub trait Indexed: Resource {
    type Key: Eq + Hash + Clone + fmt::Debug + Send + Sync;

    /// Primary key of the record.
    fn index_key(&self) -> Self::Key;

    /// The cache index holding records of this type.
    fn index(inventory: &Inventory) -> &Index<Self>;

    /// Normalization applied to every observation before it is keyed and
    /// diffed (length clamping, canonical MAC form, ...).
    fn prepare(&mut self) {}
}

/// Lock-protected index of one record type.
pub struct Index<T: Indexed> {
    entries: Mutex<Entries<T>>,
}

impl<T: Indexed> Default for Index<T> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(Entries {
                by_key: HashMap::new(),
                by_id: HashMap::new(),
            }),
        }
    }
}

impl<T: Indexed> Index<T> {
    pub(crate) async fn lock(&self) -> MutexGuard<'_, Entries<T>> {
        self.entries.lock().await
    }

    pub(crate) async fn len(&self) -> usize {
        self.lock().await.by_key.len()
    }
}

pub(crate) struct Entries<T: Indexed> {
    by_key: HashMap<T::Key, Arc<T>>,
    by_id: HashMap<i64, Arc<T>>,
}

impl<T: Indexed> Entries<T> {
    pub(crate) fn get(&self, key: &T::Key) -> Option<&Arc<T>> {
        self.by_key.get(key)
    }

    pub(crate) fn by_id(&self, id: i64) -> Option<&Arc<T>> {
        self.by_id.get(&id)
    }

    pub(crate) fn insert(&mut self, key: T::Key, obj: Arc<T>) {
        if obj.id() != 0 {
            self.by_id.insert(obj.id(), Arc::clone(&obj));
        }
        self.by_key.insert(key, obj);
    }

    pub(crate) fn values(&self) -> impl Iterator<Item = &Arc<T>> {
        self.by_key.values()
    }
}

/// Record counts taken from the cache.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InventoryStats {
    /// Cached records per content type.
    pub objects: BTreeMap<&'static str, usize>,
    /// Owned records not yet observed this run.
    pub owned: usize,
}

impl InventoryStats {
    #[must_use]
    pub fn total(&self) -> usize {
        self.objects.values().sum()
    }
}

/// Cache of the remote inventory shared by every source of a run.
pub struct Inventory {
    client: NetboxClient,
    config: InventoryConfig,
    orphans: OrphanManager,
    identity_tag: Arc<Tag>,
    orphan_tag: Arc<Tag>,
    supports_mac_addresses: bool,

    tags: Index<Tag>,
    custom_fields: Index<CustomField>,

    tenant_groups: Index<TenantGroup>,
    tenants: Index<Tenant>,
    contact_groups: Index<ContactGroup>,
    contact_roles: Index<ContactRole>,
    contacts: Index<Contact>,
    contact_assignments: Index<ContactAssignment>,

    regions: Index<Region>,
    sites: Index<Site>,
    locations: Index<Location>,
    manufacturers: Index<Manufacturer>,
    platforms: Index<Platform>,
    device_roles: Index<DeviceRole>,
    device_types: Index<DeviceType>,
    devices: Index<Device>,
    virtual_device_contexts: Index<VirtualDeviceContext>,
    interfaces: Index<Interface>,
    mac_addresses: Index<MacAddress>,

    cluster_groups: Index<ClusterGroup>,
    cluster_types: Index<ClusterType>,
    clusters: Index<Cluster>,
    virtual_machines: Index<VirtualMachine>,
    vm_interfaces: Index<VmInterface>,

    prefixes: Index<Prefix>,
    vlan_groups: Index<VlanGroup>,
    vlans: Index<Vlan>,
    ip_addresses: Index<IpAddress>,

    wireless_lan_groups: Index<WirelessLanGroup>,
    wireless_lans: Index<WirelessLan>,
}

impl fmt::Debug for Inventory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Inventory")
            .field("base_url", &self.client.base_url())
            .field("identity_tag", &self.identity_tag.name)
            .field("owned", &self.orphans.len())
            .finish_non_exhaustive()
    }
}

impl Inventory {
    fn new(
        client: NetboxClient,
        config: InventoryConfig,
        identity_tag: Arc<Tag>,
        orphan_tag: Arc<Tag>,
        supports_mac_addresses: bool,
    ) -> Self {
        Self {
            orphans: OrphanManager::new(identity_tag.name.clone()),
            client,
            config,
            identity_tag,
            orphan_tag,
            supports_mac_addresses,
            tags: Index::default(),
            custom_fields: Index::default(),
            tenant_groups: Index::default(),
            tenants: Index::default(),
            contact_groups: Index::default(),
            contact_roles: Index::default(),
            contacts: Index::default(),
            contact_assignments: Index::default(),
            regions: Index::default(),
            sites: Index::default(),
            locations: Index::default(),
            manufacturers: Index::default(),
            platforms: Index::default(),
            device_roles: Index::default(),
            device_types: Index::default(),
            devices: Index::default(),
            virtual_device_contexts: Index::default(),
            interfaces: Index::default(),
            mac_addresses: Index::default(),
            cluster_groups: Index::default(),
            cluster_types: Index::default(),
            clusters: Index::default(),
            virtual_machines: Index::default(),
            vm_interfaces: Index::default(),
            prefixes: Index::default(),
            vlan_groups: Index::default(),
            vlans: Index::default(),
            ip_addresses: Index::default(),
            wireless_lan_groups: Index::default(),
            wireless_lans: Index::default(),
        }
    }

    // ── Accessors ─────────────────────────────────────────────────────

    #[must_use]
    pub fn identity_tag(&self) -> &Arc<Tag> {
        &self.identity_tag
    }

    #[must_use]
    pub fn orphan_tag(&self) -> &Arc<Tag> {
        &self.orphan_tag
    }

    #[must_use]
    pub fn orphans(&self) -> &OrphanManager {
        &self.orphans
    }

    #[must_use]
    pub fn priority(&self) -> &SourcePriority {
        &self.config.priority
    }

    /// Whether the server has first-class MAC address records.
    #[must_use]
    pub fn supports_mac_addresses(&self) -> bool {
        self.supports_mac_addresses
    }

    // ── Lookup ────────────────────────────────────────────────────────

    /// Look up a record by primary key. A hit counts as an observation.
    pub async fn get<T: Indexed>(&self, key: &T::Key) -> Option<Arc<T>> {
        let found = T::index(self).lock().await.get(key).cloned()?;
        self.orphans.observe(found.as_ref());
        Some(found)
    }

    /// Look up a record by id. A hit counts as an observation.
    pub async fn get_by_id<T: Indexed>(&self, id: i64) -> Option<Arc<T>> {
        let found = T::index(self).lock().await.by_id(id).cloned()?;
        self.orphans.observe(found.as_ref());
        Some(found)
    }

    /// Every cached record of a type, without observing any of them.
    pub async fn all<T: Indexed>(&self) -> Vec<Arc<T>> {
        T::index(self).lock().await.values().cloned().collect()
    }

    // ── Upsert ────────────────────────────────────────────────────────

    /// Stamp an observation with the engine's identity and the caller's
    /// name and tags.
    fn preprocess<T: Indexed>(&self, ctx: &SourceCtx, obj: &mut T) {
        obj.prepare();
        let header = obj.header_mut();
        header.add_tag(Arc::clone(&self.identity_tag));
        for tag in &ctx.tags {
            header.add_tag(Arc::clone(tag));
        }
        if !ctx.is_internal() && header.source_name().is_none() {
            header.set_custom_field(CF_SOURCE, ctx.name.as_str());
        }
        if header.description.chars().count() > MAX_DESCRIPTION_LEN {
            header.description = truncate(&header.description, MAX_DESCRIPTION_LEN);
        }
    }

    /// Create `new` or bring the cached record with the same key in line
    /// with it.
    ///
    /// Returns the cached record unchanged (the same `Arc`) when nothing
    /// differs; otherwise the created or patched record, which replaces the
    /// cache entry.
    pub(crate) async fn upsert<T: Indexed>(
        &self,
        ctx: &SourceCtx,
        mut new: T,
    ) -> InventoryResult<Arc<T>> {
        self.preprocess(ctx, &mut new);
        let key = new.index_key();
        let mut entries = T::index(self).lock().await;

        let Some(existing) = entries.get(&key).cloned() else {
            let created = self.create(&new).await?;
            entries.insert(key, Arc::clone(&created));
            return Ok(created);
        };

        self.orphans.observe(existing.as_ref());
        let mut delta = diff(&new, existing.as_ref(), false, &self.config.priority).map_err(
            |source| InventoryError::Diff {
                kind: T::CONTENT_TYPE,
                key: new.display_key(),
                source,
            },
        )?;

        let has_priority = self
            .config
            .priority
            .has_priority(new.header(), existing.header());
        let mut custom_fields = merge_maps(
            &new.header().custom_fields,
            &existing.header().custom_fields,
            has_priority,
        );
        if existing.header().has_tag(ORPHAN_TAG) {
            // Seen again: lift the orphan marking regardless of priority.
            let tags: BTreeSet<i64> = existing
                .header()
                .tags
                .iter()
                .chain(&new.header().tags)
                .filter(|t| t.name != ORPHAN_TAG && t.id() != self.orphan_tag.id())
                .map(|t| t.id())
                .collect();
            delta.insert("tags".to_string(), json!(tags));
            custom_fields.insert(CF_ORPHAN_LAST_SEEN.to_string(), Value::Null);
            delta.insert("custom_fields".to_string(), Value::Object(custom_fields.clone()));
        }

        let id = existing.id();
        if delta.is_empty() {
            debug!(kind = T::CONTENT_TYPE, key = %existing.display_key(), id, "Object unchanged");
            return Ok(existing);
        }
        delta
            .entry("custom_fields")
            .or_insert(Value::Object(custom_fields));

        let patched: T = self
            .client
            .patch(T::API_PATH, id, &delta)
            .await
            .map_err(|source| InventoryError::Client {
                kind: T::CONTENT_TYPE,
                key: existing.display_key(),
                source,
            })?;
        let patched = Arc::new(patched);
        entries.insert(key, Arc::clone(&patched));
        info!(
            kind = T::CONTENT_TYPE,
            key = %patched.display_key(),
            id,
            fields = ?delta.keys().collect::<Vec<_>>(),
            "Updated object"
        );
        Ok(patched)
    }

    async fn create<T: Indexed>(&self, new: &T) -> InventoryResult<Arc<T>> {
        let payload = create_payload(new);
        let created: T = self
            .client
            .create(T::API_PATH, &payload)
            .await
            .map_err(|source| InventoryError::Client {
                kind: T::CONTENT_TYPE,
                key: new.display_key(),
                source,
            })?;
        info!(
            kind = T::CONTENT_TYPE,
            key = %new.display_key(),
            id = created.id(),
            "Created object"
        );
        Ok(Arc::new(created))
    }

    // ── Run lifecycle ─────────────────────────────────────────────────

    /// Record counts per type and the number of still-unobserved owned
    /// records.
    pub async fn stats(&self) -> InventoryStats {
        let mut stats = InventoryStats {
            objects: BTreeMap::new(),
            owned: self.orphans.len(),
        };
        let counts = [
            (Tag::CONTENT_TYPE, self.tags.len().await),
            (CustomField::CONTENT_TYPE, self.custom_fields.len().await),
            (TenantGroup::CONTENT_TYPE, self.tenant_groups.len().await),
            (Tenant::CONTENT_TYPE, self.tenants.len().await),
            (ContactGroup::CONTENT_TYPE, self.contact_groups.len().await),
            (ContactRole::CONTENT_TYPE, self.contact_roles.len().await),
            (Contact::CONTENT_TYPE, self.contacts.len().await),
            (ContactAssignment::CONTENT_TYPE, self.contact_assignments.len().await),
            (Region::CONTENT_TYPE, self.regions.len().await),
            (Site::CONTENT_TYPE, self.sites.len().await),
            (Location::CONTENT_TYPE, self.locations.len().await),
            (Manufacturer::CONTENT_TYPE, self.manufacturers.len().await),
            (Platform::CONTENT_TYPE, self.platforms.len().await),
            (DeviceRole::CONTENT_TYPE, self.device_roles.len().await),
            (DeviceType::CONTENT_TYPE, self.device_types.len().await),
            (Device::CONTENT_TYPE, self.devices.len().await),
            (VirtualDeviceContext::CONTENT_TYPE, self.virtual_device_contexts.len().await),
            (Interface::CONTENT_TYPE, self.interfaces.len().await),
            (MacAddress::CONTENT_TYPE, self.mac_addresses.len().await),
            (ClusterGroup::CONTENT_TYPE, self.cluster_groups.len().await),
            (ClusterType::CONTENT_TYPE, self.cluster_types.len().await),
            (Cluster::CONTENT_TYPE, self.clusters.len().await),
            (VirtualMachine::CONTENT_TYPE, self.virtual_machines.len().await),
            (VmInterface::CONTENT_TYPE, self.vm_interfaces.len().await),
            (Prefix::CONTENT_TYPE, self.prefixes.len().await),
            (VlanGroup::CONTENT_TYPE, self.vlan_groups.len().await),
            (Vlan::CONTENT_TYPE, self.vlans.len().await),
            (IpAddress::CONTENT_TYPE, self.ip_addresses.len().await),
            (WirelessLanGroup::CONTENT_TYPE, self.wireless_lan_groups.len().await),
            (WirelessLan::CONTENT_TYPE, self.wireless_lans.len().await),
        ];
        stats
            .objects
            .extend(counts.into_iter().filter(|(_, count)| *count > 0));
        stats
    }

    /// Age out every owned record no source observed. Must only run once
    /// all sources have finished.
    pub async fn sweep(&self, options: &SweepOptions) -> SweepReport {
        self.orphans
            .sweep(&self.client, &self.orphan_tag, options)
            .await
    }
}
