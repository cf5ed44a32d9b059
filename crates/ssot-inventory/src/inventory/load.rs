//! Warm-load of the cache from the remote inventory.

use std::sync::Arc;

use serde_json::{json, Map, Value};
use ssot_client::NetboxClient;
use ssot_model::constants::{
    CF_ARP_ENTRY, CF_ORPHAN_LAST_SEEN, CF_SOURCE, CF_SOURCE_ID, ORPHAN_TAG, ORPHAN_TAG_COLOR,
};
use ssot_model::extras::CustomFieldFilterLogic;
use ssot_model::prelude::*;
use ssot_model::slug::slugify;
use tracing::{debug, info, warn};

use super::{Entries, Indexed, Inventory, InventoryConfig};
use crate::error::{InventoryError, InventoryResult};
use crate::marshal::create_payload;

/// Content types the engine stamps with its custom fields.
const STAMPED_CONTENT_TYPES: &[&str] = &[
    TenantGroup::CONTENT_TYPE,
    Tenant::CONTENT_TYPE,
    ContactGroup::CONTENT_TYPE,
    ContactRole::CONTENT_TYPE,
    Contact::CONTENT_TYPE,
    ContactAssignment::CONTENT_TYPE,
    Region::CONTENT_TYPE,
    Site::CONTENT_TYPE,
    Location::CONTENT_TYPE,
    Manufacturer::CONTENT_TYPE,
    Platform::CONTENT_TYPE,
    DeviceRole::CONTENT_TYPE,
    DeviceType::CONTENT_TYPE,
    Device::CONTENT_TYPE,
    VirtualDeviceContext::CONTENT_TYPE,
    Interface::CONTENT_TYPE,
    MacAddress::CONTENT_TYPE,
    ClusterGroup::CONTENT_TYPE,
    ClusterType::CONTENT_TYPE,
    Cluster::CONTENT_TYPE,
    VirtualMachine::CONTENT_TYPE,
    VmInterface::CONTENT_TYPE,
    Prefix::CONTENT_TYPE,
    VlanGroup::CONTENT_TYPE,
    Vlan::CONTENT_TYPE,
    IpAddress::CONTENT_TYPE,
    WirelessLanGroup::CONTENT_TYPE,
    WirelessLan::CONTENT_TYPE,
];

impl Inventory {
    /// Connect to the inventory API and load every collection.
    ///
    /// Makes sure the identity and orphan tags and the engine custom fields
    /// exist, creating them when absent. Every loaded record carrying the
    /// identity tag is registered as owned.
    pub async fn load(client: NetboxClient, config: InventoryConfig) -> InventoryResult<Self> {
        let status = client.status().await.map_err(InventoryError::Unreachable)?;
        let supports_mac_addresses = status.supports_mac_addresses();
        info!(
            url = client.base_url(),
            version = %status.netbox_version,
            mac_addresses = supports_mac_addresses,
            "Connected to inventory API"
        );

        let tags: Vec<Tag> = list(&client).await?;
        let identity_tag = ensure_tag(
            &client,
            &tags,
            &config.identity_tag,
            &config.identity_tag_color,
            "Objects managed by netbox-ssot",
        )
        .await?;
        let orphan_tag = ensure_tag(
            &client,
            &tags,
            ORPHAN_TAG,
            ORPHAN_TAG_COLOR,
            "Objects no longer reported by any source",
        )
        .await?;

        let inventory = Self::new(
            client,
            config,
            identity_tag,
            orphan_tag,
            supports_mac_addresses,
        );
        inventory.load_tags(tags).await;
        inventory.load_custom_fields().await?;

        inventory.load_all::<TenantGroup>().await?;
        inventory.load_all::<Tenant>().await?;
        inventory.load_all::<ContactGroup>().await?;
        inventory.load_all::<ContactRole>().await?;
        inventory.load_all::<Contact>().await?;
        inventory.load_all::<Region>().await?;
        inventory.load_all::<Site>().await?;
        inventory.load_all::<Location>().await?;
        inventory.load_all::<Manufacturer>().await?;
        inventory.load_all::<Platform>().await?;
        inventory.load_all::<DeviceRole>().await?;
        inventory.load_all::<DeviceType>().await?;
        inventory.load_all::<ClusterGroup>().await?;
        inventory.load_all::<ClusterType>().await?;
        inventory.load_all::<Cluster>().await?;
        inventory.load_all::<Device>().await?;
        inventory.load_all::<VirtualDeviceContext>().await?;
        inventory.load_all::<VirtualMachine>().await?;
        inventory.load_all::<VlanGroup>().await?;
        inventory.load_vlans().await?;
        inventory.load_all::<Interface>().await?;
        inventory.load_all::<VmInterface>().await?;
        if inventory.supports_mac_addresses {
            inventory.load_all::<MacAddress>().await?;
        }
        inventory.load_all::<Prefix>().await?;
        inventory.load_all::<IpAddress>().await?;
        inventory.load_all::<WirelessLanGroup>().await?;
        inventory.load_all::<WirelessLan>().await?;
        inventory.load_all::<ContactAssignment>().await?;

        let stats = inventory.stats().await;
        info!(
            objects = stats.total(),
            owned = stats.owned,
            "Inventory loaded"
        );
        debug!(counts = ?stats.objects, "Inventory contents");
        Ok(inventory)
    }

    fn index_loaded<T: Indexed + OrphanCandidate>(&self, entries: &mut Entries<T>, obj: T) {
        let obj = Arc::new(obj);
        self.orphans.register(Arc::clone(&obj));
        entries.insert(obj.index_key(), obj);
    }

    async fn load_all<T: Indexed + OrphanCandidate>(&self) -> InventoryResult<()> {
        let objs: Vec<T> = list(&self.client).await?;
        let count = objs.len();
        let mut entries = T::index(self).lock().await;
        for obj in objs {
            self.index_loaded(&mut entries, obj);
        }
        debug!(path = T::API_PATH, count, "Loaded collection");
        Ok(())
    }

    /// The engine's own tags are indexed but never owned.
    async fn load_tags(&self, tags: Vec<Tag>) {
        let mut entries = self.tags.lock().await;
        for tag in [&self.identity_tag, &self.orphan_tag] {
            entries.insert(tag.name.clone(), Arc::clone(tag));
        }
        for tag in tags {
            if tag.name == self.identity_tag.name || tag.name == self.orphan_tag.name {
                continue;
            }
            self.index_loaded(&mut entries, tag);
        }
    }

    async fn load_custom_fields(&self) -> InventoryResult<()> {
        let fields: Vec<CustomField> = list(&self.client).await?;
        let mut entries = self.custom_fields.lock().await;
        for field in fields {
            entries.insert(field.name.clone(), Arc::new(field));
        }
        for field in engine_custom_fields() {
            if entries.get(&field.name).is_some() {
                continue;
            }
            let created: CustomField = self
                .client
                .create(CustomField::API_PATH, &create_payload(&field))
                .await
                .map_err(|source| InventoryError::Client {
                    kind: CustomField::CONTENT_TYPE,
                    key: field.name.clone(),
                    source,
                })?;
            info!(name = %created.name, id = created.id(), "Created custom field");
            entries.insert(created.name.clone(), Arc::new(created));
        }
        Ok(())
    }

    /// VLANs without a group are moved into the default group of their site
    /// so they are keyed the same way new observations are. If the move
    /// fails the VLAN is still indexed under that group, so an observation
    /// of the same VID finds it instead of creating a second one.
    async fn load_vlans(&self) -> InventoryResult<()> {
        let vlans: Vec<Vlan> = list(&self.client).await?;
        let mut loaded = Vec::with_capacity(vlans.len());
        for mut vlan in vlans {
            if vlan.group.is_some() {
                loaded.push(vlan);
                continue;
            }
            let group = self.default_vlan_group(vlan.site.as_ref()).await?;
            let mut body = Map::new();
            body.insert("group".to_string(), json!({ "id": group.id() }));
            match self
                .client
                .patch::<Vlan>(Vlan::API_PATH, vlan.id(), &body)
                .await
            {
                Ok(patched) => {
                    info!(key = %patched.display_key(), id = patched.id(), "Moved VLAN into default group");
                    loaded.push(patched);
                }
                Err(error) => {
                    warn!(key = %vlan.display_key(), id = vlan.id(), %error, "Failed to move VLAN into default group");
                    vlan.group = Some(group);
                    loaded.push(vlan);
                }
            }
        }

        let count = loaded.len();
        let mut entries = self.vlans.lock().await;
        for vlan in loaded {
            self.index_loaded(&mut entries, vlan);
        }
        debug!(path = Vlan::API_PATH, count, "Loaded collection");
        Ok(())
    }
}

async fn list<T: Resource>(client: &NetboxClient) -> InventoryResult<Vec<T>> {
    client
        .list_all(T::API_PATH, &[])
        .await
        .map_err(|source| InventoryError::Load {
            path: T::API_PATH,
            source,
        })
}

async fn ensure_tag(
    client: &NetboxClient,
    tags: &[Tag],
    name: &str,
    color: &str,
    description: &str,
) -> InventoryResult<Arc<Tag>> {
    if let Some(tag) = tags.iter().find(|t| t.name == name) {
        return Ok(Arc::new(tag.clone()));
    }
    let tag = Tag {
        header: Header {
            description: description.to_string(),
            ..Default::default()
        },
        name: name.to_string(),
        slug: slugify(name),
        color: color.to_string(),
    };
    let created: Tag = client
        .create(Tag::API_PATH, &create_payload(&tag))
        .await
        .map_err(|source| InventoryError::Client {
            kind: Tag::CONTENT_TYPE,
            key: name.to_string(),
            source,
        })?;
    info!(name, id = created.id(), "Created tag");
    Ok(Arc::new(created))
}

fn engine_custom_fields() -> Vec<CustomField> {
    let object_types: Vec<String> = STAMPED_CONTENT_TYPES
        .iter()
        .map(ToString::to_string)
        .collect();
    let field = |name: &str, label: &str, field_type: CustomFieldType, description: &str| CustomField {
        header: Header {
            description: description.to_string(),
            ..Default::default()
        },
        name: name.to_string(),
        label: label.to_string(),
        field_type: Some(field_type),
        object_types: object_types.clone(),
        weight: Some(100),
        filter_logic: Some(CustomFieldFilterLogic::Loose),
        default: (field_type == CustomFieldType::Boolean).then_some(Value::Bool(false)),
        ..Default::default()
    };
    vec![
        field(
            CF_SOURCE,
            "Source",
            CustomFieldType::Text,
            "Name of the source that last wrote this object",
        ),
        field(
            CF_SOURCE_ID,
            "Source ID",
            CustomFieldType::Text,
            "Identifier of this object in its source",
        ),
        field(
            CF_ORPHAN_LAST_SEEN,
            "Orphan last seen",
            CustomFieldType::Date,
            "Date this object was first missing from every source",
        ),
        field(
            CF_ARP_ENTRY,
            "ARP entry",
            CustomFieldType::Boolean,
            "Address learned only from an ARP table",
        ),
    ]
}
