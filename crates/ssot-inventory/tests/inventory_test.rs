//! End-to-end tests of the inventory cache against an in-memory fake API.

use std::sync::Arc;

use chrono::{Days, NaiveDate};
use serde_json::{json, Value};
use ssot_inventory::{
    Inventory, InventoryConfig, InventoryError, OrphanMode, SourceCtx, SourcePriority,
    SweepOptions,
};
use ssot_model::constants::{CF_ORPHAN_LAST_SEEN, CF_SOURCE, ORPHAN_TAG};
use ssot_model::prelude::*;
use ssot_test_support::FakeNetbox;

const TENANTS: &str = "/api/tenancy/tenants/";
const DEVICES: &str = "/api/dcim/devices/";
const SITES: &str = "/api/dcim/sites/";
const TAGS: &str = "/api/extras/tags/";
const VLANS: &str = "/api/ipam/vlans/";
const VLAN_GROUPS: &str = "/api/ipam/vlan-groups/";
const INTERFACES: &str = "/api/dcim/interfaces/";
const MACS: &str = "/api/dcim/mac-addresses/";
const IPS: &str = "/api/ipam/ip-addresses/";

async fn load(fake: &FakeNetbox) -> Inventory {
    load_with(fake, InventoryConfig::default()).await
}

async fn load_with(fake: &FakeNetbox, config: InventoryConfig) -> Inventory {
    let inventory = Inventory::load(fake.client(), config).await.unwrap();
    fake.clear_requests();
    inventory
}

fn src(name: &str) -> SourceCtx {
    SourceCtx::new(name, "static")
}

fn acme() -> Tenant {
    Tenant {
        name: "acme".into(),
        slug: "acme".into(),
        ..Default::default()
    }
}

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

// ── Warm-load ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_load_creates_engine_tags_and_custom_fields() {
    let fake = FakeNetbox::start().await;
    let inventory = Inventory::load(fake.client(), InventoryConfig::default())
        .await
        .unwrap();

    assert!(fake.tag_id("netbox-ssot").is_some());
    assert!(fake.tag_id(ORPHAN_TAG).is_some());
    let names: Vec<String> = fake
        .objects("/api/extras/custom-fields/")
        .iter()
        .map(|f| f["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, ["source", "source_id", "orphan_last_seen", "arp_entry"]);
    assert!(inventory.supports_mac_addresses());
    assert!(inventory.orphans().is_empty());
}

#[tokio::test]
async fn test_load_registers_only_owned_objects() {
    let fake = FakeNetbox::start().await;
    let identity = fake.seed_identity_tag();
    fake.seed(TENANTS, json!({"id": 7, "name": "acme", "slug": "acme", "tags": [identity]}));
    fake.seed(TENANTS, json!({"id": 8, "name": "manual", "slug": "manual", "tags": []}));

    let inventory = load(&fake).await;

    assert!(inventory.orphans().is_registered(TENANTS, 7));
    assert!(!inventory.orphans().is_registered(TENANTS, 8));
    assert_eq!(inventory.stats().await.objects.get("tenancy.tenant"), Some(&2));
}

#[tokio::test]
async fn test_load_fails_when_api_unreachable() {
    let fake = FakeNetbox::start().await;
    fake.fail("GET", "/api/status/", 503);

    let err = Inventory::load(fake.client(), InventoryConfig::default())
        .await
        .unwrap_err();
    assert!(matches!(err, InventoryError::Unreachable(_)));
    assert_eq!(err.status(), Some(503));
}

#[tokio::test]
async fn test_load_moves_owned_vlans_into_site_group() {
    let fake = FakeNetbox::start().await;
    let identity = fake.seed_identity_tag();
    fake.seed(SITES, json!({"id": 10, "name": "NYC", "slug": "nyc", "tags": [identity]}));
    fake.seed(VLANS, json!({"id": 30, "name": "v30", "vid": 30, "site": 10, "tags": [identity]}));

    let inventory = load(&fake).await;

    let group = inventory.get_vlan_group("NYC VLAN group").await.unwrap();
    assert_eq!(group.scope_id, Some(10));
    assert_eq!(fake.object(VLANS, 30).unwrap()["group"]["id"], json!(group.id()));
    assert!(inventory.get_vlan(group.id(), 30).await.is_some());
}

#[tokio::test]
async fn test_load_keeps_unknown_choice_values() {
    let fake = FakeNetbox::start().await;
    let identity = fake.seed_identity_tag();
    fake.seed(DEVICES, json!({"id": 20, "name": "n1"}));
    fake.seed(
        INTERFACES,
        json!({
            "id": 40, "name": "eth0", "device": 20,
            "type": {"value": "25gbase-t", "label": "25GBASE-T"},
            "tags": [identity], "custom_fields": {"source": "srcA"},
        }),
    );

    let inventory = load(&fake).await;

    let iface = inventory.get_interface(20, "eth0").await.unwrap();
    assert_eq!(iface.interface_type, Some(InterfaceType::Unrecognized("25gbase-t")));
    inventory
        .add_interface(&src("srcA"), (*iface).clone())
        .await
        .unwrap();
    assert!(fake.writes().is_empty());
}

#[tokio::test]
async fn test_load_moves_unowned_dangling_vlans_into_default_group() {
    let fake = FakeNetbox::start().await;
    fake.seed_identity_tag();
    fake.seed(VLANS, json!({"id": 31, "name": "v10", "vid": 10, "tags": []}));

    let inventory = load(&fake).await;

    let group = inventory.get_vlan_group("Default VLAN group").await.unwrap();
    assert_eq!(fake.object(VLANS, 31).unwrap()["group"]["id"], json!(group.id()));
    assert!(!inventory.orphans().is_registered(VLANS, 31));

    let stored = inventory.add_vlan(&src("srcA"), vlan("v10", "srcA")).await.unwrap();
    assert_eq!(stored.id(), 31);
    assert!(fake
        .writes_to(VLANS)
        .iter()
        .all(|w| w.method != "POST"));
}

// ── Upserts ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_create_path() {
    let fake = FakeNetbox::start().await;
    let identity = fake.seed_identity_tag();
    let inventory = load(&fake).await;

    let tenant = inventory.add_tenant(&src("srcA"), acme()).await.unwrap();

    let writes = fake.writes();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].method, "POST");
    assert_eq!(writes[0].path, TENANTS);
    assert_eq!(
        writes[0].body,
        Some(json!({
            "name": "acme",
            "slug": "acme",
            "tags": [identity],
            "custom_fields": {"source": "srcA"},
        }))
    );
    assert_ne!(tenant.id(), 0);
    assert_eq!(inventory.get_tenant("acme").await.unwrap().id(), tenant.id());
}

#[tokio::test]
async fn test_idempotent_noop() {
    let fake = FakeNetbox::start().await;
    let identity = fake.seed_identity_tag();
    fake.seed(
        TENANTS,
        json!({
            "id": 7, "name": "acme", "slug": "acme",
            "tags": [identity], "custom_fields": {"source": "srcA"},
        }),
    );
    let inventory = load(&fake).await;

    let first = inventory.add_tenant(&src("srcA"), acme()).await.unwrap();
    let second = inventory.add_tenant(&src("srcA"), acme()).await.unwrap();

    assert!(fake.writes().is_empty());
    assert_eq!(first.id(), 7);
    assert!(Arc::ptr_eq(&first, &second));
    assert!(!inventory.orphans().is_registered(TENANTS, 7));
}

#[tokio::test]
async fn test_repeated_create_is_idempotent() {
    let fake = FakeNetbox::start().await;
    fake.seed_identity_tag();
    let inventory = load(&fake).await;

    let first = inventory.add_tenant(&src("srcA"), acme()).await.unwrap();
    let second = inventory.add_tenant(&src("srcA"), acme()).await.unwrap();

    assert_eq!(fake.writes().len(), 1);
    assert!(Arc::ptr_eq(&first, &second));
}

#[tokio::test]
async fn test_patch_path() {
    let fake = FakeNetbox::start().await;
    let identity = fake.seed_identity_tag();
    fake.seed(
        DEVICES,
        json!({
            "id": 11, "name": "n1", "serial": "OLD",
            "tags": [identity], "custom_fields": {"source": "srcA"},
        }),
    );
    let inventory = load(&fake).await;

    let device = Device {
        name: "n1".into(),
        serial: "NEW".into(),
        ..Default::default()
    };
    let patched = inventory.add_device(&src("srcA"), device).await.unwrap();

    let writes = fake.writes();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].method, "PATCH");
    assert_eq!(writes[0].path, "/api/dcim/devices/11/");
    assert_eq!(
        writes[0].body,
        Some(json!({"serial": "NEW", "custom_fields": {"source": "srcA"}}))
    );
    assert_eq!(patched.serial, "NEW");
    assert_eq!(inventory.get_device("n1", 0).await.unwrap().serial, "NEW");
}

#[tokio::test]
async fn test_concurrent_upserts_create_once() {
    let fake = FakeNetbox::start().await;
    fake.seed_identity_tag();
    let inventory = load(&fake).await;

    let ctx = src("srcA");
    let (a, b) = tokio::join!(
        inventory.add_tenant(&ctx, acme()),
        inventory.add_tenant(&ctx, acme()),
    );

    assert_eq!(a.unwrap().id(), b.unwrap().id());
    assert_eq!(fake.writes_to(TENANTS).len(), 1);
}

#[tokio::test]
async fn test_failed_create_names_the_object() {
    let fake = FakeNetbox::start().await;
    fake.seed_identity_tag();
    let inventory = load(&fake).await;
    fake.fail("POST", TENANTS, 500);

    let err = inventory.add_tenant(&src("srcA"), acme()).await.unwrap_err();

    assert_eq!(err.status(), Some(500));
    assert!(err.to_string().contains("tenancy.tenant acme"));
    assert!(inventory.get_tenant("acme").await.is_none());
}

// ── Priority and merge ────────────────────────────────────────────────

fn prioritized() -> InventoryConfig {
    InventoryConfig {
        priority: SourcePriority::from_order(&["srcA", "srcB"]),
        ..Default::default()
    }
}

fn vlan(name: &str, source: &str) -> Vlan {
    let mut vlan = Vlan {
        name: name.into(),
        vid: 10,
        ..Default::default()
    };
    vlan.header.set_custom_field(CF_SOURCE, source);
    vlan
}

#[tokio::test]
async fn test_higher_priority_source_overwrites() {
    let fake = FakeNetbox::start().await;
    fake.seed_identity_tag();
    let inventory = load_with(&fake, prioritized()).await;

    let first = inventory.add_vlan(&src("srcB"), vlan("Vlan10", "srcB")).await.unwrap();
    let second = inventory.add_vlan(&src("srcA"), vlan("Ten", "srcA")).await.unwrap();

    assert_eq!(first.id(), second.id());
    let stored = fake.object(VLANS, first.id()).unwrap();
    assert_eq!(stored["name"], "Ten");
    assert_eq!(stored["custom_fields"][CF_SOURCE], "srcA");
}

#[tokio::test]
async fn test_lower_priority_source_does_not_overwrite() {
    let fake = FakeNetbox::start().await;
    fake.seed_identity_tag();
    let inventory = load_with(&fake, prioritized()).await;

    let first = inventory.add_vlan(&src("srcA"), vlan("Ten", "srcA")).await.unwrap();
    fake.clear_requests();
    let second = inventory.add_vlan(&src("srcB"), vlan("Vlan10", "srcB")).await.unwrap();

    assert!(fake.writes_to(VLANS).is_empty());
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(fake.object(VLANS, first.id()).unwrap()["name"], "Ten");
}

#[tokio::test]
async fn test_custom_fields_merge_without_reset() {
    let fake = FakeNetbox::start().await;
    fake.seed_identity_tag();
    let inventory = load(&fake).await;

    let mut first = acme();
    first.header.set_custom_field("a", 1);
    let created = inventory.add_tenant(&src("srcA"), first).await.unwrap();
    let mut second = acme();
    second.header.set_custom_field("b", 2);
    inventory.add_tenant(&src("srcA"), second).await.unwrap();

    let stored = fake.object(TENANTS, created.id()).unwrap();
    assert_eq!(
        stored["custom_fields"],
        json!({"a": 1, "b": 2, "source": "srcA"})
    );
}

// ── Special handlers ──────────────────────────────────────────────────

#[tokio::test]
async fn test_vlan_without_group_uses_default_group() {
    let fake = FakeNetbox::start().await;
    fake.seed_identity_tag();
    let inventory = load(&fake).await;

    let vlan = inventory.add_vlan(&src("srcA"), vlan("v10", "srcA")).await.unwrap();

    let group = inventory.get_vlan_group("Default VLAN group").await.unwrap();
    assert_eq!(vlan.group_id(), group.id());
    assert_eq!(group.slug, "default_vlan_group");
    let posted = &fake.writes_to(VLAN_GROUPS)[0];
    assert_eq!(posted.body.as_ref().unwrap()["vid_ranges"], json!([[1, 4094]]));
    assert!(posted.body.as_ref().unwrap().get("custom_fields").is_none());
}

#[tokio::test]
async fn test_vlan_outside_group_range_is_rejected() {
    let fake = FakeNetbox::start().await;
    fake.seed_identity_tag();
    let inventory = load(&fake).await;
    let group = inventory
        .add_vlan_group(
            &src("srcA"),
            VlanGroup {
                name: "narrow".into(),
                slug: "narrow".into(),
                vid_ranges: vec![[100, 200]],
                ..Default::default()
            },
        )
        .await
        .unwrap();
    fake.clear_requests();

    let mut vlan = vlan("v10", "srcA");
    vlan.group = Some(group);
    let err = inventory.add_vlan(&src("srcA"), vlan).await.unwrap_err();

    assert!(matches!(err, InventoryError::Invalid { .. }));
    assert!(fake.writes().is_empty());
}

#[tokio::test]
async fn test_interface_mac_is_written_in_three_steps() {
    let fake = FakeNetbox::start().await;
    let identity = fake.seed_identity_tag();
    fake.seed(DEVICES, json!({"id": 20, "name": "n1", "tags": [identity]}));
    let inventory = load(&fake).await;
    let device = inventory.get_device("n1", 0).await.unwrap();

    let iface = Interface {
        device: Some(device),
        name: "eth0".into(),
        mac_address: Some("aa-bb-cc-00-11-22".into()),
        ..Default::default()
    };
    let stored = inventory.add_interface(&src("srcA"), iface.clone()).await.unwrap();

    let writes = fake.writes();
    let methods: Vec<(&str, &str)> = writes
        .iter()
        .map(|w| (w.method.as_str(), w.path.as_str()))
        .collect();
    let iface_path = format!("{INTERFACES}{}/", stored.id());
    assert_eq!(
        methods,
        [("POST", INTERFACES), ("POST", MACS), ("PATCH", iface_path.as_str())]
    );
    let mac_body = writes[1].body.as_ref().unwrap();
    assert_eq!(mac_body["mac_address"], "AA:BB:CC:00:11:22");
    assert_eq!(mac_body["assigned_object_type"], "dcim.interface");
    assert_eq!(mac_body["assigned_object_id"], json!(stored.id()));
    let mac = inventory.get_mac_address("AA:BB:CC:00:11:22").await.unwrap();
    assert_eq!(
        writes[2].body.as_ref().unwrap()["primary_mac_address"],
        json!({"id": mac.id()})
    );

    fake.clear_requests();
    inventory.add_interface(&src("srcA"), iface).await.unwrap();
    assert!(fake.writes().is_empty());
}

#[tokio::test]
async fn test_interface_mac_is_a_plain_field_on_old_servers() {
    let fake = FakeNetbox::start_with_version("4.1.3").await;
    let identity = fake.seed_identity_tag();
    fake.seed(DEVICES, json!({"id": 20, "name": "n1", "tags": [identity]}));
    let inventory = load(&fake).await;
    let device = inventory.get_device("n1", 0).await.unwrap();

    let iface = Interface {
        device: Some(device),
        name: "eth0".into(),
        mac_address: Some("aa:bb:cc:00:11:22".into()),
        ..Default::default()
    };
    let stored = inventory.add_interface(&src("srcA"), iface.clone()).await.unwrap();

    assert!(!inventory.supports_mac_addresses());
    assert!(fake.writes_to(MACS).is_empty());
    let posted = fake.writes_to(INTERFACES);
    assert_eq!(posted.len(), 1);
    assert_eq!(posted[0].body.as_ref().unwrap()["mac_address"], "AA:BB:CC:00:11:22");
    assert_eq!(stored.mac_address.as_deref(), Some("AA:BB:CC:00:11:22"));

    fake.clear_requests();
    inventory.add_interface(&src("srcA"), iface).await.unwrap();
    assert!(fake.writes().is_empty());
}

#[tokio::test]
async fn test_ip_with_unknown_interface_drops_assignment() {
    let fake = FakeNetbox::start().await;
    fake.seed_identity_tag();
    let inventory = load(&fake).await;

    let mut ip = IpAddress {
        address: "10.0.0.5/24".into(),
        ..Default::default()
    };
    ip.assign(AssignedObject::Interface(999));
    inventory.add_ip_address(&src("srcA"), ip).await.unwrap();

    let body = fake.writes_to(IPS)[0].body.clone().unwrap();
    assert!(body.get("assigned_object_type").is_none());
    assert!(body.get("assigned_object_id").is_none());
}

#[tokio::test]
async fn test_ip_held_by_higher_priority_source_is_kept() {
    let fake = FakeNetbox::start().await;
    let identity = fake.seed_identity_tag();
    fake.seed(
        IPS,
        json!({
            "id": 40, "address": "10.0.0.5/24", "dns_name": "a.example.com",
            "tags": [identity], "custom_fields": {"source": "srcA"},
        }),
    );
    let inventory = load_with(&fake, prioritized()).await;

    let mut ip = IpAddress {
        address: "10.0.0.5/24".into(),
        dns_name: "b.example.com".into(),
        ..Default::default()
    };
    ip.header.set_custom_field(CF_SOURCE, "srcB");
    let kept = inventory.add_ip_address(&src("srcB"), ip).await.unwrap();

    assert!(fake.writes().is_empty());
    assert_eq!(kept.dns_name, "a.example.com");
    assert!(!inventory.orphans().is_registered(IPS, 40));
}

#[tokio::test]
async fn test_source_tags() {
    let fake = FakeNetbox::start().await;
    fake.seed_identity_tag();
    let inventory = load(&fake).await;

    let tags = inventory
        .add_source_tags(&src("srcA"), None, "aa1409", "2196f3")
        .await
        .unwrap();

    let names: Vec<&str> = tags.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, ["Source: srcA", "Type: static"]);
    assert_eq!(tags[0].slug, "source_srca");
    assert_eq!(fake.writes_to(TAGS).len(), 2);

    let ctx = src("srcA").with_tags(tags.clone());
    let tenant = inventory.add_tenant(&ctx, acme()).await.unwrap();
    let tag_ids: Vec<i64> = tenant.header.tags.iter().map(|t| t.id()).collect();
    assert!(tag_ids.contains(&tags[0].id()));
    assert!(tag_ids.contains(&tags[1].id()));
}

// ── Orphans ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_orphan_soft_then_hard() {
    let fake = FakeNetbox::start().await;
    let identity = fake.seed_identity_tag();
    fake.seed(TAGS, json!({"id": 3, "name": "stale", "slug": "stale", "tags": [identity]}));
    let today = date("2026-03-01");

    let run1 = load(&fake).await;
    let report = run1
        .sweep(&SweepOptions {
            mode: OrphanMode::Soft,
            retain_days: 5,
            today,
        })
        .await;

    assert_eq!(report.soft_deleted, 1);
    let orphan_tag = fake.tag_id(ORPHAN_TAG).unwrap();
    let writes = fake.writes();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].method, "PATCH");
    assert_eq!(writes[0].path, "/api/extras/tags/3/");
    let body = writes[0].body.clone().unwrap();
    assert_eq!(body["tags"], json!([identity, orphan_tag]));
    assert_eq!(body["custom_fields"][CF_ORPHAN_LAST_SEEN], "2026-03-01");

    let run2 = load(&fake).await;
    let report = run2
        .sweep(&SweepOptions {
            mode: OrphanMode::Soft,
            retain_days: 5,
            today: today.checked_add_days(Days::new(6)).unwrap(),
        })
        .await;

    assert_eq!(report.hard_deleted, 1);
    let writes = fake.writes();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].method, "DELETE");
    assert_eq!(writes[0].path, "/api/extras/tags/3/");
    assert!(fake.object(TAGS, 3).is_none());
}

#[tokio::test]
async fn test_orphan_kept_within_retention() {
    let fake = FakeNetbox::start().await;
    let identity = fake.seed_identity_tag();
    fake.seed(TAGS, json!({"id": 2, "name": ORPHAN_TAG, "slug": "netbox-ssot-orphan"}));
    fake.seed(
        TENANTS,
        json!({
            "id": 7, "name": "acme", "slug": "acme", "tags": [identity, 2],
            "custom_fields": {"source": "srcA", "orphan_last_seen": "2026-03-01"},
        }),
    );
    let inventory = load(&fake).await;

    let report = inventory
        .sweep(&SweepOptions {
            mode: OrphanMode::Soft,
            retain_days: 5,
            today: date("2026-03-06"),
        })
        .await;

    assert_eq!(report, Default::default());
    assert!(fake.writes().is_empty());
}

#[tokio::test]
async fn test_reobserved_orphan_is_unmarked() {
    let fake = FakeNetbox::start().await;
    let identity = fake.seed_identity_tag();
    fake.seed(TAGS, json!({"id": 2, "name": ORPHAN_TAG, "slug": "netbox-ssot-orphan"}));
    fake.seed(
        TENANTS,
        json!({
            "id": 7, "name": "acme", "slug": "acme", "tags": [identity, 2],
            "custom_fields": {"source": "srcA", "orphan_last_seen": "2026-03-01"},
        }),
    );
    let inventory = load(&fake).await;

    inventory.add_tenant(&src("srcA"), acme()).await.unwrap();

    let writes = fake.writes();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].path, "/api/tenancy/tenants/7/");
    assert_eq!(
        writes[0].body,
        Some(json!({
            "tags": [identity],
            "custom_fields": {"source": "srcA", "orphan_last_seen": null},
        }))
    );
    let stored = fake.object(TENANTS, 7).unwrap();
    assert_eq!(stored["custom_fields"][CF_ORPHAN_LAST_SEEN], Value::Null);
}

#[tokio::test]
async fn test_hard_sweep_deletes_dependents_first() {
    let fake = FakeNetbox::start().await;
    let identity = fake.seed_identity_tag();
    fake.seed(SITES, json!({"id": 10, "name": "NYC", "slug": "nyc", "tags": [identity]}));
    fake.seed(DEVICES, json!({"id": 11, "name": "n1", "site": 10, "tags": [identity]}));
    fake.seed(DEVICES, json!({"id": 12, "name": "n2", "site": 10, "tags": [identity]}));
    let inventory = load(&fake).await;

    let report = inventory
        .sweep(&SweepOptions::new(OrphanMode::Hard, 5))
        .await;

    assert_eq!(report.hard_deleted, 3);
    let writes = fake.writes();
    assert_eq!(writes.len(), 2);
    assert_eq!(writes[0].path, DEVICES);
    assert_eq!(writes[0].body, Some(json!([{"id": 11}, {"id": 12}])));
    assert_eq!(writes[1].path, SITES);
    assert!(inventory.orphans().is_empty());
}

#[tokio::test]
async fn test_sweep_skips_observed_objects() {
    let fake = FakeNetbox::start().await;
    let identity = fake.seed_identity_tag();
    fake.seed(SITES, json!({"id": 10, "name": "NYC", "slug": "nyc", "tags": [identity]}));
    fake.seed(DEVICES, json!({"id": 11, "name": "n1", "site": 10, "tags": [identity]}));
    let inventory = load(&fake).await;

    inventory.get_site("NYC").await.unwrap();
    let report = inventory
        .sweep(&SweepOptions::new(OrphanMode::Hard, 5))
        .await;

    assert_eq!(report.hard_deleted, 1);
    assert_eq!(fake.writes_to(DEVICES).len(), 1);
    assert!(fake.writes_to(SITES).is_empty());
}

#[tokio::test]
async fn test_delete_deferred_while_referrer_survives() {
    let fake = FakeNetbox::start().await;
    let identity = fake.seed_identity_tag();
    fake.seed(SITES, json!({"id": 10, "name": "NYC", "slug": "nyc", "tags": [identity]}));
    fake.seed(DEVICES, json!({"id": 11, "name": "n1", "site": 10, "tags": [identity]}));
    let inventory = load(&fake).await;
    fake.fail("DELETE", DEVICES, 409);

    let report = inventory
        .sweep(&SweepOptions::new(OrphanMode::Hard, 5))
        .await;

    assert_eq!(report.failed, 1);
    assert_eq!(report.deferred, 1);
    assert!(fake.writes_to(SITES).is_empty());
    assert!(fake.object(SITES, 10).is_some());
}
