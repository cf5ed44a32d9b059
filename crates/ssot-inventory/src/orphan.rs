//! Ownership registry and orphan sweep.
//!
//! Every record loaded with the identity tag is registered as owned. Each
//! upsert or lookup that touches a record observes it, dropping it from the
//! registry. Whatever is still registered once all sources have finished
//! was not seen this run and is aged out by [`OrphanManager::sweep`].

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::NaiveDate;
use serde_json::{Map, Value};
use ssot_client::NetboxClient;
use ssot_model::constants::{CF_ORPHAN_LAST_SEEN, ORPHAN_DATE_FORMAT, ORPHAN_TAG};
use ssot_model::prelude::*;
use tracing::{debug, info, warn};

use crate::marshal::{extract_fields, header_payload};

/// Collection paths in sweep order: dependents before the records they
/// point at.
pub const DELETION_ORDER: &[&str] = &[
    ContactAssignment::API_PATH,
    IpAddress::API_PATH,
    Prefix::API_PATH,
    WirelessLan::API_PATH,
    WirelessLanGroup::API_PATH,
    MacAddress::API_PATH,
    VmInterface::API_PATH,
    Interface::API_PATH,
    VirtualMachine::API_PATH,
    VirtualDeviceContext::API_PATH,
    Device::API_PATH,
    Cluster::API_PATH,
    ClusterGroup::API_PATH,
    ClusterType::API_PATH,
    Vlan::API_PATH,
    VlanGroup::API_PATH,
    DeviceType::API_PATH,
    Platform::API_PATH,
    Manufacturer::API_PATH,
    DeviceRole::API_PATH,
    Location::API_PATH,
    Site::API_PATH,
    Region::API_PATH,
    Contact::API_PATH,
    ContactRole::API_PATH,
    ContactGroup::API_PATH,
    Tenant::API_PATH,
    TenantGroup::API_PATH,
    Tag::API_PATH,
];

/// How unobserved records are removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OrphanMode {
    /// Tag first, delete once the retention period has passed.
    #[default]
    Soft,
    /// Delete straight away.
    Hard,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepOptions {
    pub mode: OrphanMode,
    /// Days a soft-deleted record is kept before it is removed.
    pub retain_days: i64,
    pub today: NaiveDate,
}

impl SweepOptions {
    #[must_use]
    pub fn new(mode: OrphanMode, retain_days: i64) -> Self {
        Self {
            mode,
            retain_days,
            today: chrono::Local::now().date_naive(),
        }
    }
}

/// Outcome of one sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Records tagged as orphans.
    pub soft_deleted: usize,
    pub hard_deleted: usize,
    /// Deletes postponed because another orphan still references the record.
    pub deferred: usize,
    pub failed: usize,
}

type Registry = BTreeMap<&'static str, BTreeMap<i64, Arc<dyn NetboxObject>>>;

/// Per-type registry of owned records not yet observed this run.
#[derive(Debug)]
pub struct OrphanManager {
    identity_tag: String,
    items: Mutex<Registry>,
}

impl OrphanManager {
    #[must_use]
    pub fn new(identity_tag: impl Into<String>) -> Self {
        Self {
            identity_tag: identity_tag.into(),
            items: Mutex::new(BTreeMap::new()),
        }
    }

    fn items(&self) -> MutexGuard<'_, Registry> {
        // The registry holds no invariants a panicking writer could break.
        self.items
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Register `obj` as owned. Records without the identity tag are
    /// ignored. Returns whether the record was registered.
    pub fn register<T: OrphanCandidate>(&self, obj: Arc<T>) -> bool {
        if obj.id() == 0 || !obj.header().has_tag(&self.identity_tag) {
            return false;
        }
        let path = obj.api_path();
        let id = obj.id();
        self.items().entry(path).or_default().insert(id, obj);
        true
    }

    /// Mark `obj` as seen in this run.
    pub fn observe(&self, obj: &dyn NetboxObject) {
        let mut items = self.items();
        if let Some(ids) = items.get_mut(obj.api_path()) {
            ids.remove(&obj.id());
        }
    }

    #[must_use]
    pub fn is_registered(&self, path: &str, id: i64) -> bool {
        self.items()
            .get(path)
            .is_some_and(|ids| ids.contains_key(&id))
    }

    /// Number of registered records across all types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items().values().map(BTreeMap::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn snapshot(&self) -> Vec<(&'static str, Vec<Arc<dyn NetboxObject>>)> {
        let items = self.items();
        DELETION_ORDER
            .iter()
            .filter_map(|path| {
                let objs: Vec<_> = items.get(path)?.values().cloned().collect();
                (!objs.is_empty()).then_some((*path, objs))
            })
            .collect()
    }

    fn forget(&self, removed: &HashSet<ObjRef>) {
        let mut items = self.items();
        for r in removed {
            if let Some(ids) = items.get_mut(r.path) {
                ids.remove(&r.id);
            }
        }
    }

    /// Remove or age out every record still registered.
    ///
    /// A record is only deleted once no other registered record references
    /// it; otherwise the delete is deferred to a later run. Per-record
    /// failures are logged and counted, never propagated.
    pub async fn sweep(
        &self,
        client: &NetboxClient,
        orphan_tag: &Arc<Tag>,
        options: &SweepOptions,
    ) -> SweepReport {
        let snapshot = self.snapshot();
        let mut state = SweepState {
            pending: ReferenceTracker::new(&snapshot),
            report: SweepReport::default(),
            removed: HashSet::new(),
        };
        info!(
            mode = ?options.mode,
            candidates = state.pending.remaining.len(),
            "Sweeping orphaned objects"
        );

        match options.mode {
            OrphanMode::Soft => {
                for &(path, ref objs) in &snapshot {
                    for obj in objs {
                        soft_sweep_one(client, orphan_tag, options, path, obj.as_ref(), &mut state)
                            .await;
                    }
                }
            }
            OrphanMode::Hard => hard_sweep(client, &snapshot, &mut state).await,
        }

        self.forget(&state.removed);
        let report = state.report;
        info!(
            soft_deleted = report.soft_deleted,
            hard_deleted = report.hard_deleted,
            deferred = report.deferred,
            failed = report.failed,
            "Orphan sweep finished"
        );
        report
    }
}

struct SweepState {
    pending: ReferenceTracker,
    report: SweepReport,
    removed: HashSet<ObjRef>,
}

impl SweepState {
    fn deleted(&mut self, target: ObjRef) {
        self.pending.remove(&target);
        self.removed.insert(target);
        self.report.hard_deleted += 1;
    }
}

/// Tag a fresh orphan, or delete it once its retention has expired.
async fn soft_sweep_one(
    client: &NetboxClient,
    orphan_tag: &Arc<Tag>,
    options: &SweepOptions,
    path: &'static str,
    obj: &dyn NetboxObject,
    state: &mut SweepState,
) {
    let header = obj.header();
    let last_seen = header
        .custom_field(CF_ORPHAN_LAST_SEEN)
        .and_then(Value::as_str)
        .and_then(|s| NaiveDate::parse_from_str(s, ORPHAN_DATE_FORMAT).ok());

    let last_seen = match last_seen {
        Some(date) if header.has_tag(ORPHAN_TAG) => date,
        _ => {
            let body = soft_delete_body(header, orphan_tag, options.today);
            match client.patch::<Value>(path, obj.id(), &body).await {
                Ok(_) => {
                    info!(path, id = obj.id(), key = %obj.display_key(), "Soft-deleted orphan");
                    state.report.soft_deleted += 1;
                }
                Err(error) => {
                    warn!(path, id = obj.id(), key = %obj.display_key(), %error, "Failed to soft-delete orphan");
                    state.report.failed += 1;
                }
            }
            return;
        }
    };

    let age = options.today.signed_duration_since(last_seen).num_days();
    if age <= options.retain_days {
        debug!(path, id = obj.id(), age, "Orphan within retention period");
        return;
    }

    let target = ObjRef::new(path, obj.id());
    if state.pending.is_referenced(&target) {
        info!(path, id = obj.id(), key = %obj.display_key(), "Orphan still referenced, deferring delete");
        state.report.deferred += 1;
        return;
    }
    match client.delete(path, obj.id()).await {
        Ok(()) => {
            info!(path, id = obj.id(), key = %obj.display_key(), age, "Deleted expired orphan");
            state.deleted(target);
        }
        Err(error) => {
            warn!(path, id = obj.id(), key = %obj.display_key(), %error, "Failed to delete orphan");
            state.report.failed += 1;
        }
    }
}

/// Bulk-delete in passes until no further record becomes unreferenced.
async fn hard_sweep(
    client: &NetboxClient,
    snapshot: &[(&'static str, Vec<Arc<dyn NetboxObject>>)],
    state: &mut SweepState,
) {
    let mut failed: HashSet<ObjRef> = HashSet::new();
    loop {
        let mut progress = false;
        for &(path, ref objs) in snapshot {
            let batch: Vec<ObjRef> = objs
                .iter()
                .map(|o| ObjRef::new(path, o.id()))
                .filter(|r| state.pending.remaining.contains(r) && !failed.contains(r))
                .filter(|r| !state.pending.is_referenced(r))
                .collect();
            if batch.is_empty() {
                continue;
            }
            let ids: Vec<i64> = batch.iter().map(|r| r.id).collect();
            match client.bulk_delete(path, &ids).await {
                Ok(()) => {
                    info!(path, count = ids.len(), ?ids, "Deleted orphans");
                    for r in batch {
                        state.deleted(r);
                    }
                    progress = true;
                }
                Err(error) => {
                    warn!(path, count = ids.len(), %error, "Failed to delete orphans");
                    state.report.failed += ids.len();
                    failed.extend(batch);
                }
            }
        }
        if !progress {
            break;
        }
    }

    let deferred = state
        .pending
        .remaining
        .iter()
        .filter(|r| !failed.contains(*r))
        .count();
    if deferred > 0 {
        info!(count = deferred, "Orphans still referenced, deferring delete");
    }
    state.report.deferred += deferred;
}

/// PATCH body that marks a record as orphaned today.
fn soft_delete_body(header: &Header, orphan_tag: &Arc<Tag>, today: NaiveDate) -> Map<String, Value> {
    let mut header = header.clone();
    header.add_tag(Arc::clone(orphan_tag));
    header.set_custom_field(
        CF_ORPHAN_LAST_SEEN,
        today.format(ORPHAN_DATE_FORMAT).to_string(),
    );
    extract_fields(&header_payload(&header), &["tags", "custom_fields"])
}

/// Which orphans are still pending and who points at whom.
struct ReferenceTracker {
    remaining: HashSet<ObjRef>,
    referrers: HashMap<ObjRef, HashSet<ObjRef>>,
}

impl ReferenceTracker {
    fn new(snapshot: &[(&'static str, Vec<Arc<dyn NetboxObject>>)]) -> Self {
        let mut remaining = HashSet::new();
        let mut referrers: HashMap<ObjRef, HashSet<ObjRef>> = HashMap::new();
        for &(path, ref objs) in snapshot {
            for obj in objs {
                let me = ObjRef::new(path, obj.id());
                remaining.insert(me);
                for target in obj.references() {
                    if target != me {
                        referrers.entry(target).or_default().insert(me);
                    }
                }
            }
        }
        Self {
            remaining,
            referrers,
        }
    }

    fn is_referenced(&self, target: &ObjRef) -> bool {
        self.referrers
            .get(target)
            .is_some_and(|by| by.iter().any(|r| self.remaining.contains(r)))
    }

    fn remove(&mut self, target: &ObjRef) {
        self.remaining.remove(target);
    }
}
