//! In-memory fake of the inventory REST API built on wiremock.
//!
//! Stores objects per collection path, assigns ids on POST, merges PATCH
//! bodies, paginates lists and records every request it serves. References
//! are stored as bare ids and rendered back the way the real API nests
//! them (`{"id": n, "name": ...}`, tags as full tag objects).

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use serde_json::{json, Map, Value};
use ssot_client::{ApiToken, NetboxClient};
use wiremock::matchers::path_regex;
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

const TAGS_PATH: &str = "/api/extras/tags/";

/// Reference fields rendered as nested objects, with the collection used to
/// resolve the nested `name`.
const NESTED_REFS: &[(&str, Option<&str>)] = &[
    ("site", Some("/api/dcim/sites/")),
    ("tenant", Some("/api/tenancy/tenants/")),
    ("device", Some("/api/dcim/devices/")),
    ("virtual_machine", Some("/api/virtualization/virtual-machines/")),
    ("cluster", Some("/api/virtualization/clusters/")),
    ("manufacturer", Some("/api/dcim/manufacturers/")),
    ("region", Some("/api/dcim/regions/")),
    ("bridge", None),
    ("contact", None),
    ("device_type", None),
    ("group", None),
    ("lag", None),
    ("location", None),
    ("parent", None),
    ("platform", None),
    ("primary_ip4", None),
    ("primary_ip6", None),
    ("primary_mac_address", None),
    ("role", None),
    ("type", None),
    ("untagged_vlan", None),
    ("vlan", None),
];

const NESTED_REF_LISTS: &[&str] = &["tagged_vlans", "vdcs"];

/// One request served by the fake.
#[derive(Debug, Clone, PartialEq)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub body: Option<Value>,
}

#[derive(Debug, Default)]
struct State {
    version: String,
    uri: String,
    collections: BTreeMap<String, BTreeMap<i64, Map<String, Value>>>,
    next_id: i64,
    requests: Vec<Recorded>,
    failures: Vec<(String, String, u16)>,
}

/// A fake inventory server holding its objects in memory.
pub struct FakeNetbox {
    server: MockServer,
    state: Arc<Mutex<State>>,
}

impl FakeNetbox {
    /// Start a fake reporting version 4.2.0 (MAC address records enabled).
    pub async fn start() -> Self {
        Self::start_with_version("4.2.0").await
    }

    pub async fn start_with_version(version: &str) -> Self {
        let server = MockServer::start().await;
        let state = Arc::new(Mutex::new(State {
            version: version.to_string(),
            uri: server.uri(),
            next_id: 1000,
            ..Default::default()
        }));

        let shared = Arc::clone(&state);
        Mock::given(path_regex("^/api/"))
            .respond_with(move |req: &Request| {
                let mut state = shared.lock().unwrap();
                state.handle(req)
            })
            .mount(&server)
            .await;

        Self { server, state }
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    pub fn client(&self) -> NetboxClient {
        NetboxClient::with_http_client(self.uri(), ApiToken::new("test-token"), reqwest::Client::new())
    }

    /// Insert an object as if it already existed. The object must carry an
    /// `id`; references may be given as ids or nested objects.
    pub fn seed(&self, path: &str, object: Value) {
        let mut state = self.state.lock().unwrap();
        let object = normalize(object_of(object));
        let id = object.get("id").and_then(Value::as_i64).unwrap();
        state.next_id = state.next_id.max(id + 1);
        state
            .collections
            .entry(path.to_string())
            .or_default()
            .insert(id, object);
    }

    /// Seed the identity tag and return its id.
    pub fn seed_identity_tag(&self) -> i64 {
        self.seed(
            TAGS_PATH,
            json!({"id": 1, "name": "netbox-ssot", "slug": "netbox-ssot", "color": "00add8"}),
        );
        1
    }

    /// Object as the API would return it.
    pub fn object(&self, path: &str, id: i64) -> Option<Value> {
        let state = self.state.lock().unwrap();
        let object = state.collections.get(path)?.get(&id)?;
        Some(state.render(object))
    }

    pub fn objects(&self, path: &str) -> Vec<Value> {
        let state = self.state.lock().unwrap();
        state
            .collections
            .get(path)
            .map(|objects| objects.values().map(|o| state.render(o)).collect())
            .unwrap_or_default()
    }

    /// Id of the tag with this name, if stored.
    pub fn tag_id(&self, name: &str) -> Option<i64> {
        let state = self.state.lock().unwrap();
        state
            .collections
            .get(TAGS_PATH)?
            .iter()
            .find(|(_, tag)| tag.get("name").and_then(Value::as_str) == Some(name))
            .map(|(id, _)| *id)
    }

    /// Make every matching request answer with `status`. `path` matches by
    /// prefix.
    pub fn fail(&self, method: &str, path: &str, status: u16) {
        let mut state = self.state.lock().unwrap();
        state
            .failures
            .push((method.to_string(), path.to_string(), status));
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.state.lock().unwrap().requests.clone()
    }

    /// Every non-GET request.
    pub fn writes(&self) -> Vec<Recorded> {
        self.requests()
            .into_iter()
            .filter(|r| r.method != "GET")
            .collect()
    }

    /// Writes against one collection (object paths included).
    pub fn writes_to(&self, path: &str) -> Vec<Recorded> {
        self.writes()
            .into_iter()
            .filter(|r| r.path.starts_with(path))
            .collect()
    }

    pub fn clear_requests(&self) {
        self.state.lock().unwrap().requests.clear();
    }
}

impl State {
    fn handle(&mut self, req: &Request) -> ResponseTemplate {
        let method = req.method.to_string();
        let path = req.url.path().to_string();
        let body: Option<Value> = serde_json::from_slice(&req.body).ok();
        self.requests.push(Recorded {
            method: method.clone(),
            path: path.clone(),
            body: body.clone(),
        });

        if let Some(&(_, _, status)) = self
            .failures
            .iter()
            .find(|(m, p, _)| *m == method && path.starts_with(p.as_str()))
        {
            return ResponseTemplate::new(status).set_body_json(json!({"detail": "injected failure"}));
        }

        if path == "/api/status/" {
            return ResponseTemplate::new(200).set_body_json(json!({
                "netbox-version": self.version,
                "python-version": "3.12.0",
                "plugins": {},
            }));
        }

        let (collection, id) = split_object_path(&path);
        match (method.as_str(), id) {
            ("GET", None) => self.list(&collection, req),
            ("GET", Some(id)) => self.get(&collection, id),
            ("POST", None) => self.create(&collection, body),
            ("PATCH", Some(id)) => self.patch(&collection, id, body),
            ("DELETE", Some(id)) => self.delete(&collection, &[id]),
            ("DELETE", None) => {
                let ids: Vec<i64> = body
                    .as_ref()
                    .and_then(Value::as_array)
                    .map(|items| {
                        items
                            .iter()
                            .filter_map(|i| i.get("id").and_then(Value::as_i64))
                            .collect()
                    })
                    .unwrap_or_default();
                self.delete(&collection, &ids)
            }
            _ => ResponseTemplate::new(405),
        }
    }

    fn list(&self, collection: &str, req: &Request) -> ResponseTemplate {
        let query: BTreeMap<String, String> = req.url.query_pairs().into_owned().collect();
        let limit: usize = query.get("limit").and_then(|l| l.parse().ok()).unwrap_or(100);
        let offset: usize = query.get("offset").and_then(|o| o.parse().ok()).unwrap_or(0);

        let all: Vec<Value> = self
            .collections
            .get(collection)
            .map(|objects| objects.values().map(|o| self.render(o)).collect())
            .unwrap_or_default();
        let count = all.len();
        let results: Vec<Value> = all.into_iter().skip(offset).take(limit).collect();
        let next = (offset + limit < count).then(|| {
            format!(
                "{}{}?limit={}&offset={}",
                self.uri,
                collection,
                limit,
                offset + limit
            )
        });
        ResponseTemplate::new(200).set_body_json(json!({
            "count": count,
            "next": next,
            "previous": null,
            "results": results,
        }))
    }

    fn get(&self, collection: &str, id: i64) -> ResponseTemplate {
        match self.collections.get(collection).and_then(|c| c.get(&id)) {
            Some(object) => ResponseTemplate::new(200).set_body_json(self.render(object)),
            None => not_found(),
        }
    }

    fn create(&mut self, collection: &str, body: Option<Value>) -> ResponseTemplate {
        let Some(Value::Object(body)) = body else {
            return ResponseTemplate::new(400).set_body_json(json!({"detail": "expected an object"}));
        };
        let id = self.next_id;
        self.next_id += 1;
        let mut object = normalize(body);
        object.insert("id".to_string(), json!(id));
        self.collections
            .entry(collection.to_string())
            .or_default()
            .insert(id, object.clone());
        ResponseTemplate::new(201).set_body_json(self.render(&object))
    }

    fn patch(&mut self, collection: &str, id: i64, body: Option<Value>) -> ResponseTemplate {
        let Some(Value::Object(body)) = body else {
            return ResponseTemplate::new(400).set_body_json(json!({"detail": "expected an object"}));
        };
        let Some(object) = self
            .collections
            .get_mut(collection)
            .and_then(|c| c.get_mut(&id))
        else {
            return not_found();
        };
        for (key, value) in normalize(body) {
            match (key.as_str(), value) {
                ("custom_fields", Value::Object(fields)) => {
                    let merged = object
                        .entry("custom_fields")
                        .or_insert_with(|| json!({}));
                    if let Value::Object(existing) = merged {
                        existing.extend(fields);
                    }
                }
                (_, value) => {
                    object.insert(key, value);
                }
            }
        }
        let object = object.clone();
        ResponseTemplate::new(200).set_body_json(self.render(&object))
    }

    fn delete(&mut self, collection: &str, ids: &[i64]) -> ResponseTemplate {
        let Some(objects) = self.collections.get_mut(collection) else {
            return not_found();
        };
        if ids.iter().any(|id| !objects.contains_key(id)) {
            return not_found();
        }
        for id in ids {
            objects.remove(id);
        }
        ResponseTemplate::new(204)
    }

    fn render(&self, object: &Map<String, Value>) -> Value {
        let mut rendered = object.clone();
        if let Some(Value::Array(ids)) = rendered.get("tags").cloned() {
            let tags: Vec<Value> = ids
                .iter()
                .filter_map(Value::as_i64)
                .map(|id| {
                    self.collections
                        .get(TAGS_PATH)
                        .and_then(|tags| tags.get(&id))
                        .map_or_else(
                            || json!({"id": id}),
                            |tag| {
                                json!({
                                    "id": id,
                                    "name": tag.get("name"),
                                    "slug": tag.get("slug"),
                                    "color": tag.get("color"),
                                })
                            },
                        )
                })
                .collect();
            rendered.insert("tags".to_string(), Value::Array(tags));
        }
        for &(key, lookup) in NESTED_REFS {
            let Some(id) = rendered.get(key).and_then(Value::as_i64) else {
                continue;
            };
            let mut nested = json!({"id": id});
            if let Some(name) = lookup
                .and_then(|path| self.collections.get(path))
                .and_then(|objects| objects.get(&id))
                .and_then(|target| target.get("name"))
            {
                nested["name"] = name.clone();
            }
            rendered.insert(key.to_string(), nested);
        }
        for &key in NESTED_REF_LISTS {
            if let Some(Value::Array(ids)) = rendered.get(key).cloned() {
                let nested = ids
                    .iter()
                    .filter_map(Value::as_i64)
                    .map(|id| json!({"id": id}))
                    .collect();
                rendered.insert(key.to_string(), Value::Array(nested));
            }
        }
        Value::Object(rendered)
    }
}

fn not_found() -> ResponseTemplate {
    ResponseTemplate::new(404).set_body_json(json!({"detail": "Not found."}))
}

fn object_of(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {other}"),
    }
}

/// `/api/dcim/devices/11/` → (`/api/dcim/devices/`, Some(11)).
fn split_object_path(path: &str) -> (String, Option<i64>) {
    let trimmed = path.trim_end_matches('/');
    if let Some((prefix, last)) = trimmed.rsplit_once('/') {
        if let Ok(id) = last.parse::<i64>() {
            return (format!("{prefix}/"), Some(id));
        }
    }
    (format!("{trimmed}/"), None)
}

/// Collapse nested references (`{"id": n, ...}`) to bare ids.
fn normalize(object: Map<String, Value>) -> Map<String, Value> {
    object
        .into_iter()
        .map(|(key, value)| {
            let value = match (key.as_str(), value) {
                ("custom_fields" | "local_context_data", value) => value,
                (_, Value::Object(nested)) if nested.contains_key("id") => nested["id"].clone(),
                (_, Value::Array(items)) => Value::Array(
                    items
                        .into_iter()
                        .map(|item| match item {
                            Value::Object(nested) if nested.contains_key("id") => {
                                nested["id"].clone()
                            }
                            other => other,
                        })
                        .collect(),
                ),
                (_, value) => value,
            };
            (key, value)
        })
        .collect()
}
