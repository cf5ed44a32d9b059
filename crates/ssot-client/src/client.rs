//! Inventory REST client (reqwest-based).
//!
//! Generic list/create/patch/delete primitives keyed on a collection path.
//! Bodies and responses are plain JSON; typing happens at the call site.

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::{Certificate, Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::{debug, warn};
use url::Url;

use crate::auth::ApiToken;
use crate::error::{ClientError, ClientResult};
use crate::retry::RetryPolicy;

/// Page size requested from list endpoints.
pub const PAGE_LIMIT: usize = 100;

/// Default per-request deadline.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection settings for [`NetboxClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// `scheme://host[:port]`, without a trailing slash.
    pub base_url: String,
    pub token: ApiToken,
    pub timeout: Duration,
    pub validate_cert: bool,
    /// Extra PEM bundle trusted in addition to the system roots.
    pub ca_pem: Option<Vec<u8>>,
    pub retry: RetryPolicy,
}

impl ClientConfig {
    #[must_use]
    pub fn new(base_url: impl Into<String>, token: ApiToken) -> Self {
        Self {
            base_url: base_url.into(),
            token,
            timeout: DEFAULT_TIMEOUT,
            validate_cert: true,
            ca_pem: None,
            retry: RetryPolicy::default(),
        }
    }
}

/// Build and validate a base URL from its parts.
pub fn base_url(scheme: &str, host: &str, port: u16) -> ClientResult<String> {
    let raw = format!("{scheme}://{host}:{port}");
    let url = Url::parse(&raw)
        .map_err(|e| ClientError::InvalidConfig(format!("invalid base URL {raw:?}: {e}")))?;
    if url.host_str().map_or(true, str::is_empty) {
        return Err(ClientError::InvalidConfig(format!("missing host in {raw:?}")));
    }
    Ok(url.as_str().trim_end_matches('/').to_string())
}

/// One page of a list response.
#[derive(Debug, Deserialize)]
struct Page<T> {
    #[serde(default)]
    next: Option<String>,
    #[serde(default = "Vec::new")]
    results: Vec<T>,
}

/// Response of `GET /api/status/`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NetboxStatus {
    #[serde(rename = "netbox-version", default)]
    pub netbox_version: String,
    #[serde(rename = "python-version", default)]
    pub python_version: String,
    #[serde(default)]
    pub plugins: BTreeMap<String, Value>,
}

impl NetboxStatus {
    /// `(major, minor)` of the server, parsed leniently
    /// (`"4.2.1-Docker-3.2.0"` → `(4, 2)`).
    #[must_use]
    pub fn version(&self) -> Option<(u32, u32)> {
        let mut parts = self.netbox_version.split(|c: char| !c.is_ascii_digit());
        let major = parts.next()?.parse().ok()?;
        let minor = parts.next()?.parse().ok()?;
        Some((major, minor))
    }

    /// First-class MAC address records exist from 4.2 on.
    #[must_use]
    pub fn supports_mac_addresses(&self) -> bool {
        self.version().map_or(false, |v| v >= (4, 2))
    }
}

/// HTTP client for the inventory API. Cheap to clone; clones share the
/// connection pool.
#[derive(Debug, Clone)]
pub struct NetboxClient {
    base_url: String,
    token: ApiToken,
    http_client: Client,
    retry: RetryPolicy,
}

impl NetboxClient {
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        let mut builder = Client::builder()
            .timeout(config.timeout)
            .danger_accept_invalid_certs(!config.validate_cert)
            .user_agent(concat!("netbox-ssot/", env!("CARGO_PKG_VERSION")));
        if let Some(pem) = &config.ca_pem {
            for cert in Certificate::from_pem_bundle(pem)
                .map_err(|e| ClientError::InvalidConfig(format!("invalid CA bundle: {e}")))?
            {
                builder = builder.add_root_certificate(cert);
            }
        }
        let http_client = builder
            .build()
            .map_err(|e| ClientError::InvalidConfig(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token,
            http_client,
            retry: config.retry,
        })
    }

    /// Create a client with a pre-built `reqwest::Client` (for testing).
    #[must_use]
    pub fn with_http_client(base_url: impl Into<String>, token: ApiToken, http_client: Client) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
            http_client,
            retry: RetryPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn collection_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn object_url(&self, path: &str, id: i64) -> String {
        format!("{}{}{}/", self.base_url, path, id)
    }

    // ── Operations ────────────────────────────────────────────────────

    /// Server status, used as a connectivity check.
    pub async fn status(&self) -> ClientResult<NetboxStatus> {
        let url = self.collection_url("/api/status/");
        self.retry
            .execute("status", || self.get(url.as_str(), &[]))
            .await
    }

    /// Every object of a collection, following pagination until `next` is
    /// null.
    pub async fn list_all<T: DeserializeOwned>(
        &self,
        path: &str,
        extra_query: &[(String, String)],
    ) -> ClientResult<Vec<T>> {
        let url = self.collection_url(path);
        let mut objects = Vec::new();
        let mut offset = 0usize;
        loop {
            let mut query = vec![
                ("limit".to_string(), PAGE_LIMIT.to_string()),
                ("offset".to_string(), offset.to_string()),
            ];
            query.extend(extra_query.iter().cloned());
            let page: Page<T> = self
                .retry
                .execute("list", || self.get(url.as_str(), query.as_slice()))
                .await?;
            let fetched = page.results.len();
            objects.extend(page.results);
            if page.next.is_none() || fetched == 0 {
                break;
            }
            offset += fetched;
        }
        debug!(path, count = objects.len(), "Listed objects");
        Ok(objects)
    }

    /// `POST <path>`; expects 201 and returns the created object.
    pub async fn create<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &Map<String, Value>,
    ) -> ClientResult<T> {
        let url = self.collection_url(path);
        let url = url.as_str();
        self.retry
            .execute("create", move || async move {
                debug!(%url, "POST");
                let builder = self.token.apply(self.http_client.post(url)).json(body);
                let response = builder.send().await?;
                expect_json(response, StatusCode::CREATED).await
            })
            .await
    }

    /// `PATCH <path><id>/`; expects 200 and returns the updated object.
    pub async fn patch<T: DeserializeOwned>(
        &self,
        path: &str,
        id: i64,
        body: &Map<String, Value>,
    ) -> ClientResult<T> {
        let url = self.object_url(path, id);
        let url = url.as_str();
        self.retry
            .execute("patch", move || async move {
                debug!(%url, "PATCH");
                let builder = self.token.apply(self.http_client.patch(url)).json(body);
                let response = builder.send().await?;
                expect_json(response, StatusCode::OK).await
            })
            .await
    }

    /// `DELETE <path><id>/`; expects 204.
    pub async fn delete(&self, path: &str, id: i64) -> ClientResult<()> {
        let url = self.object_url(path, id);
        let url = url.as_str();
        self.retry
            .execute("delete", move || async move {
                debug!(%url, "DELETE");
                let response = self.token.apply(self.http_client.delete(url)).send().await?;
                expect_empty(response, StatusCode::NO_CONTENT).await
            })
            .await
    }

    /// `DELETE <path>` with body `[{"id": n}, ...]`; expects 204.
    pub async fn bulk_delete(&self, path: &str, ids: &[i64]) -> ClientResult<()> {
        if ids.is_empty() {
            return Ok(());
        }
        let url = self.collection_url(path);
        let url = url.as_str();
        let body: Vec<Value> = ids.iter().map(|id| json!({ "id": id })).collect();
        let body = &body;
        self.retry
            .execute("bulk_delete", move || async move {
                debug!(%url, count = ids.len(), "DELETE (bulk)");
                let builder = self.token.apply(self.http_client.delete(url)).json(body);
                let response = builder.send().await?;
                expect_empty(response, StatusCode::NO_CONTENT).await
            })
            .await
    }

    // ── Internal HTTP Methods ─────────────────────────────────────────

    async fn get<T: DeserializeOwned>(&self, url: &str, query: &[(String, String)]) -> ClientResult<T> {
        debug!(url, ?query, "GET");
        let mut builder = self.http_client.get(url);
        if !query.is_empty() {
            builder = builder.query(query);
        }
        let response = self.token.apply(builder).send().await?;
        expect_json(response, StatusCode::OK).await
    }
}

// ── Response Handling ─────────────────────────────────────────────────

async fn expect_json<T: DeserializeOwned>(
    response: reqwest::Response,
    expected: StatusCode,
) -> ClientResult<T> {
    if response.status() != expected {
        return Err(error_from_response(response).await);
    }
    let body = response.text().await?;
    serde_json::from_str(&body)
        .map_err(|e| ClientError::Decode(format!("failed to parse response: {e}")))
}

async fn expect_empty(response: reqwest::Response, expected: StatusCode) -> ClientResult<()> {
    if response.status() == expected {
        Ok(())
    } else {
        Err(error_from_response(response).await)
    }
}

async fn error_from_response(response: reqwest::Response) -> ClientError {
    let status = response.status();
    let retry_after = response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<no body>".to_string());

    match status {
        StatusCode::NOT_FOUND => ClientError::NotFound(body),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ClientError::Auth {
            status: status.as_u16(),
            body,
        },
        StatusCode::TOO_MANY_REQUESTS => {
            warn!(retry_after_secs = ?retry_after, "Inventory API rate limited");
            ClientError::RateLimited {
                retry_after_secs: retry_after,
            }
        }
        _ => ClientError::Api {
            status: status.as_u16(),
            body,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url() {
        assert_eq!(
            base_url("https", "netbox.example.com", 443).unwrap(),
            "https://netbox.example.com"
        );
        assert_eq!(
            base_url("http", "10.0.0.1", 8080).unwrap(),
            "http://10.0.0.1:8080"
        );
        assert!(base_url("https", "", 443).is_err());
    }

    #[test]
    fn test_status_version_parsing() {
        let status = NetboxStatus {
            netbox_version: "4.2.1-Docker-3.2.0".into(),
            ..Default::default()
        };
        assert_eq!(status.version(), Some((4, 2)));
        assert!(status.supports_mac_addresses());

        let old = NetboxStatus {
            netbox_version: "3.7.8".into(),
            ..Default::default()
        };
        assert!(!old.supports_mac_addresses());
        assert_eq!(NetboxStatus::default().version(), None);
    }

    #[test]
    fn test_object_url() {
        let client = NetboxClient::with_http_client(
            "http://netbox/",
            ApiToken::new("t"),
            Client::new(),
        );
        assert_eq!(
            client.object_url("/api/dcim/devices/", 11),
            "http://netbox/api/dcim/devices/11/"
        );
    }
}
