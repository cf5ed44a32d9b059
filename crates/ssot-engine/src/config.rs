//! Engine configuration loaded from a YAML file.
//!
//! Loading is fail-fast: the file must parse and pass [`Config::validate`]
//! before any connection is opened. `NETBOX_API_TOKEN` in the environment
//! overrides `netbox.apiToken`.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use ssot_client::{base_url, ApiToken, ClientConfig, RetryPolicy};
use ssot_inventory::{InventoryConfig, OrphanMode, SourcePriority, SweepOptions};
use ssot_model::constants::{DEFAULT_IDENTITY_TAG, DEFAULT_IDENTITY_TAG_COLOR};

use crate::colors::is_valid_color;
use crate::error::ConfigError;
use crate::relations::Relations;

/// Environment variable overriding `netbox.apiToken`.
pub const API_TOKEN_ENV: &str = "NETBOX_API_TOKEN";

/// Base delay between client retries, in seconds.
const RETRY_BASE_DELAY_SECS: u64 = 1;

/// Root of the configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub logger: LoggerConfig,
    pub netbox: NetboxConfig,
    #[serde(default, rename = "source")]
    pub sources: Vec<SourceConfig>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggerConfig {
    pub level: LogLevel,
    pub format: LogFormat,
    /// Log file path. Empty means stderr.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub dest: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrphanModeConfig {
    #[default]
    Soft,
    Hard,
}

impl From<OrphanModeConfig> for OrphanMode {
    fn from(mode: OrphanModeConfig) -> Self {
        match mode {
            OrphanModeConfig::Soft => Self::Soft,
            OrphanModeConfig::Hard => Self::Hard,
        }
    }
}

/// Connection to the inventory and ownership settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NetboxConfig {
    #[serde(skip_serializing)]
    pub api_token: String,
    pub hostname: String,
    pub port: u16,
    pub http_scheme: String,
    pub validate_cert: bool,
    /// Extra PEM bundle. Empty means system roots only.
    pub ca_file: String,
    /// Per-request deadline in seconds.
    pub timeout: u64,
    pub max_retries: u32,
    /// Identity tag marking records the engine owns.
    pub tag: String,
    pub tag_color: String,
    pub remove_orphans: bool,
    pub orphan_mode: OrphanModeConfig,
    pub remove_orphans_after_days: i64,
    /// Source names from highest to lowest priority.
    pub source_priority: Vec<String>,
}

impl Default for NetboxConfig {
    fn default() -> Self {
        Self {
            api_token: String::new(),
            hostname: String::new(),
            port: 443,
            http_scheme: "https".to_string(),
            validate_cert: true,
            ca_file: String::new(),
            timeout: 30,
            max_retries: 0,
            tag: DEFAULT_IDENTITY_TAG.to_string(),
            tag_color: DEFAULT_IDENTITY_TAG_COLOR.to_string(),
            remove_orphans: true,
            orphan_mode: OrphanModeConfig::Soft,
            remove_orphans_after_days: 5,
            source_priority: Vec::new(),
        }
    }
}

/// One configured source.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub source_type: String,
    /// Location of the source's data (file path, URL, ...), interpreted by
    /// the driver.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub path: String,
    /// Overrides the `Source: <name>` tag name.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub tag: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub tag_color: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub host_site_relations: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub host_tenant_relations: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub vlan_group_relations: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub vlan_tenant_relations: Vec<String>,
    /// Free-form driver options.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub custom_fields: BTreeMap<String, Value>,
}

/// Compiled relation tables of a source.
#[derive(Debug, Clone, Default)]
pub struct SourceRelations {
    pub host_site: Relations,
    pub host_tenant: Relations,
    pub vlan_group: Relations,
    pub vlan_tenant: Relations,
}

impl SourceConfig {
    pub fn relations(&self) -> Result<SourceRelations, ConfigError> {
        Ok(SourceRelations {
            host_site: Relations::parse(&self.host_site_relations)?,
            host_tenant: Relations::parse(&self.host_tenant_relations)?,
            vlan_group: Relations::parse(&self.vlan_group_relations)?,
            vlan_tenant: Relations::parse(&self.vlan_tenant_relations)?,
        })
    }

    /// Custom tag name, when one is configured.
    #[must_use]
    pub fn tag_override(&self) -> Option<&str> {
        Some(self.tag.as_str()).filter(|t| !t.is_empty())
    }
}

impl Config {
    /// Read, parse and validate a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Self = serde_yaml::from_str(&raw)?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a configuration document without consulting the
    /// environment.
    pub fn from_yaml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides through `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(token) = lookup(API_TOKEN_ENV).filter(|t| !t.is_empty()) {
            self.netbox.api_token = token;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let netbox = &self.netbox;
        if netbox.hostname.trim().is_empty() {
            return Err(ConfigError::invalid("netbox.hostname", "must not be empty"));
        }
        if netbox.api_token.trim().is_empty() {
            return Err(ConfigError::invalid(
                "netbox.apiToken",
                format!("must not be empty (set it or {API_TOKEN_ENV})"),
            ));
        }
        if !matches!(netbox.http_scheme.as_str(), "http" | "https") {
            return Err(ConfigError::invalid(
                "netbox.httpScheme",
                format!("expected http or https, got {:?}", netbox.http_scheme),
            ));
        }
        if netbox.port == 0 {
            return Err(ConfigError::invalid("netbox.port", "must be greater than 0"));
        }
        if netbox.timeout == 0 {
            return Err(ConfigError::invalid("netbox.timeout", "must be greater than 0"));
        }
        if netbox.remove_orphans_after_days < 0 {
            return Err(ConfigError::invalid(
                "netbox.removeOrphansAfterDays",
                "must not be negative",
            ));
        }
        if netbox.tag.trim().is_empty() {
            return Err(ConfigError::invalid("netbox.tag", "must not be empty"));
        }
        if !is_valid_color(&netbox.tag_color) {
            return Err(ConfigError::invalid(
                "netbox.tagColor",
                format!("{:?} is not six hex digits", netbox.tag_color),
            ));
        }

        let mut names = HashSet::new();
        for (i, source) in self.sources.iter().enumerate() {
            if source.name.trim().is_empty() {
                return Err(ConfigError::invalid(format!("source[{i}].name"), "must not be empty"));
            }
            if !names.insert(source.name.as_str()) {
                return Err(ConfigError::invalid(
                    format!("source[{i}].name"),
                    format!("duplicate source name {:?}", source.name),
                ));
            }
            if source.source_type.trim().is_empty() {
                return Err(ConfigError::invalid(format!("source[{i}].type"), "must not be empty"));
            }
            if !source.tag_color.is_empty() && !is_valid_color(&source.tag_color) {
                return Err(ConfigError::invalid(
                    format!("source[{i}].tagColor"),
                    format!("{:?} is not six hex digits", source.tag_color),
                ));
            }
            source.relations()?;
        }

        for name in &netbox.source_priority {
            if !names.contains(name.as_str()) {
                return Err(ConfigError::invalid(
                    "netbox.sourcePriority",
                    format!("{name:?} is not a configured source"),
                ));
            }
        }
        Ok(())
    }

    /// Client settings derived from the `netbox` section. Reads the CA
    /// bundle when one is configured.
    pub fn client_config(&self) -> Result<ClientConfig, ConfigError> {
        let netbox = &self.netbox;
        let url = base_url(&netbox.http_scheme, &netbox.hostname, netbox.port)
            .map_err(|e| ConfigError::invalid("netbox.hostname", e.to_string()))?;
        let mut client = ClientConfig::new(url, ApiToken::new(netbox.api_token.clone()));
        client.timeout = Duration::from_secs(netbox.timeout);
        client.validate_cert = netbox.validate_cert;
        client.retry = RetryPolicy::new(netbox.max_retries, RETRY_BASE_DELAY_SECS);
        if !netbox.ca_file.is_empty() {
            let path = PathBuf::from(&netbox.ca_file);
            let pem = std::fs::read(&path).map_err(|source| ConfigError::Io { path, source })?;
            client.ca_pem = Some(pem);
        }
        Ok(client)
    }

    #[must_use]
    pub fn inventory_config(&self) -> InventoryConfig {
        InventoryConfig {
            identity_tag: self.netbox.tag.clone(),
            identity_tag_color: self.netbox.tag_color.clone(),
            priority: SourcePriority::from_order(&self.netbox.source_priority),
        }
    }

    /// Sweep settings, or `None` when orphan removal is disabled.
    #[must_use]
    pub fn sweep_options(&self) -> Option<SweepOptions> {
        self.netbox.remove_orphans.then(|| {
            SweepOptions::new(
                self.netbox.orphan_mode.into(),
                self.netbox.remove_orphans_after_days,
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
netbox:
  apiToken: "0123456789abcdef"
  hostname: netbox.example.com
source:
  - name: srcA
    type: static
    path: inventory.yaml
"#;

    #[test]
    fn test_defaults() {
        let config = Config::from_yaml_str(MINIMAL).unwrap();
        assert_eq!(config.logger.level, LogLevel::Info);
        assert_eq!(config.logger.format, LogFormat::Text);
        assert_eq!(config.netbox.port, 443);
        assert_eq!(config.netbox.http_scheme, "https");
        assert!(config.netbox.validate_cert);
        assert_eq!(config.netbox.timeout, 30);
        assert_eq!(config.netbox.max_retries, 0);
        assert_eq!(config.netbox.tag, "netbox-ssot");
        assert!(config.netbox.remove_orphans);
        assert_eq!(config.netbox.orphan_mode, OrphanModeConfig::Soft);
        assert_eq!(config.netbox.remove_orphans_after_days, 5);
        assert_eq!(config.sources.len(), 1);
        assert_eq!(config.sources[0].source_type, "static");
    }

    #[test]
    fn test_full_document() {
        let raw = r#"
logger:
  level: debug
  format: json
  dest: /var/log/ssot.log
netbox:
  apiToken: "tok"
  hostname: netbox.local
  port: 8000
  httpScheme: http
  validateCert: false
  timeout: 10
  maxRetries: 3
  tag: ssot
  tagColor: "07426b"
  orphanMode: hard
  removeOrphansAfterDays: 2
  sourcePriority: [srcB, srcA]
source:
  - name: srcA
    type: static
    hostSiteRelations: ["^nyc-.* = NYC"]
    customFields:
      interval: 5
  - name: srcB
    type: static
    tag: "Inventory B"
    tagColor: "aa1409"
"#;
        let config = Config::from_yaml_str(raw).unwrap();
        assert_eq!(config.logger.level, LogLevel::Debug);
        assert_eq!(config.logger.format, LogFormat::Json);
        assert_eq!(config.netbox.orphan_mode, OrphanModeConfig::Hard);
        assert_eq!(config.sources[0].custom_fields["interval"], 5);
        assert_eq!(config.sources[1].tag_override(), Some("Inventory B"));
        assert_eq!(config.sources[0].tag_override(), None);

        let client = config.client_config().unwrap();
        assert_eq!(client.base_url, "http://netbox.local:8000");
        assert_eq!(client.timeout, Duration::from_secs(10));
        assert!(!client.validate_cert);

        let inventory = config.inventory_config();
        assert_eq!(inventory.identity_tag, "ssot");
        assert_eq!(inventory.priority.rank("srcB"), Some(0));
        assert_eq!(inventory.priority.rank("srcA"), Some(1));

        let sweep = config.sweep_options().unwrap();
        assert_eq!(sweep.mode, OrphanMode::Hard);
        assert_eq!(sweep.retain_days, 2);

        let relations = config.sources[0].relations().unwrap();
        assert_eq!(relations.host_site.matching("nyc-web"), Some("NYC"));
    }

    #[test]
    fn test_remove_orphans_disabled() {
        let raw = MINIMAL.replace("hostname: netbox.example.com", "hostname: nb\n  removeOrphans: false");
        let config = Config::from_yaml_str(&raw).unwrap();
        assert!(config.sweep_options().is_none());
    }

    #[test]
    fn test_env_token_overrides_file() {
        let raw = MINIMAL.replace("\"0123456789abcdef\"", "\"\"");
        let mut config: Config = serde_yaml::from_str(&raw).unwrap();
        assert!(config.validate().is_err());
        config.apply_env(|key| (key == API_TOKEN_ENV).then(|| "fromenv".to_string()));
        config.validate().unwrap();
        assert_eq!(config.netbox.api_token, "fromenv");
    }

    #[test]
    fn test_empty_env_token_is_ignored() {
        let mut config: Config = serde_yaml::from_str(MINIMAL).unwrap();
        config.apply_env(|_| Some(String::new()));
        assert_eq!(config.netbox.api_token, "0123456789abcdef");
    }

    fn invalid_field(raw: &str) -> String {
        match Config::from_yaml_str(raw).unwrap_err() {
            ConfigError::Invalid { field, .. } => field,
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_validation_rules() {
        assert_eq!(
            invalid_field(&MINIMAL.replace("netbox.example.com", "\"\"")),
            "netbox.hostname"
        );
        assert_eq!(
            invalid_field(&MINIMAL.replace("hostname: netbox.example.com", "hostname: nb\n  httpScheme: ftp")),
            "netbox.httpScheme"
        );
        assert_eq!(
            invalid_field(&MINIMAL.replace("hostname: netbox.example.com", "hostname: nb\n  timeout: 0")),
            "netbox.timeout"
        );
        assert_eq!(
            invalid_field(&MINIMAL.replace("hostname: netbox.example.com", "hostname: nb\n  tagColor: red")),
            "netbox.tagColor"
        );
        assert_eq!(
            invalid_field(&MINIMAL.replace(
                "hostname: netbox.example.com",
                "hostname: nb\n  sourcePriority: [srcA, srcZ]"
            )),
            "netbox.sourcePriority"
        );
        assert_eq!(invalid_field(&format!("{MINIMAL}  - name: srcA\n    type: static\n")), "source[1].name");
        assert_eq!(invalid_field(&format!("{MINIMAL}  - name: \"\"\n    type: static\n")), "source[1].name");
    }

    #[test]
    fn test_bad_relation_is_rejected() {
        let raw = format!("{MINIMAL}    hostSiteRelations: [\"^nyc-(.* = NYC\"]\n");
        assert!(matches!(
            Config::from_yaml_str(&raw).unwrap_err(),
            ConfigError::Relation { .. }
        ));
    }

    #[test]
    fn test_malformed_yaml() {
        assert!(matches!(
            Config::from_yaml_str("netbox: [unclosed").unwrap_err(),
            ConfigError::Parse(_)
        ));
    }

    #[test]
    fn test_missing_ca_file() {
        let raw = MINIMAL.replace(
            "hostname: netbox.example.com",
            "hostname: nb\n  caFile: /nonexistent/ca.pem",
        );
        let config = Config::from_yaml_str(&raw).unwrap();
        assert!(matches!(config.client_config().unwrap_err(), ConfigError::Io { .. }));
    }
}
