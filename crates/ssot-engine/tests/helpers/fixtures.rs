//! Config and inventory document fixtures written to a temp directory.

#![allow(dead_code)]

use std::path::PathBuf;

use ssot_engine::Config;
use tempfile::TempDir;

pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    /// Write `contents` to `name` inside the workspace.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    /// Path inside the workspace, whether or not it exists.
    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Write a config pointing at `uri` and load it. `netbox_extra` lines
    /// are appended to the `netbox` section (indented two spaces),
    /// `sources` is the body of the `source` list.
    pub fn config(&self, uri: &str, netbox_extra: &str, sources: &str) -> Config {
        let (host, port) = host_port(uri);
        let raw = format!(
            "logger:\n  level: debug\nnetbox:\n  apiToken: test-token\n  hostname: {host}\n  port: {port}\n  httpScheme: http\n  timeout: 5\n{netbox_extra}source:\n{sources}"
        );
        let path = self.write("config.yaml", &raw);
        Config::load(path).unwrap()
    }

    /// A `static` source entry reading `document` from the workspace.
    pub fn static_source(&self, name: &str, document: &str, extra: &str) -> String {
        let path = self.write(&format!("{name}.yaml"), document);
        format!(
            "  - name: {name}\n    type: static\n    path: {}\n{extra}",
            path.display()
        )
    }
}

/// `http://127.0.0.1:4567` → (`127.0.0.1`, 4567).
fn host_port(uri: &str) -> (String, u16) {
    let rest = uri.trim_start_matches("http://").trim_end_matches('/');
    let (host, port) = rest.rsplit_once(':').unwrap();
    (host.to_string(), port.parse().unwrap())
}
