//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;

use meshcfg::config::{baseline, resolve, Document, Format, Overlay};
use tempfile::TempDir;

/// A realistic node configuration touching most groups.
pub const NODE_TOML: &str = r#"
cipher = "chachapoly"

[points]
lighthouse = ["192.0.2.1:4242", "192.0.2.2:4242"]

[pki]
ca = "/etc/mesh/ca.crt"
cert = "/etc/mesh/host.crt"
key = "/etc/mesh/host.key"

[listen]
port = 4242

[punchy]
enable = true
frequency = "10s"

[tun]
dev = "mesh0"
mtu = 1400

[[tun.routes]]
route = "10.20.0.0/16"
mtu = 1300

[logging]
level = "debug"
format = "json"

[[firewall.outbound]]
port = "any"
proto = "any"
point = "any"

[[firewall.inbound]]
port = "22"
proto = "tcp"
point = "any"
groups = ["admins"]
"#;

/// The same node expressed as JSON, minus the firewall rules.
pub const NODE_JSON: &str = r#"{
  "cipher": "chachapoly",
  "points": {"lighthouse": ["192.0.2.1:4242", "192.0.2.2:4242"]},
  "listen": {"port": 4242},
  "tun": {"dev": "mesh0", "mtu": 1400}
}"#;

/// Resolve JSON text against the baseline.
pub fn resolve_json(input: &str) -> Result<Document, meshcfg::config::ConfigError> {
    let overlay = Overlay::parse(input, Format::Json)?;
    Ok(resolve(&baseline(), &overlay)?)
}

/// Write `content` to `name` inside a fresh temporary directory.
///
/// Keep the returned directory alive for as long as the file is needed.
pub fn write_config(name: &str, content: &str) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    (dir, path)
}
