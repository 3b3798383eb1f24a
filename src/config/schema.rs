//! Configuration schema definitions.
//!
//! This module defines the complete document tree consumed by the mesh
//! client. Every group is an owned value; nothing refers back into another
//! group. Point groups are referenced by name only.
//!
//! Fields keep their wire shape (strings for durations and enumerations,
//! signed integers for counts and ports). The accepted domain of each field
//! is documented here and enforced by [`crate::config::validation`]; the
//! wire enums below are the single source of truth for enumerated fields.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::value::Value;

/// Root configuration document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    /// Background re-fetch policy.
    pub sync: SyncPolicy,

    /// Identity material and revocation policy.
    pub pki: Pki,

    /// Named endpoint groups: name → ordered `host:port` list.
    pub points: BTreeMap<String, Vec<String>>,

    /// Rendezvous service, embedded DNS responder and allow lists.
    pub tower: Tower,

    /// Local bind address and socket tuning.
    pub listen: Listen,

    /// NAT keepalive/punch scheduling.
    pub punchy: Punchy,

    /// Embedded management shell.
    pub sshd: Sshd,

    /// SOCKS5 listeners and static forwards.
    pub proxy: Proxy,

    /// Virtual interface and static routes.
    pub tun: Tun,

    /// Log sink configuration.
    pub logging: Logging,

    /// Metrics exporter.
    pub stats: Stats,

    /// Handshake retry and churn policy.
    pub handshakes: Handshakes,

    /// Background sweep intervals.
    pub timers: Timers,

    /// Pre-shared-key negotiation.
    pub psk: Psk,

    /// Connection tracking and rule lists.
    pub firewall: Firewall,

    /// Symmetric cipher, one of [`CipherKind`].
    pub cipher: String,
}

/// Background configuration re-fetch.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SyncPolicy {
    pub enable: bool,
    /// When set, `store` must name where fetched documents are kept.
    pub persistent: bool,
    /// Duration between fetches.
    pub interval: String,
    pub source: String,
    pub store: String,
    pub addition: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExpiryCheck {
    pub enabled: bool,
    /// Duration before expiry at which warnings begin.
    pub time_left: String,
    /// Duration between expiry log lines.
    pub log_interval: String,
}

/// Identity material. `ca`, `cert` and `key` are paths or inline PEM.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Pki {
    pub ca: String,
    pub cert: String,
    pub key: String,
    pub blocklist: Vec<String>,
    pub disconnect_invalid: bool,
    pub expiry_check: ExpiryCheck,
}

/// Embedded DNS responder.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dns {
    pub enable: bool,
    pub addr: String,
    /// 0..=65535.
    pub port: i64,
    /// Refresh interval in seconds, > 0.
    pub interval: i64,
    pub mirror: String,
    pub records: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Tower {
    pub service: bool,
    pub dns: Dns,
    /// Update interval in seconds; 0 leaves the choice to the tower client.
    pub interval: i64,
    pub detection_point: BTreeMap<String, BTreeMap<String, Value>>,
    /// CIDR → allowed.
    pub remote_allow_list: BTreeMap<String, bool>,
    pub remote_allow_ranges: BTreeMap<String, BTreeMap<String, bool>>,
    pub local_allow_list: BTreeMap<String, Value>,
    pub advertise_addrs: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Listen {
    pub addr: String,
    /// 0..=65535.
    pub port: i64,
    pub batch: i64,
    pub read_buffer: i64,
    pub write_buffer: i64,
    /// One of [`SendRecvError`], or empty.
    pub send_recv_error: String,
    pub routines: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Punchy {
    pub enable: bool,
    pub frequency: String,
    pub respond: bool,
    pub delay: String,
    pub respond_delay: String,
    pub preferred_ranges: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SshUser {
    pub name: String,
    pub keys: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Sshd {
    pub enabled: bool,
    pub port: i64,
    pub point_key: String,
    pub users: Vec<SshUser>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Socks5 {
    pub addr: String,
    pub port: i64,
    pub user: String,
    pub password: String,
}

/// Static port forward.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Forward {
    /// One of [`Transport`].
    pub proto: String,
    pub local: String,
    pub remote: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Proxy {
    pub socks5: Vec<Socks5>,
    pub forward: Vec<Forward>,
}

/// Route carried by the mesh. `mtu` of 0 inherits the interface MTU.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Route {
    pub mtu: i64,
    pub route: String,
}

/// Route installed in the host table via a mesh address.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TableRoute {
    pub route: String,
    pub via: String,
    pub mtu: i64,
    pub metric: i64,
    pub enable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tun {
    pub enable: bool,
    pub dev: String,
    pub drop_local_broadcast: bool,
    pub drop_multicast: bool,
    pub tx_queue: i64,
    pub mtu: i64,
    pub routes: Vec<Route>,
    pub route_table: Vec<TableRoute>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Logging {
    /// One of [`LogLevel`].
    pub level: String,
    pub lang: String,
    /// One of [`LogFormat`].
    pub format: String,
    pub file_path: String,
    pub max_size: i64,
    pub max_backups: i64,
    pub max_age: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Stats {
    /// One of [`StatsKind`]; empty disables the exporter.
    #[serde(rename = "type")]
    pub kind: String,
    pub listen: String,
    pub path: String,
    pub name_space: String,
    #[serde(rename = "extention")]
    pub extension: String,
    pub prefix: String,
    pub protocol: String,
    pub server: String,
    pub message_metrics: bool,
    pub tower_metrics: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Handshakes {
    pub try_interval: String,
    pub retries: i64,
    pub trigger_buffer: i64,
    pub churn_limiting: bool,
    pub churn_num_failures: i64,
    pub churn_period: String,
}

/// Sweep intervals in seconds.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Timers {
    pub connection_alive_interval: i64,
    pub pending_deletion_interval: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Psk {
    /// One of [`PskMode`]; empty means disabled.
    pub mode: String,
    /// A sequence of key strings when the mode is permissive or strict.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keys: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Conntrack {
    pub tcp_timeout: String,
    pub udp_timeout: String,
    pub default_timeout: String,
}

/// `port`, `proto` and `point` are literals or the wildcard `any`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutboundRule {
    pub port: String,
    pub proto: String,
    pub point: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InboundRule {
    pub port: String,
    pub proto: String,
    pub point: String,
    pub groups: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Firewall {
    /// One of [`FirewallAction`]; applies to traffic matching no rule.
    pub outbound_action: String,
    pub inbound_action: String,
    pub conntrack: Conntrack,
    pub outbound: Vec<OutboundRule>,
    pub inbound: Vec<InboundRule>,
}

/// Wildcard accepted by firewall rule fields.
pub const ANY: &str = "any";

/// Error returned when a string is outside an enumerated wire domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant {
    pub found: String,
    pub expected: &'static [&'static str],
}

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' is not one of {}", self.found, self.expected.join(", "))
    }
}

impl std::error::Error for UnknownVariant {}

macro_rules! wire_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $wire:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            /// Accepted wire spellings.
            pub const VARIANTS: &'static [&'static str] = &[$($wire),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $wire),+
                }
            }
        }

        impl FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($wire => Ok($name::$variant),)+
                    _ => Err(UnknownVariant {
                        found: s.to_string(),
                        expected: Self::VARIANTS,
                    }),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

wire_enum!(
    /// `logging.level`.
    LogLevel {
        Debug => "debug",
        Info => "info",
        Warn => "warn",
        Error => "error",
        Fatal => "fatal",
    }
);

wire_enum!(
    /// `logging.format`.
    LogFormat {
        Text => "text",
        Json => "json",
    }
);

wire_enum!(
    /// `psk.mode`. An empty mode is read as `Disabled`.
    PskMode {
        Disabled => "disabled",
        Permissive => "permissive",
        Strict => "strict",
    }
);

wire_enum!(
    /// `firewall.inbound_action` / `firewall.outbound_action`.
    FirewallAction {
        Allow => "allow",
        Drop => "drop",
    }
);

wire_enum!(
    /// `cipher`.
    CipherKind {
        Aes => "aes",
        ChachaPoly => "chachapoly",
    }
);

wire_enum!(
    /// `stats.type`. An empty type disables the exporter.
    StatsKind {
        Prometheus => "prometheus",
        Graphite => "graphite",
    }
);

wire_enum!(
    /// `proxy.forward[].proto` and `stats.protocol`.
    Transport {
        Tcp => "tcp",
        Udp => "udp",
    }
);

wire_enum!(
    /// Firewall rule `proto`.
    RuleProto {
        Any => "any",
        Tcp => "tcp",
        Udp => "udp",
        Icmp => "icmp",
    }
);

wire_enum!(
    /// `listen.send_recv_error`: which peers receive recv_error replies.
    SendRecvError {
        Always => "always",
        Never => "never",
        Private => "private",
    }
);

impl PskMode {
    /// Parse a mode, reading the empty string as `Disabled`.
    pub fn from_wire(s: &str) -> Result<Self, UnknownVariant> {
        if s.is_empty() {
            Ok(PskMode::Disabled)
        } else {
            s.parse()
        }
    }
}

impl LogLevel {
    /// The `tracing` directive for this level. `fatal` has no direct
    /// counterpart and maps to `error`.
    pub fn as_directive(self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error | LogLevel::Fatal => "error",
        }
    }
}
