//! Read-only view over a resolved document.
//!
//! A [`Snapshot`] is built once per resolve and never changes afterwards.
//! Subsystems share it through `Arc` and read it without locking; a reload
//! publishes a new snapshot instead of touching this one.

use std::time::Duration;

use serde_json::Value as Json;

use crate::config::duration;
use crate::config::merge::ROOT;
use crate::config::schema::{
    CipherKind, Document, FirewallAction, LogFormat, LogLevel, PskMode, StatsKind,
};
use crate::config::validation::{self, Issues};
use crate::config::value::Value;

/// Durations parsed once at freeze time.
#[derive(Debug, Clone, Default)]
struct Durations {
    sync_interval: Option<Duration>,
    expiry_time_left: Option<Duration>,
    expiry_log_interval: Option<Duration>,
    punchy_frequency: Option<Duration>,
    punchy_delay: Option<Duration>,
    punchy_respond_delay: Option<Duration>,
    handshake_try_interval: Option<Duration>,
    handshake_churn_period: Option<Duration>,
    conntrack_tcp: Option<Duration>,
    conntrack_udp: Option<Duration>,
    conntrack_default: Option<Duration>,
}

/// A validated, frozen document.
#[derive(Debug, Clone)]
pub struct Snapshot {
    document: Document,
    tree: Json,
    durations: Durations,
}

impl Snapshot {
    /// Validate `document` and freeze it.
    pub fn freeze(document: Document) -> Result<Self, Issues> {
        validation::validate(&document)?;

        let mut issues = Issues::default();
        let tree = match serde_json::to_value(&document) {
            Ok(tree) => tree,
            Err(e) => {
                issues.schema(ROOT, e.to_string());
                return Err(issues);
            }
        };

        // Syntax was checked by validation; `ok().flatten()` only drops
        // fields that are unset.
        let d = |text: &str| duration::parse(text).ok().flatten();
        let durations = Durations {
            sync_interval: d(&document.sync.interval),
            expiry_time_left: d(&document.pki.expiry_check.time_left),
            expiry_log_interval: d(&document.pki.expiry_check.log_interval),
            punchy_frequency: d(&document.punchy.frequency),
            punchy_delay: d(&document.punchy.delay),
            punchy_respond_delay: d(&document.punchy.respond_delay),
            handshake_try_interval: d(&document.handshakes.try_interval),
            handshake_churn_period: d(&document.handshakes.churn_period),
            conntrack_tcp: d(&document.firewall.conntrack.tcp_timeout),
            conntrack_udp: d(&document.firewall.conntrack.udp_timeout),
            conntrack_default: d(&document.firewall.conntrack.default_timeout),
        };

        Ok(Self {
            document,
            tree,
            durations,
        })
    }

    /// The resolved document.
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Look up a scalar or sequence by dotted path (`"tun.mtu"`,
    /// `"points.lighthouse"`, `"tun.routes.0.route"`).
    ///
    /// Paths naming a group or mapping return `None`; use [`Self::get_group`].
    pub fn get(&self, path: &str) -> Option<Value> {
        let node = self.node(path)?;
        if node.is_object() {
            return None;
        }
        Value::from_json(node)
    }

    /// Look up a group or mapping field by dotted path. The empty path
    /// returns the whole document.
    pub fn get_group(&self, path: &str) -> Option<Value> {
        let node = self.node(path)?;
        if !node.is_object() {
            return None;
        }
        Value::from_json(node)
    }

    /// Whether anything lives at `path`.
    pub fn contains(&self, path: &str) -> bool {
        self.node(path).is_some()
    }

    fn node(&self, path: &str) -> Option<&Json> {
        if path.is_empty() {
            return Some(&self.tree);
        }
        let segments: Vec<&str> = path.split('.').collect();
        lookup(&self.tree, &segments)
    }

    pub fn listen_addr(&self) -> &str {
        &self.document.listen.addr
    }

    pub fn listen_port(&self) -> u16 {
        u16::try_from(self.document.listen.port).unwrap_or_default()
    }

    pub fn tun_mtu(&self) -> u32 {
        u32::try_from(self.document.tun.mtu).unwrap_or_default()
    }

    /// Endpoints of a named point group, in configured order.
    pub fn point(&self, name: &str) -> Option<&[String]> {
        self.document.points.get(name).map(Vec::as_slice)
    }

    // The wire enums below were checked by validation; the fallbacks are
    // the baseline values and are never taken for a frozen snapshot.

    pub fn log_level(&self) -> LogLevel {
        self.document.logging.level.parse().unwrap_or(LogLevel::Info)
    }

    pub fn log_format(&self) -> LogFormat {
        self.document.logging.format.parse().unwrap_or(LogFormat::Text)
    }

    pub fn cipher(&self) -> CipherKind {
        self.document.cipher.parse().unwrap_or(CipherKind::Aes)
    }

    pub fn psk_mode(&self) -> PskMode {
        PskMode::from_wire(&self.document.psk.mode).unwrap_or(PskMode::Disabled)
    }

    pub fn inbound_action(&self) -> FirewallAction {
        self.document.firewall.inbound_action.parse().unwrap_or(FirewallAction::Drop)
    }

    pub fn outbound_action(&self) -> FirewallAction {
        self.document.firewall.outbound_action.parse().unwrap_or(FirewallAction::Drop)
    }

    /// `None` when the exporter is disabled.
    pub fn stats_kind(&self) -> Option<StatsKind> {
        self.document.stats.kind.parse().ok()
    }

    pub fn sync_interval(&self) -> Option<Duration> {
        self.durations.sync_interval
    }

    pub fn expiry_time_left(&self) -> Option<Duration> {
        self.durations.expiry_time_left
    }

    pub fn expiry_log_interval(&self) -> Option<Duration> {
        self.durations.expiry_log_interval
    }

    pub fn punchy_frequency(&self) -> Option<Duration> {
        self.durations.punchy_frequency
    }

    pub fn punchy_delay(&self) -> Option<Duration> {
        self.durations.punchy_delay
    }

    pub fn punchy_respond_delay(&self) -> Option<Duration> {
        self.durations.punchy_respond_delay
    }

    pub fn handshake_try_interval(&self) -> Option<Duration> {
        self.durations.handshake_try_interval
    }

    pub fn handshake_churn_period(&self) -> Option<Duration> {
        self.durations.handshake_churn_period
    }

    pub fn conntrack_tcp_timeout(&self) -> Option<Duration> {
        self.durations.conntrack_tcp
    }

    pub fn conntrack_udp_timeout(&self) -> Option<Duration> {
        self.durations.conntrack_udp
    }

    pub fn conntrack_default_timeout(&self) -> Option<Duration> {
        self.durations.conntrack_default
    }
}

/// Walk `segments` down from `node`.
///
/// Mapping keys may themselves contain dots (`points.eu.west`,
/// `tower.remote_allow_list.10.0.0.0/8`), so at each table the longest run
/// of remaining segments that names a key is tried first.
fn lookup<'a>(node: &'a Json, segments: &[&str]) -> Option<&'a Json> {
    let Some((first, rest)) = segments.split_first() else {
        return Some(node);
    };
    match node {
        Json::Object(map) => (1..=segments.len()).rev().find_map(|n| {
            let key = segments[..n].join(".");
            lookup(map.get(&key)?, &segments[n..])
        }),
        Json::Array(items) => lookup(items.get(first.parse::<usize>().ok()?)?, rest),
        _ => None,
    }
}
