//! Structural merge of a user overlay onto a baseline document.
//!
//! # Rules
//! - a field the overlay does not mention (or sets to `null`) keeps the
//!   baseline value
//! - scalars and sequences replace outright; sequences are never
//!   concatenated or merged by position
//! - mapping fields merge key by key, recursing into mapping-valued entries
//! - nested groups recurse with the group's baseline
//!
//! A field of the wrong shape, or a key the schema does not know, is
//! recorded as a schema issue and merging carries on so that one attempt
//! reports every problem.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde_json::Value as Json;

use crate::config::loader::{ConfigError, Format};
use crate::config::schema::{
    Conntrack, Dns, Document, ExpiryCheck, Firewall, Handshakes, Listen, Logging, Pki, Proxy, Psk,
    Punchy, Sshd, Stats, SyncPolicy, Timers, Tower, Tun,
};
use crate::config::validation::{self, Issues};
use crate::config::value::Value;

/// Path reported for problems with the document root itself.
pub const ROOT: &str = "<root>";

/// A parsed, not yet merged, user document.
#[derive(Debug, Clone, PartialEq)]
pub struct Overlay {
    tree: Json,
}

impl Overlay {
    /// An overlay that mentions nothing.
    pub fn empty() -> Self {
        Self {
            tree: Json::Object(Default::default()),
        }
    }

    /// Parse `input` in the given format. Only syntax is checked here.
    pub fn parse(input: &str, format: Format) -> Result<Self, ConfigError> {
        let tree = match format {
            Format::Json => serde_json::from_str(input).map_err(ConfigError::from_json)?,
            Format::Toml => toml::from_str(input).map_err(|e| ConfigError::from_toml(e, input))?,
        };
        Ok(Self { tree })
    }

    /// An overlay that sets every field of `doc`.
    pub fn from_document(doc: &Document) -> Result<Self, serde_json::Error> {
        Ok(Self {
            tree: serde_json::to_value(doc)?,
        })
    }

    pub fn from_json(tree: Json) -> Self {
        Self { tree }
    }
}

impl Default for Overlay {
    fn default() -> Self {
        Self::empty()
    }
}

/// Merge `overlay` onto `baseline`, then validate the result.
///
/// Schema and domain issues are returned together. The baseline is never
/// modified; on error nothing of the merge escapes.
pub fn resolve(baseline: &Document, overlay: &Overlay) -> Result<Document, Issues> {
    let mut issues = Issues::default();
    let merged = apply(baseline, overlay, &mut issues);
    validation::check(&merged, &mut issues);
    issues.into_result(merged)
}

/// Structural merge only. Shape problems are appended to `issues`.
pub fn apply(baseline: &Document, overlay: &Overlay, issues: &mut Issues) -> Document {
    let mut doc = baseline.clone();
    match &overlay.tree {
        Json::Null => {}
        tree @ Json::Object(_) => group(&mut doc, tree, "", issues),
        _ => issues.schema(ROOT, "expected a table at the document root"),
    }
    doc
}

/// A group whose fields can be overlaid one key at a time.
trait Merge {
    /// Overlay a single field. Returns false when `key` is not a field.
    fn merge_field(&mut self, key: &str, value: &Json, path: &str, issues: &mut Issues) -> bool;
}

/// Values stored under mapping keys.
trait MapEntry: Sized {
    fn decode(value: &Json, path: &str, issues: &mut Issues) -> Option<Self>;

    fn merge_entry(&mut self, value: &Json, path: &str, issues: &mut Issues) {
        if let Some(v) = Self::decode(value, path, issues) {
            *self = v;
        }
    }
}

fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", path, key)
    }
}

fn decode<T: DeserializeOwned>(value: &Json, path: &str, issues: &mut Issues) -> Option<T> {
    match T::deserialize(value) {
        Ok(v) => Some(v),
        Err(e) => {
            issues.schema(path, e.to_string());
            None
        }
    }
}

fn replace<T: DeserializeOwned>(slot: &mut T, value: &Json, path: &str, issues: &mut Issues) {
    if let Some(v) = decode(value, path, issues) {
        *slot = v;
    }
}

fn group<G: Merge>(slot: &mut G, value: &Json, path: &str, issues: &mut Issues) {
    let Some(table) = value.as_object() else {
        issues.schema(path, format!("expected a table, found {}", kind(value)));
        return;
    };
    for (key, item) in table {
        if item.is_null() {
            continue;
        }
        let at = join(path, key);
        if !slot.merge_field(key, item, &at, issues) {
            issues.schema(at, "unknown field");
        }
    }
}

fn map<V: MapEntry>(slot: &mut BTreeMap<String, V>, value: &Json, path: &str, issues: &mut Issues) {
    let Some(table) = value.as_object() else {
        issues.schema(path, format!("expected a mapping, found {}", kind(value)));
        return;
    };
    for (key, item) in table {
        if item.is_null() {
            continue;
        }
        let at = join(path, key);
        match slot.get_mut(key) {
            Some(existing) => existing.merge_entry(item, &at, issues),
            None => {
                if let Some(v) = V::decode(item, &at, issues) {
                    slot.insert(key.clone(), v);
                }
            }
        }
    }
}

fn any(slot: &mut Option<Value>, value: &Json, _path: &str, _issues: &mut Issues) {
    match slot {
        Some(existing) => existing.merge_json(value),
        None => *slot = Value::from_json(value),
    }
}

fn kind(value: &Json) -> &'static str {
    match value {
        Json::Null => "null",
        Json::Bool(_) => "a boolean",
        Json::Number(_) => "a number",
        Json::String(_) => "a string",
        Json::Array(_) => "a sequence",
        Json::Object(_) => "a table",
    }
}

impl MapEntry for String {
    fn decode(value: &Json, path: &str, issues: &mut Issues) -> Option<Self> {
        decode(value, path, issues)
    }
}

impl MapEntry for bool {
    fn decode(value: &Json, path: &str, issues: &mut Issues) -> Option<Self> {
        decode(value, path, issues)
    }
}

impl MapEntry for Vec<String> {
    fn decode(value: &Json, path: &str, issues: &mut Issues) -> Option<Self> {
        decode(value, path, issues)
    }
}

impl MapEntry for Value {
    fn decode(value: &Json, _path: &str, _issues: &mut Issues) -> Option<Self> {
        Value::from_json(value)
    }

    fn merge_entry(&mut self, value: &Json, _path: &str, _issues: &mut Issues) {
        self.merge_json(value);
    }
}

impl<V: MapEntry> MapEntry for BTreeMap<String, V> {
    fn decode(value: &Json, path: &str, issues: &mut Issues) -> Option<Self> {
        let mut entries = BTreeMap::new();
        map(&mut entries, value, path, issues);
        Some(entries)
    }

    fn merge_entry(&mut self, value: &Json, path: &str, issues: &mut Issues) {
        map(self, value, path, issues);
    }
}

/// Implement [`Merge`] by dispatching each wire key to a merge strategy:
/// `replace` (scalars, sequences), `group`, `map` or `any`.
macro_rules! merge_fields {
    (@key $field:ident) => { stringify!($field) };
    (@key $field:ident $wire:literal) => { $wire };
    ($ty:ident { $($field:ident $(as $wire:literal)? => $how:ident),+ $(,)? }) => {
        impl Merge for $ty {
            fn merge_field(
                &mut self,
                key: &str,
                value: &Json,
                path: &str,
                issues: &mut Issues,
            ) -> bool {
                $(
                    if key == merge_fields!(@key $field $($wire)?) {
                        $how(&mut self.$field, value, path, issues);
                        return true;
                    }
                )+
                false
            }
        }
    };
}

merge_fields!(Document {
    sync => group,
    pki => group,
    points => map,
    tower => group,
    listen => group,
    punchy => group,
    sshd => group,
    proxy => group,
    tun => group,
    logging => group,
    stats => group,
    handshakes => group,
    timers => group,
    psk => group,
    firewall => group,
    cipher => replace,
});

merge_fields!(SyncPolicy {
    enable => replace,
    persistent => replace,
    interval => replace,
    source => replace,
    store => replace,
    addition => replace,
});

merge_fields!(ExpiryCheck {
    enabled => replace,
    time_left => replace,
    log_interval => replace,
});

merge_fields!(Pki {
    ca => replace,
    cert => replace,
    key => replace,
    blocklist => replace,
    disconnect_invalid => replace,
    expiry_check => group,
});

merge_fields!(Dns {
    enable => replace,
    addr => replace,
    port => replace,
    interval => replace,
    mirror => replace,
    records => map,
});

merge_fields!(Tower {
    service => replace,
    dns => group,
    interval => replace,
    detection_point => map,
    remote_allow_list => map,
    remote_allow_ranges => map,
    local_allow_list => map,
    advertise_addrs => replace,
});

merge_fields!(Listen {
    addr => replace,
    port => replace,
    batch => replace,
    read_buffer => replace,
    write_buffer => replace,
    send_recv_error => replace,
    routines => replace,
});

merge_fields!(Punchy {
    enable => replace,
    frequency => replace,
    respond => replace,
    delay => replace,
    respond_delay => replace,
    preferred_ranges => replace,
});

merge_fields!(Sshd {
    enabled => replace,
    port => replace,
    point_key => replace,
    users => replace,
});

merge_fields!(Proxy {
    socks5 => replace,
    forward => replace,
});

merge_fields!(Tun {
    enable => replace,
    dev => replace,
    drop_local_broadcast => replace,
    drop_multicast => replace,
    tx_queue => replace,
    mtu => replace,
    routes => replace,
    route_table => replace,
});

merge_fields!(Logging {
    level => replace,
    lang => replace,
    format => replace,
    file_path => replace,
    max_size => replace,
    max_backups => replace,
    max_age => replace,
});

merge_fields!(Stats {
    kind as "type" => replace,
    listen => replace,
    path => replace,
    name_space => replace,
    extension as "extention" => replace,
    prefix => replace,
    protocol => replace,
    server => replace,
    message_metrics => replace,
    tower_metrics => replace,
});

merge_fields!(Handshakes {
    try_interval => replace,
    retries => replace,
    trigger_buffer => replace,
    churn_limiting => replace,
    churn_num_failures => replace,
    churn_period => replace,
});

merge_fields!(Timers {
    connection_alive_interval => replace,
    pending_deletion_interval => replace,
});

merge_fields!(Psk {
    mode => replace,
    keys => any,
});

merge_fields!(Conntrack {
    tcp_timeout => replace,
    udp_timeout => replace,
    default_timeout => replace,
});

merge_fields!(Firewall {
    outbound_action => replace,
    inbound_action => replace,
    conntrack => group,
    outbound => replace,
    inbound => replace,
});
