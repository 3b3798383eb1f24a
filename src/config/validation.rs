//! Configuration validation.
//!
//! # Responsibilities
//! - Field-domain checks (ranges, enumerations, duration syntax)
//! - Cross-field checks (route MTU against interface MTU, persistence store)
//! - Shape checks for address-like strings (`host:port`, CIDR)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: Document → Result<(), Issues>
//! - Never coerces or clamps; a bad value is reported, not repaired

use std::fmt;
use std::net::{IpAddr, Ipv6Addr, SocketAddr};
use std::str::FromStr;

use crate::config::duration;
use crate::config::schema::{
    CipherKind, Document, FirewallAction, LogFormat, LogLevel, PskMode, RuleProto, SendRecvError,
    StatsKind, Transport, ANY,
};
use crate::config::value::Value;

/// Which stage rejected a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueKind {
    /// Present with the wrong shape, or unknown.
    Schema,
    /// Well-shaped but outside its documented domain.
    Domain,
}

/// A single rejected field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub path: String,
    pub kind: IssueKind,
    pub reason: String,
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            IssueKind::Schema => "schema",
            IssueKind::Domain => "domain",
        };
        write!(f, "{} ({}): {}", self.path, kind, self.reason)
    }
}

/// Every issue found in one resolve attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Issues(Vec<Issue>);

impl Issues {
    pub fn schema(&mut self, path: impl Into<String>, reason: impl Into<String>) {
        self.push(path.into(), IssueKind::Schema, reason.into());
    }

    pub fn domain(&mut self, path: impl Into<String>, reason: impl Into<String>) {
        self.push(path.into(), IssueKind::Domain, reason.into());
    }

    fn push(&mut self, path: String, kind: IssueKind, reason: String) {
        self.0.push(Issue { path, kind, reason });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Issue> {
        self.0.iter()
    }

    /// The first issue recorded at `path`.
    pub fn find(&self, path: &str) -> Option<&Issue> {
        self.0.iter().find(|issue| issue.path == path)
    }

    pub fn extend(&mut self, other: Issues) {
        self.0.extend(other.0);
    }

    /// `Ok(value)` when nothing was recorded.
    pub fn into_result<T>(self, value: T) -> Result<T, Issues> {
        if self.0.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for Issues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, issue) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}", issue)?;
        }
        Ok(())
    }
}

impl std::error::Error for Issues {}

impl IntoIterator for Issues {
    type Item = Issue;
    type IntoIter = std::vec::IntoIter<Issue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Validate a whole document, collecting every violation.
pub fn validate(doc: &Document) -> Result<(), Issues> {
    let mut issues = Issues::default();
    check(doc, &mut issues);
    issues.into_result(())
}

/// Append every domain violation in `doc` to `issues`.
pub fn check(doc: &Document, issues: &mut Issues) {
    let mut v = Checker { issues };

    // sync
    v.duration("sync.interval", &doc.sync.interval);
    if doc.sync.persistent && doc.sync.store.is_empty() {
        v.fail("sync.store", "must be set when sync.persistent is true");
    }

    // pki
    let expiry = &doc.pki.expiry_check;
    if expiry.enabled {
        v.duration("pki.expiry_check.time_left", &expiry.time_left);
        v.duration("pki.expiry_check.log_interval", &expiry.log_interval);
    }

    // points
    for (name, endpoints) in &doc.points {
        let path = format!("points.{}", name);
        if endpoints.is_empty() {
            v.fail(&path, "must list at least one endpoint");
        }
        for (i, endpoint) in endpoints.iter().enumerate() {
            v.host_port(&format!("{}[{}]", path, i), endpoint, false);
        }
    }

    // tower
    let tower = &doc.tower;
    v.port("tower.dns.port", tower.dns.port);
    if tower.dns.interval <= 0 {
        v.fail("tower.dns.interval", format!("must be > 0, got {}", tower.dns.interval));
    }
    v.non_negative("tower.interval", tower.interval);
    for (i, addr) in tower.advertise_addrs.iter().enumerate() {
        v.host_port(&format!("tower.advertise_addrs[{}]", i), addr, false);
    }
    for cidr in tower.remote_allow_list.keys() {
        v.cidr(&format!("tower.remote_allow_list.{}", cidr), cidr);
    }

    // listen
    let listen = &doc.listen;
    v.port("listen.port", listen.port);
    v.non_negative("listen.batch", listen.batch);
    v.non_negative("listen.read_buffer", listen.read_buffer);
    v.non_negative("listen.write_buffer", listen.write_buffer);
    v.non_negative("listen.routines", listen.routines);
    if !listen.send_recv_error.is_empty() {
        v.variant::<SendRecvError>("listen.send_recv_error", &listen.send_recv_error);
    }

    // punchy
    v.duration("punchy.frequency", &doc.punchy.frequency);
    v.duration("punchy.delay", &doc.punchy.delay);
    v.duration("punchy.respond_delay", &doc.punchy.respond_delay);

    // sshd
    let sshd = &doc.sshd;
    v.port("sshd.port", sshd.port);
    if sshd.enabled {
        for (i, user) in sshd.users.iter().enumerate() {
            if user.name.is_empty() {
                v.fail(format!("sshd.users[{}].name", i), "must be set when sshd is enabled");
            }
            if user.keys.is_empty() {
                v.fail(format!("sshd.users[{}].keys", i), "must list at least one key when sshd is enabled");
            }
        }
    }

    // proxy
    for (i, socks) in doc.proxy.socks5.iter().enumerate() {
        v.port(&format!("proxy.socks5[{}].port", i), socks.port);
    }
    for (i, forward) in doc.proxy.forward.iter().enumerate() {
        let path = format!("proxy.forward[{}]", i);
        v.variant::<Transport>(&format!("{}.proto", path), &forward.proto);
        v.host_port(&format!("{}.local", path), &forward.local, true);
        v.host_port(&format!("{}.remote", path), &forward.remote, false);
    }

    // tun
    let tun = &doc.tun;
    if tun.mtu <= 0 {
        v.fail("tun.mtu", format!("must be > 0, got {}", tun.mtu));
    }
    v.non_negative("tun.tx_queue", tun.tx_queue);
    for (i, route) in tun.routes.iter().enumerate() {
        let path = format!("tun.routes[{}]", i);
        v.cidr(&format!("{}.route", path), &route.route);
        v.route_mtu(&format!("{}.mtu", path), route.mtu, tun.mtu);
    }
    for (i, route) in tun.route_table.iter().enumerate() {
        let path = format!("tun.route_table[{}]", i);
        v.cidr(&format!("{}.route", path), &route.route);
        v.non_negative(&format!("{}.metric", path), route.metric);
        v.non_negative(&format!("{}.mtu", path), route.mtu);
        if !route.via.is_empty() && route.via.parse::<IpAddr>().is_err() {
            v.fail(format!("{}.via", path), format!("'{}' is not an IP address", route.via));
        }
    }

    // logging
    let logging = &doc.logging;
    v.variant::<LogLevel>("logging.level", &logging.level);
    v.variant::<LogFormat>("logging.format", &logging.format);
    v.non_negative("logging.max_size", logging.max_size);
    v.non_negative("logging.max_backups", logging.max_backups);
    v.non_negative("logging.max_age", logging.max_age);

    // stats
    let stats = &doc.stats;
    if !stats.kind.is_empty() {
        match stats.kind.parse::<StatsKind>() {
            Ok(StatsKind::Prometheus) => v.host_port("stats.listen", &stats.listen, true),
            Ok(StatsKind::Graphite) => {
                v.host_port("stats.server", &stats.server, false);
                v.variant::<Transport>("stats.protocol", &stats.protocol);
            }
            Err(e) => v.fail("stats.type", e.to_string()),
        }
    }

    // handshakes
    let handshakes = &doc.handshakes;
    v.duration("handshakes.try_interval", &handshakes.try_interval);
    v.duration("handshakes.churn_period", &handshakes.churn_period);
    v.non_negative("handshakes.retries", handshakes.retries);
    v.non_negative("handshakes.trigger_buffer", handshakes.trigger_buffer);
    v.non_negative("handshakes.churn_num_failures", handshakes.churn_num_failures);

    // timers
    v.non_negative("timers.connection_alive_interval", doc.timers.connection_alive_interval);
    v.non_negative("timers.pending_deletion_interval", doc.timers.pending_deletion_interval);

    // psk
    match PskMode::from_wire(&doc.psk.mode) {
        Ok(PskMode::Disabled) => {}
        Ok(mode) => v.psk_keys(mode, doc.psk.keys.as_ref()),
        Err(e) => v.fail("psk.mode", e.to_string()),
    }

    // firewall
    let firewall = &doc.firewall;
    v.duration("firewall.conntrack.tcp_timeout", &firewall.conntrack.tcp_timeout);
    v.duration("firewall.conntrack.udp_timeout", &firewall.conntrack.udp_timeout);
    v.duration("firewall.conntrack.default_timeout", &firewall.conntrack.default_timeout);
    v.variant::<FirewallAction>("firewall.outbound_action", &firewall.outbound_action);
    v.variant::<FirewallAction>("firewall.inbound_action", &firewall.inbound_action);
    for (i, rule) in firewall.outbound.iter().enumerate() {
        v.rule(&format!("firewall.outbound[{}]", i), &rule.port, &rule.proto, &rule.point);
    }
    for (i, rule) in firewall.inbound.iter().enumerate() {
        let path = format!("firewall.inbound[{}]", i);
        v.rule(&path, &rule.port, &rule.proto, &rule.point);
        for (j, group) in rule.groups.iter().enumerate() {
            if group.is_empty() {
                v.fail(format!("{}.groups[{}]", path, j), "must not be empty");
            }
        }
    }

    // cipher
    v.variant::<CipherKind>("cipher", &doc.cipher);
}

struct Checker<'a> {
    issues: &'a mut Issues,
}

impl Checker<'_> {
    fn fail(&mut self, path: impl Into<String>, reason: impl Into<String>) {
        self.issues.domain(path, reason);
    }

    fn duration(&mut self, path: &str, text: &str) {
        if let Err(e) = duration::parse(text) {
            self.fail(path, e.to_string());
        }
    }

    fn port(&mut self, path: &str, port: i64) {
        if !(0..=i64::from(u16::MAX)).contains(&port) {
            self.fail(path, format!("port {} is outside 0..=65535", port));
        }
    }

    fn non_negative(&mut self, path: &str, value: i64) {
        if value < 0 {
            self.fail(path, format!("must be >= 0, got {}", value));
        }
    }

    fn variant<T: FromStr>(&mut self, path: &str, text: &str)
    where
        T::Err: fmt::Display,
    {
        if let Err(e) = text.parse::<T>() {
            self.fail(path, e.to_string());
        }
    }

    fn host_port(&mut self, path: &str, text: &str, allow_empty_host: bool) {
        if !is_host_port(text, allow_empty_host) {
            self.fail(path, format!("'{}' is not a host:port address", text));
        }
    }

    fn cidr(&mut self, path: &str, text: &str) {
        if !is_cidr(text) {
            self.fail(path, format!("'{}' is not a CIDR range", text));
        }
    }

    fn route_mtu(&mut self, path: &str, mtu: i64, interface_mtu: i64) {
        if mtu < 0 {
            self.fail(path, format!("must be >= 0, got {}", mtu));
        } else if mtu > interface_mtu {
            self.fail(path, format!("{} exceeds tun.mtu {}", mtu, interface_mtu));
        }
    }

    fn rule(&mut self, path: &str, port: &str, proto: &str, point: &str) {
        if !is_rule_port(port) {
            self.fail(
                format!("{}.port", path),
                format!("'{}' is not 'any', a port, or a port range", port),
            );
        }
        self.variant::<RuleProto>(&format!("{}.proto", path), proto);
        if point.is_empty() {
            self.fail(format!("{}.point", path), format!("must be a point name or '{}'", ANY));
        }
    }

    fn psk_keys(&mut self, mode: PskMode, keys: Option<&Value>) {
        let keys = match keys {
            None => &[][..],
            Some(value) => match value.as_sequence() {
                Some(items) => items,
                None => {
                    self.fail("psk.keys", format!("must be a list of keys in {} mode", mode));
                    return;
                }
            },
        };
        for (i, key) in keys.iter().enumerate() {
            if key.as_str().map_or(true, str::is_empty) {
                self.fail(format!("psk.keys[{}]", i), "must be a non-empty string");
            }
        }
        if mode == PskMode::Strict && keys.is_empty() {
            self.fail("psk.keys", "strict mode requires at least one key");
        }
    }
}

/// `host:port`, with IPv6 hosts in brackets. An empty host (`:8080`) is
/// accepted only for local bind addresses.
pub fn is_host_port(text: &str, allow_empty_host: bool) -> bool {
    if text.parse::<SocketAddr>().is_ok() {
        return true;
    }
    let Some((host, port)) = text.rsplit_once(':') else {
        return false;
    };
    if port.parse::<u16>().is_err() {
        return false;
    }
    if host.is_empty() {
        return allow_empty_host;
    }
    if let Some(inner) = host.strip_prefix('[') {
        return inner
            .strip_suffix(']')
            .is_some_and(|ip| ip.parse::<Ipv6Addr>().is_ok());
    }
    !host.contains([':', '[', ']']) && !host.contains(char::is_whitespace)
}

/// `address/prefix` with the prefix bounded by the address family.
pub fn is_cidr(text: &str) -> bool {
    let Some((addr, prefix)) = text.split_once('/') else {
        return false;
    };
    let Ok(prefix) = prefix.parse::<u8>() else {
        return false;
    };
    match addr.parse::<IpAddr>() {
        Ok(IpAddr::V4(_)) => prefix <= 32,
        Ok(IpAddr::V6(_)) => prefix <= 128,
        Err(_) => false,
    }
}

/// `any`, a single port, or an inclusive range `low-high`.
pub fn is_rule_port(text: &str) -> bool {
    if text == ANY {
        return true;
    }
    match text.split_once('-') {
        Some((low, high)) => match (low.parse::<u16>(), high.parse::<u16>()) {
            (Ok(low), Ok(high)) => low <= high,
            _ => false,
        },
        None => text.parse::<u16>().is_ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::defaults::baseline;
    use crate::config::schema::{Forward, InboundRule, Route, Socks5, SshUser, TableRoute};

    #[test]
    fn test_baseline_is_valid() {
        assert!(validate(&baseline()).is_ok());
    }

    #[test]
    fn test_collects_every_violation() {
        let mut doc = baseline();
        doc.listen.port = 70000;
        doc.handshakes.try_interval = "abc".into();
        doc.logging.level = "verbose".into();
        doc.cipher = "rot13".into();

        let issues = validate(&doc).unwrap_err();
        assert_eq!(issues.len(), 4);
        assert!(issues.iter().all(|i| i.kind == IssueKind::Domain));
        assert!(issues.find("listen.port").is_some());
        assert!(issues.find("handshakes.try_interval").is_some());
        assert!(issues.find("logging.level").is_some());
        assert!(issues.find("cipher").is_some());
    }

    #[test]
    fn test_port_boundaries() {
        let mut doc = baseline();
        doc.listen.port = 0;
        doc.sshd.port = 65535;
        assert!(validate(&doc).is_ok());

        doc.listen.port = -1;
        doc.sshd.port = 65536;
        let issues = validate(&doc).unwrap_err();
        assert_eq!(issues.len(), 2);
    }

    #[test]
    fn test_route_mtu_bounded_by_interface() {
        let mut doc = baseline();
        doc.tun.routes = vec![
            Route { mtu: 0, route: "10.0.0.0/8".into() },
            Route { mtu: 1300, route: "10.1.0.0/16".into() },
            Route { mtu: 9000, route: "10.2.0.0/16".into() },
        ];
        let issues = validate(&doc).unwrap_err();
        assert_eq!(issues.len(), 1);
        assert!(issues.find("tun.routes[2].mtu").is_some());
    }

    #[test]
    fn test_persistent_sync_needs_store() {
        let mut doc = baseline();
        doc.sync.persistent = true;
        assert!(validate(&doc).unwrap_err().find("sync.store").is_some());

        doc.sync.store = "/var/lib/mesh/config".into();
        assert!(validate(&doc).is_ok());
    }

    #[test]
    fn test_sshd_users_need_keys_only_when_enabled() {
        let mut doc = baseline();
        doc.sshd.users = vec![SshUser { name: "ops".into(), keys: vec![] }];
        assert!(validate(&doc).is_ok());

        doc.sshd.enabled = true;
        let issues = validate(&doc).unwrap_err();
        assert!(issues.find("sshd.users[0].keys").is_some());
    }

    #[test]
    fn test_forward_rules() {
        let mut doc = baseline();
        doc.proxy.forward = vec![
            Forward { proto: "tcp".into(), local: ":8080".into(), remote: "db:5432".into() },
            Forward { proto: "sctp".into(), local: "127.0.0.1:53".into(), remote: "nohost".into() },
        ];
        let issues = validate(&doc).unwrap_err();
        assert_eq!(issues.len(), 2);
        assert!(issues.find("proxy.forward[1].proto").is_some());
        assert!(issues.find("proxy.forward[1].remote").is_some());
    }

    #[test]
    fn test_firewall_rule_fields() {
        let mut doc = baseline();
        doc.firewall.inbound = vec![
            InboundRule { port: "22".into(), proto: "tcp".into(), point: "any".into(), groups: vec![] },
            InboundRule { port: "1000-2000".into(), proto: "udp".into(), point: "lab".into(), groups: vec!["ops".into()] },
            InboundRule { port: "2000-1000".into(), proto: "gre".into(), point: "".into(), groups: vec!["".into()] },
        ];
        let issues = validate(&doc).unwrap_err();
        assert_eq!(issues.len(), 4);
        assert!(issues.find("firewall.inbound[2].port").is_some());
        assert!(issues.find("firewall.inbound[2].proto").is_some());
        assert!(issues.find("firewall.inbound[2].point").is_some());
        assert!(issues.find("firewall.inbound[2].groups[0]").is_some());
    }

    #[test]
    fn test_psk_keys_shape_follows_mode() {
        let mut doc = baseline();
        doc.psk.keys = Some(Value::from("not-a-list"));
        assert!(validate(&doc).is_ok());

        doc.psk.mode = "permissive".into();
        assert!(validate(&doc).unwrap_err().find("psk.keys").is_some());

        doc.psk.keys = None;
        assert!(validate(&doc).is_ok());

        doc.psk.mode = "strict".into();
        assert!(validate(&doc).unwrap_err().find("psk.keys").is_some());

        doc.psk.keys = Some(Value::Sequence(vec![Value::from("k1"), Value::from(7)]));
        assert!(validate(&doc).unwrap_err().find("psk.keys[1]").is_some());
    }

    #[test]
    fn test_stats_listener_required_for_prometheus() {
        let mut doc = baseline();
        doc.stats.kind = "prometheus".into();
        assert!(validate(&doc).unwrap_err().find("stats.listen").is_some());

        doc.stats.listen = ":9100".into();
        assert!(validate(&doc).is_ok());

        doc.stats.kind = "statsd".into();
        assert!(validate(&doc).unwrap_err().find("stats.type").is_some());
    }

    #[test]
    fn test_route_table_entries() {
        let mut doc = baseline();
        doc.tun.route_table = vec![
            TableRoute { route: "10.3.0.0/16".into(), via: "10.0.0.1".into(), mtu: 1200, metric: 10, enable: true },
            TableRoute { route: "10.4.0.0/16".into(), ..Default::default() },
        ];
        assert!(validate(&doc).is_ok());

        doc.tun.route_table.push(TableRoute {
            route: "10.5.0.0".into(),
            via: "gateway".into(),
            mtu: -1,
            metric: -5,
            enable: true,
        });
        let issues = validate(&doc).unwrap_err();
        assert_eq!(issues.len(), 4);
        assert!(issues.find("tun.route_table[2].route").is_some());
        assert!(issues.find("tun.route_table[2].via").is_some());
        assert!(issues.find("tun.route_table[2].mtu").is_some());
        assert!(issues.find("tun.route_table[2].metric").is_some());
    }

    #[test]
    fn test_point_groups() {
        let mut doc = baseline();
        doc.points.insert("lighthouse".into(), vec!["192.0.2.1:4242".into(), "[fd00::1]:4242".into()]);
        assert!(validate(&doc).is_ok());

        doc.points.insert("empty".into(), vec![]);
        doc.points.insert("relay".into(), vec!["192.0.2.9:4242".into(), "192.0.2.10".into()]);
        let issues = validate(&doc).unwrap_err();
        assert_eq!(issues.len(), 2);
        assert!(issues.find("points.empty").is_some());
        assert!(issues.find("points.relay[1]").is_some());
    }

    #[test]
    fn test_tower_intervals_and_allow_list() {
        let mut doc = baseline();
        doc.tower.interval = 0;
        doc.tower.dns.interval = 1;
        doc.tower.remote_allow_list.insert("10.0.0.0/8".into(), true);
        doc.tower.remote_allow_list.insert("fd00::/8".into(), false);
        assert!(validate(&doc).is_ok());

        doc.tower.dns.interval = 0;
        doc.tower.interval = -1;
        doc.tower.remote_allow_list.insert("not-a-range".into(), true);
        doc.tower.advertise_addrs = vec!["198.51.100.4".into()];
        let issues = validate(&doc).unwrap_err();
        assert_eq!(issues.len(), 4);
        assert!(issues.find("tower.dns.interval").is_some());
        assert!(issues.find("tower.interval").is_some());
        assert!(issues.find("tower.remote_allow_list.not-a-range").is_some());
        assert!(issues.find("tower.advertise_addrs[0]").is_some());

        doc.tower.dns.interval = -30;
        assert!(validate(&doc).unwrap_err().find("tower.dns.interval").is_some());
    }

    #[test]
    fn test_expiry_durations_checked_only_when_enabled() {
        let mut doc = baseline();
        doc.pki.expiry_check.time_left = "soon".into();
        doc.pki.expiry_check.log_interval = "often".into();
        assert!(validate(&doc).is_ok());

        doc.pki.expiry_check.enabled = true;
        let issues = validate(&doc).unwrap_err();
        assert_eq!(issues.len(), 2);
        assert!(issues.find("pki.expiry_check.time_left").is_some());
        assert!(issues.find("pki.expiry_check.log_interval").is_some());

        doc.pki.expiry_check.time_left = "720h".into();
        doc.pki.expiry_check.log_interval = "24h".into();
        assert!(validate(&doc).is_ok());
    }

    #[test]
    fn test_firewall_actions() {
        let mut doc = baseline();
        doc.firewall.inbound_action = "allow".into();
        doc.firewall.outbound_action = "drop".into();
        assert!(validate(&doc).is_ok());

        doc.firewall.inbound_action = "reject".into();
        doc.firewall.outbound_action = "".into();
        let issues = validate(&doc).unwrap_err();
        assert_eq!(issues.len(), 2);
        assert!(issues.find("firewall.inbound_action").is_some());
        assert!(issues.find("firewall.outbound_action").is_some());
    }

    #[test]
    fn test_malformed_durations_everywhere() {
        let mut doc = baseline();
        doc.sync.interval = "5m".into();
        doc.punchy.frequency = "10s".into();
        doc.punchy.respond_delay = "0".into();
        doc.firewall.conntrack.tcp_timeout = "".into();
        assert!(validate(&doc).is_ok());

        doc.sync.interval = "5 minutes".into();
        doc.punchy.frequency = "10".into();
        doc.punchy.delay = "1d".into();
        doc.punchy.respond_delay = "-1s".into();
        doc.firewall.conntrack.tcp_timeout = "forever".into();
        doc.firewall.conntrack.udp_timeout = "3 m".into();
        doc.firewall.conntrack.default_timeout = "1w".into();
        let issues = validate(&doc).unwrap_err();
        assert_eq!(issues.len(), 7);
        for path in [
            "sync.interval",
            "punchy.frequency",
            "punchy.delay",
            "punchy.respond_delay",
            "firewall.conntrack.tcp_timeout",
            "firewall.conntrack.udp_timeout",
            "firewall.conntrack.default_timeout",
        ] {
            assert!(issues.find(path).is_some(), "missing {path}");
        }
    }

    #[test]
    fn test_graphite_needs_server_and_protocol() {
        let mut doc = baseline();
        doc.stats.kind = "graphite".into();
        let issues = validate(&doc).unwrap_err();
        assert_eq!(issues.len(), 2);
        assert!(issues.find("stats.server").is_some());
        assert!(issues.find("stats.protocol").is_some());

        doc.stats.server = "graphite.example.net:2003".into();
        doc.stats.protocol = "tcp".into();
        assert!(validate(&doc).is_ok());

        doc.stats.protocol = "http".into();
        assert!(validate(&doc).unwrap_err().find("stats.protocol").is_some());
    }

    #[test]
    fn test_send_recv_error() {
        let mut doc = baseline();
        for mode in ["", "always", "never", "private"] {
            doc.listen.send_recv_error = mode.into();
            assert!(validate(&doc).is_ok(), "{mode} rejected");
        }
        doc.listen.send_recv_error = "sometimes".into();
        assert!(validate(&doc).unwrap_err().find("listen.send_recv_error").is_some());
    }

    #[test]
    fn test_negative_counters() {
        let mut doc = baseline();
        doc.timers.connection_alive_interval = 0;
        doc.logging.max_size = 100;
        assert!(validate(&doc).is_ok());

        doc.timers.connection_alive_interval = -1;
        doc.timers.pending_deletion_interval = -1;
        doc.logging.max_size = -1;
        doc.logging.max_backups = -1;
        doc.logging.max_age = -1;
        let issues = validate(&doc).unwrap_err();
        assert_eq!(issues.len(), 5);
        assert!(issues.find("timers.connection_alive_interval").is_some());
        assert!(issues.find("timers.pending_deletion_interval").is_some());
        assert!(issues.find("logging.max_size").is_some());
        assert!(issues.find("logging.max_backups").is_some());
        assert!(issues.find("logging.max_age").is_some());
    }

    #[test]
    fn test_socks5_ports() {
        let mut doc = baseline();
        doc.proxy.socks5 = vec![
            Socks5 { addr: "127.0.0.1".into(), port: 1080, ..Default::default() },
            Socks5 { addr: "127.0.0.1".into(), port: 65535, ..Default::default() },
        ];
        assert!(validate(&doc).is_ok());

        doc.proxy.socks5.push(Socks5 { port: 70000, ..Default::default() });
        let issues = validate(&doc).unwrap_err();
        assert_eq!(issues.len(), 1);
        assert!(issues.find("proxy.socks5[2].port").is_some());
    }

    #[test]
    fn test_bracketed_hosts_must_be_ipv6() {
        assert!(is_host_port("[fd00::1]:80", false));
        assert!(!is_host_port("[foo]:80", false));
        assert!(!is_host_port("[]:80", true));
        assert!(!is_host_port("[10.0.0.1]:80", false));
        assert!(!is_host_port("[fd00::1:80", false));
        assert!(!is_host_port("fo]o:80", false));
    }

    #[test]
    fn test_address_shapes() {
        assert!(is_host_port("10.0.0.1:4242", false));
        assert!(is_host_port("[fd00::1]:4242", false));
        assert!(is_host_port("tower.example.net:4242", false));
        assert!(!is_host_port(":4242", false));
        assert!(is_host_port(":4242", true));
        assert!(!is_host_port("fd00::1:4242", false));
        assert!(!is_host_port("host:99999", false));

        assert!(is_cidr("10.0.0.0/8"));
        assert!(is_cidr("fd00::/64"));
        assert!(!is_cidr("10.0.0.0/33"));
        assert!(!is_cidr("10.0.0.0"));

        assert!(is_rule_port("any"));
        assert!(is_rule_port("443"));
        assert!(!is_rule_port("0x1bb"));
    }
}
