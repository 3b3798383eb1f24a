//! Baseline document.
//!
//! Every group that carries a non-zero default implements [`Default`] here;
//! the remaining groups derive it. Nothing in this module reads the
//! environment or the filesystem, so [`baseline`] is idempotent.

use std::collections::BTreeMap;

use crate::config::schema::{
    Conntrack, Dns, Document, Firewall, FirewallAction, Handshakes, Listen, Logging, OutboundRule,
    Punchy, Tun, ANY,
};

/// MTU of the virtual interface when none is configured.
pub const DEFAULT_MTU: i64 = 1300;

/// UDP port the client binds when none is configured.
pub const DEFAULT_LISTEN_PORT: i64 = 35533;

/// Build the fully populated baseline document.
pub fn baseline() -> Document {
    Document::default()
}

impl Default for Document {
    fn default() -> Self {
        Self {
            sync: Default::default(),
            pki: Default::default(),
            points: BTreeMap::new(),
            tower: Default::default(),
            listen: Listen::default(),
            punchy: Punchy::default(),
            sshd: Default::default(),
            proxy: Default::default(),
            tun: Tun::default(),
            logging: Logging::default(),
            stats: Default::default(),
            handshakes: Handshakes::default(),
            timers: Default::default(),
            psk: Default::default(),
            firewall: Firewall::default(),
            cipher: "aes".to_string(),
        }
    }
}

impl Default for Dns {
    fn default() -> Self {
        Self {
            enable: false,
            addr: String::new(),
            port: 0,
            interval: 60,
            mirror: String::new(),
            records: BTreeMap::new(),
        }
    }
}

impl Default for Listen {
    fn default() -> Self {
        Self {
            addr: "0.0.0.0".to_string(),
            port: DEFAULT_LISTEN_PORT,
            batch: 64,
            read_buffer: 0,
            write_buffer: 0,
            send_recv_error: String::new(),
            routines: 0,
        }
    }
}

impl Default for Punchy {
    fn default() -> Self {
        Self {
            enable: true,
            frequency: String::new(),
            respond: false,
            delay: "1s".to_string(),
            respond_delay: String::new(),
            preferred_ranges: Vec::new(),
        }
    }
}

impl Default for Tun {
    fn default() -> Self {
        Self {
            enable: false,
            dev: "vlan".to_string(),
            drop_local_broadcast: true,
            drop_multicast: true,
            tx_queue: 500,
            mtu: DEFAULT_MTU,
            routes: Vec::new(),
            route_table: Vec::new(),
        }
    }
}

impl Default for Logging {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            lang: String::new(),
            format: "text".to_string(),
            file_path: String::new(),
            max_size: 0,
            max_backups: 0,
            max_age: 0,
        }
    }
}

impl Default for Handshakes {
    fn default() -> Self {
        Self {
            try_interval: "100ms".to_string(),
            retries: 20,
            trigger_buffer: 0,
            churn_limiting: false,
            churn_num_failures: 0,
            churn_period: String::new(),
        }
    }
}

impl Default for Conntrack {
    fn default() -> Self {
        Self {
            tcp_timeout: "120h".to_string(),
            udp_timeout: "3m".to_string(),
            default_timeout: "10m".to_string(),
        }
    }
}

impl Default for Firewall {
    fn default() -> Self {
        // Unmatched traffic is dropped in both directions. The single
        // outbound rule opens all egress; inbound stays closed until the
        // user adds rules or relaxes `inbound_action`.
        Self {
            outbound_action: FirewallAction::Drop.to_string(),
            inbound_action: FirewallAction::Drop.to_string(),
            conntrack: Conntrack::default(),
            outbound: vec![OutboundRule {
                port: ANY.to_string(),
                proto: ANY.to_string(),
                point: ANY.to_string(),
            }],
            inbound: Vec::new(),
        }
    }
}
