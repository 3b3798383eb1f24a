//! Swappable handle to the active configuration.
//!
//! Subsystems receive a clone of the handle at construction time and call
//! [`ConfigHandle::load`] whenever they need the current snapshot. A reload
//! resolves the new document off to the side and publishes it with a
//! single pointer swap, so a reader sees either the old snapshot or the new
//! one and never a partial merge. Snapshots already handed out stay valid
//! and unchanged after the swap.

use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use arc_swap::ArcSwap;

use crate::config::loader::{self, ConfigError, Format};
use crate::config::snapshot::Snapshot;

/// A snapshot together with the revision it was published as. Swapped as
/// one unit so the two are never observed out of step.
#[derive(Debug)]
struct Published {
    revision: u64,
    snapshot: Arc<Snapshot>,
}

#[derive(Debug)]
struct Shared {
    current: ArcSwap<Published>,
    /// Held across resolve and publish so reloads land in call order.
    writer: Mutex<()>,
}

/// Cloneable handle; every clone observes the same published snapshot.
#[derive(Debug, Clone)]
pub struct ConfigHandle {
    shared: Arc<Shared>,
}

impl ConfigHandle {
    pub fn new(initial: Snapshot) -> Self {
        Self {
            shared: Arc::new(Shared {
                current: ArcSwap::from_pointee(Published {
                    revision: 0,
                    snapshot: Arc::new(initial),
                }),
                writer: Mutex::new(()),
            }),
        }
    }

    /// The snapshot currently in effect.
    pub fn load(&self) -> Arc<Snapshot> {
        Arc::clone(&self.shared.current.load().snapshot)
    }

    /// Number of snapshots published since the handle was created.
    pub fn revision(&self) -> u64 {
        self.shared.current.load().revision
    }

    /// The current snapshot and its revision, read together.
    pub fn load_versioned(&self) -> (u64, Arc<Snapshot>) {
        let current = self.shared.current.load();
        (current.revision, Arc::clone(&current.snapshot))
    }

    /// Publish an already resolved snapshot.
    pub fn store(&self, snapshot: Snapshot) -> Arc<Snapshot> {
        let _writer = self.shared.writer.lock().unwrap_or_else(PoisonError::into_inner);
        self.publish_locked(snapshot)
    }

    /// Resolve `input` against a fresh baseline and publish it.
    ///
    /// On any error the current snapshot stays in effect.
    pub fn reload_str(&self, input: &str, format: Format) -> Result<Arc<Snapshot>, ConfigError> {
        self.reload(|| loader::load_str(input, format))
    }

    /// Reload from a file, picking the format from its extension.
    pub fn reload_path(&self, path: &Path) -> Result<Arc<Snapshot>, ConfigError> {
        self.reload(|| loader::load_path(path))
    }

    /// Reload from a file in an explicit format.
    pub fn reload_path_as(&self, path: &Path, format: Format) -> Result<Arc<Snapshot>, ConfigError> {
        self.reload(|| loader::load_path_as(path, format))
    }

    fn reload<F>(&self, load: F) -> Result<Arc<Snapshot>, ConfigError>
    where
        F: FnOnce() -> Result<Snapshot, ConfigError>,
    {
        let _writer = self.shared.writer.lock().unwrap_or_else(PoisonError::into_inner);
        match load() {
            Ok(snapshot) => Ok(self.publish_locked(snapshot)),
            Err(e) => {
                tracing::warn!(error = %e, "Reload rejected, keeping current configuration");
                Err(e)
            }
        }
    }

    /// Caller holds the writer lock.
    fn publish_locked(&self, snapshot: Snapshot) -> Arc<Snapshot> {
        let snapshot = Arc::new(snapshot);
        let revision = self.shared.current.load().revision + 1;
        self.shared.current.store(Arc::new(Published {
            revision,
            snapshot: Arc::clone(&snapshot),
        }));
        tracing::info!(revision, "Configuration published");
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::defaults::baseline;

    fn handle() -> ConfigHandle {
        ConfigHandle::new(Snapshot::freeze(baseline()).unwrap())
    }

    #[test]
    fn test_reload_publishes_new_snapshot() {
        let handle = handle();
        let before = handle.load();

        handle.reload_str("[tun]\nmtu = 1400\n", Format::Toml).unwrap();

        assert_eq!(handle.revision(), 1);
        assert_eq!(handle.load().document().tun.mtu, 1400);
        assert_eq!(before.document().tun.mtu, 1300);
    }

    #[test]
    fn test_failed_reload_keeps_previous() {
        let handle = handle();
        handle.reload_str(r#"{"listen": {"port": 4242}}"#, Format::Json).unwrap();

        let err = handle
            .reload_str(r#"{"handshakes": {"try_interval": "abc"}}"#, Format::Json)
            .unwrap_err();
        assert!(err.issues().unwrap().find("handshakes.try_interval").is_some());

        let err = handle.reload_str("{", Format::Json).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));

        assert_eq!(handle.revision(), 1);
        assert_eq!(handle.load().listen_port(), 4242);
    }

    #[test]
    fn test_reload_starts_from_baseline() {
        let handle = handle();
        handle.reload_str(r#"{"listen": {"port": 4242}}"#, Format::Json).unwrap();
        handle.reload_str(r#"{"cipher": "chachapoly"}"#, Format::Json).unwrap();

        let current = handle.load();
        assert_eq!(current.listen_port(), 35533);
        assert_eq!(current.document().cipher, "chachapoly");
    }

    #[test]
    fn test_concurrent_reloads_publish_in_step() {
        let handle = handle();
        let writers: Vec<_> = (0..8i64)
            .map(|t| {
                let handle = handle.clone();
                std::thread::spawn(move || {
                    for i in 0..25i64 {
                        let port = 1000 + t * 100 + i;
                        let input = format!(r#"{{"listen": {{"port": {port}}}}}"#);
                        handle.reload_str(&input, Format::Json).unwrap();
                    }
                })
            })
            .collect();

        let mut last = 0;
        while writers.iter().any(|w| !w.is_finished()) {
            let (revision, snapshot) = handle.load_versioned();
            assert!(revision >= last);
            assert_eq!(revision == 0, snapshot.listen_port() == 35533);
            last = revision;
        }
        for writer in writers {
            writer.join().unwrap();
        }

        assert_eq!(handle.revision(), 200);
        assert_eq!(handle.load_versioned().0, 200);
    }

    #[test]
    fn test_clones_share_state() {
        let handle = handle();
        let other = handle.clone();
        other.reload_str(r#"{"tun": {"dev": "mesh0"}}"#, Format::Json).unwrap();
        assert_eq!(handle.load().document().tun.dev, "mesh0");
    }
}
