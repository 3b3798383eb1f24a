//! Configuration file watcher for hot reload.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::handle::ConfigHandle;
use crate::config::loader::Format;
use crate::config::snapshot::Snapshot;

/// A watcher that monitors the configuration file for changes.
pub struct ConfigWatcher {
    path: PathBuf,
    handle: ConfigHandle,
    format: Option<Format>,
    update_tx: mpsc::UnboundedSender<Arc<Snapshot>>,
}

impl ConfigWatcher {
    /// Create a new ConfigWatcher publishing into `handle`.
    ///
    /// Returns the watcher and a receiver that yields every snapshot it
    /// publishes.
    pub fn new(path: &Path, handle: ConfigHandle) -> (Self, mpsc::UnboundedReceiver<Arc<Snapshot>>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        (
            Self {
                path: path.to_path_buf(),
                handle,
                format: None,
                update_tx,
            },
            update_rx,
        )
    }

    /// Parse the file as `format` instead of going by its extension.
    pub fn with_format(mut self, format: Format) -> Self {
        self.format = Some(format);
        self
    }

    /// Start watching the file in a background thread.
    ///
    /// Dropping the returned watcher stops it.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let tx = self.update_tx;
        let handle = self.handle;
        let format = self.format;
        let path = self.path.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if event.kind.is_modify() || event.kind.is_create() {
                        tracing::info!(path = %path.display(), "Config file change detected, reloading");
                        // Rejections are logged by the handle.
                        let reloaded = match format {
                            Some(format) => handle.reload_path_as(&path, format),
                            None => handle.reload_path(&path),
                        };
                        if let Ok(snapshot) = reloaded {
                            let _ = tx.send(snapshot);
                        }
                    }
                }
                Err(e) => tracing::error!("Watch error: {:?}", e),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&self.path, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, "Config watcher started");
        Ok(watcher)
    }
}
