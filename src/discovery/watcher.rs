//! Catalog snapshot watcher.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::discovery::catalog::{load_catalog, CatalogRecord};

const POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Sends a fresh catalog snapshot every time the snapshot file changes.
pub struct CatalogWatcher {
    path: PathBuf,
    snapshots: mpsc::UnboundedSender<Vec<CatalogRecord>>,
}

impl CatalogWatcher {
    /// Returns the watcher and the receiving end of its snapshot channel.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<Vec<CatalogRecord>>) {
        let (snapshots, rx) = mpsc::unbounded_channel();
        let watcher = Self {
            path: path.to_path_buf(),
            snapshots,
        };
        (watcher, rx)
    }

    /// Start watching. Snapshots stop when the returned handle is dropped.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let path = self.path.clone();
        let snapshots = self.snapshots.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => forward_snapshot(&path, &event, &snapshots),
                Err(e) => tracing::error!(error = %e, "Catalog watch failed"),
            },
            Config::default().with_poll_interval(POLL_INTERVAL),
        )?;
        watcher.watch(&self.path, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, "Watching catalog snapshot");
        Ok(watcher)
    }
}

/// Reload and send the snapshot if the event touched its contents.
///
/// A snapshot that fails to load is logged and dropped; consumers keep the
/// routes they already have.
fn forward_snapshot(
    path: &Path,
    event: &Event,
    snapshots: &mpsc::UnboundedSender<Vec<CatalogRecord>>,
) {
    if !(event.kind.is_modify() || event.kind.is_create()) {
        return;
    }
    match load_catalog(path) {
        Ok(records) => {
            tracing::debug!(path = ?path, records = records.len(), "Catalog snapshot changed");
            // Receiver gone means nobody is rebuilding tables any more.
            let _ = snapshots.send(records);
        }
        Err(e) => tracing::warn!(path = ?path, error = %e, "Ignoring unreadable catalog snapshot"),
    }
}
