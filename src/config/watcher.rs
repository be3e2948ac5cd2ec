//! Snapshot file watcher for the `watch` command.
//!
//! # Data Flow
//! ```text
//! notify event (modify/create)
//!     → change signal on an mpsc channel
//!     → forwarder task waits until the burst settles
//!     → re-reads the file; empty or unparsable content is skipped
//!     → forwards the snapshot only if it differs from the last one
//! ```
//!
//! # Design Decisions
//! - The notify callback never reads the file; a rewrite truncates before it
//!   writes, and reading mid-rewrite yields an empty snapshot
//! - An empty file is never a valid snapshot here, even though it parses

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::{parse_snapshot, read_to_string};
use crate::config::schema::EventSnapshot;

/// Quiet period after the last change event before the file is re-read.
pub const SETTLE_DELAY: Duration = Duration::from_millis(250);

/// A watcher that reloads the event snapshot whenever it changes.
pub struct SnapshotWatcher {
    path: PathBuf,
    update_tx: mpsc::UnboundedSender<EventSnapshot>,
}

impl SnapshotWatcher {
    /// Create a new SnapshotWatcher.
    ///
    /// Returns the watcher and a receiver for reloaded snapshots.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<EventSnapshot>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        (
            Self {
                path: path.to_path_buf(),
                update_tx,
            },
            update_rx,
        )
    }

    /// Start watching the file and spawn the forwarder on the current runtime.
    ///
    /// The returned handle must be kept alive for as long as events are wanted.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let (change_tx, change_rx) = mpsc::unbounded_channel();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if event.kind.is_modify() || event.kind.is_create() => {
                    let _ = change_tx.send(());
                }
                Ok(_) => {}
                Err(e) => tracing::error!("Watch error: {:?}", e),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;
        watcher.watch(&self.path, RecursiveMode::NonRecursive)?;

        let last = reload(&self.path);
        tokio::spawn(forward_changes(
            self.path.clone(),
            change_rx,
            self.update_tx,
            last,
        ));

        tracing::info!(path = ?self.path, "Snapshot watcher started");
        Ok(watcher)
    }
}

async fn forward_changes(
    path: PathBuf,
    mut changes: mpsc::UnboundedReceiver<()>,
    updates: mpsc::UnboundedSender<EventSnapshot>,
    mut last: Option<EventSnapshot>,
) {
    while changes.recv().await.is_some() {
        loop {
            match tokio::time::timeout(SETTLE_DELAY, changes.recv()).await {
                Ok(Some(())) => continue,
                Ok(None) => return,
                Err(_) => break,
            }
        }

        let Some(snapshot) = reload(&path) else {
            continue;
        };
        if last.as_ref() == Some(&snapshot) {
            tracing::debug!(path = ?path, "Snapshot content unchanged");
            continue;
        }

        tracing::info!(path = ?path, "Snapshot change detected, reloading");
        last = Some(snapshot.clone());
        if updates.send(snapshot).is_err() {
            return;
        }
    }
}

fn reload(path: &Path) -> Option<EventSnapshot> {
    let content = match read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            tracing::error!("Failed to reload snapshot: {}. Waiting for the next change.", e);
            return None;
        }
    };

    if content.trim().is_empty() {
        tracing::debug!(path = ?path, "Snapshot file is empty, waiting for the writer");
        return None;
    }

    match parse_snapshot(&content) {
        Ok(snapshot) => Some(snapshot),
        Err(e) => {
            tracing::error!("Failed to reload snapshot: {}. Waiting for the next change.", e);
            None
        }
    }
}
