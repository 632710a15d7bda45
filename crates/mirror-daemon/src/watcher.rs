//! Filesystem watcher for the mirrored directory tree.
//!
//! Wraps the OS watcher and maps raw notifications to [`WatchEvent`]s with
//! root-relative, `/`-separated paths. Events flow through a bounded channel
//! drained by the translator; when the channel fills up the notify callback
//! thread blocks, so a slow server applies backpressure to the watcher
//! instead of letting events queue without bound.

use anyhow::Result;
use notify::event::{CreateKind, EventKind, ModifyKind, RemoveKind, RenameMode};
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tracing::{debug, error};

/// Capacity of the watcher-to-translator channel. Blocking the watcher
/// thread on overflow preserves per-path event ordering.
const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// A change in the watched tree. Paths are relative to the root and
/// `/`-separated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    /// A file or directory appeared.
    Created { path: String, is_dir: bool },
    /// File contents changed. Directory modifications are delivered too but
    /// have no mirror action.
    Modified { path: String, is_dir: bool },
    /// A file or directory disappeared.
    Deleted { path: String, is_dir: bool },
    /// An entry moved within the watched tree.
    Renamed {
        from: String,
        to: String,
        is_dir: bool,
    },
}

/// Watches one directory tree recursively.
pub struct DirWatcher {
    /// Watched root (canonicalized)
    root: PathBuf,
    /// OS watcher handle (must keep alive)
    _watcher: RecommendedWatcher,
    /// Receiver for mapped events
    event_rx: mpsc::Receiver<WatchEvent>,
}

impl DirWatcher {
    /// Start watching `root` recursively.
    ///
    /// The path is canonicalized first so event paths (which the OS reports
    /// resolved) strip cleanly against it.
    pub fn new(root: PathBuf) -> Result<Self> {
        let root = root.canonicalize().unwrap_or(root);
        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let watch_root = root.clone();

        let mut watcher = notify::recommended_watcher(
            move |result: Result<notify::Event, notify::Error>| match result {
                Ok(event) => {
                    for mapped in map_event(&event, &watch_root) {
                        debug!("watch event: {:?}", mapped);
                        if event_tx.blocking_send(mapped).is_err() {
                            // Receiver dropped
                            return;
                        }
                    }
                }
                Err(e) => {
                    error!("File watcher error: {}", e);
                }
            },
        )?;

        watcher.watch(&root, RecursiveMode::Recursive)?;

        Ok(Self {
            root,
            _watcher: watcher,
            event_rx,
        })
    }

    /// Get the receiver for watch events.
    pub fn event_rx(&mut self) -> &mut mpsc::Receiver<WatchEvent> {
        &mut self.event_rx
    }

    /// Get the watched root.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Map one raw notification to zero or more watch events.
fn map_event(event: &notify::Event, root: &Path) -> Vec<WatchEvent> {
    match event.kind {
        EventKind::Create(kind) => {
            let Some(path) = relative(root, event.paths.first()) else {
                return Vec::new();
            };
            let is_dir = match kind {
                CreateKind::Folder => true,
                CreateKind::File => false,
                _ => is_dir_on_disk(root, &path),
            };
            vec![WatchEvent::Created { path, is_dir }]
        }
        EventKind::Remove(kind) => {
            let Some(path) = relative(root, event.paths.first()) else {
                return Vec::new();
            };
            // The entry is gone, so the kind hint is all there is; an
            // unknown kind is treated as a file and the server corrects a
            // wrong guess with a failure code.
            let is_dir = matches!(kind, RemoveKind::Folder);
            vec![WatchEvent::Deleted { path, is_dir }]
        }
        EventKind::Modify(ModifyKind::Name(mode)) => map_rename(event, root, mode),
        EventKind::Modify(ModifyKind::Data(_) | ModifyKind::Any) => {
            let Some(path) = relative(root, event.paths.first()) else {
                return Vec::new();
            };
            let is_dir = is_dir_on_disk(root, &path);
            vec![WatchEvent::Modified { path, is_dir }]
        }
        // Metadata-only changes and access notifications have no mirror
        // action.
        _ => Vec::new(),
    }
}

/// Map a rename notification. Only a paired rename becomes a true
/// [`WatchEvent::Renamed`]; platforms that report the halves separately
/// degrade to a deletion of the vacated path and a creation of the new one.
fn map_rename(event: &notify::Event, root: &Path, mode: RenameMode) -> Vec<WatchEvent> {
    match mode {
        RenameMode::Both => {
            let (Some(from), Some(to)) = (
                relative(root, event.paths.first()),
                relative(root, event.paths.get(1)),
            ) else {
                return Vec::new();
            };
            let is_dir = is_dir_on_disk(root, &to);
            vec![WatchEvent::Renamed { from, to, is_dir }]
        }
        RenameMode::From => {
            let Some(path) = relative(root, event.paths.first()) else {
                return Vec::new();
            };
            vec![WatchEvent::Deleted {
                path,
                is_dir: false,
            }]
        }
        _ => {
            // RenameMode::To, or an unlabeled rename half: the path either
            // exists now (treat as created) or it does not (treat as gone)
            let Some(path) = relative(root, event.paths.last()) else {
                return Vec::new();
            };
            if root.join(&path).exists() {
                let is_dir = is_dir_on_disk(root, &path);
                vec![WatchEvent::Created { path, is_dir }]
            } else {
                vec![WatchEvent::Deleted {
                    path,
                    is_dir: false,
                }]
            }
        }
    }
}

/// Root-relative, `/`-separated rendering of an event path.
///
/// Returns `None` for the root itself, paths outside the root, and paths
/// that are not valid UTF-8 — none of which can be mirrored.
fn relative(root: &Path, path: Option<&PathBuf>) -> Option<String> {
    let rel = path?.strip_prefix(root).ok()?;
    if rel.as_os_str().is_empty() {
        return None;
    }
    let mut parts = Vec::new();
    for component in rel.components() {
        parts.push(component.as_os_str().to_str()?);
    }
    Some(parts.join("/"))
}

fn is_dir_on_disk(root: &Path, rel: &str) -> bool {
    root.join(rel).is_dir()
}
