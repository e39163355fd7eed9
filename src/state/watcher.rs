/// File-system watcher that keeps the asset catalog in step with the disk.
///
/// Watches the asset root (for new categories) and every category directory
/// (for files appearing, disappearing or being renamed). Raw notify events
/// are classified into [`CatalogEvent`]s and sent over a channel to a single
/// reload worker, so reloads never race each other. The catalog may lag the
/// disk briefly; that is expected.

use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};
use std::sync::mpsc;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

use notify::event::ModifyKind;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use super::catalog::AssetCatalog;
use crate::error::WatchError;

/// A change the catalog has to react to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogEvent {
    /// A directory directly under the root was created or replaced
    Added(String),
    /// Something was created, removed or renamed in (or as) a category
    Changed(String),
}

#[derive(Debug)]
enum Message {
    Event(CatalogEvent),
    Shutdown,
}

/// Map a raw notify event onto the categories it touches
///
/// Only creations, removals and renames count. An event naming a category
/// directory itself yields `Added` while that directory exists, so a
/// directory removed and recreated in quick succession gets watched anew.
pub fn classify(root: &Path, event: &Event) -> Vec<CatalogEvent> {
    let relevant = matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Remove(_) | EventKind::Modify(ModifyKind::Name(_))
    );
    if !relevant {
        return Vec::new();
    }

    let mut out = Vec::new();
    for path in &event.paths {
        let Ok(relative) = path.strip_prefix(root) else {
            continue;
        };
        let mut components = relative.components();
        let Some(Component::Normal(first)) = components.next() else {
            continue;
        };
        let name = first.to_string_lossy().to_string();

        let event = if components.next().is_none() && path.is_dir() {
            CatalogEvent::Added(name)
        } else {
            CatalogEvent::Changed(name)
        };
        if !out.contains(&event) {
            out.push(event);
        }
    }
    out
}

/// Keeps an [`AssetCatalog`] up to date with its directory tree.
///
/// # Drop behavior
///
/// Dropping the `CatalogWatcher` stops the file-system watch and joins the
/// reload worker.
pub struct CatalogWatcher {
    /// Kept alive to maintain the watch
    _watcher: Arc<Mutex<RecommendedWatcher>>,
    sender: mpsc::Sender<Message>,
    worker: Option<JoinHandle<()>>,
}

impl CatalogWatcher {
    /// Start watching the catalog's root and all of its known categories
    pub fn spawn(catalog: Arc<AssetCatalog>) -> Result<Self, WatchError> {
        // Canonicalize so event paths match (e.g. /var -> /private/var on macOS)
        let root = catalog
            .root()
            .canonicalize()
            .unwrap_or_else(|_| catalog.root().to_path_buf());

        let (sender, receiver) = mpsc::channel();
        let event_sender = sender.clone();
        let event_root = root.clone();

        let mut watcher = notify::recommended_watcher(move |result: notify::Result<Event>| {
            match result {
                Ok(event) => {
                    for change in classify(&event_root, &event) {
                        // Ignore send error: the worker is shutting down
                        let _ = event_sender.send(Message::Event(change));
                    }
                }
                Err(e) => tracing::warn!(error = %e, "catalog watcher error"),
            }
        })?;

        watcher.watch(&root, RecursiveMode::NonRecursive)?;

        let mut watched = HashSet::new();
        for name in catalog.categories() {
            let path = root.join(&name);
            match watcher.watch(&path, RecursiveMode::NonRecursive) {
                Ok(()) => {
                    watched.insert(path);
                }
                Err(e) => tracing::warn!(category = %name, error = %e, "failed to watch category"),
            }
        }

        tracing::info!(root = %root.display(), categories = watched.len(), "catalog watcher started");

        let watcher = Arc::new(Mutex::new(watcher));
        let mut worker = ReloadWorker {
            catalog,
            watcher: Arc::clone(&watcher),
            root,
            watched,
        };
        let handle = thread::Builder::new()
            .name("catalog-reload".into())
            .spawn(move || worker.run(receiver))
            .map_err(WatchError::Spawn)?;

        Ok(Self {
            _watcher: watcher,
            sender,
            worker: Some(handle),
        })
    }
}

impl Drop for CatalogWatcher {
    fn drop(&mut self) {
        let _ = self.sender.send(Message::Shutdown);
        if let Some(handle) = self.worker.take() {
            if handle.join().is_err() {
                tracing::warn!("catalog reload worker panicked");
            }
        }
    }
}

/// The single owner of catalog reloads
struct ReloadWorker {
    catalog: Arc<AssetCatalog>,
    watcher: Arc<Mutex<RecommendedWatcher>>,
    root: PathBuf,
    watched: HashSet<PathBuf>,
}

impl ReloadWorker {
    fn run(&mut self, receiver: mpsc::Receiver<Message>) {
        while let Some(batch) = Self::next_batch(&receiver) {
            for event in batch {
                self.handle(event);
            }
        }
    }

    /// Block for one message, then coalesce whatever queued up behind it
    ///
    /// Duplicates collapse to one event in first-seen order. `None` on
    /// shutdown or once every sender is gone.
    fn next_batch(receiver: &mpsc::Receiver<Message>) -> Option<Vec<CatalogEvent>> {
        let first = receiver.recv().ok()?;
        let mut pending: Vec<CatalogEvent> = Vec::new();
        for message in std::iter::once(first).chain(receiver.try_iter()) {
            match message {
                Message::Shutdown => return None,
                Message::Event(event) => {
                    if !pending.contains(&event) {
                        pending.push(event);
                    }
                }
            }
        }
        Some(pending)
    }

    fn handle(&mut self, event: CatalogEvent) {
        match event {
            CatalogEvent::Added(name) => {
                tracing::info!(category = %name, "new category detected");
                // The directory may be a new inode behind a path we already
                // watched. Watch before scanning so files landing mid-scan
                // still notify.
                self.watch_category(&name, true);
                self.reload(&name);
            }
            CatalogEvent::Changed(name) => {
                // Unknown names are stray files at the root, unless an earlier
                // first scan of that directory failed
                if !self.catalog.contains(&name) && !self.root.join(&name).is_dir() {
                    return;
                }
                tracing::debug!(category = %name, "change detected in category");
                self.watch_category(&name, false);
                self.reload(&name);
            }
        }
    }

    /// Watch a category directory if it exists
    ///
    /// Without `force`, a path already in the watched set is skipped. A
    /// directory that vanished loses its OS watch; it is forgotten here so
    /// the next event after it reappears registers it again.
    fn watch_category(&mut self, name: &str, force: bool) {
        let path = self.root.join(name);
        if !path.is_dir() {
            self.watched.remove(&path);
            return;
        }
        if !force && self.watched.contains(&path) {
            return;
        }

        let mut watcher = self.watcher.lock().unwrap_or_else(PoisonError::into_inner);
        match watcher.watch(&path, RecursiveMode::NonRecursive) {
            Ok(()) => {
                self.watched.insert(path);
            }
            Err(e) => tracing::warn!(category = name, error = %e, "failed to watch category"),
        }
    }

    fn reload(&self, name: &str) {
        if let Err(e) = self.catalog.load_category(name) {
            tracing::warn!(category = name, error = %e, "category reload failed, keeping previous snapshot");
        }
    }
}
