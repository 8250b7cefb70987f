//! File-backed cache of transformed value trees.
//!
//! The database owns one entry per loaded path: the most recently
//! transformed tree, a dirty flag driven by filesystem notifications, and
//! the watch subscription that feeds it. Reloads are lazy: a notification
//! only marks the path dirty, and the next [`Database::get`] call performs
//! the reload before serving data.

use crate::loading::{self, LoadError};
use crate::watch::{WatchHandle, WatchService};
use parking_lot::Mutex;
use runlog_types::{History, Value};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// Errors surfaced by [`Database::get`].
#[derive(Error, Debug)]
pub enum GetError {
    #[error("file {} has not been loaded", .0.display())]
    NotLoaded(PathBuf),

    #[error("reload of {} failed", path.display())]
    ReloadFailed {
        path: PathBuf,
        #[source]
        source: LoadError,
    },

    #[error("no key `{segment}` under `{parent}`")]
    PathNotFound { segment: String, parent: String },
}

/// Cache of loaded log files, kept consistent with the filesystem through
/// a [`WatchService`].
///
/// Trees are immutable once built; a reload installs a fresh `Arc<Value>`
/// wholesale, so callers holding a previously returned tree are never
/// affected. All shared state sits behind mutexes because watch callbacks
/// arrive on a background thread.
pub struct Database {
    service: Arc<dyn WatchService>,
    // Watch callbacks touch only this set; they must never block on the
    // entry map while a load is in progress.
    dirty: Arc<Mutex<HashSet<PathBuf>>>,
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    files: HashMap<PathBuf, Arc<Value>>,
    watchers: HashMap<PathBuf, Box<dyn WatchHandle>>,
    last_errors: HashMap<PathBuf, String>,
}

impl Database {
    /// Create a database over an explicitly-owned watch service.
    pub fn new(service: Arc<dyn WatchService>) -> Self {
        Self {
            service,
            dirty: Arc::new(Mutex::new(HashSet::new())),
            state: Mutex::new(State::default()),
        }
    }

    /// Load (or reload) `path`, replacing any cached tree on success.
    ///
    /// A failed load reports its error and leaves the previously cached
    /// tree untouched; stale data is preferred over no data. Either way
    /// the path leaves the dirty set, since the attempt has been made.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<(), LoadError> {
        let path = path.as_ref();
        debug!(path = %path.display(), "loading file into database");

        let result = loading::load_file(path);
        self.dirty.lock().remove(path);

        let mut state = self.state.lock();
        let tree = match result {
            Ok(tree) => tree,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "load failed");
                state.last_errors.insert(path.to_path_buf(), err.to_string());
                return Err(err);
            }
        };
        state.files.insert(path.to_path_buf(), Arc::new(tree));
        state.last_errors.remove(path);

        if !state.watchers.contains_key(path) {
            let handle = self.arm_watch(path)?;
            state.watchers.insert(path.to_path_buf(), handle);
        }
        Ok(())
    }

    /// Fetch the cached tree for `path`, reloading first if it is dirty.
    ///
    /// `subpath` is a "/"-separated key sequence descending through maps
    /// and histories; `None` (or an empty string) returns the whole tree.
    /// When a dirty reload fails but an older tree is still cached, the
    /// stale tree is served and the failure is recorded under
    /// [`Database::last_error`].
    pub fn get(&self, path: impl AsRef<Path>, subpath: Option<&str>) -> Result<Arc<Value>, GetError> {
        let path = path.as_ref();
        if !self.state.lock().files.contains_key(path) {
            return Err(GetError::NotLoaded(path.to_path_buf()));
        }

        if self.is_dirty(path) {
            debug!(path = %path.display(), "path is dirty, reloading");
            if let Err(err) = self.load(path) {
                let state = self.state.lock();
                if state.files.contains_key(path) {
                    warn!(path = %path.display(), error = %err, "reload failed, serving stale tree");
                } else {
                    return Err(GetError::ReloadFailed {
                        path: path.to_path_buf(),
                        source: err,
                    });
                }
            }
        }

        let tree = self
            .state
            .lock()
            .files
            .get(path)
            .cloned()
            .ok_or_else(|| GetError::NotLoaded(path.to_path_buf()))?;

        match subpath.filter(|s| !s.is_empty()) {
            None => Ok(tree),
            Some(subpath) => descend(&tree, subpath).map(Arc::new),
        }
    }

    /// Mark `path` as needing a reload before the next `get`.
    ///
    /// Watch callbacks funnel into this; it is idempotent and O(1).
    pub fn mark_dirty(&self, path: impl AsRef<Path>) {
        self.dirty.lock().insert(path.as_ref().to_path_buf());
    }

    pub fn is_dirty(&self, path: impl AsRef<Path>) -> bool {
        self.dirty.lock().contains(path.as_ref())
    }

    /// Paths with a currently cached tree.
    pub fn loaded_paths(&self) -> Vec<PathBuf> {
        self.state.lock().files.keys().cloned().collect()
    }

    /// Message of the most recent failed load for `path`, if the cached
    /// tree is stale because of it.
    pub fn last_error(&self, path: impl AsRef<Path>) -> Option<String> {
        self.state.lock().last_errors.get(path.as_ref()).cloned()
    }

    /// Cancel every watch subscription. Entries stay readable; they just
    /// no longer track the filesystem.
    pub fn close(&self) {
        let mut state = self.state.lock();
        for (_, mut handle) in state.watchers.drain() {
            handle.cancel();
        }
    }

    fn arm_watch(&self, path: &Path) -> Result<Box<dyn WatchHandle>, LoadError> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let dirty = Arc::clone(&self.dirty);
        let target = path.to_path_buf();
        debug!(path = %path.display(), dir = %dir.display(), "arming watch");
        self.service
            .watch(
                &dir,
                Box::new(move |_changed| {
                    dirty.lock().insert(target.clone());
                }),
            )
            .map_err(|source| LoadError::Watch {
                path: path.to_path_buf(),
                source,
            })
    }
}

impl Default for Database {
    fn default() -> Self {
        Self::new(Arc::new(crate::watch::NotifyWatchService))
    }
}

fn descend(tree: &Value, subpath: &str) -> Result<Value, GetError> {
    let segments: Vec<&str> = subpath.split('/').collect();
    let mut resolved: Vec<&str> = Vec::with_capacity(segments.len());
    let not_found = |segment: &str, resolved: &[&str]| GetError::PathNotFound {
        segment: segment.to_string(),
        parent: if resolved.is_empty() {
            "<root>".to_string()
        } else {
            resolved.join("/")
        },
    };

    let mut node = tree;
    for (i, &segment) in segments.iter().enumerate() {
        match node {
            Value::Map(map) => {
                node = map.get(segment).ok_or_else(|| not_found(segment, &resolved))?;
            }
            Value::History(hist) if segment == History::INDEX_KEY => {
                // The index is synthesized on demand; nothing resolves
                // below a leaf array.
                return match segments.get(i + 1) {
                    None => Ok(Value::Array(hist.index().to_vec())),
                    Some(&next) => {
                        resolved.push(segment);
                        Err(not_found(next, &resolved))
                    }
                };
            }
            Value::History(hist) => {
                node = hist
                    .series(segment)
                    .ok_or_else(|| not_found(segment, &resolved))?;
            }
            _ => return Err(not_found(segment, &resolved)),
        }
        resolved.push(segment);
    }
    Ok(node.clone())
}
