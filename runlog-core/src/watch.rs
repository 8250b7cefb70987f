//! Watch adapter: recursive directory subscriptions over `notify`.
//!
//! The database talks to an explicitly-owned [`WatchService`] rather than a
//! process-global observer, so tests can substitute a deterministic stub
//! and teardown stays in the caller's hands.

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

/// Callback invoked with the affected path, once per filesystem event.
///
/// Runs on a background thread owned by the watch implementation. It must
/// not block and must be safe to invoke concurrently with database calls.
pub type ChangeCallback = Box<dyn Fn(&Path) + Send + Sync>;

#[derive(Error, Debug)]
pub enum WatchError {
    #[error("failed to subscribe to {}", path.display())]
    Subscribe {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },
}

/// A source of recursive directory-change subscriptions.
pub trait WatchService: Send + Sync {
    /// Subscribe to all events under `dir`, recursively.
    fn watch(&self, dir: &Path, on_change: ChangeCallback)
        -> Result<Box<dyn WatchHandle>, WatchError>;
}

/// An active subscription. Dropping the handle also cancels it.
pub trait WatchHandle: Send {
    /// Stop future callbacks. Safe to call more than once; an event already
    /// in flight may still be delivered and is harmless.
    fn cancel(&mut self);
}

/// [`WatchService`] backed by `notify`'s recommended platform watcher.
///
/// Each subscription owns its own watcher; overlapping directories are not
/// deduplicated.
#[derive(Debug, Default)]
pub struct NotifyWatchService;

impl WatchService for NotifyWatchService {
    fn watch(
        &self,
        dir: &Path,
        on_change: ChangeCallback,
    ) -> Result<Box<dyn WatchHandle>, WatchError> {
        let subscribe_err = |source| WatchError::Subscribe {
            path: dir.to_path_buf(),
            source,
        };
        let mut watcher = RecommendedWatcher::new(
            move |res: Result<notify::Event, notify::Error>| match res {
                Ok(event) => {
                    for path in &event.paths {
                        on_change(path);
                    }
                }
                Err(err) => warn!("file watch error: {err}"),
            },
            notify::Config::default(),
        )
        .map_err(subscribe_err)?;
        watcher
            .watch(dir, RecursiveMode::Recursive)
            .map_err(subscribe_err)?;
        Ok(Box::new(NotifyWatchHandle {
            watcher: Some(watcher),
        }))
    }
}

struct NotifyWatchHandle {
    watcher: Option<RecommendedWatcher>,
}

impl WatchHandle for NotifyWatchHandle {
    fn cancel(&mut self) {
        // Dropping the watcher tears down the subscription.
        self.watcher.take();
    }
}
