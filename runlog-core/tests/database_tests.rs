//! Integration tests for the database: loading, dirty tracking, lazy
//! reloads, and subpath traversal.

use runlog_core::watch::{ChangeCallback, WatchError, WatchHandle, WatchService};
use runlog_core::{Database, GetError};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Deterministic stand-in for the notify-backed service: events fire only
/// when a test calls [`StubWatchService::fire`].
#[derive(Default)]
struct StubWatchService {
    subs: Mutex<Vec<Subscription>>,
}

struct Subscription {
    dir: PathBuf,
    on_change: ChangeCallback,
    cancelled: Arc<AtomicBool>,
}

struct StubHandle {
    cancelled: Arc<AtomicBool>,
}

impl WatchHandle for StubHandle {
    fn cancel(&mut self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }
}

impl WatchService for StubWatchService {
    fn watch(
        &self,
        dir: &Path,
        on_change: ChangeCallback,
    ) -> Result<Box<dyn WatchHandle>, WatchError> {
        let cancelled = Arc::new(AtomicBool::new(false));
        self.subs.lock().unwrap().push(Subscription {
            dir: dir.to_path_buf(),
            on_change,
            cancelled: Arc::clone(&cancelled),
        });
        Ok(Box::new(StubHandle { cancelled }))
    }
}

impl StubWatchService {
    fn fire(&self, path: &Path) {
        for sub in self.subs.lock().unwrap().iter() {
            if !sub.cancelled.load(Ordering::SeqCst) && path.starts_with(&sub.dir) {
                (sub.on_change)(path);
            }
        }
    }

    fn active_subscriptions(&self) -> usize {
        self.subs
            .lock()
            .unwrap()
            .iter()
            .filter(|s| !s.cancelled.load(Ordering::SeqCst))
            .count()
    }
}

fn stub_database() -> (Database, Arc<StubWatchService>) {
    let service = Arc::new(StubWatchService::default());
    let db = Database::new(service.clone());
    (db, service)
}

const RUN_V1: &str = r#"{"Energy": {"iters": [0, 1, 2], "Mean": [1.0, 0.9, 0.8]}}"#;
const RUN_V2: &str = r#"{"Energy": {"iters": [0, 1, 2, 3], "Mean": [1.0, 0.9, 0.8, 0.7]}}"#;

#[test]
fn load_then_query_history() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("run.json");
    fs::write(&file, RUN_V1).unwrap();

    let (db, _) = stub_database();
    db.load(&file).unwrap();

    let energy = db.get(&file, Some("Energy")).unwrap();
    let hist = energy.as_history().unwrap();
    assert_eq!(hist.index(), &[0.0, 1.0, 2.0]);
    assert_eq!(
        hist.series("Mean").unwrap().as_array().unwrap(),
        &[1.0, 0.9, 0.8]
    );

    let iters = db.get(&file, Some("Energy/iters")).unwrap();
    assert_eq!(iters.as_array().unwrap(), &[0.0, 1.0, 2.0]);
}

#[test]
fn get_before_load_is_not_loaded() {
    let (db, _) = stub_database();
    let err = db.get("never-loaded.json", None).unwrap_err();
    assert!(matches!(err, GetError::NotLoaded(_)));
}

#[test]
fn subpath_miss_names_first_unresolved_segment() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("run.json");
    fs::write(&file, r#"{"a": {"x": [1.0]}}"#).unwrap();

    let (db, _) = stub_database();
    db.load(&file).unwrap();

    let err = db.get(&file, Some("a/b/c")).unwrap_err();
    match err {
        GetError::PathNotFound { segment, .. } => assert_eq!(segment, "b"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn change_marks_dirty_and_get_reloads_lazily() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("run.json");
    fs::write(&file, RUN_V1).unwrap();

    let (db, service) = stub_database();
    db.load(&file).unwrap();

    fs::write(&file, RUN_V2).unwrap();
    service.fire(&file);

    // The notification only marks the path; no eager reload happens.
    assert!(db.is_dirty(&file));

    let iters = db.get(&file, Some("Energy/iters")).unwrap();
    assert_eq!(iters.as_array().unwrap(), &[0.0, 1.0, 2.0, 3.0]);
    assert!(!db.is_dirty(&file));
}

#[test]
fn redundant_notifications_are_noops() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("run.json");
    fs::write(&file, RUN_V1).unwrap();

    let (db, service) = stub_database();
    db.load(&file).unwrap();

    service.fire(&file);
    service.fire(&file);
    assert!(db.is_dirty(&file));

    assert!(db.get(&file, None).is_ok());
    assert!(!db.is_dirty(&file));
}

#[test]
fn failed_reload_serves_stale_tree() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("run.json");
    fs::write(&file, RUN_V1).unwrap();

    let (db, service) = stub_database();
    db.load(&file).unwrap();

    fs::write(&file, "{ broken").unwrap();
    service.fire(&file);

    let mean = db.get(&file, Some("Energy/Mean")).unwrap();
    assert_eq!(mean.as_array().unwrap(), &[1.0, 0.9, 0.8]);

    // The failure is visible, and the attempt cleared the dirty flag.
    assert!(db.last_error(&file).is_some());
    assert!(!db.is_dirty(&file));
}

#[test]
fn failed_load_preserves_previous_tree() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("run.json");
    fs::write(&file, RUN_V1).unwrap();

    let (db, _) = stub_database();
    db.load(&file).unwrap();

    fs::write(&file, "{ broken").unwrap();
    assert!(db.load(&file).is_err());

    let mean = db.get(&file, Some("Energy/Mean")).unwrap();
    assert_eq!(mean.as_array().unwrap(), &[1.0, 0.9, 0.8]);

    // A later good load clears the recorded failure.
    fs::write(&file, RUN_V2).unwrap();
    db.load(&file).unwrap();
    assert!(db.last_error(&file).is_none());
}

#[test]
fn first_load_failure_caches_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("run.json");
    fs::write(&file, "not json at all").unwrap();

    let (db, service) = stub_database();
    assert!(db.load(&file).is_err());
    assert!(matches!(
        db.get(&file, None).unwrap_err(),
        GetError::NotLoaded(_)
    ));
    assert_eq!(service.active_subscriptions(), 0);
}

#[test]
fn one_subscription_per_loaded_path() {
    let dir = tempfile::tempdir().unwrap();
    let a = dir.path().join("a.json");
    let b = dir.path().join("b.json");
    fs::write(&a, RUN_V1).unwrap();
    fs::write(&b, RUN_V1).unwrap();

    let (db, service) = stub_database();
    db.load(&a).unwrap();
    db.load(&a).unwrap();
    assert_eq!(service.active_subscriptions(), 1);

    // Same directory, separate path: independent subscription.
    db.load(&b).unwrap();
    assert_eq!(service.active_subscriptions(), 2);
}

#[test]
fn close_cancels_watches_but_keeps_data() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("run.json");
    fs::write(&file, RUN_V1).unwrap();

    let (db, service) = stub_database();
    db.load(&file).unwrap();
    db.close();

    assert_eq!(service.active_subscriptions(), 0);
    assert!(db.get(&file, Some("Energy")).is_ok());

    // Cancelled subscriptions no longer mark anything dirty.
    service.fire(&file);
    assert!(!db.is_dirty(&file));
}

#[test]
fn whole_tree_get_lists_top_level_keys() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("run.json");
    fs::write(&file, RUN_V1).unwrap();

    let (db, _) = stub_database();
    db.load(&file).unwrap();

    let tree = db.get(&file, None).unwrap();
    assert_eq!(tree.keys(), vec!["Energy"]);
    assert_eq!(db.loaded_paths(), vec![file]);
}
