//! # runlog-core
//!
//! File-backed cache and transform pipeline for simulation JSON logs.
//!
//! A log file is read once, parsed, transformed into the typed value tree
//! of `runlog-types`, and cached by the [`Database`]. A recursive
//! filesystem watch marks the path dirty when the file changes; the next
//! `get` transparently reloads before serving data.
//!
//! ```text
//! bytes → serde_json → transform → collect_histories → Database
//!                                                        ↑
//!                                  notify events → dirty set
//! ```

pub mod database;
pub mod history;
pub mod loading;
pub mod stats;
pub mod transform;
pub mod watch;

pub use database::{Database, GetError};
pub use history::{collect_histories, HistoryError};
pub use loading::{load_file, load_text_file, LoadError};
pub use stats::{Stats, StatsSeries};
pub use transform::{transform, TransformError};
pub use watch::{ChangeCallback, NotifyWatchService, WatchError, WatchHandle, WatchService};

pub use runlog_types::{Complex64, History, Value};
