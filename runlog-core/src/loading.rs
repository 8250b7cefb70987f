//! File loading: bytes on disk to a collected value tree.

use crate::history::{collect_histories, HistoryError};
use crate::transform::{transform, TransformError};
use runlog_types::Value;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while loading a log file from disk.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {} as JSON", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to transform {}", path.display())]
    Transform {
        path: PathBuf,
        #[source]
        source: TransformError,
    },

    #[error("bad history shape in {}", path.display())]
    History {
        path: PathBuf,
        #[source]
        source: HistoryError,
    },

    #[error("failed to arm a file watch for {}", path.display())]
    Watch {
        path: PathBuf,
        #[source]
        source: crate::watch::WatchError,
    },
}

/// Read, parse, transform, and collect a JSON log file.
pub fn load_file(path: &Path) -> Result<Value, LoadError> {
    let owned = || path.to_path_buf();
    let bytes = fs::read(path).map_err(|source| LoadError::Io {
        path: owned(),
        source,
    })?;
    let json: serde_json::Value =
        serde_json::from_slice(&bytes).map_err(|source| LoadError::Parse {
            path: owned(),
            source,
        })?;
    let tree = transform(&json).map_err(|source| LoadError::Transform {
        path: owned(),
        source,
    })?;
    collect_histories(tree).map_err(|source| LoadError::History {
        path: owned(),
        source,
    })
}

/// Read a file as raw UTF-8 text, without any interpretation.
pub fn load_text_file(path: &Path) -> Result<String, LoadError> {
    fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}
