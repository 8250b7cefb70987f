//! History collector: promote `iters`-keyed maps to time-series nodes.
//!
//! Runs after the transform engine. Works bottom-up so a promoted child is
//! never wrapped a second time, which also makes the pass idempotent.

use runlog_types::{History, Value};
use thiserror::Error;

/// Errors raised while promoting maps to histories.
#[derive(Error, Debug)]
pub enum HistoryError {
    #[error("history index `iters` is not a numeric array (found {found})")]
    BadIndex { found: &'static str },

    #[error("series `{key}` has length {actual}, expected {expected} to match `iters`")]
    ShapeMismatch {
        key: String,
        actual: usize,
        expected: usize,
    },
}

/// Walk the tree depth-first and promote every map owning an `iters` key
/// to a [`History`]. Leaves and existing histories pass through unchanged.
pub fn collect_histories(value: Value) -> Result<Value, HistoryError> {
    match value {
        Value::Map(map) => {
            let mut children = indexmap::IndexMap::with_capacity(map.len());
            for (key, child) in map {
                children.insert(key, collect_histories(child)?);
            }
            match children.shift_remove(History::INDEX_KEY) {
                Some(index) => promote(index, children),
                None => Ok(Value::Map(children)),
            }
        }
        other => Ok(other),
    }
}

fn promote(
    index: Value,
    series: indexmap::IndexMap<String, Value>,
) -> Result<Value, HistoryError> {
    let iters = match index {
        Value::Array(xs) => xs,
        other => {
            return Err(HistoryError::BadIndex {
                found: describe(&other),
            })
        }
    };
    for (key, child) in &series {
        // Leaf series must be co-indexed with `iters`; nested children
        // (including already-promoted histories) are kept as-is.
        if let Some(len) = child.leaf_len() {
            if len != iters.len() {
                return Err(HistoryError::ShapeMismatch {
                    key: key.clone(),
                    actual: len,
                    expected: iters.len(),
                });
            }
        }
    }
    Ok(Value::History(History::new(iters, series)))
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Array(_) => "numeric array",
        Value::ComplexArray(_) => "complex array",
        Value::Map(_) => "map",
        Value::History(_) => "history",
    }
}
