//! Shared types for runlog
//!
//! This crate provides the typed value tree that the rest of the runlog
//! ecosystem operates on: numeric leaf arrays, complex-valued arrays,
//! nested maps, and [`History`] time-series containers.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A complex scalar stored as a real/imaginary pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Complex64 {
    pub re: f64,
    pub im: f64,
}

impl Complex64 {
    pub fn new(re: f64, im: f64) -> Self {
        Self { re, im }
    }
}

impl fmt::Display for Complex64 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.im < 0.0 {
            write!(f, "{}-{}i", self.re, -self.im)
        } else {
            write!(f, "{}+{}i", self.re, self.im)
        }
    }
}

/// Typed in-memory tree produced from a raw JSON document.
///
/// Leaf arrays are never empty: an empty JSON array is represented as an
/// empty [`Value::Map`] so that its type is never ambiguous.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Ordered sequence of floats. Missing samples are NaN.
    Array(Vec<f64>),
    /// Ordered sequence of complex numbers.
    ComplexArray(Vec<Complex64>),
    /// Mapping from string key to child node, insertion order preserved.
    Map(IndexMap<String, Value>),
    /// Time series: an index array plus co-indexed named series.
    History(History),
}

impl Value {
    pub fn as_array(&self) -> Option<&[f64]> {
        match self {
            Value::Array(xs) => Some(xs),
            _ => None,
        }
    }

    pub fn as_complex_array(&self) -> Option<&[Complex64]> {
        match self {
            Value::ComplexArray(xs) => Some(xs),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_history(&self) -> Option<&History> {
        match self {
            Value::History(h) => Some(h),
            _ => None,
        }
    }

    /// True for the two leaf-array variants.
    pub fn is_leaf(&self) -> bool {
        matches!(self, Value::Array(_) | Value::ComplexArray(_))
    }

    /// Length of a leaf array, if this node is one.
    pub fn leaf_len(&self) -> Option<usize> {
        match self {
            Value::Array(xs) => Some(xs.len()),
            Value::ComplexArray(xs) => Some(xs.len()),
            _ => None,
        }
    }

    /// Child keys of a map or history node, in stored order.
    ///
    /// For a history the distinguished index key comes first, followed by
    /// the series names.
    pub fn keys(&self) -> Vec<&str> {
        match self {
            Value::Map(m) => m.keys().map(String::as_str).collect(),
            Value::History(h) => {
                let mut keys = vec![History::INDEX_KEY];
                keys.extend(h.series_names());
                keys
            }
            _ => Vec::new(),
        }
    }
}

/// A time-series container: one index array ("iters" at the JSON level)
/// plus zero or more named data series sharing the index length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct History {
    iters: Vec<f64>,
    series: IndexMap<String, Value>,
}

impl History {
    /// JSON key that marks a map as a history and holds its index.
    pub const INDEX_KEY: &'static str = "iters";

    /// Build a history from an index and its series.
    ///
    /// Length agreement between the index and each series is the caller's
    /// responsibility; the history collector checks it before construction.
    pub fn new(iters: Vec<f64>, series: IndexMap<String, Value>) -> Self {
        Self { iters, series }
    }

    /// Number of samples in the index.
    pub fn len(&self) -> usize {
        self.iters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.iters.is_empty()
    }

    /// The index array.
    pub fn index(&self) -> &[f64] {
        &self.iters
    }

    /// Look up a named series. The index key is not a series.
    pub fn series(&self, name: &str) -> Option<&Value> {
        self.series.get(name)
    }

    pub fn series_names(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(String::as_str)
    }

    pub fn iter_series(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.series.iter().map(|(k, v)| (k.as_str(), v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complex_display() {
        assert_eq!(Complex64::new(1.0, 2.0).to_string(), "1+2i");
        assert_eq!(Complex64::new(1.5, -0.5).to_string(), "1.5-0.5i");
    }

    #[test]
    fn history_keys_lead_with_index() {
        let mut series = IndexMap::new();
        series.insert("Mean".to_string(), Value::Array(vec![1.0, 0.9]));
        let hist = Value::History(History::new(vec![0.0, 1.0], series));

        assert_eq!(hist.keys(), vec!["iters", "Mean"]);
    }

    #[test]
    fn leaf_len() {
        assert_eq!(Value::Array(vec![1.0, 2.0]).leaf_len(), Some(2));
        assert_eq!(Value::Map(IndexMap::new()).leaf_len(), None);
    }
}
