//! Transform engine: raw parsed JSON into the typed value tree.
//!
//! The engine is a pure function over `serde_json::Value`. It classifies
//! each array once with an explicit [`Classification`] instead of probing
//! shapes speculatively, turns uniform numeric arrays into leaves, rebuilds
//! nested arrays as index-keyed maps, and collapses `{"real","imag"}`
//! object pairs into complex arrays.

use indexmap::IndexMap;
use runlog_types::{Complex64, Value};
use serde_json::Value as Json;
use thiserror::Error;

/// Errors raised while transforming a parsed JSON document.
///
/// Every variant carries the slash-joined path from the document root to
/// the offending node.
#[derive(Error, Debug)]
pub enum TransformError {
    #[error("unsupported JSON value ({kind}) at `{path}`")]
    Unsupported { kind: &'static str, path: String },

    #[error("leaf array at `{path}` mixes numeric subtypes")]
    MixedLeaf { path: String },

    #[error("complex pair at `{path}` is malformed: {reason}")]
    MalformedComplex { path: String, reason: String },
}

/// Shape of a JSON array, decided once per node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Classification {
    /// Non-empty, every element a float.
    FloatLeaf,
    /// Non-empty, every element an integer.
    IntLeaf,
    /// Non-empty, every element null. Becomes a NaN-filled leaf.
    NullLeaf,
    /// Leaf-shaped (numbers and nulls only) but not uniform.
    Mixed,
    /// Nested or heterogeneous; handled as an index-keyed map.
    NotLeaf,
    /// Empty arrays carry no element type, so they become empty maps.
    Empty,
}

fn classify_array(items: &[Json]) -> Classification {
    if items.is_empty() {
        return Classification::Empty;
    }
    let mut ints = 0usize;
    let mut floats = 0usize;
    let mut nulls = 0usize;
    for item in items {
        match item {
            Json::Number(n) if n.is_f64() => floats += 1,
            Json::Number(_) => ints += 1,
            Json::Null => nulls += 1,
            _ => return Classification::NotLeaf,
        }
    }
    let len = items.len();
    if nulls == len {
        Classification::NullLeaf
    } else if ints == len {
        Classification::IntLeaf
    } else if floats == len {
        Classification::FloatLeaf
    } else {
        Classification::Mixed
    }
}

/// Transform a parsed JSON document into a [`Value`] tree.
///
/// The domain is arrays, objects, and numeric leaves; strings, booleans,
/// and bare scalars anywhere in the document are errors.
pub fn transform(value: &Json) -> Result<Value, TransformError> {
    let mut path = Vec::new();
    transform_at(value, &mut path)
}

fn transform_at(value: &Json, path: &mut Vec<String>) -> Result<Value, TransformError> {
    match value {
        Json::Array(items) => match classify_array(items) {
            Classification::FloatLeaf | Classification::IntLeaf => {
                let xs = items
                    .iter()
                    .map(|it| it.as_f64().unwrap_or(f64::NAN))
                    .collect();
                Ok(Value::Array(xs))
            }
            Classification::NullLeaf => Ok(Value::Array(vec![f64::NAN; items.len()])),
            Classification::Mixed => Err(TransformError::MixedLeaf {
                path: join_path(path),
            }),
            Classification::Empty | Classification::NotLeaf => {
                let mut map = IndexMap::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    let key = i.to_string();
                    path.push(key.clone());
                    let child = transform_at(item, path)?;
                    path.pop();
                    map.insert(key, child);
                }
                Ok(Value::Map(map))
            }
        },
        Json::Object(obj) => {
            let mut map = IndexMap::with_capacity(obj.len());
            for (key, child) in obj {
                path.push(key.clone());
                let transformed = transform_at(child, path)?;
                path.pop();
                map.insert(key.clone(), transformed);
            }
            if is_complex_pair(&map) {
                collapse_complex(map, path)
            } else {
                Ok(Value::Map(map))
            }
        }
        Json::Null => Err(unsupported("null", path)),
        Json::Bool(_) => Err(unsupported("boolean", path)),
        Json::Number(_) => Err(unsupported("bare number", path)),
        Json::String(_) => Err(unsupported("string", path)),
    }
}

fn is_complex_pair(map: &IndexMap<String, Value>) -> bool {
    map.len() == 2 && map.contains_key("real") && map.contains_key("imag")
}

fn collapse_complex(
    mut map: IndexMap<String, Value>,
    path: &[String],
) -> Result<Value, TransformError> {
    let malformed = |reason: String| TransformError::MalformedComplex {
        path: join_path(path),
        reason,
    };
    // is_complex_pair guarantees both keys are present
    let real = map.shift_remove("real").and_then(|v| match v {
        Value::Array(xs) => Some(xs),
        _ => None,
    });
    let imag = map.shift_remove("imag").and_then(|v| match v {
        Value::Array(xs) => Some(xs),
        _ => None,
    });
    match (real, imag) {
        (Some(re), Some(im)) if re.len() == im.len() => Ok(Value::ComplexArray(
            re.into_iter()
                .zip(im)
                .map(|(re, im)| Complex64::new(re, im))
                .collect(),
        )),
        (Some(re), Some(im)) => Err(malformed(format!(
            "real has length {}, imag has length {}",
            re.len(),
            im.len()
        ))),
        _ => Err(malformed(
            "real/imag children are not numeric arrays".to_string(),
        )),
    }
}

fn unsupported(kind: &'static str, path: &[String]) -> TransformError {
    TransformError::Unsupported {
        kind,
        path: join_path(path),
    }
}

fn join_path(path: &[String]) -> String {
    if path.is_empty() {
        "<root>".to_string()
    } else {
        path.join("/")
    }
}
