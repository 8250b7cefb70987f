//! Plain-text rendering of value trees for the terminal.

use runlog_core::StatsSeries;
use runlog_types::{Complex64, Value};
use std::fmt::Write;

/// Leaf values shown before eliding the rest.
const LEAF_PREVIEW: usize = 8;

/// Render a tree as indented text, one node per line.
pub fn render(value: &Value) -> String {
    let mut out = String::new();
    render_node(value, 0, &mut out);
    out
}

fn render_node(value: &Value, depth: usize, out: &mut String) {
    let pad = "  ".repeat(depth);
    match value {
        Value::Array(xs) => {
            let _ = writeln!(out, "{pad}{}", render_floats(xs));
        }
        Value::ComplexArray(xs) => {
            let _ = writeln!(out, "{pad}{}", render_complex(xs));
        }
        Value::Map(map) => {
            if let Some(stats) = StatsSeries::from_value(value) {
                render_stats_summary(&stats, &pad, out);
            }
            for (key, child) in map {
                render_child(key, child, depth, out);
            }
        }
        Value::History(hist) => {
            let _ = writeln!(out, "{pad}history ({} samples)", hist.len());
            let _ = writeln!(out, "{pad}  iters: {}", render_floats(hist.index()));
            for (key, child) in hist.iter_series() {
                render_child(key, child, depth + 1, out);
            }
        }
    }
}

fn render_child(key: &str, child: &Value, depth: usize, out: &mut String) {
    let pad = "  ".repeat(depth);
    match child {
        Value::Array(xs) => {
            let _ = writeln!(out, "{pad}{key}: {}", render_floats(xs));
        }
        Value::ComplexArray(xs) => {
            let _ = writeln!(out, "{pad}{key}: {}", render_complex(xs));
        }
        nested => {
            let _ = writeln!(out, "{pad}{key}:");
            render_node(nested, depth + 1, out);
        }
    }
}

fn render_stats_summary(stats: &StatsSeries<'_>, pad: &str, out: &mut String) {
    if let Some(last) = stats.get(stats.len().wrapping_sub(1)) {
        let _ = writeln!(out, "{pad}stats (n={}): {last}", stats.len());
    }
}

fn render_floats(xs: &[f64]) -> String {
    render_seq(xs.iter().map(|x| x.to_string()), xs.len())
}

fn render_complex(xs: &[Complex64]) -> String {
    render_seq(xs.iter().map(|x| x.to_string()), xs.len())
}

fn render_seq(items: impl Iterator<Item = String>, len: usize) -> String {
    let shown: Vec<String> = items.take(LEAF_PREVIEW).collect();
    if len > LEAF_PREVIEW {
        format!("[{}, …] ({len} values)", shown.join(", "))
    } else {
        format!("[{}]", shown.join(", "))
    }
}
