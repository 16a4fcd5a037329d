//! Token resolution.
//!
//! A token is a whole field of the form `{path}`, where `path` is a
//! dot-separated list of object keys and array indices
//! (`{versions.0.coverURL}`). Anything else is literal text: there is no
//! interpolation of tokens embedded in longer strings.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Rating values that get the wide box.
const SPECIAL_RATINGS: [&str; 2] = ["Unranked", "Qualified"];

/// The path inside a single-token template, or `None` for literal text.
#[must_use]
pub fn token_path(template: &str) -> Option<&str> {
    let path = template.strip_prefix('{')?.strip_suffix('}')?;
    if path.is_empty() || path.contains(['{', '}']) {
        return None;
    }
    Some(path)
}

/// Wrap a path as a token.
#[must_use]
pub fn token_for(path: &str) -> String {
    format!("{{{path}}}")
}

/// Follow a dotted path through nested objects and arrays.
#[must_use]
pub fn lookup<'a>(data: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(data, |node, segment| match node {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment
            .parse::<usize>()
            .ok()
            .filter(|index| index.to_string() == segment)
            .and_then(|index| items.get(index)),
        _ => None,
    })
}

/// Resolve a field against a data snapshot.
///
/// A single token gives the value at its path, or `None` when any segment
/// is missing. Literal text is returned as a string unchanged.
#[must_use]
pub fn resolve(template: &str, data: &Value) -> Option<Value> {
    match token_path(template) {
        Some(path) => {
            let value = lookup(data, path).cloned();
            if value.is_none() {
                tracing::debug!("Token {template} did not resolve");
            }
            value
        }
        None => Some(Value::String(template.to_string())),
    }
}

/// Resolve a field to display text.
///
/// Strings display as-is and other scalars in their JSON form. `null` and
/// misses give `None`.
#[must_use]
pub fn resolve_text(template: &str, data: &Value) -> Option<String> {
    match resolve(template, data)? {
        Value::Null => None,
        Value::String(text) => Some(text),
        other => Some(other.to_string()),
    }
}

/// Top-level keys of the data, in insertion order.
#[must_use]
pub fn list_paths(data: &Value) -> Vec<String> {
    match data {
        Value::Object(map) => map.keys().cloned().collect(),
        _ => Vec::new(),
    }
}

/// One entry of a token picker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathEntry {
    /// Path from the data root.
    pub full_path: String,
    /// Whether the value can be descended into.
    pub leaf_is_object: bool,
}

/// Children of the node at `prefix`, in insertion order.
///
/// An empty prefix lists the root. A prefix that does not lead to an
/// object or array lists nothing.
#[must_use]
pub fn list_subpaths(data: &Value, prefix: &str) -> Vec<PathEntry> {
    let node = if prefix.is_empty() {
        Some(data)
    } else {
        lookup(data, prefix)
    };
    let join = |key: &str| {
        if prefix.is_empty() {
            key.to_string()
        } else {
            format!("{prefix}.{key}")
        }
    };

    match node {
        Some(Value::Object(map)) => map
            .iter()
            .map(|(key, value)| PathEntry {
                full_path: join(key),
                leaf_is_object: is_container(value),
            })
            .collect(),
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(index, value)| PathEntry {
                full_path: join(&index.to_string()),
                leaf_is_object: is_container(value),
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn is_container(value: &Value) -> bool {
    matches!(value, Value::Object(_) | Value::Array(_))
}

/// Sizing class of a rating segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RatingClass {
    /// Wide box for ranking states.
    Special,
    /// Regular box for numeric ratings.
    Default,
}

/// Classify a resolved rating value.
///
/// `None` means the segment is left out of the layout entirely.
#[must_use]
pub fn classify(value: Option<&str>) -> Option<RatingClass> {
    match value {
        None | Some("") => None,
        Some(v) if SPECIAL_RATINGS.contains(&v) => Some(RatingClass::Special),
        Some(_) => Some(RatingClass::Default),
    }
}
