//! Response normalizer
//!
//! The eero API has shipped several response layouts for the same resource
//! over its versions: plain objects, `{meta, data}` envelopes, bare lists and
//! lists nested one level deeper as `{"count": n, "data": [...]}`. Everything
//! that comes back from [`super::Upstream`] goes through this module before
//! the collector sees it, so the rest of the crate works with exactly two
//! shapes: an [`Entity`] or a `Vec<Entity>`.
//!
//! Nothing here fails. A response that does not have the expected shape
//! degrades to an empty entity or an empty list.

use serde_json::{Map, Value};
use tracing::debug;

/// A canonical upstream object
pub type Entity = Map<String, Value>;

/// Keys tried after the expected list key, in order
const FALLBACK_LIST_KEYS: &[&str] = &["data", "items", "results", "values"];

/// `true` for objects carrying both `meta` and `data`
pub fn is_envelope(value: &Value) -> bool {
    value
        .as_object()
        .is_some_and(|map| map.contains_key("meta") && map.contains_key("data"))
}

/// Strip any number of `{meta, data}` envelopes
pub fn unwrap_envelope(value: &Value) -> &Value {
    let mut current = value;
    while is_envelope(current) {
        current = &current["data"];
    }
    current
}

/// Normalize a response that is expected to hold a single object
pub fn object(raw: &Value) -> Entity {
    match unwrap_envelope(raw) {
        Value::Object(map) => map.clone(),
        Value::Null => Entity::new(),
        other => {
            debug!("expected an object, got {}", kind(other));
            Entity::new()
        }
    }
}

/// Normalize a response that is expected to hold a list of objects
///
/// `key` is the name the list usually lives under (`"networks"`, `"eeros"`).
/// Members that are not objects are dropped.
pub fn list(raw: &Value, key: Option<&str>) -> Vec<Entity> {
    let Some(items) = find_list(raw, key) else {
        debug!(?key, "no list found in response, treating as empty");
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| match item {
            Value::Object(map) => Some(map.clone()),
            other => {
                debug!("dropping non-object list member ({})", kind(other));
                None
            }
        })
        .collect()
}

/// Locate the list inside a response without copying it
pub fn find_list<'a>(raw: &'a Value, key: Option<&str>) -> Option<&'a [Value]> {
    let map = match unwrap_envelope(raw) {
        Value::Array(items) => return Some(items.as_slice()),
        Value::Object(map) => map,
        _ => return None,
    };

    if let Some(found) = key.and_then(|key| map.get(key)).and_then(nested_list) {
        return Some(found);
    }

    FALLBACK_LIST_KEYS
        .iter()
        .find_map(|fallback| map.get(*fallback).and_then(nested_list))
}

/// A list that may be bare, enveloped, or wrapped as `{"data": [...]}`
pub fn nested_list(value: &Value) -> Option<&[Value]> {
    match unwrap_envelope(value) {
        Value::Array(items) => Some(items.as_slice()),
        Value::Object(map) => map.get("data").and_then(nested_list),
        _ => None,
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}
