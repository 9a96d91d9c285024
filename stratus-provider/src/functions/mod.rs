//! Serverless functions resources
//!
//! Entities below a namespace (packages, actions, triggers, rules) share
//! the `namespace:name` composite id and the upsert write model: create
//! inserts without overwrite, update inserts with it.

pub mod action;
pub mod namespace;
pub mod package;
pub mod rule;
pub mod trigger;

use std::collections::HashMap;

use stratus_core::resource::{Resource, Value};
use stratus_sdk::functions::KeyValue;

/// Build the key/value list the API expects from a Map attribute
pub(crate) fn key_values(resource: &Resource, key: &str) -> Vec<KeyValue> {
    let Some(Value::Map(map)) = resource.attributes.get(key) else {
        return Vec::new();
    };
    let mut pairs: Vec<KeyValue> = map
        .iter()
        .filter_map(|(k, v)| {
            v.as_str().map(|s| KeyValue {
                key: k.clone(),
                value: serde_json::Value::String(s.to_string()),
            })
        })
        .collect();
    pairs.sort_by(|a, b| a.key.cmp(&b.key));
    pairs
}

/// Fold a key/value list back into a Map attribute value
pub(crate) fn key_values_attr(pairs: &[KeyValue]) -> Option<Value> {
    if pairs.is_empty() {
        return None;
    }
    let map: HashMap<String, Value> = pairs
        .iter()
        .map(|kv| {
            let value = match &kv.value {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (kv.key.clone(), Value::String(value))
        })
        .collect();
    Some(Value::Map(map))
}
