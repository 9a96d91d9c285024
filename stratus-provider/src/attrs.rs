//! Attribute extraction helpers
//!
//! Thin accessors shared by the CRUD adapters: fetch a typed attribute
//! from a desired resource, failing with the resource id attached.

use std::collections::HashMap;

use stratus_core::provider::{ProviderError, ProviderResult};
use stratus_core::resource::{Resource, Value};

pub fn required_string(resource: &Resource, key: &str) -> ProviderResult<String> {
    match resource.attributes.get(key) {
        Some(Value::String(s)) => Ok(s.clone()),
        _ => Err(
            ProviderError::new(format!("attribute '{}' is required", key))
                .for_resource(resource.id.clone()),
        ),
    }
}

pub fn optional_string(resource: &Resource, key: &str) -> Option<String> {
    resource.string_attr(key).map(str::to_string)
}

pub fn optional_int(resource: &Resource, key: &str) -> Option<i64> {
    resource.int_attr(key)
}

pub fn optional_bool(resource: &Resource, key: &str) -> Option<bool> {
    resource.bool_attr(key)
}

/// A List attribute with string elements
pub fn string_list(resource: &Resource, key: &str) -> Option<Vec<String>> {
    match resource.attributes.get(key) {
        Some(Value::List(items)) => Some(
            items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
        ),
        _ => None,
    }
}

/// A Map attribute with string values, e.g. worker pool labels
pub fn string_map(resource: &Resource, key: &str) -> Option<HashMap<String, String>> {
    match resource.attributes.get(key) {
        Some(Value::Map(map)) => {
            let mut out = HashMap::new();
            for (k, v) in map {
                if let Value::String(s) = v {
                    out.insert(k.clone(), s.clone());
                }
            }
            Some(out)
        }
        _ => None,
    }
}
