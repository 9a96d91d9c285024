//! Function package resource
//!
//! A plain package or a binding to another package. Bindings reference
//! `/namespace/package`; the referenced half never changes in place.

use std::collections::HashMap;

use stratus_core::provider::{ProviderError, ProviderResult};
use stratus_core::resource::{Resource, ResourceId, State, Value};
use stratus_sdk::functions::{Binding, Package};

use super::{key_values, key_values_attr};
use crate::StratusProvider;
use crate::attrs::{optional_bool, optional_string, required_string};
use crate::error::api_error;

pub(crate) async fn create(
    provider: &StratusProvider,
    resource: &Resource,
) -> ProviderResult<State> {
    let namespace = required_string(resource, "namespace")?;
    let package = from_resource(resource)?;

    tracing::info!(%namespace, package = %package.name, "creating function package");
    let inserted = provider
        .functions
        .insert_package(&namespace, &package, false)
        .await
        .map_err(|e| {
            api_error("failed to create function package", e).for_resource(resource.id.clone())
        })?;

    let identifier = crate::ids::join_colon(&[&namespace, &inserted.name]);
    Ok(to_state(resource.id.clone(), &namespace, &inserted).with_identifier(&identifier))
}

pub(crate) async fn read(
    provider: &StratusProvider,
    id: &ResourceId,
    identifier: &str,
) -> ProviderResult<State> {
    let parts = crate::ids::split_colon(identifier, 2).map_err(|e| e.for_resource(id.clone()))?;
    let (namespace, name) = (parts[0], parts[1]);

    let package = match provider.functions.get_package(namespace, name).await {
        Ok(package) => package,
        Err(e) if e.is_not_found() => return Ok(State::not_found(id.clone())),
        Err(e) => {
            return Err(api_error("failed to get function package", e).for_resource(id.clone()));
        }
    };

    Ok(to_state(id.clone(), namespace, &package).with_identifier(identifier))
}

pub(crate) async fn update(
    provider: &StratusProvider,
    id: &ResourceId,
    identifier: &str,
    to: &Resource,
) -> ProviderResult<State> {
    let parts = crate::ids::split_colon(identifier, 2).map_err(|e| e.for_resource(id.clone()))?;
    let namespace = parts[0].to_string();
    let package = from_resource(to)?;

    tracing::info!(%namespace, package = %package.name, "updating function package");
    let inserted = provider
        .functions
        .insert_package(&namespace, &package, true)
        .await
        .map_err(|e| {
            api_error("failed to update function package", e).for_resource(id.clone())
        })?;

    Ok(to_state(id.clone(), &namespace, &inserted).with_identifier(identifier))
}

pub(crate) async fn delete(
    provider: &StratusProvider,
    id: &ResourceId,
    identifier: &str,
) -> ProviderResult<()> {
    let parts = crate::ids::split_colon(identifier, 2).map_err(|e| e.for_resource(id.clone()))?;
    let (namespace, name) = (parts[0], parts[1]);

    tracing::info!(namespace, package = name, "deleting function package");
    match provider.functions.delete_package(namespace, name).await {
        Ok(()) => Ok(()),
        Err(e) if e.is_not_found() => Ok(()),
        Err(e) => Err(api_error("failed to delete function package", e).for_resource(id.clone())),
    }
}

fn from_resource(resource: &Resource) -> ProviderResult<Package> {
    let binding = match optional_string(resource, "bind_package_name") {
        Some(reference) => Some(parse_binding(resource, &reference)?),
        None => None,
    };
    Ok(Package {
        name: required_string(resource, "name")?,
        namespace: None,
        annotations: key_values(resource, "annotations"),
        parameters: key_values(resource, "parameters"),
        binding,
        publish: optional_bool(resource, "publish"),
        version: None,
    })
}

/// Parse a "/namespace/package" binding reference
fn parse_binding(resource: &Resource, reference: &str) -> ProviderResult<Binding> {
    let mut parts = reference.trim_start_matches('/').splitn(2, '/');
    match (parts.next(), parts.next()) {
        (Some(namespace), Some(name)) if !namespace.is_empty() && !name.is_empty() => {
            Ok(Binding {
                namespace: namespace.to_string(),
                name: name.to_string(),
            })
        }
        _ => Err(ProviderError::new(format!(
            "malformed package binding '{}': expected /namespace/package",
            reference
        ))
        .for_resource(resource.id.clone())),
    }
}

fn to_state(id: ResourceId, namespace: &str, package: &Package) -> State {
    let mut attributes = HashMap::new();
    attributes.insert(
        "namespace".to_string(),
        Value::String(namespace.to_string()),
    );
    attributes.insert("name".to_string(), Value::String(package.name.clone()));
    if let Some(publish) = package.publish {
        attributes.insert("publish".to_string(), Value::Bool(publish));
    }
    if let Some(binding) = &package.binding {
        attributes.insert(
            "bind_package_name".to_string(),
            Value::String(format!("/{}/{}", binding.namespace, binding.name)),
        );
    }
    if let Some(parameters) = key_values_attr(&package.parameters) {
        attributes.insert("parameters".to_string(), parameters);
    }
    if let Some(annotations) = key_values_attr(&package.annotations) {
        attributes.insert("annotations".to_string(), annotations);
    }
    if let Some(version) = &package.version {
        attributes.insert("version".to_string(), Value::String(version.clone()));
    }
    State::existing(id, attributes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binding_reference_is_parsed() {
        let resource = Resource::new("function_package", "utils-bind");
        let binding = parse_binding(&resource, "/whisk.system/utils").unwrap();
        assert_eq!(binding.namespace, "whisk.system");
        assert_eq!(binding.name, "utils");
    }

    #[test]
    fn malformed_binding_reference_is_rejected() {
        let resource = Resource::new("function_package", "utils-bind");
        assert!(parse_binding(&resource, "utils").is_err());
        assert!(parse_binding(&resource, "/utils").is_err());
    }

    #[test]
    fn package_state_mapping() {
        let package: Package = serde_json::from_value(serde_json::json!({
            "name": "utils-bind",
            "binding": {"namespace": "whisk.system", "name": "utils"},
            "publish": false,
            "version": "0.0.1"
        }))
        .unwrap();

        let state = to_state(
            ResourceId::new("function_package", "utils-bind"),
            "ns-1",
            &package,
        );
        assert_eq!(
            state.attributes.get("bind_package_name"),
            Some(&Value::String("/whisk.system/utils".to_string()))
        );
        assert_eq!(
            state.attributes.get("version"),
            Some(&Value::String("0.0.1".to_string()))
        );
    }
}
