//! Function namespace resource
//!
//! Namespaces are identified by the service-assigned id, not the name.
//! Only the description can change in place.

use std::collections::HashMap;

use stratus_core::provider::ProviderResult;
use stratus_core::resource::{Resource, ResourceId, State, Value};
use stratus_sdk::functions::{Namespace, NamespaceCreateRequest, NamespaceUpdateRequest};

use crate::StratusProvider;
use crate::attrs::{optional_string, required_string};
use crate::error::api_error;

pub(crate) async fn create(
    provider: &StratusProvider,
    resource: &Resource,
) -> ProviderResult<State> {
    let request = NamespaceCreateRequest {
        name: required_string(resource, "name")?,
        resource_group_id: required_string(resource, "resource_group_id")?,
        resource_plan_id: optional_string(resource, "resource_plan_id"),
        description: optional_string(resource, "description"),
    };

    tracing::info!(name = %request.name, "creating function namespace");
    let namespace = provider
        .functions
        .create_namespace(&request)
        .await
        .map_err(|e| {
            api_error("failed to create function namespace", e).for_resource(resource.id.clone())
        })?;

    let identifier = namespace.id.clone();
    Ok(to_state(resource.id.clone(), &namespace).with_identifier(&identifier))
}

pub(crate) async fn read(
    provider: &StratusProvider,
    id: &ResourceId,
    namespace_id: &str,
) -> ProviderResult<State> {
    let namespace = match provider.functions.get_namespace(namespace_id).await {
        Ok(namespace) => namespace,
        Err(e) if e.is_not_found() => return Ok(State::not_found(id.clone())),
        Err(e) => {
            return Err(api_error("failed to get function namespace", e).for_resource(id.clone()));
        }
    };

    Ok(to_state(id.clone(), &namespace).with_identifier(namespace_id))
}

pub(crate) async fn update(
    provider: &StratusProvider,
    id: &ResourceId,
    identifier: &str,
    to: &Resource,
) -> ProviderResult<State> {
    let request = NamespaceUpdateRequest {
        description: optional_string(to, "description"),
    };

    tracing::info!(namespace = identifier, "updating function namespace");
    let namespace = provider
        .functions
        .update_namespace(identifier, &request)
        .await
        .map_err(|e| {
            api_error("failed to update function namespace", e).for_resource(id.clone())
        })?;

    Ok(to_state(id.clone(), &namespace).with_identifier(identifier))
}

pub(crate) async fn delete(
    provider: &StratusProvider,
    id: &ResourceId,
    identifier: &str,
) -> ProviderResult<()> {
    tracing::info!(namespace = identifier, "deleting function namespace");
    match provider.functions.delete_namespace(identifier).await {
        Ok(()) => Ok(()),
        Err(e) if e.is_not_found() => Ok(()),
        Err(e) => {
            Err(api_error("failed to delete function namespace", e).for_resource(id.clone()))
        }
    }
}

fn to_state(id: ResourceId, namespace: &Namespace) -> State {
    let mut attributes = HashMap::new();
    attributes.insert("name".to_string(), Value::String(namespace.name.clone()));
    attributes.insert(
        "resource_group_id".to_string(),
        Value::String(namespace.resource_group_id.clone()),
    );
    if let Some(location) = &namespace.location {
        attributes.insert("location".to_string(), Value::String(location.clone()));
    }
    if let Some(description) = &namespace.description {
        attributes.insert(
            "description".to_string(),
            Value::String(description.clone()),
        );
    }
    if let Some(crn) = &namespace.crn {
        attributes.insert("crn".to_string(), Value::String(crn.clone()));
    }
    State::existing(id, attributes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn namespace_state_mapping() {
        let namespace: Namespace = serde_json::from_value(serde_json::json!({
            "id": "ns-1",
            "name": "billing",
            "resource_group_id": "rg-1",
            "location": "us-south",
            "description": "billing functions",
            "crn": "crn:v1:cloud:public:functions:us-south:a/1:ns-1::"
        }))
        .unwrap();

        let state = to_state(ResourceId::new("function_namespace", "billing"), &namespace);
        assert!(state.exists);
        assert_eq!(
            state.attributes.get("location"),
            Some(&Value::String("us-south".to_string()))
        );
        assert_eq!(
            state.attributes.get("resource_group_id"),
            Some(&Value::String("rg-1".to_string()))
        );
    }
}
