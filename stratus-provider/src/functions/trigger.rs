//! Function trigger resource

use std::collections::HashMap;

use stratus_core::provider::ProviderResult;
use stratus_core::resource::{Resource, ResourceId, State, Value};
use stratus_sdk::functions::Trigger;

use super::{key_values, key_values_attr};
use crate::StratusProvider;
use crate::attrs::{optional_bool, required_string};
use crate::error::api_error;

pub(crate) async fn create(
    provider: &StratusProvider,
    resource: &Resource,
) -> ProviderResult<State> {
    let namespace = required_string(resource, "namespace")?;
    let trigger = from_resource(resource)?;

    tracing::info!(%namespace, trigger = %trigger.name, "creating function trigger");
    let inserted = provider
        .functions
        .insert_trigger(&namespace, &trigger, false)
        .await
        .map_err(|e| {
            api_error("failed to create function trigger", e).for_resource(resource.id.clone())
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

    let trigger = match provider.functions.get_trigger(namespace, name).await {
        Ok(trigger) => trigger,
        Err(e) if e.is_not_found() => return Ok(State::not_found(id.clone())),
        Err(e) => {
            return Err(api_error("failed to get function trigger", e).for_resource(id.clone()));
        }
    };

    Ok(to_state(id.clone(), namespace, &trigger).with_identifier(identifier))
}

pub(crate) async fn update(
    provider: &StratusProvider,
    id: &ResourceId,
    identifier: &str,
    to: &Resource,
) -> ProviderResult<State> {
    let parts = crate::ids::split_colon(identifier, 2).map_err(|e| e.for_resource(id.clone()))?;
    let namespace = parts[0].to_string();
    let trigger = from_resource(to)?;

    tracing::info!(%namespace, trigger = %trigger.name, "updating function trigger");
    let inserted = provider
        .functions
        .insert_trigger(&namespace, &trigger, true)
        .await
        .map_err(|e| {
            api_error("failed to update function trigger", e).for_resource(id.clone())
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

    tracing::info!(namespace, trigger = name, "deleting function trigger");
    match provider.functions.delete_trigger(namespace, name).await {
        Ok(()) => Ok(()),
        Err(e) if e.is_not_found() => Ok(()),
        Err(e) => Err(api_error("failed to delete function trigger", e).for_resource(id.clone())),
    }
}

fn from_resource(resource: &Resource) -> ProviderResult<Trigger> {
    Ok(Trigger {
        name: required_string(resource, "name")?,
        namespace: None,
        annotations: key_values(resource, "annotations"),
        parameters: key_values(resource, "parameters"),
        publish: optional_bool(resource, "publish"),
        version: None,
    })
}

fn to_state(id: ResourceId, namespace: &str, trigger: &Trigger) -> State {
    let mut attributes = HashMap::new();
    attributes.insert(
        "namespace".to_string(),
        Value::String(namespace.to_string()),
    );
    attributes.insert("name".to_string(), Value::String(trigger.name.clone()));
    if let Some(publish) = trigger.publish {
        attributes.insert("publish".to_string(), Value::Bool(publish));
    }
    if let Some(parameters) = key_values_attr(&trigger.parameters) {
        attributes.insert("parameters".to_string(), parameters);
    }
    if let Some(annotations) = key_values_attr(&trigger.annotations) {
        attributes.insert("annotations".to_string(), annotations);
    }
    if let Some(version) = &trigger.version {
        attributes.insert("version".to_string(), Value::String(version.clone()));
    }
    State::existing(id, attributes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trigger_state_mapping() {
        let trigger: Trigger = serde_json::from_value(serde_json::json!({
            "name": "upload-finished",
            "parameters": [{"key": "bucket", "value": "media"}],
            "version": "0.0.3"
        }))
        .unwrap();

        let state = to_state(
            ResourceId::new("function_trigger", "upload-finished"),
            "ns-1",
            &trigger,
        );
        let Some(Value::Map(parameters)) = state.attributes.get("parameters") else {
            panic!("expected parameters map");
        };
        assert_eq!(
            parameters.get("bucket"),
            Some(&Value::String("media".to_string()))
        );
    }
}
