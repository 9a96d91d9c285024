//! Function action resource
//!
//! The exec block carries the runtime kind plus whichever of code, image,
//! or components applies. Actions live directly under the namespace or
//! inside a package via a "package/action" name.

use std::collections::HashMap;

use stratus_core::provider::{ProviderError, ProviderResult};
use stratus_core::resource::{Resource, ResourceId, State, Value};
use stratus_sdk::functions::{Action, Exec, Limits};

use super::{key_values, key_values_attr};
use crate::StratusProvider;
use crate::attrs::{
    optional_bool, optional_int, optional_string, required_string, string_list,
};
use crate::error::api_error;

pub(crate) async fn create(
    provider: &StratusProvider,
    resource: &Resource,
) -> ProviderResult<State> {
    let namespace = required_string(resource, "namespace")?;
    let action = from_resource(resource)?;

    tracing::info!(%namespace, action = %action.name, "creating function action");
    let inserted = provider
        .functions
        .insert_action(&namespace, &action, false)
        .await
        .map_err(|e| {
            api_error("failed to create function action", e).for_resource(resource.id.clone())
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

    let action = match provider.functions.get_action(namespace, name).await {
        Ok(action) => action,
        Err(e) if e.is_not_found() => return Ok(State::not_found(id.clone())),
        Err(e) => {
            return Err(api_error("failed to get function action", e).for_resource(id.clone()));
        }
    };

    Ok(to_state(id.clone(), namespace, &action).with_identifier(identifier))
}

pub(crate) async fn update(
    provider: &StratusProvider,
    id: &ResourceId,
    identifier: &str,
    to: &Resource,
) -> ProviderResult<State> {
    let parts = crate::ids::split_colon(identifier, 2).map_err(|e| e.for_resource(id.clone()))?;
    let namespace = parts[0].to_string();
    let action = from_resource(to)?;

    tracing::info!(%namespace, action = %action.name, "updating function action");
    let inserted = provider
        .functions
        .insert_action(&namespace, &action, true)
        .await
        .map_err(|e| api_error("failed to update function action", e).for_resource(id.clone()))?;

    Ok(to_state(id.clone(), &namespace, &inserted).with_identifier(identifier))
}

pub(crate) async fn delete(
    provider: &StratusProvider,
    id: &ResourceId,
    identifier: &str,
) -> ProviderResult<()> {
    let parts = crate::ids::split_colon(identifier, 2).map_err(|e| e.for_resource(id.clone()))?;
    let (namespace, name) = (parts[0], parts[1]);

    tracing::info!(namespace, action = name, "deleting function action");
    match provider.functions.delete_action(namespace, name).await {
        Ok(()) => Ok(()),
        Err(e) if e.is_not_found() => Ok(()),
        Err(e) => Err(api_error("failed to delete function action", e).for_resource(id.clone())),
    }
}

fn from_resource(resource: &Resource) -> ProviderResult<Action> {
    let kind = required_string(resource, "exec_kind")?;
    let code = optional_string(resource, "code");
    let image = optional_string(resource, "image");
    let components = string_list(resource, "components");

    if kind == "sequence" && components.as_ref().is_none_or(Vec::is_empty) {
        return Err(
            ProviderError::new("exec_kind 'sequence' requires components")
                .for_resource(resource.id.clone()),
        );
    }
    if code.is_none() && image.is_none() && components.is_none() {
        return Err(
            ProviderError::new("one of code, image, or components is required")
                .for_resource(resource.id.clone()),
        );
    }

    let limits = limits_from_resource(resource);
    Ok(Action {
        name: required_string(resource, "name")?,
        namespace: None,
        exec: Exec {
            kind,
            code,
            image,
            main: optional_string(resource, "main"),
            binary: optional_bool(resource, "binary"),
            components,
        },
        annotations: key_values(resource, "annotations"),
        parameters: key_values(resource, "parameters"),
        limits,
        publish: optional_bool(resource, "publish"),
        version: None,
    })
}

fn limits_from_resource(resource: &Resource) -> Option<Limits> {
    let limits = Limits {
        timeout: optional_int(resource, "timeout"),
        memory: optional_int(resource, "memory"),
        log_size: optional_int(resource, "log_size"),
    };
    if limits.timeout.is_none() && limits.memory.is_none() && limits.log_size.is_none() {
        None
    } else {
        Some(limits)
    }
}

fn to_state(id: ResourceId, namespace: &str, action: &Action) -> State {
    let mut attributes = HashMap::new();
    attributes.insert(
        "namespace".to_string(),
        Value::String(namespace.to_string()),
    );
    attributes.insert("name".to_string(), Value::String(action.name.clone()));
    attributes.insert(
        "exec_kind".to_string(),
        Value::String(action.exec.kind.clone()),
    );
    if let Some(code) = &action.exec.code {
        attributes.insert("code".to_string(), Value::String(code.clone()));
    }
    if let Some(image) = &action.exec.image {
        attributes.insert("image".to_string(), Value::String(image.clone()));
    }
    if let Some(main) = &action.exec.main {
        attributes.insert("main".to_string(), Value::String(main.clone()));
    }
    if let Some(binary) = action.exec.binary {
        attributes.insert("binary".to_string(), Value::Bool(binary));
    }
    if let Some(components) = &action.exec.components {
        let items = components
            .iter()
            .map(|c| Value::String(c.clone()))
            .collect();
        attributes.insert("components".to_string(), Value::List(items));
    }
    if let Some(limits) = &action.limits {
        if let Some(timeout) = limits.timeout {
            attributes.insert("timeout".to_string(), Value::Int(timeout));
        }
        if let Some(memory) = limits.memory {
            attributes.insert("memory".to_string(), Value::Int(memory));
        }
        if let Some(log_size) = limits.log_size {
            attributes.insert("log_size".to_string(), Value::Int(log_size));
        }
    }
    if let Some(publish) = action.publish {
        attributes.insert("publish".to_string(), Value::Bool(publish));
    }
    if let Some(parameters) = key_values_attr(&action.parameters) {
        attributes.insert("parameters".to_string(), parameters);
    }
    if let Some(annotations) = key_values_attr(&action.annotations) {
        attributes.insert("annotations".to_string(), annotations);
    }
    if let Some(version) = &action.version {
        attributes.insert("version".to_string(), Value::String(version.clone()));
    }
    State::existing(id, attributes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code_action() -> Resource {
        Resource::new("function_action", "hello")
            .with_attribute("namespace", Value::String("ns-1".to_string()))
            .with_attribute("name", Value::String("hello".to_string()))
            .with_attribute("exec_kind", Value::String("nodejs:20".to_string()))
            .with_attribute(
                "code",
                Value::String("function main() { return {}; }".to_string()),
            )
    }

    #[test]
    fn code_action_builds_exec_block() {
        let action = from_resource(&code_action()).unwrap();
        assert_eq!(action.exec.kind, "nodejs:20");
        assert!(action.exec.code.is_some());
        assert!(action.limits.is_none());
    }

    #[test]
    fn sequence_without_components_is_rejected() {
        let resource = Resource::new("function_action", "pipeline")
            .with_attribute("namespace", Value::String("ns-1".to_string()))
            .with_attribute("name", Value::String("pipeline".to_string()))
            .with_attribute("exec_kind", Value::String("sequence".to_string()));
        let err = from_resource(&resource).unwrap_err();
        assert!(err.to_string().contains("components"));
    }

    #[test]
    fn source_less_action_is_rejected() {
        let resource = Resource::new("function_action", "empty")
            .with_attribute("namespace", Value::String("ns-1".to_string()))
            .with_attribute("name", Value::String("empty".to_string()))
            .with_attribute("exec_kind", Value::String("nodejs:20".to_string()));
        let err = from_resource(&resource).unwrap_err();
        assert!(err.to_string().contains("one of code, image, or components"));
    }

    #[test]
    fn limits_only_materialize_when_set() {
        let resource = code_action().with_attribute("memory", Value::Int(256));
        let action = from_resource(&resource).unwrap();
        let limits = action.limits.unwrap();
        assert_eq!(limits.memory, Some(256));
        assert_eq!(limits.timeout, None);
    }

    #[test]
    fn action_state_round_trips_limits() {
        let action = Action {
            name: "hello".to_string(),
            namespace: None,
            exec: Exec {
                kind: "nodejs:20".to_string(),
                code: Some("function main() {}".to_string()),
                image: None,
                main: None,
                binary: None,
                components: None,
            },
            annotations: vec![],
            parameters: vec![],
            limits: Some(Limits {
                timeout: Some(60000),
                memory: Some(256),
                log_size: None,
            }),
            publish: None,
            version: Some("0.0.2".to_string()),
        };
        let state = to_state(ResourceId::new("function_action", "hello"), "ns-1", &action);
        assert_eq!(state.attributes.get("timeout"), Some(&Value::Int(60000)));
        assert_eq!(state.attributes.get("memory"), Some(&Value::Int(256)));
        assert!(!state.attributes.contains_key("log_size"));
    }
}
