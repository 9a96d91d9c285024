//! Function rule resource
//!
//! Binds a trigger to an action. A status-only change flips the rule
//! active or inactive without re-inserting the bindings.

use std::collections::HashMap;

use stratus_core::provider::ProviderResult;
use stratus_core::resource::{Resource, ResourceId, State, Value};
use stratus_sdk::functions::Rule;

use crate::StratusProvider;
use crate::attrs::{optional_string, required_string};
use crate::error::api_error;

pub(crate) async fn create(
    provider: &StratusProvider,
    resource: &Resource,
) -> ProviderResult<State> {
    let namespace = required_string(resource, "namespace")?;
    let rule = from_resource(resource)?;

    tracing::info!(%namespace, rule = %rule.name, "creating function rule");
    let inserted = provider
        .functions
        .insert_rule(&namespace, &rule, false)
        .await
        .map_err(|e| {
            api_error("failed to create function rule", e).for_resource(resource.id.clone())
        })?;

    // Rules come up inactive; honor a requested status
    if rule.status.as_deref() == Some("active") {
        provider
            .functions
            .set_rule_state(&namespace, &inserted.name, true)
            .await
            .map_err(|e| {
                api_error("failed to activate function rule", e).for_resource(resource.id.clone())
            })?;
    }

    let identifier = crate::ids::join_colon(&[&namespace, &inserted.name]);
    read(provider, &resource.id, &identifier).await
}

pub(crate) async fn read(
    provider: &StratusProvider,
    id: &ResourceId,
    identifier: &str,
) -> ProviderResult<State> {
    let parts = crate::ids::split_colon(identifier, 2).map_err(|e| e.for_resource(id.clone()))?;
    let (namespace, name) = (parts[0], parts[1]);

    let rule = match provider.functions.get_rule(namespace, name).await {
        Ok(rule) => rule,
        Err(e) if e.is_not_found() => return Ok(State::not_found(id.clone())),
        Err(e) => {
            return Err(api_error("failed to get function rule", e).for_resource(id.clone()));
        }
    };

    Ok(to_state(id.clone(), namespace, &rule).with_identifier(identifier))
}

pub(crate) async fn update(
    provider: &StratusProvider,
    id: &ResourceId,
    identifier: &str,
    from: &State,
    to: &Resource,
) -> ProviderResult<State> {
    let parts = crate::ids::split_colon(identifier, 2).map_err(|e| e.for_resource(id.clone()))?;
    let namespace = parts[0].to_string();
    let name = parts[1].to_string();

    let old_trigger = from.attributes.get("trigger").and_then(Value::as_str);
    let old_action = from.attributes.get("action").and_then(Value::as_str);
    let rule = from_resource(to)?;

    let bindings_changed = Some(rule.trigger.as_str()) != old_trigger
        || Some(rule.action.as_str()) != old_action;
    if bindings_changed {
        tracing::info!(%namespace, rule = %name, "updating function rule bindings");
        provider
            .functions
            .insert_rule(&namespace, &rule, true)
            .await
            .map_err(|e| {
                api_error("failed to update function rule", e).for_resource(id.clone())
            })?;
    }

    let old_status = from.attributes.get("status").and_then(Value::as_str);
    if let Some(status) = rule.status.as_deref().filter(|s| Some(*s) != old_status) {
        tracing::info!(%namespace, rule = %name, status, "setting function rule status");
        provider
            .functions
            .set_rule_state(&namespace, &name, status == "active")
            .await
            .map_err(|e| {
                api_error("failed to set function rule status", e).for_resource(id.clone())
            })?;
    }

    read(provider, id, identifier).await
}

pub(crate) async fn delete(
    provider: &StratusProvider,
    id: &ResourceId,
    identifier: &str,
) -> ProviderResult<()> {
    let parts = crate::ids::split_colon(identifier, 2).map_err(|e| e.for_resource(id.clone()))?;
    let (namespace, name) = (parts[0], parts[1]);

    tracing::info!(namespace, rule = name, "deleting function rule");
    match provider.functions.delete_rule(namespace, name).await {
        Ok(()) => Ok(()),
        Err(e) if e.is_not_found() => Ok(()),
        Err(e) => Err(api_error("failed to delete function rule", e).for_resource(id.clone())),
    }
}

fn from_resource(resource: &Resource) -> ProviderResult<Rule> {
    Ok(Rule {
        name: required_string(resource, "name")?,
        namespace: None,
        trigger: required_string(resource, "trigger")?,
        action: required_string(resource, "action")?,
        status: optional_string(resource, "status"),
        publish: None,
        version: None,
    })
}

fn to_state(id: ResourceId, namespace: &str, rule: &Rule) -> State {
    let mut attributes = HashMap::new();
    attributes.insert(
        "namespace".to_string(),
        Value::String(namespace.to_string()),
    );
    attributes.insert("name".to_string(), Value::String(rule.name.clone()));
    attributes.insert("trigger".to_string(), Value::String(rule.trigger.clone()));
    attributes.insert("action".to_string(), Value::String(rule.action.clone()));
    if let Some(status) = &rule.status {
        attributes.insert("status".to_string(), Value::String(status.clone()));
    }
    if let Some(version) = &rule.version {
        attributes.insert("version".to_string(), Value::String(version.clone()));
    }
    State::existing(id, attributes)
}
