//! Application load balancer resource
//!
//! ALBs are provisioned with the cluster; this resource only toggles an
//! existing ALB on or off. Delete therefore disables rather than removes.

use std::collections::HashMap;
use std::time::Duration;

use stratus_core::provider::{ProviderError, ProviderResult};
use stratus_core::resource::{Resource, ResourceId, State, Value};
use stratus_core::wait::{Refresh, StateChange};
use stratus_sdk::containers::{Alb, AlbConfigRequest};

use super::{INITIAL_DELAY, POLL_INTERVAL};
use crate::StratusProvider;
use crate::attrs::{optional_bool, required_string};
use crate::error::api_error;

const TOGGLE_TIMEOUT: Duration = Duration::from_secs(60 * 60);

pub(crate) async fn create(
    provider: &StratusProvider,
    resource: &Resource,
) -> ProviderResult<State> {
    let alb_id = required_string(resource, "alb_id")?;
    let enable = optional_bool(resource, "enable").unwrap_or(true);

    configure(provider, &resource.id, &alb_id, enable).await?;
    read(provider, &resource.id, &alb_id).await
}

pub(crate) async fn read(
    provider: &StratusProvider,
    id: &ResourceId,
    alb_id: &str,
) -> ProviderResult<State> {
    let alb = match provider.containers.get_alb(alb_id).await {
        Ok(alb) => alb,
        Err(e) if e.is_not_found() => return Ok(State::not_found(id.clone())),
        Err(e) => return Err(api_error("failed to get ALB", e).for_resource(id.clone())),
    };

    Ok(to_state(id.clone(), &alb).with_identifier(alb_id))
}

pub(crate) async fn update(
    provider: &StratusProvider,
    id: &ResourceId,
    identifier: &str,
    from: &State,
    to: &Resource,
) -> ProviderResult<State> {
    let old_enable = from.attributes.get("enable").and_then(Value::as_bool);
    let enable = optional_bool(to, "enable").unwrap_or(true);

    if Some(enable) != old_enable {
        configure(provider, id, identifier, enable).await?;
    }

    read(provider, id, identifier).await
}

/// Disable the ALB; the load balancer itself belongs to the cluster
pub(crate) async fn delete(
    provider: &StratusProvider,
    id: &ResourceId,
    identifier: &str,
) -> ProviderResult<()> {
    match provider.containers.get_alb(identifier).await {
        Ok(_) => {}
        Err(e) if e.is_not_found() => return Ok(()),
        Err(e) => return Err(api_error("failed to get ALB", e).for_resource(id.clone())),
    }

    configure(provider, id, identifier, false).await
}

async fn configure(
    provider: &StratusProvider,
    id: &ResourceId,
    alb_id: &str,
    enable: bool,
) -> ProviderResult<()> {
    let alb = provider
        .containers
        .get_alb(alb_id)
        .await
        .map_err(|e| api_error("failed to get ALB", e).for_resource(id.clone()))?;

    tracing::info!(alb = alb_id, cluster = %alb.cluster, enable, "configuring ALB");
    let request = AlbConfigRequest {
        alb_id: alb_id.to_string(),
        cluster: alb.cluster.clone(),
        enable,
    };
    provider
        .containers
        .configure_alb(&request)
        .await
        .map_err(|e| api_error("failed to configure ALB", e).for_resource(id.clone()))?;

    wait_for_alb(provider, alb_id, enable)
        .await
        .map_err(|e| e.for_resource(id.clone()))
}

/// Wait for the toggle to settle in the requested direction
async fn wait_for_alb(
    provider: &StratusProvider,
    alb_id: &str,
    enable: bool,
) -> ProviderResult<()> {
    let alb_id = alb_id.to_string();
    let containers = &provider.containers;
    let (pending, target) = if enable {
        (["enabling", "disabled"], ["enabled"])
    } else {
        (["disabling", "enabled"], ["disabled"])
    };

    StateChange::new(move || {
        let alb_id = alb_id.clone();
        Box::pin(async move {
            let alb = containers
                .get_alb(&alb_id)
                .await
                .map_err(|e| api_error("failed to get ALB", e))?;
            let state = alb_state(&alb);
            Ok(Refresh::new(Some(alb), state))
        })
    })
    .pending(pending)
    .target(target)
    .timeout(TOGGLE_TIMEOUT)
    .delay(INITIAL_DELAY)
    .poll_interval(POLL_INTERVAL)
    .wait()
    .await
    .map_err(ProviderError::from)?;
    Ok(())
}

/// Some responses leave the state string empty; fall back to the flag
fn alb_state(alb: &Alb) -> String {
    if !alb.state.is_empty() {
        alb.state.clone()
    } else if alb.enable {
        "enabled".to_string()
    } else {
        "disabled".to_string()
    }
}

fn to_state(id: ResourceId, alb: &Alb) -> State {
    let mut attributes = HashMap::new();
    attributes.insert("alb_id".to_string(), Value::String(alb.alb_id.clone()));
    attributes.insert("cluster".to_string(), Value::String(alb.cluster.clone()));
    attributes.insert("enable".to_string(), Value::Bool(alb.enable));
    attributes.insert("state".to_string(), Value::String(alb_state(alb)));
    attributes.insert(
        "alb_type".to_string(),
        Value::String(alb.alb_type.clone()),
    );
    if let Some(zone) = &alb.zone {
        attributes.insert("zone".to_string(), Value::String(zone.clone()));
    }
    attributes.insert(
        "disable_deployment".to_string(),
        Value::Bool(alb.disable_deployment),
    );
    State::existing(id, attributes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alb(state: &str, enable: bool) -> Alb {
        serde_json::from_value(serde_json::json!({
            "albID": "private-crc-1",
            "albType": "private",
            "cluster": "c-1",
            "enable": enable,
            "state": state,
            "disableDeployment": false,
            "zone": "dal10"
        }))
        .unwrap()
    }

    #[test]
    fn state_string_wins_over_enable_flag() {
        assert_eq!(alb_state(&alb("enabling", false)), "enabling");
    }

    #[test]
    fn enable_flag_fills_in_missing_state() {
        assert_eq!(alb_state(&alb("", true)), "enabled");
        assert_eq!(alb_state(&alb("", false)), "disabled");
    }

    #[test]
    fn alb_state_mapping() {
        let state = to_state(
            ResourceId::new("kubernetes_alb", "private"),
            &alb("enabled", true),
        );
        assert_eq!(
            state.attributes.get("alb_id"),
            Some(&Value::String("private-crc-1".to_string()))
        );
        assert_eq!(state.attributes.get("enable"), Some(&Value::Bool(true)));
        assert_eq!(
            state.attributes.get("zone"),
            Some(&Value::String("dal10".to_string()))
        );
    }
}
