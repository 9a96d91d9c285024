//! Dedicated host pools and hosts
//!
//! A pool groups hosts of one flavor class in a metro; hosts are provisioned
//! into a pool and identified by the composite `pool:host` id. The only
//! in-place host update is the placement toggle. Hosts must have placement
//! disabled before they can be deleted.

use std::collections::HashMap;
use std::time::Duration;

use stratus_core::provider::{ProviderError, ProviderResult};
use stratus_core::resource::{Resource, ResourceId, State, Value};
use stratus_core::wait::{Refresh, StateChange};
use stratus_sdk::containers::{
    DedicatedHost, DedicatedHostCreateRequest, DedicatedHostPool, DedicatedHostPoolCreateRequest,
};

use super::{INITIAL_DELAY, POLL_INTERVAL, STATE_GONE};
use crate::StratusProvider;
use crate::attrs::{optional_bool, required_string};
use crate::error::api_error;

const POOL_CREATE_TIMEOUT: Duration = Duration::from_secs(40 * 60);
const POOL_DELETE_TIMEOUT: Duration = Duration::from_secs(40 * 60);
const HOST_CREATE_TIMEOUT: Duration = Duration::from_secs(40 * 60);
const HOST_DELETE_TIMEOUT: Duration = Duration::from_secs(40 * 60);
const PLACEMENT_TIMEOUT: Duration = Duration::from_secs(20 * 60);

// =============================================================================
// Host pools
// =============================================================================

pub(crate) async fn pool_create(
    provider: &StratusProvider,
    resource: &Resource,
) -> ProviderResult<State> {
    let request = DedicatedHostPoolCreateRequest {
        name: required_string(resource, "name")?,
        flavor_class: required_string(resource, "flavor_class")?,
        metro: required_string(resource, "metro")?,
    };

    tracing::info!(name = %request.name, metro = %request.metro, "creating dedicated host pool");
    let created = provider
        .containers
        .create_dedicated_host_pool(&request)
        .await
        .map_err(|e| {
            api_error("failed to create dedicated host pool", e).for_resource(resource.id.clone())
        })?;

    wait_for_pool(provider, &created.id)
        .await
        .map_err(|e| e.for_resource(resource.id.clone()))?;

    pool_read(provider, &resource.id, &created.id).await
}

pub(crate) async fn pool_read(
    provider: &StratusProvider,
    id: &ResourceId,
    pool_id: &str,
) -> ProviderResult<State> {
    let pool = match provider.containers.get_dedicated_host_pool(pool_id).await {
        Ok(pool) => pool,
        Err(e) if e.is_not_found() => return Ok(State::not_found(id.clone())),
        Err(e) => {
            return Err(api_error("failed to get dedicated host pool", e).for_resource(id.clone()));
        }
    };

    Ok(pool_to_state(id.clone(), &pool).with_identifier(pool_id))
}

pub(crate) async fn pool_delete(
    provider: &StratusProvider,
    id: &ResourceId,
    pool_id: &str,
) -> ProviderResult<()> {
    tracing::info!(pool = pool_id, "deleting dedicated host pool");
    match provider.containers.delete_dedicated_host_pool(pool_id).await {
        Ok(()) => {}
        Err(e) if e.is_not_found() => return Ok(()),
        Err(e) => {
            return Err(
                api_error("failed to delete dedicated host pool", e).for_resource(id.clone())
            );
        }
    }

    wait_for_pool_gone(provider, pool_id)
        .await
        .map_err(|e| e.for_resource(id.clone()))
}

async fn wait_for_pool(provider: &StratusProvider, pool_id: &str) -> ProviderResult<()> {
    let pool_id = pool_id.to_string();
    let containers = &provider.containers;

    StateChange::new(move || {
        let pool_id = pool_id.clone();
        Box::pin(async move {
            let pool = containers
                .get_dedicated_host_pool(&pool_id)
                .await
                .map_err(|e| api_error("failed to get dedicated host pool", e))?;
            let state = pool.state.clone();
            Ok(Refresh::new(Some(pool), state))
        })
    })
    .pending(["creating"])
    .target(["created"])
    .timeout(POOL_CREATE_TIMEOUT)
    .delay(INITIAL_DELAY)
    .poll_interval(POLL_INTERVAL)
    .wait()
    .await
    .map_err(ProviderError::from)?;
    Ok(())
}

async fn wait_for_pool_gone(provider: &StratusProvider, pool_id: &str) -> ProviderResult<()> {
    let pool_id = pool_id.to_string();
    let containers = &provider.containers;

    StateChange::<DedicatedHostPool>::new(move || {
        let pool_id = pool_id.clone();
        Box::pin(async move {
            match containers.get_dedicated_host_pool(&pool_id).await {
                Ok(pool) => {
                    let state = pool.state.clone();
                    Ok(Refresh::new(Some(pool), state))
                }
                Err(e) if e.is_not_found() => Ok(Refresh::new(None, STATE_GONE)),
                Err(e) => Err(api_error("failed to get dedicated host pool", e)),
            }
        })
    })
    .pending(["deleting", "created"])
    .target([STATE_GONE])
    .timeout(POOL_DELETE_TIMEOUT)
    .delay(INITIAL_DELAY)
    .poll_interval(POLL_INTERVAL)
    .wait()
    .await
    .map_err(ProviderError::from)?;
    Ok(())
}

fn pool_to_state(id: ResourceId, pool: &DedicatedHostPool) -> State {
    let mut attributes = HashMap::new();
    attributes.insert("name".to_string(), Value::String(pool.name.clone()));
    attributes.insert(
        "flavor_class".to_string(),
        Value::String(pool.flavor_class.clone()),
    );
    attributes.insert("metro".to_string(), Value::String(pool.metro.clone()));
    attributes.insert("state".to_string(), Value::String(pool.state.clone()));
    attributes.insert("host_count".to_string(), Value::Int(pool.host_count));
    attributes.insert(
        "worker_pool_count".to_string(),
        Value::Int(pool.worker_pool_count),
    );
    State::existing(id, attributes)
}

// =============================================================================
// Hosts
// =============================================================================

pub(crate) async fn host_create(
    provider: &StratusProvider,
    resource: &Resource,
) -> ProviderResult<State> {
    let pool = required_string(resource, "host_pool_id")?;
    let request = DedicatedHostCreateRequest {
        flavor: required_string(resource, "flavor")?,
        zone: required_string(resource, "zone")?,
    };

    tracing::info!(%pool, flavor = %request.flavor, zone = %request.zone, "creating dedicated host");
    let created = provider
        .containers
        .create_dedicated_host(&pool, &request)
        .await
        .map_err(|e| {
            api_error("failed to create dedicated host", e).for_resource(resource.id.clone())
        })?;

    wait_for_host(provider, &pool, &created.id)
        .await
        .map_err(|e| e.for_resource(resource.id.clone()))?;

    // Placement defaults on; honor an explicit opt-out at create time
    if optional_bool(resource, "placement_enabled") == Some(false) {
        set_placement(provider, &resource.id, &pool, &created.id, false).await?;
    }

    let identifier = crate::ids::join_colon(&[&pool, &created.id]);
    host_read(provider, &resource.id, &identifier).await
}

pub(crate) async fn host_read(
    provider: &StratusProvider,
    id: &ResourceId,
    identifier: &str,
) -> ProviderResult<State> {
    let parts = crate::ids::split_colon(identifier, 2).map_err(|e| e.for_resource(id.clone()))?;
    let (pool, host) = (parts[0], parts[1]);

    let dedicated_host = match provider.containers.get_dedicated_host(pool, host).await {
        Ok(dedicated_host) => dedicated_host,
        Err(e) if e.is_not_found() => return Ok(State::not_found(id.clone())),
        Err(e) => {
            return Err(api_error("failed to get dedicated host", e).for_resource(id.clone()));
        }
    };

    if dedicated_host.lifecycle.actual_state == "deleted" {
        return Ok(State::not_found(id.clone()));
    }

    Ok(host_to_state(id.clone(), pool, &dedicated_host).with_identifier(identifier))
}

pub(crate) async fn host_update(
    provider: &StratusProvider,
    id: &ResourceId,
    identifier: &str,
    from: &State,
    to: &Resource,
) -> ProviderResult<State> {
    let parts = crate::ids::split_colon(identifier, 2).map_err(|e| e.for_resource(id.clone()))?;
    let (pool, host) = (parts[0], parts[1]);

    let old_enabled = from
        .attributes
        .get("placement_enabled")
        .and_then(Value::as_bool);
    let enabled = optional_bool(to, "placement_enabled").unwrap_or(true);

    if Some(enabled) != old_enabled {
        set_placement(provider, id, pool, host, enabled).await?;
    }

    host_read(provider, id, identifier).await
}

pub(crate) async fn host_delete(
    provider: &StratusProvider,
    id: &ResourceId,
    identifier: &str,
) -> ProviderResult<()> {
    let parts = crate::ids::split_colon(identifier, 2).map_err(|e| e.for_resource(id.clone()))?;
    let (pool, host) = (parts[0], parts[1]);

    // The service refuses to release a host that still accepts workers
    let dedicated_host = match provider.containers.get_dedicated_host(pool, host).await {
        Ok(dedicated_host) => dedicated_host,
        Err(e) if e.is_not_found() => return Ok(()),
        Err(e) => {
            return Err(api_error("failed to get dedicated host", e).for_resource(id.clone()));
        }
    };
    if dedicated_host.placement.enabled {
        set_placement(provider, id, pool, host, false).await?;
    }

    tracing::info!(pool, host, "deleting dedicated host");
    match provider.containers.delete_dedicated_host(pool, host).await {
        Ok(()) => {}
        Err(e) if e.is_not_found() => return Ok(()),
        Err(e) => {
            return Err(api_error("failed to delete dedicated host", e).for_resource(id.clone()));
        }
    }

    wait_for_host_gone(provider, pool, host)
        .await
        .map_err(|e| e.for_resource(id.clone()))
}

async fn set_placement(
    provider: &StratusProvider,
    id: &ResourceId,
    pool: &str,
    host: &str,
    enable: bool,
) -> ProviderResult<()> {
    tracing::info!(pool, host, enable, "toggling dedicated host placement");
    provider
        .containers
        .set_dedicated_host_placement(pool, host, enable)
        .await
        .map_err(|e| api_error("failed to toggle host placement", e).for_resource(id.clone()))?;

    wait_for_placement(provider, pool, host, enable)
        .await
        .map_err(|e| e.for_resource(id.clone()))
}

async fn wait_for_host(provider: &StratusProvider, pool: &str, host: &str) -> ProviderResult<()> {
    let pool = pool.to_string();
    let host = host.to_string();
    let containers = &provider.containers;

    StateChange::new(move || {
        let pool = pool.clone();
        let host = host.clone();
        Box::pin(async move {
            let dedicated_host = containers
                .get_dedicated_host(&pool, &host)
                .await
                .map_err(|e| api_error("failed to get dedicated host", e))?;
            let state = dedicated_host.lifecycle.actual_state.clone();
            Ok(Refresh::new(Some(dedicated_host), state))
        })
    })
    .pending(["provisioning"])
    .target(["created"])
    .timeout(HOST_CREATE_TIMEOUT)
    .delay(INITIAL_DELAY)
    .poll_interval(POLL_INTERVAL)
    .wait()
    .await
    .map_err(ProviderError::from)?;
    Ok(())
}

async fn wait_for_placement(
    provider: &StratusProvider,
    pool: &str,
    host: &str,
    enable: bool,
) -> ProviderResult<()> {
    let pool = pool.to_string();
    let host = host.to_string();
    let containers = &provider.containers;
    let (pending, target) = if enable {
        (["updating", "disabled"], ["enabled"])
    } else {
        (["updating", "enabled"], ["disabled"])
    };

    StateChange::new(move || {
        let pool = pool.clone();
        let host = host.clone();
        Box::pin(async move {
            let dedicated_host = containers
                .get_dedicated_host(&pool, &host)
                .await
                .map_err(|e| api_error("failed to get dedicated host", e))?;
            let state = dedicated_host.placement.state.clone();
            Ok(Refresh::new(Some(dedicated_host), state))
        })
    })
    .pending(pending)
    .target(target)
    .timeout(PLACEMENT_TIMEOUT)
    .delay(INITIAL_DELAY)
    .poll_interval(POLL_INTERVAL)
    .wait()
    .await
    .map_err(ProviderError::from)?;
    Ok(())
}

async fn wait_for_host_gone(
    provider: &StratusProvider,
    pool: &str,
    host: &str,
) -> ProviderResult<()> {
    let pool = pool.to_string();
    let host = host.to_string();
    let containers = &provider.containers;

    StateChange::<DedicatedHost>::new(move || {
        let pool = pool.clone();
        let host = host.clone();
        Box::pin(async move {
            match containers.get_dedicated_host(&pool, &host).await {
                Ok(dedicated_host) => {
                    let state = dedicated_host.lifecycle.actual_state.clone();
                    Ok(Refresh::new(Some(dedicated_host), state))
                }
                Err(e) if e.is_not_found() => Ok(Refresh::new(None, STATE_GONE)),
                Err(e) => Err(api_error("failed to get dedicated host", e)),
            }
        })
    })
    .pending(["deleting", "created"])
    .target([STATE_GONE])
    .timeout(HOST_DELETE_TIMEOUT)
    .delay(INITIAL_DELAY)
    .poll_interval(POLL_INTERVAL)
    .wait()
    .await
    .map_err(ProviderError::from)?;
    Ok(())
}

fn host_to_state(id: ResourceId, pool: &str, host: &DedicatedHost) -> State {
    let mut attributes = HashMap::new();
    attributes.insert("host_pool_id".to_string(), Value::String(pool.to_string()));
    attributes.insert("flavor".to_string(), Value::String(host.flavor.clone()));
    attributes.insert("zone".to_string(), Value::String(host.zone.clone()));
    attributes.insert(
        "state".to_string(),
        Value::String(host.lifecycle.actual_state.clone()),
    );
    attributes.insert(
        "placement_enabled".to_string(),
        Value::Bool(host.placement.enabled),
    );
    attributes.insert("worker_count".to_string(), Value::Int(host.worker_count));
    State::existing(id, attributes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_state_mapping() {
        let pool: DedicatedHostPool = serde_json::from_value(serde_json::json!({
            "id": "hp-1",
            "name": "batch",
            "flavorClass": "bx2d",
            "metro": "dal",
            "state": "created",
            "hostCount": 2,
            "workerPoolCount": 1
        }))
        .unwrap();

        let state = pool_to_state(
            ResourceId::new("kubernetes_dedicated_host_pool", "batch"),
            &pool,
        );
        assert_eq!(state.attributes.get("host_count"), Some(&Value::Int(2)));
        assert_eq!(
            state.attributes.get("metro"),
            Some(&Value::String("dal".to_string()))
        );
    }

    #[test]
    fn host_state_mapping() {
        let host: DedicatedHost = serde_json::from_value(serde_json::json!({
            "id": "h-1",
            "flavor": "bx2d.host.152x608",
            "zone": "dal10",
            "lifecycle": {"actualState": "created", "desiredState": "created"},
            "placement": {"enabled": true, "state": "enabled"},
            "workerCount": 4
        }))
        .unwrap();

        let state = host_to_state(
            ResourceId::new("kubernetes_dedicated_host", "h-1"),
            "hp-1",
            &host,
        );
        assert_eq!(
            state.attributes.get("placement_enabled"),
            Some(&Value::Bool(true))
        );
        assert_eq!(state.attributes.get("worker_count"), Some(&Value::Int(4)));
        assert_eq!(
            state.attributes.get("host_pool_id"),
            Some(&Value::String("hp-1".to_string()))
        );
    }
}
