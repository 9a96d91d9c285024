//! Worker pool resource
//!
//! Identified by the composite `cluster:pool` id. Resize is the only
//! in-place update; anything else is delete-and-recreate.

use std::collections::HashMap;
use std::time::Duration;

use stratus_core::provider::{ProviderError, ProviderResult};
use stratus_core::resource::{Resource, ResourceId, State, Value};
use stratus_core::wait::{Refresh, StateChange};
use stratus_sdk::containers::{WorkerPool, WorkerPoolCreateRequest};

use super::{INITIAL_DELAY, POLL_INTERVAL, STATE_GONE, wait_for_workers};
use crate::StratusProvider;
use crate::attrs::{optional_string, required_string, string_map};
use crate::error::api_error;

const PROVISION_TIMEOUT: Duration = Duration::from_secs(90 * 60);
const DELETE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

pub(crate) async fn create(
    provider: &StratusProvider,
    resource: &Resource,
) -> ProviderResult<State> {
    let cluster = required_string(resource, "cluster")?;
    let request = WorkerPoolCreateRequest {
        name: required_string(resource, "name")?,
        machine_type: required_string(resource, "machine_type")?,
        size_per_zone: resource.int_attr("size_per_zone").ok_or_else(|| {
            ProviderError::new("attribute 'size_per_zone' is required")
                .for_resource(resource.id.clone())
        })?,
        labels: string_map(resource, "labels"),
        host_pool_id: optional_string(resource, "host_pool_id"),
    };

    tracing::info!(%cluster, pool = %request.name, "creating worker pool");
    let created = provider
        .containers
        .create_worker_pool(&cluster, &request)
        .await
        .map_err(|e| {
            api_error("failed to create worker pool", e).for_resource(resource.id.clone())
        })?;

    wait_for_workers(provider, &cluster, Some(&request.name), PROVISION_TIMEOUT)
        .await
        .map_err(|e| e.for_resource(resource.id.clone()))?;

    let identifier = crate::ids::join_colon(&[&cluster, &created.worker_pool_id]);
    read(provider, &resource.id, &identifier).await
}

pub(crate) async fn read(
    provider: &StratusProvider,
    id: &ResourceId,
    identifier: &str,
) -> ProviderResult<State> {
    let parts = crate::ids::split_colon(identifier, 2).map_err(|e| e.for_resource(id.clone()))?;
    let (cluster, pool) = (parts[0], parts[1]);

    let worker_pool = match provider.containers.get_worker_pool(cluster, pool).await {
        Ok(worker_pool) => worker_pool,
        Err(e) if e.is_not_found() => return Ok(State::not_found(id.clone())),
        Err(e) => return Err(api_error("failed to get worker pool", e).for_resource(id.clone())),
    };

    Ok(to_state(id.clone(), cluster, &worker_pool).with_identifier(identifier))
}

pub(crate) async fn update(
    provider: &StratusProvider,
    id: &ResourceId,
    identifier: &str,
    from: &State,
    to: &Resource,
) -> ProviderResult<State> {
    let parts = crate::ids::split_colon(identifier, 2).map_err(|e| e.for_resource(id.clone()))?;
    let (cluster, pool) = (parts[0], parts[1]);

    let old_size = from.attributes.get("size_per_zone").and_then(Value::as_int);
    match to.int_attr("size_per_zone") {
        Some(size) if Some(size) != old_size => {
            tracing::info!(cluster, pool, size, "resizing worker pool");
            provider
                .containers
                .resize_worker_pool(cluster, pool, size)
                .await
                .map_err(|e| {
                    api_error("failed to resize worker pool", e).for_resource(id.clone())
                })?;

            let pool_name = from
                .attributes
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or(pool)
                .to_string();
            wait_for_workers(provider, cluster, Some(&pool_name), PROVISION_TIMEOUT)
                .await
                .map_err(|e| e.for_resource(id.clone()))?;
        }
        _ => {
            return Err(ProviderError::new(
                "only size_per_zone can change in place, delete and recreate",
            )
            .for_resource(id.clone()));
        }
    }

    read(provider, id, identifier).await
}

pub(crate) async fn delete(
    provider: &StratusProvider,
    id: &ResourceId,
    identifier: &str,
) -> ProviderResult<()> {
    let parts = crate::ids::split_colon(identifier, 2).map_err(|e| e.for_resource(id.clone()))?;
    let (cluster, pool) = (parts[0], parts[1]);

    tracing::info!(cluster, pool, "deleting worker pool");
    match provider.containers.delete_worker_pool(cluster, pool).await {
        Ok(()) => {}
        Err(e) if e.is_not_found() => return Ok(()),
        Err(e) => {
            return Err(api_error("failed to delete worker pool", e).for_resource(id.clone()));
        }
    }

    wait_for_pool_gone(provider, cluster, pool)
        .await
        .map_err(|e| e.for_resource(id.clone()))
}

async fn wait_for_pool_gone(
    provider: &StratusProvider,
    cluster: &str,
    pool: &str,
) -> ProviderResult<()> {
    let cluster = cluster.to_string();
    let pool = pool.to_string();
    let containers = &provider.containers;

    StateChange::<WorkerPool>::new(move || {
        let cluster = cluster.clone();
        let pool = pool.clone();
        Box::pin(async move {
            match containers.get_worker_pool(&cluster, &pool).await {
                Ok(worker_pool) => {
                    let state = worker_pool.state.clone();
                    Ok(Refresh::new(Some(worker_pool), state))
                }
                Err(e) if e.is_not_found() => Ok(Refresh::new(None, STATE_GONE)),
                Err(e) => Err(api_error("failed to get worker pool", e)),
            }
        })
    })
    .pending(["deleting", "provisioned", "resizing"])
    .target([STATE_GONE])
    .timeout(DELETE_TIMEOUT)
    .delay(INITIAL_DELAY)
    .poll_interval(POLL_INTERVAL)
    .wait()
    .await
    .map_err(ProviderError::from)?;
    Ok(())
}

fn to_state(id: ResourceId, cluster: &str, pool: &WorkerPool) -> State {
    let mut attributes = HashMap::new();
    attributes.insert("cluster".to_string(), Value::String(cluster.to_string()));
    attributes.insert("name".to_string(), Value::String(pool.name.clone()));
    attributes.insert(
        "machine_type".to_string(),
        Value::String(pool.machine_type.clone()),
    );
    attributes.insert("size_per_zone".to_string(), Value::Int(pool.size_per_zone));
    attributes.insert("state".to_string(), Value::String(pool.state.clone()));
    if !pool.labels.is_empty() {
        let labels = pool
            .labels
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();
        attributes.insert("labels".to_string(), Value::Map(labels));
    }
    if let Some(host_pool) = &pool.host_pool_id {
        attributes.insert(
            "host_pool_id".to_string(),
            Value::String(host_pool.clone()),
        );
    }
    State::existing(id, attributes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_state_mapping() {
        let pool: WorkerPool = serde_json::from_value(serde_json::json!({
            "id": "p-2",
            "name": "compute",
            "machineType": "b3c.4x16",
            "sizePerZone": 2,
            "state": "provisioned",
            "labels": {"tier": "gold"},
            "hostPoolID": "hp-1"
        }))
        .unwrap();

        let state = to_state(
            ResourceId::new("kubernetes_worker_pool", "compute"),
            "c-1",
            &pool,
        );
        assert_eq!(
            state.attributes.get("cluster"),
            Some(&Value::String("c-1".to_string()))
        );
        assert_eq!(state.attributes.get("size_per_zone"), Some(&Value::Int(2)));
        assert_eq!(
            state.attributes.get("host_pool_id"),
            Some(&Value::String("hp-1".to_string()))
        );
    }
}
