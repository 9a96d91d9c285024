//! Kubernetes cluster resource
//!
//! Create polls until the master reaches a settled state and the initial
//! workers are provisioned. Version updates roll the master first, then
//! replace each worker through the process-wide replacement gate.

use std::collections::HashMap;
use std::time::Duration;

use stratus_core::provider::{ProviderError, ProviderResult};
use stratus_core::resource::{Resource, ResourceId, State, Value};
use stratus_core::wait::{Refresh, StateChange};
use stratus_sdk::containers::{Cluster, ClusterCreateRequest};

use super::replace::REPLACE_GATE;
use super::{INITIAL_DELAY, POLL_INTERVAL, STATE_GONE, wait_for_workers};
use crate::StratusProvider;
use crate::attrs::{optional_bool, optional_int, optional_string, required_string};
use crate::error::api_error;

const CREATE_TIMEOUT: Duration = Duration::from_secs(90 * 60);
const UPDATE_TIMEOUT: Duration = Duration::from_secs(90 * 60);
const DELETE_TIMEOUT: Duration = Duration::from_secs(45 * 60);
const WORKER_TIMEOUT: Duration = Duration::from_secs(90 * 60);

/// Default worker pool created with every cluster
const DEFAULT_POOL: &str = "default";

pub(crate) async fn create(
    provider: &StratusProvider,
    resource: &Resource,
) -> ProviderResult<State> {
    let request = ClusterCreateRequest {
        name: required_string(resource, "name")?,
        datacenter: required_string(resource, "datacenter")?,
        machine_type: required_string(resource, "machine_type")?,
        worker_num: optional_int(resource, "worker_num").unwrap_or(1),
        hardware: optional_string(resource, "hardware").unwrap_or_else(|| "shared".to_string()),
        kube_version: optional_string(resource, "kube_version"),
        public_vlan: optional_string(resource, "public_vlan"),
        private_vlan: optional_string(resource, "private_vlan"),
        disable_auto_update: optional_bool(resource, "disable_auto_update"),
    };

    tracing::info!(name = %request.name, datacenter = %request.datacenter, "creating cluster");
    let created = provider
        .containers
        .create_cluster(&request)
        .await
        .map_err(|e| api_error("failed to create cluster", e).for_resource(resource.id.clone()))?;

    wait_for_cluster(provider, &created.id, CREATE_TIMEOUT)
        .await
        .map_err(|e| e.for_resource(resource.id.clone()))?;
    wait_for_workers(provider, &created.id, None, WORKER_TIMEOUT)
        .await
        .map_err(|e| e.for_resource(resource.id.clone()))?;

    read(provider, &resource.id, &created.id).await
}

pub(crate) async fn read(
    provider: &StratusProvider,
    id: &ResourceId,
    cluster_id: &str,
) -> ProviderResult<State> {
    let cluster = match provider.containers.get_cluster(cluster_id).await {
        Ok(cluster) => cluster,
        Err(e) if e.is_not_found() => return Ok(State::not_found(id.clone())),
        Err(e) => {
            return Err(api_error("failed to get cluster", e).for_resource(id.clone()));
        }
    };

    Ok(to_state(id.clone(), &cluster).with_identifier(cluster_id))
}

pub(crate) async fn update(
    provider: &StratusProvider,
    id: &ResourceId,
    identifier: &str,
    from: &State,
    to: &Resource,
) -> ProviderResult<State> {
    let old_version = from.attributes.get("kube_version").and_then(Value::as_str);
    let new_version = optional_string(to, "kube_version");

    if let Some(version) = new_version.filter(|v| Some(v.as_str()) != old_version) {
        tracing::info!(cluster = identifier, %version, "updating cluster master version");
        provider
            .containers
            .update_cluster(identifier, &version, true)
            .await
            .map_err(|e| api_error("failed to update cluster version", e).for_resource(id.clone()))?;

        wait_for_cluster(provider, identifier, UPDATE_TIMEOUT)
            .await
            .map_err(|e| e.for_resource(id.clone()))?;

        // Roll the workers onto the new master version, one at a time
        let workers = provider
            .containers
            .list_workers(identifier)
            .await
            .map_err(|e| api_error("failed to list workers", e).for_resource(id.clone()))?;
        for worker in workers {
            replace_worker(provider, identifier, &worker.id)
                .await
                .map_err(|e| e.for_resource(id.clone()))?;
        }
    }

    let old_count = from.attributes.get("worker_num").and_then(Value::as_int);
    if let Some(count) = optional_int(to, "worker_num").filter(|c| Some(*c) != old_count) {
        tracing::info!(cluster = identifier, count, "resizing default worker pool");
        provider
            .containers
            .resize_worker_pool(identifier, DEFAULT_POOL, count)
            .await
            .map_err(|e| api_error("failed to resize worker pool", e).for_resource(id.clone()))?;
        wait_for_workers(provider, identifier, Some(DEFAULT_POOL), WORKER_TIMEOUT)
            .await
            .map_err(|e| e.for_resource(id.clone()))?;
    }

    read(provider, id, identifier).await
}

pub(crate) async fn delete(
    provider: &StratusProvider,
    id: &ResourceId,
    identifier: &str,
) -> ProviderResult<()> {
    tracing::info!(cluster = identifier, "deleting cluster");
    match provider.containers.delete_cluster(identifier).await {
        Ok(()) => {}
        // Already gone: destroy is complete
        Err(e) if e.is_not_found() => return Ok(()),
        Err(e) => return Err(api_error("failed to delete cluster", e).for_resource(id.clone())),
    }

    wait_for_cluster_gone(provider, identifier)
        .await
        .map_err(|e| e.for_resource(id.clone()))
}

/// Replace one worker through the process-wide gate
async fn replace_worker(
    provider: &StratusProvider,
    cluster: &str,
    worker: &str,
) -> ProviderResult<()> {
    let permit = REPLACE_GATE.acquire().await?;
    tracing::info!(cluster, worker, "replacing worker");

    let result = async {
        provider
            .containers
            .replace_worker(cluster, worker)
            .await
            .map_err(|e| api_error("failed to replace worker", e))?;
        wait_for_workers(provider, cluster, None, WORKER_TIMEOUT).await
    }
    .await;

    match result {
        Ok(()) => {
            permit.succeed();
            Ok(())
        }
        Err(e) => {
            permit.fail(worker);
            Err(e)
        }
    }
}

/// Wait for the cluster master to reach a settled state
async fn wait_for_cluster(
    provider: &StratusProvider,
    cluster_id: &str,
    timeout: Duration,
) -> ProviderResult<()> {
    let cluster_id = cluster_id.to_string();
    let containers = &provider.containers;

    StateChange::new(move || {
        let cluster_id = cluster_id.clone();
        Box::pin(async move {
            let cluster = containers
                .get_cluster(&cluster_id)
                .await
                .map_err(|e| api_error("failed to get cluster", e))?;
            let state = cluster.state.clone();
            Ok(Refresh::new(Some(cluster), state))
        })
    })
    .pending(["deploying", "requested", "pending", "updating"])
    .target(["normal", "deployed"])
    .timeout(timeout)
    .delay(INITIAL_DELAY)
    .poll_interval(POLL_INTERVAL)
    .wait()
    .await
    .map_err(ProviderError::from)?;
    Ok(())
}

/// Wait for a deleted cluster to disappear; 404 is the target
async fn wait_for_cluster_gone(provider: &StratusProvider, cluster_id: &str) -> ProviderResult<()> {
    let cluster_id = cluster_id.to_string();
    let containers = &provider.containers;

    StateChange::<Cluster>::new(move || {
        let cluster_id = cluster_id.clone();
        Box::pin(async move {
            match containers.get_cluster(&cluster_id).await {
                Ok(cluster) => {
                    let state = cluster.state.clone();
                    Ok(Refresh::new(Some(cluster), state))
                }
                Err(e) if e.is_not_found() => Ok(Refresh::new(None, STATE_GONE)),
                Err(e) => Err(api_error("failed to get cluster", e)),
            }
        })
    })
    .pending(["deleting", "normal", "deployed"])
    .target([STATE_GONE])
    .timeout(DELETE_TIMEOUT)
    .delay(INITIAL_DELAY)
    .poll_interval(POLL_INTERVAL)
    .wait()
    .await
    .map_err(ProviderError::from)?;
    Ok(())
}

fn to_state(id: ResourceId, cluster: &Cluster) -> State {
    let mut attributes = HashMap::new();
    attributes.insert("name".to_string(), Value::String(cluster.name.clone()));
    attributes.insert("state".to_string(), Value::String(cluster.state.clone()));
    attributes.insert("crn".to_string(), Value::String(cluster.crn.clone()));
    attributes.insert(
        "kube_version".to_string(),
        Value::String(kube_version_attr(&cluster.master_kube_version)),
    );
    attributes.insert(
        "worker_num".to_string(),
        Value::Int(cluster.worker_count),
    );
    attributes.insert(
        "disable_auto_update".to_string(),
        Value::Bool(cluster.disable_auto_update),
    );
    if let Some(region) = &cluster.region {
        attributes.insert("region".to_string(), Value::String(region.clone()));
    }
    if let Some(hostname) = &cluster.ingress_hostname {
        attributes.insert(
            "ingress_hostname".to_string(),
            Value::String(hostname.clone()),
        );
    }
    if let Some(secret) = &cluster.ingress_secret_name {
        attributes.insert("ingress_secret".to_string(), Value::String(secret.clone()));
    }
    State::existing(id, attributes)
}

/// Drop the build suffix from the master version, keeping the
/// distribution marker (e.g. "1.31.2_1547" -> "1.31.2",
/// "4.16_openshift_1d2" -> "4.16_openshift")
fn kube_version_attr(master_version: &str) -> String {
    let base = master_version.split('_').next().unwrap_or(master_version);
    if master_version.contains("_openshift") {
        format!("{}_openshift", base)
    } else {
        base.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kube_version_strips_build_suffix() {
        assert_eq!(kube_version_attr("1.31.2_1547"), "1.31.2");
        assert_eq!(kube_version_attr("1.31.2"), "1.31.2");
    }

    #[test]
    fn kube_version_keeps_openshift_marker() {
        assert_eq!(kube_version_attr("4.16_openshift_1d2"), "4.16_openshift");
        assert_eq!(kube_version_attr("4.16_openshift"), "4.16_openshift");
    }

    #[test]
    fn cluster_state_mapping() {
        let cluster: Cluster = serde_json::from_value(serde_json::json!({
            "id": "c-1",
            "name": "main",
            "state": "normal",
            "crn": "crn:v1:cloud:public:containers:us-south:a/1:cluster:c-1",
            "region": "us-south",
            "masterKubeVersion": "1.31.2_1547",
            "ingressHostname": "main.example.cloud",
            "ingressSecretName": "main",
            "workerCount": 3,
            "disableAutoUpdate": true
        }))
        .unwrap();

        let state = to_state(ResourceId::new("kubernetes_cluster", "main"), &cluster);
        assert!(state.exists);
        assert_eq!(
            state.attributes.get("kube_version"),
            Some(&Value::String("1.31.2".to_string()))
        );
        assert_eq!(state.attributes.get("worker_num"), Some(&Value::Int(3)));
        assert_eq!(
            state.attributes.get("ingress_secret"),
            Some(&Value::String("main".to_string()))
        );
    }
}
