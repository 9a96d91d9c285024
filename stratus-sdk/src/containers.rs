//! Container service API
//!
//! Managed Kubernetes surface: clusters, workers, worker pools, ALBs,
//! ingress secrets, dedicated host pools and dedicated hosts.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::client::ApiClient;
use crate::error::Result;

// =============================================================================
// Clusters
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct ClusterCreateRequest {
    pub name: String,
    #[serde(rename = "dataCenter")]
    pub datacenter: String,
    #[serde(rename = "machineType")]
    pub machine_type: String,
    #[serde(rename = "workerNum")]
    pub worker_num: i64,
    /// "shared" or "dedicated"
    pub hardware: String,
    #[serde(rename = "masterVersion", skip_serializing_if = "Option::is_none")]
    pub kube_version: Option<String>,
    #[serde(rename = "publicVlan", skip_serializing_if = "Option::is_none")]
    pub public_vlan: Option<String>,
    #[serde(rename = "privateVlan", skip_serializing_if = "Option::is_none")]
    pub private_vlan: Option<String>,
    #[serde(rename = "disableAutoUpdate", skip_serializing_if = "Option::is_none")]
    pub disable_auto_update: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClusterCreateResponse {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Cluster {
    pub id: String,
    pub name: String,
    /// Lifecycle state: "deploying", "normal", "deleting", ...
    pub state: String,
    pub crn: String,
    pub region: Option<String>,
    #[serde(rename = "masterKubeVersion")]
    pub master_kube_version: String,
    #[serde(rename = "ingressHostname")]
    pub ingress_hostname: Option<String>,
    #[serde(rename = "ingressSecretName")]
    pub ingress_secret_name: Option<String>,
    #[serde(rename = "workerCount", default)]
    pub worker_count: i64,
    #[serde(rename = "disableAutoUpdate", default)]
    pub disable_auto_update: bool,
}

/// Master version update. The vendor only accepts action "update".
#[derive(Debug, Clone, Serialize)]
pub struct ClusterUpdateRequest {
    pub action: String,
    pub version: String,
    pub force: bool,
}

// =============================================================================
// Workers / worker pools
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct Worker {
    pub id: String,
    /// "provisioning", "normal", "aborted", ...
    pub state: String,
    pub status: Option<String>,
    #[serde(rename = "poolName")]
    pub pool_name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkerPoolCreateRequest {
    pub name: String,
    #[serde(rename = "machineType")]
    pub machine_type: String,
    #[serde(rename = "sizePerZone")]
    pub size_per_zone: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<HashMap<String, String>>,
    #[serde(rename = "hostPoolID", skip_serializing_if = "Option::is_none")]
    pub host_pool_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorkerPoolCreateResponse {
    #[serde(rename = "workerPoolID")]
    pub worker_pool_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorkerPool {
    pub id: String,
    pub name: String,
    #[serde(rename = "machineType")]
    pub machine_type: String,
    #[serde(rename = "sizePerZone")]
    pub size_per_zone: i64,
    pub state: String,
    #[serde(default)]
    pub labels: HashMap<String, String>,
    #[serde(rename = "hostPoolID")]
    pub host_pool_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
struct WorkerPoolResizeRequest {
    state: String,
    #[serde(rename = "sizePerZone")]
    size_per_zone: i64,
}

// =============================================================================
// ALBs
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct Alb {
    #[serde(rename = "albID")]
    pub alb_id: String,
    #[serde(rename = "albType")]
    pub alb_type: String,
    pub cluster: String,
    pub enable: bool,
    /// "enabled", "enabling", "disabled", "disabling"
    pub state: String,
    #[serde(rename = "disableDeployment", default)]
    pub disable_deployment: bool,
    pub zone: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AlbConfigRequest {
    #[serde(rename = "albID")]
    pub alb_id: String,
    pub cluster: String,
    pub enable: bool,
}

// =============================================================================
// Ingress secrets
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct IngressSecretCreateRequest {
    pub cluster: String,
    pub name: String,
    pub namespace: String,
    /// CRN of the certificate or opaque secret source
    pub crn: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persistence: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IngressSecret {
    pub cluster: String,
    pub name: String,
    pub namespace: String,
    pub crn: String,
    /// "created", "updating", "deleted"
    pub status: String,
    #[serde(rename = "type")]
    pub secret_type: Option<String>,
    pub domain: Option<String>,
    #[serde(rename = "expiresOn")]
    pub expires_on: Option<String>,
    #[serde(default)]
    pub persistence: bool,
}

// =============================================================================
// Dedicated hosts
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct DedicatedHostPoolCreateRequest {
    pub name: String,
    #[serde(rename = "flavorClass")]
    pub flavor_class: String,
    pub metro: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DedicatedHostPoolCreateResponse {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DedicatedHostPool {
    pub id: String,
    pub name: String,
    #[serde(rename = "flavorClass")]
    pub flavor_class: String,
    pub metro: String,
    /// "creating", "created", "deleting"
    pub state: String,
    #[serde(rename = "hostCount", default)]
    pub host_count: i64,
    #[serde(rename = "workerPoolCount", default)]
    pub worker_pool_count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DedicatedHostCreateRequest {
    pub flavor: String,
    pub zone: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DedicatedHostCreateResponse {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HostLifecycle {
    /// "provisioning", "created", "deleting", "deleted", "failed"
    #[serde(rename = "actualState")]
    pub actual_state: String,
    #[serde(rename = "desiredState")]
    pub desired_state: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HostPlacement {
    pub enabled: bool,
    /// "enabled", "disabled", "updating"
    pub state: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DedicatedHost {
    pub id: String,
    pub flavor: String,
    pub zone: String,
    pub lifecycle: HostLifecycle,
    pub placement: HostPlacement,
    #[serde(rename = "workerCount", default)]
    pub worker_count: i64,
}

// =============================================================================
// Client
// =============================================================================

/// Client for the container service
pub struct ContainersClient {
    api: Arc<ApiClient>,
}

impl ContainersClient {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    // --- clusters ---

    pub async fn create_cluster(
        &self,
        request: &ClusterCreateRequest,
    ) -> Result<ClusterCreateResponse> {
        self.api.post("/v1/clusters", request).await
    }

    pub async fn get_cluster(&self, cluster: &str) -> Result<Cluster> {
        self.api.get(&format!("/v1/clusters/{}", cluster)).await
    }

    pub async fn update_cluster(&self, cluster: &str, version: &str, force: bool) -> Result<()> {
        let body = ClusterUpdateRequest {
            action: "update".to_string(),
            version: version.to_string(),
            force,
        };
        self.api
            .put_empty(&format!("/v1/clusters/{}", cluster), &body)
            .await
    }

    pub async fn delete_cluster(&self, cluster: &str) -> Result<()> {
        self.api.delete(&format!("/v1/clusters/{}", cluster)).await
    }

    // --- workers ---

    pub async fn list_workers(&self, cluster: &str) -> Result<Vec<Worker>> {
        self.api
            .get(&format!("/v1/clusters/{}/workers", cluster))
            .await
    }

    pub async fn get_worker(&self, cluster: &str, worker: &str) -> Result<Worker> {
        self.api
            .get(&format!("/v1/clusters/{}/workers/{}", cluster, worker))
            .await
    }

    /// Replace a worker node. The vendor replies 204 No Content.
    pub async fn replace_worker(&self, cluster: &str, worker: &str) -> Result<()> {
        self.api
            .post_empty(
                &format!("/v1/clusters/{}/workers/{}/replace", cluster, worker),
                &serde_json::json!({}),
            )
            .await
    }

    // --- worker pools ---

    pub async fn create_worker_pool(
        &self,
        cluster: &str,
        request: &WorkerPoolCreateRequest,
    ) -> Result<WorkerPoolCreateResponse> {
        self.api
            .post(&format!("/v1/clusters/{}/workerpools", cluster), request)
            .await
    }

    pub async fn get_worker_pool(&self, cluster: &str, pool: &str) -> Result<WorkerPool> {
        self.api
            .get(&format!("/v1/clusters/{}/workerpools/{}", cluster, pool))
            .await
    }

    pub async fn resize_worker_pool(
        &self,
        cluster: &str,
        pool: &str,
        size_per_zone: i64,
    ) -> Result<()> {
        let body = WorkerPoolResizeRequest {
            state: "resizing".to_string(),
            size_per_zone,
        };
        self.api
            .patch_empty(
                &format!("/v1/clusters/{}/workerpools/{}", cluster, pool),
                &body,
            )
            .await
    }

    pub async fn delete_worker_pool(&self, cluster: &str, pool: &str) -> Result<()> {
        self.api
            .delete(&format!("/v1/clusters/{}/workerpools/{}", cluster, pool))
            .await
    }

    // --- ALBs ---

    pub async fn list_albs(&self, cluster: &str) -> Result<Vec<Alb>> {
        self.api
            .get(&format!("/v1/alb/clusters/{}/albs", cluster))
            .await
    }

    pub async fn get_alb(&self, alb_id: &str) -> Result<Alb> {
        self.api.get(&format!("/v1/alb/albs/{}", alb_id)).await
    }

    /// Enable or disable an ALB deployment
    pub async fn configure_alb(&self, request: &AlbConfigRequest) -> Result<()> {
        self.api.post_empty("/v1/alb/albs", request).await
    }

    // --- ingress secrets ---

    pub async fn create_ingress_secret(
        &self,
        request: &IngressSecretCreateRequest,
    ) -> Result<IngressSecret> {
        self.api.post("/v2/ingress/secrets", request).await
    }

    pub async fn get_ingress_secret(
        &self,
        cluster: &str,
        namespace: &str,
        name: &str,
    ) -> Result<IngressSecret> {
        self.api
            .get(&format!(
                "/v2/ingress/secrets/{}/{}/{}",
                cluster, namespace, name
            ))
            .await
    }

    pub async fn delete_ingress_secret(
        &self,
        cluster: &str,
        namespace: &str,
        name: &str,
    ) -> Result<()> {
        self.api
            .delete(&format!(
                "/v2/ingress/secrets/{}/{}/{}",
                cluster, namespace, name
            ))
            .await
    }

    // --- dedicated host pools ---

    pub async fn create_dedicated_host_pool(
        &self,
        request: &DedicatedHostPoolCreateRequest,
    ) -> Result<DedicatedHostPoolCreateResponse> {
        self.api.post("/v2/dedicated_host_pools", request).await
    }

    pub async fn get_dedicated_host_pool(&self, pool: &str) -> Result<DedicatedHostPool> {
        self.api
            .get(&format!("/v2/dedicated_host_pools/{}", pool))
            .await
    }

    pub async fn delete_dedicated_host_pool(&self, pool: &str) -> Result<()> {
        self.api
            .delete(&format!("/v2/dedicated_host_pools/{}", pool))
            .await
    }

    // --- dedicated hosts ---

    pub async fn create_dedicated_host(
        &self,
        pool: &str,
        request: &DedicatedHostCreateRequest,
    ) -> Result<DedicatedHostCreateResponse> {
        self.api
            .post(&format!("/v2/dedicated_host_pools/{}/hosts", pool), request)
            .await
    }

    pub async fn get_dedicated_host(&self, pool: &str, host: &str) -> Result<DedicatedHost> {
        self.api
            .get(&format!("/v2/dedicated_host_pools/{}/hosts/{}", pool, host))
            .await
    }

    /// Toggle whether new workers may be placed onto this host
    pub async fn set_dedicated_host_placement(
        &self,
        pool: &str,
        host: &str,
        enable: bool,
    ) -> Result<()> {
        let action = if enable { "enable" } else { "disable" };
        self.api
            .post_empty(
                &format!(
                    "/v2/dedicated_host_pools/{}/hosts/{}/placement/{}",
                    pool, host, action
                ),
                &serde_json::json!({}),
            )
            .await
    }

    pub async fn delete_dedicated_host(&self, pool: &str, host: &str) -> Result<()> {
        self.api
            .delete(&format!("/v2/dedicated_host_pools/{}/hosts/{}", pool, host))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cluster_create_request_skips_unset_fields() {
        let request = ClusterCreateRequest {
            name: "main".to_string(),
            datacenter: "fra02".to_string(),
            machine_type: "b3c.4x16".to_string(),
            worker_num: 3,
            hardware: "shared".to_string(),
            kube_version: None,
            public_vlan: None,
            private_vlan: None,
            disable_auto_update: Some(true),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["dataCenter"], "fra02");
        assert_eq!(json["workerNum"], 3);
        assert_eq!(json["disableAutoUpdate"], true);
        assert!(json.get("masterVersion").is_none());
        assert!(json.get("publicVlan").is_none());
    }

    #[test]
    fn decodes_cluster() {
        let body = r#"{
            "id": "c-1",
            "name": "main",
            "state": "deploying",
            "crn": "crn:v1:cloud:public:containers:us-south:a/1:cluster:c-1",
            "region": "us-south",
            "masterKubeVersion": "1.31.2",
            "ingressHostname": "main.example.cloud",
            "ingressSecretName": "main",
            "workerCount": 3
        }"#;
        let cluster: Cluster = serde_json::from_str(body).unwrap();
        assert_eq!(cluster.state, "deploying");
        assert_eq!(cluster.master_kube_version, "1.31.2");
        assert!(!cluster.disable_auto_update);
    }

    #[test]
    fn decodes_dedicated_host() {
        let body = r#"{
            "id": "h-7",
            "flavor": "bx2d.host.152x608",
            "zone": "us-south-2",
            "lifecycle": {"actualState": "created", "desiredState": "created"},
            "placement": {"enabled": false, "state": "disabled"},
            "workerCount": 4
        }"#;
        let host: DedicatedHost = serde_json::from_str(body).unwrap();
        assert_eq!(host.lifecycle.actual_state, "created");
        assert!(!host.placement.enabled);
        assert_eq!(host.worker_count, 4);
    }

    #[test]
    fn alb_config_request_shape() {
        let request = AlbConfigRequest {
            alb_id: "public-crbm64u3ed0alb1".to_string(),
            cluster: "c-1".to_string(),
            enable: true,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["albID"], "public-crbm64u3ed0alb1");
        assert_eq!(json["enable"], true);
    }

    #[test]
    fn ingress_secret_type_field_is_renamed() {
        let body = r#"{
            "cluster": "c-1",
            "name": "tls-main",
            "namespace": "ingress",
            "crn": "crn:v1:cloud:public:secrets:us-south:a/1:secret:s-1",
            "status": "created",
            "type": "TLS",
            "domain": "main.example.cloud",
            "expiresOn": "2027-01-01T00:00:00Z"
        }"#;
        let secret: IngressSecret = serde_json::from_str(body).unwrap();
        assert_eq!(secret.secret_type.as_deref(), Some("TLS"));
        assert!(!secret.persistence);
    }
}
