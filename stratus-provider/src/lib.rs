//! Stratus cloud provider
//!
//! Implements the `Provider` trait for the Stratus cloud: managed
//! Kubernetes (clusters, worker pools, ALBs, ingress secrets, dedicated
//! hosts), serverless functions (namespaces, packages, actions, triggers,
//! rules) and the security events data source. Desired attributes are
//! validated against the resource schemas before any API call; long
//! operations poll the service until the resource settles.

pub mod config;
pub mod resources;

mod attrs;
mod error;
mod functions;
mod ids;
mod kubernetes;
mod network;

use std::sync::Arc;

use stratus_core::provider::{
    BoxFuture, Provider, ProviderError, ProviderResult, ResourceType,
};
use stratus_core::resource::{Resource, ResourceId, State};
use stratus_sdk::ApiClient;
use stratus_sdk::containers::ContainersClient;
use stratus_sdk::functions::FunctionsClient;
use stratus_sdk::security_events::SecurityEventsClient;

pub use config::ProviderConfig;

/// Provider for the Stratus cloud
pub struct StratusProvider {
    pub(crate) containers: ContainersClient,
    pub(crate) functions: FunctionsClient,
    pub(crate) events: SecurityEventsClient,
    config: ProviderConfig,
}

impl StratusProvider {
    pub fn new(config: ProviderConfig) -> Self {
        let mut api = ApiClient::new(&config.endpoint, &config.api_key).with_region(&config.region);
        if let Some(group) = &config.resource_group {
            api = api.with_resource_group(group);
        }
        let api = Arc::new(api);
        Self {
            containers: ContainersClient::new(api.clone()),
            functions: FunctionsClient::new(api.clone()),
            events: SecurityEventsClient::new(api),
            config,
        }
    }

    pub fn from_env() -> ProviderResult<Self> {
        Ok(Self::new(ProviderConfig::from_env()?))
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }
}

fn unknown_type(id: &ResourceId) -> ProviderError {
    ProviderError::new(format!("Unknown resource type: {}", id.resource_type))
        .for_resource(id.clone())
}

/// Validate desired attributes against the type's schema
fn validate(resource: &Resource) -> ProviderResult<()> {
    let Some(schema) = resources::schema_for(&resource.id.resource_type) else {
        return Err(unknown_type(&resource.id));
    };
    schema.validate(&resource.attributes).map_err(|errors| {
        let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        ProviderError::new(messages.join("; ")).for_resource(resource.id.clone())
    })
}

impl Provider for StratusProvider {
    fn name(&self) -> &'static str {
        "stratus"
    }

    fn resource_types(&self) -> Vec<Box<dyn ResourceType>> {
        resources::resource_types()
    }

    fn read(
        &self,
        id: &ResourceId,
        identifier: Option<&str>,
    ) -> BoxFuture<'_, ProviderResult<State>> {
        let id = id.clone();
        let identifier = identifier.map(str::to_string);
        Box::pin(async move {
            // Never created, so nothing to observe
            let Some(identifier) = identifier else {
                return Ok(State::not_found(id));
            };
            match id.resource_type.as_str() {
                "kubernetes_cluster" => kubernetes::cluster::read(self, &id, &identifier).await,
                "kubernetes_worker_pool" => {
                    kubernetes::worker_pool::read(self, &id, &identifier).await
                }
                "kubernetes_alb" => kubernetes::alb::read(self, &id, &identifier).await,
                "kubernetes_ingress_secret" => {
                    kubernetes::ingress_secret::read(self, &id, &identifier).await
                }
                "kubernetes_dedicated_host_pool" => {
                    kubernetes::dedicated_host::pool_read(self, &id, &identifier).await
                }
                "kubernetes_dedicated_host" => {
                    kubernetes::dedicated_host::host_read(self, &id, &identifier).await
                }
                "function_namespace" => functions::namespace::read(self, &id, &identifier).await,
                "function_package" => functions::package::read(self, &id, &identifier).await,
                "function_action" => functions::action::read(self, &id, &identifier).await,
                "function_trigger" => functions::trigger::read(self, &id, &identifier).await,
                "function_rule" => functions::rule::read(self, &id, &identifier).await,
                // Data sources have no persisted object to observe
                "security_events" => Ok(State::not_found(id.clone())),
                _ => Err(unknown_type(&id)),
            }
        })
    }

    fn create(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
        let resource = resource.clone();
        Box::pin(async move {
            validate(&resource)?;
            match resource.id.resource_type.as_str() {
                "kubernetes_cluster" => kubernetes::cluster::create(self, &resource).await,
                "kubernetes_worker_pool" => {
                    kubernetes::worker_pool::create(self, &resource).await
                }
                "kubernetes_alb" => kubernetes::alb::create(self, &resource).await,
                "kubernetes_ingress_secret" => {
                    kubernetes::ingress_secret::create(self, &resource).await
                }
                "kubernetes_dedicated_host_pool" => {
                    kubernetes::dedicated_host::pool_create(self, &resource).await
                }
                "kubernetes_dedicated_host" => {
                    kubernetes::dedicated_host::host_create(self, &resource).await
                }
                "function_namespace" => functions::namespace::create(self, &resource).await,
                "function_package" => functions::package::create(self, &resource).await,
                "function_action" => functions::action::create(self, &resource).await,
                "function_trigger" => functions::trigger::create(self, &resource).await,
                "function_rule" => functions::rule::create(self, &resource).await,
                // Evaluating a data source is expressed as a create
                "security_events" => network::security_events::evaluate(self, &resource).await,
                _ => Err(unknown_type(&resource.id)),
            }
        })
    }

    fn update(
        &self,
        id: &ResourceId,
        identifier: &str,
        from: &State,
        to: &Resource,
    ) -> BoxFuture<'_, ProviderResult<State>> {
        let id = id.clone();
        let identifier = identifier.to_string();
        let from = from.clone();
        let to = to.clone();
        Box::pin(async move {
            validate(&to)?;
            match id.resource_type.as_str() {
                "kubernetes_cluster" => {
                    kubernetes::cluster::update(self, &id, &identifier, &from, &to).await
                }
                "kubernetes_worker_pool" => {
                    kubernetes::worker_pool::update(self, &id, &identifier, &from, &to).await
                }
                "kubernetes_alb" => {
                    kubernetes::alb::update(self, &id, &identifier, &from, &to).await
                }
                "kubernetes_ingress_secret" => {
                    kubernetes::ingress_secret::update(self, &id, &identifier, &to).await
                }
                "kubernetes_dedicated_host_pool" => Err(ProviderError::new(
                    "dedicated host pools cannot change in place, delete and recreate",
                )
                .for_resource(id.clone())),
                "kubernetes_dedicated_host" => {
                    kubernetes::dedicated_host::host_update(self, &id, &identifier, &from, &to)
                        .await
                }
                "function_namespace" => {
                    functions::namespace::update(self, &id, &identifier, &to).await
                }
                "function_package" => {
                    functions::package::update(self, &id, &identifier, &to).await
                }
                "function_action" => functions::action::update(self, &id, &identifier, &to).await,
                "function_trigger" => {
                    functions::trigger::update(self, &id, &identifier, &to).await
                }
                "function_rule" => {
                    functions::rule::update(self, &id, &identifier, &from, &to).await
                }
                "security_events" => {
                    Err(ProviderError::new("data sources cannot be updated")
                        .for_resource(id.clone()))
                }
                _ => Err(unknown_type(&id)),
            }
        })
    }

    fn delete(&self, id: &ResourceId, identifier: &str) -> BoxFuture<'_, ProviderResult<()>> {
        let id = id.clone();
        let identifier = identifier.to_string();
        Box::pin(async move {
            match id.resource_type.as_str() {
                "kubernetes_cluster" => kubernetes::cluster::delete(self, &id, &identifier).await,
                "kubernetes_worker_pool" => {
                    kubernetes::worker_pool::delete(self, &id, &identifier).await
                }
                "kubernetes_alb" => kubernetes::alb::delete(self, &id, &identifier).await,
                "kubernetes_ingress_secret" => {
                    kubernetes::ingress_secret::delete(self, &id, &identifier).await
                }
                "kubernetes_dedicated_host_pool" => {
                    kubernetes::dedicated_host::pool_delete(self, &id, &identifier).await
                }
                "kubernetes_dedicated_host" => {
                    kubernetes::dedicated_host::host_delete(self, &id, &identifier).await
                }
                "function_namespace" => {
                    functions::namespace::delete(self, &id, &identifier).await
                }
                "function_package" => functions::package::delete(self, &id, &identifier).await,
                "function_action" => functions::action::delete(self, &id, &identifier).await,
                "function_trigger" => functions::trigger::delete(self, &id, &identifier).await,
                "function_rule" => functions::rule::delete(self, &id, &identifier).await,
                // Nothing was created, so nothing to remove
                "security_events" => Ok(()),
                _ => Err(unknown_type(&id)),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stratus_core::resource::Value;

    fn provider() -> StratusProvider {
        StratusProvider::new(ProviderConfig::new("test-key"))
    }

    #[test]
    fn provider_exposes_all_resource_types() {
        let types = provider().resource_types();
        assert_eq!(types.len(), 12);
        assert_eq!(Provider::name(&provider()), "stratus");
    }

    #[tokio::test]
    async fn unknown_type_is_rejected() {
        let resource = Resource::new("object_storage_bucket", "media");
        let err = provider().create(&resource).await.unwrap_err();
        assert!(err.to_string().contains("Unknown resource type"));
    }

    #[tokio::test]
    async fn create_validates_before_any_call() {
        // Missing required attributes must fail locally
        let resource = Resource::new("kubernetes_cluster", "main")
            .with_attribute("name", Value::String("main".to_string()));
        let err = provider().create(&resource).await.unwrap_err();
        assert!(err.to_string().contains("kubernetes_cluster.main"));
    }

    #[tokio::test]
    async fn read_without_identifier_is_not_found() {
        let id = ResourceId::new("kubernetes_cluster", "main");
        let state = provider().read(&id, None).await.unwrap();
        assert!(!state.exists);
    }

    #[tokio::test]
    async fn data_source_read_has_nothing_to_observe() {
        let id = ResourceId::new("security_events", "recent");
        let state = provider().read(&id, Some("z-1")).await.unwrap();
        assert!(!state.exists);
    }

    #[tokio::test]
    async fn data_source_update_is_rejected() {
        let id = ResourceId::new("security_events", "recent");
        let from = State::not_found(id.clone());
        let to = Resource::new("security_events", "recent")
            .with_attribute("zone_id", Value::String("z-1".to_string()))
            .with_read_only(true);
        let err = provider().update(&id, "z-1", &from, &to).await.unwrap_err();
        assert!(err.to_string().contains("cannot be updated"));
    }

    #[tokio::test]
    async fn data_source_delete_is_a_no_op() {
        let id = ResourceId::new("security_events", "recent");
        provider().delete(&id, "z-1").await.unwrap();
    }
}
