//! Provider - Trait abstracting resource operations
//!
//! A Provider defines operations for a specific infrastructure vendor.
//! It is responsible for converting desired resources into actual API
//! calls and observed state back into attribute maps.

use std::future::Future;
use std::pin::Pin;

use crate::resource::{Resource, ResourceId, State};
use crate::schema::ResourceSchema;

/// Error type for Provider operations
#[derive(Debug)]
pub struct ProviderError {
    pub message: String,
    pub resource_id: Option<ResourceId>,
    pub cause: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(ref id) = self.resource_id {
            write!(f, "[{}.{}] {}", id.resource_type, id.name, self.message)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

impl std::error::Error for ProviderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_ref()
            .map(|e| e.as_ref() as &dyn std::error::Error)
    }
}

impl ProviderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            resource_id: None,
            cause: None,
        }
    }

    pub fn for_resource(mut self, id: ResourceId) -> Self {
        self.resource_id = Some(id);
        self
    }

    pub fn with_cause(mut self, cause: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;

/// Return type for async operations
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Definition of resource types that a Provider can handle
pub trait ResourceType: Send + Sync {
    /// Resource type name (e.g., "kubernetes_cluster")
    fn name(&self) -> &'static str;

    /// Attribute schema for this resource type
    fn schema(&self) -> ResourceSchema {
        ResourceSchema::default()
    }

    /// Whether this type is a data source (read-only)
    fn data_source(&self) -> bool {
        false
    }
}

/// Main Provider trait
///
/// Each infrastructure vendor implements this trait. All operations are
/// async and involve side effects.
pub trait Provider: Send + Sync {
    /// Name of this Provider (e.g., "stratus")
    fn name(&self) -> &'static str;

    /// List of resource types this Provider can handle
    fn resource_types(&self) -> Vec<Box<dyn ResourceType>>;

    /// Get the current state of a resource
    ///
    /// The identifier is the vendor-side id recorded at create time.
    /// Returns `State::not_found()` if the resource does not exist.
    fn read(
        &self,
        id: &ResourceId,
        identifier: Option<&str>,
    ) -> BoxFuture<'_, ProviderResult<State>>;

    /// Create a resource
    ///
    /// Returns State with identifier set to the vendor id
    fn create(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>>;

    /// Update a resource in place
    fn update(
        &self,
        id: &ResourceId,
        identifier: &str,
        from: &State,
        to: &Resource,
    ) -> BoxFuture<'_, ProviderResult<State>>;

    /// Delete a resource
    fn delete(&self, id: &ResourceId, identifier: &str) -> BoxFuture<'_, ProviderResult<()>>;

    /// Check whether a resource still exists
    ///
    /// Absence (a not-found read) means gone, never an error.
    fn exists(&self, id: &ResourceId, identifier: &str) -> BoxFuture<'_, ProviderResult<bool>> {
        let read = self.read(id, Some(identifier));
        Box::pin(async move { Ok(read.await?.exists) })
    }
}

/// Provider implementation for Box<dyn Provider>
/// This enables dynamic dispatch for Providers
impl Provider for Box<dyn Provider> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn resource_types(&self) -> Vec<Box<dyn ResourceType>> {
        (**self).resource_types()
    }

    fn read(
        &self,
        id: &ResourceId,
        identifier: Option<&str>,
    ) -> BoxFuture<'_, ProviderResult<State>> {
        (**self).read(id, identifier)
    }

    fn create(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
        (**self).create(resource)
    }

    fn update(
        &self,
        id: &ResourceId,
        identifier: &str,
        from: &State,
        to: &Resource,
    ) -> BoxFuture<'_, ProviderResult<State>> {
        (**self).update(id, identifier, from, to)
    }

    fn delete(&self, id: &ResourceId, identifier: &str) -> BoxFuture<'_, ProviderResult<()>> {
        (**self).delete(id, identifier)
    }

    fn exists(&self, id: &ResourceId, identifier: &str) -> BoxFuture<'_, ProviderResult<bool>> {
        (**self).exists(id, identifier)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::resource::Value;

    // Provider over a single preprovisioned record, enough to exercise
    // the trait surface and the default exists implementation.
    struct FixtureProvider {
        vendor_id: &'static str,
    }

    impl Provider for FixtureProvider {
        fn name(&self) -> &'static str {
            "fixture"
        }

        fn resource_types(&self) -> Vec<Box<dyn ResourceType>> {
            vec![]
        }

        fn read(
            &self,
            id: &ResourceId,
            identifier: Option<&str>,
        ) -> BoxFuture<'_, ProviderResult<State>> {
            let id = id.clone();
            let known = identifier == Some(self.vendor_id);
            let vendor_id = self.vendor_id;
            Box::pin(async move {
                if !known {
                    return Ok(State::not_found(id));
                }
                let mut attributes = HashMap::new();
                attributes.insert("state".to_string(), Value::String("normal".to_string()));
                Ok(State::existing(id, attributes).with_identifier(vendor_id))
            })
        }

        fn create(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
            let id = resource.id.clone();
            let attributes = resource.attributes.clone();
            let vendor_id = self.vendor_id;
            Box::pin(async move { Ok(State::existing(id, attributes).with_identifier(vendor_id)) })
        }

        fn update(
            &self,
            id: &ResourceId,
            _identifier: &str,
            _from: &State,
            to: &Resource,
        ) -> BoxFuture<'_, ProviderResult<State>> {
            let id = id.clone();
            let attributes = to.attributes.clone();
            Box::pin(async move { Ok(State::existing(id, attributes)) })
        }

        fn delete(&self, _id: &ResourceId, _identifier: &str) -> BoxFuture<'_, ProviderResult<()>> {
            Box::pin(async { Ok(()) })
        }
    }

    fn fixture() -> FixtureProvider {
        FixtureProvider { vendor_id: "c-7f3a" }
    }

    #[tokio::test]
    async fn create_records_the_vendor_identifier() {
        let resource = Resource::new("kubernetes_cluster", "main");
        let state = fixture().create(&resource).await.unwrap();
        assert!(state.exists);
        assert_eq!(state.identifier.as_deref(), Some("c-7f3a"));
    }

    #[tokio::test]
    async fn read_observes_state_only_for_known_identifiers() {
        let provider = fixture();
        let id = ResourceId::new("kubernetes_cluster", "main");

        let state = provider.read(&id, Some("c-7f3a")).await.unwrap();
        assert_eq!(
            state.attributes.get("state"),
            Some(&Value::String("normal".to_string()))
        );

        // No identifier yet, or a stale one: absence, never an error
        assert!(!provider.read(&id, None).await.unwrap().exists);
        assert!(!provider.read(&id, Some("c-gone")).await.unwrap().exists);
    }

    #[tokio::test]
    async fn exists_defaults_to_the_read_path() {
        let provider = fixture();
        let id = ResourceId::new("kubernetes_cluster", "main");
        assert!(provider.exists(&id, "c-7f3a").await.unwrap());
        assert!(!provider.exists(&id, "c-gone").await.unwrap());
    }

    #[test]
    fn resource_id_prefixes_the_error_display() {
        let err = ProviderError::new("quota exceeded")
            .for_resource(ResourceId::new("kubernetes_cluster", "main"));
        assert_eq!(err.to_string(), "[kubernetes_cluster.main] quota exceeded");
        assert_eq!(ProviderError::new("quota exceeded").to_string(), "quota exceeded");
    }
}
