//! Provider configuration

use stratus_core::provider::{ProviderError, ProviderResult};

pub const DEFAULT_ENDPOINT: &str = "https://api.stratus.cloud";
pub const DEFAULT_REGION: &str = "us-south";

/// Configuration for the Stratus provider
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub api_key: String,
    pub endpoint: String,
    pub region: String,
    pub resource_group: Option<String>,
}

impl ProviderConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            region: DEFAULT_REGION.to_string(),
            resource_group: None,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    pub fn with_resource_group(mut self, resource_group: impl Into<String>) -> Self {
        self.resource_group = Some(resource_group.into());
        self
    }

    /// Read configuration from environment variables
    ///
    /// `STRATUS_API_KEY` is required; `STRATUS_ENDPOINT`, `STRATUS_REGION`
    /// and `STRATUS_RESOURCE_GROUP` are optional.
    pub fn from_env() -> ProviderResult<Self> {
        let api_key = std::env::var("STRATUS_API_KEY")
            .map_err(|_| ProviderError::new("missing environment variable STRATUS_API_KEY"))?;

        let mut config = Self::new(api_key);
        if let Ok(endpoint) = std::env::var("STRATUS_ENDPOINT") {
            config.endpoint = endpoint;
        }
        if let Ok(region) = std::env::var("STRATUS_REGION") {
            config.region = region;
        }
        if let Ok(group) = std::env::var("STRATUS_RESOURCE_GROUP") {
            config.resource_group = Some(group);
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides_defaults() {
        let config = ProviderConfig::new("key")
            .with_endpoint("https://api.test.stratus.cloud")
            .with_region("eu-de")
            .with_resource_group("default");

        assert_eq!(config.endpoint, "https://api.test.stratus.cloud");
        assert_eq!(config.region, "eu-de");
        assert_eq!(config.resource_group.as_deref(), Some("default"));
    }

    #[test]
    fn defaults_are_applied() {
        let config = ProviderConfig::new("key");
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.region, DEFAULT_REGION);
        assert!(config.resource_group.is_none());
    }
}
