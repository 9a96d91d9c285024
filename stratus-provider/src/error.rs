//! Error helpers shared by the CRUD adapters

use stratus_core::provider::ProviderError;
use stratus_sdk::ApiError;

/// Wrap an SDK error with a contextual message, keeping it as the cause
pub(crate) fn api_error(context: &str, err: ApiError) -> ProviderError {
    ProviderError::new(format!("{}: {}", context, err)).with_cause(err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn cause_is_preserved() {
        let err = api_error(
            "failed to get cluster",
            ApiError::NotFound {
                path: "/v1/clusters/c-1".to_string(),
            },
        );
        assert!(err.to_string().starts_with("failed to get cluster"));
        assert!(err.source().is_some());
    }
}
