//! SDK error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{method} {path} returned {status}: {message}")]
    Api {
        status: u16,
        method: String,
        path: String,
        message: String,
    },

    #[error("resource not found: {path}")]
    NotFound { path: String },

    #[error("failed to decode response from {path}: {message}")]
    Decode { path: String, message: String },

    #[error("missing environment variable {0}")]
    MissingEnvVar(String),
}

impl ApiError {
    /// HTTP 404: the resource is gone. Destroy checks treat this as
    /// success, exists checks as absence.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_is_detectable() {
        let err = ApiError::NotFound {
            path: "/v1/clusters/gone".to_string(),
        };
        assert!(err.is_not_found());

        let err = ApiError::Api {
            status: 500,
            method: "GET".to_string(),
            path: "/v1/clusters".to_string(),
            message: "internal error".to_string(),
        };
        assert!(!err.is_not_found());
    }
}
