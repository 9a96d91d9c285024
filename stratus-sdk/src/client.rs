//! Shared REST transport
//!
//! Bearer-token authenticated JSON client. Service clients build paths and
//! typed bodies; this layer owns headers, status handling and decoding.
//! HTTP 404 is mapped to `ApiError::NotFound` so callers can treat absence
//! specially.

use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{ApiError, Result};

/// Region scope header, mirrors the vendor's cluster target header
const HEADER_REGION: &str = "X-Region";
/// Resource group scope header
const HEADER_RESOURCE_GROUP: &str = "X-Auth-Resource-Group";

/// Shared API client
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    region: Option<String>,
    resource_group: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            region: None,
            resource_group: None,
        }
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_resource_group(mut self, resource_group: impl Into<String>) -> Self {
        self.resource_group = Some(resource_group.into());
        self
    }

    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(String, String)],
        body: Option<serde_json::Value>,
    ) -> Result<Option<serde_json::Value>> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(%method, %path, "api request");

        let mut request = self
            .http
            .request(method.clone(), &url)
            .bearer_auth(&self.api_key);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(region) = &self.region {
            request = request.header(HEADER_REGION, region);
        }
        if let Some(group) = &self.resource_group {
            request = request.header(HEADER_RESOURCE_GROUP, group);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound {
                path: path.to_string(),
            });
        }
        if !status.is_success() {
            let message = response
                .text()
                .await
                .ok()
                .and_then(|text| extract_error_message(&text))
                .unwrap_or_else(|| status.to_string());
            return Err(ApiError::Api {
                status: status.as_u16(),
                method: method.to_string(),
                path: path.to_string(),
                message,
            });
        }

        // 204 and other empty replies carry no body worth decoding
        let text = response.text().await?;
        if text.is_empty() {
            return Ok(None);
        }
        let value = serde_json::from_str(&text).map_err(|e| ApiError::Decode {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        Ok(Some(value))
    }

    fn decode<T: DeserializeOwned>(path: &str, value: Option<serde_json::Value>) -> Result<T> {
        let value = value.ok_or_else(|| ApiError::Decode {
            path: path.to_string(),
            message: "expected a response body".to_string(),
        })?;
        serde_json::from_value(value).map_err(|e| ApiError::Decode {
            path: path.to_string(),
            message: e.to_string(),
        })
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let value = self.send(Method::GET, path, &[], None).await?;
        Self::decode(path, value)
    }

    pub async fn get_with_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> Result<T> {
        let value = self.send(Method::GET, path, query, None).await?;
        Self::decode(path, value)
    }

    pub async fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let body = serde_json::to_value(body).map_err(|e| ApiError::Decode {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        let value = self.send(Method::POST, path, &[], Some(body)).await?;
        Self::decode(path, value)
    }

    /// POST where the vendor replies 204 No Content (or a body we discard)
    pub async fn post_empty<B: Serialize>(&self, path: &str, body: &B) -> Result<()> {
        let body = serde_json::to_value(body).map_err(|e| ApiError::Decode {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        self.send(Method::POST, path, &[], Some(body)).await?;
        Ok(())
    }

    pub async fn put<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(String, String)],
        body: &B,
    ) -> Result<T> {
        let body = serde_json::to_value(body).map_err(|e| ApiError::Decode {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        let value = self.send(Method::PUT, path, query, Some(body)).await?;
        Self::decode(path, value)
    }

    /// PUT where the vendor replies with no useful body
    pub async fn put_empty<B: Serialize>(&self, path: &str, body: &B) -> Result<()> {
        let body = serde_json::to_value(body).map_err(|e| ApiError::Decode {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        self.send(Method::PUT, path, &[], Some(body)).await?;
        Ok(())
    }

    pub async fn patch_empty<B: Serialize>(&self, path: &str, body: &B) -> Result<()> {
        let body = serde_json::to_value(body).map_err(|e| ApiError::Decode {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        self.send(Method::PATCH, path, &[], Some(body)).await?;
        Ok(())
    }

    pub async fn delete(&self, path: &str) -> Result<()> {
        self.send(Method::DELETE, path, &[], None).await?;
        Ok(())
    }

    pub async fn delete_with_query(&self, path: &str, query: &[(String, String)]) -> Result<()> {
        self.send(Method::DELETE, path, query, None).await?;
        Ok(())
    }
}

/// Pull a human-readable message out of a vendor error body
fn extract_error_message(text: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(text).ok()?;
    for key in ["description", "message", "error"] {
        if let Some(msg) = value.get(key).and_then(|v| v.as_str()) {
            return Some(msg.to_string());
        }
    }
    // Cursor-paged services wrap errors in an array
    if let Some(first) = value
        .get("errors")
        .and_then(|v| v.as_array())
        .and_then(|a| a.first())
        && let Some(msg) = first.get("message").and_then(|v| v.as_str())
    {
        return Some(msg.to_string());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = ApiClient::new("https://api.example.test/", "key");
        assert_eq!(client.base_url, "https://api.example.test");
    }

    #[test]
    fn extracts_description_field() {
        let msg = extract_error_message(r#"{"description":"cluster not ready"}"#);
        assert_eq!(msg.as_deref(), Some("cluster not ready"));
    }

    #[test]
    fn extracts_errors_array() {
        let msg = extract_error_message(r#"{"errors":[{"message":"bad zone"}],"success":false}"#);
        assert_eq!(msg.as_deref(), Some("bad zone"));
    }

    #[test]
    fn non_json_body_yields_none() {
        assert_eq!(extract_error_message("<html>teapot</html>"), None);
    }
}
