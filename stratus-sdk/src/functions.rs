//! Serverless functions API
//!
//! Namespace CRUD plus the four entity kinds (packages, actions, triggers,
//! rules). Entity writes are upserts: an insert with `overwrite=true`
//! replaces the existing entity, which is how updates are expressed.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::client::ApiClient;
use crate::error::Result;

// =============================================================================
// Namespaces
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct NamespaceCreateRequest {
    pub name: String,
    pub resource_group_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_plan_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NamespaceUpdateRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Namespace {
    pub id: String,
    pub name: String,
    pub resource_group_id: String,
    pub location: Option<String>,
    pub description: Option<String>,
    pub crn: Option<String>,
}

// =============================================================================
// Entities
// =============================================================================

/// Parameter or annotation entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyValue {
    pub key: String,
    pub value: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exec {
    /// Runtime kind, e.g. "nodejs:20", "blackbox", "sequence"
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub main: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub binary: Option<bool>,
    /// Component actions for kind "sequence"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub components: Option<Vec<String>>,
}

/// Execution limits; unset fields keep the vendor defaults
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Limits {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory: Option<i64>,
    #[serde(rename = "logs", skip_serializing_if = "Option::is_none")]
    pub log_size: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Action {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    pub exec: Exec,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<KeyValue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<KeyValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limits: Option<Limits>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publish: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// Reference to another package for package bindings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Binding {
    pub namespace: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Package {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<KeyValue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<KeyValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub binding: Option<Binding>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publish: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trigger {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<KeyValue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<KeyValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publish: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    pub trigger: String,
    pub action: String,
    /// "active" or "inactive"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publish: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

// =============================================================================
// Client
// =============================================================================

/// Client for the functions service
pub struct FunctionsClient {
    api: Arc<ApiClient>,
}

fn overwrite_query(overwrite: bool) -> Vec<(String, String)> {
    if overwrite {
        vec![("overwrite".to_string(), "true".to_string())]
    } else {
        Vec::new()
    }
}

impl FunctionsClient {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    // --- namespaces ---

    pub async fn create_namespace(&self, request: &NamespaceCreateRequest) -> Result<Namespace> {
        self.api.post("/v2/functions/namespaces", request).await
    }

    pub async fn get_namespace(&self, id: &str) -> Result<Namespace> {
        self.api
            .get(&format!("/v2/functions/namespaces/{}", id))
            .await
    }

    pub async fn update_namespace(
        &self,
        id: &str,
        request: &NamespaceUpdateRequest,
    ) -> Result<Namespace> {
        self.api
            .put(&format!("/v2/functions/namespaces/{}", id), &[], request)
            .await
    }

    pub async fn delete_namespace(&self, id: &str) -> Result<()> {
        self.api
            .delete(&format!("/v2/functions/namespaces/{}", id))
            .await
    }

    // --- actions ---

    pub async fn get_action(&self, namespace: &str, name: &str) -> Result<Action> {
        self.api
            .get(&format!("/api/v1/namespaces/{}/actions/{}", namespace, name))
            .await
    }

    pub async fn insert_action(
        &self,
        namespace: &str,
        action: &Action,
        overwrite: bool,
    ) -> Result<Action> {
        self.api
            .put(
                &format!("/api/v1/namespaces/{}/actions/{}", namespace, action.name),
                &overwrite_query(overwrite),
                action,
            )
            .await
    }

    pub async fn delete_action(&self, namespace: &str, name: &str) -> Result<()> {
        self.api
            .delete(&format!("/api/v1/namespaces/{}/actions/{}", namespace, name))
            .await
    }

    // --- packages ---

    pub async fn get_package(&self, namespace: &str, name: &str) -> Result<Package> {
        self.api
            .get(&format!(
                "/api/v1/namespaces/{}/packages/{}",
                namespace, name
            ))
            .await
    }

    pub async fn insert_package(
        &self,
        namespace: &str,
        package: &Package,
        overwrite: bool,
    ) -> Result<Package> {
        self.api
            .put(
                &format!(
                    "/api/v1/namespaces/{}/packages/{}",
                    namespace, package.name
                ),
                &overwrite_query(overwrite),
                package,
            )
            .await
    }

    pub async fn delete_package(&self, namespace: &str, name: &str) -> Result<()> {
        self.api
            .delete(&format!(
                "/api/v1/namespaces/{}/packages/{}",
                namespace, name
            ))
            .await
    }

    // --- triggers ---

    pub async fn get_trigger(&self, namespace: &str, name: &str) -> Result<Trigger> {
        self.api
            .get(&format!(
                "/api/v1/namespaces/{}/triggers/{}",
                namespace, name
            ))
            .await
    }

    pub async fn insert_trigger(
        &self,
        namespace: &str,
        trigger: &Trigger,
        overwrite: bool,
    ) -> Result<Trigger> {
        self.api
            .put(
                &format!(
                    "/api/v1/namespaces/{}/triggers/{}",
                    namespace, trigger.name
                ),
                &overwrite_query(overwrite),
                trigger,
            )
            .await
    }

    pub async fn delete_trigger(&self, namespace: &str, name: &str) -> Result<()> {
        self.api
            .delete(&format!(
                "/api/v1/namespaces/{}/triggers/{}",
                namespace, name
            ))
            .await
    }

    // --- rules ---

    pub async fn get_rule(&self, namespace: &str, name: &str) -> Result<Rule> {
        self.api
            .get(&format!("/api/v1/namespaces/{}/rules/{}", namespace, name))
            .await
    }

    pub async fn insert_rule(&self, namespace: &str, rule: &Rule, overwrite: bool) -> Result<Rule> {
        self.api
            .put(
                &format!("/api/v1/namespaces/{}/rules/{}", namespace, rule.name),
                &overwrite_query(overwrite),
                rule,
            )
            .await
    }

    /// Set a rule active or inactive without touching its bindings
    pub async fn set_rule_state(&self, namespace: &str, name: &str, active: bool) -> Result<()> {
        let status = if active { "active" } else { "inactive" };
        self.api
            .post_empty(
                &format!("/api/v1/namespaces/{}/rules/{}", namespace, name),
                &serde_json::json!({ "status": status }),
            )
            .await
    }

    pub async fn delete_rule(&self, namespace: &str, name: &str) -> Result<()> {
        self.api
            .delete(&format!("/api/v1/namespaces/{}/rules/{}", namespace, name))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overwrite_query_is_conditional() {
        assert!(overwrite_query(false).is_empty());
        assert_eq!(
            overwrite_query(true),
            vec![("overwrite".to_string(), "true".to_string())]
        );
    }

    #[test]
    fn action_round_trips_through_json() {
        let action = Action {
            name: "hello".to_string(),
            namespace: None,
            exec: Exec {
                kind: "nodejs:20".to_string(),
                code: Some("function main() { return {}; }".to_string()),
                image: None,
                main: None,
                binary: Some(false),
                components: None,
            },
            annotations: vec![KeyValue {
                key: "web-export".to_string(),
                value: serde_json::json!(true),
            }],
            parameters: vec![],
            limits: Some(Limits {
                timeout: Some(60000),
                memory: Some(256),
                log_size: Some(10),
            }),
            publish: Some(false),
            version: None,
        };
        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json["exec"]["kind"], "nodejs:20");
        assert_eq!(json["limits"]["logs"], 10);
        assert!(json.get("parameters").is_none());

        let back: Action = serde_json::from_value(json).unwrap();
        assert_eq!(back.annotations[0].key, "web-export");
        assert_eq!(back.limits.unwrap().memory, Some(256));
    }

    #[test]
    fn rule_carries_trigger_and_action() {
        let body = r#"{
            "name": "on-upload",
            "namespace": "ns-1",
            "trigger": "upload-finished",
            "action": "hello",
            "status": "active",
            "version": "0.0.2"
        }"#;
        let rule: Rule = serde_json::from_str(body).unwrap();
        assert_eq!(rule.trigger, "upload-finished");
        assert_eq!(rule.status.as_deref(), Some("active"));
    }

    #[test]
    fn sequence_exec_keeps_components() {
        let exec = Exec {
            kind: "sequence".to_string(),
            code: None,
            image: None,
            main: None,
            binary: None,
            components: Some(vec![
                "/ns-1/split".to_string(),
                "/ns-1/join".to_string(),
            ]),
        };
        let json = serde_json::to_value(&exec).unwrap();
        assert_eq!(json["components"][1], "/ns-1/join");
        assert!(json.get("code").is_none());
    }
}
