//! Ingress secret resource
//!
//! A TLS or opaque secret materialized into the cluster from a CRN. The
//! registration endpoint upserts, so update re-registers with the new CRN.
//! Identified by the composite `cluster/name/namespace` id.

use std::collections::HashMap;

use stratus_core::provider::ProviderResult;
use stratus_core::resource::{Resource, ResourceId, State, Value};
use stratus_sdk::containers::{IngressSecret, IngressSecretCreateRequest};

use crate::StratusProvider;
use crate::attrs::{optional_bool, required_string};
use crate::error::api_error;

pub(crate) async fn create(
    provider: &StratusProvider,
    resource: &Resource,
) -> ProviderResult<State> {
    let request = IngressSecretCreateRequest {
        cluster: required_string(resource, "cluster")?,
        name: required_string(resource, "name")?,
        namespace: required_string(resource, "namespace")?,
        crn: required_string(resource, "cert_crn")?,
        persistence: optional_bool(resource, "persistence"),
    };

    tracing::info!(
        cluster = %request.cluster,
        secret = %request.name,
        namespace = %request.namespace,
        "registering ingress secret"
    );
    let secret = provider
        .containers
        .create_ingress_secret(&request)
        .await
        .map_err(|e| {
            api_error("failed to register ingress secret", e).for_resource(resource.id.clone())
        })?;

    let identifier =
        crate::ids::join_slash(&[&secret.cluster, &secret.name, &secret.namespace]);
    Ok(to_state(resource.id.clone(), &secret).with_identifier(&identifier))
}

pub(crate) async fn read(
    provider: &StratusProvider,
    id: &ResourceId,
    identifier: &str,
) -> ProviderResult<State> {
    let parts = crate::ids::split_slash(identifier, 3).map_err(|e| e.for_resource(id.clone()))?;
    let (cluster, name, namespace) = (parts[0], parts[1], parts[2]);

    let secret = match provider
        .containers
        .get_ingress_secret(cluster, namespace, name)
        .await
    {
        Ok(secret) => secret,
        Err(e) if e.is_not_found() => return Ok(State::not_found(id.clone())),
        Err(e) => {
            return Err(api_error("failed to get ingress secret", e).for_resource(id.clone()));
        }
    };

    // A deleted secret may linger in listings for a short while
    if secret.status == "deleted" {
        return Ok(State::not_found(id.clone()));
    }

    Ok(to_state(id.clone(), &secret).with_identifier(identifier))
}

pub(crate) async fn update(
    provider: &StratusProvider,
    id: &ResourceId,
    identifier: &str,
    to: &Resource,
) -> ProviderResult<State> {
    let parts = crate::ids::split_slash(identifier, 3).map_err(|e| e.for_resource(id.clone()))?;
    let (cluster, name, namespace) = (parts[0], parts[1], parts[2]);

    let request = IngressSecretCreateRequest {
        cluster: cluster.to_string(),
        name: name.to_string(),
        namespace: namespace.to_string(),
        crn: required_string(to, "cert_crn")?,
        persistence: optional_bool(to, "persistence"),
    };

    tracing::info!(cluster, secret = name, namespace, "re-registering ingress secret");
    let secret = provider
        .containers
        .create_ingress_secret(&request)
        .await
        .map_err(|e| {
            api_error("failed to update ingress secret", e).for_resource(id.clone())
        })?;

    Ok(to_state(id.clone(), &secret).with_identifier(identifier))
}

pub(crate) async fn delete(
    provider: &StratusProvider,
    id: &ResourceId,
    identifier: &str,
) -> ProviderResult<()> {
    let parts = crate::ids::split_slash(identifier, 3).map_err(|e| e.for_resource(id.clone()))?;
    let (cluster, name, namespace) = (parts[0], parts[1], parts[2]);

    tracing::info!(cluster, secret = name, namespace, "deleting ingress secret");
    match provider
        .containers
        .delete_ingress_secret(cluster, namespace, name)
        .await
    {
        Ok(()) => Ok(()),
        Err(e) if e.is_not_found() => Ok(()),
        Err(e) => Err(api_error("failed to delete ingress secret", e).for_resource(id.clone())),
    }
}

fn to_state(id: ResourceId, secret: &IngressSecret) -> State {
    let mut attributes = HashMap::new();
    attributes.insert("cluster".to_string(), Value::String(secret.cluster.clone()));
    attributes.insert("name".to_string(), Value::String(secret.name.clone()));
    attributes.insert(
        "namespace".to_string(),
        Value::String(secret.namespace.clone()),
    );
    attributes.insert("cert_crn".to_string(), Value::String(secret.crn.clone()));
    attributes.insert("status".to_string(), Value::String(secret.status.clone()));
    attributes.insert("persistence".to_string(), Value::Bool(secret.persistence));
    if let Some(secret_type) = &secret.secret_type {
        attributes.insert("type".to_string(), Value::String(secret_type.clone()));
    }
    if let Some(domain) = &secret.domain {
        attributes.insert("domain".to_string(), Value::String(domain.clone()));
    }
    if let Some(expires_on) = &secret.expires_on {
        attributes.insert("expires_on".to_string(), Value::String(expires_on.clone()));
    }
    State::existing(id, attributes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_state_mapping() {
        let secret: IngressSecret = serde_json::from_value(serde_json::json!({
            "cluster": "c-1",
            "name": "tls-main",
            "namespace": "ingress",
            "crn": "crn:v1:cloud:public:secrets:us-south:a/1:cert:abc",
            "status": "created",
            "type": "TLS",
            "domain": "main.example.cloud",
            "expiresOn": "2027-01-01T00:00:00Z",
            "persistence": true
        }))
        .unwrap();

        let state = to_state(
            ResourceId::new("kubernetes_ingress_secret", "tls-main"),
            &secret,
        );
        assert!(state.exists);
        assert_eq!(
            state.attributes.get("type"),
            Some(&Value::String("TLS".to_string()))
        );
        assert_eq!(state.attributes.get("persistence"), Some(&Value::Bool(true)));
    }

    #[test]
    fn composite_identifier_round_trip() {
        let identifier = crate::ids::join_slash(&["c-1", "tls-main", "ingress"]);
        let parts = crate::ids::split_slash(&identifier, 3).unwrap();
        assert_eq!(parts, vec!["c-1", "tls-main", "ingress"]);
    }
}
