//! Security events data source
//!
//! Read-only: one evaluation runs one query against the zone's firewall
//! event log and exposes the page of events plus the paging cursors.

use std::collections::HashMap;

use stratus_core::provider::ProviderResult;
use stratus_core::resource::{Resource, State, Value};
use stratus_sdk::security_events::{SecurityEvent, SecurityEventsQuery};

use crate::StratusProvider;
use crate::attrs::{optional_int, optional_string, required_string};
use crate::error::api_error;

pub(crate) async fn evaluate(
    provider: &StratusProvider,
    resource: &Resource,
) -> ProviderResult<State> {
    let zone_id = required_string(resource, "zone_id")?;
    let query = query_from_resource(resource);

    tracing::debug!(%zone_id, "querying security events");
    let page = provider
        .events
        .list(&zone_id, &query)
        .await
        .map_err(|e| {
            api_error("failed to query security events", e).for_resource(resource.id.clone())
        })?;

    let mut attributes: HashMap<String, Value> = resource.attributes.clone();
    attributes.insert(
        "events".to_string(),
        Value::List(page.result.iter().map(event_attr).collect()),
    );
    if let Some(cursors) = page.result_info.as_ref().and_then(|i| i.cursors.as_ref()) {
        if let Some(after) = &cursors.after {
            attributes.insert("cursor_after".to_string(), Value::String(after.clone()));
        }
        if let Some(before) = &cursors.before {
            attributes.insert("cursor_before".to_string(), Value::String(before.clone()));
        }
    }

    Ok(State::existing(resource.id.clone(), attributes).with_identifier(&zone_id))
}

fn query_from_resource(resource: &Resource) -> SecurityEventsQuery {
    SecurityEventsQuery {
        ip_class: optional_string(resource, "ip_class"),
        method: optional_string(resource, "method"),
        scheme: optional_string(resource, "scheme"),
        ip: optional_string(resource, "ip"),
        host: optional_string(resource, "host"),
        proto: optional_string(resource, "proto"),
        uri: optional_string(resource, "uri"),
        ua: optional_string(resource, "ua"),
        colo: optional_string(resource, "colo"),
        ray_id: optional_string(resource, "ray_id"),
        kind: optional_string(resource, "kind"),
        action: optional_string(resource, "action"),
        cursor: optional_string(resource, "cursor"),
        country: optional_string(resource, "country"),
        since: optional_string(resource, "since"),
        source: optional_string(resource, "source"),
        limit: optional_int(resource, "limit"),
        rule_id: optional_string(resource, "rule_id"),
        until: optional_string(resource, "until"),
    }
}

fn event_attr(event: &SecurityEvent) -> Value {
    let mut map = HashMap::new();
    map.insert("ray_id".to_string(), Value::String(event.ray_id.clone()));
    map.insert("kind".to_string(), Value::String(event.kind.clone()));
    map.insert("source".to_string(), Value::String(event.source.clone()));
    map.insert("action".to_string(), Value::String(event.action.clone()));
    map.insert("ip".to_string(), Value::String(event.ip.clone()));
    map.insert("host".to_string(), Value::String(event.host.clone()));
    map.insert("method".to_string(), Value::String(event.method.clone()));
    map.insert("uri".to_string(), Value::String(event.uri.clone()));
    map.insert(
        "occurred_at".to_string(),
        Value::String(event.occurred_at.clone()),
    );
    let optionals = [
        ("rule_id", &event.rule_id),
        ("ip_class", &event.ip_class),
        ("country", &event.country),
        ("colo", &event.colo),
        ("proto", &event.proto),
        ("scheme", &event.scheme),
        ("ua", &event.ua),
    ];
    for (name, value) in optionals {
        if let Some(v) = value {
            map.insert(name.to_string(), Value::String(v.clone()));
        }
    }
    Value::Map(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_picks_up_set_filters_only() {
        let resource = Resource::new("security_events", "recent")
            .with_attribute("zone_id", Value::String("z-1".to_string()))
            .with_attribute("action", Value::String("drop".to_string()))
            .with_attribute("limit", Value::Int(25));

        let query = query_from_resource(&resource);
        assert_eq!(query.action.as_deref(), Some("drop"));
        assert_eq!(query.limit, Some(25));
        assert!(query.host.is_none());
        assert!(query.cursor.is_none());
    }

    #[test]
    fn event_attr_keeps_optional_fields_when_present() {
        let event: SecurityEvent = serde_json::from_value(serde_json::json!({
            "ray_id": "4c6392799bcd2f5f",
            "kind": "firewall",
            "source": "waf",
            "action": "drop",
            "rule_id": "981176",
            "ip": "198.51.100.4",
            "ip_class": "noRecord",
            "country": "DE",
            "colo": null,
            "host": "www.example.test",
            "method": "POST",
            "proto": "HTTP/1.1",
            "scheme": null,
            "ua": "curl/8.0",
            "uri": "/login",
            "occurred_at": "2026-08-01T12:30:00Z"
        }))
        .unwrap();

        let Value::Map(map) = event_attr(&event) else {
            panic!("expected a map");
        };
        assert_eq!(
            map.get("rule_id"),
            Some(&Value::String("981176".to_string()))
        );
        assert!(!map.contains_key("colo"));
        assert!(!map.contains_key("scheme"));
    }
}
