//! Security events API
//!
//! Query endpoint for zone firewall events. Every filter is optional; the
//! response is cursor-paged.

use std::sync::Arc;

use serde::Deserialize;

use crate::client::ApiClient;
use crate::error::Result;

/// Allowed `ip_class` filter values
pub const IP_CLASSES: &[&str] = &[
    "unknown",
    "clean",
    "badHost",
    "searchEngine",
    "allowlist",
    "greylist",
    "monitoringService",
    "securityScanner",
    "noRecord",
    "scan",
    "backupService",
    "mobilePlatform",
    "tor",
];

/// Allowed `scheme` filter values
pub const SCHEMES: &[&str] = &["unknown", "http", "https"];

/// Allowed `proto` filter values
pub const PROTOS: &[&str] = &["UNK", "HTTP/1.0", "HTTP/1.1", "HTTP/1.2", "HTTP/2", "SPDY/3.1"];

/// Allowed `kind` filter values. Only firewall events exist today.
pub const KINDS: &[&str] = &["firewall"];

/// Allowed `action` filter values
pub const ACTIONS: &[&str] = &[
    "unknown",
    "allow",
    "drop",
    "challenge",
    "jschallenge",
    "simulate",
    "connectionClose",
    "log",
];

/// Allowed `source` filter values
pub const SOURCES: &[&str] = &[
    "unknown",
    "asn",
    "country",
    "ip",
    "ipRange",
    "securityLevel",
    "zoneLockdown",
    "waf",
    "uaBlock",
    "rateLimit",
    "firewallRules",
    "bic",
    "hot",
    "l7ddos",
];

/// Optional filters for the security events query
#[derive(Debug, Default, Clone)]
pub struct SecurityEventsQuery {
    pub ip_class: Option<String>,
    pub method: Option<String>,
    pub scheme: Option<String>,
    pub ip: Option<String>,
    pub host: Option<String>,
    pub proto: Option<String>,
    pub uri: Option<String>,
    pub ua: Option<String>,
    pub colo: Option<String>,
    pub ray_id: Option<String>,
    pub kind: Option<String>,
    pub action: Option<String>,
    pub cursor: Option<String>,
    pub country: Option<String>,
    /// Start of the requested time window, RFC 3339
    pub since: Option<String>,
    pub source: Option<String>,
    pub limit: Option<i64>,
    pub rule_id: Option<String>,
    /// End of the requested time window, RFC 3339
    pub until: Option<String>,
}

impl SecurityEventsQuery {
    /// Marshal the set filters into query parameters
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let strings = [
            ("ip_class", &self.ip_class),
            ("method", &self.method),
            ("scheme", &self.scheme),
            ("ip", &self.ip),
            ("host", &self.host),
            ("proto", &self.proto),
            ("uri", &self.uri),
            ("ua", &self.ua),
            ("colo", &self.colo),
            ("ray_id", &self.ray_id),
            ("kind", &self.kind),
            ("action", &self.action),
            ("cursor", &self.cursor),
            ("country", &self.country),
            ("since", &self.since),
            ("source", &self.source),
        ];

        let mut pairs = Vec::new();
        for (name, value) in strings {
            if let Some(v) = value {
                pairs.push((name.to_string(), v.clone()));
            }
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit".to_string(), limit.to_string()));
        }
        if let Some(rule_id) = &self.rule_id {
            pairs.push(("rule_id".to_string(), rule_id.clone()));
        }
        if let Some(until) = &self.until {
            pairs.push(("until".to_string(), until.clone()));
        }
        pairs
    }
}

/// A firewall rule match attached to an event
#[derive(Debug, Clone, Deserialize)]
pub struct SecurityEventMatch {
    pub rule_id: Option<String>,
    pub source: Option<String>,
    pub action: Option<String>,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

/// One security event
#[derive(Debug, Clone, Deserialize)]
pub struct SecurityEvent {
    pub ray_id: String,
    pub kind: String,
    pub source: String,
    pub action: String,
    pub rule_id: Option<String>,
    pub ip: String,
    pub ip_class: Option<String>,
    pub country: Option<String>,
    pub colo: Option<String>,
    pub host: String,
    pub method: String,
    pub proto: Option<String>,
    pub scheme: Option<String>,
    pub ua: Option<String>,
    pub uri: String,
    pub occurred_at: String,
    #[serde(default)]
    pub matches: Vec<SecurityEventMatch>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResultInfoCursors {
    pub after: Option<String>,
    pub before: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResultInfoScannedRange {
    pub since: Option<String>,
    pub until: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResultInfo {
    pub cursors: Option<ResultInfoCursors>,
    pub scanned_range: Option<ResultInfoScannedRange>,
}

/// Security events query response
#[derive(Debug, Clone, Deserialize)]
pub struct SecurityEvents {
    #[serde(default)]
    pub result: Vec<SecurityEvent>,
    pub result_info: Option<ResultInfo>,
}

/// Client for the security events endpoint
pub struct SecurityEventsClient {
    api: Arc<ApiClient>,
}

impl SecurityEventsClient {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    /// List security events for a zone, newest first
    pub async fn list(&self, zone_id: &str, query: &SecurityEventsQuery) -> Result<SecurityEvents> {
        let path = format!("/v1/zones/{}/security/events", zone_id);
        self.api
            .get_with_query(&path, &query.to_query_pairs())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_query_marshals_to_nothing() {
        assert!(SecurityEventsQuery::default().to_query_pairs().is_empty());
    }

    #[test]
    fn set_filters_marshal_in_order() {
        let query = SecurityEventsQuery {
            action: Some("drop".to_string()),
            source: Some("waf".to_string()),
            limit: Some(25),
            since: Some("2026-08-01T00:00:00Z".to_string()),
            ..Default::default()
        };
        assert_eq!(
            query.to_query_pairs(),
            vec![
                ("action".to_string(), "drop".to_string()),
                ("since".to_string(), "2026-08-01T00:00:00Z".to_string()),
                ("source".to_string(), "waf".to_string()),
                ("limit".to_string(), "25".to_string()),
            ]
        );
    }

    #[test]
    fn full_query_carries_all_filters() {
        let query = SecurityEventsQuery {
            ip_class: Some("clean".to_string()),
            method: Some("GET".to_string()),
            scheme: Some("https".to_string()),
            ip: Some("198.51.100.4".to_string()),
            host: Some("www.example.test".to_string()),
            proto: Some("HTTP/2".to_string()),
            uri: Some("/login".to_string()),
            ua: Some("curl/8.0".to_string()),
            colo: Some("FRA".to_string()),
            ray_id: Some("4c6392799bcd2f5f".to_string()),
            kind: Some("firewall".to_string()),
            action: Some("challenge".to_string()),
            cursor: Some("opaque-cursor".to_string()),
            country: Some("DE".to_string()),
            since: Some("2026-08-01T00:00:00Z".to_string()),
            source: Some("rateLimit".to_string()),
            limit: Some(10),
            rule_id: Some("rule-7".to_string()),
            until: Some("2026-08-02T00:00:00Z".to_string()),
        };
        assert_eq!(query.to_query_pairs().len(), 19);
    }

    #[test]
    fn decodes_event_page() {
        let body = r#"{
            "result": [{
                "ray_id": "4c6392799bcd2f5f",
                "kind": "firewall",
                "source": "waf",
                "action": "drop",
                "rule_id": "981176",
                "ip": "198.51.100.4",
                "ip_class": "noRecord",
                "country": "DE",
                "colo": "FRA",
                "host": "www.example.test",
                "method": "POST",
                "proto": "HTTP/1.1",
                "scheme": "https",
                "ua": "curl/8.0",
                "uri": "/login",
                "occurred_at": "2026-08-01T12:30:00Z",
                "matches": [{"rule_id": "981176", "source": "waf", "action": "drop", "metadata": {"group": "OWASP"}}]
            }],
            "result_info": {
                "cursors": {"after": "a1", "before": "b1"},
                "scanned_range": {"since": "2026-08-01T00:00:00Z", "until": "2026-08-02T00:00:00Z"}
            }
        }"#;
        let page: SecurityEvents = serde_json::from_str(body).unwrap();
        assert_eq!(page.result.len(), 1);
        let event = &page.result[0];
        assert_eq!(event.action, "drop");
        assert_eq!(event.matches[0].rule_id.as_deref(), Some("981176"));
        let cursors = page.result_info.unwrap().cursors.unwrap();
        assert_eq!(cursors.after.as_deref(), Some("a1"));
    }

    #[test]
    fn filter_constants_cover_known_values() {
        assert!(ACTIONS.contains(&"jschallenge"));
        assert!(SOURCES.contains(&"zoneLockdown"));
        assert!(PROTOS.contains(&"SPDY/3.1"));
        assert!(KINDS == ["firewall"]);
    }
}
