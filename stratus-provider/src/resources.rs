//! Resource type definitions and schemas
//!
//! One entry per resource or data source the provider exposes, with the
//! attribute schema used to validate desired state before any API call.

use stratus_core::provider::ResourceType;
use stratus_core::schema::{AttributeSchema, AttributeType, ResourceSchema, types};
use stratus_sdk::security_events;

fn string_enum(values: &[&str]) -> AttributeType {
    AttributeType::Enum(values.iter().map(|v| v.to_string()).collect())
}

fn string_map() -> AttributeType {
    AttributeType::Map(Box::new(AttributeType::String))
}

macro_rules! define_resource_type {
    ($name:ident, $type_name:expr, $schema_fn:path) => {
        pub struct $name;
        impl ResourceType for $name {
            fn name(&self) -> &'static str {
                $type_name
            }
            fn schema(&self) -> ResourceSchema {
                $schema_fn()
            }
        }
    };
    ($name:ident, $type_name:expr, $schema_fn:path, data_source) => {
        pub struct $name;
        impl ResourceType for $name {
            fn name(&self) -> &'static str {
                $type_name
            }
            fn schema(&self) -> ResourceSchema {
                $schema_fn()
            }
            fn data_source(&self) -> bool {
                true
            }
        }
    };
}

define_resource_type!(KubernetesClusterType, "kubernetes_cluster", cluster_schema);
define_resource_type!(
    KubernetesWorkerPoolType,
    "kubernetes_worker_pool",
    worker_pool_schema
);
define_resource_type!(KubernetesAlbType, "kubernetes_alb", alb_schema);
define_resource_type!(
    KubernetesIngressSecretType,
    "kubernetes_ingress_secret",
    ingress_secret_schema
);
define_resource_type!(
    KubernetesDedicatedHostPoolType,
    "kubernetes_dedicated_host_pool",
    dedicated_host_pool_schema
);
define_resource_type!(
    KubernetesDedicatedHostType,
    "kubernetes_dedicated_host",
    dedicated_host_schema
);
define_resource_type!(
    FunctionNamespaceType,
    "function_namespace",
    function_namespace_schema
);
define_resource_type!(
    FunctionPackageType,
    "function_package",
    function_package_schema
);
define_resource_type!(FunctionActionType, "function_action", function_action_schema);
define_resource_type!(
    FunctionTriggerType,
    "function_trigger",
    function_trigger_schema
);
define_resource_type!(FunctionRuleType, "function_rule", function_rule_schema);
define_resource_type!(
    SecurityEventsType,
    "security_events",
    security_events_schema,
    data_source
);

/// Returns all resource types supported by this provider
pub fn resource_types() -> Vec<Box<dyn ResourceType>> {
    vec![
        Box::new(KubernetesClusterType),
        Box::new(KubernetesWorkerPoolType),
        Box::new(KubernetesAlbType),
        Box::new(KubernetesIngressSecretType),
        Box::new(KubernetesDedicatedHostPoolType),
        Box::new(KubernetesDedicatedHostType),
        Box::new(FunctionNamespaceType),
        Box::new(FunctionPackageType),
        Box::new(FunctionActionType),
        Box::new(FunctionTriggerType),
        Box::new(FunctionRuleType),
        Box::new(SecurityEventsType),
    ]
}

/// Get the schema for a resource type name
pub fn schema_for(resource_type: &str) -> Option<ResourceSchema> {
    resource_types()
        .into_iter()
        .find(|t| t.name() == resource_type)
        .map(|t| t.schema())
}

// =============================================================================
// Kubernetes schemas
// =============================================================================

pub fn cluster_schema() -> ResourceSchema {
    ResourceSchema::new("kubernetes_cluster")
        .attribute(AttributeSchema::new("name", AttributeType::String).required().force_new())
        .attribute(AttributeSchema::new("datacenter", AttributeType::String).required().force_new())
        .attribute(
            AttributeSchema::new("machine_type", AttributeType::String)
                .required()
                .force_new()
                .with_provider_name("machineType"),
        )
        .attribute(
            AttributeSchema::new("worker_num", types::positive_int())
                .with_default(stratus_core::resource::Value::Int(1))
                .with_provider_name("workerNum"),
        )
        .attribute(
            AttributeSchema::new("hardware", string_enum(&["shared", "dedicated"]))
                .with_default(stratus_core::resource::Value::String("shared".to_string()))
                .force_new(),
        )
        .attribute(AttributeSchema::new("kube_version", AttributeType::String))
        .attribute(
            AttributeSchema::new("public_vlan", AttributeType::String)
                .force_new()
                .with_provider_name("publicVlan"),
        )
        .attribute(
            AttributeSchema::new("private_vlan", AttributeType::String)
                .force_new()
                .with_provider_name("privateVlan"),
        )
        .attribute(AttributeSchema::new("disable_auto_update", AttributeType::Bool).force_new())
        .attribute(AttributeSchema::new("crn", types::crn()).with_description("Computed CRN"))
        .with_description("Managed Kubernetes cluster")
}

pub fn worker_pool_schema() -> ResourceSchema {
    ResourceSchema::new("kubernetes_worker_pool")
        .attribute(AttributeSchema::new("cluster", AttributeType::String).required().force_new())
        .attribute(AttributeSchema::new("name", AttributeType::String).required().force_new())
        .attribute(
            AttributeSchema::new("machine_type", AttributeType::String)
                .required()
                .force_new()
                .with_provider_name("machineType"),
        )
        .attribute(
            AttributeSchema::new("size_per_zone", types::positive_int())
                .required()
                .with_provider_name("sizePerZone"),
        )
        .attribute(AttributeSchema::new("labels", string_map()).force_new())
        .attribute(
            AttributeSchema::new("host_pool_id", AttributeType::String)
                .force_new()
                .with_provider_name("hostPoolID"),
        )
}

pub fn alb_schema() -> ResourceSchema {
    ResourceSchema::new("kubernetes_alb")
        .attribute(AttributeSchema::new("cluster", AttributeType::String).required().force_new())
        .attribute(
            AttributeSchema::new("alb_id", AttributeType::String)
                .required()
                .force_new()
                .with_provider_name("albID"),
        )
        .attribute(
            AttributeSchema::new("enable", AttributeType::Bool)
                .with_default(stratus_core::resource::Value::Bool(true)),
        )
        .with_description("Application load balancer of a managed cluster")
}

pub fn ingress_secret_schema() -> ResourceSchema {
    ResourceSchema::new("kubernetes_ingress_secret")
        .attribute(AttributeSchema::new("cluster", AttributeType::String).required().force_new())
        .attribute(AttributeSchema::new("name", AttributeType::String).required().force_new())
        .attribute(AttributeSchema::new("namespace", AttributeType::String).required().force_new())
        .attribute(AttributeSchema::new("cert_crn", types::crn()).required())
        .attribute(AttributeSchema::new("persistence", AttributeType::Bool))
}

pub fn dedicated_host_pool_schema() -> ResourceSchema {
    ResourceSchema::new("kubernetes_dedicated_host_pool")
        .attribute(AttributeSchema::new("name", AttributeType::String).required().force_new())
        .attribute(
            AttributeSchema::new("flavor_class", AttributeType::String)
                .required()
                .force_new()
                .with_provider_name("flavorClass"),
        )
        .attribute(AttributeSchema::new("metro", AttributeType::String).required().force_new())
}

pub fn dedicated_host_schema() -> ResourceSchema {
    ResourceSchema::new("kubernetes_dedicated_host")
        .attribute(
            AttributeSchema::new("host_pool_id", AttributeType::String)
                .required()
                .force_new(),
        )
        .attribute(AttributeSchema::new("flavor", AttributeType::String).required().force_new())
        .attribute(AttributeSchema::new("zone", AttributeType::String).required().force_new())
        .attribute(
            AttributeSchema::new("placement_enabled", AttributeType::Bool)
                .with_default(stratus_core::resource::Value::Bool(true)),
        )
}

// =============================================================================
// Functions schemas
// =============================================================================

pub fn function_namespace_schema() -> ResourceSchema {
    ResourceSchema::new("function_namespace")
        .attribute(AttributeSchema::new("name", AttributeType::String).required().force_new())
        .attribute(
            AttributeSchema::new("resource_group_id", AttributeType::String)
                .required()
                .force_new(),
        )
        .attribute(AttributeSchema::new("resource_plan_id", AttributeType::String).force_new())
        .attribute(AttributeSchema::new("description", AttributeType::String))
}

pub fn function_package_schema() -> ResourceSchema {
    ResourceSchema::new("function_package")
        .attribute(AttributeSchema::new("namespace", AttributeType::String).required().force_new())
        .attribute(AttributeSchema::new("name", AttributeType::String).required().force_new())
        .attribute(AttributeSchema::new("publish", AttributeType::Bool))
        .attribute(AttributeSchema::new("bind_package_name", AttributeType::String).force_new())
        .attribute(AttributeSchema::new("parameters", string_map()))
        .attribute(AttributeSchema::new("annotations", string_map()))
}

pub fn function_action_schema() -> ResourceSchema {
    ResourceSchema::new("function_action")
        .attribute(AttributeSchema::new("namespace", AttributeType::String).required().force_new())
        .attribute(AttributeSchema::new("name", AttributeType::String).required().force_new())
        .attribute(AttributeSchema::new("exec_kind", AttributeType::String).required())
        .attribute(AttributeSchema::new("code", AttributeType::String))
        .attribute(AttributeSchema::new("image", AttributeType::String))
        .attribute(AttributeSchema::new("main", AttributeType::String))
        .attribute(AttributeSchema::new("binary", AttributeType::Bool))
        .attribute(AttributeSchema::new(
            "components",
            AttributeType::List(Box::new(AttributeType::String)),
        ))
        .attribute(AttributeSchema::new("timeout", types::positive_int()))
        .attribute(AttributeSchema::new("memory", types::positive_int()))
        .attribute(AttributeSchema::new("log_size", types::positive_int()))
        .attribute(AttributeSchema::new("publish", AttributeType::Bool))
        .attribute(AttributeSchema::new("parameters", string_map()))
        .attribute(AttributeSchema::new("annotations", string_map()))
}

pub fn function_trigger_schema() -> ResourceSchema {
    ResourceSchema::new("function_trigger")
        .attribute(AttributeSchema::new("namespace", AttributeType::String).required().force_new())
        .attribute(AttributeSchema::new("name", AttributeType::String).required().force_new())
        .attribute(AttributeSchema::new("publish", AttributeType::Bool))
        .attribute(AttributeSchema::new("parameters", string_map()))
        .attribute(AttributeSchema::new("annotations", string_map()))
}

pub fn function_rule_schema() -> ResourceSchema {
    ResourceSchema::new("function_rule")
        .attribute(AttributeSchema::new("namespace", AttributeType::String).required().force_new())
        .attribute(AttributeSchema::new("name", AttributeType::String).required().force_new())
        .attribute(AttributeSchema::new("trigger", AttributeType::String).required())
        .attribute(AttributeSchema::new("action", AttributeType::String).required())
        .attribute(AttributeSchema::new("status", string_enum(&["active", "inactive"])))
}

// =============================================================================
// Data source schemas
// =============================================================================

pub fn security_events_schema() -> ResourceSchema {
    ResourceSchema::new("security_events")
        .attribute(AttributeSchema::new("zone_id", AttributeType::String).required())
        .attribute(AttributeSchema::new(
            "ip_class",
            string_enum(security_events::IP_CLASSES),
        ))
        .attribute(AttributeSchema::new("method", AttributeType::String))
        .attribute(AttributeSchema::new("scheme", string_enum(security_events::SCHEMES)))
        .attribute(AttributeSchema::new("ip", AttributeType::String))
        .attribute(AttributeSchema::new("host", AttributeType::String))
        .attribute(AttributeSchema::new("proto", string_enum(security_events::PROTOS)))
        .attribute(AttributeSchema::new("uri", AttributeType::String))
        .attribute(AttributeSchema::new("ua", AttributeType::String))
        .attribute(AttributeSchema::new("colo", AttributeType::String))
        .attribute(AttributeSchema::new("ray_id", AttributeType::String))
        .attribute(AttributeSchema::new("kind", string_enum(security_events::KINDS)))
        .attribute(AttributeSchema::new("action", string_enum(security_events::ACTIONS)))
        .attribute(AttributeSchema::new("cursor", AttributeType::String))
        .attribute(AttributeSchema::new("country", AttributeType::String))
        .attribute(AttributeSchema::new("since", AttributeType::String))
        .attribute(AttributeSchema::new("source", string_enum(security_events::SOURCES)))
        .attribute(AttributeSchema::new("limit", types::positive_int()))
        .attribute(AttributeSchema::new("rule_id", AttributeType::String))
        .attribute(AttributeSchema::new("until", AttributeType::String))
        .with_description("Query firewall security events for a zone")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use stratus_core::resource::Value;

    #[test]
    fn all_types_are_registered() {
        let names: Vec<&str> = resource_types().iter().map(|t| t.name()).collect();
        assert_eq!(names.len(), 12);
        assert!(names.contains(&"kubernetes_cluster"));
        assert!(names.contains(&"kubernetes_dedicated_host"));
        assert!(names.contains(&"function_rule"));
        assert!(names.contains(&"security_events"));
    }

    #[test]
    fn security_events_is_a_data_source() {
        let types = resource_types();
        let ds = types.iter().find(|t| t.name() == "security_events").unwrap();
        assert!(ds.data_source());
        let cluster = types
            .iter()
            .find(|t| t.name() == "kubernetes_cluster")
            .unwrap();
        assert!(!cluster.data_source());
    }

    #[test]
    fn cluster_schema_rejects_missing_required() {
        let schema = schema_for("kubernetes_cluster").unwrap();
        let mut attrs = HashMap::new();
        attrs.insert("name".to_string(), Value::String("main".to_string()));
        assert!(schema.validate(&attrs).is_err());

        attrs.insert("datacenter".to_string(), Value::String("fra02".to_string()));
        attrs.insert(
            "machine_type".to_string(),
            Value::String("b3c.4x16".to_string()),
        );
        assert!(schema.validate(&attrs).is_ok());
    }

    #[test]
    fn security_events_schema_validates_enums() {
        let schema = schema_for("security_events").unwrap();
        let mut attrs = HashMap::new();
        attrs.insert("zone_id".to_string(), Value::String("z-1".to_string()));
        attrs.insert("action".to_string(), Value::String("drop".to_string()));
        assert!(schema.validate(&attrs).is_ok());

        attrs.insert("action".to_string(), Value::String("obliterate".to_string()));
        assert!(schema.validate(&attrs).is_err());
    }

    #[test]
    fn unknown_type_has_no_schema() {
        assert!(schema_for("object_storage_bucket").is_none());
    }

    #[test]
    fn create_only_attributes_force_recreation() {
        // Everything the update path does not handle in place must be
        // marked force_new, or a change to it would be silently dropped.
        let cluster = schema_for("kubernetes_cluster").unwrap();
        for name in ["name", "datacenter", "machine_type", "hardware", "disable_auto_update"] {
            assert!(cluster.attributes[name].force_new, "{name}");
        }
        assert!(!cluster.attributes["kube_version"].force_new);
        assert!(!cluster.attributes["worker_num"].force_new);

        let pool = schema_for("kubernetes_worker_pool").unwrap();
        for name in ["cluster", "name", "machine_type", "labels", "host_pool_id"] {
            assert!(pool.attributes[name].force_new, "{name}");
        }
        assert!(!pool.attributes["size_per_zone"].force_new);
    }
}
