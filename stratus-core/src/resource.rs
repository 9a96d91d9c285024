//! Resource - Representing resources and their state

use std::collections::HashMap;

/// Unique identifier for a resource
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceId {
    /// Resource type (e.g., "kubernetes_cluster", "function_action")
    pub resource_type: String,
    /// Resource name (identifier chosen in the configuration)
    pub name: String,
}

impl ResourceId {
    pub fn new(resource_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            name: name.into(),
        }
    }
}

/// Attribute value of a resource
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Int(i64),
    Bool(bool),
    List(Vec<Value>),
    Map(HashMap<String, Value>),
}

impl Value {
    pub fn type_name(&self) -> String {
        match self {
            Value::String(_) => "String".to_string(),
            Value::Int(_) => "Int".to_string(),
            Value::Bool(_) => "Bool".to_string(),
            Value::List(_) => "List".to_string(),
            Value::Map(_) => "Map".to_string(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

/// Desired state declared in the configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    pub id: ResourceId,
    pub attributes: HashMap<String, Value>,
    /// If true, this is a data source (read-only) that won't be modified
    pub read_only: bool,
}

impl Resource {
    pub fn new(resource_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: ResourceId::new(resource_type, name),
            attributes: HashMap::new(),
            read_only: false,
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    /// Returns true if this resource is a data source (read-only)
    pub fn is_data_source(&self) -> bool {
        self.read_only
    }

    /// Convenience accessor for a string attribute
    pub fn string_attr(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(|v| v.as_str())
    }

    /// Convenience accessor for an integer attribute
    pub fn int_attr(&self, key: &str) -> Option<i64> {
        self.attributes.get(key).and_then(|v| v.as_int())
    }

    /// Convenience accessor for a boolean attribute
    pub fn bool_attr(&self, key: &str) -> Option<bool> {
        self.attributes.get(key).and_then(|v| v.as_bool())
    }
}

/// Current state fetched from actual infrastructure
#[derive(Debug, Clone, PartialEq)]
pub struct State {
    pub id: ResourceId,
    /// Vendor-side identifier (e.g., a cluster id or a composite
    /// `cluster/secret/namespace` id)
    pub identifier: Option<String>,
    pub attributes: HashMap<String, Value>,
    /// Whether this state exists
    pub exists: bool,
}

impl State {
    pub fn not_found(id: ResourceId) -> Self {
        Self {
            id,
            identifier: None,
            attributes: HashMap::new(),
            exists: false,
        }
    }

    pub fn existing(id: ResourceId, attributes: HashMap<String, Value>) -> Self {
        Self {
            id,
            identifier: None,
            attributes,
            exists: true,
        }
    }

    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_attribute_accessors() {
        let resource = Resource::new("kubernetes_cluster", "main")
            .with_attribute("name", Value::String("main".to_string()))
            .with_attribute("worker_num", Value::Int(3))
            .with_attribute("disable_auto_update", Value::Bool(true));

        assert_eq!(resource.string_attr("name"), Some("main"));
        assert_eq!(resource.int_attr("worker_num"), Some(3));
        assert_eq!(resource.bool_attr("disable_auto_update"), Some(true));
        assert_eq!(resource.string_attr("worker_num"), None);
        assert_eq!(resource.string_attr("missing"), None);
    }

    #[test]
    fn data_source_flag() {
        let ds = Resource::new("security_events", "recent").with_read_only(true);
        assert!(ds.is_data_source());
        assert!(!Resource::new("kubernetes_cluster", "main").is_data_source());
    }

    #[test]
    fn state_not_found_has_no_identifier() {
        let state = State::not_found(ResourceId::new("kubernetes_alb", "public"));
        assert!(!state.exists);
        assert!(state.identifier.is_none());
        assert!(state.attributes.is_empty());
    }
}
