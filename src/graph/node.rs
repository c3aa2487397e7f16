//! Node implementation for the airline property graph

use super::property::{PropertyMap, PropertyValue};
use super::types::{NodeId, NodeKind};
use serde::{Deserialize, Serialize};

/// A node in the property graph
///
/// Nodes carry exactly one label and their properties, identity keys
/// included.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Unique identifier for this node
    pub id: NodeId,

    /// Label of this node
    pub kind: NodeKind,

    /// Properties associated with this node
    pub properties: PropertyMap,
}

impl Node {
    /// Create a new node without properties
    pub fn new(id: NodeId, kind: NodeKind) -> Self {
        Node {
            id,
            kind,
            properties: PropertyMap::new(),
        }
    }

    /// Set a property value, returning the previous one
    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Option<PropertyValue> {
        self.properties.insert(key.into(), value.into())
    }

    /// Get a property value
    pub fn get_property(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.get(key)
    }

    /// Property value, or Null when absent (Cypher property access)
    pub fn property_or_null(&self, key: &str) -> PropertyValue {
        self.properties.get(key).cloned().unwrap_or(PropertyValue::Null)
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Node {}
