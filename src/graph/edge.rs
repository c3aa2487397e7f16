//! Relationship implementation for the airline property graph

use super::types::{EdgeId, NodeId, RelKind};
use serde::{Deserialize, Serialize};

/// A directed relationship. The schema gives relationships no properties.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    /// Unique identifier for this edge
    pub id: EdgeId,

    /// Source node (edge goes FROM this node)
    pub source: NodeId,

    /// Target node (edge goes TO this node)
    pub target: NodeId,

    /// Relationship type
    pub kind: RelKind,
}

impl Edge {
    /// Create a new directed edge
    pub fn new(id: EdgeId, source: NodeId, target: NodeId, kind: RelKind) -> Self {
        Edge {
            id,
            source,
            target,
            kind,
        }
    }
}

impl PartialEq for Edge {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Edge {}
