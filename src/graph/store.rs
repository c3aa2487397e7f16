//! In-memory graph storage with merge (create-if-absent) semantics
//!
//! Nodes are addressed by their identity key, relationships by their
//! (source, type, target) triple, so repeated merges never duplicate.

use super::edge::Edge;
use super::node::Node;
use super::property::PropertyValue;
use super::types::{EdgeId, NodeId, NodeKind, RelKind};
use rustc_hash::FxHashMap;
use thiserror::Error;

/// Errors that can occur during graph operations
#[derive(Error, Debug, PartialEq)]
pub enum GraphError {
    #[error("Node {0} not found")]
    NodeNotFound(NodeId),

    #[error("Invalid edge: source node {0} does not exist")]
    InvalidEdgeSource(NodeId),

    #[error("Invalid edge: target node {0} does not exist")]
    InvalidEdgeTarget(NodeId),

    #[error("{kind} identity needs {expected} key value(s), got {got}")]
    KeyArity {
        kind: NodeKind,
        expected: usize,
        got: usize,
    },

    #[error("{rel} cannot connect {source_kind} to {target_kind}")]
    EndpointMismatch {
        rel: RelKind,
        source_kind: NodeKind,
        target_kind: NodeKind,
    },

    #[error("Identity property '{key}' of {kind} cannot be overwritten")]
    IdentityOverwrite { kind: NodeKind, key: String },
}

pub type GraphResult<T> = Result<T, GraphError>;

type IdentityKey = (NodeKind, Vec<String>);

/// What a pending write changed, enough to undo it
#[derive(Debug, Clone, Default)]
struct UndoLog {
    nodes_len: usize,
    edges_len: usize,
    created_identities: Vec<IdentityKey>,
    overwritten: Vec<(NodeId, String, Option<PropertyValue>)>,
}

/// In-memory graph storage
///
/// - nodes: NodeId -> Node (arena, ids are positions)
/// - edges: EdgeId -> Edge (arena)
/// - outgoing: NodeId -> Vec<EdgeId> (adjacency list)
/// - label_index: NodeKind -> Vec<NodeId> in creation order
/// - identity_index: (NodeKind, key values) -> NodeId
/// - edge_index: (source, type, target) -> EdgeId
///
/// Between [`GraphStore::begin`] and [`GraphStore::commit`] every change is
/// logged so [`GraphStore::rollback`] can restore the prior state.
#[derive(Debug, Clone, Default)]
pub struct GraphStore {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    outgoing: Vec<Vec<EdgeId>>,
    label_index: FxHashMap<NodeKind, Vec<NodeId>>,
    identity_index: FxHashMap<IdentityKey, NodeId>,
    edge_index: FxHashMap<(NodeId, RelKind, NodeId), EdgeId>,
    edge_type_counts: FxHashMap<RelKind, usize>,
    undo: Option<UndoLog>,
}

impl GraphStore {
    /// Create a new empty graph store
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the node with this identity key, creating it if absent.
    ///
    /// The boolean is true when the node was created by this call.
    pub fn merge_node(&mut self, kind: NodeKind, key_values: &[&str]) -> GraphResult<(NodeId, bool)> {
        let keys = kind.identity_keys();
        if keys.len() != key_values.len() {
            return Err(GraphError::KeyArity {
                kind,
                expected: keys.len(),
                got: key_values.len(),
            });
        }

        let identity: IdentityKey = (kind, key_values.iter().map(|v| v.to_string()).collect());
        if let Some(&id) = self.identity_index.get(&identity) {
            return Ok((id, false));
        }

        let id = NodeId::new(self.nodes.len() as u64);
        let mut node = Node::new(id, kind);
        for (key, value) in keys.iter().zip(key_values) {
            node.set_property(*key, *value);
        }

        self.nodes.push(node);
        self.outgoing.push(Vec::new());
        self.label_index.entry(kind).or_default().push(id);
        if let Some(undo) = self.undo.as_mut() {
            undo.created_identities.push(identity.clone());
        }
        self.identity_index.insert(identity, id);
        Ok((id, true))
    }

    /// Overwrite a non-identity property
    pub fn set_node_property(
        &mut self,
        id: NodeId,
        key: &str,
        value: impl Into<PropertyValue>,
    ) -> GraphResult<Option<PropertyValue>> {
        let node = self
            .nodes
            .get_mut(id.as_u64() as usize)
            .ok_or(GraphError::NodeNotFound(id))?;
        if node.kind.identity_keys().contains(&key) {
            return Err(GraphError::IdentityOverwrite {
                kind: node.kind,
                key: key.to_string(),
            });
        }
        let previous = node.set_property(key, value);
        if let Some(undo) = self.undo.as_mut() {
            undo.overwritten.push((id, key.to_string(), previous.clone()));
        }
        Ok(previous)
    }

    /// Return the relationship between two nodes, creating it if absent
    pub fn merge_edge(&mut self, source: NodeId, kind: RelKind, target: NodeId) -> GraphResult<(EdgeId, bool)> {
        let source_kind = self
            .get_node(source)
            .ok_or(GraphError::InvalidEdgeSource(source))?
            .kind;
        let target_kind = self
            .get_node(target)
            .ok_or(GraphError::InvalidEdgeTarget(target))?
            .kind;
        if kind.endpoints() != (source_kind, target_kind) {
            return Err(GraphError::EndpointMismatch {
                rel: kind,
                source_kind,
                target_kind,
            });
        }

        if let Some(&id) = self.edge_index.get(&(source, kind, target)) {
            return Ok((id, false));
        }

        let id = EdgeId::new(self.edges.len() as u64);
        self.edges.push(Edge::new(id, source, target, kind));
        self.outgoing[source.as_u64() as usize].push(id);
        self.edge_index.insert((source, kind, target), id);
        *self.edge_type_counts.entry(kind).or_default() += 1;
        Ok((id, true))
    }

    /// Get a node by ID
    pub fn get_node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.as_u64() as usize)
    }

    /// Look a node up by its identity key
    pub fn find_node(&self, kind: NodeKind, key_values: &[&str]) -> Option<&Node> {
        let identity: IdentityKey = (kind, key_values.iter().map(|v| v.to_string()).collect());
        self.identity_index
            .get(&identity)
            .and_then(|&id| self.get_node(id))
    }

    /// All nodes with a label, in creation order
    pub fn nodes_by_kind(&self, kind: NodeKind) -> impl Iterator<Item = &Node> + '_ {
        self.label_index
            .get(&kind)
            .into_iter()
            .flatten()
            .filter_map(move |&id| self.get_node(id))
    }

    /// Targets of a node's outgoing relationships of one type
    pub fn neighbors(&self, node_id: NodeId, kind: RelKind) -> impl Iterator<Item = &Node> + '_ {
        self.outgoing
            .get(node_id.as_u64() as usize)
            .into_iter()
            .flatten()
            .filter_map(move |&eid| self.edges.get(eid.as_u64() as usize))
            .filter(move |edge| edge.kind == kind)
            .filter_map(move |edge| self.get_node(edge.target))
    }

    /// Get total number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Get total number of edges
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Number of nodes with a label
    pub fn count_nodes(&self, kind: NodeKind) -> usize {
        self.label_index.get(&kind).map_or(0, Vec::len)
    }

    /// Number of relationships of a type
    pub fn count_edges(&self, kind: RelKind) -> usize {
        self.edge_type_counts.get(&kind).copied().unwrap_or(0)
    }

    /// Clear all data from the graph
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Start logging changes for a later commit or rollback
    pub fn begin(&mut self) {
        self.undo = Some(UndoLog {
            nodes_len: self.nodes.len(),
            edges_len: self.edges.len(),
            ..UndoLog::default()
        });
    }

    /// Keep every change since `begin`
    pub fn commit(&mut self) {
        self.undo = None;
    }

    /// Undo every change since `begin`. No-op outside a write.
    pub fn rollback(&mut self) {
        let Some(undo) = self.undo.take() else {
            return;
        };

        for (id, key, previous) in undo.overwritten.into_iter().rev() {
            if let Some(node) = self.nodes.get_mut(id.as_u64() as usize) {
                match previous {
                    Some(value) => {
                        node.properties.insert(key, value);
                    }
                    None => {
                        node.properties.remove(&key);
                    }
                }
            }
        }

        // Adjacency lists only ever grow at the tail
        for edge in self.edges.drain(undo.edges_len..).rev() {
            self.edge_index.remove(&(edge.source, edge.kind, edge.target));
            if let Some(out) = self.outgoing.get_mut(edge.source.as_u64() as usize) {
                out.pop();
            }
            if let Some(count) = self.edge_type_counts.get_mut(&edge.kind) {
                *count -= 1;
            }
        }

        for identity in &undo.created_identities {
            self.identity_index.remove(identity);
        }
        for node in self.nodes.drain(undo.nodes_len..).rev() {
            if let Some(ids) = self.label_index.get_mut(&node.kind) {
                ids.pop();
            }
        }
        self.outgoing.truncate(undo.nodes_len);
    }
}
