//! Core type definitions for the airline property graph

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct NodeId(pub u64);

impl NodeId {
    pub fn new(id: u64) -> Self {
        NodeId(id)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

/// Unique identifier for a relationship
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct EdgeId(pub u64);

impl EdgeId {
    pub fn new(id: u64) -> Self {
        EdgeId(id)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EdgeId({})", self.0)
    }
}

/// Node label. The schema is fixed to four entity kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub enum NodeKind {
    Airport,
    Flight,
    Passenger,
    Journey,
}

impl NodeKind {
    pub const ALL: [NodeKind; 4] = [
        NodeKind::Airport,
        NodeKind::Flight,
        NodeKind::Passenger,
        NodeKind::Journey,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Airport => "Airport",
            NodeKind::Flight => "Flight",
            NodeKind::Passenger => "Passenger",
            NodeKind::Journey => "Journey",
        }
    }

    /// Properties that together identify a node of this kind
    pub fn identity_keys(&self) -> &'static [&'static str] {
        match self {
            NodeKind::Airport => &["station_code"],
            NodeKind::Flight => &["flight_number", "fleet_type_description"],
            NodeKind::Passenger => &["record_locator"],
            NodeKind::Journey => &["feedback_ID"],
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Relationship type. All relationships are directed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub enum RelKind {
    /// Flight -> Airport
    DepartsFrom,
    /// Flight -> Airport
    ArrivesAt,
    /// Passenger -> Journey
    Took,
    /// Journey -> Flight
    On,
}

impl RelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelKind::DepartsFrom => "DEPARTS_FROM",
            RelKind::ArrivesAt => "ARRIVES_AT",
            RelKind::Took => "TOOK",
            RelKind::On => "ON",
        }
    }

    /// (source kind, target kind)
    pub fn endpoints(&self) -> (NodeKind, NodeKind) {
        match self {
            RelKind::DepartsFrom | RelKind::ArrivesAt => (NodeKind::Flight, NodeKind::Airport),
            RelKind::Took => (NodeKind::Passenger, NodeKind::Journey),
            RelKind::On => (NodeKind::Journey, NodeKind::Flight),
        }
    }
}

impl fmt::Display for RelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
