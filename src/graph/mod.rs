//! In-process property graph
//!
//! Backs [`crate::backend::MemoryBackend`]:
//! - Nodes with one of four labels and scalar properties
//! - Directed, property-less relationships of four types
//! - Identity-key and relationship-triple indices for merge semantics

pub mod edge;
pub mod node;
pub mod property;
pub mod store;
pub mod types;

// Re-export main types
pub use edge::Edge;
pub use node::Node;
pub use property::{PropertyMap, PropertyValue};
pub use store::{GraphError, GraphResult, GraphStore};
pub use types::{EdgeId, NodeId, NodeKind, RelKind};
