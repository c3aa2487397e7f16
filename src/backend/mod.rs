//! Graph store backends
//!
//! The ingestion and validation core talks to the store only through
//! [`GraphBackend`] and [`GraphSession`]. Implemented by:
//! - `MemoryBackend`: in-process graph, no network (tests, dry runs)
//! - `HttpBackend`: a Neo4j-compatible server over its HTTP transaction API

pub mod eval;
pub mod http;
pub mod memory;

pub use http::HttpBackend;
pub use memory::{BackendMetrics, MemoryBackend};

use crate::catalog::CatalogQuery;
use crate::error::AirgraphResult;
use crate::graph::PropertyValue;
use crate::ingest::{JourneyRecord, SchemaDeclaration};
use async_trait::async_trait;
use indexmap::IndexMap;

/// One flat result record, columns in RETURN order
pub type ResultRow = IndexMap<String, PropertyValue>;

/// A transactional property-graph store
#[async_trait]
pub trait GraphBackend: Send + Sync {
    /// Acquire a session. The caller must `close` it on every exit path.
    async fn open_session(&self) -> AirgraphResult<Box<dyn GraphSession>>;

    /// Human-readable target, for logs
    fn describe(&self) -> String;
}

/// A session on a [`GraphBackend`]. Every call is its own transaction.
#[async_trait]
pub trait GraphSession: Send {
    /// Issue one idempotent schema declaration
    async fn declare(&mut self, declaration: &SchemaDeclaration) -> AirgraphResult<()>;

    /// Upsert a batch atomically: all merges commit or none do
    async fn write_batch(&mut self, batch: &[JourneyRecord]) -> AirgraphResult<()>;

    /// Run a read-only catalog query and return its ordered rows
    async fn run_read(&mut self, query: &CatalogQuery) -> AirgraphResult<Vec<ResultRow>>;

    /// Remove every node and relationship
    async fn wipe(&mut self) -> AirgraphResult<()>;

    /// Release the session. Further calls fail.
    async fn close(&mut self) -> AirgraphResult<()>;
}
