//! MemoryBackend: in-process graph store
//!
//! Uses [`GraphStore`] directly, no network needed. Each write batch runs
//! between `begin` and `commit` on the graph and is rolled back if any merge
//! fails, which gives the same all-or-nothing batch behaviour as a server
//! transaction.

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use super::eval;
use super::{GraphBackend, GraphSession, ResultRow};
use crate::catalog::CatalogQuery;
use crate::error::{AirgraphError, AirgraphResult};
use crate::graph::{GraphResult, GraphStore, NodeKind, RelKind};
use crate::ingest::{JourneyRecord, SchemaDeclaration};

/// Counters of what sessions did to the store
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BackendMetrics {
    pub sessions_opened: usize,
    pub sessions_closed: usize,
    pub declarations: usize,
    pub write_transactions: usize,
    pub reads: usize,
    pub wipes: usize,
}

#[derive(Debug, Default)]
struct MemoryState {
    graph: GraphStore,
    declarations: Vec<SchemaDeclaration>,
    metrics: BackendMetrics,
    attempted_writes: usize,
}

/// In-process backend. Clones share the same graph.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    state: Arc<RwLock<MemoryState>>,
    fail_on_batch: Option<usize>,
    offline: bool,
}

impl MemoryBackend {
    /// Create a backend over a fresh empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject the n-th attempted write transaction (1-based) without
    /// applying any of it
    pub fn fail_on_batch(mut self, n: usize) -> Self {
        self.fail_on_batch = Some(n);
        self
    }

    /// Refuse every session, as an unreachable server would
    pub fn offline(mut self) -> Self {
        self.offline = true;
        self
    }

    pub async fn metrics(&self) -> BackendMetrics {
        self.state.read().await.metrics.clone()
    }

    /// Copy of the current committed graph
    pub async fn snapshot(&self) -> GraphStore {
        self.state.read().await.graph.clone()
    }

    /// Schema declarations issued so far, deduplicated by name
    pub async fn declarations(&self) -> Vec<SchemaDeclaration> {
        self.state.read().await.declarations.clone()
    }
}

#[async_trait]
impl GraphBackend for MemoryBackend {
    async fn open_session(&self) -> AirgraphResult<Box<dyn GraphSession>> {
        if self.offline {
            return Err(AirgraphError::StoreUnavailable(self.describe()));
        }
        self.state.write().await.metrics.sessions_opened += 1;
        Ok(Box::new(MemorySession {
            state: Arc::clone(&self.state),
            fail_on_batch: self.fail_on_batch,
            closed: false,
        }))
    }

    fn describe(&self) -> String {
        "in-memory graph".to_string()
    }
}

/// Session on a [`MemoryBackend`]
pub struct MemorySession {
    state: Arc<RwLock<MemoryState>>,
    fail_on_batch: Option<usize>,
    closed: bool,
}

impl MemorySession {
    fn ensure_open(&self) -> AirgraphResult<()> {
        if self.closed {
            return Err(AirgraphError::StoreUnavailable("session already closed".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl GraphSession for MemorySession {
    async fn declare(&mut self, declaration: &SchemaDeclaration) -> AirgraphResult<()> {
        self.ensure_open()?;
        let mut state = self.state.write().await;
        state.metrics.declarations += 1;
        if !state.declarations.iter().any(|d| d.name == declaration.name) {
            state.declarations.push(declaration.clone());
        }
        Ok(())
    }

    async fn write_batch(&mut self, batch: &[JourneyRecord]) -> AirgraphResult<()> {
        self.ensure_open()?;
        let mut state = self.state.write().await;
        state.attempted_writes += 1;
        if self.fail_on_batch == Some(state.attempted_writes) {
            return Err(AirgraphError::TransactionFailure(format!(
                "write transaction {} rejected",
                state.attempted_writes
            )));
        }

        let graph = &mut state.graph;
        graph.begin();
        if let Err(e) = batch.iter().try_for_each(|record| apply_record(graph, record)) {
            graph.rollback();
            return Err(AirgraphError::TransactionFailure(e.to_string()));
        }
        graph.commit();
        state.metrics.write_transactions += 1;
        debug!("Applied {} rows in memory", batch.len());
        Ok(())
    }

    async fn run_read(&mut self, query: &CatalogQuery) -> AirgraphResult<Vec<ResultRow>> {
        self.ensure_open()?;
        let mut state = self.state.write().await;
        state.metrics.reads += 1;
        Ok(eval::evaluate(&state.graph, query))
    }

    async fn wipe(&mut self) -> AirgraphResult<()> {
        self.ensure_open()?;
        let mut state = self.state.write().await;
        state.graph.clear();
        state.metrics.wipes += 1;
        Ok(())
    }

    async fn close(&mut self) -> AirgraphResult<()> {
        self.ensure_open()?;
        self.closed = true;
        self.state.write().await.metrics.sessions_closed += 1;
        Ok(())
    }
}

/// Merge one record into the graph, mirroring the upsert statement
pub(crate) fn apply_record(graph: &mut GraphStore, record: &JourneyRecord) -> GraphResult<()> {
    let (origin, _) = graph.merge_node(NodeKind::Airport, &[record.origin_station_code.as_str()])?;
    let (dest, _) = graph.merge_node(NodeKind::Airport, &[record.destination_station_code.as_str()])?;
    let (flight, _) = graph.merge_node(
        NodeKind::Flight,
        &[record.flight_number.as_str(), record.fleet_type_description.as_str()],
    )?;
    graph.merge_edge(flight, RelKind::DepartsFrom, origin)?;
    graph.merge_edge(flight, RelKind::ArrivesAt, dest)?;

    let (passenger, _) = graph.merge_node(NodeKind::Passenger, &[record.record_locator.as_str()])?;
    graph.set_node_property(passenger, "loyalty_program_level", record.loyalty_program_level.as_str())?;
    graph.set_node_property(passenger, "generation", record.generation.as_str())?;

    let (journey, _) = graph.merge_node(NodeKind::Journey, &[record.feedback_id.as_str()])?;
    graph.set_node_property(journey, "food_satisfaction_score", record.food_satisfaction_score)?;
    graph.set_node_property(journey, "arrival_delay_minutes", record.arrival_delay_minutes)?;
    graph.set_node_property(journey, "actual_flown_miles", record.actual_flown_miles)?;
    graph.set_node_property(journey, "number_of_legs", record.number_of_legs)?;
    graph.set_node_property(journey, "passenger_class", record.passenger_class.as_str())?;

    graph.merge_edge(passenger, RelKind::Took, journey)?;
    graph.merge_edge(journey, RelKind::On, flight)?;
    Ok(())
}
