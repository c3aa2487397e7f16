//! Build phase: survey rows into graph state
//!
//! raw rows -> [`RecordNormalizer`] -> [`BatchUpsertEngine`] -> store.
//! [`GraphLoader`] sequences one load: read and normalize everything,
//! open a session, optionally wipe, declare constraints, upsert batches,
//! close the session on every exit path.

pub mod constraints;
pub mod observe;
pub mod reader;
pub mod record;
pub mod upsert;

pub use constraints::{ConstraintInitializer, DeclarationKind, SchemaDeclaration, AIRLINE_SCHEMA};
pub use observe::{LoadEvent, LoadObserver, RecordingObserver, TracingObserver};
pub use reader::SurveyDataset;
pub use record::{coerce_integer, JourneyRecord, RecordNormalizer, REQUIRED_COLUMNS};
pub use upsert::{BatchUpsertEngine, UpsertSummary, UPSERT_CYPHER};

use crate::backend::{GraphBackend, GraphSession};
use crate::config::LoadOptions;
use crate::error::AirgraphResult;
use serde::Serialize;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::info;

/// Outcome of one load
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadSummary {
    pub rows: usize,
    pub batches: usize,
    pub constraints: usize,
    pub wiped: bool,
    pub elapsed: Duration,
}

/// Runs one load against a backend
pub struct GraphLoader<'a> {
    options: &'a LoadOptions,
    observer: &'a dyn LoadObserver,
}

impl<'a> GraphLoader<'a> {
    pub fn new(options: &'a LoadOptions, observer: &'a dyn LoadObserver) -> Self {
        Self { options, observer }
    }

    /// Read a survey file and load it. Input errors surface before the
    /// backend is contacted.
    pub async fn load_csv(
        &self,
        backend: &dyn GraphBackend,
        path: impl AsRef<Path>,
    ) -> AirgraphResult<LoadSummary> {
        self.options.validate()?;
        let dataset = SurveyDataset::from_path(path)?;
        self.load(backend, dataset).await
    }

    /// Load an already normalized dataset
    pub async fn load(
        &self,
        backend: &dyn GraphBackend,
        dataset: SurveyDataset,
    ) -> AirgraphResult<LoadSummary> {
        self.options.validate()?;
        let engine = BatchUpsertEngine::new(self.options.batch_size)?;
        let started = Instant::now();
        self.observer.on_event(&LoadEvent::DatasetRead {
            total: dataset.len(),
        });

        let mut session = backend.open_session().await?;
        let outcome = self.load_in_session(session.as_mut(), &engine, dataset).await;
        let closed = session.close().await;

        let (constraints, upserted) = outcome?;
        closed?;

        let summary = LoadSummary {
            rows: upserted.rows,
            batches: upserted.batches,
            constraints,
            wiped: self.options.wipe_first,
            elapsed: started.elapsed(),
        };
        self.observer.on_event(&LoadEvent::LoadFinished {
            rows: summary.rows,
            batches: summary.batches,
        });
        info!(
            "Knowledge graph loaded: {} rows, {} batches in {:?}",
            summary.rows, summary.batches, summary.elapsed
        );
        Ok(summary)
    }

    async fn load_in_session(
        &self,
        session: &mut dyn GraphSession,
        engine: &BatchUpsertEngine,
        dataset: SurveyDataset,
    ) -> AirgraphResult<(usize, UpsertSummary)> {
        if self.options.wipe_first {
            info!("Clearing existing database...");
            session.wipe().await?;
            self.observer.on_event(&LoadEvent::GraphWiped);
        }

        let constraints = ConstraintInitializer::new().apply(session).await?;
        self.observer.on_event(&LoadEvent::ConstraintsDeclared { count: constraints });

        let total = dataset.len();
        let upserted = engine
            .run(session, dataset.into_records(), Some(total), self.observer)
            .await?;
        Ok((constraints, upserted))
    }
}
