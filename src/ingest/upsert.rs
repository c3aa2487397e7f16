//! Batched, idempotent upsert of survey records
//!
//! Records are grouped into fixed-size batches and every batch is written
//! in exactly one store transaction. Batches commit in input order; a failed
//! batch stops the load and leaves earlier batches applied.

use super::observe::{LoadEvent, LoadObserver};
use super::record::JourneyRecord;
use crate::backend::GraphSession;
use crate::config::DEFAULT_BATCH_SIZE;
use crate::error::{AirgraphError, AirgraphResult};
use serde::Serialize;
use tracing::debug;

/// Statement run once per batch, with the batch bound to `$batch`.
///
/// Airports and flights are merged on their identity keys; passenger and
/// journey attributes are overwritten, so the last batch holding a key wins.
pub const UPSERT_CYPHER: &str = "\
UNWIND $batch AS row
MERGE (origin:Airport {station_code: row.origin_station_code})
MERGE (dest:Airport {station_code: row.destination_station_code})
MERGE (f:Flight {flight_number: row.flight_number, fleet_type_description: row.fleet_type_description})
MERGE (f)-[:DEPARTS_FROM]->(origin)
MERGE (f)-[:ARRIVES_AT]->(dest)
MERGE (p:Passenger {record_locator: row.record_locator})
SET p.loyalty_program_level = row.loyalty_program_level,
    p.generation = row.generation
MERGE (j:Journey {feedback_ID: row.feedback_ID})
SET j.food_satisfaction_score = toInteger(row.food_satisfaction_score),
    j.arrival_delay_minutes = toInteger(row.arrival_delay_minutes),
    j.actual_flown_miles = toInteger(row.actual_flown_miles),
    j.number_of_legs = toInteger(row.number_of_legs),
    j.passenger_class = row.passenger_class
MERGE (p)-[:TOOK]->(j)
MERGE (j)-[:ON]->(f)";

/// Outcome of an upsert run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct UpsertSummary {
    pub rows: usize,
    pub batches: usize,
}

/// Groups records into batches and commits one transaction per batch
#[derive(Debug, Clone)]
pub struct BatchUpsertEngine {
    batch_size: usize,
}

impl BatchUpsertEngine {
    pub fn new(batch_size: usize) -> AirgraphResult<Self> {
        if batch_size == 0 {
            return Err(AirgraphError::ConfigInvalid(
                "batch size must be at least 1".to_string(),
            ));
        }
        Ok(Self { batch_size })
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Write every record. `total`, when known, is only used for progress.
    pub async fn run<I>(
        &self,
        session: &mut dyn GraphSession,
        records: I,
        total: Option<usize>,
        observer: &dyn LoadObserver,
    ) -> AirgraphResult<UpsertSummary>
    where
        I: IntoIterator<Item = JourneyRecord>,
    {
        let mut summary = UpsertSummary::default();
        let mut batch = Vec::with_capacity(self.batch_size);

        for record in records {
            batch.push(record);
            if batch.len() == self.batch_size {
                self.commit(session, &mut batch, &mut summary, total, observer).await?;
            }
        }
        if !batch.is_empty() {
            self.commit(session, &mut batch, &mut summary, total, observer).await?;
        }

        Ok(summary)
    }

    async fn commit(
        &self,
        session: &mut dyn GraphSession,
        batch: &mut Vec<JourneyRecord>,
        summary: &mut UpsertSummary,
        total: Option<usize>,
        observer: &dyn LoadObserver,
    ) -> AirgraphResult<()> {
        debug!("Committing batch {} ({} rows)", summary.batches + 1, batch.len());
        session.write_batch(batch.as_slice()).await?;

        summary.batches += 1;
        summary.rows += batch.len();
        batch.clear();

        observer.on_event(&LoadEvent::BatchCommitted {
            batch: summary.batches,
            rows_done: summary.rows,
            total,
        });
        Ok(())
    }
}

impl Default for BatchUpsertEngine {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}
