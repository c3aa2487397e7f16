//! Load progress events
//!
//! The loader reports progress through a [`LoadObserver`] instead of
//! printing, so the host decides where events go.

use serde::Serialize;
use std::sync::Mutex;
use tracing::info;

/// Progress event emitted while loading
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum LoadEvent {
    /// Input read and normalized
    DatasetRead { total: usize },
    /// Existing graph removed
    GraphWiped,
    /// Schema declarations issued
    ConstraintsDeclared { count: usize },
    /// One upsert transaction committed
    BatchCommitted {
        batch: usize,
        rows_done: usize,
        total: Option<usize>,
    },
    /// All batches committed
    LoadFinished { rows: usize, batches: usize },
}

/// Receives load progress
pub trait LoadObserver: Send + Sync {
    fn on_event(&self, event: &LoadEvent);
}

/// Logs progress through `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl LoadObserver for TracingObserver {
    fn on_event(&self, event: &LoadEvent) {
        match event {
            LoadEvent::DatasetRead { total } => {
                info!("Found {} records. Starting import...", total)
            }
            LoadEvent::GraphWiped => info!("Database cleared."),
            LoadEvent::ConstraintsDeclared { count } => info!("{} constraints in place", count),
            LoadEvent::BatchCommitted {
                rows_done,
                total: Some(total),
                ..
            } => info!("Processed {}/{} rows...", rows_done, total),
            LoadEvent::BatchCommitted { rows_done, .. } => info!("Processed {} rows...", rows_done),
            LoadEvent::LoadFinished { rows, batches } => {
                info!("Imported {} rows in {} batches", rows, batches)
            }
        }
    }
}

/// Keeps every event, for inspection after a load
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<LoadEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events received so far
    pub fn events(&self) -> Vec<LoadEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    /// Number of committed batches seen
    pub fn committed_batches(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, LoadEvent::BatchCommitted { .. }))
            .count()
    }
}

impl LoadObserver for RecordingObserver {
    fn on_event(&self, event: &LoadEvent) {
        let mut events = self.events.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        events.push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_observer() {
        let observer = RecordingObserver::new();
        observer.on_event(&LoadEvent::DatasetRead { total: 3 });
        observer.on_event(&LoadEvent::BatchCommitted {
            batch: 1,
            rows_done: 3,
            total: Some(3),
        });
        assert_eq!(observer.events().len(), 2);
        assert_eq!(observer.committed_batches(), 1);
    }
}
