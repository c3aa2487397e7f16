//! Airgraph
//!
//! Builds a property-graph knowledge base from an airline passenger survey
//! and verifies it with a fixed catalog of analytical queries.
//!
//! # Architecture
//!
//! - `ingest`: survey CSV -> normalized records -> batched idempotent upserts
//! - `catalog`: five read-only aggregation queries and their golden results
//! - `validate`: runs the catalog and compares results within tolerance
//! - `backend`: the store seam, with an HTTP backend for a Neo4j-compatible
//!   server and an in-process backend for tests and dry runs
//!
//! # Graph model
//!
//! - `(:Airport {station_code})`
//! - `(:Flight {flight_number, fleet_type_description})`
//! - `(:Passenger {record_locator, loyalty_program_level, generation})`
//! - `(:Journey {feedback_ID, food_satisfaction_score, arrival_delay_minutes,
//!   actual_flown_miles, number_of_legs, passenger_class})`
//! - `(Flight)-[:DEPARTS_FROM]->(Airport)`, `(Flight)-[:ARRIVES_AT]->(Airport)`,
//!   `(Passenger)-[:TOOK]->(Journey)`, `(Journey)-[:ON]->(Flight)`
//!
//! ## Example Usage
//!
//! ```rust
//! use airgraph::{GraphLoader, LoadOptions, MemoryBackend, ResultValidator, TracingObserver};
//! use airgraph::ingest::SurveyDataset;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let csv = "origin_station_code,destination_station_code,flight_number,\
//! fleet_type_description,record_locator,loyalty_program_level,generation,\
//! food_satisfaction_score,arrival_delay_minutes,actual_flown_miles,\
//! number_of_legs,passenger_class,feedback_ID\n\
//! LAX,IAX,42,B737,AB12CD,non-elite,Boomer,3,-5,1200,2,Economy,F1\n";
//!
//! let backend = MemoryBackend::new();
//! let dataset = SurveyDataset::from_reader(csv.as_bytes()).unwrap();
//! let options = LoadOptions::default();
//! let summary = GraphLoader::new(&options, &TracingObserver)
//!     .load(&backend, dataset)
//!     .await
//!     .unwrap();
//! assert_eq!(summary.rows, 1);
//!
//! let report = ResultValidator::survey_sample().validate(&backend).await.unwrap();
//! assert!(!report.all_passed());
//! # }
//! ```

pub mod backend;
pub mod catalog;
pub mod config;
pub mod error;
pub mod graph;
pub mod ingest;
pub mod validate;

pub use backend::{BackendMetrics, GraphBackend, GraphSession, HttpBackend, MemoryBackend, ResultRow};
pub use catalog::{Baseline, CatalogQuery, QueryCatalog, STANDARD_QUERIES};
pub use config::{LoadOptions, StoreConfig, DEFAULT_BATCH_SIZE};
pub use error::{AirgraphError, AirgraphResult};
pub use graph::{GraphStore, NodeKind, PropertyValue, RelKind};
pub use ingest::{GraphLoader, LoadEvent, LoadObserver, LoadSummary, TracingObserver};
pub use validate::{QueryReport, ResultValidator, ValidationSummary, Verdict};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get version string
pub fn version() -> &'static str {
    VERSION
}
