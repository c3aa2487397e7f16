//! Identity constraints and lookup indices
//!
//! Every declaration carries `IF NOT EXISTS` semantics, so re-issuing the
//! whole set on every load is a no-op once it exists.

use crate::backend::GraphSession;
use crate::error::AirgraphResult;
use crate::graph::NodeKind;
use serde::Serialize;
use tracing::{debug, info};

/// Kind of schema rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DeclarationKind {
    /// Property value identifies at most one node of the label
    Unique,
    /// Lookup index over one or more properties
    Index,
}

/// A named, idempotent schema declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaDeclaration {
    pub name: &'static str,
    pub kind: DeclarationKind,
    pub label: NodeKind,
    pub properties: &'static [&'static str],
}

impl SchemaDeclaration {
    /// Cypher DDL for this declaration
    pub fn cypher(&self) -> String {
        let props: Vec<String> = self.properties.iter().map(|p| format!("n.{}", p)).collect();
        match self.kind {
            DeclarationKind::Unique => format!(
                "CREATE CONSTRAINT {} IF NOT EXISTS FOR (n:{}) REQUIRE {} IS UNIQUE",
                self.name,
                self.label,
                props.join(", ")
            ),
            DeclarationKind::Index => format!(
                "CREATE INDEX {} IF NOT EXISTS FOR (n:{}) ON ({})",
                self.name,
                self.label,
                props.join(", ")
            ),
        }
    }
}

/// Declarations for the airline schema.
///
/// Flight identity is composite and enforced by the upsert merge itself;
/// the store only gets a lookup index for it.
pub const AIRLINE_SCHEMA: [SchemaDeclaration; 4] = [
    SchemaDeclaration {
        name: "passenger_id",
        kind: DeclarationKind::Unique,
        label: NodeKind::Passenger,
        properties: &["record_locator"],
    },
    SchemaDeclaration {
        name: "journey_id",
        kind: DeclarationKind::Unique,
        label: NodeKind::Journey,
        properties: &["feedback_ID"],
    },
    SchemaDeclaration {
        name: "airport_id",
        kind: DeclarationKind::Unique,
        label: NodeKind::Airport,
        properties: &["station_code"],
    },
    SchemaDeclaration {
        name: "flight_idx",
        kind: DeclarationKind::Index,
        label: NodeKind::Flight,
        properties: &["flight_number", "fleet_type_description"],
    },
];

/// Issues the schema declarations before any upsert batch
pub struct ConstraintInitializer {
    declarations: Vec<SchemaDeclaration>,
}

impl ConstraintInitializer {
    /// Initializer for [`AIRLINE_SCHEMA`]
    pub fn new() -> Self {
        Self {
            declarations: AIRLINE_SCHEMA.to_vec(),
        }
    }

    pub fn declarations(&self) -> &[SchemaDeclaration] {
        &self.declarations
    }

    /// Declare every rule; the first store failure is fatal.
    pub async fn apply(&self, session: &mut dyn GraphSession) -> AirgraphResult<usize> {
        info!("Creating constraints...");
        for declaration in &self.declarations {
            debug!("Declaring {}", declaration.cypher());
            session.declare(declaration).await?;
        }
        Ok(self.declarations.len())
    }
}

impl Default for ConstraintInitializer {
    fn default() -> Self {
        Self::new()
    }
}
