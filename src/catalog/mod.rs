//! Fixed analytical query catalog
//!
//! Five read-only aggregation queries over the airline graph. Each query
//! states its ordering and limit explicitly, both in its Cypher text and in
//! structured form, so no result depends on store-default order.

pub mod baseline;

pub use baseline::Baseline;

use serde::Serialize;

/// Sort direction of one ordering key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Direction {
    Ascending,
    Descending,
}

/// One `ORDER BY` key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SortKey {
    pub column: &'static str,
    pub direction: Direction,
}

const fn desc(column: &'static str) -> SortKey {
    SortKey {
        column,
        direction: Direction::Descending,
    }
}

const fn asc(column: &'static str) -> SortKey {
    SortKey {
        column,
        direction: Direction::Ascending,
    }
}

/// The match-and-aggregate part of a catalog query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum QueryShape {
    /// Flight count per (origin, destination) pair
    RouteFlightCounts,
    /// Distinct journeys per numeric flight id
    FlightFeedbackCounts,
    /// Multi-leg journey count and mean food score per generation
    MultiLegSatisfaction,
    /// Mean arrival delay per numeric flight id
    FlightArrivalDelays,
    /// Mean flown miles per loyalty level
    LoyaltyMileage,
}

/// A parameter-free catalog query
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogQuery {
    pub number: u8,
    pub title: &'static str,
    pub shape: QueryShape,
    pub columns: &'static [&'static str],
    pub order_by: &'static [SortKey],
    pub limit: Option<usize>,
    pub cypher: &'static str,
}

/// The five standard queries, in catalog order
pub static STANDARD_QUERIES: [CatalogQuery; 5] = [
    CatalogQuery {
        number: 1,
        title: "Top routes by outbound flight count",
        shape: QueryShape::RouteFlightCounts,
        columns: &["origin", "destination", "flight_count"],
        order_by: &[desc("flight_count"), desc("origin")],
        limit: Some(5),
        cypher: "\
MATCH (f:Flight)-[:DEPARTS_FROM]->(origin:Airport)
MATCH (f)-[:ARRIVES_AT]->(dest:Airport)
RETURN origin.station_code AS origin,
       dest.station_code AS destination,
       count(f) AS flight_count
ORDER BY flight_count DESC, origin DESC
LIMIT 5",
    },
    CatalogQuery {
        number: 2,
        title: "Flights with the most feedback",
        shape: QueryShape::FlightFeedbackCounts,
        columns: &["flight_id", "feedback_count"],
        order_by: &[desc("feedback_count")],
        limit: Some(10),
        cypher: "\
MATCH (j:Journey)-[:ON]->(f:Flight)
RETURN toInteger(f.flight_number) AS flight_id,
       count(DISTINCT j) AS feedback_count
ORDER BY feedback_count DESC
LIMIT 10",
    },
    CatalogQuery {
        number: 3,
        title: "Multi-leg journeys and food satisfaction by generation",
        shape: QueryShape::MultiLegSatisfaction,
        columns: &["generation", "multi_leg_count", "avg_score"],
        order_by: &[desc("multi_leg_count")],
        limit: None,
        cypher: "\
MATCH (p:Passenger)-[:TOOK]->(j:Journey)
WHERE j.number_of_legs > 1
RETURN p.generation AS generation,
       count(j) AS multi_leg_count,
       avg(j.food_satisfaction_score) AS avg_score
ORDER BY multi_leg_count DESC",
    },
    CatalogQuery {
        number: 4,
        title: "Flights arriving earliest on average",
        shape: QueryShape::FlightArrivalDelays,
        columns: &["flight_id", "avg_arrival_delay"],
        order_by: &[asc("avg_arrival_delay")],
        limit: Some(10),
        cypher: "\
MATCH (j:Journey)-[:ON]->(f:Flight)
RETURN toInteger(f.flight_number) AS flight_id,
       avg(j.arrival_delay_minutes) AS avg_arrival_delay
ORDER BY avg_arrival_delay ASC
LIMIT 10",
    },
    CatalogQuery {
        number: 5,
        title: "Average flown miles by loyalty level",
        shape: QueryShape::LoyaltyMileage,
        columns: &["loyalty_level", "avg_actual_flown_miles"],
        order_by: &[desc("avg_actual_flown_miles")],
        limit: None,
        cypher: "\
MATCH (p:Passenger)-[:TOOK]->(j:Journey)
RETURN p.loyalty_program_level AS loyalty_level,
       avg(j.actual_flown_miles) AS avg_actual_flown_miles
ORDER BY avg_actual_flown_miles DESC",
    },
];

/// Ordered collection of catalog queries
#[derive(Debug, Clone)]
pub struct QueryCatalog {
    queries: Vec<CatalogQuery>,
}

impl QueryCatalog {
    /// The five standard queries
    pub fn standard() -> Self {
        Self {
            queries: STANDARD_QUERIES.to_vec(),
        }
    }

    pub fn get(&self, number: u8) -> Option<&CatalogQuery> {
        self.queries.iter().find(|q| q.number == number)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CatalogQuery> {
        self.queries.iter()
    }

    pub fn len(&self) -> usize {
        self.queries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }
}

impl Default for QueryCatalog {
    fn default() -> Self {
        Self::standard()
    }
}
