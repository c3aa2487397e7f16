//! Native evaluation of catalog queries over the in-process graph
//!
//! Follows Cypher aggregation semantics: rows are grouped by their returned
//! non-aggregate values, `count` yields Integer, `avg` yields Float (null
//! when it saw no values) and ignores nulls. Ordering is a stable sort on the
//! catalog's sort keys, so ties keep first-seen group order.

use super::ResultRow;
use crate::catalog::{CatalogQuery, Direction, QueryShape, SortKey};
use crate::graph::{GraphStore, NodeId, NodeKind, PropertyValue, RelKind};
use indexmap::IndexMap;
use rustc_hash::{FxBuildHasher, FxHashSet};
use std::cmp::Ordering;

/// Evaluate one catalog query: match, aggregate, order, limit.
pub fn evaluate(graph: &GraphStore, query: &CatalogQuery) -> Vec<ResultRow> {
    let mut rows = match query.shape {
        QueryShape::RouteFlightCounts => route_flight_counts(graph, query.columns),
        QueryShape::FlightFeedbackCounts => flight_feedback_counts(graph, query.columns),
        QueryShape::MultiLegSatisfaction => multi_leg_satisfaction(graph, query.columns),
        QueryShape::FlightArrivalDelays => flight_arrival_delays(graph, query.columns),
        QueryShape::LoyaltyMileage => loyalty_mileage(graph, query.columns),
    };
    sort_rows(&mut rows, query.order_by);
    if let Some(limit) = query.limit {
        rows.truncate(limit);
    }
    rows
}

fn route_flight_counts(graph: &GraphStore, columns: &[&str]) -> Vec<ResultRow> {
    let mut groups = Grouping::default();
    for flight in graph.nodes_by_kind(NodeKind::Flight) {
        for origin in graph.neighbors(flight.id, RelKind::DepartsFrom) {
            for dest in graph.neighbors(flight.id, RelKind::ArrivesAt) {
                groups
                    .entry(vec![
                        origin.property_or_null("station_code"),
                        dest.property_or_null("station_code"),
                    ])
                    .count_row();
            }
        }
    }
    groups.into_rows(columns, |acc| vec![acc.count()])
}

fn flight_feedback_counts(graph: &GraphStore, columns: &[&str]) -> Vec<ResultRow> {
    let mut groups = Grouping::default();
    for journey in graph.nodes_by_kind(NodeKind::Journey) {
        for flight in graph.neighbors(journey.id, RelKind::On) {
            groups
                .entry(vec![flight.property_or_null("flight_number").to_integer()])
                .count_distinct(journey.id);
        }
    }
    groups.into_rows(columns, |acc| vec![acc.distinct_count()])
}

fn multi_leg_satisfaction(graph: &GraphStore, columns: &[&str]) -> Vec<ResultRow> {
    let mut groups = Grouping::default();
    for passenger in graph.nodes_by_kind(NodeKind::Passenger) {
        for journey in graph.neighbors(passenger.id, RelKind::Took) {
            let legs = journey.property_or_null("number_of_legs");
            if !legs.as_number().is_some_and(|n| n > 1.0) {
                continue;
            }
            let acc = groups.entry(vec![passenger.property_or_null("generation")]);
            acc.count_row();
            acc.average(&journey.property_or_null("food_satisfaction_score"));
        }
    }
    groups.into_rows(columns, |acc| vec![acc.count(), acc.mean()])
}

fn flight_arrival_delays(graph: &GraphStore, columns: &[&str]) -> Vec<ResultRow> {
    let mut groups = Grouping::default();
    for journey in graph.nodes_by_kind(NodeKind::Journey) {
        for flight in graph.neighbors(journey.id, RelKind::On) {
            groups
                .entry(vec![flight.property_or_null("flight_number").to_integer()])
                .average(&journey.property_or_null("arrival_delay_minutes"));
        }
    }
    groups.into_rows(columns, |acc| vec![acc.mean()])
}

fn loyalty_mileage(graph: &GraphStore, columns: &[&str]) -> Vec<ResultRow> {
    let mut groups = Grouping::default();
    for passenger in graph.nodes_by_kind(NodeKind::Passenger) {
        for journey in graph.neighbors(passenger.id, RelKind::Took) {
            groups
                .entry(vec![passenger.property_or_null("loyalty_program_level")])
                .average(&journey.property_or_null("actual_flown_miles"));
        }
    }
    groups.into_rows(columns, |acc| vec![acc.mean()])
}

/// Hashable form of a grouping value
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum GroupPart {
    String(String),
    Integer(i64),
    Float(u64),
    Boolean(bool),
    Null,
}

impl From<&PropertyValue> for GroupPart {
    fn from(value: &PropertyValue) -> Self {
        match value {
            PropertyValue::String(s) => GroupPart::String(s.clone()),
            PropertyValue::Integer(i) => GroupPart::Integer(*i),
            PropertyValue::Float(f) => GroupPart::Float(f.to_bits()),
            PropertyValue::Boolean(b) => GroupPart::Boolean(*b),
            PropertyValue::Null => GroupPart::Null,
        }
    }
}

/// Aggregation state of one group
#[derive(Debug, Default)]
struct Accumulator {
    rows: i64,
    distinct: FxHashSet<NodeId>,
    running_mean: f64,
    samples: u64,
}

impl Accumulator {
    fn count_row(&mut self) {
        self.rows += 1;
    }

    fn count_distinct(&mut self, id: NodeId) {
        self.distinct.insert(id);
    }

    /// Running mean, updated one value at a time
    fn average(&mut self, value: &PropertyValue) {
        if let Some(x) = value.as_number() {
            self.samples += 1;
            self.running_mean += (x - self.running_mean) / self.samples as f64;
        }
    }

    fn count(&self) -> PropertyValue {
        PropertyValue::Integer(self.rows)
    }

    fn distinct_count(&self) -> PropertyValue {
        PropertyValue::Integer(self.distinct.len() as i64)
    }

    fn mean(&self) -> PropertyValue {
        if self.samples == 0 {
            PropertyValue::Null
        } else {
            PropertyValue::Float(self.running_mean)
        }
    }
}

/// Groups in first-seen order
#[derive(Default)]
struct Grouping {
    groups: IndexMap<Vec<GroupPart>, (Vec<PropertyValue>, Accumulator), FxBuildHasher>,
}

impl Grouping {
    fn entry(&mut self, keys: Vec<PropertyValue>) -> &mut Accumulator {
        let hashed: Vec<GroupPart> = keys.iter().map(GroupPart::from).collect();
        &mut self
            .groups
            .entry(hashed)
            .or_insert_with(|| (keys, Accumulator::default()))
            .1
    }

    /// One row per group: grouping values, then the aggregates
    fn into_rows(self, columns: &[&str], aggregates: impl Fn(&Accumulator) -> Vec<PropertyValue>) -> Vec<ResultRow> {
        self.groups
            .into_values()
            .map(|(keys, acc)| {
                columns
                    .iter()
                    .map(|c| c.to_string())
                    .zip(keys.into_iter().chain(aggregates(&acc)))
                    .collect()
            })
            .collect()
    }
}

/// Stable sort on the given keys
pub fn sort_rows(rows: &mut [ResultRow], order_by: &[SortKey]) {
    rows.sort_by(|a, b| {
        for key in order_by {
            let left = a.get(key.column).unwrap_or(&PropertyValue::Null);
            let right = b.get(key.column).unwrap_or(&PropertyValue::Null);
            let ordering = match key.direction {
                Direction::Ascending => compare_values(left, right),
                Direction::Descending => compare_values(left, right).reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    });
}

/// Cypher orderability: strings < booleans < numbers < null
pub fn compare_values(a: &PropertyValue, b: &PropertyValue) -> Ordering {
    fn rank(v: &PropertyValue) -> u8 {
        match v {
            PropertyValue::String(_) => 0,
            PropertyValue::Boolean(_) => 1,
            PropertyValue::Integer(_) | PropertyValue::Float(_) => 2,
            PropertyValue::Null => 3,
        }
    }

    match (a, b) {
        (PropertyValue::String(x), PropertyValue::String(y)) => x.cmp(y),
        (PropertyValue::Boolean(x), PropertyValue::Boolean(y)) => x.cmp(y),
        (PropertyValue::Integer(x), PropertyValue::Integer(y)) => x.cmp(y),
        (PropertyValue::Integer(_) | PropertyValue::Float(_), PropertyValue::Integer(_) | PropertyValue::Float(_)) => {
            let x = a.as_number().unwrap_or(f64::NAN);
            let y = b.as_number().unwrap_or(f64::NAN);
            x.total_cmp(&y)
        }
        _ => rank(a).cmp(&rank(b)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::memory::apply_record;
    use crate::catalog::QueryCatalog;
    use crate::ingest::JourneyRecord;

    fn journey(
        feedback: &str,
        route: (&str, &str),
        flight: (&str, &str),
        passenger: (&str, &str, &str),
        legs: i64,
        score: i64,
        delay: i64,
        miles: i64,
    ) -> JourneyRecord {
        JourneyRecord {
            origin_station_code: route.0.into(),
            destination_station_code: route.1.into(),
            flight_number: flight.0.into(),
            fleet_type_description: flight.1.into(),
            record_locator: passenger.0.into(),
            loyalty_program_level: passenger.1.into(),
            generation: passenger.2.into(),
            feedback_id: feedback.into(),
            food_satisfaction_score: score,
            arrival_delay_minutes: delay,
            actual_flown_miles: miles,
            number_of_legs: legs,
            passenger_class: "Economy".into(),
        }
    }

    fn graph(records: &[JourneyRecord]) -> GraphStore {
        let mut graph = GraphStore::new();
        for record in records {
            apply_record(&mut graph, record).unwrap();
        }
        graph
    }

    fn run(graph: &GraphStore, number: u8) -> Vec<ResultRow> {
        evaluate(graph, QueryCatalog::standard().get(number).unwrap())
    }

    #[test]
    fn test_route_counts_tie_break_on_origin_desc() {
        let g = graph(&[
            journey("F1", ("IAX", "LAX"), ("1", "A"), ("P1", "x", "y"), 1, 1, 0, 1),
            journey("F2", ("SAX", "LAX"), ("2", "A"), ("P1", "x", "y"), 1, 1, 0, 1),
            journey("F3", ("LAX", "EWX"), ("3", "A"), ("P1", "x", "y"), 1, 1, 0, 1),
            journey("F4", ("LAX", "EWX"), ("4", "A"), ("P1", "x", "y"), 1, 1, 0, 1),
        ]);
        let rows = run(&g, 1);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0]["origin"], PropertyValue::from("LAX"));
        assert_eq!(rows[0]["flight_count"], PropertyValue::Integer(2));
        // IAX and SAX tie on count; origin descending puts SAX first
        assert_eq!(rows[1]["origin"], PropertyValue::from("SAX"));
        assert_eq!(rows[2]["origin"], PropertyValue::from("IAX"));
        let columns: Vec<_> = rows[0].keys().cloned().collect();
        assert_eq!(columns, vec!["origin", "destination", "flight_count"]);
    }

    #[test]
    fn test_flight_id_groups_across_fleets() {
        let g = graph(&[
            journey("F1", ("LAX", "IAX"), ("42", "B737"), ("P1", "x", "y"), 1, 1, 0, 1),
            journey("F2", ("LAX", "IAX"), ("42", "A320"), ("P2", "x", "y"), 1, 1, 0, 1),
            journey("F3", ("LAX", "IAX"), ("7", "A320"), ("P3", "x", "y"), 1, 1, 0, 1),
        ]);
        let rows = run(&g, 2);
        assert_eq!(rows[0]["flight_id"], PropertyValue::Integer(42));
        assert_eq!(rows[0]["feedback_count"], PropertyValue::Integer(2));
        assert_eq!(rows[1]["flight_id"], PropertyValue::Integer(7));
    }

    #[test]
    fn test_multi_leg_filter_and_mean() {
        let g = graph(&[
            journey("F1", ("LAX", "IAX"), ("1", "A"), ("P1", "x", "Boomer"), 2, 3, 0, 1),
            journey("F2", ("LAX", "IAX"), ("1", "A"), ("P2", "x", "Boomer"), 3, 4, 0, 1),
            journey("F3", ("LAX", "IAX"), ("1", "A"), ("P3", "x", "Boomer"), 1, 1, 0, 1),
            journey("F4", ("LAX", "IAX"), ("1", "A"), ("P4", "x", "Gen Z"), 2, 5, 0, 1),
        ]);
        let rows = run(&g, 3);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["generation"], PropertyValue::from("Boomer"));
        assert_eq!(rows[0]["multi_leg_count"], PropertyValue::Integer(2));
        assert_eq!(rows[0]["avg_score"], PropertyValue::Float(3.5));
        assert_eq!(rows[1]["avg_score"], PropertyValue::Float(5.0));
    }

    #[test]
    fn test_arrival_delays_ascending_with_limit() {
        let records: Vec<_> = (0..12)
            .map(|i| {
                journey(
                    &format!("F{i}"),
                    ("LAX", "IAX"),
                    (i.to_string().as_str(), "A"),
                    ("P1", "x", "y"),
                    1,
                    1,
                    10 - i,
                    1,
                )
            })
            .collect();
        let rows = run(&graph(&records), 4);
        assert_eq!(rows.len(), 10);
        assert_eq!(rows[0]["flight_id"], PropertyValue::Integer(11));
        assert_eq!(rows[0]["avg_arrival_delay"], PropertyValue::Float(-1.0));
    }

    #[test]
    fn test_loyalty_mileage_descending() {
        let g = graph(&[
            journey("F1", ("LAX", "IAX"), ("1", "A"), ("P1", "non-elite", "y"), 1, 1, 0, 100),
            journey("F2", ("LAX", "IAX"), ("1", "A"), ("P2", "premier gold", "y"), 1, 1, 0, 300),
            journey("F3", ("LAX", "IAX"), ("1", "A"), ("P3", "non-elite", "y"), 1, 1, 0, 201),
        ]);
        let rows = run(&g, 5);
        assert_eq!(rows[0]["loyalty_level"], PropertyValue::from("premier gold"));
        assert_eq!(rows[1]["avg_actual_flown_miles"], PropertyValue::Float(150.5));
    }

    #[test]
    fn test_compare_values() {
        use PropertyValue::*;
        assert_eq!(compare_values(&Integer(2), &Float(2.5)), Ordering::Less);
        assert_eq!(compare_values(&String("b".into()), &String("a".into())), Ordering::Greater);
        assert_eq!(compare_values(&Null, &Integer(1)), Ordering::Greater);
        assert_eq!(compare_values(&String("z".into()), &Integer(1)), Ordering::Less);
    }

    #[test]
    fn test_empty_graph_yields_no_rows() {
        let g = GraphStore::new();
        for query in QueryCatalog::standard().iter() {
            assert!(evaluate(&g, query).is_empty());
        }
    }
}
