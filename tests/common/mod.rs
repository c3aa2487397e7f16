#![allow(dead_code)]

use airgraph::graph::GraphStore;
use airgraph::ingest::{JourneyRecord, SurveyDataset, REQUIRED_COLUMNS};
use airgraph::{GraphLoader, LoadOptions, LoadSummary, MemoryBackend};
use airgraph::ingest::RecordingObserver;
use std::io::Write;
use tempfile::NamedTempFile;

/// A survey row with plausible defaults
pub fn row(feedback: &str) -> JourneyRecord {
    JourneyRecord {
        origin_station_code: "LAX".into(),
        destination_station_code: "IAX".into(),
        flight_number: "42".into(),
        fleet_type_description: "B737-800".into(),
        record_locator: format!("LOC{feedback}"),
        loyalty_program_level: "non-elite".into(),
        generation: "Boomer".into(),
        feedback_id: feedback.into(),
        food_satisfaction_score: 3,
        arrival_delay_minutes: 0,
        actual_flown_miles: 1500,
        number_of_legs: 1,
        passenger_class: "Economy".into(),
    }
}

/// Render records as survey CSV text
pub fn to_csv(records: &[JourneyRecord]) -> String {
    let mut text = REQUIRED_COLUMNS.join(",");
    text.push('\n');
    for r in records {
        let cells = [
            r.origin_station_code.clone(),
            r.destination_station_code.clone(),
            r.flight_number.clone(),
            r.fleet_type_description.clone(),
            r.record_locator.clone(),
            r.loyalty_program_level.clone(),
            r.generation.clone(),
            r.food_satisfaction_score.to_string(),
            r.arrival_delay_minutes.to_string(),
            r.actual_flown_miles.to_string(),
            r.number_of_legs.to_string(),
            r.passenger_class.clone(),
            r.feedback_id.clone(),
        ];
        text.push_str(&cells.join(","));
        text.push('\n');
    }
    text
}

pub fn write_temp(text: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(text.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

pub async fn load(backend: &MemoryBackend, records: Vec<JourneyRecord>, options: &LoadOptions) -> LoadSummary {
    let observer = RecordingObserver::new();
    GraphLoader::new(options, &observer)
        .load(backend, SurveyDataset::from_records(records))
        .await
        .unwrap()
}

/// Counts and every attribute of every node, in a comparable form
pub fn fingerprint(graph: &GraphStore) -> Vec<String> {
    use airgraph::NodeKind;

    let mut lines = vec![format!("nodes={} edges={}", graph.node_count(), graph.edge_count())];
    for kind in NodeKind::ALL {
        let mut nodes: Vec<String> = graph
            .nodes_by_kind(kind)
            .map(|node| {
                let mut props: Vec<String> = node
                    .properties
                    .iter()
                    .map(|(k, v)| format!("{k}={v}"))
                    .collect();
                props.sort();
                format!("{kind}: {}", props.join(" "))
            })
            .collect();
        nodes.sort();
        lines.extend(nodes);
    }
    lines
}
