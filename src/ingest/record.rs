//! Row normalization
//!
//! Turns one raw survey row into a [`JourneyRecord`]. Column presence is
//! checked once for the whole dataset when the normalizer is built, so
//! nothing downstream re-validates field presence.

use crate::error::{AirgraphError, AirgraphResult};
use serde::{Deserialize, Serialize};

/// Columns every survey file must declare
pub const REQUIRED_COLUMNS: [&str; 13] = [
    "origin_station_code",
    "destination_station_code",
    "flight_number",
    "fleet_type_description",
    "record_locator",
    "loyalty_program_level",
    "generation",
    "food_satisfaction_score",
    "arrival_delay_minutes",
    "actual_flown_miles",
    "number_of_legs",
    "passenger_class",
    "feedback_ID",
];

/// Cell contents read as "no value" in numeric columns
const MISSING_MARKERS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND",
    "1.#QNAN", "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// One fully typed survey row
///
/// Serialized field names are the column names, which are also the
/// parameter names of the upsert statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JourneyRecord {
    pub origin_station_code: String,
    pub destination_station_code: String,
    pub flight_number: String,
    pub fleet_type_description: String,

    pub record_locator: String,
    pub loyalty_program_level: String,
    pub generation: String,
    #[serde(rename = "feedback_ID")]
    pub feedback_id: String,

    pub food_satisfaction_score: i64,
    pub arrival_delay_minutes: i64,
    pub actual_flown_miles: i64,
    pub number_of_legs: i64,
    pub passenger_class: String,
}

// Positions into REQUIRED_COLUMNS
const ORIGIN: usize = 0;
const DESTINATION: usize = 1;
const FLIGHT_NUMBER: usize = 2;
const FLEET_TYPE: usize = 3;
const RECORD_LOCATOR: usize = 4;
const LOYALTY: usize = 5;
const GENERATION: usize = 6;
const FOOD_SCORE: usize = 7;
const ARRIVAL_DELAY: usize = 8;
const FLOWN_MILES: usize = 9;
const LEGS: usize = 10;
const PASSENGER_CLASS: usize = 11;
const FEEDBACK_ID: usize = 12;

/// Maps a declared header onto [`JourneyRecord`] fields
#[derive(Debug, Clone)]
pub struct RecordNormalizer {
    positions: [usize; REQUIRED_COLUMNS.len()],
}

impl RecordNormalizer {
    /// Build a normalizer for a header, failing with `SchemaMismatch` when
    /// any required column is absent. Extra columns are ignored; for a
    /// duplicated column the first occurrence wins.
    pub fn for_columns<S: AsRef<str>>(columns: &[S]) -> AirgraphResult<Self> {
        let mut positions = [0usize; REQUIRED_COLUMNS.len()];
        let mut missing = Vec::new();

        for (slot, required) in REQUIRED_COLUMNS.iter().enumerate() {
            match columns.iter().position(|c| c.as_ref() == *required) {
                Some(index) => positions[slot] = index,
                None => missing.push(required.to_string()),
            }
        }

        if !missing.is_empty() {
            return Err(AirgraphError::SchemaMismatch {
                missing,
                available: columns.iter().map(|c| c.as_ref().to_string()).collect(),
            });
        }

        Ok(Self { positions })
    }

    /// Normalize one row. `line` is only used in error reports.
    ///
    /// Cells past the end of a short row count as empty.
    pub fn normalize<S: AsRef<str>>(&self, line: u64, row: &[S]) -> AirgraphResult<JourneyRecord> {
        let cell = |slot: usize| row.get(self.positions[slot]).map_or("", |c| c.as_ref());
        let identity = |slot: usize| -> AirgraphResult<String> {
            let value = cell(slot);
            if value.trim().is_empty() {
                return Err(AirgraphError::InvalidRecord {
                    line,
                    field: REQUIRED_COLUMNS[slot].to_string(),
                    reason: "identity value is empty".to_string(),
                });
            }
            Ok(value.to_string())
        };
        let integer = |slot: usize| -> AirgraphResult<i64> {
            coerce_integer(cell(slot)).map_err(|reason| AirgraphError::InvalidRecord {
                line,
                field: REQUIRED_COLUMNS[slot].to_string(),
                reason,
            })
        };

        Ok(JourneyRecord {
            origin_station_code: identity(ORIGIN)?,
            destination_station_code: identity(DESTINATION)?,
            flight_number: identity(FLIGHT_NUMBER)?,
            fleet_type_description: identity(FLEET_TYPE)?,
            record_locator: identity(RECORD_LOCATOR)?,
            loyalty_program_level: cell(LOYALTY).to_string(),
            generation: cell(GENERATION).to_string(),
            feedback_id: identity(FEEDBACK_ID)?,
            food_satisfaction_score: integer(FOOD_SCORE)?,
            arrival_delay_minutes: integer(ARRIVAL_DELAY)?,
            actual_flown_miles: integer(FLOWN_MILES)?,
            number_of_legs: integer(LEGS)?,
            passenger_class: cell(PASSENGER_CLASS).to_string(),
        })
    }
}

/// Parse a numeric cell and truncate it toward zero.
///
/// Missing cells count as zero.
pub fn coerce_integer(raw: &str) -> Result<i64, String> {
    let trimmed = raw.trim();
    if MISSING_MARKERS.contains(&trimmed) {
        return Ok(0);
    }
    if let Ok(value) = trimmed.parse::<i64>() {
        return Ok(value);
    }
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() && value.abs() < i64::MAX as f64 => Ok(value.trunc() as i64),
        Ok(value) => Err(format!("{} is out of integer range", value)),
        Err(_) => Err(format!("'{}' is not a number", trimmed)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header() -> Vec<&'static str> {
        REQUIRED_COLUMNS.to_vec()
    }

    fn row() -> Vec<&'static str> {
        vec![
            "LAX", "IAX", "42", "B737-800", "AB12CD", "premier gold", "Boomer", "3", "-12.0",
            "2475", "2", "Economy", "F1",
        ]
    }

    #[test]
    fn test_normalize_row() {
        let normalizer = RecordNormalizer::for_columns(&header()).unwrap();
        let record = normalizer.normalize(2, &row()).unwrap();
        assert_eq!(record.origin_station_code, "LAX");
        assert_eq!(record.destination_station_code, "IAX");
        assert_eq!(record.flight_number, "42");
        assert_eq!(record.feedback_id, "F1");
        assert_eq!(record.food_satisfaction_score, 3);
        assert_eq!(record.arrival_delay_minutes, -12);
        assert_eq!(record.number_of_legs, 2);
        assert_eq!(record.passenger_class, "Economy");
    }

    #[test]
    fn test_column_order_does_not_matter() {
        let mut columns = header();
        let mut cells = row();
        columns.reverse();
        cells.reverse();
        columns.push("survey_date");
        cells.push("2024-01-01");

        let normalizer = RecordNormalizer::for_columns(&columns).unwrap();
        let record = normalizer.normalize(2, &cells).unwrap();
        assert_eq!(record.origin_station_code, "LAX");
        assert_eq!(record.feedback_id, "F1");
    }

    #[test]
    fn test_missing_column_is_schema_mismatch() {
        let columns: Vec<_> = header().into_iter().filter(|c| *c != "feedback_ID").collect();
        match RecordNormalizer::for_columns(&columns).unwrap_err() {
            AirgraphError::SchemaMismatch { missing, available } => {
                assert_eq!(missing, vec!["feedback_ID".to_string()]);
                assert_eq!(available.len(), 12);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_coercion_truncates_toward_zero() {
        assert_eq!(coerce_integer("3.9"), Ok(3));
        assert_eq!(coerce_integer("-3.9"), Ok(-3));
        assert_eq!(coerce_integer(" 17 "), Ok(17));
        assert_eq!(coerce_integer("1e3"), Ok(1000));
    }

    #[test]
    fn test_coercion_missing_is_zero() {
        assert_eq!(coerce_integer(""), Ok(0));
        assert_eq!(coerce_integer("NaN"), Ok(0));
        assert_eq!(coerce_integer("NA"), Ok(0));
    }

    #[test]
    fn test_coercion_rejects_text() {
        assert!(coerce_integer("late").is_err());
        assert!(coerce_integer("inf").is_err());
    }

    #[test]
    fn test_empty_identity_is_rejected() {
        let normalizer = RecordNormalizer::for_columns(&header()).unwrap();
        let mut cells = row();
        cells[FEEDBACK_ID] = " ";
        match normalizer.normalize(7, &cells).unwrap_err() {
            AirgraphError::InvalidRecord { line, field, .. } => {
                assert_eq!(line, 7);
                assert_eq!(field, "feedback_ID");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_short_row_defaults_numeric_to_zero() {
        let normalizer = RecordNormalizer::for_columns(&header()).unwrap();
        let mut columns = header();
        // feedback_ID first, so a row cut after the string columns keeps it
        columns.retain(|c| *c != "feedback_ID");
        columns.insert(0, "feedback_ID");
        let normalizer_short = RecordNormalizer::for_columns(&columns).unwrap();
        let cells = vec!["F9", "LAX", "IAX", "42", "B737", "AB12CD", "non-elite", "Gen Z"];
        let record = normalizer_short.normalize(3, &cells).unwrap();
        assert_eq!(record.food_satisfaction_score, 0);
        assert_eq!(record.number_of_legs, 0);
        assert_eq!(record.passenger_class, "");

        // In the declared order the same row is missing its feedback_ID
        assert!(normalizer.normalize(3, &cells).is_err());
    }

    #[test]
    fn test_record_serializes_with_column_names() {
        let normalizer = RecordNormalizer::for_columns(&header()).unwrap();
        let record = normalizer.normalize(2, &row()).unwrap();
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["feedback_ID"], "F1");
        assert_eq!(json["arrival_delay_minutes"], -12);
    }
}
