//! Golden results for the catalog queries
//!
//! The built-in baseline holds the expected output for the airline survey
//! sample. Other baselines can be loaded from JSON of the form
//! `{"1": [{"origin": "LAX", ...}, ...], "2": [...]}`.

use crate::backend::ResultRow;
use crate::error::{AirgraphError, AirgraphResult};
use crate::graph::PropertyValue;
use std::collections::BTreeMap;
use std::path::Path;

/// Expected rows per catalog query number
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Baseline {
    expected: BTreeMap<u8, Vec<ResultRow>>,
}

macro_rules! row {
    ($($key:literal => $value:expr),* $(,)?) => {{
        let mut row = ResultRow::new();
        $( row.insert($key.to_string(), PropertyValue::from($value)); )*
        row
    }};
}

impl Baseline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Expected results for the airline survey sample
    pub fn survey_sample() -> Self {
        let mut baseline = Self::new();

        baseline.insert(1, vec![
            row! {"origin" => "LAX", "destination" => "IAX", "flight_count" => 21i64},
            row! {"origin" => "LAX", "destination" => "EWX", "flight_count" => 17i64},
            row! {"origin" => "IAX", "destination" => "LAX", "flight_count" => 17i64},
            row! {"origin" => "SAX", "destination" => "IAX", "flight_count" => 15i64},
            row! {"origin" => "IAX", "destination" => "EWX", "flight_count" => 14i64},
        ]);

        baseline.insert(2, vec![
            row! {"flight_id" => 42i64, "feedback_count" => 14i64},
            row! {"flight_id" => 19i64, "feedback_count" => 13i64},
            row! {"flight_id" => 86i64, "feedback_count" => 12i64},
            row! {"flight_id" => 27i64, "feedback_count" => 12i64},
            row! {"flight_id" => 966i64, "feedback_count" => 12i64},
            row! {"flight_id" => 57i64, "feedback_count" => 11i64},
            row! {"flight_id" => 1686i64, "feedback_count" => 11i64},
            row! {"flight_id" => 219i64, "feedback_count" => 11i64},
            row! {"flight_id" => 819i64, "feedback_count" => 9i64},
            row! {"flight_id" => 991i64, "feedback_count" => 9i64},
        ]);

        baseline.insert(3, vec![
            row! {"generation" => "Boomer", "multi_leg_count" => 498i64, "avg_score" => 2.7911646586345387},
            row! {"generation" => "Gen X", "multi_leg_count" => 285i64, "avg_score" => 2.999999999999999},
            row! {"generation" => "Millennial", "multi_leg_count" => 130i64, "avg_score" => 2.738461538461538},
            row! {"generation" => "Silent", "multi_leg_count" => 48i64, "avg_score" => 2.6874999999999996},
            row! {"generation" => "Gen Z", "multi_leg_count" => 18i64, "avg_score" => 3.2777777777777777},
        ]);

        baseline.insert(4, vec![
            row! {"flight_id" => 2442i64, "avg_arrival_delay" => -99.0},
            row! {"flight_id" => 274i64, "avg_arrival_delay" => -60.0},
            row! {"flight_id" => 425i64, "avg_arrival_delay" => -59.0},
            row! {"flight_id" => 982i64, "avg_arrival_delay" => -46.0},
            row! {"flight_id" => 120i64, "avg_arrival_delay" => -45.0},
            row! {"flight_id" => 1237i64, "avg_arrival_delay" => -44.0},
            row! {"flight_id" => 894i64, "avg_arrival_delay" => -42.5},
            row! {"flight_id" => 3546i64, "avg_arrival_delay" => -42.0},
            row! {"flight_id" => 942i64, "avg_arrival_delay" => -41.333333333333336},
            row! {"flight_id" => 828i64, "avg_arrival_delay" => -41.0},
        ]);

        baseline.insert(5, vec![
            row! {"loyalty_level" => "global services", "avg_actual_flown_miles" => 2648.083333333333},
            row! {"loyalty_level" => "premier gold", "avg_actual_flown_miles" => 2461.018518518519},
            row! {"loyalty_level" => "premier platinum", "avg_actual_flown_miles" => 2420.5714285714294},
            row! {"loyalty_level" => "non-elite", "avg_actual_flown_miles" => 2254.072},
            row! {"loyalty_level" => "premier silver", "avg_actual_flown_miles" => 2068.673529411763},
            row! {"loyalty_level" => "NBK", "avg_actual_flown_miles" => 1989.0},
            row! {"loyalty_level" => "premier 1k", "avg_actual_flown_miles" => 1897.6666666666672},
        ]);

        baseline
    }

    /// Read a baseline from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> AirgraphResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => AirgraphError::InputMissing(path.display().to_string()),
            _ => AirgraphError::Io(e),
        })?;
        Self::from_json_str(&text)
    }

    /// Parse a baseline from JSON text. JSON numbers written with a
    /// fraction or exponent are floats, all others integers.
    pub fn from_json_str(text: &str) -> AirgraphResult<Self> {
        let raw: BTreeMap<String, Vec<ResultRow>> = serde_json::from_str(text)?;
        let mut baseline = Self::new();
        for (key, rows) in raw {
            let number = key.trim().parse::<u8>().map_err(|_| {
                AirgraphError::ConfigInvalid(format!("baseline key '{}' is not a query number", key))
            })?;
            baseline.insert(number, rows);
        }
        Ok(baseline)
    }

    pub fn insert(&mut self, number: u8, rows: Vec<ResultRow>) {
        self.expected.insert(number, rows);
    }

    /// Expected rows for a query, if the baseline covers it
    pub fn expected(&self, number: u8) -> Option<&[ResultRow]> {
        self.expected.get(&number).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.expected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expected.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_survey_sample_covers_catalog() {
        let baseline = Baseline::survey_sample();
        assert_eq!(baseline.len(), 5);
        assert_eq!(baseline.expected(1).unwrap().len(), 5);
        assert_eq!(baseline.expected(2).unwrap().len(), 10);
        assert_eq!(baseline.expected(4).unwrap().len(), 10);
        assert_eq!(baseline.expected(5).unwrap().len(), 7);
    }

    #[test]
    fn test_sample_value_types() {
        let baseline = Baseline::survey_sample();
        let first = &baseline.expected(1).unwrap()[0];
        assert_eq!(first["origin"], PropertyValue::from("LAX"));
        assert_eq!(first["flight_count"], PropertyValue::Integer(21));
        // Whole-valued means stay floats
        let nbk = &baseline.expected(5).unwrap()[5];
        assert_eq!(nbk["avg_actual_flown_miles"], PropertyValue::Float(1989.0));
    }

    #[test]
    fn test_from_json_keeps_number_kinds() {
        let baseline = Baseline::from_json_str(
            r#"{"4": [{"flight_id": 2442, "avg_arrival_delay": -99.0}]}"#,
        )
        .unwrap();
        let row = &baseline.expected(4).unwrap()[0];
        assert_eq!(row["flight_id"], PropertyValue::Integer(2442));
        assert_eq!(row["avg_arrival_delay"], PropertyValue::Float(-99.0));
        assert!(baseline.expected(1).is_none());
    }

    #[test]
    fn test_from_json_rejects_bad_key() {
        assert!(Baseline::from_json_str(r#"{"first": []}"#).is_err());
    }
}
