//! Verify phase: run the catalog and compare against a baseline
//!
//! A query passes when it returns exactly as many rows as expected and
//! every expected field agrees with the actual row at the same position.
//! Floating-point expectations use a relative tolerance; everything else
//! must match exactly, type included.

use crate::backend::{GraphBackend, GraphSession, ResultRow};
use crate::catalog::{Baseline, CatalogQuery, QueryCatalog};
use crate::error::AirgraphResult;
use crate::graph::PropertyValue;
use serde::Serialize;
use tracing::{debug, info, warn};

/// Relative tolerance for floating-point comparisons
pub const RELATIVE_TOLERANCE: f64 = 1e-9;

/// `|a - b| <= tol * max(|a|, |b|)`
pub fn is_close(a: f64, b: f64) -> bool {
    if a == b {
        return true;
    }
    if !a.is_finite() || !b.is_finite() {
        return false;
    }
    (a - b).abs() <= RELATIVE_TOLERANCE * a.abs().max(b.abs())
}

/// Whether an actual value satisfies an expected one
pub fn values_agree(expected: &PropertyValue, actual: &PropertyValue) -> bool {
    match (expected, actual) {
        (PropertyValue::Float(e), PropertyValue::Float(a)) => is_close(*e, *a),
        (PropertyValue::Float(e), PropertyValue::Integer(a)) => is_close(*e, *a as f64),
        _ => expected == actual,
    }
}

/// One field that did not agree
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldMismatch {
    pub row: usize,
    pub field: String,
    pub expected: PropertyValue,
    /// `None` when the actual row lacks the field
    pub actual: Option<PropertyValue>,
}

/// How a query's result compared with its baseline
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Verdict {
    Passed,
    LengthMismatch { expected: usize, actual: usize },
    ValueMismatch { mismatches: Vec<FieldMismatch> },
    NoBaseline,
}

/// Compare actual rows against expected rows position by position
pub fn compare_rows(expected: &[ResultRow], actual: &[ResultRow]) -> Verdict {
    if expected.len() != actual.len() {
        return Verdict::LengthMismatch {
            expected: expected.len(),
            actual: actual.len(),
        };
    }

    let mut mismatches = Vec::new();
    for (row, (want, got)) in expected.iter().zip(actual).enumerate() {
        for (field, value) in want {
            let found = got.get(field);
            if !found.is_some_and(|a| values_agree(value, a)) {
                mismatches.push(FieldMismatch {
                    row,
                    field: field.clone(),
                    expected: value.clone(),
                    actual: found.cloned(),
                });
            }
        }
    }

    if mismatches.is_empty() {
        Verdict::Passed
    } else {
        Verdict::ValueMismatch { mismatches }
    }
}

/// Outcome of one catalog query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryReport {
    pub number: u8,
    pub title: String,
    pub verdict: Verdict,
    pub actual: Vec<ResultRow>,
}

impl QueryReport {
    pub fn passed(&self) -> bool {
        self.verdict == Verdict::Passed
    }

    /// Distinct row positions with at least one mismatch
    pub fn mismatched_rows(&self) -> Vec<usize> {
        match &self.verdict {
            Verdict::ValueMismatch { mismatches } => {
                let mut rows: Vec<usize> = mismatches.iter().map(|m| m.row).collect();
                rows.dedup();
                rows
            }
            _ => Vec::new(),
        }
    }
}

/// Reports for a whole catalog run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationSummary {
    pub reports: Vec<QueryReport>,
}

impl ValidationSummary {
    pub fn all_passed(&self) -> bool {
        self.reports.iter().all(QueryReport::passed)
    }

    pub fn passed_count(&self) -> usize {
        self.reports.iter().filter(|r| r.passed()).count()
    }

    pub fn failed(&self) -> impl Iterator<Item = &QueryReport> {
        self.reports.iter().filter(|r| !r.passed())
    }
}

/// Runs the catalog in order and checks each result
pub struct ResultValidator {
    catalog: QueryCatalog,
    baseline: Baseline,
}

impl ResultValidator {
    pub fn new(catalog: QueryCatalog, baseline: Baseline) -> Self {
        Self { catalog, baseline }
    }

    /// The standard catalog against the survey sample baseline
    pub fn survey_sample() -> Self {
        Self::new(QueryCatalog::standard(), Baseline::survey_sample())
    }

    /// Open a session, run every query, close the session
    pub async fn validate(&self, backend: &dyn GraphBackend) -> AirgraphResult<ValidationSummary> {
        let mut session = backend.open_session().await?;
        let outcome = self.run(session.as_mut()).await;
        let closed = session.close().await;
        let summary = outcome?;
        closed?;
        Ok(summary)
    }

    /// Run every query on an open session. A query failing validation
    /// does not stop the run; a store error does.
    pub async fn run(&self, session: &mut dyn GraphSession) -> AirgraphResult<ValidationSummary> {
        let mut reports = Vec::with_capacity(self.catalog.len());
        for query in self.catalog.iter() {
            reports.push(self.check(session, query).await?);
        }

        let summary = ValidationSummary { reports };
        info!(
            "Validation finished: {}/{} queries passed",
            summary.passed_count(),
            summary.reports.len()
        );
        Ok(summary)
    }

    async fn check(&self, session: &mut dyn GraphSession, query: &CatalogQuery) -> AirgraphResult<QueryReport> {
        let actual = session.run_read(query).await?;
        let verdict = match self.baseline.expected(query.number) {
            Some(expected) => compare_rows(expected, &actual),
            None => {
                warn!("Query {}: no baseline", query.number);
                Verdict::NoBaseline
            }
        };

        match &verdict {
            Verdict::Passed => info!("Query {}: PASS", query.number),
            Verdict::LengthMismatch { expected, actual } => {
                info!("Query {}: FAIL (expected {} rows, got {})", query.number, expected, actual)
            }
            Verdict::ValueMismatch { mismatches } => {
                info!("Query {}: FAIL ({} field mismatches)", query.number, mismatches.len());
                for m in mismatches {
                    debug!(
                        "  row {} field '{}': expected {}, got {}",
                        m.row,
                        m.field,
                        m.expected,
                        m.actual.as_ref().map_or("<missing>".to_string(), |v| v.to_string())
                    );
                }
            }
            Verdict::NoBaseline => {}
        }

        Ok(QueryReport {
            number: query.number,
            title: query.title.to_string(),
            verdict,
            actual,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, PropertyValue)]) -> ResultRow {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn test_is_close_relative() {
        assert!(is_close(2.7911646586345387, 2.791164658634539));
        assert!(!is_close(2.79, 2.80));
        assert!(is_close(0.0, 0.0));
        assert!(!is_close(0.0, 1e-12));
        assert!(!is_close(f64::NAN, f64::NAN));
    }

    #[test]
    fn test_values_agree_types() {
        use PropertyValue::*;
        assert!(values_agree(&Float(1989.0), &Integer(1989)));
        assert!(!values_agree(&Integer(21), &Float(21.0)));
        assert!(values_agree(&String("LAX".into()), &String("LAX".into())));
        assert!(!values_agree(&String("LAX".into()), &String("lax".into())));
        assert!(!values_agree(&Integer(1), &Null));
        assert!(!values_agree(&Integer(42), &String("42".into())));
        assert!(!values_agree(&String("42".into()), &Integer(42)));
    }

    #[test]
    fn test_numeric_string_does_not_match_integer() {
        let expected = vec![row(&[("flight_id", PropertyValue::Integer(42))])];
        let actual = vec![row(&[("flight_id", PropertyValue::from("42"))])];
        assert_eq!(
            compare_rows(&expected, &actual),
            Verdict::ValueMismatch {
                mismatches: vec![FieldMismatch {
                    row: 0,
                    field: "flight_id".into(),
                    expected: PropertyValue::Integer(42),
                    actual: Some(PropertyValue::from("42")),
                }],
            }
        );
    }

    #[test]
    fn test_compare_tolerates_float_noise() {
        let expected = vec![row(&[("generation", "Boomer".into()), ("avg_score", 2.7911646586345387.into())])];
        let actual = vec![row(&[("generation", "Boomer".into()), ("avg_score", 2.791164658634539.into())])];
        assert_eq!(compare_rows(&expected, &actual), Verdict::Passed);
    }

    #[test]
    fn test_compare_collects_every_mismatch() {
        let expected = vec![
            row(&[("flight_id", 42i64.into()), ("feedback_count", 14i64.into())]),
            row(&[("flight_id", 19i64.into()), ("feedback_count", 13i64.into())]),
        ];
        let actual = vec![
            row(&[("flight_id", 42i64.into()), ("feedback_count", 15i64.into())]),
            row(&[("flight_id", 20i64.into())]),
        ];
        match compare_rows(&expected, &actual) {
            Verdict::ValueMismatch { mismatches } => {
                assert_eq!(mismatches.len(), 3);
                assert_eq!(mismatches[2].field, "feedback_count");
                assert_eq!(mismatches[2].actual, None);
            }
            other => panic!("unexpected verdict {other:?}"),
        }
    }

    #[test]
    fn test_compare_length_first() {
        let expected = vec![row(&[("x", 1i64.into())]); 5];
        let actual = vec![row(&[("x", 1i64.into())]); 4];
        assert_eq!(
            compare_rows(&expected, &actual),
            Verdict::LengthMismatch { expected: 5, actual: 4 }
        );
    }

    #[test]
    fn test_small_float_difference_fails() {
        let expected = vec![row(&[("avg_score", 2.79.into())])];
        let actual = vec![row(&[("avg_score", 2.80.into())])];
        assert!(matches!(compare_rows(&expected, &actual), Verdict::ValueMismatch { .. }));
    }

    #[test]
    fn test_mismatched_rows() {
        let report = QueryReport {
            number: 1,
            title: "t".into(),
            verdict: Verdict::ValueMismatch {
                mismatches: vec![
                    FieldMismatch { row: 0, field: "a".into(), expected: 1i64.into(), actual: None },
                    FieldMismatch { row: 0, field: "b".into(), expected: 1i64.into(), actual: None },
                    FieldMismatch { row: 3, field: "a".into(), expected: 1i64.into(), actual: None },
                ],
            },
            actual: Vec::new(),
        };
        assert!(!report.passed());
        assert_eq!(report.mismatched_rows(), vec![0, 3]);
    }
}
