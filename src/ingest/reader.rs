//! CSV reading for survey files
//!
//! The whole file is read and normalized before the first write, so a bad
//! header or a bad row aborts the load with the store untouched.

use super::record::{JourneyRecord, RecordNormalizer};
use crate::error::{AirgraphError, AirgraphResult};
use csv::ReaderBuilder;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{debug, info};

/// A normalized survey file
#[derive(Debug, Clone, Default)]
pub struct SurveyDataset {
    columns: Vec<String>,
    records: Vec<JourneyRecord>,
}

impl SurveyDataset {
    /// Read a survey CSV from disk
    pub fn from_path(path: impl AsRef<Path>) -> AirgraphResult<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => AirgraphError::InputMissing(path.display().to_string()),
            _ => AirgraphError::Io(e),
        })?;

        info!("Reading {}...", path.display());
        Self::from_reader(BufReader::new(file))
    }

    /// Read a survey CSV from any reader
    pub fn from_reader<R: Read>(reader: R) -> AirgraphResult<Self> {
        let mut csv_reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let columns: Vec<String> = csv_reader.headers()?.iter().map(str::to_string).collect();
        let normalizer = RecordNormalizer::for_columns(&columns)?;

        let mut records = Vec::new();
        for (index, row) in csv_reader.records().enumerate() {
            let row = row?;
            // Header is line 1
            let line = row.position().map_or(index as u64 + 2, |p| p.line());
            let cells: Vec<&str> = row.iter().collect();
            records.push(normalizer.normalize(line, &cells)?);
        }

        debug!("Normalized {} records", records.len());
        Ok(Self { columns, records })
    }

    /// Build a dataset from already normalized records
    pub fn from_records(records: Vec<JourneyRecord>) -> Self {
        Self {
            columns: super::record::REQUIRED_COLUMNS.iter().map(|c| c.to_string()).collect(),
            records,
        }
    }

    /// Declared header
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Records in file order
    pub fn records(&self) -> &[JourneyRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<JourneyRecord> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
