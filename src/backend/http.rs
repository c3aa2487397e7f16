//! HttpBackend: Neo4j-compatible server over the HTTP transaction API
//!
//! Every session call is posted to `{uri}/db/{database}/tx/commit`, which
//! runs its statements in one implicit transaction and commits them together.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{GraphBackend, GraphSession, ResultRow};
use crate::catalog::CatalogQuery;
use crate::config::StoreConfig;
use crate::error::{AirgraphError, AirgraphResult};
use crate::graph::PropertyValue;
use crate::ingest::{JourneyRecord, SchemaDeclaration, UPSERT_CYPHER};

/// Statement that removes every node and relationship
pub const WIPE_CYPHER: &str = "MATCH (n) DETACH DELETE n";

/// Request body of the transaction endpoint
#[derive(Debug, Serialize)]
pub struct TxRequest {
    pub statements: Vec<TxStatement>,
}

#[derive(Debug, Serialize)]
pub struct TxStatement {
    pub statement: String,
    pub parameters: serde_json::Value,
    #[serde(rename = "resultDataContents")]
    pub result_data_contents: Vec<&'static str>,
}

/// Response body of the transaction endpoint
#[derive(Debug, Deserialize)]
pub struct TxResponse {
    #[serde(default)]
    pub results: Vec<TxResult>,
    #[serde(default)]
    pub errors: Vec<TxError>,
}

#[derive(Debug, Deserialize)]
pub struct TxResult {
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub data: Vec<TxRow>,
}

#[derive(Debug, Deserialize)]
pub struct TxRow {
    #[serde(default)]
    pub row: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct TxError {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}

/// Build a single-statement request
pub fn build_request(statement: &str, parameters: serde_json::Value) -> TxRequest {
    TxRequest {
        statements: vec![TxStatement {
            statement: statement.to_string(),
            parameters,
            result_data_contents: vec!["row"],
        }],
    }
}

/// Decode a response body, turning server-reported errors into failures
pub fn parse_response(body: &str) -> AirgraphResult<TxResponse> {
    let response: TxResponse = serde_json::from_str(body)?;
    if !response.errors.is_empty() {
        let message = response
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.code, e.message))
            .collect::<Vec<_>>()
            .join("; ");
        return Err(AirgraphError::TransactionFailure(message));
    }
    Ok(response)
}

/// Credentials refused by the store. Retrying the same request cannot help.
pub fn auth_rejected(status: StatusCode, target: &str) -> Option<AirgraphError> {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Some(AirgraphError::StoreUnavailable(format!(
            "{} rejected the configured credentials ({})",
            target, status
        ))),
        _ => None,
    }
}

/// Zip column names with row values, in column order
pub fn decode_rows(result: &TxResult) -> Vec<ResultRow> {
    result
        .data
        .iter()
        .map(|data| {
            result
                .columns
                .iter()
                .cloned()
                .zip(data.row.iter().map(PropertyValue::from_json))
                .collect()
        })
        .collect()
}

/// Backend for a remote store
pub struct HttpBackend {
    config: StoreConfig,
    http_client: Client,
}

impl HttpBackend {
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config,
            http_client: Client::new(),
        }
    }

    fn base_url(&self) -> &str {
        self.config.uri.trim_end_matches('/')
    }

    fn commit_url(&self) -> String {
        format!("{}/db/{}/tx/commit", self.base_url(), self.config.database)
    }
}

#[async_trait]
impl GraphBackend for HttpBackend {
    async fn open_session(&self) -> AirgraphResult<Box<dyn GraphSession>> {
        let url = format!("{}/", self.base_url());
        let response = self
            .http_client
            .get(&url)
            .basic_auth(&self.config.username, Some(&self.config.password))
            .send()
            .await
            .map_err(|e| AirgraphError::StoreUnavailable(format!("{}: {}", self.describe(), e)))?;

        if let Some(e) = auth_rejected(response.status(), &self.describe()) {
            return Err(e);
        }
        if response.status().is_server_error() {
            return Err(AirgraphError::StoreUnavailable(format!(
                "{} answered {}",
                self.describe(),
                response.status()
            )));
        }

        debug!("Connected to {}", self.describe());
        Ok(Box::new(HttpSession {
            http_client: self.http_client.clone(),
            commit_url: self.commit_url(),
            username: self.config.username.clone(),
            password: self.config.password.clone(),
            closed: false,
        }))
    }

    fn describe(&self) -> String {
        format!("{} (database {})", self.base_url(), self.config.database)
    }
}

/// Session on an [`HttpBackend`]
pub struct HttpSession {
    http_client: Client,
    commit_url: String,
    username: String,
    password: String,
    closed: bool,
}

impl HttpSession {
    /// Post one statement in its own transaction
    async fn execute(&self, statement: &str, parameters: serde_json::Value) -> AirgraphResult<TxResponse> {
        if self.closed {
            return Err(AirgraphError::StoreUnavailable("session already closed".to_string()));
        }

        let request = build_request(statement, parameters);
        let response = self
            .http_client
            .post(&self.commit_url)
            .basic_auth(&self.username, Some(&self.password))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() || e.is_timeout() {
                    AirgraphError::StoreUnavailable(e.to_string())
                } else {
                    AirgraphError::Http(e)
                }
            })?;

        let status = response.status();
        if let Some(e) = auth_rejected(status, &self.commit_url) {
            return Err(e);
        }
        let body = response.text().await?;
        if !status.is_success() {
            warn!("Transaction endpoint answered {}", status);
            return match parse_response(&body) {
                Err(e) => Err(e),
                Ok(_) => Err(AirgraphError::TransactionFailure(format!("server answered {}", status))),
            };
        }
        parse_response(&body)
    }
}

#[async_trait]
impl GraphSession for HttpSession {
    async fn declare(&mut self, declaration: &SchemaDeclaration) -> AirgraphResult<()> {
        self.execute(&declaration.cypher(), serde_json::json!({})).await?;
        Ok(())
    }

    async fn write_batch(&mut self, batch: &[JourneyRecord]) -> AirgraphResult<()> {
        self.execute(UPSERT_CYPHER, serde_json::json!({ "batch": batch })).await?;
        Ok(())
    }

    async fn run_read(&mut self, query: &CatalogQuery) -> AirgraphResult<Vec<ResultRow>> {
        let response = self.execute(query.cypher, serde_json::json!({})).await?;
        Ok(response.results.first().map(decode_rows).unwrap_or_default())
    }

    async fn wipe(&mut self) -> AirgraphResult<()> {
        self.execute(WIPE_CYPHER, serde_json::json!({})).await?;
        Ok(())
    }

    async fn close(&mut self) -> AirgraphResult<()> {
        // Every call already committed; nothing is held server-side
        self.closed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(uri: &str) -> StoreConfig {
        StoreConfig::parse(&format!("URI={}\nUSERNAME=neo4j\nPASSWORD=secret\n", uri)).unwrap()
    }

    #[test]
    fn test_commit_url() {
        let backend = HttpBackend::new(config("http://localhost:7474/"));
        assert_eq!(backend.commit_url(), "http://localhost:7474/db/neo4j/tx/commit");
        assert!(backend.describe().contains("neo4j"));
    }

    #[test]
    fn test_build_request_shape() {
        let request = build_request("RETURN 1", serde_json::json!({"batch": []}));
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["statements"][0]["statement"], "RETURN 1");
        assert_eq!(body["statements"][0]["resultDataContents"][0], "row");
        assert!(body["statements"][0]["parameters"]["batch"].is_array());
    }

    #[test]
    fn test_batch_parameters_use_column_names() {
        let record = JourneyRecord {
            origin_station_code: "LAX".into(),
            destination_station_code: "IAX".into(),
            flight_number: "42".into(),
            fleet_type_description: "B737".into(),
            record_locator: "AB12CD".into(),
            loyalty_program_level: "non-elite".into(),
            generation: "Boomer".into(),
            feedback_id: "F1".into(),
            food_satisfaction_score: 3,
            arrival_delay_minutes: 0,
            actual_flown_miles: 100,
            number_of_legs: 1,
            passenger_class: "Economy".into(),
        };
        let params = serde_json::json!({ "batch": [record] });
        assert_eq!(params["batch"][0]["feedback_ID"], "F1");
        assert_eq!(params["batch"][0]["number_of_legs"], 1);
    }

    #[test]
    fn test_parse_response_rows() {
        let body = r#"{"results":[{"columns":["flight_id","avg_arrival_delay"],
            "data":[{"row":[2442,-99.0]},{"row":[274,-60.0]}]}],"errors":[]}"#;
        let response = parse_response(body).unwrap();
        let rows = decode_rows(&response.results[0]);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["flight_id"], PropertyValue::Integer(2442));
        assert_eq!(rows[0]["avg_arrival_delay"], PropertyValue::Float(-99.0));
        let columns: Vec<_> = rows[1].keys().cloned().collect();
        assert_eq!(columns, vec!["flight_id", "avg_arrival_delay"]);
    }

    #[test]
    fn test_parse_response_errors() {
        let body = r#"{"results":[],"errors":[{"code":"Neo.ClientError.Schema.ConstraintValidationFailed","message":"already exists"}]}"#;
        let err = parse_response(body).unwrap_err();
        match err {
            AirgraphError::TransactionFailure(msg) => assert!(msg.contains("ConstraintValidationFailed")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_auth_rejection_is_unavailable() {
        for status in [StatusCode::UNAUTHORIZED, StatusCode::FORBIDDEN] {
            match auth_rejected(status, "http://localhost:7474") {
                Some(AirgraphError::StoreUnavailable(msg)) => {
                    assert!(msg.contains("credentials"), "{msg}");
                    assert!(msg.contains(status.as_str()), "{msg}");
                }
                other => panic!("unexpected outcome for {status}: {other:?}"),
            }
        }
        assert!(auth_rejected(StatusCode::OK, "http://localhost:7474").is_none());
        assert!(auth_rejected(StatusCode::BAD_REQUEST, "http://localhost:7474").is_none());
    }

    #[tokio::test]
    async fn test_unreachable_store() {
        // Port 9 on loopback refuses connections
        let backend = HttpBackend::new(config("http://127.0.0.1:9"));
        let err = backend.open_session().await.err().unwrap();
        assert!(matches!(err, AirgraphError::StoreUnavailable(_)));
    }
}
