//! Configuration for store access and loading
//!
//! The store settings come from a `KEY=VALUE` text file. They are parsed once
//! into an immutable [`StoreConfig`] that each phase borrows.

use crate::error::{AirgraphError, AirgraphResult};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

/// Default number of records per upsert transaction
pub const DEFAULT_BATCH_SIZE: usize = 500;

/// Database used when the configuration does not name one
pub const DEFAULT_DATABASE: &str = "neo4j";

/// Store connection settings
#[derive(Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// HTTP base address of the store, e.g. `http://localhost:7474`
    pub uri: String,
    /// Basic-auth user
    pub username: String,
    /// Basic-auth password
    pub password: String,
    /// Target database name
    pub database: String,
}

impl StoreConfig {
    /// Read and parse a configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> AirgraphResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| AirgraphError::ConfigMissing {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&text)
    }

    /// Parse `KEY=VALUE` lines. The first `=` splits key from value.
    pub fn parse(text: &str) -> AirgraphResult<Self> {
        let entries = parse_entries(text);

        let required = |key: &str| -> AirgraphResult<String> {
            entries
                .get(key)
                .cloned()
                .ok_or_else(|| AirgraphError::ConfigInvalid(format!("missing key {}", key)))
        };

        let uri = required("URI")?;
        if !(uri.starts_with("http://") || uri.starts_with("https://")) {
            let hint = if uri.starts_with("bolt") || uri.starts_with("neo4j") {
                " (Bolt is not supported; use the HTTP port instead)"
            } else {
                ""
            };
            return Err(AirgraphError::ConfigInvalid(format!(
                "URI must be the store's HTTP address, e.g. http://localhost:7474, got {}{}",
                uri, hint
            )));
        }

        Ok(Self {
            uri: uri.trim_end_matches('/').to_string(),
            username: required("USERNAME")?,
            password: required("PASSWORD")?,
            database: entries
                .get("DATABASE")
                .filter(|db| !db.is_empty())
                .cloned()
                .unwrap_or_else(|| DEFAULT_DATABASE.to_string()),
        })
    }
}

// The password never reaches logs.
impl fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreConfig")
            .field("uri", &self.uri)
            .field("username", &self.username)
            .field("password", &"***")
            .field("database", &self.database)
            .finish()
    }
}

fn parse_entries(text: &str) -> HashMap<String, String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
        .collect()
}

/// Options for one load invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOptions {
    /// Records per transaction
    pub batch_size: usize,
    /// Remove every node and relationship before loading
    pub wipe_first: bool,
}

impl LoadOptions {
    /// Options with the given batch size and no wipe
    pub fn with_batch_size(batch_size: usize) -> Self {
        Self {
            batch_size,
            ..Self::default()
        }
    }

    /// Reject option combinations the loader cannot honor.
    pub fn validate(&self) -> AirgraphResult<()> {
        if self.batch_size == 0 {
            return Err(AirgraphError::ConfigInvalid(
                "batch size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            wipe_first: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_minimal_config() {
        let config = StoreConfig::parse(
            "URI=http://localhost:7474\nUSERNAME=neo4j\nPASSWORD=secret\n",
        )
        .unwrap();
        assert_eq!(config.uri, "http://localhost:7474");
        assert_eq!(config.username, "neo4j");
        assert_eq!(config.password, "secret");
        assert_eq!(config.database, DEFAULT_DATABASE);
    }

    #[test]
    fn test_first_equals_is_delimiter() {
        let config = StoreConfig::parse(
            "URI=http://db:7474/\nUSERNAME=reader\nPASSWORD=a=b=c\nDATABASE=airline\n",
        )
        .unwrap();
        assert_eq!(config.password, "a=b=c");
        assert_eq!(config.database, "airline");
        // Trailing slash is dropped so endpoint paths join cleanly
        assert_eq!(config.uri, "http://db:7474");
    }

    #[test]
    fn test_comments_and_noise_are_skipped() {
        let config = StoreConfig::parse(
            "# store\n\nnot a setting\nURI=https://x\nUSERNAME=u\nPASSWORD=p\n",
        )
        .unwrap();
        assert_eq!(config.uri, "https://x");
    }

    #[test]
    fn test_missing_key_is_invalid() {
        let err = StoreConfig::parse("URI=http://x\nUSERNAME=u\n").unwrap_err();
        match err {
            AirgraphError::ConfigInvalid(msg) => assert!(msg.contains("PASSWORD")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_bolt_uri_is_rejected() {
        let err = StoreConfig::parse("URI=neo4j://localhost:7687\nUSERNAME=u\nPASSWORD=p\n")
            .unwrap_err();
        match err {
            AirgraphError::ConfigInvalid(msg) => {
                assert!(msg.contains("http://localhost:7474"), "{msg}");
                assert!(msg.contains("neo4j://localhost:7687"), "{msg}");
                assert!(msg.contains("Bolt"), "{msg}");
            }
            other => panic!("unexpected error: {other}"),
        }

        let err = StoreConfig::parse("URI=localhost:7474\nUSERNAME=u\nPASSWORD=p\n").unwrap_err();
        match err {
            AirgraphError::ConfigInvalid(msg) => {
                assert!(msg.contains("http://localhost:7474"), "{msg}");
                assert!(!msg.contains("Bolt"), "{msg}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = StoreConfig::from_file(dir.path().join("config.txt")).unwrap_err();
        assert!(matches!(err, AirgraphError::ConfigMissing { .. }));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "URI=http://localhost:7474").unwrap();
        writeln!(file, "USERNAME=neo4j").unwrap();
        writeln!(file, "PASSWORD=pw").unwrap();
        let config = StoreConfig::from_file(file.path()).unwrap();
        assert_eq!(config.username, "neo4j");
        assert!(!format!("{:?}", config).contains("pw"));
    }

    #[test]
    fn test_load_options() {
        assert_eq!(LoadOptions::default().batch_size, 500);
        assert!(LoadOptions::with_batch_size(1).validate().is_ok());
        assert!(LoadOptions::with_batch_size(0).validate().is_err());
    }
}
