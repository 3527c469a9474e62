//! Connection configuration.

use serde::{Deserialize, Serialize};

use crate::error::{PMongoError, PMongoResult};

/// Read preference requested from the driver.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReadMode {
    /// Reads go to the primary.
    #[default]
    Primary,
    /// Reads go to a secondary when one is available.
    SecondaryPreferred,
}

/// Configuration for a single logical database.
///
/// Deserializes from camelCase keys, so it can live in an application config file:
///
/// ```json
/// { "hostUrl": "mongodb://localhost:27017", "dbName": "root-db", "readMode": "secondaryPreferred" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionConfig {
    pub host_url: String,
    pub db_name: String,
    #[serde(default)]
    pub read_mode: ReadMode,
}

impl ConnectionConfig {
    pub fn new(host_url: impl Into<String>, db_name: impl Into<String>) -> Self {
        Self {
            host_url: host_url.into(),
            db_name: db_name.into(),
            read_mode: ReadMode::default(),
        }
    }

    pub fn with_read_mode(mut self, read_mode: ReadMode) -> Self {
        self.read_mode = read_mode;
        self
    }

    /// Checks that both the host URL and the database name are present.
    ///
    /// # Errors
    ///
    /// Returns [`PMongoError::Config`] if either is empty.
    pub fn validate(&self) -> PMongoResult<()> {
        if self.host_url.trim().is_empty() || self.db_name.trim().is_empty() {
            return Err(PMongoError::Config("missing host and db info".to_string()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_fields_are_rejected() {
        assert!(matches!(
            ConnectionConfig::new("", "root-db").validate(),
            Err(PMongoError::Config(_))
        ));
        assert!(matches!(
            ConnectionConfig::new("mongodb://localhost:27017", "").validate(),
            Err(PMongoError::Config(_))
        ));
        assert!(ConnectionConfig::new("mongodb://localhost:27017", "root-db").validate().is_ok());
    }

    #[test]
    fn deserializes_from_camel_case() {
        let config: ConnectionConfig = serde_json::from_str(
            r#"{ "hostUrl": "mongodb://db:27017", "dbName": "card-db", "readMode": "secondaryPreferred" }"#,
        )
        .unwrap();

        assert_eq!(config.db_name, "card-db");
        assert_eq!(config.read_mode, ReadMode::SecondaryPreferred);

        let config: ConnectionConfig =
            serde_json::from_str(r#"{ "hostUrl": "mongodb://db:27017", "dbName": "root-db" }"#).unwrap();
        assert_eq!(config.read_mode, ReadMode::Primary);
    }
}
