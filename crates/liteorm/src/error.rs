//! Error types for liteorm

use serde::Serialize;
use thiserror::Error;

/// Result type alias for liteorm operations
pub type OrmResult<T> = Result<T, OrmError>;

/// Error types for database operations
#[derive(Debug, Error)]
pub enum OrmError {
    /// Missing or invalid setup, raised before any statement is issued
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Connection error (poisoned lock, blocking task failure)
    #[error("Connection error: {0}")]
    Connection(String),

    /// Raw SQLite error
    #[error("Query error: {0}")]
    Query(#[from] rusqlite::Error),

    /// Storage failure normalized at an operation boundary
    #[error("{message} ({source})")]
    Storage {
        message: String,
        #[source]
        source: Box<OrmError>,
    },

    /// The `uuid` key was not set before an update/delete
    #[error("Missing key: {0}")]
    MissingKey(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl OrmError {
    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Wrap an engine failure with the message of the operation that hit it.
    pub fn storage(message: impl Into<String>, source: OrmError) -> Self {
        Self::Storage {
            message: message.into(),
            source: Box::new(source),
        }
    }

    /// Check if this is a configuration error
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    /// Check if this error came from the storage layer.
    ///
    /// A missing `uuid` key counts: update/delete refuse to run rather than touch every row.
    pub fn is_storage(&self) -> bool {
        !self.is_configuration()
    }

    /// HTTP-like status code used in the response envelope.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Configuration(_) => 400,
            _ => 500,
        }
    }

    /// Message surfaced to callers in the response envelope.
    pub fn message(&self) -> String {
        match self {
            Self::Storage { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    /// Render this error in the same envelope shape successful operations resolve to.
    pub fn response(&self) -> QueryResponse<serde_json::Value> {
        QueryResponse {
            status_code: self.status_code(),
            message: self.message(),
            data: serde_json::Value::Null,
        }
    }
}

impl From<serde_json::Error> for OrmError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<tokio::task::JoinError> for OrmError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Connection(format!("blocking task failed: {err}"))
    }
}

/// Envelope returned by every terminal builder operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResponse<T> {
    pub status_code: u16,
    pub message: String,
    pub data: T,
}

impl<T> QueryResponse<T> {
    /// A `200` response.
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            status_code: 200,
            message: message.into(),
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_error_keeps_operation_message() {
        let err = OrmError::storage("Data insertion error.", OrmError::Other("disk I/O".into()));
        assert!(err.is_storage());
        assert_eq!(err.status_code(), 500);
        assert_eq!(err.message(), "Data insertion error.");
        assert_eq!(err.to_string(), "Data insertion error. (disk I/O)");
    }

    #[test]
    fn configuration_error_envelope() {
        let resp = OrmError::configuration("Table name is required.").response();
        assert_eq!(resp.status_code, 400);
        assert_eq!(resp.message, "Configuration error: Table name is required.");
        assert_eq!(resp.data, serde_json::Value::Null);
    }

    #[test]
    fn response_serializes_camel_case() {
        let resp = QueryResponse::ok("Successful query", vec![1, 2]);
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["statusCode"], 200);
        assert_eq!(json["data"], serde_json::json!([1, 2]));
    }
}
