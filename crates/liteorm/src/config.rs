//! Database configuration.

use crate::error::{OrmError, OrmResult};
use std::path::PathBuf;
use std::time::Duration;

/// Database name that opens a private in-memory database.
pub const IN_MEMORY: &str = ":memory:";

/// Configuration for opening a [`SqliteEngine`](crate::SqliteEngine).
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Database file name (or [`IN_MEMORY`]).
    pub database_name: String,
    /// Application-level schema version label.
    pub version: String,
    /// Free-form description. Defaults to `"<name>; Version: <version>"`.
    pub description: Option<String>,
    /// Emit executed SQL at `INFO` instead of `DEBUG`.
    pub debug: bool,
    /// How long SQLite waits on a locked database before failing.
    pub busy_timeout: Option<Duration>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            database_name: String::new(),
            version: "1.0".to_string(),
            description: None,
            debug: false,
            busy_timeout: None,
        }
    }
}

impl DatabaseConfig {
    /// Create a configuration for the named database.
    pub fn new(database_name: impl Into<String>) -> Self {
        Self {
            database_name: database_name.into(),
            ..Self::default()
        }
    }

    /// Configuration for a private in-memory database.
    pub fn in_memory() -> Self {
        Self::new(IN_MEMORY)
    }

    /// Set the version label.
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Set the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Toggle SQL echo at `INFO`.
    pub fn debug(mut self, enabled: bool) -> Self {
        self.debug = enabled;
        self
    }

    /// Set the busy timeout.
    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = Some(timeout);
        self
    }

    /// Effective description.
    pub fn description_or_default(&self) -> String {
        self.description
            .clone()
            .unwrap_or_else(|| format!("{}; Version: {}", self.database_name, self.version))
    }

    pub fn is_in_memory(&self) -> bool {
        self.database_name == IN_MEMORY
    }

    /// Path of the database file; `None` for in-memory databases.
    pub fn path(&self) -> Option<PathBuf> {
        (!self.is_in_memory()).then(|| PathBuf::from(&self.database_name))
    }

    /// Check required settings.
    pub fn validate(&self) -> OrmResult<()> {
        if self.database_name.trim().is_empty() {
            return Err(OrmError::configuration("Database name is required."));
        }
        Ok(())
    }
}
