//! SQLite storage engine backed by `rusqlite`.
//!
//! A single connection is shared behind `Arc<Mutex<_>>`. Every call is moved to
//! tokio's blocking pool so the async caller never blocks on SQLite I/O.

use crate::config::DatabaseConfig;
use crate::engine::{Row, Rows, Statement, StorageEngine};
use crate::error::{OrmError, OrmResult};
use crate::value::SqlValue;
use rusqlite::Connection;
use std::future::Future;
use std::sync::{Arc, Mutex};

/// [`StorageEngine`] over one SQLite connection.
#[derive(Clone)]
pub struct SqliteEngine {
    conn: Arc<Mutex<Connection>>,
    echo: bool,
}

impl std::fmt::Debug for SqliteEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteEngine")
            .field("echo", &self.echo)
            .finish_non_exhaustive()
    }
}

impl SqliteEngine {
    /// Open (or create) the database described by `config`.
    pub fn open(config: &DatabaseConfig) -> OrmResult<Self> {
        config.validate()?;

        let conn = match config.path() {
            Some(path) => Connection::open(path)?,
            None => Connection::open_in_memory()?,
        };
        if let Some(timeout) = config.busy_timeout {
            conn.busy_timeout(timeout)?;
        }

        tracing::debug!(
            target: "liteorm",
            database = %config.database_name,
            description = %config.description_or_default(),
            "database opened"
        );

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            echo: config.debug,
        })
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> OrmResult<Self> {
        Self::open(&DatabaseConfig::in_memory())
    }

    /// Wrap an already opened connection.
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
            echo: false,
        }
    }

    fn with_connection<T, F>(&self, f: F) -> impl Future<Output = OrmResult<T>> + Send + use<T, F>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> OrmResult<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        async move {
            tokio::task::spawn_blocking(move || {
                let mut guard = conn
                    .lock()
                    .map_err(|_| OrmError::Connection("connection mutex poisoned".to_string()))?;
                f(&mut guard)
            })
            .await?
        }
    }
}

impl StorageEngine for SqliteEngine {
    fn execute_sql(
        &self,
        sql: &str,
        params: &[SqlValue],
    ) -> impl Future<Output = OrmResult<Rows>> + Send {
        let statement = Statement::new(sql, params.to_vec());
        let echo = self.echo;
        self.with_connection(move |conn| {
            log_sql(echo, &statement);
            run_statement(conn, &statement)
        })
    }

    fn transaction(
        &self,
        statements: Vec<Statement>,
    ) -> impl Future<Output = OrmResult<Vec<Rows>>> + Send {
        let echo = self.echo;
        self.with_connection(move |conn| {
            // Dropping `tx` on an early return rolls back.
            let tx = conn.transaction()?;
            let mut results = Vec::with_capacity(statements.len());
            for statement in &statements {
                log_sql(echo, statement);
                results.push(run_statement(&tx, statement)?);
            }
            tx.commit()?;
            Ok(results)
        })
    }
}

fn log_sql(echo: bool, statement: &Statement) {
    let param_count = statement.params.len();
    if echo {
        tracing::info!(target: "liteorm.sql", param_count, sql = %statement.sql);
    } else {
        tracing::debug!(target: "liteorm.sql", param_count, sql = %statement.sql);
    }
}

fn run_statement(conn: &Connection, statement: &Statement) -> OrmResult<Rows> {
    let mut stmt = conn.prepare(&statement.sql)?;
    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

    let mut rows = stmt.query(rusqlite::params_from_iter(statement.params.iter()))?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        let mut record = Row::new();
        for (idx, column) in columns.iter().enumerate() {
            record.push(column.clone(), row.get::<_, SqlValue>(idx)?);
        }
        out.push(record);
    }

    let rows_affected = if columns.is_empty() { conn.changes() } else { 0 };
    Ok(Rows::new(out, rows_affected))
}
