//! Storage engine contract consumed by the query builder.

use crate::error::OrmResult;
use crate::value::SqlValue;
use std::future::Future;

/// A rendered SQL statement and its positional (`?`) parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

impl Statement {
    pub fn new(sql: impl Into<String>, params: Vec<SqlValue>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }

    /// A statement without parameters.
    pub fn raw(sql: impl Into<String>) -> Self {
        Self::new(sql, Vec::new())
    }
}

/// One result row: column names and their stored values, in SELECT order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<String>,
    values: Vec<SqlValue>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `column` to `value`, replacing an existing entry in place.
    pub fn push(&mut self, column: impl Into<String>, value: SqlValue) {
        let column = column.into();
        match self.columns.iter().position(|c| *c == column) {
            Some(idx) => self.values[idx] = value,
            None => {
                self.columns.push(column);
                self.values.push(value);
            }
        }
    }

    pub fn get(&self, column: &str) -> Option<&SqlValue> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|idx| &self.values[idx])
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[SqlValue] {
        &self.values
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SqlValue)> {
        self.columns.iter().map(String::as_str).zip(self.values.iter())
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, SqlValue)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, SqlValue)>>(iter: I) -> Self {
        let mut row = Row::new();
        for (column, value) in iter {
            row.push(column, value);
        }
        row
    }
}

/// Result of one executed statement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Rows {
    rows: Vec<Row>,
    rows_affected: u64,
}

impl Rows {
    pub fn new(rows: Vec<Row>, rows_affected: u64) -> Self {
        Self {
            rows,
            rows_affected,
        }
    }

    /// Number of returned rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Row at `index`, if any.
    pub fn item(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    /// Rows changed by an INSERT/UPDATE/DELETE.
    pub fn rows_affected(&self) -> u64 {
        self.rows_affected
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Row> {
        self.rows.iter()
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }
}

impl IntoIterator for Rows {
    type Item = Row;
    type IntoIter = std::vec::IntoIter<Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

/// An embedded SQL engine the builder can run statements against.
///
/// Both operations may fail; failures are surfaced as-is and the builder
/// normalizes them at its own boundary.
pub trait StorageEngine: Send + Sync {
    /// Execute one statement outside any explicit transaction.
    fn execute_sql(
        &self,
        sql: &str,
        params: &[SqlValue],
    ) -> impl Future<Output = OrmResult<Rows>> + Send;

    /// Execute `statements` in order inside a single transaction.
    ///
    /// Semantics:
    /// - all succeed: the transaction commits and one `Rows` per statement is returned
    /// - any fails: the transaction rolls back and that first error is returned
    fn transaction(
        &self,
        statements: Vec<Statement>,
    ) -> impl Future<Output = OrmResult<Vec<Rows>>> + Send;
}

impl<E: StorageEngine> StorageEngine for &E {
    fn execute_sql(
        &self,
        sql: &str,
        params: &[SqlValue],
    ) -> impl Future<Output = OrmResult<Rows>> + Send {
        (**self).execute_sql(sql, params)
    }

    fn transaction(
        &self,
        statements: Vec<Statement>,
    ) -> impl Future<Output = OrmResult<Vec<Rows>>> + Send {
        (**self).transaction(statements)
    }
}

impl<E: StorageEngine> StorageEngine for std::sync::Arc<E> {
    fn execute_sql(
        &self,
        sql: &str,
        params: &[SqlValue],
    ) -> impl Future<Output = OrmResult<Rows>> + Send {
        (**self).execute_sql(sql, params)
    }

    fn transaction(
        &self,
        statements: Vec<Statement>,
    ) -> impl Future<Output = OrmResult<Vec<Rows>>> + Send {
        (**self).transaction(statements)
    }
}
