//! The fluent query builder.
//!
//! A [`QueryBuilder`] owns all of its clause state. Configuration methods take
//! `&mut self` and return `&mut Self` for chaining; the async terminal methods
//! (`get`, `insert`, `update`, `delete`, `count`) render SQL, run it against the
//! [`StorageEngine`] and resolve to a [`QueryResponse`].
//!
//! # Example
//!
//! ```ignore
//! use liteorm::{Condition, Order, QueryBuilder, SqliteEngine};
//!
//! let mut users = QueryBuilder::new(SqliteEngine::open_in_memory()?);
//! users.table_name("users").table_fields([("uuid", "string|primary"), ("age", "int")]);
//!
//! let adults = users
//!     .where_(("age", ">=", 18))
//!     .or_where(Condition::group(|g| {
//!         g.where_("role", "=", "admin").where_null("deleted_at");
//!     }))
//!     .order_by("age", Order::Desc)
//!     .limit(10)
//!     .get()
//!     .await?;
//! ```

use crate::codec::{self, Record};
use crate::engine::{Statement, StorageEngine};
use crate::error::{OrmError, OrmResult, QueryResponse};
use crate::field::{FieldDescriptor, KEY_COLUMN, TableFields};
use crate::group::{Condition, Conjunction, PredicateGroup};
use crate::timestamp::now_timestamp;
use crate::value::SqlValue;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;

/// Sort direction for [`QueryBuilder::order_by`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Order {
    #[default]
    Asc,
    Desc,
}

impl Order {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Query builder bound to one table and one storage engine.
#[derive(Debug)]
pub struct QueryBuilder<E> {
    engine: E,
    table: String,
    fields: TableFields,
    /// Rendered WHERE clause, including the leading `WHERE`
    where_clause: String,
    /// Values for the `?` placeholders of `where_clause`, left to right
    where_values: Vec<SqlValue>,
    order_by: Vec<String>,
    distinct: Vec<String>,
    /// 0 means no LIMIT
    limit: u32,
    /// Pending keyed record used by update/delete
    key_values: Record,
}

impl<E> QueryBuilder<E> {
    /// Create a builder over `engine` with no table configured.
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            table: String::new(),
            fields: TableFields::new(),
            where_clause: String::new(),
            where_values: Vec::new(),
            order_by: Vec::new(),
            distinct: Vec::new(),
            limit: 0,
            key_values: Record::new(),
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    // ==================== Target ====================

    /// Set the target table.
    pub fn table_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.table = name.into();
        self
    }

    /// Set the table's fields. The audit columns are always appended as `string`.
    pub fn table_fields<I, K, V>(&mut self, fields: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<FieldDescriptor>,
    {
        self.fields = fields.into_iter().collect::<TableFields>().with_audit_columns();
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Configured fields, audit columns included.
    pub fn fields(&self) -> &TableFields {
        &self.fields
    }

    // ==================== WHERE ====================

    /// Add a condition, joined with AND (or starting the WHERE clause).
    pub fn where_<'a>(&mut self, condition: impl Into<Condition<'a>>) -> &mut Self {
        self.push_condition(Conjunction::And, condition.into());
        self
    }

    /// Add a condition joined with AND.
    pub fn and_where<'a>(&mut self, condition: impl Into<Condition<'a>>) -> &mut Self {
        self.push_condition(Conjunction::And, condition.into());
        self
    }

    /// Add a condition joined with OR.
    pub fn or_where<'a>(&mut self, condition: impl Into<Condition<'a>>) -> &mut Self {
        self.push_condition(Conjunction::Or, condition.into());
        self
    }

    /// `column IS NULL`, joined with AND.
    pub fn where_null(&mut self, column: &str) -> &mut Self {
        self.push_fragment(Conjunction::And, &format!("{column} IS NULL"));
        self
    }

    /// `column IS NULL`, joined with AND.
    pub fn and_where_null(&mut self, column: &str) -> &mut Self {
        self.where_null(column)
    }

    /// `column IS NULL`, joined with OR.
    pub fn or_where_null(&mut self, column: &str) -> &mut Self {
        self.push_fragment(Conjunction::Or, &format!("{column} IS NULL"));
        self
    }

    /// `column IS NOT NULL`, joined with AND.
    pub fn where_not_null(&mut self, column: &str) -> &mut Self {
        self.push_fragment(Conjunction::And, &format!("{column} IS NOT NULL"));
        self
    }

    /// `column IS NOT NULL`, joined with AND.
    pub fn and_where_not_null(&mut self, column: &str) -> &mut Self {
        self.where_not_null(column)
    }

    /// `column IS NOT NULL`, joined with OR.
    pub fn or_where_not_null(&mut self, column: &str) -> &mut Self {
        self.push_fragment(Conjunction::Or, &format!("{column} IS NOT NULL"));
        self
    }

    fn push_condition(&mut self, join: Conjunction, condition: Condition<'_>) {
        match condition {
            Condition::Compare {
                column,
                operator,
                value,
            } => {
                self.push_fragment(join, &format!("{column} {operator} ?"));
                self.where_values.push(codec::to_sql_value(&value));
            }
            Condition::Group(build) => {
                let mut group = PredicateGroup::new();
                build(&mut group);

                let rendered = group.render(self.keyword(join));
                if rendered.is_empty() {
                    return;
                }
                self.append_clause(&rendered);
                self.where_values.extend(group.drain_values());
            }
        }
    }

    fn push_fragment(&mut self, join: Conjunction, fragment: &str) {
        let keyword = self.keyword(join);
        self.append_clause(&format!("{keyword} {fragment}"));
    }

    // The first fragment always opens the clause, whatever join was asked for.
    fn keyword(&self, join: Conjunction) -> Conjunction {
        if self.where_clause.is_empty() {
            Conjunction::Where
        } else {
            join
        }
    }

    fn append_clause(&mut self, part: &str) {
        if !self.where_clause.is_empty() {
            self.where_clause.push(' ');
        }
        self.where_clause.push_str(part);
    }

    /// The WHERE clause rendered so far (empty when unset).
    pub fn where_clause(&self) -> &str {
        &self.where_clause
    }

    /// Values bound to the WHERE clause placeholders, left to right.
    pub fn where_values(&self) -> &[SqlValue] {
        &self.where_values
    }

    // ==================== ORDER BY / DISTINCT / LIMIT ====================

    /// Limit the number of returned rows. `0` removes the limit.
    pub fn limit(&mut self, n: u32) -> &mut Self {
        self.limit = n;
        self
    }

    /// Append an ORDER BY term.
    pub fn order_by(&mut self, column: &str, order: Order) -> &mut Self {
        self.order_by.push(format!("{column} {order}"));
        self
    }

    /// Select `DISTINCT` over the given columns instead of all configured columns.
    pub fn distinct<I, S>(&mut self, columns: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.distinct = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Clear per-query clause state: WHERE, bound values, ORDER BY, DISTINCT and LIMIT.
    ///
    /// Table, fields and the keyed record are kept.
    pub fn reset(&mut self) -> &mut Self {
        self.where_clause.clear();
        self.where_values.clear();
        self.order_by.clear();
        self.distinct.clear();
        self.limit = 0;
        self
    }

    // ==================== Keyed record ====================

    /// Set one column of the pending keyed record.
    pub fn set_key_value(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.key_values.insert(key.into(), value.into());
        self
    }

    pub fn key_values(&self) -> &Record {
        &self.key_values
    }

    pub fn clear_key_values(&mut self) -> &mut Self {
        self.key_values.clear();
        self
    }

    fn key_value(&self, operation: &str) -> OrmResult<SqlValue> {
        match self.key_values.get(KEY_COLUMN) {
            Some(value) if !value.is_null() => Ok(codec::to_sql_value(value)),
            _ => Err(OrmError::MissingKey(format!(
                "`{KEY_COLUMN}` must be set before {operation}"
            ))),
        }
    }

    // ==================== Rendering ====================

    fn require_table(&self) -> OrmResult<()> {
        if self.table.trim().is_empty() {
            return Err(OrmError::configuration("Table name is required."));
        }
        Ok(())
    }

    /// Render the SELECT statement for the current state without executing it.
    pub fn select_statement(&self) -> OrmResult<Statement> {
        self.require_table()?;

        let columns = if !self.distinct.is_empty() {
            format!("DISTINCT {}", self.distinct.join(", "))
        } else if self.fields.is_empty() {
            "*".to_string()
        } else {
            self.fields.columns().collect::<Vec<_>>().join(", ")
        };

        let mut sql = format!("SELECT {columns} FROM {}", self.table);
        if !self.where_clause.is_empty() {
            sql.push(' ');
            sql.push_str(&self.where_clause);
        }
        if !self.order_by.is_empty() {
            sql.push_str(" ORDER BY ");
            sql.push_str(&self.order_by.join(", "));
        }
        if self.limit > 0 {
            sql.push_str(&format!(" LIMIT {}", self.limit));
        }
        sql.push(';');

        Ok(Statement::new(sql, self.where_values.clone()))
    }

    /// SELECT SQL text for the current state.
    pub fn to_select_sql(&self) -> OrmResult<String> {
        self.select_statement().map(|statement| statement.sql)
    }

    fn insert_statements(&self, records: &[Record], now: &str) -> Vec<Statement> {
        records
            .iter()
            .map(|record| {
                let mut record = record.clone();
                record.insert("created_at".to_string(), Value::from(now));
                record.insert("updated_at".to_string(), Value::from(now));

                let row = codec::serialize_record(&record);
                let placeholders = vec!["?"; row.len()].join(", ");
                let sql = format!(
                    "INSERT INTO {} ({}) VALUES ({});",
                    self.table,
                    row.columns().join(", "),
                    placeholders
                );
                Statement::new(sql, row.values().to_vec())
            })
            .collect()
    }

    fn update_statement(&self, record: &Record, key: SqlValue) -> OrmResult<Statement> {
        if self.fields.is_empty() {
            return Err(OrmError::configuration("Table fields are required."));
        }

        let now = now_timestamp();
        let mut sets = Vec::with_capacity(self.fields.len());
        let mut params = Vec::with_capacity(self.fields.len() + 1);
        for column in self.fields.columns() {
            sets.push(format!("{column} = ?"));
            let value = if column == "updated_at" {
                SqlValue::from(now.as_str())
            } else {
                record.get(column).map_or(SqlValue::Null, codec::to_sql_value)
            };
            params.push(value);
        }
        params.push(key);

        let sql = format!(
            "UPDATE {} SET {} WHERE {KEY_COLUMN} = ?;",
            self.table,
            sets.join(", ")
        );
        Ok(Statement::new(sql, params))
    }
}

impl<E: StorageEngine> QueryBuilder<E> {
    /// Run the SELECT, reset clause state and decode every row.
    ///
    /// An empty result is `Ok` with no rows.
    pub async fn get(&mut self) -> OrmResult<QueryResponse<Vec<Record>>> {
        let statement = self.select_statement()?;
        self.reset();

        let rows = self
            .engine
            .execute_sql(&statement.sql, &statement.params)
            .await
            .map_err(|err| storage_failure("get", "An error occurred.", err))?;

        let data = codec::unserialize(&rows.into_rows(), &self.fields);
        Ok(QueryResponse::ok("Successful query", data))
    }

    /// Like [`get`](Self::get), deserializing every record into `T`.
    pub async fn get_as<T: DeserializeOwned>(&mut self) -> OrmResult<QueryResponse<Vec<T>>> {
        let QueryResponse {
            status_code,
            message,
            data,
        } = self.get().await?;

        let data = data
            .into_iter()
            .map(|record| serde_json::from_value(Value::Object(record)))
            .collect::<Result<Vec<T>, _>>()?;
        Ok(QueryResponse {
            status_code,
            message,
            data,
        })
    }

    /// Insert `records` in one transaction, stamping `created_at` / `updated_at`.
    ///
    /// Records are written in the given order. Any failure rolls back the whole
    /// batch. No statement is issued for an empty slice. Resolves to the number
    /// of inserted rows.
    pub async fn insert(&mut self, records: &[Record]) -> OrmResult<QueryResponse<u64>> {
        let now = now_timestamp();
        self.insert_at(records, &now).await
    }

    pub(crate) async fn insert_at(
        &mut self,
        records: &[Record],
        now: &str,
    ) -> OrmResult<QueryResponse<u64>> {
        self.require_table()?;
        if records.is_empty() {
            return Ok(QueryResponse::ok("Data successfully inserted.", 0));
        }

        let statements = self.insert_statements(records, now);
        let results = self
            .engine
            .transaction(statements)
            .await
            .map_err(|err| storage_failure("insert", "Data insertion error.", err))?;

        let inserted = results.iter().map(|rows| rows.rows_affected()).sum();
        Ok(QueryResponse::ok("Data successfully inserted.", inserted))
    }

    /// Update the keyed row, setting every configured column from `record`.
    ///
    /// Columns missing from `record` are set to NULL; `updated_at` is always the
    /// current timestamp. Fails without touching storage when `uuid` is unset.
    pub async fn update(&mut self, record: &Record) -> OrmResult<QueryResponse<u64>> {
        self.require_table()?;
        let key = self.key_value("update")?;
        let statement = self.update_statement(record, key)?;

        let affected = self.run_write("update", statement).await?;
        Ok(QueryResponse::ok("Data successfully updated.", affected))
    }

    /// Delete the keyed row. Fails without touching storage when `uuid` is unset.
    pub async fn delete(&mut self) -> OrmResult<QueryResponse<u64>> {
        self.require_table()?;
        let key = self.key_value("delete")?;
        let sql = format!("DELETE FROM {} WHERE {KEY_COLUMN} = ?;", self.table);

        let affected = self.run_write("delete", Statement::new(sql, vec![key])).await?;
        Ok(QueryResponse::ok("Data successfully deleted.", affected))
    }

    /// Mark the keyed row deleted by stamping `deleted_at`.
    pub async fn soft_delete(&mut self) -> OrmResult<QueryResponse<u64>> {
        self.require_table()?;
        let key = self.key_value("soft delete")?;
        let sql = format!(
            "UPDATE {} SET deleted_at = ? WHERE {KEY_COLUMN} = ?;",
            self.table
        );
        let params = vec![SqlValue::from(now_timestamp()), key];

        let affected = self.run_write("soft_delete", Statement::new(sql, params)).await?;
        Ok(QueryResponse::ok("Data successfully deleted.", affected))
    }

    /// `SELECT COUNT(*) AS count FROM <table>`.
    pub async fn count(&mut self) -> OrmResult<QueryResponse<Record>> {
        self.require_table()?;
        let sql = format!("SELECT COUNT(*) AS count FROM {};", self.table);

        let rows = self
            .engine
            .execute_sql(&sql, &[])
            .await
            .map_err(|err| storage_failure("count", "An error occurred.", err))?;

        let data = rows
            .item(0)
            .map(|row| codec::unserialize_row(row, &self.fields))
            .unwrap_or_default();
        Ok(QueryResponse::ok("Successful query", data))
    }

    async fn run_write(&self, operation: &'static str, statement: Statement) -> OrmResult<u64> {
        let results = self
            .engine
            .transaction(vec![statement])
            .await
            .map_err(|err| storage_failure(operation, "An error occurred.", err))?;
        Ok(results.iter().map(|rows| rows.rows_affected()).sum())
    }
}

fn storage_failure(operation: &'static str, message: &str, err: OrmError) -> OrmError {
    tracing::warn!(target: "liteorm", operation, error = %err, "{message}");
    OrmError::storage(message, err)
}
