//! Table creation from field descriptors.

use crate::engine::{Statement, StorageEngine};
use crate::error::{OrmError, OrmResult, QueryResponse};
use crate::field::{FieldDescriptor, TableFields};

/// A table name and its declared fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDescriptor {
    pub name: String,
    pub fields: TableFields,
}

impl TableDescriptor {
    pub fn new<I, K, V>(name: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<FieldDescriptor>,
    {
        Self {
            name: name.into(),
            fields: fields.into_iter().collect(),
        }
    }
}

/// Payload of a successful [`SchemaManager::create_table`].
#[derive(Debug, Clone, PartialEq)]
pub struct CreatedTable {
    pub table: String,
    /// Declared fields with the audit columns merged in.
    pub fields: TableFields,
}

/// Issues DDL against a storage engine.
#[derive(Debug, Clone)]
pub struct SchemaManager<E> {
    engine: E,
}

impl<E> SchemaManager<E> {
    pub fn new(engine: E) -> Self {
        Self { engine }
    }

    /// Render `CREATE TABLE IF NOT EXISTS <name>(<col> <type>, ...);`.
    ///
    /// The audit columns are appended (or override declared ones) as `string`.
    pub fn create_table_sql(&self, descriptor: &TableDescriptor) -> OrmResult<String> {
        if descriptor.name.trim().is_empty() {
            return Err(OrmError::configuration("Table name is required."));
        }

        let columns = descriptor
            .fields
            .with_audit_columns()
            .iter()
            .map(|(column, field)| format!("{column} {}", field.sql_column_type()))
            .collect::<Vec<_>>()
            .join(", ");
        Ok(format!(
            "CREATE TABLE IF NOT EXISTS {}({columns});",
            descriptor.name
        ))
    }
}

impl<E: StorageEngine> SchemaManager<E> {
    /// Create the table if it does not exist yet. Running it twice is harmless.
    pub async fn create_table(
        &self,
        descriptor: &TableDescriptor,
    ) -> OrmResult<QueryResponse<CreatedTable>> {
        let sql = self.create_table_sql(descriptor)?;

        if let Err(err) = self.engine.transaction(vec![Statement::raw(sql)]).await {
            tracing::warn!(
                target: "liteorm",
                table = %descriptor.name,
                error = %err,
                "Table creation error."
            );
            return Err(OrmError::storage("Table creation error.", err));
        }

        tracing::debug!(target: "liteorm", table = %descriptor.name, "table created");
        Ok(QueryResponse::ok(
            "Table successfully created",
            CreatedTable {
                table: descriptor.name.clone(),
                fields: descriptor.fields.with_audit_columns(),
            },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::SqliteEngine;

    fn users() -> TableDescriptor {
        TableDescriptor::new("users", [("uuid", "string|primary"), ("age", "int")])
    }

    #[test]
    fn renders_columns_with_audit_fields() {
        let manager = SchemaManager::new(());
        assert_eq!(
            manager.create_table_sql(&users()).unwrap(),
            "CREATE TABLE IF NOT EXISTS users(uuid VARCHAR(255) PRIMARY KEY, age INTEGER, \
             created_at VARCHAR(255), updated_at VARCHAR(255), deleted_at VARCHAR(255));"
        );
    }

    #[test]
    fn declared_audit_column_is_overridden_in_place() {
        let manager = SchemaManager::new(());
        let descriptor = TableDescriptor::new("t", [("created_at", "int"), ("flag", "boolean")]);
        assert_eq!(
            manager.create_table_sql(&descriptor).unwrap(),
            "CREATE TABLE IF NOT EXISTS t(created_at VARCHAR(255), flag INTEGER, \
             updated_at VARCHAR(255), deleted_at VARCHAR(255));"
        );
    }

    #[test]
    fn empty_name_is_configuration_error() {
        let manager = SchemaManager::new(());
        let descriptor = TableDescriptor::new("", [("a", "int")]);
        assert!(manager.create_table_sql(&descriptor).unwrap_err().is_configuration());
    }

    #[tokio::test]
    async fn create_table_is_idempotent() {
        let manager = SchemaManager::new(SqliteEngine::open_in_memory().unwrap());

        let first = manager.create_table(&users()).await.unwrap();
        assert_eq!(first.status_code, 200);
        assert_eq!(first.message, "Table successfully created");
        assert_eq!(first.data.table, "users");
        assert_eq!(first.data.fields.len(), 5);

        assert!(manager.create_table(&users()).await.is_ok());
    }

    #[tokio::test]
    async fn engine_failure_is_storage_error() {
        let manager = SchemaManager::new(SqliteEngine::open_in_memory().unwrap());
        let descriptor = TableDescriptor::new("select", [("a", "int")]);

        let err = manager.create_table(&descriptor).await.unwrap_err();
        assert!(err.is_storage());
        assert_eq!(err.message(), "Table creation error.");
    }
}
