//! Active-record style wrapper around a [`QueryBuilder`].
//!
//! A [`Model`] owns one builder for its table and at most one loaded record.
//! Loading (`find`, `first`) marks the model as editing, after which `save`
//! updates the row in place instead of inserting a new one.

use crate::codec::Record;
use crate::engine::StorageEngine;
use crate::error::{OrmError, OrmResult, QueryResponse};
use crate::field::{AUDIT_COLUMNS, FieldDescriptor, KEY_COLUMN, TableFields};
use crate::query::QueryBuilder;
use crate::schema::TableDescriptor;
use crate::timestamp::now_timestamp;
use serde_json::Value;
use uuid::Uuid;

/// A table plus the record currently being edited.
#[derive(Debug)]
pub struct Model<E> {
    query: QueryBuilder<E>,
    name: String,
    fields: TableFields,
    assignable: Vec<String>,
    selected_field: Option<String>,
    is_edit: bool,
    values: Record,
}

impl<E> Model<E> {
    /// Create a model for table `name`.
    ///
    /// Every declared field starts out assignable, along with the audit columns.
    /// Use [`set_assignable_fields`](Self::set_assignable_fields) to narrow the list.
    pub fn new<I, K, V>(engine: E, name: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<FieldDescriptor>,
    {
        let name = name.into();
        let fields: TableFields = fields.into_iter().collect();

        let mut query = QueryBuilder::new(engine);
        query
            .table_name(name.as_str())
            .table_fields(fields.iter().map(|(column, field)| (column, field.clone())));

        let assignable: Vec<String> = fields.columns().map(String::from).collect();
        let mut model = Self {
            query,
            name,
            fields,
            assignable: Vec::new(),
            selected_field: None,
            is_edit: false,
            values: Record::new(),
        };
        model.set_assignable_fields(assignable);
        model
    }

    /// The underlying builder, for ad-hoc queries on this table.
    pub fn query(&mut self) -> &mut QueryBuilder<E> {
        &mut self.query
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Table descriptor for [`SchemaManager::create_table`](crate::SchemaManager::create_table).
    pub fn descriptor(&self) -> TableDescriptor {
        TableDescriptor {
            name: self.name.clone(),
            fields: self.fields.clone(),
        }
    }

    /// Restrict which fields `get_field` accepts. Audit columns stay assignable.
    pub fn set_assignable_fields<I, S>(&mut self, fields: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut assignable: Vec<String> = fields.into_iter().map(Into::into).collect();
        for column in AUDIT_COLUMNS {
            if !assignable.iter().any(|c| c == column) {
                assignable.push(column.to_string());
            }
        }
        self.assignable = assignable;
        self
    }

    pub fn assignable_fields(&self) -> &[String] {
        &self.assignable
    }

    /// Select the field the next [`set_field_value`](Self::set_field_value) writes.
    pub fn get_field(&mut self, name: &str) -> OrmResult<&mut Self> {
        if !self.assignable.iter().any(|c| c == name) {
            return Err(OrmError::configuration(format!(
                "Field named \"{name}\" does not exist or is not assignable."
            )));
        }
        self.selected_field = Some(name.to_string());
        Ok(self)
    }

    /// Write `value` into the selected field of the current record.
    pub fn set_field_value(&mut self, value: impl Into<Value>) -> OrmResult<&mut Self> {
        let Some(field) = self.selected_field.clone() else {
            return Err(OrmError::configuration("No field selected."));
        };
        self.values.insert(field, value.into());
        Ok(self)
    }

    /// `get_field(name)` followed by `set_field_value(value)`.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> OrmResult<&mut Self> {
        self.get_field(name)?.set_field_value(value)
    }

    /// The current record.
    pub fn values(&self) -> &Record {
        &self.values
    }

    /// Whether the current record was loaded from (or saved to) storage.
    pub fn is_loaded(&self) -> bool {
        self.is_edit
    }

    fn load(&mut self, record: Record) {
        self.query.clear_key_values();
        for (column, value) in &record {
            self.query.set_key_value(column.as_str(), value.clone());
        }
        self.values = record;
        self.is_edit = true;
    }

    // New records get a v4 key when the table declares one and none was supplied.
    fn fill_key(&self, record: &mut Record) {
        if !self.fields.contains(KEY_COLUMN) {
            return;
        }
        if record.get(KEY_COLUMN).is_none_or(Value::is_null) {
            record.insert(KEY_COLUMN.to_string(), Value::from(Uuid::new_v4().to_string()));
        }
    }
}

impl<E: StorageEngine> Model<E> {
    /// Every row not soft-deleted.
    pub async fn all(&mut self) -> OrmResult<QueryResponse<Vec<Record>>> {
        self.query.where_null("deleted_at").get().await
    }

    /// Load the first row where `column = value`.
    ///
    /// Resolves with `None` when nothing matches; the model is left untouched then.
    pub async fn find(
        &mut self,
        value: impl Into<Value>,
        column: &str,
    ) -> OrmResult<QueryResponse<Option<Record>>> {
        self.query.where_((column, "=", value)).limit(1);
        self.load_first().await
    }

    /// [`find`](Self::find) on the `uuid` column.
    pub async fn find_by_key(
        &mut self,
        value: impl Into<Value>,
    ) -> OrmResult<QueryResponse<Option<Record>>> {
        self.find(value, KEY_COLUMN).await
    }

    /// Load the first row matching the builder's pending clauses.
    pub async fn first(&mut self) -> OrmResult<QueryResponse<Option<Record>>> {
        self.query.limit(1);
        self.load_first().await
    }

    async fn load_first(&mut self) -> OrmResult<QueryResponse<Option<Record>>> {
        let QueryResponse {
            status_code,
            message,
            data,
        } = self.query.get().await?;

        let record = data.into_iter().next();
        if let Some(record) = &record {
            self.load(record.clone());
        }
        Ok(QueryResponse {
            status_code,
            message,
            data: record,
        })
    }

    /// Insert the current record, or update it if it was loaded.
    pub async fn save(&mut self) -> OrmResult<QueryResponse<u64>> {
        if self.is_edit {
            let values = self.values.clone();
            let response = self.query.update(&values).await?;
            // The key may have been edited; later saves must target the new row.
            self.load(values);
            return Ok(response);
        }

        let mut record = self.values.clone();
        self.fill_key(&mut record);
        let now = now_timestamp();
        record.insert("created_at".to_string(), Value::from(now.as_str()));
        record.insert("updated_at".to_string(), Value::from(now.as_str()));

        let response = self.query.insert_at(std::slice::from_ref(&record), &now).await?;
        self.load(record);
        Ok(response)
    }

    /// Delete the loaded record and start over with an empty one.
    pub async fn remove(&mut self) -> OrmResult<QueryResponse<u64>> {
        let response = self.query.delete().await?;
        self.query.clear_key_values();
        self.values.clear();
        self.selected_field = None;
        self.is_edit = false;
        Ok(response)
    }

    /// Insert `records` in one transaction, filling missing keys.
    pub async fn create(&mut self, records: &[Record]) -> OrmResult<QueryResponse<u64>> {
        let records: Vec<Record> = records
            .iter()
            .map(|record| {
                let mut record = record.clone();
                self.fill_key(&mut record);
                record
            })
            .collect();
        self.query.insert(&records).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaManager;
    use crate::sqlite::SqliteEngine;
    use serde_json::json;

    async fn users() -> Model<SqliteEngine> {
        let engine = SqliteEngine::open_in_memory().unwrap();
        let model = Model::new(
            engine.clone(),
            "users",
            [("uuid", "string|primary"), ("name", "string"), ("age", "int")],
        );
        SchemaManager::new(engine)
            .create_table(&model.descriptor())
            .await
            .unwrap();
        model
    }

    #[test]
    fn unassignable_field_is_rejected() {
        let mut model = Model::new((), "users", [("name", "string"), ("secret", "string")]);
        model.set_assignable_fields(["name"]);

        let err = model.get_field("secret").unwrap_err();
        assert!(err.is_configuration());
        assert_eq!(
            err.to_string(),
            "Configuration error: Field named \"secret\" does not exist or is not assignable."
        );
        assert!(model.get_field("deleted_at").is_ok());
        assert!(model.get_field("missing").is_err());
    }

    #[test]
    fn set_field_value_needs_a_selection() {
        let mut model = Model::new((), "users", [("name", "string")]);
        assert!(model.set_field_value("x").is_err());

        model.set("name", "Ann").unwrap();
        assert_eq!(model.values().get("name"), Some(&json!("Ann")));
    }

    #[tokio::test]
    async fn save_inserts_then_updates_in_place() {
        let mut model = users().await;
        model.set("name", "Ann").unwrap().set("age", 5).unwrap();
        model.save().await.unwrap();
        assert!(model.is_loaded());

        let key = model.values().get("uuid").cloned().unwrap();
        assert!(Uuid::parse_str(key.as_str().unwrap()).is_ok());

        model.set("age", 6).unwrap();
        let updated = model.save().await.unwrap();
        assert_eq!(updated.data, 1);

        let rows = model.all().await.unwrap().data;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("age"), Some(&json!(6)));
        assert_eq!(rows[0].get("uuid"), Some(&key));
    }

    #[tokio::test]
    async fn find_loads_record_and_key() {
        let mut model = users().await;
        model
            .create(&[
                json!({"name": "Ann", "age": 5}).as_object().cloned().unwrap(),
                json!({"uuid": "fixed", "name": "Bob", "age": 7}).as_object().cloned().unwrap(),
            ])
            .await
            .unwrap();

        let found = model.find("Bob", "name").await.unwrap();
        assert_eq!(found.data.as_ref().and_then(|r| r.get("uuid")), Some(&json!("fixed")));
        assert_eq!(model.query().key_values().get("uuid"), Some(&json!("fixed")));

        let missing = model.find_by_key("nope").await.unwrap();
        assert!(missing.data.is_none());
        assert_eq!(model.values().get("name"), Some(&json!("Bob")));
    }

    #[tokio::test]
    async fn remove_deletes_loaded_record() {
        let mut model = users().await;
        model.set("name", "Ann").unwrap();
        model.save().await.unwrap();

        assert_eq!(model.remove().await.unwrap().data, 1);
        assert!(!model.is_loaded());
        assert!(model.all().await.unwrap().data.is_empty());

        let err = model.remove().await.unwrap_err();
        assert!(matches!(err, OrmError::MissingKey(_)));
    }

    #[tokio::test]
    async fn save_after_remove_does_not_resurrect_record() {
        let mut model = users().await;
        model.set("name", "Ann").unwrap();
        model.save().await.unwrap();
        model.remove().await.unwrap();

        assert!(model.values().is_empty());
        assert!(model.set_field_value("x").is_err());

        model.set("name", "Bea").unwrap();
        model.save().await.unwrap();
        let rows = model.all().await.unwrap().data;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("name"), Some(&json!("Bea")));
    }

    #[tokio::test]
    async fn edited_key_is_tracked_by_later_saves() {
        let mut model = users().await;
        model.set("name", "Ann").unwrap();
        model.save().await.unwrap();

        model.set("uuid", "new-key").unwrap();
        assert_eq!(model.save().await.unwrap().data, 1);
        assert_eq!(model.query().key_values().get("uuid"), Some(&json!("new-key")));

        model.set("name", "Bob").unwrap();
        assert_eq!(model.save().await.unwrap().data, 1);

        let rows = model.all().await.unwrap().data;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("uuid"), Some(&json!("new-key")));
        assert_eq!(rows[0].get("name"), Some(&json!("Bob")));
    }

    #[test]
    fn declared_and_audit_fields_start_assignable() {
        let mut model = Model::new((), "users", [("uuid", "string|primary"), ("name", "string")]);
        assert_eq!(
            model.assignable_fields(),
            ["uuid", "name", "created_at", "updated_at", "deleted_at"]
        );

        model.set_assignable_fields(["name"]);
        assert_eq!(
            model.assignable_fields(),
            ["name", "created_at", "updated_at", "deleted_at"]
        );
        assert!(model.get_field("uuid").is_err());
    }
}
