//! # liteorm
//!
//! A fluent query builder and record codec for embedded SQLite.
//!
//! ## Features
//!
//! - **Fluent builder**: chain `where_` / `or_where` / `order_by` / `limit`, then await `get()`
//! - **Nested groups**: `Condition::group(|g| ...)` renders a parenthesized predicate
//! - **Typed decoding**: declared field types drive how stored scalars come back
//! - **Audit columns**: `created_at` / `updated_at` / `deleted_at` on every table
//! - **Atomic writes**: every insert batch runs in one transaction
//!
//! ## Example
//!
//! ```ignore
//! use liteorm::{QueryBuilder, SchemaManager, SqliteEngine, TableDescriptor};
//! use serde_json::json;
//!
//! let engine = SqliteEngine::open_in_memory()?;
//!
//! let users = TableDescriptor::new("users", [("name", "string"), ("age", "int")]);
//! SchemaManager::new(engine.clone()).create_table(&users).await?;
//!
//! let mut qb = QueryBuilder::new(engine);
//! qb.table_name("users").table_fields([("name", "string"), ("age", "int")]);
//!
//! let ann = json!({"name": "Ann", "age": 5});
//! qb.insert(&[ann.as_object().cloned().unwrap()]).await?;
//!
//! let found = qb.where_(("name", "=", "Ann")).get().await?;
//! assert_eq!(found.data[0]["age"], 5);
//! ```

pub mod codec;
pub mod config;
pub mod engine;
pub mod error;
pub mod field;
pub mod group;
pub mod model;
pub mod query;
pub mod schema;
pub mod sqlite;
pub mod timestamp;
pub mod value;

pub use codec::{Record, serialize, unserialize};
pub use config::DatabaseConfig;
pub use engine::{Row, Rows, Statement, StorageEngine};
pub use error::{OrmError, OrmResult, QueryResponse};
pub use field::{FieldDescriptor, FieldType, TableFields, to_sql_column_type};
pub use group::{Condition, Conjunction, PredicateGroup};
pub use model::Model;
pub use query::{Order, QueryBuilder};
pub use schema::{CreatedTable, SchemaManager, TableDescriptor};
pub use sqlite::SqliteEngine;
pub use timestamp::{TIMESTAMP_FORMAT, format_timestamp, now_timestamp};
pub use value::SqlValue;
