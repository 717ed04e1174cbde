//! Basic usage example for liteorm
//!
//! Run with: cargo run --example basic -p liteorm
//!
//! Uses a private in-memory database, so no setup is needed.

use liteorm::{
    Condition, DatabaseConfig, Model, Order, OrmError, QueryBuilder, Record, SchemaManager,
    SqliteEngine, TableDescriptor,
};
use serde_json::{Value, json};

const FIELDS: [(&str, &str); 4] = [
    ("uuid", "string|primary"),
    ("name", "string"),
    ("age", "int"),
    ("active", "boolean"),
];

fn record(value: Value) -> Record {
    match value {
        Value::Object(map) => map,
        _ => Record::new(),
    }
}

#[tokio::main]
async fn main() -> Result<(), OrmError> {
    // Echo every executed statement at INFO
    let engine = SqliteEngine::open(&DatabaseConfig::in_memory().debug(true))?;

    // Setup: create the table (audit columns are added automatically)
    let created = SchemaManager::new(engine.clone())
        .create_table(&TableDescriptor::new("users", FIELDS))
        .await?;
    println!("{} `{}`", created.message, created.data.table);

    let mut users = QueryBuilder::new(engine.clone());
    users.table_name("users").table_fields(FIELDS);

    // Insert a batch in one transaction
    let inserted = users
        .insert(&[
            record(json!({"uuid": "u1", "name": "alice", "age": 31, "active": true})),
            record(json!({"uuid": "u2", "name": "bob", "age": 17, "active": false})),
            record(json!({"uuid": "u3", "name": "carol", "age": 45, "active": true})),
        ])
        .await?;
    println!("Inserted {} rows", inserted.data);

    // Filter with a nested group
    let found = users
        .where_(("active", "=", true))
        .and_where(Condition::group(|g| {
            g.where_("age", ">=", 40).or_where("name", "=", "alice");
        }))
        .order_by("age", Order::Desc)
        .get()
        .await?;
    for row in &found.data {
        println!("  {} ({})", row["name"], row["age"]);
    }

    // Update and delete go through the `uuid` key
    users.set_key_value("uuid", "u2");
    users
        .update(&record(json!({"uuid": "u2", "name": "bob", "age": 18, "active": true})))
        .await?;
    println!("Count: {}", users.count().await?.data["count"]);

    // Missing key: rendered in the same envelope as a success
    users.clear_key_values();
    if let Err(err) = users.delete().await {
        println!("Expected failure: {}", serde_json::to_string(&err.response())?);
    }

    // Model: load, edit, save
    let mut model = Model::new(engine, "users", FIELDS);
    if model.find("carol", "name").await?.data.is_some() {
        model.set("age", 46)?;
        model.save().await?;
    }
    println!("All: {}", serde_json::to_string(&model.all().await?.data)?);

    Ok(())
}
