//! Conversion between domain records and stored rows.
//!
//! Encoding is driven by the value: structured values become JSON text, booleans
//! become `1`/`0`. Decoding is driven by the declared field type, so a `string`
//! column holding `"42"` stays a string and only `text` columns are candidates
//! for structured decoding.

use crate::engine::Row;
use crate::field::{FieldType, TableFields};
use crate::value::SqlValue;
use serde_json::{Map, Number, Value};

/// A record with domain-typed values, keyed by column.
pub type Record = Map<String, Value>;

/// Encode one domain value as a stored scalar.
pub fn to_sql_value(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::from(*b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => SqlValue::Real(n.as_f64().unwrap_or_default()),
        },
        Value::String(s) => SqlValue::Text(s.clone()),
        Value::Array(_) | Value::Object(_) => SqlValue::Text(value.to_string()),
    }
}

/// Encode one record, keeping its column order.
pub fn serialize_record(record: &Record) -> Row {
    record
        .iter()
        .map(|(column, value)| (column.as_str(), to_sql_value(value)))
        .collect()
}

/// Encode every record.
pub fn serialize(records: &[Record]) -> Vec<Row> {
    records.iter().map(serialize_record).collect()
}

/// Decode one stored value for a column of declared type `ty`.
pub fn from_sql_value(value: &SqlValue, ty: Option<FieldType>) -> Value {
    match (ty, value) {
        (Some(FieldType::Boolean), v) => Value::Bool(v.as_f64().is_some_and(|n| n > 0.0)),
        (_, SqlValue::Null) => Value::Null,
        (Some(FieldType::Int), SqlValue::Text(s)) => {
            parse_number(s).unwrap_or_else(|| Value::String(s.clone()))
        }
        (Some(FieldType::Text), SqlValue::Text(s)) => decode_structured(s),
        (_, v) => scalar(v),
    }
}

/// Decode one row using the declared field types.
pub fn unserialize_row(row: &Row, fields: &TableFields) -> Record {
    row.iter()
        .map(|(column, value)| (column.to_string(), from_sql_value(value, fields.base_type(column))))
        .collect()
}

/// Decode every row.
pub fn unserialize(rows: &[Row], fields: &TableFields) -> Vec<Record> {
    rows.iter().map(|row| unserialize_row(row, fields)).collect()
}

fn scalar(value: &SqlValue) -> Value {
    match value {
        SqlValue::Null => Value::Null,
        SqlValue::Integer(i) => Value::from(*i),
        SqlValue::Real(r) => Number::from_f64(*r).map_or(Value::Null, Value::Number),
        SqlValue::Text(s) => Value::String(s.clone()),
        SqlValue::Blob(b) => Value::Array(b.iter().map(|byte| Value::from(*byte)).collect()),
    }
}

fn parse_number(s: &str) -> Option<Value> {
    let s = s.trim();
    if let Ok(i) = s.parse::<i64>() {
        return Some(Value::from(i));
    }
    s.parse::<f64>().ok().and_then(Number::from_f64).map(Value::Number)
}

// Only object/array literals count as structured; anything else stays the stored string.
fn decode_structured(s: &str) -> Value {
    let trimmed = s.trim_start();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        if let Ok(value @ (Value::Object(_) | Value::Array(_))) = serde_json::from_str::<Value>(s) {
            return value;
        }
    }
    Value::String(s.to_string())
}
