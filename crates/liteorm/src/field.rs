//! Field descriptors and their SQL column types.
//!
//! A field descriptor is a pipe-delimited token list such as `"string"` or
//! `"string|primary"`. The first token is the base type; `primary` is the only
//! modifier. Unknown tokens are dropped rather than rejected.

use std::fmt;

/// Audit columns every table carries, all declared as `string`.
pub const AUDIT_COLUMNS: [&str; 3] = ["created_at", "updated_at", "deleted_at"];

/// Column used as the record key by update/delete.
pub const KEY_COLUMN: &str = "uuid";

/// Base type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    String,
    Text,
    Int,
    Boolean,
}

impl FieldType {
    fn parse(token: &str) -> Option<Self> {
        match token {
            "string" => Some(Self::String),
            "text" => Some(Self::Text),
            "int" => Some(Self::Int),
            "boolean" => Some(Self::Boolean),
            _ => None,
        }
    }

    /// Descriptor token for this type.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Text => "text",
            Self::Int => "int",
            Self::Boolean => "boolean",
        }
    }

    /// SQL column type. `boolean` is stored as an integer and only told apart on read.
    pub fn sql_type(self) -> &'static str {
        match self {
            Self::String => "VARCHAR(255)",
            Self::Text => "TEXT",
            Self::Int | Self::Boolean => "INTEGER",
        }
    }
}

/// A recognized descriptor token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldToken {
    Type(FieldType),
    Primary,
}

impl FieldToken {
    fn sql(self) -> &'static str {
        match self {
            Self::Type(ty) => ty.sql_type(),
            Self::Primary => "PRIMARY KEY",
        }
    }
}

/// A parsed field descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    base: Option<FieldType>,
    tokens: Vec<FieldToken>,
}

impl FieldDescriptor {
    /// Parse a descriptor. Never fails: unknown tokens are skipped.
    pub fn parse(descriptor: &str) -> Self {
        let base = descriptor
            .split('|')
            .next()
            .map(str::trim)
            .and_then(FieldType::parse);

        let tokens = descriptor
            .split('|')
            .map(str::trim)
            .filter_map(|token| match token {
                "primary" => Some(FieldToken::Primary),
                other => FieldType::parse(other).map(FieldToken::Type),
            })
            .collect();

        Self { base, tokens }
    }

    /// Descriptor for a plain field of the given type.
    pub fn of(ty: FieldType) -> Self {
        Self {
            base: Some(ty),
            tokens: vec![FieldToken::Type(ty)],
        }
    }

    /// Declared base type: the first token, if it names a type.
    pub fn base_type(&self) -> Option<FieldType> {
        self.base
    }

    /// Whether the descriptor carries the `primary` modifier.
    pub fn is_primary(&self) -> bool {
        self.tokens.contains(&FieldToken::Primary)
    }

    /// Recognized tokens in declaration order.
    pub fn tokens(&self) -> &[FieldToken] {
        &self.tokens
    }

    /// SQL column type text, tokens in declaration order.
    pub fn sql_column_type(&self) -> String {
        self.tokens
            .iter()
            .map(|token| token.sql())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl From<&str> for FieldDescriptor {
    fn from(descriptor: &str) -> Self {
        Self::parse(descriptor)
    }
}

impl From<String> for FieldDescriptor {
    fn from(descriptor: String) -> Self {
        Self::parse(&descriptor)
    }
}

impl From<FieldType> for FieldDescriptor {
    fn from(ty: FieldType) -> Self {
        Self::of(ty)
    }
}

impl fmt::Display for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tokens: Vec<&str> = self
            .tokens
            .iter()
            .map(|token| match token {
                FieldToken::Type(ty) => ty.as_str(),
                FieldToken::Primary => "primary",
            })
            .collect();
        f.write_str(&tokens.join("|"))
    }
}

/// Map a descriptor string straight to its SQL column type.
///
/// ```
/// assert_eq!(liteorm::to_sql_column_type("string|primary"), "VARCHAR(255) PRIMARY KEY");
/// assert_eq!(liteorm::to_sql_column_type("boolean"), "INTEGER");
/// ```
pub fn to_sql_column_type(descriptor: &str) -> String {
    FieldDescriptor::parse(descriptor).sql_column_type()
}

/// Ordered column → descriptor map.
///
/// Declaration order is kept: it drives the SELECT column list, the UPDATE SET
/// list and the CREATE TABLE column list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableFields {
    fields: Vec<(String, FieldDescriptor)>,
}

impl TableFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a field. A replaced field keeps its position.
    pub fn insert(&mut self, column: impl Into<String>, descriptor: impl Into<FieldDescriptor>) {
        let column = column.into();
        let descriptor = descriptor.into();
        match self.fields.iter_mut().find(|(name, _)| *name == column) {
            Some((_, existing)) => *existing = descriptor,
            None => self.fields.push((column, descriptor)),
        }
    }

    /// Copy of these fields with the audit columns appended (or overridden) as `string`.
    pub fn with_audit_columns(&self) -> Self {
        let mut merged = self.clone();
        for column in AUDIT_COLUMNS {
            merged.insert(column, FieldType::String);
        }
        merged
    }

    pub fn get(&self, column: &str) -> Option<&FieldDescriptor> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, descriptor)| descriptor)
    }

    /// Declared base type of `column`, if declared.
    pub fn base_type(&self, column: &str) -> Option<FieldType> {
        self.get(column).and_then(FieldDescriptor::base_type)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.get(column).is_some()
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldDescriptor)> {
        self.fields.iter().map(|(name, descriptor)| (name.as_str(), descriptor))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for TableFields
where
    K: Into<String>,
    V: Into<FieldDescriptor>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut fields = TableFields::new();
        for (column, descriptor) in iter {
            fields.insert(column, descriptor);
        }
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_primary_string() {
        assert_eq!(to_sql_column_type("string|primary"), "VARCHAR(255) PRIMARY KEY");
    }

    #[test]
    fn boolean_and_int_share_integer() {
        assert_eq!(to_sql_column_type("boolean"), "INTEGER");
        assert_eq!(to_sql_column_type("int"), "INTEGER");
        assert_eq!(to_sql_column_type("text"), "TEXT");
    }

    #[test]
    fn unknown_tokens_are_skipped() {
        assert_eq!(to_sql_column_type("int|unsigned|primary"), "INTEGER PRIMARY KEY");
        assert_eq!(to_sql_column_type("json"), "");
    }

    #[test]
    fn tokens_keep_declaration_order() {
        assert_eq!(to_sql_column_type("primary|text"), "PRIMARY KEY TEXT");
    }

    #[test]
    fn base_type_is_first_token_only() {
        assert_eq!(FieldDescriptor::parse("boolean|primary").base_type(), Some(FieldType::Boolean));
        assert_eq!(FieldDescriptor::parse("primary|int").base_type(), None);
        assert!(FieldDescriptor::parse("string|primary").is_primary());
    }

    #[test]
    fn audit_columns_are_appended_once() {
        let fields: TableFields = [("name", "string"), ("created_at", "int")].into_iter().collect();
        let merged = fields.with_audit_columns();

        let columns: Vec<&str> = merged.columns().collect();
        assert_eq!(columns, ["name", "created_at", "updated_at", "deleted_at"]);
        assert_eq!(merged.base_type("created_at"), Some(FieldType::String));
    }

    #[test]
    fn display_round_trips_known_tokens() {
        assert_eq!(FieldDescriptor::parse("string|bogus|primary").to_string(), "string|primary");
    }
}
