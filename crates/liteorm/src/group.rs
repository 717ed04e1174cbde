//! Nested predicate groups.
//!
//! A [`PredicateGroup`] collects conditions independently of the parent query
//! and is merged into it as one parenthesized unit:
//!
//! ```
//! use liteorm::{Conjunction, PredicateGroup};
//!
//! let mut group = PredicateGroup::new();
//! group.where_("age", ">", 18).or_where("role", "=", "admin");
//!
//! assert_eq!(group.render(Conjunction::And), "AND (age > ? OR role = ?)");
//! assert_eq!(group.drain_values().len(), 2);
//!
//! // Rendering drains the group.
//! assert_eq!(group.render(Conjunction::And), "");
//! assert!(group.drain_values().is_empty());
//! ```

use crate::codec::to_sql_value;
use crate::value::SqlValue;
use serde_json::Value;
use std::fmt;

/// Keyword joining a fragment to what precedes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conjunction {
    Where,
    And,
    Or,
}

impl Conjunction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Where => "WHERE",
            Self::And => "AND",
            Self::Or => "OR",
        }
    }
}

impl fmt::Display for Conjunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
struct Fragment {
    join: Option<Conjunction>,
    sql: String,
}

impl Fragment {
    fn render(&self) -> String {
        match self.join {
            Some(join) => format!("{join} {}", self.sql),
            None => self.sql.clone(),
        }
    }
}

/// One-shot, parenthesized group of AND/OR conditions.
///
/// Fragments and values are drained by [`render`](Self::render) and
/// [`drain_values`](Self::drain_values) respectively; a group is meant to be
/// composed, rendered once, and dropped.
#[derive(Debug, Clone, Default)]
pub struct PredicateGroup {
    fragments: Vec<Fragment>,
    values: Vec<SqlValue>,
}

impl PredicateGroup {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, join: Conjunction, sql: String, value: Option<SqlValue>) -> &mut Self {
        // The first fragment never carries a keyword: `(OR a = ?)` is not valid SQL.
        let join = (!self.fragments.is_empty()).then_some(join);
        self.fragments.push(Fragment { join, sql });
        self.values.extend(value);
        self
    }

    /// Add `column operator ?`, joined with AND after the first fragment.
    pub fn where_(
        &mut self,
        column: &str,
        operator: &str,
        value: impl Into<Value>,
    ) -> &mut Self {
        let value = to_sql_value(&value.into());
        self.push(Conjunction::And, format!("{column} {operator} ?"), Some(value))
    }

    /// Add `column operator ?`, joined with OR after the first fragment.
    pub fn or_where(
        &mut self,
        column: &str,
        operator: &str,
        value: impl Into<Value>,
    ) -> &mut Self {
        let value = to_sql_value(&value.into());
        self.push(Conjunction::Or, format!("{column} {operator} ?"), Some(value))
    }

    /// Add `column IS NULL`, joined with AND.
    pub fn where_null(&mut self, column: &str) -> &mut Self {
        self.push(Conjunction::And, format!("{column} IS NULL"), None)
    }

    /// Add `column IS NULL`, joined with OR.
    pub fn or_where_null(&mut self, column: &str) -> &mut Self {
        self.push(Conjunction::Or, format!("{column} IS NULL"), None)
    }

    /// Add `column IS NOT NULL`, joined with AND.
    pub fn where_not_null(&mut self, column: &str) -> &mut Self {
        self.push(Conjunction::And, format!("{column} IS NOT NULL"), None)
    }

    /// Add `column IS NOT NULL`, joined with OR.
    pub fn or_where_not_null(&mut self, column: &str) -> &mut Self {
        self.push(Conjunction::Or, format!("{column} IS NOT NULL"), None)
    }

    /// Render `<keyword> (<frag1> <frag2> …)` and clear the fragments.
    ///
    /// An empty group renders as an empty string.
    pub fn render(&mut self, keyword: Conjunction) -> String {
        let fragments = std::mem::take(&mut self.fragments);
        if fragments.is_empty() {
            return String::new();
        }

        let body = fragments
            .iter()
            .map(Fragment::render)
            .collect::<Vec<_>>()
            .join(" ");
        format!("{keyword} ({body})")
    }

    /// Return and clear the bound values, in fragment order.
    pub fn drain_values(&mut self) -> Vec<SqlValue> {
        std::mem::take(&mut self.values)
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Number of pending fragments.
    pub fn len(&self) -> usize {
        self.fragments.len()
    }
}

/// Argument of the builder's `where_` family: a literal comparison or a nested group.
///
/// Literal triples convert directly:
///
/// ```
/// use liteorm::Condition;
///
/// let _ = Condition::from(("name", "=", "Ann"));
/// let _ = Condition::group(|g| {
///     g.where_("age", ">", 18).or_where("age", "<", 5);
/// });
/// ```
pub enum Condition<'a> {
    Compare {
        column: String,
        operator: String,
        value: Value,
    },
    Group(Box<dyn FnOnce(&mut PredicateGroup) + 'a>),
}

impl<'a> Condition<'a> {
    pub fn compare(
        column: impl Into<String>,
        operator: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        Self::Compare {
            column: column.into(),
            operator: operator.into(),
            value: value.into(),
        }
    }

    /// A group composed by `build` on a fresh [`PredicateGroup`].
    pub fn group(build: impl FnOnce(&mut PredicateGroup) + 'a) -> Self {
        Self::Group(Box::new(build))
    }
}

impl<C, O, V> From<(C, O, V)> for Condition<'_>
where
    C: Into<String>,
    O: Into<String>,
    V: Into<Value>,
{
    fn from((column, operator, value): (C, O, V)) -> Self {
        Self::compare(column, operator, value)
    }
}

impl fmt::Debug for Condition<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Compare {
                column,
                operator,
                value,
            } => f
                .debug_struct("Compare")
                .field("column", column)
                .field("operator", operator)
                .field("value", value)
                .finish(),
            Self::Group(_) => f.debug_tuple("Group").field(&"<fn>").finish(),
        }
    }
}
