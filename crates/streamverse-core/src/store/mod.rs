//! Document-store abstraction behind engagement facts and counters.
//!
//! Documents are flat maps of typed fields addressed by `(collection, id)`.
//! The model mirrors the subset of Firestore the app relies on, so the
//! in-memory and file-backed stores behave like the hosted one.

pub mod firestore;
pub mod local;
pub mod memory;

pub use firestore::FirestoreStore;
pub use local::LocalDocumentStore;
pub use memory::MemoryDocumentStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use thiserror::Error;

pub type Fields = BTreeMap<String, FieldValue>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Integer(i64),
    Double(f64),
    String(String),
    Timestamp(DateTime<Utc>),
}

impl FieldValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(n) => Some(*n),
            FieldValue::Double(n) => Some(*n as i64),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            FieldValue::Timestamp(t) => Some(*t),
            _ => None,
        }
    }

    /// Ordering used by `Query::order_by`. Values of different kinds order
    /// by kind (null < bool < number < timestamp < string).
    pub fn compare(&self, other: &FieldValue) -> Ordering {
        use FieldValue::*;
        match (self, other) {
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Integer(a), Double(b)) => (*a as f64).total_cmp(b),
            (Double(a), Integer(b)) => a.total_cmp(&(*b as f64)),
            (Double(a), Double(b)) => a.total_cmp(b),
            (Timestamp(a), Timestamp(b)) => a.cmp(b),
            (String(a), String(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            FieldValue::Null => 0,
            FieldValue::Bool(_) => 1,
            FieldValue::Integer(_) | FieldValue::Double(_) => 2,
            FieldValue::Timestamp(_) => 3,
            FieldValue::String(_) => 4,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::String(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::String(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        FieldValue::Timestamp(value)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(FieldValue::Null)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
}

impl Document {
    pub fn new(id: impl Into<String>, fields: Fields) -> Self {
        Self { id: id.into(), fields }
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(FieldValue::as_str)
    }

    pub fn get_i64(&self, field: &str) -> Option<i64> {
        self.get(field).and_then(FieldValue::as_i64)
    }

    pub fn get_timestamp(&self, field: &str) -> Option<DateTime<Utc>> {
        self.get(field).and_then(FieldValue::as_timestamp)
    }
}

/// Build a `Fields` map from `(name, value)` pairs.
pub fn fields<I, K, V>(pairs: I) -> Fields
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<FieldValue>,
{
    pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SetMode {
    /// Replace the whole document
    #[default]
    Overwrite,
    /// Update only the given fields, creating the document if needed
    Merge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// Equality filters, optional single-field ordering and a limit.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Query {
    pub equals: Vec<(String, FieldValue)>,
    pub order_by: Option<(String, Direction)>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn where_eq(mut self, field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.equals.push((field.into(), value.into()));
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order_by = Some((field.into(), direction));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Whether `fields` passes every equality filter. Documents missing the
    /// ordering field are excluded too, as Firestore does.
    pub fn matches(&self, fields: &Fields) -> bool {
        let filters_pass = self
            .equals
            .iter()
            .all(|(field, value)| fields.get(field) == Some(value));
        let has_order_field = match &self.order_by {
            Some((field, _)) => fields.contains_key(field),
            None => true,
        };
        filters_pass && has_order_field
    }

    /// Sort and truncate already-filtered documents.
    pub fn arrange(&self, mut docs: Vec<Document>) -> Vec<Document> {
        if let Some((field, direction)) = &self.order_by {
            docs.sort_by(|a, b| {
                let ordering = match (a.get(field), b.get(field)) {
                    (Some(x), Some(y)) => x.compare(y),
                    _ => Ordering::Equal,
                };
                match direction {
                    Direction::Ascending => ordering,
                    Direction::Descending => ordering.reverse(),
                }
            });
        }
        if let Some(limit) = self.limit {
            docs.truncate(limit);
        }
        docs
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("authentication required: {0}")]
    Unauthenticated(String),

    #[error("a toggle for {0} is already in progress")]
    ToggleInFlight(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("store backend returned {status}: {message}")]
    Backend { status: u16, message: String },

    #[error("could not decode document: {0}")]
    Decode(String),

    #[error("persistence error: {0}")]
    Persistence(String),
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        Self::Persistence(err.to_string())
    }
}

impl From<bincode::Error> for StoreError {
    fn from(err: bincode::Error) -> Self {
        Self::Persistence(err.to_string())
    }
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;

    async fn set(&self, collection: &str, id: &str, fields: Fields, mode: SetMode) -> Result<(), StoreError>;

    /// Deleting a missing document is not an error.
    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError>;

    /// Atomically add `deltas` to integer fields, creating the document and
    /// any missing field as needed.
    async fn increment(&self, collection: &str, id: &str, deltas: &[(&str, i64)]) -> Result<(), StoreError>;

    async fn query(&self, collection: &str, query: &Query) -> Result<Vec<Document>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn doc(id: &str, user: &str, at: i64) -> Document {
        Document::new(
            id,
            fields([
                ("userId", FieldValue::from(user)),
                ("createdAt", FieldValue::Timestamp(Utc.timestamp_opt(at, 0).unwrap())),
            ]),
        )
    }

    #[test]
    fn test_query_matches_equality_and_order_field() {
        let query = Query::new().where_eq("userId", "u1").order_by("createdAt", Direction::Descending);
        assert!(query.matches(&doc("a", "u1", 1).fields));
        assert!(!query.matches(&doc("b", "u2", 1).fields));

        let without_timestamp = fields([("userId", "u1")]);
        assert!(!query.matches(&without_timestamp));
    }

    #[test]
    fn test_arrange_orders_and_limits() {
        let query = Query::new().order_by("createdAt", Direction::Descending).limit(2);
        let docs = vec![doc("old", "u1", 10), doc("new", "u1", 30), doc("mid", "u1", 20)];
        let ids: Vec<_> = query.arrange(docs).into_iter().map(|d| d.id).collect();
        assert_eq!(ids, vec!["new", "mid"]);
    }

    #[test]
    fn test_mixed_numeric_comparison() {
        assert_eq!(FieldValue::Integer(2).compare(&FieldValue::Double(2.5)), Ordering::Less);
        assert_eq!(FieldValue::Null.compare(&FieldValue::Bool(false)), Ordering::Less);
    }

    #[test]
    fn test_option_into_field_value() {
        let none: Option<String> = None;
        assert_eq!(FieldValue::from(none), FieldValue::Null);
        assert_eq!(FieldValue::from(Some("x")), FieldValue::String("x".into()));
    }
}
