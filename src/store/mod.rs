//! Record store boundary used by the billing core.
//!
//! Records travel as JSON objects so one adapter serves every collection.
//! Typed views (`CompensationRecord`, `PaymentRecord`, ...) are decoded at the
//! call site with [`decode_record`].

mod memory;
mod mysql;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

pub use memory::InMemoryStore;
pub use mysql::MySqlStore;

pub type Record = Map<String, Value>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("invalid identifier `{0}`")]
    InvalidIdentifier(String),

    #[error("malformed record: {0}")]
    Decode(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// One term of a [`Filter`]. All terms of a filter must hold.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Eq(String, Value),
    In(String, Vec<Value>),
}

impl Condition {
    pub fn field(&self) -> &str {
        match self {
            Condition::Eq(field, _) | Condition::In(field, _) => field,
        }
    }

    pub fn matches(&self, record: &Record) -> bool {
        match self {
            Condition::Eq(field, expected) => record.get(field) == Some(expected),
            Condition::In(field, candidates) => record
                .get(field)
                .is_some_and(|value| candidates.contains(value)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<Condition>,
}

impl Filter {
    /// Matches every record in a collection.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.conditions
            .push(Condition::Eq(field.to_string(), value.into()));
        self
    }

    pub fn any_of<V: Into<Value>>(
        mut self,
        field: &str,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.conditions.push(Condition::In(
            field.to_string(),
            values.into_iter().map(Into::into).collect(),
        ));
        self
    }

    /// Builds an equality filter from the fields of a record (upsert keys).
    pub fn from_key(key: &Record) -> Self {
        Self {
            conditions: key
                .iter()
                .map(|(field, value)| Condition::Eq(field.clone(), value.clone()))
                .collect(),
        }
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn matches(&self, record: &Record) -> bool {
        self.conditions.iter().all(|c| c.matches(record))
    }
}

/// Per-collection CRUD over JSON records.
///
/// Stores own the `id`, `created_at` and `updated_at` columns: `id` is
/// assigned on insert and the timestamps are stamped on every write.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn find_one(&self, collection: &str, filter: &Filter)
    -> Result<Option<Record>, StoreError>;

    /// All matching records, ordered by `id`.
    async fn find_many(&self, collection: &str, filter: &Filter) -> Result<Vec<Record>, StoreError>;

    /// Updates the lowest-id record whose fields equal every entry of `key`,
    /// or inserts `key` merged with `fields` when none does. Returns the
    /// stored record.
    async fn upsert(
        &self,
        collection: &str,
        key: &Record,
        fields: Record,
    ) -> Result<Record, StoreError>;

    async fn delete_where(&self, collection: &str, filter: &Filter) -> Result<u64, StoreError>;

    async fn insert_many(&self, collection: &str, records: Vec<Record>) -> Result<(), StoreError>;
}

pub fn decode_record<T: DeserializeOwned>(record: Record) -> Result<T, StoreError> {
    serde_json::from_value(Value::Object(record)).map_err(|e| StoreError::Decode(e.to_string()))
}

pub fn encode_record<T: serde::Serialize>(value: &T) -> Result<Record, StoreError> {
    match serde_json::to_value(value).map_err(|e| StoreError::Decode(e.to_string()))? {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::Decode(format!("expected an object, got {other}"))),
    }
}

/// Reads an unsigned id column out of a raw record.
pub fn record_id(record: &Record, field: &str) -> Result<u64, StoreError> {
    record
        .get(field)
        .and_then(Value::as_u64)
        .ok_or_else(|| StoreError::Decode(format!("missing or non-numeric `{field}`")))
}
