//! Opaque collection store: documents are JSON objects keyed by
//! `(collection, id)` and queried with equality, array-contains and
//! lower-bound filters, a single ordering and an optional limit.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::errors::StoreError;

pub mod memory;
pub mod postgres;
pub mod timestamp;

pub use memory::MemoryStore;
pub use postgres::PgDocumentStore;
pub use timestamp::StoreTimestamp;

pub type DocumentData = Map<String, Value>;

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub data: DocumentData,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Eq(String, Value),
    ArrayContains(String, Value),
    Gte(String, Value),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filters: Vec<Filter>,
    pub order_by: Option<(String, Direction)>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::Eq(field.to_string(), value.into()));
        self
    }

    pub fn array_contains(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::ArrayContains(field.to_string(), value.into()));
        self
    }

    pub fn gte(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::Gte(field.to_string(), value.into()));
        self
    }

    pub fn order_by(mut self, field: &str, direction: Direction) -> Self {
        self.order_by = Some((field.to_string(), direction));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Published-only base query, the starting point of every public read.
    pub fn published() -> Self {
        Self::new().eq("published", true)
    }
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn query(&self, collection: &str, query: &Query) -> Result<Vec<Document>, StoreError>;

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;

    /// Adds a document under a freshly generated id and returns that id.
    async fn insert(&self, collection: &str, data: DocumentData) -> Result<String, StoreError>;

    /// Shallow-merges `patch` into an existing document.
    async fn update(&self, collection: &str, id: &str, patch: DocumentData) -> Result<(), StoreError>;

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError>;

    /// Atomically adds `by` to a numeric field, treating a missing field as 0.
    async fn increment(&self, collection: &str, id: &str, field: &str, by: i64) -> Result<(), StoreError>;

    async fn count(&self, collection: &str, query: &Query) -> Result<usize, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}

pub(crate) fn new_document_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Serializes an insert model into document fields.
pub fn to_document<T: serde::Serialize>(value: &T) -> Result<DocumentData, StoreError> {
    match serde_json::to_value(value) {
        Ok(Value::Object(data)) => Ok(data),
        Ok(other) => Err(StoreError::Malformed(format!("expected an object, got {other}"))),
        Err(e) => Err(StoreError::Malformed(e.to_string())),
    }
}
