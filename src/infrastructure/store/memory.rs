use std::{cmp::Ordering, collections::HashMap};

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;

use super::{new_document_id, Direction, Document, DocumentData, DocumentStore, Filter, Query, StoreTimestamp};
use crate::errors::StoreError;

/// In-process document store. Collections keep insertion order, which is
/// the order documents come back in when no ordering is requested.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Vec<Document>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Puts a document under a caller-chosen id, replacing any existing one.
    pub fn seed(&self, collection: &str, id: &str, data: DocumentData) {
        let mut collections = self.collections.write();
        let docs = collections.entry(collection.to_string()).or_default();
        match docs.iter_mut().find(|doc| doc.id == id) {
            Some(existing) => existing.data = data,
            None => docs.push(Document { id: id.to_string(), data }),
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn query(&self, collection: &str, query: &Query) -> Result<Vec<Document>, StoreError> {
        let collections = self.collections.read();
        let Some(docs) = collections.get(collection) else {
            return Ok(Vec::new());
        };

        let mut matched: Vec<Document> = docs
            .iter()
            .filter(|doc| query.filters.iter().all(|filter| matches_filter(doc, filter)))
            .cloned()
            .collect();
        drop(collections);

        if let Some((field, direction)) = &query.order_by {
            sort_documents(&mut matched, field, *direction);
        }
        if let Some(limit) = query.limit {
            matched.truncate(limit);
        }

        Ok(matched)
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        Ok(self
            .collections
            .read()
            .get(collection)
            .and_then(|docs| docs.iter().find(|doc| doc.id == id).cloned()))
    }

    async fn insert(&self, collection: &str, data: DocumentData) -> Result<String, StoreError> {
        let id = new_document_id();
        self.collections
            .write()
            .entry(collection.to_string())
            .or_default()
            .push(Document { id: id.clone(), data });
        Ok(id)
    }

    async fn update(&self, collection: &str, id: &str, patch: DocumentData) -> Result<(), StoreError> {
        let mut collections = self.collections.write();
        let doc = collections
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|doc| doc.id == id))
            .ok_or_else(|| StoreError::not_found(collection, id))?;

        doc.data.extend(patch);
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let mut collections = self.collections.write();
        let docs = collections
            .get_mut(collection)
            .ok_or_else(|| StoreError::not_found(collection, id))?;

        let before = docs.len();
        docs.retain(|doc| doc.id != id);
        if docs.len() == before {
            return Err(StoreError::not_found(collection, id));
        }
        Ok(())
    }

    async fn increment(&self, collection: &str, id: &str, field: &str, by: i64) -> Result<(), StoreError> {
        let mut collections = self.collections.write();
        let doc = collections
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|doc| doc.id == id))
            .ok_or_else(|| StoreError::not_found(collection, id))?;

        let current = match doc.data.get(field) {
            None | Some(Value::Null) => 0,
            Some(value) => value
                .as_i64()
                .ok_or_else(|| StoreError::Malformed(format!("{collection}/{id}.{field} is not an integer")))?,
        };
        doc.data.insert(field.to_string(), Value::from(current + by));
        Ok(())
    }

    async fn count(&self, collection: &str, query: &Query) -> Result<usize, StoreError> {
        Ok(self.query(collection, query).await?.len())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

fn matches_filter(doc: &Document, filter: &Filter) -> bool {
    match filter {
        Filter::Eq(field, expected) => doc.data.get(field) == Some(expected),
        Filter::ArrayContains(field, expected) => doc
            .data
            .get(field)
            .and_then(Value::as_array)
            .is_some_and(|items| items.contains(expected)),
        Filter::Gte(field, bound) => doc
            .data
            .get(field)
            .is_some_and(|value| same_kind(value, bound) && compare_values(value, bound) != Ordering::Less),
    }
}

/// Stable sort; documents lacking the field (or holding null) go last in
/// either direction.
fn sort_documents(docs: &mut [Document], field: &str, direction: Direction) {
    docs.sort_by(|a, b| {
        let left = a.data.get(field).filter(|v| !v.is_null());
        let right = b.data.get(field).filter(|v| !v.is_null());
        match (left, right) {
            (Some(x), Some(y)) => match direction {
                Direction::Asc => compare_values(x, y),
                Direction::Desc => compare_values(y, x),
            },
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    });
}

fn kind_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Object(_) if StoreTimestamp::from_value(value).is_some() => 4,
        _ => 5,
    }
}

fn same_kind(a: &Value, b: &Value) -> bool {
    let rank = kind_rank(a);
    rank == kind_rank(b) && rank < 5
}

/// Total order over document values: values of the same kind compare
/// naturally, different kinds by a fixed kind rank.
fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or_default();
            let y = y.as_f64().unwrap_or_default();
            x.total_cmp(&y)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => match (StoreTimestamp::from_value(a), StoreTimestamp::from_value(b)) {
            (Some(x), Some(y)) => x.cmp(&y),
            _ => kind_rank(a).cmp(&kind_rank(b)),
        },
    }
}
