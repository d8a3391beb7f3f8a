//! In-memory `DocumentStore`.
//!
//! One `RwLock` over all collections: reads share it, and `commit` holds
//! the write half for the whole batch, so a reader never observes half of
//! a guarded pair. That matches the atomicity a hosted document store
//! provides through transactions.
//!
//! Query support mirrors a hosted store's index rules: any number of
//! equality filters OR a single filter with ordering is served; more than
//! one filter combined with ordering would need a composite index and is
//! refused with `UnsupportedQuery`, which exercises callers' client-side
//! fallback paths.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use tracing::trace;
use uuid::Uuid;

use domains::{Direction, DocumentStore, Filter, OrderBy, StoreError, WriteOp};

type Collection = HashMap<Uuid, Value>;

#[derive(Default)]
pub struct MemoryDocumentStore {
    collections: RwLock<HashMap<String, Collection>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_poisoned() -> StoreError {
        StoreError::Backend("store lock poisoned".to_string())
    }

    /// Number of documents currently held in `collection`.
    pub fn len(&self, collection: &str) -> usize {
        self.collections
            .read()
            .map(|c| c.get(collection).map_or(0, Collection::len))
            .unwrap_or(0)
    }

    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }
}

fn matches(doc: &Value, filters: &[Filter]) -> bool {
    filters
        .iter()
        .all(|f| doc.get(&f.field) == Some(&f.value))
}

/// Field comparison for ordering. Numbers compare numerically, strings
/// that both parse as RFC 3339 timestamps compare as instants (a plain
/// string comparison mis-sorts timestamps with differing subsecond
/// precision), other strings and booleans compare directly. A document
/// missing the field sorts first.
fn compare_field(a: &Value, b: &Value, field: &str) -> Ordering {
    match (a.get(field), b.get(field)) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => {
            match (x.parse::<DateTime<Utc>>(), y.parse::<DateTime<Utc>>()) {
                (Ok(tx), Ok(ty)) => tx.cmp(&ty),
                _ => x.cmp(y),
            }
        }
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn insert(&self, collection: &str, id: Uuid, doc: Value) -> Result<(), StoreError> {
        let mut collections = self
            .collections
            .write()
            .map_err(|_| Self::lock_poisoned())?;
        collections
            .entry(collection.to_string())
            .or_default()
            .insert(id, doc);
        trace!(collection, %id, "document inserted");
        Ok(())
    }

    async fn get(&self, collection: &str, id: Uuid) -> Result<Option<Value>, StoreError> {
        let collections = self.collections.read().map_err(|_| Self::lock_poisoned())?;
        Ok(collections
            .get(collection)
            .and_then(|c| c.get(&id))
            .cloned())
    }

    async fn update(
        &self,
        collection: &str,
        id: Uuid,
        fields: Map<String, Value>,
    ) -> Result<(), StoreError> {
        let mut collections = self
            .collections
            .write()
            .map_err(|_| Self::lock_poisoned())?;
        let doc = collections
            .get_mut(collection)
            .and_then(|c| c.get_mut(&id))
            .ok_or_else(|| StoreError::Missing {
                collection: collection.to_string(),
                id,
            })?;
        merge_fields(doc, fields);
        Ok(())
    }

    async fn query(
        &self,
        collection: &str,
        filters: &[Filter],
        order: Option<OrderBy>,
        limit: Option<usize>,
    ) -> Result<Vec<Value>, StoreError> {
        if filters.len() > 1 && order.is_some() {
            return Err(StoreError::UnsupportedQuery {
                collection: collection.to_string(),
                reason: format!(
                    "no composite index for {} filters with ordering",
                    filters.len()
                ),
            });
        }

        let collections = self.collections.read().map_err(|_| Self::lock_poisoned())?;
        let mut docs: Vec<Value> = collections
            .get(collection)
            .map(|c| {
                c.values()
                    .filter(|doc| matches(doc, filters))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        if let Some(order) = order {
            docs.sort_by(|a, b| {
                let ordering = compare_field(a, b, &order.field);
                match order.direction {
                    Direction::Asc => ordering,
                    Direction::Desc => ordering.reverse(),
                }
            });
        }
        if let Some(limit) = limit {
            docs.truncate(limit);
        }
        Ok(docs)
    }

    async fn commit(&self, writes: Vec<WriteOp>) -> Result<(), StoreError> {
        let mut collections = self
            .collections
            .write()
            .map_err(|_| Self::lock_poisoned())?;

        // Validate every write before touching anything.
        for write in &writes {
            let doc = collections
                .get(&write.collection)
                .and_then(|c| c.get(&write.id))
                .ok_or_else(|| StoreError::Missing {
                    collection: write.collection.clone(),
                    id: write.id,
                })?;
            if let Some(guard) = &write.guard {
                if doc.get(&guard.field) != Some(&guard.expected) {
                    return Err(StoreError::PreconditionFailed {
                        collection: write.collection.clone(),
                        id: write.id,
                        field: guard.field.clone(),
                    });
                }
            }
        }

        for write in writes {
            if let Some(doc) = collections
                .get_mut(&write.collection)
                .and_then(|c| c.get_mut(&write.id))
            {
                merge_fields(doc, write.fields);
            }
        }
        Ok(())
    }
}

fn merge_fields(doc: &mut Value, fields: Map<String, Value>) {
    if let Value::Object(existing) = doc {
        for (key, value) in fields {
            existing.insert(key, value);
        }
    }
}
