//! Document mapping helpers: models travel across the DocumentStore port
//! as JSON values.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Map, Value};

use domains::{DomainError, StoreError};

pub(crate) fn encode<T: Serialize>(value: &T) -> Result<Value, DomainError> {
    serde_json::to_value(value)
        .map_err(|e| DomainError::Storage(StoreError::Serialization(e)))
}

pub(crate) fn decode<T: DeserializeOwned>(doc: Value) -> Result<T, DomainError> {
    serde_json::from_value(doc)
        .map_err(|e| DomainError::Storage(StoreError::Serialization(e)))
}

pub(crate) fn decode_all<T: DeserializeOwned>(docs: Vec<Value>) -> Result<Vec<T>, DomainError> {
    docs.into_iter().map(decode).collect()
}

/// Field merge for a status transition: the new status plus a touched
/// `updated_at`.
pub(crate) fn status_fields(status: &str, now: DateTime<Utc>) -> Map<String, Value> {
    let mut fields = Map::new();
    fields.insert("status".to_string(), Value::String(status.to_string()));
    fields.insert("updated_at".to_string(), json!(now));
    fields
}
