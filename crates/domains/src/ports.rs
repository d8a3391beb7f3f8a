//! # Core Traits (Ports)
//!
//! Contracts for the hosted collaborators the workflow delegates to.
//! Adapters implement these; services receive them as `Arc<dyn Trait>` so
//! the core stays testable against in-memory fakes and mockall doubles.

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::{AuthError, MediaError, StoreError};
use crate::models::StoredObject;

/// Equality predicate applied to one document field.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub value: Value,
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

/// Server-side ordering request. Stores may refuse filter+order
/// combinations they have no index for; see [`StoreError::UnsupportedQuery`].
#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

impl OrderBy {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Desc,
        }
    }
}

/// Guard attached to a write: the write (and the whole batch it belongs
/// to) only applies if the stored document currently carries `expected`
/// in `field`.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldGuard {
    pub field: String,
    pub expected: Value,
}

/// One field-merge write inside an atomic batch.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteOp {
    pub collection: String,
    pub id: Uuid,
    pub fields: Map<String, Value>,
    pub guard: Option<FieldGuard>,
}

impl WriteOp {
    pub fn update(collection: impl Into<String>, id: Uuid, fields: Map<String, Value>) -> Self {
        Self {
            collection: collection.into(),
            id,
            fields,
            guard: None,
        }
    }

    /// Attaches a field-equality precondition to this write.
    pub fn guarded(mut self, field: impl Into<String>, expected: impl Into<Value>) -> Self {
        self.guard = Some(FieldGuard {
            field: field.into(),
            expected: expected.into(),
        });
        self
    }
}

/// Data persistence contract over the hosted document store.
///
/// Documents are JSON values keyed by `(collection, id)`. `query` supports
/// equality filters with optional ordering and limit; a store without the
/// matching index fails with [`StoreError::UnsupportedQuery`] and callers
/// fall back to client-side filtering. `commit` applies a write batch
/// atomically, honoring per-write field guards.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn insert(&self, collection: &str, id: Uuid, doc: Value) -> Result<(), StoreError>;

    async fn get(&self, collection: &str, id: Uuid) -> Result<Option<Value>, StoreError>;

    /// Merges `fields` into an existing document.
    async fn update(
        &self,
        collection: &str,
        id: Uuid,
        fields: Map<String, Value>,
    ) -> Result<(), StoreError>;

    async fn query(
        &self,
        collection: &str,
        filters: &[Filter],
        order: Option<OrderBy>,
        limit: Option<usize>,
    ) -> Result<Vec<Value>, StoreError>;

    /// Applies every write or none. A failed guard aborts the batch with
    /// [`StoreError::PreconditionFailed`]; no reader may observe a partial
    /// batch.
    async fn commit(&self, writes: Vec<WriteOp>) -> Result<(), StoreError>;
}

/// Identity contract over the hosted auth provider. Credential storage,
/// verification and session tokens live entirely on the provider side.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait AuthGateway: Send + Sync {
    /// Registers credentials and returns the provider-assigned account id.
    async fn create_account(&self, email: &str, password: &str) -> Result<Uuid, AuthError>;

    /// Verifies credentials and returns the provider account id.
    async fn verify(&self, email: &str, password: &str) -> Result<Uuid, AuthError>;

    async fn send_password_reset(&self, email: &str) -> Result<(), AuthError>;

    /// Drops the provider-side session, if any.
    async fn sign_out(&self);
}

/// Binary-object storage contract for photo uploads. MIME and size
/// constraints are enforced by the caller before `put` is invoked.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put(
        &self,
        path: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<StoredObject, MediaError>;
}
