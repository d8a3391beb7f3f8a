//! # DomainError
//!
//! Centralized error taxonomy for the adoption workflow. Every public
//! operation returns these; collaborator failures are classified and
//! wrapped here so raw backend errors never cross the boundary.

use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{AccountStatus, ListingStatus};

/// The primary error type for all workflow operations.
#[derive(Error, Debug)]
pub enum DomainError {
    /// Malformed or forbidden input. The caller's fault, never retried.
    #[error("validation error: {0}")]
    Validation(String),

    /// A referenced entity is absent.
    #[error("{entity} not found with ID {id}")]
    NotFound { entity: &'static str, id: String },

    /// Uniqueness violation (e.g. email already registered).
    #[error("conflict: {0}")]
    Conflict(String),

    /// The account is inside an active lockout window.
    #[error("account locked until {until}")]
    Locked { until: DateTime<Utc> },

    /// The account's status forbids authentication.
    #[error("{message}")]
    AccountDisabled {
        status: AccountStatus,
        message: String,
    },

    /// Credential verification failed. `remaining_attempts` is present when
    /// a matching account record exists to count against.
    #[error("invalid email or password")]
    InvalidCredentials { remaining_attempts: Option<u32> },

    /// The requested state change is not an edge of the state machine,
    /// including the stale-approval race where the listing moved on.
    /// `from` names the state that blocked it, e.g. "status is Rejected".
    #[error("invalid {entity} transition: cannot {attempted} when {from}")]
    InvalidTransition {
        entity: &'static str,
        from: String,
        attempted: &'static str,
    },

    /// The listing is not open for applications.
    #[error("listing is {status}, not open for applications")]
    Unavailable { status: ListingStatus },

    /// The actor lacks the role the operation requires.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// The listing record was created, but every provided photo failed to
    /// upload.
    #[error("listing {listing_id} was created but all {failed} photo uploads failed")]
    PhotoUploadsFailed { listing_id: Uuid, failed: usize },

    /// Document-store failure, original cause attached.
    #[error("storage error")]
    Storage(#[from] StoreError),

    /// Auth-provider failure that maps to nothing more specific.
    #[error("auth provider error")]
    AuthProvider(#[source] AuthError),
}

/// A specialized Result type for workflow logic.
pub type Result<T> = std::result::Result<T, DomainError>;

/// Failures surfaced by the document-store collaborator.
#[derive(Error, Debug)]
pub enum StoreError {
    /// A write targeted a document that does not exist.
    #[error("no document {id} in collection {collection}")]
    Missing { collection: String, id: Uuid },

    /// The store cannot serve this query shape (e.g. a missing composite
    /// index). Callers are expected to fall back to client-side filtering.
    #[error("unsupported query on {collection}: {reason}")]
    UnsupportedQuery { collection: String, reason: String },

    /// A guarded write observed a different field value than expected.
    /// The whole batch was discarded.
    #[error("precondition failed on {collection}/{id}: {field}")]
    PreconditionFailed {
        collection: String,
        id: Uuid,
        field: String,
    },

    #[error("document serialization failed")]
    Serialization(#[from] serde_json::Error),

    /// Anything else the backend reported.
    #[error("storage backend: {0}")]
    Backend(String),
}

/// Failures surfaced by the auth-provider collaborator.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("email already registered")]
    EmailTaken,

    #[error("credential verification failed")]
    InvalidCredentials,

    #[error("no provider account for that email")]
    UnknownEmail,

    #[error("auth provider: {0}")]
    Provider(String),
}

/// Failure surfaced by the binary-object store.
#[derive(Error, Debug)]
#[error("object store failure at {path}: {reason}")]
pub struct MediaError {
    pub path: String,
    pub reason: String,
}
