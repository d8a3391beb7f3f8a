//! # Audit trail
//!
//! Append-only record of every privileged state transition. Writing is
//! best-effort: a failed append is logged and swallowed so the business
//! operation that triggered it never fails on account of its audit trail.

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use domains::{
    ActorContext, AuditAction, AuditRecord, DocumentStore, DomainError, OrderBy, StoreError,
    TargetType,
};

use crate::codec;
use crate::collections::AUDIT_RECORDS;

/// A privileged transition about to be recorded.
#[derive(Debug, Clone)]
pub struct AuditEvent {
    pub action_type: AuditAction,
    pub actor: ActorContext,
    pub target_id: Uuid,
    pub target_type: TargetType,
    /// Short verb form, e.g. "approve".
    pub action: &'static str,
    pub reason: Option<String>,
    pub previous_status: Option<String>,
    pub new_status: Option<String>,
    pub metadata: Value,
}

/// Filter for reading the trail back. All fields combine with AND.
#[derive(Debug, Clone, Default)]
pub struct AuditQuery {
    pub action_type: Option<AuditAction>,
    pub actor_id: Option<Uuid>,
    pub target_id: Option<Uuid>,
    pub target_type: Option<TargetType>,
}

impl AuditQuery {
    fn is_empty(&self) -> bool {
        self.action_type.is_none()
            && self.actor_id.is_none()
            && self.target_id.is_none()
            && self.target_type.is_none()
    }

    fn matches(&self, record: &AuditRecord) -> bool {
        self.action_type.is_none_or(|a| record.action_type == a)
            && self.actor_id.is_none_or(|id| record.actor_id == id)
            && self.target_id.is_none_or(|id| record.target_id == id)
            && self.target_type.is_none_or(|t| record.target_type == t)
    }
}

#[derive(Clone)]
pub struct AuditTrail {
    store: Arc<dyn DocumentStore>,
    query_cap: usize,
}

impl AuditTrail {
    pub fn new(store: Arc<dyn DocumentStore>, query_cap: usize) -> Self {
        Self { store, query_cap }
    }

    /// Appends one record. Never fails the caller; returns the record id
    /// when the append went through.
    pub async fn record(&self, event: AuditEvent) -> Option<Uuid> {
        let record = AuditRecord {
            id: Uuid::now_v7(),
            action_type: event.action_type,
            actor_id: event.actor.account_id,
            actor_email: event.actor.email,
            actor_name: event.actor.name,
            target_id: event.target_id,
            target_type: event.target_type,
            action: event.action.to_string(),
            reason: event.reason,
            previous_status: event.previous_status,
            new_status: event.new_status,
            metadata: event.metadata,
            recorded_at: Utc::now(),
        };

        let doc = match serde_json::to_value(&record) {
            Ok(doc) => doc,
            Err(error) => {
                warn!(%error, "audit record could not be serialized, dropping it");
                return None;
            }
        };

        match self.store.insert(AUDIT_RECORDS, record.id, doc).await {
            Ok(()) => {
                debug!(record = %record.id, action = ?record.action_type, "audit record appended");
                Some(record.id)
            }
            Err(error) => {
                warn!(%error, action = ?record.action_type, "audit record dropped");
                None
            }
        }
    }

    /// Reads the trail newest-first, honoring the configured result cap.
    ///
    /// Filtered reads try the store's own query machinery first; when the
    /// store cannot serve the shape (no matching index), the trail is
    /// fetched whole and filtered here.
    pub async fn query(
        &self,
        filter: &AuditQuery,
        limit: Option<usize>,
    ) -> Result<Vec<AuditRecord>, DomainError> {
        let cap = limit.unwrap_or(self.query_cap).min(self.query_cap);
        let order = OrderBy::desc("recorded_at");

        if !filter.is_empty() {
            let mut filters = Vec::new();
            if let Some(action) = filter.action_type {
                filters.push(domains::Filter::eq("action_type", codec::encode(&action)?));
            }
            if let Some(actor_id) = filter.actor_id {
                filters.push(domains::Filter::eq("actor_id", actor_id.to_string()));
            }
            if let Some(target_id) = filter.target_id {
                filters.push(domains::Filter::eq("target_id", target_id.to_string()));
            }
            if let Some(target_type) = filter.target_type {
                filters.push(domains::Filter::eq(
                    "target_type",
                    codec::encode(&target_type)?,
                ));
            }

            match self
                .store
                .query(AUDIT_RECORDS, &filters, Some(order.clone()), Some(cap))
                .await
            {
                Ok(docs) => return codec::decode_all(docs),
                Err(StoreError::UnsupportedQuery { reason, .. }) => {
                    debug!(%reason, "indexed audit query unsupported, filtering client-side");
                }
                Err(error) => return Err(error.into()),
            }
        }

        let docs = self
            .store
            .query(AUDIT_RECORDS, &[], Some(order), None)
            .await?;
        let mut records: Vec<AuditRecord> = codec::decode_all(docs)?;
        records.retain(|r| filter.matches(r));
        records.truncate(cap);
        Ok(records)
    }
}
