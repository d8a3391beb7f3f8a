//! # Notification dispatcher
//!
//! Creates directed and role-broadcast notifications for workflow events.
//! Dispatch is fire-and-forget relative to the transition that triggered
//! it: a failed write is logged and swallowed, never propagated.

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::{debug, warn};
use uuid::Uuid;

use domains::{
    DocumentStore, DomainError, Notification, NotificationKind, OrderBy, Recipient, Role,
};

use crate::codec;
use crate::collections::NOTIFICATIONS;

/// Workflow entities a notification points back at.
#[derive(Debug, Clone, Copy, Default)]
pub struct RelatedIds {
    pub listing_id: Option<Uuid>,
    pub application_id: Option<Uuid>,
}

#[derive(Clone)]
pub struct NotificationDispatcher {
    store: Arc<dyn DocumentStore>,
}

impl NotificationDispatcher {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Creates one notification. Best-effort; returns the id when the
    /// write went through.
    pub async fn notify(
        &self,
        kind: NotificationKind,
        recipient: Recipient,
        related: RelatedIds,
        message: impl Into<String>,
    ) -> Option<Uuid> {
        let notification = Notification {
            id: Uuid::now_v7(),
            kind,
            recipient,
            listing_id: related.listing_id,
            application_id: related.application_id,
            message: message.into(),
            read: false,
            created_at: Utc::now(),
        };

        let doc = match serde_json::to_value(&notification) {
            Ok(doc) => doc,
            Err(error) => {
                warn!(%error, "notification could not be serialized, dropping it");
                return None;
            }
        };

        match self.store.insert(NOTIFICATIONS, notification.id, doc).await {
            Ok(()) => {
                debug!(notification = %notification.id, ?kind, "notification dispatched");
                Some(notification.id)
            }
            Err(error) => {
                warn!(%error, ?kind, "notification dropped");
                None
            }
        }
    }

    /// Everything visible to one account: its directed notifications plus
    /// broadcasts to its role, newest first.
    pub async fn for_account(
        &self,
        account_id: Uuid,
        role: Role,
    ) -> Result<Vec<Notification>, DomainError> {
        let docs = self
            .store
            .query(NOTIFICATIONS, &[], Some(OrderBy::desc("created_at")), None)
            .await?;
        let mut notifications: Vec<Notification> = codec::decode_all(docs)?;
        notifications.retain(|n| match n.recipient {
            Recipient::Account(id) => id == account_id,
            Recipient::Role(r) => r == role,
        });
        Ok(notifications)
    }

    pub async fn unread_count(&self, account_id: Uuid, role: Role) -> Result<usize, DomainError> {
        let visible = self.for_account(account_id, role).await?;
        Ok(visible.iter().filter(|n| !n.read).count())
    }

    /// Marks one notification read. Idempotent: re-marking a read
    /// notification is a no-op.
    pub async fn mark_read(&self, notification_id: Uuid) -> Result<(), DomainError> {
        let doc = self
            .store
            .get(NOTIFICATIONS, notification_id)
            .await?
            .ok_or(DomainError::NotFound {
                entity: "notification",
                id: notification_id.to_string(),
            })?;
        let notification: Notification = codec::decode(doc)?;
        if notification.read {
            return Ok(());
        }

        let mut fields = serde_json::Map::new();
        fields.insert("read".to_string(), json!(true));
        self.store
            .update(NOTIFICATIONS, notification_id, fields)
            .await?;
        Ok(())
    }

    /// Marks every directed notification of one account read; returns how
    /// many were flipped. Idempotent.
    pub async fn mark_all_read(&self, account_id: Uuid) -> Result<usize, DomainError> {
        let docs = self.store.query(NOTIFICATIONS, &[], None, None).await?;
        let notifications: Vec<Notification> = codec::decode_all(docs)?;

        let mut flipped = 0;
        for notification in notifications {
            if notification.read || notification.recipient != Recipient::Account(account_id) {
                continue;
            }
            let mut fields = serde_json::Map::new();
            fields.insert("read".to_string(), json!(true));
            self.store
                .update(NOTIFICATIONS, notification.id, fields)
                .await?;
            flipped += 1;
        }
        Ok(flipped)
    }

    /// Retires the admin broadcasts that announced an application once it
    /// has been reviewed.
    pub async fn mark_application_broadcasts_read(
        &self,
        application_id: Uuid,
    ) -> Result<usize, DomainError> {
        let docs = self.store.query(NOTIFICATIONS, &[], None, None).await?;
        let notifications: Vec<Notification> = codec::decode_all(docs)?;

        let mut flipped = 0;
        for notification in notifications {
            let is_pending_broadcast = !notification.read
                && notification.kind == NotificationKind::ApplicationSubmitted
                && notification.application_id == Some(application_id)
                && matches!(notification.recipient, Recipient::Role(_));
            if !is_pending_broadcast {
                continue;
            }
            let mut fields = serde_json::Map::new();
            fields.insert("read".to_string(), json!(true));
            self.store
                .update(NOTIFICATIONS, notification.id, fields)
                .await?;
            flipped += 1;
        }
        Ok(flipped)
    }
}
