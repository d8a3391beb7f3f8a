//! # Account moderation
//!
//! Administrator actions on accounts: listing them, suspending, and
//! reinstating. Every status flip is audited and announced to the
//! affected account.

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use domains::{
    Account, AccountStatus, ActorContext, AuditAction, DocumentStore, DomainError,
    NotificationKind, OrderBy, Recipient, TargetType,
};

use crate::audit::{AuditEvent, AuditTrail};
use crate::codec;
use crate::collections::ACCOUNTS;
use crate::notifications::{NotificationDispatcher, RelatedIds};
use crate::require_admin;

#[derive(Clone)]
pub struct ModerationService {
    store: Arc<dyn DocumentStore>,
    audit: AuditTrail,
    notifier: NotificationDispatcher,
}

impl ModerationService {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        audit: AuditTrail,
        notifier: NotificationDispatcher,
    ) -> Self {
        Self {
            store,
            audit,
            notifier,
        }
    }

    /// All accounts, newest first.
    pub async fn list_accounts(&self, actor: &ActorContext) -> Result<Vec<Account>, DomainError> {
        require_admin(actor, "list accounts")?;
        let docs = self
            .store
            .query(ACCOUNTS, &[], Some(OrderBy::desc("created_at")), None)
            .await?;
        codec::decode_all(docs)
    }

    pub async fn suspend(
        &self,
        account_id: Uuid,
        actor: &ActorContext,
        reason: Option<String>,
    ) -> Result<(), DomainError> {
        self.set_status(
            account_id,
            actor,
            reason,
            AccountStatus::Suspended,
            AuditAction::UserSuspend,
            "suspend",
            NotificationKind::AccountSuspended,
            "your account has been suspended",
        )
        .await
    }

    pub async fn unsuspend(
        &self,
        account_id: Uuid,
        actor: &ActorContext,
        reason: Option<String>,
    ) -> Result<(), DomainError> {
        self.set_status(
            account_id,
            actor,
            reason,
            AccountStatus::Active,
            AuditAction::UserUnsuspend,
            "unsuspend",
            NotificationKind::AccountReinstated,
            "your account has been reinstated",
        )
        .await
    }

    #[allow(clippy::too_many_arguments)]
    async fn set_status(
        &self,
        account_id: Uuid,
        actor: &ActorContext,
        reason: Option<String>,
        new_status: AccountStatus,
        action_type: AuditAction,
        action: &'static str,
        kind: NotificationKind,
        message: &str,
    ) -> Result<(), DomainError> {
        require_admin(actor, "moderate accounts")?;

        let doc = self
            .store
            .get(ACCOUNTS, account_id)
            .await?
            .ok_or(DomainError::NotFound {
                entity: "account",
                id: account_id.to_string(),
            })?;
        let account: Account = codec::decode(doc)?;
        let previous_status = account.status;

        let now = Utc::now();
        let mut fields = serde_json::Map::new();
        fields.insert("status".to_string(), codec::encode(&new_status)?);
        fields.insert("updated_at".to_string(), json!(now));
        self.store.update(ACCOUNTS, account_id, fields).await?;
        info!(account = %account_id, ?new_status, admin = %actor.account_id, "account status changed");

        self.audit
            .record(AuditEvent {
                action_type,
                actor: actor.clone(),
                target_id: account_id,
                target_type: TargetType::User,
                action,
                reason,
                previous_status: Some(format!("{previous_status}")),
                new_status: Some(format!("{new_status}")),
                metadata: json!({
                    "user_email": account.email,
                    "user_name": account.name,
                }),
            })
            .await;

        self.notifier
            .notify(
                kind,
                Recipient::Account(account_id),
                RelatedIds::default(),
                message,
            )
            .await;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domains::{MockDocumentStore, Role};

    fn admin() -> ActorContext {
        ActorContext {
            account_id: Uuid::now_v7(),
            email: "admin@example.com".into(),
            name: "Admin".into(),
            role: Role::Admin,
        }
    }

    fn user() -> ActorContext {
        ActorContext {
            account_id: Uuid::now_v7(),
            email: "user@example.com".into(),
            name: "User".into(),
            role: Role::User,
        }
    }

    fn service(store: MockDocumentStore) -> ModerationService {
        let store: Arc<dyn DocumentStore> = Arc::new(store);
        ModerationService::new(
            store.clone(),
            AuditTrail::new(store.clone(), 100),
            NotificationDispatcher::new(store),
        )
    }

    #[tokio::test]
    async fn moderation_is_admin_only() {
        let svc = service(MockDocumentStore::new());
        let err = svc
            .suspend(Uuid::now_v7(), &user(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));

        let err = svc.list_accounts(&user()).await.unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
    }

    #[tokio::test]
    async fn suspend_updates_audits_and_notifies() {
        let now = Utc::now();
        let target = Account {
            id: Uuid::now_v7(),
            email: "momo@example.com".into(),
            name: "Momo Fan".into(),
            phone: String::new(),
            status: AccountStatus::Active,
            role: Role::User,
            failed_login_attempts: 0,
            locked_until: None,
            created_at: now,
            updated_at: now,
        };
        let doc = serde_json::to_value(&target).unwrap();

        let mut store = MockDocumentStore::new();
        store.expect_get().returning(move |_, _| Ok(Some(doc.clone())));
        store
            .expect_update()
            .withf(|collection, _, fields| {
                collection == ACCOUNTS && fields["status"] == json!("Suspended")
            })
            .times(1)
            .returning(|_, _, _| Ok(()));
        // One audit record and one notification land as inserts.
        store
            .expect_insert()
            .withf(|collection, _, _| collection == crate::collections::AUDIT_RECORDS)
            .times(1)
            .returning(|_, _, _| Ok(()));
        store
            .expect_insert()
            .withf(|collection, _, _| collection == crate::collections::NOTIFICATIONS)
            .times(1)
            .returning(|_, _, _| Ok(()));

        let svc = service(store);
        svc.suspend(target.id, &admin(), Some("spam listings".into()))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn unknown_account_is_not_found() {
        let mut store = MockDocumentStore::new();
        store.expect_get().returning(|_, _| Ok(None));

        let svc = service(store);
        let err = svc
            .unsuspend(Uuid::now_v7(), &admin(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }
}
