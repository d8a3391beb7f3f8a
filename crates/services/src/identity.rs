//! # Identity guard
//!
//! Account registration, login with failed-attempt lockout, password
//! reset, and logout. Credential storage and verification live on the
//! hosted auth provider; this service owns the account record and the
//! gating rules around it.
//!
//! The status and lock checks run before any provider round-trip: a
//! suspended or locked account is rejected without spending a credential
//! verification, and with a message the provider could not phrase.

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde_json::{json, Map, Value};
use tracing::info;

use configs::LockoutPolicy;
use domains::{
    Account, AccountStatus, AuthError, AuthGateway, DocumentStore, DomainError, Filter, Role,
};

use crate::codec;
use crate::collections::ACCOUNTS;

/// Registration form as received from the client.
#[derive(Debug, Clone)]
pub struct RegisterInput {
    pub email: String,
    pub password: String,
    pub name: String,
    pub phone: String,
    pub role: Option<Role>,
}

#[derive(Clone)]
pub struct IdentityService {
    store: Arc<dyn DocumentStore>,
    auth: Arc<dyn AuthGateway>,
    lockout: LockoutPolicy,
}

impl IdentityService {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        auth: Arc<dyn AuthGateway>,
        lockout: LockoutPolicy,
    ) -> Self {
        Self {
            store,
            auth,
            lockout,
        }
    }

    /// Creates provider credentials and the account record. The caller's
    /// session is not retained; an explicit login must follow.
    pub async fn register(&self, input: RegisterInput) -> Result<Account, DomainError> {
        let email = input.email.trim();
        if email.is_empty() {
            return Err(DomainError::Validation("email is required".into()));
        }
        if input.password.chars().count() < 6 {
            return Err(DomainError::Validation(
                "password must be at least 6 characters".into(),
            ));
        }
        if input.name.trim().is_empty() {
            return Err(DomainError::Validation("name is required".into()));
        }

        let provider_id = match self.auth.create_account(email, &input.password).await {
            Ok(id) => id,
            Err(AuthError::EmailTaken) => {
                return Err(DomainError::Conflict(format!(
                    "email {email} is already registered"
                )))
            }
            Err(error) => return Err(DomainError::AuthProvider(error)),
        };

        let now = Utc::now();
        let account = Account {
            id: provider_id,
            email: email.to_string(),
            name: input.name.trim().to_string(),
            phone: input.phone,
            status: AccountStatus::Active,
            role: input.role.unwrap_or(Role::User),
            failed_login_attempts: 0,
            locked_until: None,
            created_at: now,
            updated_at: now,
        };
        self.store
            .insert(ACCOUNTS, account.id, codec::encode(&account)?)
            .await?;

        // Registration must not leave a live session behind.
        self.auth.sign_out().await;

        info!(account = %account.id, "account registered");
        Ok(account)
    }

    /// Authenticates and returns the account. Failed attempts count toward
    /// the lockout threshold; a success clears the counter.
    pub async fn login(&self, email: &str, password: &str) -> Result<Account, DomainError> {
        let email = email.trim();
        if email.is_empty() {
            return Err(DomainError::Validation("email is required".into()));
        }
        if password.is_empty() {
            return Err(DomainError::Validation("password is required".into()));
        }

        let existing = self.find_by_email(email).await?;
        if let Some(account) = &existing {
            let now = Utc::now();
            if let Some(until) = account.locked_until {
                if now < until {
                    return Err(DomainError::Locked { until });
                }
            }
            match account.status {
                AccountStatus::Suspended => {
                    return Err(DomainError::AccountDisabled {
                        status: account.status,
                        message: "account is suspended, contact an administrator".into(),
                    })
                }
                AccountStatus::Inactive => {
                    return Err(DomainError::AccountDisabled {
                        status: account.status,
                        message: "account is not activated, contact an administrator".into(),
                    })
                }
                AccountStatus::Active => {}
            }
        }

        match self.auth.verify(email, password).await {
            Ok(provider_id) => {
                let now = Utc::now();
                match existing {
                    Some(mut account) => {
                        account.reset_failed_logins();
                        account.updated_at = now;

                        let mut fields = Map::new();
                        fields.insert("failed_login_attempts".to_string(), json!(0));
                        fields.insert("locked_until".to_string(), Value::Null);
                        fields.insert("updated_at".to_string(), json!(now));
                        self.store.update(ACCOUNTS, account.id, fields).await?;

                        info!(account = %account.id, "login succeeded");
                        Ok(account)
                    }
                    None => {
                        // Provider credentials exist but no account record
                        // does; provision a minimal one so the session has
                        // an identity to hang off.
                        let account = Account {
                            id: provider_id,
                            email: email.to_string(),
                            name: String::new(),
                            phone: String::new(),
                            status: AccountStatus::Active,
                            role: Role::User,
                            failed_login_attempts: 0,
                            locked_until: None,
                            created_at: now,
                            updated_at: now,
                        };
                        self.store
                            .insert(ACCOUNTS, account.id, codec::encode(&account)?)
                            .await?;
                        info!(account = %account.id, "account provisioned on first login");
                        Ok(account)
                    }
                }
            }
            Err(AuthError::InvalidCredentials) => match existing {
                Some(mut account) => {
                    let now = Utc::now();
                    account.register_failed_login(
                        now,
                        self.lockout.max_attempts,
                        Duration::minutes(self.lockout.lock_minutes),
                    );

                    let mut fields = Map::new();
                    fields.insert(
                        "failed_login_attempts".to_string(),
                        json!(account.failed_login_attempts),
                    );
                    fields.insert("locked_until".to_string(), json!(account.locked_until));
                    fields.insert("updated_at".to_string(), json!(now));
                    self.store.update(ACCOUNTS, account.id, fields).await?;

                    Err(DomainError::InvalidCredentials {
                        remaining_attempts: Some(
                            self.lockout
                                .max_attempts
                                .saturating_sub(account.failed_login_attempts),
                        ),
                    })
                }
                None => Err(DomainError::InvalidCredentials {
                    remaining_attempts: None,
                }),
            },
            Err(AuthError::UnknownEmail) => Err(DomainError::NotFound {
                entity: "account",
                id: email.to_string(),
            }),
            Err(error) => Err(DomainError::AuthProvider(error)),
        }
    }

    /// Asks the provider to send a reset mail.
    pub async fn forgot_password(&self, email: &str) -> Result<(), DomainError> {
        let email = email.trim();
        if email.is_empty() {
            return Err(DomainError::Validation("email is required".into()));
        }
        match self.auth.send_password_reset(email).await {
            Ok(()) => Ok(()),
            Err(AuthError::UnknownEmail) => Err(DomainError::NotFound {
                entity: "account",
                id: email.to_string(),
            }),
            Err(error) => Err(DomainError::AuthProvider(error)),
        }
    }

    /// Terminates the provider-side session.
    pub async fn logout(&self) {
        self.auth.sign_out().await;
    }

    pub async fn account(&self, id: uuid::Uuid) -> Result<Account, DomainError> {
        let doc = self
            .store
            .get(ACCOUNTS, id)
            .await?
            .ok_or(DomainError::NotFound {
                entity: "account",
                id: id.to_string(),
            })?;
        codec::decode(doc)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, DomainError> {
        let docs = self
            .store
            .query(ACCOUNTS, &[Filter::eq("email", email)], None, Some(1))
            .await?;
        docs.into_iter().next().map(codec::decode).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domains::{MockAuthGateway, MockDocumentStore};
    use uuid::Uuid;

    fn account_doc(account: &Account) -> Value {
        serde_json::to_value(account).unwrap()
    }

    fn active_account(email: &str) -> Account {
        let now = Utc::now();
        Account {
            id: Uuid::now_v7(),
            email: email.to_string(),
            name: "Momo Fan".into(),
            phone: String::new(),
            status: AccountStatus::Active,
            role: Role::User,
            failed_login_attempts: 0,
            locked_until: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn service(store: MockDocumentStore, auth: MockAuthGateway) -> IdentityService {
        IdentityService::new(Arc::new(store), Arc::new(auth), LockoutPolicy::default())
    }

    #[tokio::test]
    async fn register_rejects_short_passwords_before_the_provider() {
        // No expectations set: touching either collaborator would panic.
        let svc = service(MockDocumentStore::new(), MockAuthGateway::new());
        let err = svc
            .register(RegisterInput {
                email: "a@example.com".into(),
                password: "12345".into(),
                name: "A".into(),
                phone: String::new(),
                role: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn register_maps_taken_email_to_conflict() {
        let mut auth = MockAuthGateway::new();
        auth.expect_create_account()
            .returning(|_, _| Err(AuthError::EmailTaken));

        let svc = service(MockDocumentStore::new(), auth);
        let err = svc
            .register(RegisterInput {
                email: "taken@example.com".into(),
                password: "secret1".into(),
                name: "T".into(),
                phone: String::new(),
                role: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[tokio::test]
    async fn locked_account_is_rejected_without_credential_check() {
        let mut account = active_account("locked@example.com");
        account.failed_login_attempts = 5;
        account.locked_until = Some(Utc::now() + Duration::minutes(10));
        let doc = account_doc(&account);

        let mut store = MockDocumentStore::new();
        store
            .expect_query()
            .returning(move |_, _, _, _| Ok(vec![doc.clone()]));
        // MockAuthGateway has no verify expectation: a provider round-trip
        // here would fail the test.
        let svc = service(store, MockAuthGateway::new());

        let err = svc
            .login("locked@example.com", "whatever")
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Locked { .. }));
    }

    #[tokio::test]
    async fn suspended_account_is_rejected_without_credential_check() {
        let mut account = active_account("banned@example.com");
        account.status = AccountStatus::Suspended;
        let doc = account_doc(&account);

        let mut store = MockDocumentStore::new();
        store
            .expect_query()
            .returning(move |_, _, _, _| Ok(vec![doc.clone()]));
        let svc = service(store, MockAuthGateway::new());

        let err = svc.login("banned@example.com", "pw").await.unwrap_err();
        assert!(matches!(
            err,
            DomainError::AccountDisabled {
                status: AccountStatus::Suspended,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn failed_attempts_count_down_and_the_fifth_locks() {
        let mut account = active_account("momo@example.com");
        account.failed_login_attempts = 4;
        let doc = account_doc(&account);

        let mut store = MockDocumentStore::new();
        store
            .expect_query()
            .returning(move |_, _, _, _| Ok(vec![doc.clone()]));
        store
            .expect_update()
            .withf(|_, _, fields| {
                fields["failed_login_attempts"] == json!(5) && !fields["locked_until"].is_null()
            })
            .times(1)
            .returning(|_, _, _| Ok(()));

        let mut auth = MockAuthGateway::new();
        auth.expect_verify()
            .returning(|_, _| Err(AuthError::InvalidCredentials));

        let svc = service(store, auth);
        let err = svc.login("momo@example.com", "wrong").await.unwrap_err();
        assert!(matches!(
            err,
            DomainError::InvalidCredentials {
                remaining_attempts: Some(0)
            }
        ));
    }

    #[tokio::test]
    async fn successful_login_resets_the_counter() {
        let mut account = active_account("momo@example.com");
        account.failed_login_attempts = 3;
        let id = account.id;
        let doc = account_doc(&account);

        let mut store = MockDocumentStore::new();
        store
            .expect_query()
            .returning(move |_, _, _, _| Ok(vec![doc.clone()]));
        store
            .expect_update()
            .withf(|_, _, fields| {
                fields["failed_login_attempts"] == json!(0) && fields["locked_until"].is_null()
            })
            .times(1)
            .returning(|_, _, _| Ok(()));

        let mut auth = MockAuthGateway::new();
        auth.expect_verify().returning(move |_, _| Ok(id));

        let svc = service(store, auth);
        let logged_in = svc.login("momo@example.com", "right").await.unwrap();
        assert_eq!(logged_in.failed_login_attempts, 0);
        assert!(logged_in.locked_until.is_none());
    }

    #[tokio::test]
    async fn verified_login_without_a_record_provisions_one() {
        let provider_id = Uuid::now_v7();

        let mut store = MockDocumentStore::new();
        store.expect_query().returning(|_, _, _, _| Ok(vec![]));
        store
            .expect_insert()
            .withf(move |collection, id, doc| {
                collection == ACCOUNTS && *id == provider_id && doc["role"] == json!("User")
            })
            .times(1)
            .returning(|_, _, _| Ok(()));

        let mut auth = MockAuthGateway::new();
        auth.expect_verify().returning(move |_, _| Ok(provider_id));

        let svc = service(store, auth);
        let account = svc.login("new@example.com", "pw123456").await.unwrap();
        assert_eq!(account.id, provider_id);
        assert_eq!(account.status, AccountStatus::Active);
    }

    #[tokio::test]
    async fn forgot_password_maps_unknown_email() {
        let mut auth = MockAuthGateway::new();
        auth.expect_send_password_reset()
            .returning(|_| Err(AuthError::UnknownEmail));

        let svc = service(MockDocumentStore::new(), auth);
        let err = svc.forgot_password("ghost@example.com").await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }
}
