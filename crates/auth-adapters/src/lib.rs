//! # auth-adapters
//!
//! Argon2-backed in-process implementation of `AuthGateway`. Credentials
//! are hashed the way a self-hosted provider would hash them; nothing is
//! ever stored in the clear. Serves tests, demos, and local development in
//! place of the hosted provider.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use async_trait::async_trait;
use dashmap::DashMap;
use tracing::debug;
use uuid::Uuid;

use domains::{AuthError, AuthGateway};

struct CredentialRecord {
    provider_id: Uuid,
    password_hash: String,
}

#[derive(Default)]
pub struct MemoryAuthGateway {
    /// Keyed by normalized (lowercased) email.
    records: DashMap<String, CredentialRecord>,
    /// Reset mails "sent" per email; inspectable from tests.
    reset_requests: DashMap<String, u32>,
}

impl MemoryAuthGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// How many password-reset mails were dispatched for `email`.
    pub fn reset_requests_for(&self, email: &str) -> u32 {
        self.reset_requests
            .get(&normalize(email))
            .map(|count| *count)
            .unwrap_or(0)
    }
}

fn normalize(email: &str) -> String {
    email.trim().to_lowercase()
}

#[async_trait]
impl AuthGateway for MemoryAuthGateway {
    async fn create_account(&self, email: &str, password: &str) -> Result<Uuid, AuthError> {
        let key = normalize(email);
        if self.records.contains_key(&key) {
            return Err(AuthError::EmailTaken);
        }

        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AuthError::Provider(format!("password hashing failed: {e}")))?
            .to_string();

        let provider_id = Uuid::now_v7();
        self.records.insert(
            key,
            CredentialRecord {
                provider_id,
                password_hash,
            },
        );
        debug!(%provider_id, "provider account created");
        Ok(provider_id)
    }

    async fn verify(&self, email: &str, password: &str) -> Result<Uuid, AuthError> {
        let record = self
            .records
            .get(&normalize(email))
            .ok_or(AuthError::UnknownEmail)?;

        let parsed = PasswordHash::new(&record.password_hash)
            .map_err(|e| AuthError::Provider(format!("stored hash is corrupt: {e}")))?;
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .map_err(|_| AuthError::InvalidCredentials)?;
        Ok(record.provider_id)
    }

    async fn send_password_reset(&self, email: &str) -> Result<(), AuthError> {
        let key = normalize(email);
        if !self.records.contains_key(&key) {
            return Err(AuthError::UnknownEmail);
        }
        *self.reset_requests.entry(key).or_insert(0) += 1;
        debug!("password reset mail dispatched");
        Ok(())
    }

    async fn sign_out(&self) {
        // Session tokens live on the hosted provider; there is nothing to
        // drop locally.
        debug!("provider session terminated");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_verify_round_trip() {
        let gateway = MemoryAuthGateway::new();
        let id = gateway
            .create_account("momo@example.com", "secret1")
            .await
            .unwrap();

        assert_eq!(
            gateway.verify("momo@example.com", "secret1").await.unwrap(),
            id
        );
        assert!(matches!(
            gateway.verify("momo@example.com", "wrong").await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn duplicate_email_is_refused() {
        let gateway = MemoryAuthGateway::new();
        gateway
            .create_account("momo@example.com", "secret1")
            .await
            .unwrap();
        assert!(matches!(
            gateway.create_account("MOMO@example.com", "other2").await,
            Err(AuthError::EmailTaken)
        ));
    }

    #[tokio::test]
    async fn unknown_email_cannot_verify_or_reset() {
        let gateway = MemoryAuthGateway::new();
        assert!(matches!(
            gateway.verify("ghost@example.com", "pw").await,
            Err(AuthError::UnknownEmail)
        ));
        assert!(matches!(
            gateway.send_password_reset("ghost@example.com").await,
            Err(AuthError::UnknownEmail)
        ));
    }

    #[tokio::test]
    async fn reset_requests_are_counted() {
        let gateway = MemoryAuthGateway::new();
        gateway
            .create_account("momo@example.com", "secret1")
            .await
            .unwrap();
        gateway
            .send_password_reset("momo@example.com")
            .await
            .unwrap();
        gateway
            .send_password_reset("momo@example.com")
            .await
            .unwrap();
        assert_eq!(gateway.reset_requests_for("momo@example.com"), 2);
    }
}
