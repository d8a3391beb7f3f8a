//! # configs
//!
//! Typed configuration for the adoption workflow. Values come from an
//! optional `pawhaven.toml` next to the binary plus `PAWHAVEN__*`
//! environment variables (a `.env` file is honored first), with defaults
//! matching the production policy.

use secrecy::SecretString;
use serde::Deserialize;
use thiserror::Error;

/// Commerce-related terms that make a listing (or a shelter search) a sale
/// attempt rather than an adoption. Overridable via configuration.
pub const DEFAULT_FORBIDDEN_KEYWORDS: &[&str] = &[
    "出售", "販賣", "賣", "買", "購買", "售", "販售", "價格", "價錢", "費用", "元", "塊", "錢",
    "交易", "轉讓", "轉售", "轉賣",
];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("configuration: {0}")]
    Load(#[from] config::ConfigError),
}

/// Failed-login lockout policy.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LockoutPolicy {
    /// Consecutive failures that trigger a lock.
    pub max_attempts: u32,
    /// Length of the lock window, in minutes.
    pub lock_minutes: i64,
}

impl Default for LockoutPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            lock_minutes: 30,
        }
    }
}

/// Photo upload constraints, enforced before the object store is called.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UploadPolicy {
    pub max_photo_bytes: usize,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            max_photo_bytes: 10 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchDefaults {
    pub page_size: usize,
}

impl Default for SearchDefaults {
    fn default() -> Self {
        Self { page_size: 10 }
    }
}

/// Moderation tunables: the no-sale keyword list and the audit query cap.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModerationPolicy {
    pub forbidden_keywords: Vec<String>,
    pub audit_query_cap: usize,
}

impl Default for ModerationPolicy {
    fn default() -> Self {
        Self {
            forbidden_keywords: DEFAULT_FORBIDDEN_KEYWORDS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            audit_query_cap: 100,
        }
    }
}

/// Credentials for a hosted backend project. Unused by the in-memory
/// adapters; a real provider adapter consumes these.
#[derive(Debug, Deserialize)]
pub struct ProviderSettings {
    pub project_id: String,
    pub api_key: SecretString,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub lockout: LockoutPolicy,
    pub uploads: UploadPolicy,
    pub search: SearchDefaults,
    pub moderation: ModerationPolicy,
    pub provider: Option<ProviderSettings>,
}

impl AppConfig {
    /// Loads configuration from `pawhaven.toml` (optional) and the
    /// environment. `PAWHAVEN__LOCKOUT__MAX_ATTEMPTS=3` style variables
    /// override file values.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let raw = config::Config::builder()
            .add_source(config::File::with_name("pawhaven").required(false))
            .add_source(
                config::Environment::with_prefix("PAWHAVEN")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        let cfg: AppConfig = raw.try_deserialize()?;
        tracing::debug!(
            max_attempts = cfg.lockout.max_attempts,
            lock_minutes = cfg.lockout.lock_minutes,
            "configuration loaded"
        );
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_policy() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.lockout.max_attempts, 5);
        assert_eq!(cfg.lockout.lock_minutes, 30);
        assert_eq!(cfg.uploads.max_photo_bytes, 10 * 1024 * 1024);
        assert_eq!(cfg.moderation.audit_query_cap, 100);
        assert!(cfg
            .moderation
            .forbidden_keywords
            .iter()
            .any(|k| k == "販賣"));
        assert!(cfg.provider.is_none());
    }
}
