//! # services
//!
//! The workflow core: account identity and lockout, the listing and
//! application state machines, the availability guard, the audit trail
//! with its notification dispatcher, listing search, and the shelter
//! directory. Everything here is plain orchestration over the collaborator
//! ports defined in `domains`; no I/O happens outside those ports.

pub mod applications;
pub mod audit;
pub mod availability;
pub mod identity;
pub mod listings;
pub mod moderation;
pub mod notifications;
pub mod search;
pub mod shelters;
pub mod validation;

mod codec;

use domains::{ActorContext, DomainError};

/// Document-store collection names shared by services and tests.
pub mod collections {
    pub const ACCOUNTS: &str = "accounts";
    pub const LISTINGS: &str = "listings";
    pub const PHOTOS: &str = "photos";
    pub const APPLICATIONS: &str = "applications";
    pub const AUDIT_RECORDS: &str = "audit_records";
    pub const NOTIFICATIONS: &str = "notifications";
}

/// Gate for admin-only operations.
pub(crate) fn require_admin(actor: &ActorContext, action: &str) -> Result<(), DomainError> {
    if actor.is_admin() {
        Ok(())
    } else {
        Err(DomainError::Forbidden(format!(
            "only administrators may {action}"
        )))
    }
}
