//! # Domain Models
//!
//! These structs represent the core entities of the adoption workflow.
//! We use UUID v7 for time-ordered, globally unique identification.

use std::fmt;

use bytes::Bytes;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Gating state of an account. Only `Active` accounts may authenticate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountStatus {
    Active,
    Suspended,
    Inactive,
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AccountStatus::Active => "Active",
            AccountStatus::Suspended => "Suspended",
            AccountStatus::Inactive => "Inactive",
        };
        f.write_str(s)
    }
}

/// Authorization tag carried by every account. Behavior differences between
/// ordinary users and administrators are role-gated permission checks, not a
/// type hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    User,
    Admin,
}

/// Identity and authorization unit. Never physically deleted; moderation
/// flips `status` instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub phone: String,
    pub status: AccountStatus,
    pub role: Role,
    pub failed_login_attempts: u32,
    /// Set once `failed_login_attempts` reaches the lockout threshold.
    /// The lock expires by itself; there is no explicit unlock transition.
    pub locked_until: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Whether the account is inside an active lock window.
    pub fn is_locked(&self, now: DateTime<Utc>) -> bool {
        matches!(self.locked_until, Some(until) if now < until)
    }

    /// Records one failed credential check. Once the count reaches
    /// `max_attempts` the account is locked for `lock_for`.
    pub fn register_failed_login(
        &mut self,
        now: DateTime<Utc>,
        max_attempts: u32,
        lock_for: Duration,
    ) {
        self.failed_login_attempts += 1;
        if self.failed_login_attempts >= max_attempts {
            self.locked_until = Some(now + lock_for);
        }
    }

    /// Clears the failure counter and any lock after a successful login.
    pub fn reset_failed_logins(&mut self) {
        self.failed_login_attempts = 0;
        self.locked_until = None;
    }
}

/// Caller identity threaded through every operation that needs to know who
/// is acting. Replaces any notion of ambient session state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorContext {
    pub account_id: Uuid,
    pub email: String,
    pub name: String,
    pub role: Role,
}

impl ActorContext {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl From<&Account> for ActorContext {
    fn from(account: &Account) -> Self {
        Self {
            account_id: account.id,
            email: account.email.clone(),
            name: account.name.clone(),
            role: account.role,
        }
    }
}

/// Lifecycle state of a listing. Transitions are monotonic along
/// `PendingReview → {Available, Rejected}` and `Available → Adopted`;
/// `Rejected` and `Adopted` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ListingStatus {
    PendingReview,
    Available,
    Rejected,
    Adopted,
}

impl ListingStatus {
    /// Whether the state machine permits moving from `self` to `next`.
    pub fn can_become(self, next: ListingStatus) -> bool {
        use ListingStatus::*;
        matches!(
            (self, next),
            (PendingReview, Available) | (PendingReview, Rejected) | (Available, Adopted)
        )
    }
}

impl fmt::Display for ListingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ListingStatus::PendingReview => "PendingReview",
            ListingStatus::Available => "Available",
            ListingStatus::Rejected => "Rejected",
            ListingStatus::Adopted => "Adopted",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
    #[default]
    Unknown,
}

/// An adoptable-animal record moving through the review-to-adoption
/// workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Listing {
    pub id: Uuid,
    pub name: String,
    pub species: String,
    pub breed: Option<String>,
    pub age: Option<u8>,
    pub gender: Gender,
    pub location: String,
    pub description: String,
    pub vaccinated: bool,
    pub neutered: bool,
    pub healthy: bool,
    /// The account that submitted the animal.
    pub owner_id: Uuid,
    pub status: ListingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Ordered media attached to a listing. Owned exclusively by its listing,
/// never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Photo {
    pub id: Uuid,
    pub listing_id: Uuid,
    pub url: String,
    pub storage_path: String,
    /// 0-based position, unique per listing.
    pub order: u32,
    pub created_at: DateTime<Utc>,
}

/// Raw photo payload as received from the submitting client.
#[derive(Debug, Clone)]
pub struct PhotoUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

/// Lifecycle state of an adoption application.
/// `Pending → {Approved, Rejected}`; both outcomes are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApplicationStatus {
    Pending,
    Approved,
    Rejected,
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ApplicationStatus::Pending => "Pending",
            ApplicationStatus::Approved => "Approved",
            ApplicationStatus::Rejected => "Rejected",
        };
        f.write_str(s)
    }
}

/// An adoption request against one listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Application {
    pub id: Uuid,
    pub listing_id: Uuid,
    pub applicant_id: Uuid,
    pub applicant_name: String,
    pub phone: String,
    pub email: String,
    pub address: String,
    pub living_environment: String,
    pub has_yard: Option<bool>,
    pub experience: String,
    pub care_plan: String,
    pub family_members: Option<u8>,
    pub agree_privacy: bool,
    pub status: ApplicationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Contact and eligibility fields supplied by the applicant; the service
/// fills in identity, status and timestamps.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApplicationDraft {
    pub applicant_name: String,
    pub phone: String,
    pub email: String,
    pub address: String,
    pub living_environment: String,
    pub has_yard: Option<bool>,
    pub experience: String,
    pub care_plan: String,
    pub family_members: Option<u8>,
    pub agree_privacy: bool,
}

/// The class of privileged transition an audit record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    PetReviewApprove,
    PetReviewReject,
    AdoptionApprove,
    AdoptionReject,
    UserSuspend,
    UserUnsuspend,
}

/// Kind of entity an audit record points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetType {
    Pet,
    Adoption,
    User,
}

/// Immutable log entry for a privileged transition. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub id: Uuid,
    pub action_type: AuditAction,
    pub actor_id: Uuid,
    pub actor_email: String,
    pub actor_name: String,
    pub target_id: Uuid,
    pub target_type: TargetType,
    /// Short verb form, e.g. "approve", "suspend".
    pub action: String,
    pub reason: Option<String>,
    pub previous_status: Option<String>,
    pub new_status: Option<String>,
    /// Free-form bucket for anything the action wants to preserve.
    pub metadata: Value,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationKind {
    ApplicationSubmitted,
    ApplicationApproved,
    ApplicationRejected,
    ListingApproved,
    ListingRejected,
    AccountSuspended,
    AccountReinstated,
}

/// Who a notification is addressed to: one account, or everyone holding a
/// role. The enum makes the either/or structural.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recipient {
    Account(Uuid),
    Role(Role),
}

/// Directed or role-broadcast message about a workflow event. Mutated only
/// by read-state transitions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub kind: NotificationKind,
    pub recipient: Recipient,
    pub listing_id: Option<Uuid>,
    pub application_id: Option<Uuid>,
    pub message: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

/// One page of results plus the bookkeeping a UI needs to render paging
/// controls. Pages are 1-indexed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub page_size: usize,
    pub total: usize,
    pub total_pages: usize,
    pub has_next: bool,
    pub has_prev: bool,
}

impl<T> Page<T> {
    /// Slices `all` (already filtered and sorted) down to the requested
    /// page. A page past the end yields an empty item list but keeps the
    /// totals accurate.
    pub fn slice(all: Vec<T>, page: usize, page_size: usize) -> Self {
        let page = page.max(1);
        let page_size = page_size.max(1);
        let total = all.len();
        let total_pages = total.div_ceil(page_size);
        let items: Vec<T> = all
            .into_iter()
            .skip((page - 1) * page_size)
            .take(page_size)
            .collect();
        Self {
            items,
            page,
            page_size,
            total,
            total_pages,
            has_next: page < total_pages,
            has_prev: page > 1 && total_pages > 0,
        }
    }
}

/// A partner shelter site shown in the directory. Static reference data,
/// not persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShelterSite {
    pub id: String,
    pub name: String,
    pub address: String,
    pub phone: String,
    pub email: String,
    pub website_url: String,
    pub map_url: String,
    pub description: String,
    pub region: String,
}

/// Reference to an object persisted in the binary store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredObject {
    pub url: String,
    pub path: String,
}
