//! # Application state machine
//!
//! Submission is gated by the availability guard; review is admin-only.
//! Approving an application also flips its listing to `Adopted`, and the
//! two writes go to the store as one guarded batch: any concurrent
//! approval of a second application for the same listing hits the guard
//! and fails as an invalid transition, leaving the listing untouched.

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use domains::{
    ActorContext, Application, ApplicationDraft, ApplicationStatus, AuditAction, DocumentStore,
    DomainError, Filter, ListingStatus, NotificationKind, Recipient, StoreError, TargetType,
    WriteOp,
};

use crate::audit::{AuditEvent, AuditTrail};
use crate::availability::AvailabilityGuard;
use crate::codec;
use crate::collections::{APPLICATIONS, LISTINGS};
use crate::notifications::{NotificationDispatcher, RelatedIds};
use crate::require_admin;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplicationDecision {
    Approve,
    Reject,
}

impl ApplicationDecision {
    fn verb(self) -> &'static str {
        match self {
            ApplicationDecision::Approve => "approve",
            ApplicationDecision::Reject => "reject",
        }
    }
}

#[derive(Clone)]
pub struct ApplicationService {
    store: Arc<dyn DocumentStore>,
    guard: AvailabilityGuard,
    audit: AuditTrail,
    notifier: NotificationDispatcher,
}

impl ApplicationService {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        guard: AvailabilityGuard,
        audit: AuditTrail,
        notifier: NotificationDispatcher,
    ) -> Self {
        Self {
            store,
            guard,
            audit,
            notifier,
        }
    }

    /// Files an adoption application against an `Available` listing and
    /// broadcasts it to the administrators. Several applicants may pass
    /// the availability check for the same listing; the surplus
    /// applications die at review time.
    pub async fn submit(
        &self,
        applicant: &ActorContext,
        listing_id: Uuid,
        draft: ApplicationDraft,
    ) -> Result<Uuid, DomainError> {
        let listing = self.guard.check_and_reserve(listing_id).await?;

        let now = Utc::now();
        let application = Application {
            id: Uuid::now_v7(),
            listing_id,
            applicant_id: applicant.account_id,
            applicant_name: draft.applicant_name,
            phone: draft.phone,
            email: draft.email,
            address: draft.address,
            living_environment: draft.living_environment,
            has_yard: draft.has_yard,
            experience: draft.experience,
            care_plan: draft.care_plan,
            family_members: draft.family_members,
            agree_privacy: draft.agree_privacy,
            status: ApplicationStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        self.store
            .insert(APPLICATIONS, application.id, codec::encode(&application)?)
            .await?;
        info!(
            application = %application.id,
            listing = %listing_id,
            applicant = %applicant.account_id,
            "adoption application submitted"
        );

        self.notifier
            .notify(
                NotificationKind::ApplicationSubmitted,
                Recipient::Role(domains::Role::Admin),
                RelatedIds {
                    listing_id: Some(listing_id),
                    application_id: Some(application.id),
                },
                format!("new adoption application for \"{}\"", listing.name),
            )
            .await;

        Ok(application.id)
    }

    /// Administrator review of one pending application.
    ///
    /// Approval re-validates the listing against its *current* status and
    /// commits `Application → Approved` and `Listing → Adopted` as one
    /// guarded batch; a stale approval (the listing moved on) fails with an
    /// invalid transition and changes nothing.
    pub async fn review(
        &self,
        application_id: Uuid,
        decision: ApplicationDecision,
        actor: &ActorContext,
        reason: Option<String>,
    ) -> Result<(), DomainError> {
        require_admin(actor, "review adoption applications")?;

        let application = self.get(application_id).await?;
        if application.status != ApplicationStatus::Pending {
            return Err(DomainError::InvalidTransition {
                entity: "application",
                from: format!("status is {}", application.status),
                attempted: decision.verb(),
            });
        }

        let now = Utc::now();
        match decision {
            ApplicationDecision::Approve => {
                // Mandatory re-check: another application may have won the
                // listing since this one was filed.
                let listing_doc = self
                    .store
                    .get(LISTINGS, application.listing_id)
                    .await?
                    .ok_or(DomainError::NotFound {
                        entity: "listing",
                        id: application.listing_id.to_string(),
                    })?;
                let listing: domains::Listing = codec::decode(listing_doc)?;
                if listing.status != ListingStatus::Available {
                    return Err(DomainError::InvalidTransition {
                        entity: "application",
                        from: format!("the listing is {}", listing.status),
                        attempted: "approve",
                    });
                }

                let writes = vec![
                    WriteOp::update(
                        APPLICATIONS,
                        application.id,
                        codec::status_fields(&ApplicationStatus::Approved.to_string(), now),
                    )
                    .guarded("status", ApplicationStatus::Pending.to_string()),
                    WriteOp::update(
                        LISTINGS,
                        listing.id,
                        codec::status_fields(&ListingStatus::Adopted.to_string(), now),
                    )
                    .guarded("status", ListingStatus::Available.to_string()),
                ];
                match self.store.commit(writes).await {
                    Ok(()) => {}
                    Err(StoreError::PreconditionFailed { .. }) => {
                        return Err(DomainError::InvalidTransition {
                            entity: "application",
                            from: "the listing or application changed concurrently".to_string(),
                            attempted: "approve",
                        })
                    }
                    Err(error) => return Err(error.into()),
                }
                info!(
                    application = %application.id,
                    listing = %listing.id,
                    admin = %actor.account_id,
                    "application approved, listing adopted"
                );

                self.audit
                    .record(AuditEvent {
                        action_type: AuditAction::AdoptionApprove,
                        actor: actor.clone(),
                        target_id: application.id,
                        target_type: TargetType::Adoption,
                        action: "approve",
                        reason: reason.clone(),
                        previous_status: Some(ApplicationStatus::Pending.to_string()),
                        new_status: Some(ApplicationStatus::Approved.to_string()),
                        metadata: json!({
                            "listing_id": listing.id,
                            "listing_previous_status": ListingStatus::Available.to_string(),
                            "listing_new_status": ListingStatus::Adopted.to_string(),
                        }),
                    })
                    .await;

                self.retire_admin_broadcasts(application.id).await;
                self.notifier
                    .notify(
                        NotificationKind::ApplicationApproved,
                        Recipient::Account(application.applicant_id),
                        RelatedIds {
                            listing_id: Some(listing.id),
                            application_id: Some(application.id),
                        },
                        format!(
                            "your adoption application for \"{}\" was approved",
                            listing.name
                        ),
                    )
                    .await;
            }
            ApplicationDecision::Reject => {
                let write = WriteOp::update(
                    APPLICATIONS,
                    application.id,
                    codec::status_fields(&ApplicationStatus::Rejected.to_string(), now),
                )
                .guarded("status", ApplicationStatus::Pending.to_string());
                match self.store.commit(vec![write]).await {
                    Ok(()) => {}
                    Err(StoreError::PreconditionFailed { .. }) => {
                        return Err(DomainError::InvalidTransition {
                            entity: "application",
                            from: "the application changed concurrently".to_string(),
                            attempted: "reject",
                        })
                    }
                    Err(error) => return Err(error.into()),
                }
                info!(
                    application = %application.id,
                    admin = %actor.account_id,
                    "application rejected"
                );

                self.audit
                    .record(AuditEvent {
                        action_type: AuditAction::AdoptionReject,
                        actor: actor.clone(),
                        target_id: application.id,
                        target_type: TargetType::Adoption,
                        action: "reject",
                        reason: reason.clone(),
                        previous_status: Some(ApplicationStatus::Pending.to_string()),
                        new_status: Some(ApplicationStatus::Rejected.to_string()),
                        metadata: json!({ "listing_id": application.listing_id }),
                    })
                    .await;

                self.retire_admin_broadcasts(application.id).await;
                let message = match &reason {
                    Some(r) => format!("your adoption application was declined: {r}"),
                    None => "your adoption application was declined".to_string(),
                };
                self.notifier
                    .notify(
                        NotificationKind::ApplicationRejected,
                        Recipient::Account(application.applicant_id),
                        RelatedIds {
                            listing_id: Some(application.listing_id),
                            application_id: Some(application.id),
                        },
                        message,
                    )
                    .await;
            }
        }

        Ok(())
    }

    pub async fn get(&self, application_id: Uuid) -> Result<Application, DomainError> {
        let doc = self
            .store
            .get(APPLICATIONS, application_id)
            .await?
            .ok_or(DomainError::NotFound {
                entity: "application",
                id: application_id.to_string(),
            })?;
        codec::decode(doc)
    }

    pub async fn by_applicant(&self, applicant_id: Uuid) -> Result<Vec<Application>, DomainError> {
        let docs = self
            .store
            .query(
                APPLICATIONS,
                &[Filter::eq("applicant_id", applicant_id.to_string())],
                None,
                None,
            )
            .await?;
        codec::decode_all(docs)
    }

    pub async fn for_listing(&self, listing_id: Uuid) -> Result<Vec<Application>, DomainError> {
        let docs = self
            .store
            .query(
                APPLICATIONS,
                &[Filter::eq("listing_id", listing_id.to_string())],
                None,
                None,
            )
            .await?;
        codec::decode_all(docs)
    }

    /// The admin broadcasts for a reviewed application are no longer
    /// actionable; mark them read so the admin inbox stays clean. Failure
    /// here must not fail the review.
    async fn retire_admin_broadcasts(&self, application_id: Uuid) {
        if let Err(error) = self
            .notifier
            .mark_application_broadcasts_read(application_id)
            .await
        {
            warn!(%error, application = %application_id, "could not retire admin broadcasts");
        }
    }
}
