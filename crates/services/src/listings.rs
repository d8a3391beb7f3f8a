//! # Listing state machine
//!
//! Submission puts a pet record into `PendingReview`; administrator review
//! moves it to `Available` or `Rejected`. `Adopted` is only reachable
//! through application approval. Photos are uploaded one by one after the
//! record exists, and a partial upload failure does not sink the
//! submission.

use std::sync::Arc;

use chrono::Utc;
use mime::Mime;
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use configs::UploadPolicy;
use domains::{
    ActorContext, AuditAction, DocumentStore, DomainError, Filter, Gender, Listing, ListingStatus,
    NotificationKind, ObjectStore, OrderBy, Photo, PhotoUpload, Recipient, StoreError, TargetType,
    WriteOp,
};

use crate::audit::{AuditEvent, AuditTrail};
use crate::codec;
use crate::collections::{LISTINGS, PHOTOS};
use crate::notifications::{NotificationDispatcher, RelatedIds};
use crate::require_admin;
use crate::validation::{validate_listing, KeywordScreen};

/// Listing fields as submitted by the owner.
#[derive(Debug, Clone)]
pub struct ListingDraft {
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
}

/// Per-photo upload result, reported back to the submitter.
#[derive(Debug)]
pub struct PhotoOutcome {
    pub index: u32,
    pub file_name: String,
    pub result: Result<Photo, String>,
}

/// Overall submission result: the listing always exists once this is
/// returned; photo counts describe how the uploads went.
#[derive(Debug)]
pub struct ListingSubmission {
    pub listing_id: Uuid,
    pub uploaded: usize,
    pub failed: usize,
    pub photos: Vec<PhotoOutcome>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewDecision {
    Approve,
    Reject,
}

impl ReviewDecision {
    fn verb(self) -> &'static str {
        match self {
            ReviewDecision::Approve => "approve",
            ReviewDecision::Reject => "reject",
        }
    }

    fn target(self) -> ListingStatus {
        match self {
            ReviewDecision::Approve => ListingStatus::Available,
            ReviewDecision::Reject => ListingStatus::Rejected,
        }
    }
}

#[derive(Clone)]
pub struct ListingService {
    store: Arc<dyn DocumentStore>,
    media: Arc<dyn ObjectStore>,
    audit: AuditTrail,
    notifier: NotificationDispatcher,
    screen: KeywordScreen,
    uploads: UploadPolicy,
}

impl ListingService {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        media: Arc<dyn ObjectStore>,
        audit: AuditTrail,
        notifier: NotificationDispatcher,
        screen: KeywordScreen,
        uploads: UploadPolicy,
    ) -> Self {
        Self {
            store,
            media,
            audit,
            notifier,
            screen,
            uploads,
        }
    }

    /// Submits a new listing for review, then uploads its photos
    /// sequentially. Fails outright only when validation refuses the draft
    /// or the listing record itself cannot be created; photo failures are
    /// reported per photo, and only all-photos-failed turns into an error.
    pub async fn submit(
        &self,
        owner: &ActorContext,
        draft: ListingDraft,
        photos: Vec<PhotoUpload>,
    ) -> Result<ListingSubmission, DomainError> {
        validate_listing(&self.screen, &draft)?;

        let now = Utc::now();
        let listing = Listing {
            id: Uuid::now_v7(),
            name: draft.name.trim().to_string(),
            species: draft.species,
            breed: draft.breed,
            age: draft.age,
            gender: draft.gender,
            location: draft.location,
            description: draft.description.trim().to_string(),
            vaccinated: draft.vaccinated,
            neutered: draft.neutered,
            healthy: draft.healthy,
            owner_id: owner.account_id,
            status: ListingStatus::PendingReview,
            created_at: now,
            updated_at: now,
        };
        self.store
            .insert(LISTINGS, listing.id, codec::encode(&listing)?)
            .await?;
        info!(listing = %listing.id, owner = %owner.account_id, "listing submitted for review");

        let mut outcomes = Vec::with_capacity(photos.len());
        for (index, upload) in photos.into_iter().enumerate() {
            let index = index as u32;
            let file_name = upload.file_name.clone();
            let result = self.attach_photo(listing.id, index, upload).await;
            if let Err(reason) = &result {
                warn!(listing = %listing.id, index, %reason, "photo upload failed");
            }
            outcomes.push(PhotoOutcome {
                index,
                file_name,
                result,
            });
        }

        let uploaded = outcomes.iter().filter(|o| o.result.is_ok()).count();
        let failed = outcomes.len() - uploaded;
        if failed > 0 && uploaded == 0 {
            return Err(DomainError::PhotoUploadsFailed {
                listing_id: listing.id,
                failed,
            });
        }

        Ok(ListingSubmission {
            listing_id: listing.id,
            uploaded,
            failed,
            photos: outcomes,
        })
    }

    /// Uploads one photo and creates its record. Errors are strings so the
    /// submitter sees exactly why a given photo was dropped.
    async fn attach_photo(
        &self,
        listing_id: Uuid,
        order: u32,
        upload: PhotoUpload,
    ) -> Result<Photo, String> {
        let mime = resolve_mime(&upload);
        if mime.type_() != mime::IMAGE {
            return Err(format!("{} is not an image", mime.essence_str()));
        }
        if upload.bytes.len() > self.uploads.max_photo_bytes {
            return Err(format!(
                "photo is {} bytes, limit is {}",
                upload.bytes.len(),
                self.uploads.max_photo_bytes
            ));
        }

        let photo_id = Uuid::now_v7();
        let extension = mime.subtype().as_str().to_string();
        let path = format!("listings/{listing_id}/photo_{order}_{photo_id}.{extension}");

        let stored = self
            .media
            .put(&path, upload.bytes, mime.essence_str())
            .await
            .map_err(|e| e.to_string())?;

        let photo = Photo {
            id: photo_id,
            listing_id,
            url: stored.url,
            storage_path: stored.path,
            order,
            created_at: Utc::now(),
        };
        let doc = serde_json::to_value(&photo).map_err(|e| e.to_string())?;
        self.store
            .insert(PHOTOS, photo.id, doc)
            .await
            .map_err(|e| e.to_string())?;
        Ok(photo)
    }

    /// Administrator review: `PendingReview → Available | Rejected`. The
    /// write carries a status guard, so a concurrent reviewer loses cleanly
    /// instead of double-applying.
    pub async fn review(
        &self,
        listing_id: Uuid,
        decision: ReviewDecision,
        actor: &ActorContext,
        reason: Option<String>,
    ) -> Result<(), DomainError> {
        require_admin(actor, "review listings")?;

        let listing = self.get(listing_id).await?;
        if listing.status != ListingStatus::PendingReview {
            return Err(DomainError::InvalidTransition {
                entity: "listing",
                from: format!("status is {}", listing.status),
                attempted: decision.verb(),
            });
        }

        let target = decision.target();
        let now = Utc::now();
        let write = WriteOp::update(
            LISTINGS,
            listing_id,
            codec::status_fields(&target.to_string(), now),
        )
        .guarded("status", ListingStatus::PendingReview.to_string());

        match self.store.commit(vec![write]).await {
            Ok(()) => {}
            Err(StoreError::PreconditionFailed { .. }) => {
                let from = match self.get(listing_id).await {
                    Ok(current) => format!("status is {}", current.status),
                    Err(_) => "the listing changed concurrently".to_string(),
                };
                return Err(DomainError::InvalidTransition {
                    entity: "listing",
                    from,
                    attempted: decision.verb(),
                });
            }
            Err(error) => return Err(error.into()),
        }
        info!(listing = %listing_id, ?decision, admin = %actor.account_id, "listing reviewed");

        // Best-effort side effects; the transition above already committed.
        let action_type = match decision {
            ReviewDecision::Approve => AuditAction::PetReviewApprove,
            ReviewDecision::Reject => AuditAction::PetReviewReject,
        };
        self.audit
            .record(AuditEvent {
                action_type,
                actor: actor.clone(),
                target_id: listing_id,
                target_type: TargetType::Pet,
                action: decision.verb(),
                reason: reason.clone(),
                previous_status: Some(ListingStatus::PendingReview.to_string()),
                new_status: Some(target.to_string()),
                metadata: json!({
                    "pet_name": listing.name,
                    "species": listing.species,
                }),
            })
            .await;

        let (kind, message) = match decision {
            ReviewDecision::Approve => (
                NotificationKind::ListingApproved,
                format!("your listing \"{}\" is now open for adoption", listing.name),
            ),
            ReviewDecision::Reject => (
                NotificationKind::ListingRejected,
                match &reason {
                    Some(r) => format!("your listing \"{}\" was rejected: {r}", listing.name),
                    None => format!("your listing \"{}\" was rejected", listing.name),
                },
            ),
        };
        self.notifier
            .notify(
                kind,
                Recipient::Account(listing.owner_id),
                RelatedIds {
                    listing_id: Some(listing_id),
                    application_id: None,
                },
                message,
            )
            .await;

        Ok(())
    }

    pub async fn get(&self, listing_id: Uuid) -> Result<Listing, DomainError> {
        let doc = self
            .store
            .get(LISTINGS, listing_id)
            .await?
            .ok_or(DomainError::NotFound {
                entity: "listing",
                id: listing_id.to_string(),
            })?;
        codec::decode(doc)
    }

    /// Photos of one listing, in display order. The photo collection has
    /// no per-listing index, so this filters and sorts client-side.
    pub async fn photos(&self, listing_id: Uuid) -> Result<Vec<Photo>, DomainError> {
        let docs = self.store.query(PHOTOS, &[], None, None).await?;
        let mut photos: Vec<Photo> = codec::decode_all(docs)?;
        photos.retain(|p| p.listing_id == listing_id);
        photos.sort_by_key(|p| p.order);
        Ok(photos)
    }

    pub async fn by_owner(&self, owner_id: Uuid) -> Result<Vec<Listing>, DomainError> {
        let docs = self
            .store
            .query(
                LISTINGS,
                &[Filter::eq("owner_id", owner_id.to_string())],
                None,
                None,
            )
            .await?;
        let mut listings: Vec<Listing> = codec::decode_all(docs)?;
        listings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(listings)
    }

    /// Newest listings for the landing page. Prefers a server-side sort
    /// and falls back to sorting here when the store refuses the shape.
    pub async fn recent(&self, limit: usize) -> Result<Vec<Listing>, DomainError> {
        let ordered = self
            .store
            .query(
                LISTINGS,
                &[],
                Some(OrderBy::desc("created_at")),
                Some(limit),
            )
            .await;
        let docs = match ordered {
            Ok(docs) => docs,
            Err(StoreError::UnsupportedQuery { reason, .. }) => {
                tracing::debug!(%reason, "ordered listing query unsupported, sorting client-side");
                self.store.query(LISTINGS, &[], None, None).await?
            }
            Err(error) => return Err(error.into()),
        };
        let mut listings: Vec<Listing> = codec::decode_all(docs)?;
        listings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        listings.truncate(limit);
        Ok(listings)
    }
}

/// Content type from the upload itself, falling back to the file name.
fn resolve_mime(upload: &PhotoUpload) -> Mime {
    upload
        .content_type
        .as_deref()
        .and_then(|ct| ct.parse::<Mime>().ok())
        .unwrap_or_else(|| mime_guess::from_path(&upload.file_name).first_or_octet_stream())
}
