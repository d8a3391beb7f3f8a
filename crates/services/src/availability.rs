//! # Availability guard
//!
//! The check gating application submission: only an `Available` listing may
//! receive applications. This is a read followed by the caller's write, so
//! two applicants can both pass it for the same listing; the application
//! review path re-validates against current listing state at approval time
//! and the paired guarded commit makes double-adoption impossible.

use std::sync::Arc;

use domains::{DocumentStore, DomainError, Listing, ListingStatus};
use uuid::Uuid;

use crate::codec;
use crate::collections::LISTINGS;

#[derive(Clone)]
pub struct AvailabilityGuard {
    store: Arc<dyn DocumentStore>,
}

impl AvailabilityGuard {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Confirms the listing is open for applications and returns a
    /// point-in-time snapshot of it.
    pub async fn check_and_reserve(&self, listing_id: Uuid) -> Result<Listing, DomainError> {
        let doc = self
            .store
            .get(LISTINGS, listing_id)
            .await?
            .ok_or(DomainError::NotFound {
                entity: "listing",
                id: listing_id.to_string(),
            })?;
        let listing: Listing = codec::decode(doc)?;

        if listing.status != ListingStatus::Available {
            return Err(DomainError::Unavailable {
                status: listing.status,
            });
        }
        Ok(listing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use domains::{Gender, MockDocumentStore};

    fn listing(status: ListingStatus) -> Listing {
        let now = Utc::now();
        Listing {
            id: Uuid::now_v7(),
            name: "Momo".into(),
            species: "cat".into(),
            breed: None,
            age: Some(1),
            gender: Gender::Female,
            location: "台北市信義區".into(),
            description: "friendly cat".into(),
            vaccinated: true,
            neutered: true,
            healthy: true,
            owner_id: Uuid::now_v7(),
            status,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn available_listing_passes() {
        let open = listing(ListingStatus::Available);
        let doc = serde_json::to_value(&open).unwrap();

        let mut store = MockDocumentStore::new();
        store.expect_get().returning(move |_, _| Ok(Some(doc.clone())));

        let guard = AvailabilityGuard::new(Arc::new(store));
        let snapshot = guard.check_and_reserve(open.id).await.unwrap();
        assert_eq!(snapshot.id, open.id);
    }

    #[tokio::test]
    async fn non_available_statuses_are_refused_with_the_current_status() {
        for status in [
            ListingStatus::PendingReview,
            ListingStatus::Rejected,
            ListingStatus::Adopted,
        ] {
            let closed = listing(status);
            let doc = serde_json::to_value(&closed).unwrap();

            let mut store = MockDocumentStore::new();
            store.expect_get().returning(move |_, _| Ok(Some(doc.clone())));

            let guard = AvailabilityGuard::new(Arc::new(store));
            let err = guard.check_and_reserve(closed.id).await.unwrap_err();
            assert!(matches!(err, DomainError::Unavailable { status: s } if s == status));
        }
    }

    #[tokio::test]
    async fn missing_listing_is_not_found() {
        let mut store = MockDocumentStore::new();
        store.expect_get().returning(|_, _| Ok(None));

        let guard = AvailabilityGuard::new(Arc::new(store));
        let err = guard.check_and_reserve(Uuid::now_v7()).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }
}
