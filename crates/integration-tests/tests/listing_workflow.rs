//! Listing lifecycle: submission with photos, the no-sale validation
//! gate, and administrator review.

use domains::{AuditAction, DomainError, ListingStatus, NotificationKind, Recipient};
use integration_tests::{draft, photo, TestApp};
use services::audit::AuditQuery;
use services::collections;
use services::listings::ReviewDecision;

#[tokio::test]
async fn submission_starts_in_pending_review_with_photos_attached() {
    let app = TestApp::new();
    let (_, owner) = app.register_user("owner@example.com", "Owner").await;

    let submission = app
        .listings
        .submit(
            &owner,
            draft("Momo", "friendly cat"),
            vec![photo("a.jpg"), photo("b.jpg")],
        )
        .await
        .unwrap();
    assert_eq!(submission.uploaded, 2);
    assert_eq!(submission.failed, 0);

    let listing = app.listings.get(submission.listing_id).await.unwrap();
    assert_eq!(listing.status, ListingStatus::PendingReview);
    assert_eq!(listing.owner_id, owner.account_id);

    let photos = app.listings.photos(submission.listing_id).await.unwrap();
    assert_eq!(photos.len(), 2);
    assert_eq!(photos[0].order, 0);
    assert_eq!(photos[1].order, 1);
    assert_eq!(app.media.object_count(), 2);
}

/// A commerce term anywhere in the text kills the submission before
/// anything is persisted.
#[tokio::test]
async fn forbidden_keyword_persists_nothing() {
    let app = TestApp::new();
    let (_, owner) = app.register_user("owner@example.com", "Owner").await;

    let err = app
        .listings
        .submit(&owner, draft("Momo", "賣一隻貓"), vec![photo("a.jpg")])
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation(_)));

    assert!(app.store.is_empty(collections::LISTINGS));
    assert!(app.store.is_empty(collections::PHOTOS));
    assert_eq!(app.media.object_count(), 0);
}

#[tokio::test]
async fn approve_review_opens_the_listing_and_audits() {
    let app = TestApp::new();
    let (_, admin) = app.register_admin().await;
    let (owner_account, owner) = app.register_user("owner@example.com", "Owner").await;

    let submission = app
        .listings
        .submit(&owner, draft("Momo", "friendly cat"), vec![])
        .await
        .unwrap();
    app.listings
        .review(submission.listing_id, ReviewDecision::Approve, &admin, None)
        .await
        .unwrap();

    let listing = app.listings.get(submission.listing_id).await.unwrap();
    assert_eq!(listing.status, ListingStatus::Available);

    let records = app
        .audit
        .query(
            &AuditQuery {
                action_type: Some(AuditAction::PetReviewApprove),
                ..Default::default()
            },
            None,
        )
        .await
        .unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].target_id, submission.listing_id);
    assert_eq!(records[0].previous_status.as_deref(), Some("PendingReview"));
    assert_eq!(records[0].new_status.as_deref(), Some("Available"));
    assert_eq!(records[0].actor_id, admin.account_id);

    // The owner hears about it.
    let inbox = app
        .notifier
        .for_account(owner_account.id, owner_account.role)
        .await
        .unwrap();
    assert!(inbox
        .iter()
        .any(|n| n.kind == NotificationKind::ListingApproved
            && n.recipient == Recipient::Account(owner_account.id)));
}

#[tokio::test]
async fn reject_review_is_terminal() {
    let app = TestApp::new();
    let (_, admin) = app.register_admin().await;
    let (_, owner) = app.register_user("owner@example.com", "Owner").await;

    let submission = app
        .listings
        .submit(&owner, draft("Momo", "friendly cat"), vec![])
        .await
        .unwrap();
    app.listings
        .review(
            submission.listing_id,
            ReviewDecision::Reject,
            &admin,
            Some("incomplete description".into()),
        )
        .await
        .unwrap();

    let listing = app.listings.get(submission.listing_id).await.unwrap();
    assert_eq!(listing.status, ListingStatus::Rejected);

    // A second review of any kind is an invalid transition and changes
    // nothing.
    let err = app
        .listings
        .review(submission.listing_id, ReviewDecision::Approve, &admin, None)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::InvalidTransition { .. }));
    let listing = app.listings.get(submission.listing_id).await.unwrap();
    assert_eq!(listing.status, ListingStatus::Rejected);
}

#[tokio::test]
async fn review_is_admin_only() {
    let app = TestApp::new();
    let (_, owner) = app.register_user("owner@example.com", "Owner").await;

    let submission = app
        .listings
        .submit(&owner, draft("Momo", "friendly cat"), vec![])
        .await
        .unwrap();
    let err = app
        .listings
        .review(submission.listing_id, ReviewDecision::Approve, &owner, None)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Forbidden(_)));

    let listing = app.listings.get(submission.listing_id).await.unwrap();
    assert_eq!(listing.status, ListingStatus::PendingReview);
}

#[tokio::test]
async fn owner_sees_their_listings_newest_first() {
    let app = TestApp::new();
    let (_, owner) = app.register_user("owner@example.com", "Owner").await;
    let (_, other) = app.register_user("other@example.com", "Other").await;

    app.listings
        .submit(&owner, draft("First", "friendly cat"), vec![])
        .await
        .unwrap();
    app.listings
        .submit(&owner, draft("Second", "friendly cat"), vec![])
        .await
        .unwrap();
    app.listings
        .submit(&other, draft("Not mine", "friendly cat"), vec![])
        .await
        .unwrap();

    let mine = app.listings.by_owner(owner.account_id).await.unwrap();
    assert_eq!(mine.len(), 2);
    assert!(mine.iter().all(|l| l.owner_id == owner.account_id));

    let recent = app.listings.recent(2).await.unwrap();
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].name, "Not mine");
}
