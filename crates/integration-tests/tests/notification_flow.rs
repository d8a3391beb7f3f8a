//! Notification read-state transitions and recipient visibility.

use domains::{DomainError, NotificationKind, Recipient, Role};
use integration_tests::{application_draft, TestApp};
use uuid::Uuid;

#[tokio::test]
async fn broadcasts_are_visible_to_every_admin_but_not_users() {
    let app = TestApp::new();
    let (_, admin) = app.register_admin().await;
    let (_, owner) = app.register_user("owner@example.com", "Owner").await;
    let (adopter_account, adopter) = app.register_user("adopter@example.com", "Adopter").await;

    let listing_id = app.available_listing(&owner, &admin, "Momo").await;
    app.applications
        .submit(&adopter, listing_id, application_draft(&adopter))
        .await
        .unwrap();

    // Any admin identity sees the broadcast, no matter which account.
    let other_admin_view = app
        .notifier
        .for_account(Uuid::now_v7(), Role::Admin)
        .await
        .unwrap();
    assert!(other_admin_view
        .iter()
        .any(|n| n.kind == NotificationKind::ApplicationSubmitted));

    // The adopter does not: the broadcast went to the Admin role.
    let adopter_view = app
        .notifier
        .for_account(adopter_account.id, Role::User)
        .await
        .unwrap();
    assert!(adopter_view
        .iter()
        .all(|n| n.kind != NotificationKind::ApplicationSubmitted));
}

#[tokio::test]
async fn mark_read_and_mark_all_read_are_idempotent() {
    let app = TestApp::new();
    let account_id = Uuid::now_v7();

    let first = app
        .notifier
        .notify(
            NotificationKind::ListingApproved,
            Recipient::Account(account_id),
            Default::default(),
            "one",
        )
        .await
        .expect("dispatch against the real store succeeds");
    app.notifier
        .notify(
            NotificationKind::ListingRejected,
            Recipient::Account(account_id),
            Default::default(),
            "two",
        )
        .await
        .expect("dispatch against the real store succeeds");

    assert_eq!(
        app.notifier.unread_count(account_id, Role::User).await.unwrap(),
        2
    );

    app.notifier.mark_read(first).await.unwrap();
    app.notifier.mark_read(first).await.unwrap();
    assert_eq!(
        app.notifier.unread_count(account_id, Role::User).await.unwrap(),
        1
    );

    assert_eq!(app.notifier.mark_all_read(account_id).await.unwrap(), 1);
    assert_eq!(app.notifier.mark_all_read(account_id).await.unwrap(), 0);
    assert_eq!(
        app.notifier.unread_count(account_id, Role::User).await.unwrap(),
        0
    );
}

#[tokio::test]
async fn marking_an_unknown_notification_is_not_found() {
    let app = TestApp::new();
    let err = app.notifier.mark_read(Uuid::now_v7()).await.unwrap_err();
    assert!(matches!(err, DomainError::NotFound { .. }));
}

#[tokio::test]
async fn mark_all_read_leaves_role_broadcasts_alone() {
    let app = TestApp::new();
    let (admin_account, _) = app.register_admin().await;

    app.notifier
        .notify(
            NotificationKind::ApplicationSubmitted,
            Recipient::Role(Role::Admin),
            Default::default(),
            "broadcast",
        )
        .await
        .unwrap();
    app.notifier
        .notify(
            NotificationKind::ListingApproved,
            Recipient::Account(admin_account.id),
            Default::default(),
            "directed",
        )
        .await
        .unwrap();

    // Only the directed notification is the account's to mark.
    assert_eq!(app.notifier.mark_all_read(admin_account.id).await.unwrap(), 1);
    assert_eq!(
        app.notifier
            .unread_count(admin_account.id, Role::Admin)
            .await
            .unwrap(),
        1
    );
}
