//! Reading the audit trail: filters, ordering, the result cap, and the
//! client-side fallback for unindexed filter combinations.

use domains::{AuditAction, TargetType};
use integration_tests::{application_draft, draft, TestApp};
use services::applications::ApplicationDecision;
use services::audit::AuditQuery;
use services::listings::ReviewDecision;

/// Runs a couple of workflows and checks the trail they leave behind.
#[tokio::test]
async fn workflow_operations_accumulate_in_the_trail() {
    let app = TestApp::new();
    let (_, admin) = app.register_admin().await;
    let (_, owner) = app.register_user("owner@example.com", "Owner").await;
    let (adopter_account, adopter) = app.register_user("adopter@example.com", "Adopter").await;

    let listing_id = app.available_listing(&owner, &admin, "Momo").await;
    let application_id = app
        .applications
        .submit(&adopter, listing_id, application_draft(&adopter))
        .await
        .unwrap();
    app.applications
        .review(application_id, ApplicationDecision::Approve, &admin, None)
        .await
        .unwrap();
    app.moderation
        .suspend(adopter_account.id, &admin, Some("test".into()))
        .await
        .unwrap();

    // Unfiltered read: everything, newest first.
    let all = app.audit.query(&AuditQuery::default(), None).await.unwrap();
    assert_eq!(all.len(), 3);
    assert!(all
        .windows(2)
        .all(|pair| pair[0].recorded_at >= pair[1].recorded_at));
    assert_eq!(all[0].action_type, AuditAction::UserSuspend);

    // Single filter: served by the store's own index.
    let reviews = app
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
    assert_eq!(reviews.len(), 1);
    assert_eq!(reviews[0].target_id, listing_id);

    // Two filters with ordering: the store refuses, the trail falls back
    // to filtering client-side and must return the same record.
    let adoption = app
        .audit
        .query(
            &AuditQuery {
                target_id: Some(application_id),
                target_type: Some(TargetType::Adoption),
                ..Default::default()
            },
            None,
        )
        .await
        .unwrap();
    assert_eq!(adoption.len(), 1);
    assert_eq!(adoption[0].action_type, AuditAction::AdoptionApprove);
}

#[tokio::test]
async fn result_cap_bounds_every_read() {
    let app = TestApp::new();
    let (_, admin) = app.register_admin().await;
    let (_, owner) = app.register_user("owner@example.com", "Owner").await;

    for i in 0..7 {
        let submission = app
            .listings
            .submit(&owner, draft(&format!("Pet {i}"), "friendly cat"), vec![])
            .await
            .unwrap();
        app.listings
            .review(submission.listing_id, ReviewDecision::Approve, &admin, None)
            .await
            .unwrap();
    }

    let capped = app.audit.query(&AuditQuery::default(), Some(5)).await.unwrap();
    assert_eq!(capped.len(), 5);

    // The newest five, not an arbitrary five.
    let all = app.audit.query(&AuditQuery::default(), None).await.unwrap();
    assert_eq!(all.len(), 7);
    assert_eq!(capped[0].id, all[0].id);
    assert_eq!(capped[4].id, all[4].id);
}

#[tokio::test]
async fn actor_filter_selects_one_admins_actions() {
    let app = TestApp::new();
    let (_, admin) = app.register_admin().await;
    let (_, owner) = app.register_user("owner@example.com", "Owner").await;
    let (second_account, _) = app.register_user("second@example.com", "Second Admin").await;

    app.available_listing(&owner, &admin, "Momo").await;

    let by_admin = app
        .audit
        .query(
            &AuditQuery {
                actor_id: Some(admin.account_id),
                ..Default::default()
            },
            None,
        )
        .await
        .unwrap();
    assert_eq!(by_admin.len(), 1);
    assert_eq!(by_admin[0].actor_email, "admin@example.com");

    let by_other = app
        .audit
        .query(
            &AuditQuery {
                actor_id: Some(second_account.id),
                ..Default::default()
            },
            None,
        )
        .await
        .unwrap();
    assert!(by_other.is_empty());
}
