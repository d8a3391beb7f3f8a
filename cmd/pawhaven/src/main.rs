//! # pawhaven
//!
//! Demo entry point: assembles the in-memory adapters behind the ports,
//! then walks one full adoption workflow so the moving parts can be
//! watched through the logs.

use std::sync::Arc;

use anyhow::Context;
use bytes::Bytes;
use tracing::info;
use tracing_subscriber::EnvFilter;

use auth_adapters::MemoryAuthGateway;
use configs::AppConfig;
use domains::{
    ActorContext, ApplicationDraft, AuthGateway, DocumentStore, Gender, ObjectStore, PhotoUpload,
    Role,
};
use services::applications::{ApplicationDecision, ApplicationService};
use services::audit::{AuditQuery, AuditTrail};
use services::availability::AvailabilityGuard;
use services::identity::{IdentityService, RegisterInput};
use services::listings::{ListingDraft, ListingService, ReviewDecision};
use services::notifications::NotificationDispatcher;
use services::search::{SearchFilters, SearchRequest, SearchService};
use services::validation::KeywordScreen;
use storage_adapters::{MemoryDocumentStore, MemoryObjectStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    // 1. Configuration
    let config = AppConfig::load().context("loading configuration")?;

    // 2. Collaborator adapters (in-memory for the demo)
    let store: Arc<dyn DocumentStore> = Arc::new(MemoryDocumentStore::new());
    let media: Arc<dyn ObjectStore> = Arc::new(MemoryObjectStore::new());
    let auth: Arc<dyn AuthGateway> = Arc::new(MemoryAuthGateway::new());

    // 3. Services
    let audit = AuditTrail::new(store.clone(), config.moderation.audit_query_cap);
    let notifier = NotificationDispatcher::new(store.clone());
    let screen = KeywordScreen::from_policy(&config.moderation);

    let identity = IdentityService::new(store.clone(), auth.clone(), config.lockout.clone());
    let listings = ListingService::new(
        store.clone(),
        media,
        audit.clone(),
        notifier.clone(),
        screen,
        config.uploads.clone(),
    );
    let applications = ApplicationService::new(
        store.clone(),
        AvailabilityGuard::new(store.clone()),
        audit.clone(),
        notifier.clone(),
    );
    let search = SearchService::new(store, config.search.clone());

    // 4. Walk one adoption end to end.
    let admin = identity
        .register(RegisterInput {
            email: "admin@pawhaven.example".into(),
            password: "admin-secret".into(),
            name: "Site Admin".into(),
            phone: String::new(),
            role: Some(Role::Admin),
        })
        .await?;
    identity
        .register(RegisterInput {
            email: "owner@pawhaven.example".into(),
            password: "owner-secret".into(),
            name: "Pet Owner".into(),
            phone: "0912-345-678".into(),
            role: None,
        })
        .await?;
    let adopter = identity
        .register(RegisterInput {
            email: "adopter@pawhaven.example".into(),
            password: "adopter-secret".into(),
            name: "Hopeful Adopter".into(),
            phone: "0987-654-321".into(),
            role: None,
        })
        .await?;

    let owner = identity.login("owner@pawhaven.example", "owner-secret").await?;
    let owner_ctx = ActorContext::from(&owner);
    let admin_ctx = ActorContext::from(&admin);
    let adopter_ctx = ActorContext::from(&adopter);

    let submission = listings
        .submit(
            &owner_ctx,
            ListingDraft {
                name: "Momo".into(),
                species: "cat".into(),
                breed: Some("mixed".into()),
                age: Some(1),
                gender: Gender::Female,
                location: "台北市信義區".into(),
                description: "A friendly one-year-old cat looking for a home.".into(),
                vaccinated: true,
                neutered: true,
                healthy: true,
            },
            vec![PhotoUpload {
                file_name: "momo.jpg".into(),
                content_type: Some("image/jpeg".into()),
                bytes: Bytes::from_static(b"\xff\xd8\xff\xe0 demo jpeg"),
            }],
        )
        .await?;
    info!(listing = %submission.listing_id, uploaded = submission.uploaded, "listing submitted");

    listings
        .review(submission.listing_id, ReviewDecision::Approve, &admin_ctx, None)
        .await?;

    let found = search
        .search(SearchRequest {
            filters: SearchFilters {
                species: Some("cat".into()),
                location: Some("台北市".into()),
                ..Default::default()
            },
            ..Default::default()
        })
        .await?;
    info!(hits = found.total, "search over available listings");

    let application_id = applications
        .submit(
            &adopter_ctx,
            submission.listing_id,
            ApplicationDraft {
                applicant_name: adopter_ctx.name.clone(),
                phone: "0987-654-321".into(),
                email: adopter_ctx.email.clone(),
                address: "台北市大安區".into(),
                living_environment: "apartment".into(),
                has_yard: Some(false),
                experience: "grew up with cats".into(),
                care_plan: "indoor cat, yearly checkups".into(),
                family_members: Some(2),
                agree_privacy: true,
            },
        )
        .await?;

    applications
        .review(application_id, ApplicationDecision::Approve, &admin_ctx, None)
        .await?;

    let trail = audit.query(&AuditQuery::default(), Some(10)).await?;
    info!(audit_records = trail.len(), "workflow complete");
    for record in trail {
        info!(
            action = ?record.action_type,
            target = %record.target_id,
            previous = record.previous_status.as_deref().unwrap_or("-"),
            new = record.new_status.as_deref().unwrap_or("-"),
            "audit entry"
        );
    }

    identity.logout().await;
    Ok(())
}
