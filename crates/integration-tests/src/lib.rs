//! Shared harness for the end-to-end workflow tests: real in-memory
//! adapters behind the ports, every service wired the way the binary
//! wires them.

use std::sync::Arc;

use bytes::Bytes;
use uuid::Uuid;

use auth_adapters::MemoryAuthGateway;
use configs::AppConfig;
use domains::{
    Account, ActorContext, ApplicationDraft, DocumentStore, Gender, PhotoUpload, Role,
};
use services::applications::ApplicationService;
use services::audit::AuditTrail;
use services::availability::AvailabilityGuard;
use services::identity::{IdentityService, RegisterInput};
use services::listings::{ListingDraft, ListingService, ReviewDecision};
use services::moderation::ModerationService;
use services::notifications::NotificationDispatcher;
use services::search::SearchService;
use services::shelters::ShelterDirectory;
use services::validation::KeywordScreen;
use storage_adapters::{MemoryDocumentStore, MemoryObjectStore};

pub struct TestApp {
    pub store: Arc<MemoryDocumentStore>,
    pub media: Arc<MemoryObjectStore>,
    pub auth: Arc<MemoryAuthGateway>,
    pub identity: IdentityService,
    pub listings: ListingService,
    pub applications: ApplicationService,
    pub moderation: ModerationService,
    pub search: SearchService,
    pub shelters: ShelterDirectory,
    pub audit: AuditTrail,
    pub notifier: NotificationDispatcher,
}

impl TestApp {
    pub fn new() -> Self {
        let config = AppConfig::default();
        let store = Arc::new(MemoryDocumentStore::new());
        let media = Arc::new(MemoryObjectStore::new());
        let auth = Arc::new(MemoryAuthGateway::new());

        let docs: Arc<dyn DocumentStore> = store.clone();
        let audit = AuditTrail::new(docs.clone(), config.moderation.audit_query_cap);
        let notifier = NotificationDispatcher::new(docs.clone());
        let screen = KeywordScreen::from_policy(&config.moderation);

        let identity = IdentityService::new(docs.clone(), auth.clone(), config.lockout.clone());
        let listings = ListingService::new(
            docs.clone(),
            media.clone(),
            audit.clone(),
            notifier.clone(),
            screen.clone(),
            config.uploads.clone(),
        );
        let applications = ApplicationService::new(
            docs.clone(),
            AvailabilityGuard::new(docs.clone()),
            audit.clone(),
            notifier.clone(),
        );
        let moderation = ModerationService::new(docs.clone(), audit.clone(), notifier.clone());
        let search = SearchService::new(docs, config.search.clone());
        let shelters = ShelterDirectory::new(screen);

        Self {
            store,
            media,
            auth,
            identity,
            listings,
            applications,
            moderation,
            search,
            shelters,
            audit,
            notifier,
        }
    }

    pub async fn register_admin(&self) -> (Account, ActorContext) {
        self.register("admin@example.com", "Site Admin", Some(Role::Admin))
            .await
    }

    pub async fn register_user(&self, email: &str, name: &str) -> (Account, ActorContext) {
        self.register(email, name, None).await
    }

    async fn register(
        &self,
        email: &str,
        name: &str,
        role: Option<Role>,
    ) -> (Account, ActorContext) {
        let account = self
            .identity
            .register(RegisterInput {
                email: email.to_string(),
                password: "correct-horse".to_string(),
                name: name.to_string(),
                phone: String::new(),
                role,
            })
            .await
            .expect("registration should succeed");
        let ctx = ActorContext::from(&account);
        (account, ctx)
    }

    /// Submits a listing and approves it, returning an `Available`
    /// listing id ready for applications.
    pub async fn available_listing(
        &self,
        owner: &ActorContext,
        admin: &ActorContext,
        name: &str,
    ) -> Uuid {
        let submission = self
            .listings
            .submit(owner, draft(name, "friendly cat"), vec![photo("a.jpg")])
            .await
            .expect("submission should succeed");
        self.listings
            .review(submission.listing_id, ReviewDecision::Approve, admin, None)
            .await
            .expect("review should succeed");
        submission.listing_id
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

pub fn draft(name: &str, description: &str) -> ListingDraft {
    ListingDraft {
        name: name.to_string(),
        species: "cat".to_string(),
        breed: None,
        age: Some(1),
        gender: Gender::Female,
        location: "台北市信義區".to_string(),
        description: description.to_string(),
        vaccinated: true,
        neutered: true,
        healthy: true,
    }
}

pub fn photo(file_name: &str) -> PhotoUpload {
    PhotoUpload {
        file_name: file_name.to_string(),
        content_type: Some("image/jpeg".to_string()),
        bytes: Bytes::from_static(b"\xff\xd8\xff\xe0 test jpeg"),
    }
}

pub fn application_draft(applicant: &ActorContext) -> ApplicationDraft {
    ApplicationDraft {
        applicant_name: applicant.name.clone(),
        phone: "0912-345-678".to_string(),
        email: applicant.email.clone(),
        address: "台北市大安區".to_string(),
        living_environment: "apartment".to_string(),
        has_yard: Some(false),
        experience: "two previous cats".to_string(),
        care_plan: "indoor, yearly checkups".to_string(),
        family_members: Some(2),
        agree_privacy: true,
    }
}
