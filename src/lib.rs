use std::sync::Arc;

mod domain;
mod interfaces;
mod infrastructure;
pub mod errors;
pub mod settings;
pub mod constants;
pub mod telemetry;
pub mod graceful_shutdown;
pub mod background_task;

pub use domain::{entities, ranking, use_cases};
pub use interfaces::{handlers, middlewares, repositories, routes};
pub use infrastructure::{auth, cache, db, mail, recaptcha, store, utils};

use auth::jwt::JwtService;
use cache::{FanOutInvalidator, LocalInvalidator, PeerInvalidator, TagInvalidator, TaggedCache};
use mail::{DisabledMailer, Mailer, ResendMailer};
use recaptcha::{CaptchaVerifier, RecaptchaVerifier};
use repositories::store_repo::{StoreBlogPostRepo, StoreContactRepo, StoreProjectRepo};
use store::DocumentStore;
use use_cases::{
    auth::{AdminCredentials, AuthHandler},
    blog::BlogPostHandler,
    contact::{ContactHandler, ContactSettings},
    projects::ProjectHandler,
    revalidation::RevalidationHandler,
};

pub type AppProjectHandler = ProjectHandler<StoreProjectRepo>;
pub type AppBlogPostHandler = BlogPostHandler<StoreBlogPostRepo>;
pub type AppContactHandler = ContactHandler<StoreContactRepo>;
pub type AppAuthHandler = AuthHandler<JwtService>;

pub struct AppState {
    pub project_handler: AppProjectHandler,
    pub blog_handler: AppBlogPostHandler,
    pub contact_handler: AppContactHandler,
    pub auth_handler: AppAuthHandler,
    pub revalidation_handler: RevalidationHandler,
    pub cache: Arc<TaggedCache>,
    pub store: Arc<dyn DocumentStore>,
    pub trust_x_forwarded_for: bool,
}

impl AppState {
    /// Wires the production mail and reCAPTCHA clients.
    pub fn new(config: &settings::AppConfig, store: Arc<dyn DocumentStore>) -> Self {
        let client = reqwest::Client::new();

        let mailer: Arc<dyn Mailer> = match config.resend_api_key.as_deref() {
            Some(key) if !key.trim().is_empty() => Arc::new(ResendMailer::new(client.clone(), key.to_string())),
            _ => {
                tracing::warn!("RESEND_API_KEY not set, contact form emails will fail");
                Arc::new(DisabledMailer)
            }
        };
        let captcha: Arc<dyn CaptchaVerifier> =
            Arc::new(RecaptchaVerifier::new(client, config.recaptcha_secret.clone()));

        Self::with_services(config, store, mailer, captcha)
    }

    pub fn with_services(
        config: &settings::AppConfig,
        store: Arc<dyn DocumentStore>,
        mailer: Arc<dyn Mailer>,
        captcha: Arc<dyn CaptchaVerifier>,
    ) -> Self {
        let cache = Arc::new(TaggedCache::new());
        let ttls = config.cache_ttls();

        let local: Arc<dyn TagInvalidator> = Arc::new(LocalInvalidator::new(Arc::clone(&cache)));
        let invalidator: Arc<dyn TagInvalidator> = if config.revalidate_peers.is_empty() {
            Arc::clone(&local)
        } else {
            let peers = PeerInvalidator::new(
                reqwest::Client::new(),
                config.revalidate_peers.clone(),
                config.revalidation_secret.clone(),
            );
            Arc::new(FanOutInvalidator::new(vec![Arc::clone(&local), Arc::new(peers)]))
        };

        let project_handler = ProjectHandler::new(
            StoreProjectRepo::new(Arc::clone(&store)),
            Arc::clone(&cache),
            Arc::clone(&invalidator),
            ttls,
        );
        let blog_handler = BlogPostHandler::new(
            StoreBlogPostRepo::new(Arc::clone(&store)),
            Arc::clone(&cache),
            invalidator,
            ttls,
        );
        let contact_handler = ContactHandler::new(
            StoreContactRepo::new(Arc::clone(&store)),
            mailer,
            captcha,
            ContactSettings::from(config),
        );
        let auth_handler = AuthHandler::new(
            JwtService::new(config),
            AdminCredentials {
                email: config.admin_email.clone(),
                password_hash: config.admin_password_hash.clone(),
            },
        );
        // Peers call this endpoint too, so it must only clear the local cache.
        let revalidation_handler = RevalidationHandler::new(local, config.revalidation_secret.clone());

        AppState {
            project_handler,
            blog_handler,
            contact_handler,
            auth_handler,
            revalidation_handler,
            cache,
            store,
            trust_x_forwarded_for: config.trust_x_forwarded_for,
        }
    }
}
