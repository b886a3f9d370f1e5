#![allow(dead_code)]

use actix_web::{middleware::NormalizePath, web, App, HttpServer};
use async_trait::async_trait;
use parking_lot::Mutex;
use portfolio_content::{
    auth::password::hash_password,
    errors::AppError,
    mail::{Mailer, OutgoingEmail},
    middlewares::auth::AuthMiddleware,
    recaptcha::CaptchaVerifier,
    routes::configure_routes,
    settings::{AppConfig, AppEnvironment, LogFormat},
    store::{DocumentStore, MemoryStore},
    AppState,
};
use reqwest::{Client, Response};
use serde::Serialize;
use serde_json::{json, Value};
use std::{net::TcpListener, sync::Arc, time::Duration};

pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const ADMIN_PASSWORD: &str = "AdminPass123!";
pub const REVALIDATION_SECRET: &str = "revalidate-me";

/// Keeps every email instead of sending it.
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<OutgoingEmail>>,
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<(), AppError> {
        self.sent.lock().push(email);
        Ok(())
    }
}

pub struct PassingCaptcha;

#[async_trait]
impl CaptchaVerifier for PassingCaptcha {
    async fn verify(&self, _token: &str) -> bool {
        true
    }
}

pub struct TestApp {
    pub state: web::Data<AppState>,
    pub address: String,
    pub client: Client,
    pub mailer: Arc<RecordingMailer>,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with(test_config()).await
    }

    pub async fn spawn_with(config: AppConfig) -> Self {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        let mailer = Arc::new(RecordingMailer::default());

        let state = web::Data::new(AppState::with_services(
            &config,
            store,
            mailer.clone(),
            Arc::new(PassingCaptcha),
        ));

        let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
        let port = listener.local_addr().expect("listener has an address").port();
        let address = format!("http://127.0.0.1:{}", port);

        let server_state = state.clone();
        let server = HttpServer::new(move || {
            App::new()
                .app_data(server_state.clone())
                .wrap(AuthMiddleware)
                .wrap(NormalizePath::trim())
                .configure(configure_routes)
        })
        .listen(listener)
        .expect("Failed to bind server")
        .workers(1)
        .run();

        tokio::spawn(server);

        let client = Client::new();
        while client.get(format!("{}/health", address)).send().await.is_err() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        TestApp { state, address, client, mailer }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn get(&self, path: &str) -> Response {
        self.client.get(self.url(path)).send().await.expect("request failed")
    }

    pub async fn get_json(&self, path: &str) -> Value {
        let response = self.get(path).await;
        assert!(response.status().is_success(), "GET {path} returned {}", response.status());
        response.json().await.expect("response is JSON")
    }

    pub async fn post_json<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Response {
        self.client.post(self.url(path)).json(body).send().await.expect("request failed")
    }

    pub async fn admin_token(&self) -> String {
        let response = self
            .post_json("/api/v1/auth/login", &json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD }))
            .await;
        assert_eq!(response.status(), 200);

        let body: Value = response.json().await.expect("login response is JSON");
        body["access_token"].as_str().expect("token present").to_string()
    }

    /// Sends an authenticated admin request and returns status and body.
    pub async fn admin(&self, method: reqwest::Method, path: &str, body: Option<Value>) -> (u16, Value) {
        let token = self.admin_token().await;
        let mut request = self.client.request(method, self.url(path)).bearer_auth(token);
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await.expect("request failed");
        let status = response.status().as_u16();
        (status, response.json().await.unwrap_or(Value::Null))
    }

    pub async fn create(&self, path: &str, body: Value) -> String {
        let (status, body) = self.admin(reqwest::Method::POST, path, Some(body)).await;
        assert_eq!(status, 201, "create failed: {body}");

        let action: ActionResponseBody = serde_json::from_value(body).expect("action response");
        assert!(action.success);
        action.id.expect("created id")
    }
}

/// Client-side view of an `ActionResponse`.
#[derive(Debug, serde::Deserialize)]
pub struct ActionResponseBody {
    pub success: bool,
    pub message: String,
    pub errors: Option<Value>,
    pub id: Option<String>,
}

pub fn test_config() -> AppConfig {
    AppConfig {
        env: AppEnvironment::Testing,
        name: "Portfolio Content Test".to_string(),
        port: 0,
        host: "127.0.0.1".to_string(),
        worker_count: 1,
        database_url: None,
        cors_allowed_origins: vec!["*".to_string()],
        jwt_secret: "test_jwt_secret_that_is_long_enough_for_hs512_1234567890".into(),
        jwt_expiration_minutes: 5,
        admin_email: ADMIN_EMAIL.to_string(),
        admin_password_hash: hash_password(ADMIN_PASSWORD).expect("Failed to hash password"),
        revalidation_secret: Some(REVALIDATION_SECRET.to_string()),
        revalidate_peers: vec![],
        resend_api_key: None,
        contact_to_email: "owner@example.com".to_string(),
        contact_from_email: "site@example.com".to_string(),
        owner_name: "Dev ND".to_string(),
        recaptcha_secret: None,
        list_cache_ttl_secs: 60,
        detail_cache_ttl_secs: 300,
        cache_sweep_interval_secs: 60,
        log_format: LogFormat::Pretty,
        trust_x_forwarded_for: false,
    }
}

pub fn project_body(title: &str, category: &str, technologies: &[&str]) -> Value {
    json!({
        "title": title,
        "description": "A project description that is long enough.",
        "excerpt": "A short excerpt for cards.",
        "category": category,
        "status": "completed",
        "technologies": technologies,
        "featuredImage": "https://images.example.com/cover.png",
        "published": true
    })
}

pub fn blog_body(title: &str, category: &str, tags: &[&str]) -> Value {
    json!({
        "title": title,
        "excerpt": "An excerpt that is long enough to pass.",
        "content": "## Intro\n\nSome words about the topic.\n\n## Details\n\nMore words here.",
        "category": category,
        "tags": tags,
        "published": true
    })
}
