#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use jsonwebtoken::{encode, EncodingKey, Header};
use resonant_api::auth::identity::{IdentityClaims, IdentityConfig, JwtIdentityProvider};
use resonant_api::auth::password::CredentialHasher;
use resonant_api::config::ServerConfig;
use resonant_api::router::build_app_router;
use resonant_api::services::onboarding::OnboardingRegistry;
use resonant_api::state::AppState;
use resonant_blobstore::BlobConfig;
use resonant_core::error::CoreError;
use resonant_core::ingest::{ContentId, IngestionError, IngestionReceipt, SampleIngestor};
use resonant_core::onboarding::Sample;
use resonant_core::types::DbId;
use resonant_db::models::account::{Account, AccountChanges, NewAccount};
use resonant_db::repositories::{AccountStore, MemoryAccountStore};
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tower::ServiceExt;

pub const TEST_SECRET: &str = "test-secret-that-is-long-enough-for-hmac";
pub const TEST_LOGIN_URL: &str = "https://login.example.com";

/// Build a test `ServerConfig` with safe defaults and no demo delay.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        external_call_timeout_secs: 5,
        password_hash_cost: 4,
        max_sample_bytes: 1024,
        application_ttl_secs: 3600,
        max_open_applications: 3,
        speech_demo_delay_ms: 0,
        speech_demo_audio_url: "/audio/demo/sarah-sample.mp3".to_string(),
        identity: IdentityConfig {
            jwt_secret: Some(TEST_SECRET.to_string()),
            app_id: None,
            login_url: TEST_LOGIN_URL.to_string(),
        },
        blob: BlobConfig {
            publisher_url: "http://127.0.0.1:9".to_string(),
            epochs: None,
        },
    }
}

// ---------------------------------------------------------------------------
// Fakes
// ---------------------------------------------------------------------------

/// What the fake ingestor answers.
#[derive(Debug, Clone)]
pub enum IngestReply {
    Stored(&'static str),
    StoredWithoutId,
    Rejected,
}

/// Records every submitted sample and answers with a fixed reply.
pub struct FakeIngestor {
    reply: IngestReply,
    delay: Duration,
    pub submitted: Mutex<Vec<Sample>>,
}

impl FakeIngestor {
    pub fn new(reply: IngestReply, delay: Duration) -> Self {
        Self {
            reply,
            delay,
            submitted: Mutex::new(Vec::new()),
        }
    }

    pub async fn calls(&self) -> usize {
        self.submitted.lock().await.len()
    }
}

#[async_trait]
impl SampleIngestor for FakeIngestor {
    async fn submit(&self, sample: &Sample) -> Result<IngestionReceipt, IngestionError> {
        self.submitted.lock().await.push(sample.clone());
        tokio::time::sleep(self.delay).await;
        match &self.reply {
            IngestReply::Stored(id) => Ok(IngestionReceipt {
                content_id: Some(ContentId::new(*id)),
                payload: json!({ "newlyCreated": { "blobObject": { "blobId": id } } }),
            }),
            IngestReply::StoredWithoutId => Ok(IngestionReceipt {
                content_id: None,
                payload: json!({ "status": "queued" }),
            }),
            IngestReply::Rejected => Err(IngestionError::Rejected {
                status: 500,
                body: "publisher unavailable".to_string(),
            }),
        }
    }
}

/// Delegates to a [`MemoryAccountStore`] but fails every update.
pub struct FailingUpdates(pub Arc<MemoryAccountStore>);

#[async_trait]
impl AccountStore for FailingUpdates {
    async fn exists(&self, email: &str) -> Result<bool, CoreError> {
        self.0.exists(email).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, CoreError> {
        self.0.find_by_email(email).await
    }

    async fn create(&self, input: &NewAccount) -> Result<Account, CoreError> {
        self.0.create(input).await
    }

    async fn update(&self, _id: DbId, _changes: &AccountChanges) -> Result<(), CoreError> {
        Err(CoreError::Internal("connection reset by peer".to_string()))
    }

    async fn ping(&self) -> Result<(), CoreError> {
        self.0.ping().await
    }
}

/// An account store that is always down.
pub struct UnreachableStore;

#[async_trait]
impl AccountStore for UnreachableStore {
    async fn exists(&self, _email: &str) -> Result<bool, CoreError> {
        Err(CoreError::Internal("pool timed out".to_string()))
    }

    async fn find_by_email(&self, _email: &str) -> Result<Option<Account>, CoreError> {
        Err(CoreError::Internal("pool timed out".to_string()))
    }

    async fn create(&self, _input: &NewAccount) -> Result<Account, CoreError> {
        Err(CoreError::Internal("pool timed out".to_string()))
    }

    async fn update(&self, _id: DbId, _changes: &AccountChanges) -> Result<(), CoreError> {
        Err(CoreError::Internal("pool timed out".to_string()))
    }

    async fn ping(&self) -> Result<(), CoreError> {
        Err(CoreError::Internal("pool timed out".to_string()))
    }
}

// ---------------------------------------------------------------------------
// App construction
// ---------------------------------------------------------------------------

/// The router plus handles on its collaborators for assertions.
pub struct TestApp {
    pub router: Router,
    pub accounts: Arc<MemoryAccountStore>,
    pub ingestor: Arc<FakeIngestor>,
    pub onboarding: Arc<OnboardingRegistry>,
}

pub struct TestAppBuilder {
    config: ServerConfig,
    accounts: Arc<MemoryAccountStore>,
    store: Option<Arc<dyn AccountStore>>,
    reply: IngestReply,
    delay: Duration,
}

impl TestAppBuilder {
    pub fn new() -> Self {
        Self {
            config: test_config(),
            accounts: Arc::new(MemoryAccountStore::new()),
            store: None,
            reply: IngestReply::Stored("blob-123"),
            delay: Duration::ZERO,
        }
    }

    pub fn ingest_reply(mut self, reply: IngestReply) -> Self {
        self.reply = reply;
        self
    }

    pub fn ingest_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Serve accounts through `store` instead of the plain memory store.
    pub fn store(mut self, store: Arc<dyn AccountStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs;
        self
    }

    pub fn max_open_applications(mut self, max: usize) -> Self {
        self.config.max_open_applications = max;
        self
    }

    pub fn without_identity_secret(mut self) -> Self {
        self.config.identity.jwt_secret = None;
        self
    }

    pub fn build(self) -> TestApp {
        let ingestor = Arc::new(FakeIngestor::new(self.reply, self.delay));
        let onboarding = Arc::new(OnboardingRegistry::new(self.config.registry_limits()));
        let store: Arc<dyn AccountStore> = match self.store {
            Some(store) => store,
            None => self.accounts.clone() as Arc<dyn AccountStore>,
        };

        let state = AppState {
            config: Arc::new(self.config.clone()),
            accounts: store,
            ingestor: ingestor.clone(),
            identity: Arc::new(JwtIdentityProvider::new(&self.config.identity)),
            hasher: Arc::new(CredentialHasher::new(self.config.password_hash_cost).unwrap()),
            onboarding: onboarding.clone(),
        };

        TestApp {
            router: build_app_router(state, &self.config),
            accounts: self.accounts,
            ingestor,
            onboarding,
        }
    }
}

/// Build the application with default fakes.
pub fn build_test_app() -> TestApp {
    TestAppBuilder::new().build()
}

// ---------------------------------------------------------------------------
// Identity tokens
// ---------------------------------------------------------------------------

/// Mint a provider token for `sub`, valid for ten minutes.
pub fn token_for(sub: &str, email: Option<&str>) -> String {
    let claims = IdentityClaims {
        sub: sub.to_string(),
        email: email.map(str::to_string),
        wallet_address: None,
        exp: chrono::Utc::now().timestamp() + 600,
        aud: None,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
    )
    .expect("encoding should succeed")
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

pub async fn get(app: &Router, uri: &str, token: Option<&str>) -> Response<Body> {
    send(app, request(Method::GET, uri, token, Body::empty(), None)).await
}

pub async fn delete(app: &Router, uri: &str, token: Option<&str>) -> Response<Body> {
    send(app, request(Method::DELETE, uri, token, Body::empty(), None)).await
}

pub async fn post_empty(app: &Router, uri: &str, token: Option<&str>) -> Response<Body> {
    send(app, request(Method::POST, uri, token, Body::empty(), None)).await
}

pub async fn post_json(app: &Router, uri: &str, token: Option<&str>, body: Value) -> Response<Body> {
    send(
        app,
        request(
            Method::POST,
            uri,
            token,
            Body::from(body.to_string()),
            Some("application/json"),
        ),
    )
    .await
}

pub async fn put_json(app: &Router, uri: &str, token: Option<&str>, body: Value) -> Response<Body> {
    send(
        app,
        request(
            Method::PUT,
            uri,
            token,
            Body::from(body.to_string()),
            Some("application/json"),
        ),
    )
    .await
}

pub async fn put_bytes(
    app: &Router,
    uri: &str,
    token: Option<&str>,
    bytes: Vec<u8>,
    content_type: &str,
) -> Response<Body> {
    send(
        app,
        request(Method::PUT, uri, token, Body::from(bytes), Some(content_type)),
    )
    .await
}

pub const MULTIPART_BOUNDARY: &str = "resonant-test-boundary";

/// Build a multipart body with a single file field.
pub fn multipart_file(field: &str, file_name: &str, content_type: &str, bytes: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{MULTIPART_BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\n\
             Content-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{MULTIPART_BOUNDARY}--\r\n").as_bytes());
    body
}

pub async fn put_multipart(app: &Router, uri: &str, token: Option<&str>, body: Vec<u8>) -> Response<Body> {
    let content_type = format!("multipart/form-data; boundary={MULTIPART_BOUNDARY}");
    put_bytes(app, uri, token, body, &content_type).await
}

fn request(
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Body,
    content_type: Option<&str>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    if let Some(content_type) = content_type {
        builder = builder.header("content-type", content_type);
    }
    builder.body(body).unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// A signup body that passes every validation rule.
pub fn signup_body(email: &str) -> Value {
    json!({
        "firstName": "Ada",
        "lastName": "Lovelace",
        "email": email,
        "password": "password123",
        "confirmPassword": "password123",
        "accountType": "talent",
        "agreeToTerms": true,
        "agreeToMarketing": false
    })
}
