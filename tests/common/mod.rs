//! Common test utilities and helpers
//!
//! [`TestApp`] assembles the full gateway router over in-process fakes of
//! the backends and object storage, with the policy shipped in
//! `config/policy.toml`.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Request, Response},
    Router,
};
use billgate_api::{
    build_api_server, signature::sign_hex, AppState, AuthState, Claims, GatewayConfig,
    MiddlewareConfig, RbacPolicy, StorageBuckets,
};
use jsonwebtoken::{encode, EncodingKey, Header};
use http_body_util::BodyExt;
use secrecy::SecretString;
use serde_json::Value;
use std::io;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tokio::net::TcpListener;
use tower::ServiceExt;
use tracing_subscriber::fmt::MakeWriter;

pub mod fakes;

use fakes::{FakeBilling, FakeReporter, FakeStorage};

pub const ISSUER: &str = "https://id.billgate.test";
pub const CLIENT_ID: &str = "billgate-dashboard";
pub const JWT_SECRET: &str = "test-secret-key-for-integration-tests";
pub const WEBHOOK_SECRET: &str = "webhook-secret";
pub const SYSTEM_TOKEN: &str = "system-token";
pub const HOST: &str = "gateway.billgate.test";

pub const MERCHANT_ID: &str = "5be2e16701d96d00012d26c5";
pub const OTHER_MERCHANT_ID: &str = "5be2e16701d96d00012d26c6";
pub const PROFILE_ID: &str = "5be2e16701d96d00012d26c7";

/// Gateway wired to fakes
pub struct TestApp {
    pub router: Router,
    pub billing: Arc<FakeBilling>,
    pub reporter: Arc<FakeReporter>,
    pub agreements: Arc<FakeStorage>,
    pub reports: Arc<FakeStorage>,
    pub documents: Arc<FakeStorage>,
    temp_root: TempDir,
}

/// Objects each fake bucket starts with
#[derive(Default)]
pub struct Buckets {
    pub agreements: Vec<(String, Vec<u8>)>,
    pub reports: Vec<(String, Vec<u8>)>,
    pub documents: Vec<(String, Vec<u8>)>,
}

fn storage(objects: Vec<(String, Vec<u8>)>) -> Arc<FakeStorage> {
    Arc::new(
        objects
            .into_iter()
            .fold(FakeStorage::new(), |s, (key, content)| s.with_object(&key, &content)),
    )
}

impl TestApp {
    /// Create a new test application
    pub fn new() -> Self {
        Self::build(|_| {}, Buckets::default())
    }

    pub fn with_config(configure: impl FnOnce(&mut GatewayConfig)) -> Self {
        Self::build(configure, Buckets::default())
    }

    pub fn with_buckets(buckets: Buckets) -> Self {
        Self::build(|_| {}, buckets)
    }

    fn build(configure: impl FnOnce(&mut GatewayConfig), buckets: Buckets) -> Self {
        let temp_root = tempfile::tempdir().expect("Failed to create temp root");

        let mut config = GatewayConfig::default();
        config.identity_provider.issuer = ISSUER.to_string();
        config.identity_provider.client_id = CLIENT_ID.to_string();
        config.identity_provider.signing_secret = SecretString::new(JWT_SECRET.to_string());
        config.auth.webhook_secret = SecretString::new(WEBHOOK_SECRET.to_string());
        config.auth.system_token = SecretString::new(SYSTEM_TOKEN.to_string());
        config.storage.temp_dir = Some(temp_root.path().to_path_buf());
        config.urls.http_scheme = "https".to_string();
        config.urls.order_inline_form_url_mask = "https://pay.billgate.test/order/{id}".to_string();
        configure(&mut config);
        config.validate().expect("Invalid test configuration");

        let policy_path = Path::new(env!("CARGO_MANIFEST_DIR")).join("config/policy.toml");
        let policy = Arc::new(RbacPolicy::load(&policy_path).expect("Failed to load policy"));

        let billing = Arc::new(FakeBilling::new());
        let reporter = Arc::new(FakeReporter::new());
        let agreements = storage(buckets.agreements);
        let reports = storage(buckets.reports);
        let documents = storage(buckets.documents);

        let config = Arc::new(config);
        let auth = AuthState::new(&config, policy, billing.clone()).expect("Failed to set up auth");
        let state = AppState::new(
            config,
            billing.clone(),
            reporter.clone(),
            StorageBuckets {
                agreements: agreements.clone(),
                reporter: reports.clone(),
                documents: documents.clone(),
            },
        );

        let router = build_api_server(state, auth, MiddlewareConfig::default());

        Self {
            router,
            billing,
            reporter,
            agreements,
            reports,
            documents,
            temp_root,
        }
    }

    /// Send one request through the full middleware stack
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("Router is infallible")
    }

    /// Serve the router on a random local port
    pub async fn spawn(&self) -> String {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind random port");
        let address = listener.local_addr().expect("Failed to get local address");
        let app = self.router.clone();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .await
                .expect("Failed to start test server");
        });

        format!("http://{}", address)
    }

    /// Bearer header for a dashboard user
    pub fn bearer(&self, role: &str, merchant_id: &str, profile_id: &str) -> String {
        let claims = Claims::new("user-42", ISSUER, CLIENT_ID, 3600)
            .with_role(role)
            .with_merchant(merchant_id)
            .with_profile(profile_id);
        bearer_token(&claims)
    }

    /// Bearer header of a token that expired an hour ago
    pub fn expired_bearer(&self, role: &str) -> String {
        let claims = Claims::new("user-42", ISSUER, CLIENT_ID, -3600).with_role(role);
        bearer_token(&claims)
    }

    /// Number of entries left in the download temp root
    pub fn temp_entries(&self) -> usize {
        std::fs::read_dir(self.temp_root.path())
            .map(|entries| entries.count())
            .unwrap_or(0)
    }
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("Failed to build request")
}

pub fn get_as(uri: &str, authorization: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("authorization", authorization)
        .header("host", HOST)
        .body(Body::empty())
        .expect("Failed to build request")
}

pub fn post_json(uri: &str, body: &Value) -> Request<Body> {
    post_raw(uri, body.to_string().into_bytes(), &[])
}

pub fn post_json_as(uri: &str, authorization: &str, body: &Value) -> Request<Body> {
    post_raw(
        uri,
        body.to_string().into_bytes(),
        &[("authorization", authorization)],
    )
}

pub fn post_raw(uri: &str, body: Vec<u8>, headers: &[(&str, &str)]) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .header("host", HOST);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    builder.body(Body::from(body)).expect("Failed to build request")
}

/// Bearer header of `claims` signed like the identity provider signs them
pub fn bearer_token(claims: &Claims) -> String {
    let token = encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .expect("Failed to sign token");
    format!("Bearer {}", token)
}

/// Body signed the way webhook senders and projects sign it
pub fn signed(secret: &str, body: &[u8]) -> String {
    sign_hex(secret.as_bytes(), body)
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .expect("Failed to read body")
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> Value {
    serde_json::from_slice(&body_bytes(response).await).expect("Body is not JSON")
}

/// Log sink for a scoped subscriber
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Subscriber writing plain-text logs into `logs`
pub fn capture_logs(logs: &CapturedLogs) -> tracing::subscriber::DefaultGuard {
    let subscriber = tracing_subscriber::fmt()
        .with_writer(logs.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .finish();
    tracing::subscriber::set_default(subscriber)
}
