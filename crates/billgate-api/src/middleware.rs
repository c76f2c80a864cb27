//! HTTP middleware
//!
//! Request ids, tracing spans, CORS and compression. Authentication and
//! authorization live in [`crate::auth`] because they are per route group.

use axum::http::{
    header::{AUTHORIZATION, CONTENT_DISPOSITION, CONTENT_TYPE},
    HeaderName, HeaderValue, Method, Request,
};
use serde::Deserialize;
use std::time::Duration;
use tower_http::{
    classify::{ServerErrorsAsFailures, SharedClassifier},
    cors::{Any, CorsLayer},
    request_id::{MakeRequestId, RequestId},
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
    LatencyUnit,
};
use tracing::{warn, Level};
use uuid::Uuid;

use crate::auth::{
    PROJECT_ID_HEADER, PROJECT_SIGNATURE_HEADER, SYSTEM_TOKEN_HEADER, WEBHOOK_SIGNATURE_HEADER,
};

/// Request id header name
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Request ID generator using UUIDs
#[derive(Clone, Default)]
pub struct UuidRequestIdGenerator;

impl MakeRequestId for UuidRequestIdGenerator {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Build trace layer
///
/// Request headers stay out of the span since they carry credentials.
pub fn trace_layer() -> TraceLayer<SharedClassifier<ServerErrorsAsFailures>> {
    TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(
            DefaultOnResponse::new()
                .latency_unit(LatencyUnit::Millis)
                .level(Level::INFO),
        )
}

/// CORS configuration options
#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    /// Allowed origins (empty means any)
    #[serde(default)]
    pub allowed_origins: Vec<String>,

    /// Whether to allow credentials
    #[serde(default)]
    pub allow_credentials: bool,

    /// Max age for preflight cache
    #[serde(default = "default_max_age")]
    pub max_age_seconds: Option<u64>,
}

fn default_max_age() -> Option<u64> {
    Some(3600)
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![],
            allow_credentials: false,
            max_age_seconds: default_max_age(),
        }
    }
}

impl CorsConfig {
    /// Build CORS layer from config
    ///
    /// Credentials are only allowed together with an explicit origin list.
    pub fn into_layer(self) -> CorsLayer {
        let mut layer = CorsLayer::new()
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([
                AUTHORIZATION,
                CONTENT_TYPE,
                HeaderName::from_static(WEBHOOK_SIGNATURE_HEADER),
                HeaderName::from_static(PROJECT_ID_HEADER),
                HeaderName::from_static(PROJECT_SIGNATURE_HEADER),
                HeaderName::from_static(SYSTEM_TOKEN_HEADER),
            ])
            .expose_headers([
                CONTENT_TYPE,
                CONTENT_DISPOSITION,
                HeaderName::from_static(REQUEST_ID_HEADER),
            ]);

        if self.allowed_origins.is_empty() {
            if self.allow_credentials {
                warn!("cors.allow_credentials ignored: no explicit allowed_origins configured");
            }
            layer = layer.allow_origin(Any);
        } else {
            let origins: Vec<HeaderValue> = self
                .allowed_origins
                .iter()
                .filter_map(|o| o.parse().ok())
                .collect();
            layer = layer
                .allow_origin(origins)
                .allow_credentials(self.allow_credentials);
        }

        if let Some(max_age) = self.max_age_seconds {
            layer = layer.max_age(Duration::from_secs(max_age));
        }

        layer
    }
}

/// Middleware configuration
#[derive(Debug, Clone)]
pub struct MiddlewareConfig {
    pub cors: CorsConfig,

    /// Enable compression
    pub enable_compression: bool,

    /// Enable request tracing
    pub enable_tracing: bool,
}

impl Default for MiddlewareConfig {
    fn default() -> Self {
        Self {
            cors: CorsConfig::default(),
            enable_compression: true,
            enable_tracing: true,
        }
    }
}

impl MiddlewareConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cors(mut self, cors: CorsConfig) -> Self {
        self.cors = cors;
        self
    }

    pub fn with_compression(mut self, enable: bool) -> Self {
        self.enable_compression = enable;
        self
    }

    pub fn with_tracing(mut self, enable: bool) -> Self {
        self.enable_tracing = enable;
        self
    }
}
