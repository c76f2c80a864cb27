//! HTTP layer of the billing gateway
//!
//! This crate turns inbound REST requests into backend calls:
//!
//! - **auth**: per route group authentication and the authorization layer
//! - **jwt** / **signature** / **rbac**: credential checks and the policy evaluator
//! - **binding**: request decoding and validation
//! - **adapter**: deadline and outcome translation for backend calls
//! - **download**: temp-file backed streaming of stored files
//! - **handlers** / **routes**: endpoints grouped by trust tier
//! - **error** / **responses**: response bodies
//!
//! # Example
//!
//! ```rust,ignore
//! let config = Arc::new(GatewayConfig::default());
//! let auth = AuthState::new(&config, policy, billing.clone())?;
//! let state = AppState::new(config, billing, reporter, buckets);
//!
//! let app = build_api_server(state, auth, MiddlewareConfig::default());
//! ```

pub mod adapter;
pub mod auth;
pub mod binding;
pub mod config;
pub mod context;
pub mod download;
pub mod error;
pub mod handlers;
pub mod jwt;
pub mod middleware;
pub mod rbac;
pub mod responses;
pub mod routes;
pub mod signature;

pub use adapter::{Deadline, ServiceCaller};
pub use auth::{authenticate, authorize, AuthError, AuthSetupError, AuthState};
pub use config::{
    AuthConfig, BackendConfig, ConfigError, GatewayConfig, IdentityProviderConfig, StorageConfig,
    UrlConfig,
};
pub use context::RequestContext;
pub use error::{
    ApiError, ApiResult, ErrorKind, ErrorResponse, MessageResponse, BINDING_ERROR_MESSAGE,
    DOWNLOAD_ERROR_MESSAGE, TRANSPORT_ERROR_MESSAGE, VALIDATION_ERROR_MESSAGE,
};
pub use handlers::{AppState, StorageBuckets};
pub use jwt::{Claims, JwtConfig, JwtManager};
pub use middleware::{CorsConfig, MiddlewareConfig, UuidRequestIdGenerator};
pub use rbac::{Permission, RbacError, RbacPolicy, Role};
pub use routes::build_router;

use axum::Router;
use tower_http::{
    compression::CompressionLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
};

/// Build the router with the HTTP middleware stack
pub fn build_api_server(
    state: AppState,
    auth: AuthState,
    middleware_config: MiddlewareConfig,
) -> Router {
    let mut router = build_router(state, auth).layer(middleware_config.cors.into_layer());

    if middleware_config.enable_compression {
        router = router.layer(CompressionLayer::new());
    }

    if middleware_config.enable_tracing {
        router = router.layer(middleware::trace_layer());
    }

    router
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(
            UuidRequestIdGenerator,
        ))
}
