//! Per-request context
//!
//! Built once by the authentication layer and read by handlers through the
//! [`RequestContext`] extractor. Nothing in it outlives the request.

use axum::{extract::FromRequestParts, http::request::Parts};
use billgate_core::{Cursor, Identity};
use bytes::Bytes;
use tracing::error;

use crate::error::ApiError;

/// Typed request-scoped state
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// Caller identity; zero-valued on unauthenticated routes
    pub identity: Identity,

    /// Resolved pagination parameters
    pub cursor: Cursor,

    /// Request body exactly as received
    pub raw_body: Bytes,
}

impl RequestContext {
    pub fn new(identity: Identity, cursor: Cursor, raw_body: Bytes) -> Self {
        Self {
            identity,
            cursor,
            raw_body,
        }
    }
}

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RequestContext>()
            .cloned()
            .ok_or_else(|| {
                error!(
                    path = %parts.uri.path(),
                    "Route registered without the authentication layer"
                );
                ApiError::internal()
            })
    }
}
