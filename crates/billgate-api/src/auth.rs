//! Authentication and authorization middleware
//!
//! Each route group is wrapped in [`authenticate`] with its [`RouteGroup`].
//! The middleware buffers the body, resolves the caller identity for the
//! group's trust tier and the pagination cursor, and stores them in a
//! [`RequestContext`]. Groups that require authorization are additionally
//! wrapped in [`authorize`], which runs after authentication and before any
//! handler code.

use axum::{
    body::Body,
    extract::{MatchedPath, Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use billgate_backend::{billing, proto::GetProjectRequest, BillingService};
use billgate_core::{Cursor, Identity, PaginationConfig, RouteGroup};
use bytes::Bytes;
use secrecy::{ExposeSecret, SecretString};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

use crate::adapter::{Deadline, ServiceCaller};
use crate::binding::query_pairs;
use crate::config::GatewayConfig;
use crate::context::RequestContext;
use crate::error::{ApiError, ErrorKind};
use crate::jwt::{JwtConfig, JwtConfigError, JwtManager, TokenError};
use crate::rbac::RbacPolicy;
use crate::signature::{verify_hex, TokenVerifier};

/// Header carrying the webhook payload signature
pub const WEBHOOK_SIGNATURE_HEADER: &str = "x-webhook-signature";

/// Header carrying the signing project id
pub const PROJECT_ID_HEADER: &str = "x-project-id";

/// Header carrying the project payload signature
pub const PROJECT_SIGNATURE_HEADER: &str = "x-signature";

/// Header carrying the internal system credential
pub const SYSTEM_TOKEN_HEADER: &str = "x-system-token";

/// Shared state of the authentication and authorization layers
#[derive(Clone)]
pub struct AuthState {
    inner: Arc<AuthInner>,
}

struct AuthInner {
    jwt: Option<JwtManager>,
    policy: Arc<RbacPolicy>,
    billing: Arc<dyn BillingService>,
    caller: ServiceCaller,
    webhook_secret: SecretString,
    system_token: TokenVerifier,
    pagination: PaginationConfig,
    max_body_bytes: usize,
    disable_authn: bool,
    disable_authz: bool,
}

/// Errors raised while building [`AuthState`]
#[derive(Debug, Error)]
pub enum AuthSetupError {
    #[error("Invalid identity provider configuration: {0}")]
    Jwt(#[from] JwtConfigError),

    #[error("Failed to initialise the system credential verifier")]
    Random,
}

impl AuthState {
    /// Build the authentication state from configuration
    ///
    /// Bearer validation is only set up when authentication is enabled.
    pub fn new(
        config: &GatewayConfig,
        policy: Arc<RbacPolicy>,
        billing: Arc<dyn BillingService>,
    ) -> Result<Self, AuthSetupError> {
        let jwt = if config.auth.disable_authn {
            None
        } else {
            let idp = &config.identity_provider;
            Some(JwtManager::new(
                JwtConfig::new(idp.signing_secret.expose_secret().clone())
                    .with_issuer(idp.issuer.clone())
                    .with_audience(idp.client_id.clone())
                    .with_leeway(idp.leeway_secs),
            )?)
        };

        let system_token = TokenVerifier::new(config.auth.system_token.expose_secret())
            .map_err(|_| AuthSetupError::Random)?;

        if config.auth.disable_authn {
            warn!("Authentication is DISABLED - every request runs with an empty identity");
        }
        if config.auth.disable_authz {
            warn!("Authorization is DISABLED - the RBAC policy is not enforced");
        }

        Ok(Self {
            inner: Arc::new(AuthInner {
                jwt,
                policy,
                billing,
                caller: ServiceCaller::from_config(&config.backend),
                webhook_secret: config.auth.webhook_secret.clone(),
                system_token,
                pagination: config.pagination,
                max_body_bytes: config.max_body_bytes,
                disable_authn: config.auth.disable_authn,
                disable_authz: config.auth.disable_authz,
            }),
        })
    }

    /// RBAC policy in force
    pub fn policy(&self) -> &RbacPolicy {
        &self.inner.policy
    }

    /// Resolve the identity of a request in `group`
    pub async fn identify(
        &self,
        group: RouteGroup,
        headers: &HeaderMap,
        body: &Bytes,
    ) -> Result<Identity, ApiError> {
        if self.inner.disable_authn {
            return Ok(Identity::anonymous());
        }

        match group {
            RouteGroup::Common => Ok(Identity::anonymous()),
            RouteGroup::WebHook => self.identify_webhook(headers, body),
            RouteGroup::AuthProject => self.identify_project(headers, body).await,
            RouteGroup::AuthUser => self.identify_user(headers),
            RouteGroup::SystemUser => self.identify_system(headers),
        }
    }

    fn identify_webhook(&self, headers: &HeaderMap, body: &Bytes) -> Result<Identity, ApiError> {
        let signature = header_str(headers, WEBHOOK_SIGNATURE_HEADER)
            .ok_or(AuthError::MissingSignature)?;

        if !verify_hex(
            self.inner.webhook_secret.expose_secret().as_bytes(),
            body,
            signature,
        ) {
            return Err(AuthError::InvalidSignature.into());
        }

        Ok(Identity::anonymous())
    }

    async fn identify_project(
        &self,
        headers: &HeaderMap,
        body: &Bytes,
    ) -> Result<Identity, ApiError> {
        let project_id = header_str(headers, PROJECT_ID_HEADER)
            .filter(|id| !id.is_empty())
            .ok_or(AuthError::MissingProject)?;
        let signature = header_str(headers, PROJECT_SIGNATURE_HEADER)
            .ok_or(AuthError::MissingSignature)?;

        let request = GetProjectRequest {
            project_id: project_id.to_string(),
        };
        let billing = &self.inner.billing;
        let response = self
            .inner
            .caller
            .call(
                billing::SERVICE_NAME,
                "GetProject",
                request,
                Deadline::Default,
                |req| billing.get_project(req),
            )
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::Business => AuthError::UnknownProject.into(),
                _ => e,
            })?;

        let project = response.item.ok_or(AuthError::UnknownProject)?;

        if !verify_hex(project.secret_key.as_bytes(), body, signature) {
            return Err(AuthError::InvalidSignature.into());
        }

        debug!(project_id = %project.id, "Project authenticated");
        Ok(Identity::project(project.id, project.merchant_id))
    }

    fn identify_user(&self, headers: &HeaderMap) -> Result<Identity, ApiError> {
        let jwt = self.inner.jwt.as_ref().ok_or(AuthError::InvalidToken)?;

        let header = header_str(headers, AUTHORIZATION.as_str()).ok_or(AuthError::MissingToken)?;
        let token =
            JwtManager::extract_token_from_header(header).map_err(|_| AuthError::InvalidToken)?;

        let claims = jwt.validate_token(token).map_err(|e| match e {
            TokenError::Expired => AuthError::ExpiredToken,
            other => {
                debug!(error = %other, "Bearer token rejected");
                AuthError::InvalidToken
            }
        })?;

        debug!("User authenticated: {}", claims.sub);
        Ok(claims.into())
    }

    fn identify_system(&self, headers: &HeaderMap) -> Result<Identity, ApiError> {
        let token = header_str(headers, SYSTEM_TOKEN_HEADER).ok_or(AuthError::MissingCredential)?;

        if !self.inner.system_token.verify(token) {
            return Err(AuthError::InvalidCredential.into());
        }

        Ok(Identity::system())
    }
}

impl fmt::Debug for AuthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthState")
            .field("jwt", &self.inner.jwt)
            .field("disable_authn", &self.inner.disable_authn)
            .field("disable_authz", &self.inner.disable_authz)
            .finish()
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|h| h.to_str().ok())
}

/// Authentication middleware for one route group
///
/// # Usage
///
/// ```rust,ignore
/// let app = Router::new()
///     .route("/admin/api/v1/payouts", get(list_payouts))
///     .route_layer(middleware::from_fn_with_state(
///         (auth_state.clone(), RouteGroup::AuthUser),
///         authenticate,
///     ));
/// ```
pub async fn authenticate(
    State((auth, group)): State<(AuthState, RouteGroup)>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let (parts, body) = request.into_parts();

    let raw_body = axum::body::to_bytes(body, auth.inner.max_body_bytes)
        .await
        .map_err(|e| {
            debug!(error = %e, "Failed to read request body");
            ApiError::binding()
        })?;

    let identity = auth.identify(group, &parts.headers, &raw_body).await?;

    let query = query_pairs(parts.uri.query());
    let cursor = Cursor::from_query(&query, &auth.inner.pagination);

    let mut request = Request::from_parts(parts, Body::from(raw_body.clone()));
    request
        .extensions_mut()
        .insert(RequestContext::new(identity, cursor, raw_body));

    Ok(next.run(request).await)
}

/// Authorization middleware
///
/// Resource is the matched route template, action the lowercase method.
pub async fn authorize(
    State(auth): State<AuthState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if auth.inner.disable_authz {
        return Ok(next.run(request).await);
    }

    let resource = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());
    let action = request.method().as_str().to_ascii_lowercase();

    let role = request
        .extensions()
        .get::<RequestContext>()
        .map(|ctx| ctx.identity.role.clone())
        .unwrap_or_default();

    if !auth.inner.policy.allowed(&role, &resource, &action) {
        warn!(role = %role, resource = %resource, action = %action, "Access denied");
        return Err(AuthError::InsufficientPermissions.into());
    }

    Ok(next.run(request).await)
}

/// Authentication errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    /// Missing bearer token
    MissingToken,

    /// Invalid token format or signature
    InvalidToken,

    /// Token has expired
    ExpiredToken,

    /// Missing payload signature header
    MissingSignature,

    /// Payload signature does not match
    InvalidSignature,

    /// Missing project id header
    MissingProject,

    /// Project id unknown to the billing backend
    UnknownProject,

    /// Missing system credential
    MissingCredential,

    /// System credential does not match
    InvalidCredential,

    /// Caller lacks the required permission
    InsufficientPermissions,
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::MissingToken => write!(f, "Missing authentication token"),
            AuthError::InvalidToken => write!(f, "Invalid authentication token"),
            AuthError::ExpiredToken => write!(f, "Authentication token has expired"),
            AuthError::MissingSignature => write!(f, "Missing request signature"),
            AuthError::InvalidSignature => write!(f, "Invalid request signature"),
            AuthError::MissingProject => write!(f, "Missing project id"),
            AuthError::UnknownProject => write!(f, "Unknown project"),
            AuthError::MissingCredential => write!(f, "Missing system credential"),
            AuthError::InvalidCredential => write!(f, "Invalid system credential"),
            AuthError::InsufficientPermissions => write!(f, "Insufficient permissions"),
        }
    }
}

impl std::error::Error for AuthError {}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InsufficientPermissions => ApiError::forbidden(err.to_string()),
            _ => ApiError::unauthorized(err.to_string()),
        }
    }
}
