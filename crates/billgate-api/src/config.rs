//! Gateway configuration
//!
//! One flat struct assembled at start, grouped by concern. The server crate
//! loads it from files and environment; tests build it directly.

use billgate_backend::{GrpcChannelConfig, StorageBucketConfig};
use billgate_core::PaginationConfig;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Default upper bound for buffered request bodies
pub const DEFAULT_MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Everything the HTTP layer needs to serve requests
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub identity_provider: IdentityProviderConfig,
    pub auth: AuthConfig,
    pub pagination: PaginationConfig,
    pub backend: BackendConfig,
    pub storage: StorageConfig,
    pub urls: UrlConfig,

    /// Largest request body buffered by the authentication layer
    pub max_body_bytes: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            identity_provider: IdentityProviderConfig::default(),
            auth: AuthConfig::default(),
            pagination: PaginationConfig::default(),
            backend: BackendConfig::default(),
            storage: StorageConfig::default(),
            urls: UrlConfig::default(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl GatewayConfig {
    /// Check limits and required settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.pagination
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        if self.max_body_bytes == 0 {
            return Err(ConfigError::Invalid(
                "max_body_bytes must be positive".to_string(),
            ));
        }

        if self.backend.request_timeout_secs == 0 || self.backend.extended_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "backend timeouts must be positive".to_string(),
            ));
        }

        if self.backend.extended_timeout_secs < self.backend.request_timeout_secs {
            return Err(ConfigError::Invalid(
                "backend.extended_timeout_secs must not be shorter than request_timeout_secs"
                    .to_string(),
            ));
        }

        if !matches!(self.urls.http_scheme.as_str(), "http" | "https") {
            return Err(ConfigError::Invalid(format!(
                "urls.http_scheme must be http or https, got '{}'",
                self.urls.http_scheme
            )));
        }

        if !self.urls.order_inline_form_url_mask.contains("{id}") {
            return Err(ConfigError::Invalid(
                "urls.order_inline_form_url_mask must contain an {id} placeholder".to_string(),
            ));
        }

        if !self.auth.disable_authn
            && self.identity_provider.signing_secret.expose_secret().is_empty()
        {
            return Err(ConfigError::Missing("identity_provider.signing_secret"));
        }

        Ok(())
    }

    /// Whether either security bypass is switched on
    pub fn bypass_enabled(&self) -> bool {
        self.auth.disable_authn || self.auth.disable_authz
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Missing required setting: {0}")]
    Missing(&'static str),
}

/// External identity provider issuing bearer tokens
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityProviderConfig {
    #[serde(default)]
    pub issuer: String,

    /// Expected token audience
    #[serde(default)]
    pub client_id: String,

    #[serde(default = "empty_secret")]
    pub client_secret: SecretString,

    #[serde(default)]
    pub redirect_url: String,

    /// HMAC secret tokens are signed with
    #[serde(default = "empty_secret")]
    pub signing_secret: SecretString,

    #[serde(default = "default_leeway_secs")]
    pub leeway_secs: u64,
}

impl Default for IdentityProviderConfig {
    fn default() -> Self {
        Self {
            issuer: String::new(),
            client_id: String::new(),
            client_secret: empty_secret(),
            redirect_url: String::new(),
            signing_secret: empty_secret(),
            leeway_secs: default_leeway_secs(),
        }
    }
}

/// Credentials of the non-user route groups and the bypass flags
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Skip authentication entirely (non-production only)
    #[serde(default)]
    pub disable_authn: bool,

    /// Skip authorization entirely (non-production only)
    #[serde(default)]
    pub disable_authz: bool,

    /// Secret webhook payloads are signed with
    #[serde(default = "empty_secret")]
    pub webhook_secret: SecretString,

    /// Token operators present in `X-System-Token`
    #[serde(default = "empty_secret")]
    pub system_token: SecretString,

    /// TOML policy file
    #[serde(default)]
    pub policy_file: Option<PathBuf>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            disable_authn: false,
            disable_authz: false,
            webhook_secret: empty_secret(),
            system_token: empty_secret(),
            policy_file: None,
        }
    }
}

/// gRPC backends and call deadlines
#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_billing")]
    pub billing: GrpcChannelConfig,

    #[serde(default = "default_reporter")]
    pub reporter: GrpcChannelConfig,

    /// Deadline of ordinary calls
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Deadline of bulk calls
    #[serde(default = "default_extended_timeout_secs")]
    pub extended_timeout_secs: u64,
}

impl BackendConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn extended_timeout(&self) -> Duration {
        Duration::from_secs(self.extended_timeout_secs)
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            billing: default_billing(),
            reporter: default_reporter(),
            request_timeout_secs: default_request_timeout_secs(),
            extended_timeout_secs: default_extended_timeout_secs(),
        }
    }
}

/// Object storage buckets and the local download area
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_agreements_bucket")]
    pub agreements: StorageBucketConfig,

    #[serde(default = "default_reporter_bucket")]
    pub reporter: StorageBucketConfig,

    #[serde(default = "default_documents_bucket")]
    pub documents: StorageBucketConfig,

    /// Parent of per-download temp directories; system temp dir when unset
    #[serde(default)]
    pub temp_dir: Option<PathBuf>,
}

impl StorageConfig {
    pub fn temp_root(&self) -> PathBuf {
        self.temp_dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            agreements: default_agreements_bucket(),
            reporter: default_reporter_bucket(),
            documents: default_documents_bucket(),
            temp_dir: None,
        }
    }
}

/// Settings for absolute URLs returned to clients
#[derive(Debug, Clone, Deserialize)]
pub struct UrlConfig {
    #[serde(default = "default_http_scheme")]
    pub http_scheme: String,

    /// Payment form link, `{id}` is replaced by the order id
    #[serde(default = "default_order_inline_form_url_mask")]
    pub order_inline_form_url_mask: String,
}

impl UrlConfig {
    /// Payment form link of order `id`
    pub fn order_form_url(&self, id: &str) -> String {
        self.order_inline_form_url_mask.replace("{id}", id)
    }
}

impl Default for UrlConfig {
    fn default() -> Self {
        Self {
            http_scheme: default_http_scheme(),
            order_inline_form_url_mask: default_order_inline_form_url_mask(),
        }
    }
}

fn empty_secret() -> SecretString {
    SecretString::new(String::new())
}

fn default_leeway_secs() -> u64 {
    30
}

fn default_billing() -> GrpcChannelConfig {
    GrpcChannelConfig::new("http://127.0.0.1:50051")
}

fn default_reporter() -> GrpcChannelConfig {
    GrpcChannelConfig::new("http://127.0.0.1:50052")
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_extended_timeout_secs() -> u64 {
    600
}

fn default_agreements_bucket() -> StorageBucketConfig {
    StorageBucketConfig::new("http://127.0.0.1:9000", "agreements")
}

fn default_reporter_bucket() -> StorageBucketConfig {
    StorageBucketConfig::new("http://127.0.0.1:9000", "reporter")
}

fn default_documents_bucket() -> StorageBucketConfig {
    StorageBucketConfig::new("http://127.0.0.1:9000", "documents")
}

fn default_http_scheme() -> String {
    "https".to_string()
}

fn default_order_inline_form_url_mask() -> String {
    "https://checkout.billgate.io/order/{id}".to_string()
}
