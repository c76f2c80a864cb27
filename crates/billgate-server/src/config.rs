//! Server configuration
//!
//! Loaded from, in increasing precedence:
//! - `config/default.toml`
//! - `config/{environment}.toml`
//! - environment variables `BILLGATE__SECTION__KEY`
//! - command-line arguments (applied by `main`)

use billgate_api::{
    AuthConfig, BackendConfig, CorsConfig, GatewayConfig, IdentityProviderConfig, StorageConfig,
    UrlConfig,
};
use billgate_core::PaginationConfig;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

/// Environment name in which the security bypass flags are refused
pub const PRODUCTION: &str = "production";

/// Server configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub server: HttpServerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub cors: CorsConfig,

    #[serde(default)]
    pub identity_provider: IdentityProviderConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub pagination: PaginationConfig,

    #[serde(default)]
    pub backend: BackendConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub urls: UrlConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HttpServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind to
    #[serde(default = "default_port")]
    pub port: u16,

    /// Enable graceful shutdown
    #[serde(default = "default_true")]
    pub graceful_shutdown: bool,

    /// Time in-flight requests get to finish after a shutdown signal
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_seconds: u64,

    /// Largest request body accepted
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_true() -> bool {
    true
}

fn default_shutdown_timeout() -> u64 {
    30
}

fn default_max_body_bytes() -> usize {
    billgate_api::config::DEFAULT_MAX_BODY_BYTES
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            graceful_shutdown: default_true(),
            shutdown_timeout_seconds: default_shutdown_timeout(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Use JSON formatting
    #[serde(default)]
    pub json_format: bool,

    /// Include thread IDs
    #[serde(default)]
    pub include_thread_ids: bool,

    /// Include target module
    #[serde(default = "default_true")]
    pub include_target: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json_format: false,
            include_thread_ids: false,
            include_target: true,
        }
    }
}

impl ServerConfig {
    /// Load configuration from files and environment
    ///
    /// Missing files are skipped; malformed ones are an error.
    pub fn load(config_dir: &Path, environment: &str) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            .add_source(
                File::from(config_dir.join(format!("{}.toml", environment))).required(false),
            )
            .add_source(
                Environment::with_prefix("BILLGATE")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// Get server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Settings handed to the HTTP layer
    pub fn gateway_config(&self) -> GatewayConfig {
        GatewayConfig {
            identity_provider: self.identity_provider.clone(),
            auth: self.auth.clone(),
            pagination: self.pagination,
            backend: self.backend.clone(),
            storage: self.storage.clone(),
            urls: self.urls.clone(),
            max_body_bytes: self.server.max_body_bytes,
        }
    }

    /// Check the loaded settings before anything is started
    ///
    /// Either security bypass flag is refused in production.
    pub fn check(&self, environment: &str) -> Result<GatewayConfig, billgate_api::ConfigError> {
        let gateway = self.gateway_config();

        if environment.eq_ignore_ascii_case(PRODUCTION) && gateway.bypass_enabled() {
            return Err(billgate_api::ConfigError::Invalid(
                "auth.disable_authn and auth.disable_authz must be off in production".to_string(),
            ));
        }

        gateway.validate()?;
        Ok(gateway)
    }
}
