//! API response types
//!
//! Successful backend calls return their payload field as the body with no
//! envelope. The types here cover the few bodies the gateway builds itself.

use serde::{Deserialize, Serialize};

/// Body of calls that succeed without a payload (`{}`)
#[derive(Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct EmptyResponse {}

/// Order created through a signed project request
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrderCreatedResponse {
    pub id: String,

    /// Inline payment form for the order
    pub payment_form_url: String,
}

/// Report generation accepted by the reporter
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReportFileCreatedResponse {
    pub file_id: String,

    /// Where the file can be fetched once the reporter notifies the caller
    pub download_url: String,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,

    /// Build version
    pub version: String,

    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl HealthResponse {
    pub fn healthy() -> Self {
        Self {
            status: HealthStatus::Healthy,
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: chrono::Utc::now(),
        }
    }
}

/// Health status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Version information
#[derive(Debug, Serialize, Deserialize)]
pub struct VersionResponse {
    pub name: String,
    pub version: String,
    pub rust_version: String,
}

impl VersionResponse {
    pub fn current() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            rust_version: env!("CARGO_PKG_RUST_VERSION").to_string(),
        }
    }
}
