//! API request handlers
//!
//! One module per route group. Handlers read the [`RequestContext`] built by
//! the authentication layer, bind and validate their input, call the backend
//! through the [`ServiceCaller`] and return the chosen payload field.
//!
//! [`RequestContext`]: crate::context::RequestContext

pub mod admin;
pub mod common;
pub mod project;
pub mod system;
pub mod webhook;

use billgate_backend::{BillingService, ObjectStorage, ReporterService};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use crate::adapter::ServiceCaller;
use crate::config::GatewayConfig;

/// Object storage buckets served by download routes
#[derive(Clone)]
pub struct StorageBuckets {
    /// Signed merchant agreements
    pub agreements: Arc<dyn ObjectStorage>,

    /// Files produced by the reporter
    pub reporter: Arc<dyn ObjectStorage>,

    /// Payout documents
    pub documents: Arc<dyn ObjectStorage>,
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub billing: Arc<dyn BillingService>,
    pub reporter: Arc<dyn ReporterService>,
    pub storage: StorageBuckets,
    pub caller: ServiceCaller,
    pub config: Arc<GatewayConfig>,
}

impl AppState {
    /// Create new application state
    pub fn new(
        config: Arc<GatewayConfig>,
        billing: Arc<dyn BillingService>,
        reporter: Arc<dyn ReporterService>,
        storage: StorageBuckets,
    ) -> Self {
        Self {
            caller: ServiceCaller::from_config(&config.backend),
            billing,
            reporter,
            storage,
            config,
        }
    }

    /// Directory downloads are staged under
    pub fn temp_root(&self) -> PathBuf {
        self.config.storage.temp_root()
    }
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("caller", &self.caller)
            .finish_non_exhaustive()
    }
}
