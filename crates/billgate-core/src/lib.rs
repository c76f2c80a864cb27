//! Core domain types for the billing gateway
//!
//! This crate holds the request-scoped types every layer of the gateway
//! shares: the caller identity, the pagination cursor, the route trust
//! tiers and the report file request handed to the reporter backend.

pub mod cursor;
pub mod error;
pub mod identity;
pub mod report;
pub mod route;

// Re-exports for convenience
pub use cursor::{Cursor, PaginationConfig};
pub use error::{CoreError, Result};
pub use identity::{roles, Identity};
pub use report::{FileName, ReportFileRequest};
pub use route::RouteGroup;
