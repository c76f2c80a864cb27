//! Service layer for the billing gateway
//!
//! This crate sits between the HTTP layer and the backend clients:
//!
//! - **validation**: declarative constraint engine (`ValidationSpec`, `Validate`)
//! - **dto**: request DTOs with their validation specs and backend conversions
//! - **report**: assembly of report generation requests
//! - **lenient**: deserializers for fields that may arrive as strings

pub mod dto;
pub mod error;
pub mod lenient;
pub mod report;
pub mod validation;

pub use dto::{
    CountryListQuery, CountryPath, CreateOrderInput, PayoutListQuery, ReportFileInput,
    TariffRateInput, TariffRatesInput, UploadKeysInput,
};
pub use error::{ServiceError, ServiceResult};
pub use report::{apply_notification_target, prepare_report_file};
pub use validation::{
    Constraint, FieldRule, Format, Validate, ValidationSpec, Violation, Violations,
};
