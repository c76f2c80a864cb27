//! Protobuf messages of the billing and reporter services
//!
//! Response messages also derive `Serialize` because their payload fields
//! are returned to HTTP clients as-is.

use billgate_core::ReportFileRequest;
use serde::Serialize;
use std::collections::HashMap;

// ============================================================================
// Shared
// ============================================================================

/// Structured error embedded in a business failure
#[derive(Clone, PartialEq, Eq, ::prost::Message, Serialize)]
pub struct ResponseErrorMessage {
    #[prost(string, tag = "1")]
    pub code: String,

    #[prost(string, tag = "2")]
    pub message: String,

    #[prost(string, tag = "3")]
    #[serde(skip_serializing_if = "String::is_empty")]
    pub details: String,
}

/// Envelope for calls without a payload
#[derive(Clone, PartialEq, ::prost::Message, Serialize)]
pub struct EmptyResponseWithStatus {
    #[prost(int32, tag = "1")]
    pub status: i32,

    #[prost(message, optional, tag = "2")]
    pub message: Option<ResponseErrorMessage>,
}

// ============================================================================
// Countries
// ============================================================================

#[derive(Clone, PartialEq, ::prost::Message, Serialize)]
pub struct Country {
    #[prost(string, tag = "1")]
    pub iso_code_a2: String,

    #[prost(string, tag = "2")]
    pub name: String,

    #[prost(string, tag = "3")]
    pub currency: String,

    #[prost(string, tag = "4")]
    pub region: String,

    #[prost(bool, tag = "5")]
    pub vat_enabled: bool,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetCountriesListRequest {
    #[prost(string, tag = "1")]
    pub name: String,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize)]
pub struct GetCountriesListResponse {
    #[prost(int32, tag = "1")]
    pub status: i32,

    #[prost(message, optional, tag = "2")]
    pub message: Option<ResponseErrorMessage>,

    #[prost(message, repeated, tag = "3")]
    pub items: Vec<Country>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetCountryRequest {
    #[prost(string, tag = "1")]
    pub iso_code: String,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize)]
pub struct GetCountryResponse {
    #[prost(int32, tag = "1")]
    pub status: i32,

    #[prost(message, optional, tag = "2")]
    pub message: Option<ResponseErrorMessage>,

    #[prost(message, optional, tag = "3")]
    pub item: Option<Country>,
}

// ============================================================================
// Projects
// ============================================================================

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetProjectRequest {
    #[prost(string, tag = "1")]
    pub project_id: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Project {
    #[prost(string, tag = "1")]
    pub id: String,

    #[prost(string, tag = "2")]
    pub merchant_id: String,

    #[prost(string, tag = "3")]
    pub name: String,

    #[prost(string, tag = "4")]
    pub secret_key: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetProjectResponse {
    #[prost(int32, tag = "1")]
    pub status: i32,

    #[prost(message, optional, tag = "2")]
    pub message: Option<ResponseErrorMessage>,

    #[prost(message, optional, tag = "3")]
    pub item: Option<Project>,
}

// ============================================================================
// Webhooks
// ============================================================================

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProcessWebhookRequest {
    #[prost(string, tag = "1")]
    pub provider: String,

    #[prost(bytes = "vec", tag = "2")]
    pub payload: Vec<u8>,
}

// ============================================================================
// Orders
// ============================================================================

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct OrderCreateRequest {
    #[prost(string, tag = "1")]
    pub project_id: String,

    #[prost(string, tag = "2")]
    pub merchant_order_id: String,

    #[prost(double, tag = "3")]
    pub amount: f64,

    #[prost(string, tag = "4")]
    pub currency: String,

    #[prost(string, tag = "5")]
    pub account: String,

    #[prost(string, tag = "6")]
    pub description: String,

    #[prost(string, tag = "7")]
    pub customer_email: String,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize)]
pub struct Order {
    #[prost(string, tag = "1")]
    pub id: String,

    #[prost(string, tag = "2")]
    pub project_id: String,

    #[prost(double, tag = "3")]
    pub amount: f64,

    #[prost(string, tag = "4")]
    pub currency: String,

    #[prost(string, tag = "5")]
    pub status: String,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize)]
pub struct OrderCreateResponse {
    #[prost(int32, tag = "1")]
    pub status: i32,

    #[prost(message, optional, tag = "2")]
    pub message: Option<ResponseErrorMessage>,

    #[prost(message, optional, tag = "3")]
    pub item: Option<Order>,
}

// ============================================================================
// Payouts
// ============================================================================

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ListPayoutsRequest {
    #[prost(string, tag = "1")]
    pub merchant_id: String,

    #[prost(string, repeated, tag = "2")]
    pub status: Vec<String>,

    #[prost(int64, tag = "3")]
    pub limit: i64,

    #[prost(int64, tag = "4")]
    pub offset: i64,

    #[prost(string, repeated, tag = "5")]
    pub sort: Vec<String>,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize)]
pub struct PayoutDocument {
    #[prost(string, tag = "1")]
    pub id: String,

    #[prost(string, tag = "2")]
    pub merchant_id: String,

    #[prost(double, tag = "3")]
    pub amount: f64,

    #[prost(string, tag = "4")]
    pub currency: String,

    #[prost(string, tag = "5")]
    pub status: String,

    #[prost(string, tag = "6")]
    pub created_at: String,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize)]
pub struct PayoutDocumentsPaginate {
    #[prost(int64, tag = "1")]
    pub count: i64,

    #[prost(message, repeated, tag = "2")]
    pub items: Vec<PayoutDocument>,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize)]
pub struct ListPayoutsResponse {
    #[prost(int32, tag = "1")]
    pub status: i32,

    #[prost(message, optional, tag = "2")]
    pub message: Option<ResponseErrorMessage>,

    #[prost(message, optional, tag = "3")]
    pub item: Option<PayoutDocumentsPaginate>,
}

// ============================================================================
// Bulk operations
// ============================================================================

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct UploadKeysRequest {
    #[prost(string, tag = "1")]
    pub key_product_id: String,

    #[prost(string, tag = "2")]
    pub platform_id: String,

    #[prost(string, repeated, tag = "3")]
    pub keys: Vec<String>,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize)]
pub struct UploadKeysResponse {
    #[prost(int32, tag = "1")]
    pub status: i32,

    #[prost(message, optional, tag = "2")]
    pub message: Option<ResponseErrorMessage>,

    #[prost(int32, tag = "3")]
    pub key_count: i32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TariffRate {
    #[prost(string, tag = "1")]
    pub payment_method: String,

    #[prost(string, tag = "2")]
    pub region: String,

    #[prost(double, tag = "3")]
    pub min_amount: f64,

    #[prost(double, tag = "4")]
    pub max_amount: f64,

    #[prost(double, tag = "5")]
    pub percent_fee: f64,

    #[prost(double, tag = "6")]
    pub fixed_fee: f64,

    #[prost(string, tag = "7")]
    pub fixed_fee_currency: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SetTariffRatesRequest {
    #[prost(message, repeated, tag = "1")]
    pub rates: Vec<TariffRate>,
}

// ============================================================================
// Reporter
// ============================================================================

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CreateFileRequest {
    #[prost(string, tag = "1")]
    pub report_type: String,

    #[prost(string, tag = "2")]
    pub file_type: String,

    #[prost(string, tag = "3")]
    pub merchant_id: String,

    /// JSON-encoded report parameters
    #[prost(bytes = "vec", tag = "4")]
    pub params: Vec<u8>,

    #[prost(string, tag = "5")]
    pub user_id: String,

    #[prost(string, tag = "6")]
    pub notification_channel_id: String,

    #[prost(bool, tag = "7")]
    pub skip_post_process: bool,

    #[prost(map = "string, string", tag = "8")]
    pub labels: HashMap<String, String>,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize)]
pub struct CreateFileResponse {
    #[prost(int32, tag = "1")]
    pub status: i32,

    #[prost(message, optional, tag = "2")]
    pub message: Option<ResponseErrorMessage>,

    #[prost(string, tag = "3")]
    pub file_id: String,
}

impl From<&ReportFileRequest> for CreateFileRequest {
    fn from(request: &ReportFileRequest) -> Self {
        Self {
            report_type: request.report_type.clone(),
            file_type: request.file_type.clone(),
            merchant_id: request.merchant_id.clone(),
            params: serde_json::to_vec(&request.params).unwrap_or_default(),
            user_id: request.user_id.clone(),
            notification_channel_id: request.notification_channel_id.clone(),
            skip_post_process: request.skip_post_process,
            labels: HashMap::new(),
        }
    }
}
