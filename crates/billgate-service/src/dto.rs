//! Request DTOs bound from HTTP input
//!
//! Every DTO carries a [`ValidationSpec`] and converts into the backend
//! request it feeds. Fields that may come from path or query strings use the
//! lenient deserializers.

use billgate_backend::proto::{
    GetCountriesListRequest, GetCountryRequest, OrderCreateRequest, SetTariffRatesRequest,
    TariffRate, UploadKeysRequest,
};
use billgate_core::{Cursor, Identity};
use serde::{Deserialize, Serialize};

use crate::lenient;
use crate::validation::{Constraint, Format, Validate, ValidationSpec};

/// Payout statuses accepted as filters
pub const PAYOUT_STATUSES: &[&str] = &["pending", "in_progress", "paid", "canceled", "failed"];

// ============================================================================
// Countries
// ============================================================================

/// Query of `GET /api/v1/country`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CountryListQuery {
    /// Optional name filter
    #[serde(default)]
    pub name: String,
}

impl Validate for CountryListQuery {
    fn validation_spec() -> ValidationSpec {
        ValidationSpec::new().field(
            "name",
            [Constraint::Length {
                min: None,
                max: Some(255),
            }],
        )
    }
}

impl From<CountryListQuery> for GetCountriesListRequest {
    fn from(query: CountryListQuery) -> Self {
        Self { name: query.name }
    }
}

/// Path of `GET /api/v1/country/{code}`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CountryPath {
    #[serde(default)]
    pub code: String,
}

impl Validate for CountryPath {
    fn validation_spec() -> ValidationSpec {
        ValidationSpec::new().field(
            "code",
            [Constraint::Required, Constraint::Format(Format::Alpha2)],
        )
    }
}

impl From<CountryPath> for GetCountryRequest {
    fn from(path: CountryPath) -> Self {
        Self { iso_code: path.code }
    }
}

// ============================================================================
// Orders
// ============================================================================

/// Body of `POST /auth/api/v1/order`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateOrderInput {
    /// Stamped from the project identity
    #[serde(default)]
    pub project_id: String,

    #[serde(default)]
    pub merchant_order_id: String,

    #[serde(default, deserialize_with = "lenient::number")]
    pub amount: f64,

    #[serde(default)]
    pub currency: String,

    #[serde(default)]
    pub account: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub customer_email: String,
}

impl CreateOrderInput {
    /// The signing project always owns the order
    pub fn enrich(&mut self, identity: &Identity) {
        self.project_id = identity.id.clone();
    }
}

impl Validate for CreateOrderInput {
    fn validation_spec() -> ValidationSpec {
        ValidationSpec::new()
            .field("project_id", [Constraint::Required, Constraint::Format(Format::ObjectId)])
            .field("merchant_order_id", [Constraint::length(1, 255)])
            .field("amount", [Constraint::Required, Constraint::min(0.01)])
            .field("currency", [Constraint::Required, Constraint::length(3, 3)])
            .field("account", [Constraint::Length { min: None, max: Some(255) }])
            .field("description", [Constraint::Length { min: None, max: Some(1024) }])
            .field("customer_email", [Constraint::Format(Format::Email)])
    }
}

impl From<CreateOrderInput> for OrderCreateRequest {
    fn from(input: CreateOrderInput) -> Self {
        Self {
            project_id: input.project_id,
            merchant_order_id: input.merchant_order_id,
            amount: input.amount,
            currency: input.currency,
            account: input.account,
            description: input.description,
            customer_email: input.customer_email,
        }
    }
}

// ============================================================================
// Payouts
// ============================================================================

/// Query of `GET /admin/api/v1/payouts`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PayoutListQuery {
    /// Overridden by the caller's merchant, if any
    #[serde(default)]
    pub merchant_id: String,

    #[serde(default, deserialize_with = "lenient::one_or_many")]
    pub status: Vec<String>,
}

impl PayoutListQuery {
    /// Callers bound to a merchant only see that merchant's payouts
    pub fn enrich(&mut self, identity: &Identity) {
        if !identity.merchant_id.is_empty() {
            self.merchant_id = identity.merchant_id.clone();
        }
    }

    /// Backend request for one page
    pub fn into_request(self, cursor: &Cursor) -> billgate_backend::proto::ListPayoutsRequest {
        billgate_backend::proto::ListPayoutsRequest {
            merchant_id: self.merchant_id,
            status: self.status,
            limit: i64::from(cursor.limit),
            offset: i64::from(cursor.offset),
            sort: cursor.sort.clone(),
        }
    }
}

impl Validate for PayoutListQuery {
    fn validation_spec() -> ValidationSpec {
        ValidationSpec::new()
            .field("merchant_id", [Constraint::Required, Constraint::Format(Format::ObjectId)])
            .field("status.*", [Constraint::one_of(PAYOUT_STATUSES.iter().copied())])
    }
}

// ============================================================================
// Reports
// ============================================================================

/// Body of `POST /admin/api/v1/reports/file`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportFileInput {
    #[serde(default)]
    pub report_type: String,

    #[serde(default)]
    pub file_type: String,

    /// Only honoured for callers not bound to a merchant
    #[serde(default)]
    pub merchant_id: String,

    #[serde(default)]
    pub params: serde_json::Map<String, serde_json::Value>,
}

// ============================================================================
// Bulk operations
// ============================================================================

/// Body of `POST /system/api/v1/keys/upload`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UploadKeysInput {
    #[serde(default)]
    pub key_product_id: String,

    #[serde(default)]
    pub platform_id: String,

    #[serde(default, deserialize_with = "lenient::one_or_many")]
    pub keys: Vec<String>,
}

impl Validate for UploadKeysInput {
    fn validation_spec() -> ValidationSpec {
        ValidationSpec::new()
            .field("key_product_id", [Constraint::Required, Constraint::Format(Format::ObjectId)])
            .field("platform_id", [Constraint::Required, Constraint::length(1, 64)])
            .field(
                "keys",
                [
                    Constraint::Required,
                    Constraint::Length {
                        min: Some(1),
                        max: Some(100_000),
                    },
                ],
            )
            .field("keys.*", [Constraint::Required, Constraint::length(1, 255)])
    }
}

impl From<UploadKeysInput> for UploadKeysRequest {
    fn from(input: UploadKeysInput) -> Self {
        Self {
            key_product_id: input.key_product_id,
            platform_id: input.platform_id,
            keys: input.keys,
        }
    }
}

/// One tariff rate line
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TariffRateInput {
    #[serde(default)]
    pub payment_method: String,

    #[serde(default)]
    pub region: String,

    #[serde(default, deserialize_with = "lenient::number")]
    pub min_amount: f64,

    #[serde(default, deserialize_with = "lenient::number")]
    pub max_amount: f64,

    #[serde(default, deserialize_with = "lenient::number")]
    pub percent_fee: f64,

    #[serde(default, deserialize_with = "lenient::number")]
    pub fixed_fee: f64,

    #[serde(default)]
    pub fixed_fee_currency: String,
}

/// Body of `POST /system/api/v1/tariffs/rates`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TariffRatesInput {
    #[serde(default)]
    pub rates: Vec<TariffRateInput>,
}

impl Validate for TariffRatesInput {
    fn validation_spec() -> ValidationSpec {
        ValidationSpec::new()
            .field("rates", [Constraint::Required])
            .field("rates.*.payment_method", [Constraint::Required])
            .field("rates.*.region", [Constraint::Required])
            .field("rates.*.min_amount", [Constraint::min(0.0)])
            .field("rates.*.max_amount", [Constraint::min(0.0)])
            .field("rates.*.percent_fee", [Constraint::range(0.0, 100.0)])
            .field("rates.*.fixed_fee", [Constraint::min(0.0)])
            .field(
                "rates.*.fixed_fee_currency",
                [
                    Constraint::RequiredWith("fixed_fee".to_string()),
                    Constraint::length(3, 3),
                ],
            )
    }
}

impl From<TariffRatesInput> for SetTariffRatesRequest {
    fn from(input: TariffRatesInput) -> Self {
        Self {
            rates: input
                .rates
                .into_iter()
                .map(|rate| TariffRate {
                    payment_method: rate.payment_method,
                    region: rate.region,
                    min_amount: rate.min_amount,
                    max_amount: rate.max_amount,
                    percent_fee: rate.percent_fee,
                    fixed_fee: rate.fixed_fee,
                    fixed_fee_currency: rate.fixed_fee_currency,
                })
                .collect(),
        }
    }
}
