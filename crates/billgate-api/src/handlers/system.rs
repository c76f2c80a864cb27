//! Internal operator handlers
//!
//! Both are bulk operations and run under the extended backend deadline.

use axum::{
    extract::{RawQuery, State},
    Json,
};
use billgate_backend::{
    billing,
    proto::{SetTariffRatesRequest, UploadKeysRequest, UploadKeysResponse},
};
use billgate_service::{TariffRatesInput, UploadKeysInput};
use tracing::{info, instrument};

use super::AppState;
use crate::adapter::Deadline;
use crate::binding::bind_validated;
use crate::context::RequestContext;
use crate::error::ApiResult;
use crate::responses::EmptyResponse;

/// Upload product keys; returns the whole backend envelope
#[instrument(skip_all)]
pub async fn upload_keys(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
    ctx: RequestContext,
) -> ApiResult<Json<UploadKeysResponse>> {
    let input: UploadKeysInput = bind_validated(&[], query.as_deref(), &ctx.raw_body, |_| {})?;
    let request = UploadKeysRequest::from(input);
    let submitted = request.keys.len();

    let billing = &state.billing;
    let response = state
        .caller
        .call(
            billing::SERVICE_NAME,
            "UploadKeysFile",
            request,
            Deadline::Extended,
            |req| billing.upload_keys(req),
        )
        .await?;

    info!(submitted, stored = response.key_count, "Keys uploaded");
    Ok(Json(response))
}

/// Replace merchant tariff rates in bulk
#[instrument(skip_all)]
pub async fn set_tariff_rates(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
    ctx: RequestContext,
) -> ApiResult<Json<EmptyResponse>> {
    let input: TariffRatesInput = bind_validated(&[], query.as_deref(), &ctx.raw_body, |_| {})?;
    let request = SetTariffRatesRequest::from(input);
    let rates = request.rates.len();

    let billing = &state.billing;
    state
        .caller
        .call(
            billing::SERVICE_NAME,
            "SetMerchantTariffRates",
            request,
            Deadline::Extended,
            |req| billing.set_tariff_rates(req),
        )
        .await?;

    info!(rates, "Tariff rates replaced");
    Ok(Json(EmptyResponse::default()))
}
