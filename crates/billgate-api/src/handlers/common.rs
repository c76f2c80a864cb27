//! Public handlers: health, version and country reference data

use axum::{
    extract::{RawQuery, State},
    Json,
};
use billgate_backend::{
    billing,
    proto::{Country, GetCountriesListRequest, GetCountryRequest},
};
use billgate_service::{CountryListQuery, CountryPath};
use tracing::{debug, instrument};

use super::AppState;
use crate::adapter::Deadline;
use crate::binding::{bind_validated, PathParams};
use crate::context::RequestContext;
use crate::error::{ApiError, ApiResult};
use crate::responses::{HealthResponse, VersionResponse};

/// Health check
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

/// Build information
pub async fn version_info() -> Json<VersionResponse> {
    Json(VersionResponse::current())
}

/// List countries, optionally filtered by name
#[instrument(skip_all)]
pub async fn list_countries(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
    ctx: RequestContext,
) -> ApiResult<Json<Vec<Country>>> {
    let input: CountryListQuery = bind_validated(&[], query.as_deref(), &ctx.raw_body, |_| {})?;
    let request = GetCountriesListRequest::from(input);

    let billing = &state.billing;
    let response = state
        .caller
        .call(
            billing::SERVICE_NAME,
            "GetCountriesList",
            request,
            Deadline::Default,
            |req| billing.get_countries_list(req),
        )
        .await?;

    debug!(count = response.items.len(), "Countries listed");
    Ok(Json(response.items))
}

/// Get one country by ISO 3166-1 alpha-2 code
#[instrument(skip_all)]
pub async fn get_country(
    State(state): State<AppState>,
    PathParams(path): PathParams,
    ctx: RequestContext,
) -> ApiResult<Json<Country>> {
    let input: CountryPath = bind_validated(&path, None, &ctx.raw_body, |_| {})?;
    let request = GetCountryRequest::from(input);

    let billing = &state.billing;
    let response = state
        .caller
        .call(
            billing::SERVICE_NAME,
            "GetCountry",
            request,
            Deadline::Default,
            |req| billing.get_country(req),
        )
        .await?;

    response.item.map(Json).ok_or_else(ApiError::transport)
}
