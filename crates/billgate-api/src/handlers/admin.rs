//! Handlers for authenticated users
//!
//! Report files follow a two-phase flow. [`generate_report`] submits the
//! request to the reporter and returns the file id at once; the reporter
//! notifies the chosen channel when the file is ready, and the client then
//! fetches it through [`download_report`].

use axum::{
    extract::{RawQuery, State},
    http::{header::HOST, HeaderMap, Uri},
    response::Response,
    Json,
};
use billgate_backend::{
    billing,
    proto::{CreateFileRequest, PayoutDocumentsPaginate},
    reporter,
};
use billgate_core::FileName;
use billgate_service::{
    prepare_report_file, Constraint, Format, PayoutListQuery, ReportFileInput, ServiceError,
    Validate, ValidationSpec,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, warn};

use super::AppState;
use crate::adapter::Deadline;
use crate::binding::{bind, bind_validated, PathParams};
use crate::context::RequestContext;
use crate::download;
use crate::error::{ApiError, ApiResult};
use crate::responses::ReportFileCreatedResponse;
use crate::routes::paths;

/// List payouts of the caller's merchant, one page at a time
#[instrument(skip_all, fields(user_id = %ctx.identity.id))]
pub async fn list_payouts(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
    ctx: RequestContext,
) -> ApiResult<Json<PayoutDocumentsPaginate>> {
    let input: PayoutListQuery =
        bind_validated(&[], query.as_deref(), &ctx.raw_body, |q: &mut PayoutListQuery| {
            q.enrich(&ctx.identity)
        })?;
    let request = input.into_request(&ctx.cursor);

    let billing = &state.billing;
    let response = state
        .caller
        .call(
            billing::SERVICE_NAME,
            "GetPayoutDocuments",
            request,
            Deadline::Default,
            |req| billing.list_payouts(req),
        )
        .await?;

    Ok(Json(response.item.unwrap_or_default()))
}

/// Ask the reporter to generate a file
#[instrument(skip_all, fields(user_id = %ctx.identity.id))]
pub async fn generate_report(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
    uri: Uri,
    headers: HeaderMap,
    ctx: RequestContext,
) -> ApiResult<Json<ReportFileCreatedResponse>> {
    let input: ReportFileInput = bind(&[], query.as_deref(), &ctx.raw_body)?;
    let report = prepare_report_file(input, &ctx.identity)?;
    let host = request_host(&headers, &uri).ok_or_else(|| {
        debug!("Request carries no host to build the download link from");
        ApiError::binding()
    })?;

    let reporter = &state.reporter;
    let response = state
        .caller
        .call(
            reporter::SERVICE_NAME,
            "CreateFile",
            CreateFileRequest::from(&report),
            Deadline::Default,
            |req| reporter.create_file(req),
        )
        .await?;

    if response.file_id.is_empty() {
        error!("Reporter accepted the report without a file id");
        return Err(ApiError::transport());
    }

    let file_name = format!("{}.{}", response.file_id, report.file_type);
    let download_url = format!(
        "{}://{}{}/{}",
        state.config.urls.http_scheme,
        host,
        paths::REPORT_FILE,
        file_name
    );

    info!(file_id = %response.file_id, report_type = %report.report_type, "Report requested");
    Ok(Json(ReportFileCreatedResponse {
        file_id: response.file_id,
        download_url,
    }))
}

fn request_host(headers: &HeaderMap, uri: &Uri) -> Option<String> {
    headers
        .get(HOST)
        .and_then(|h| h.to_str().ok())
        .filter(|h| !h.is_empty())
        .map(str::to_string)
        .or_else(|| uri.authority().map(|a| a.to_string()))
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct FilePath {
    #[serde(default)]
    file: String,
}

impl Validate for FilePath {
    fn validation_spec() -> ValidationSpec {
        ValidationSpec::new().field(
            "file",
            [Constraint::Required, Constraint::length(1, 255)],
        )
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct AgreementPath {
    #[serde(default)]
    merchant_id: String,

    #[serde(default)]
    file: String,
}

impl Validate for AgreementPath {
    fn validation_spec() -> ValidationSpec {
        ValidationSpec::new()
            .field(
                "merchant_id",
                [Constraint::Required, Constraint::Format(Format::ObjectId)],
            )
            .field(
                "file",
                [Constraint::Required, Constraint::length(1, 255)],
            )
    }
}

/// Stream a generated report file
#[instrument(skip_all)]
pub async fn download_report(
    State(state): State<AppState>,
    PathParams(path): PathParams,
) -> ApiResult<Response> {
    let input: FilePath = bind_validated(&path, None, b"", |_| {})?;
    let file_name = FileName::parse(input.file).map_err(ServiceError::from)?;
    let key = file_name.as_str().to_string();

    download::deliver(
        state.storage.reporter.as_ref(),
        &state.temp_root(),
        &key,
        file_name,
    )
    .await
}

/// Stream a merchant's signed agreement
#[instrument(skip_all, fields(user_id = %ctx.identity.id))]
pub async fn download_agreement(
    State(state): State<AppState>,
    PathParams(path): PathParams,
    ctx: RequestContext,
) -> ApiResult<Response> {
    let input: AgreementPath = bind_validated(&path, None, b"", |_| {})?;

    if !ctx.identity.merchant_id.is_empty() && ctx.identity.merchant_id != input.merchant_id {
        warn!(merchant_id = %input.merchant_id, "Agreement of another merchant requested");
        return Err(ApiError::forbidden("Agreement belongs to another merchant"));
    }

    let file_name = FileName::parse(input.file).map_err(ServiceError::from)?;
    let key = format!("{}/{}", input.merchant_id, file_name);

    download::deliver(
        state.storage.agreements.as_ref(),
        &state.temp_root(),
        &key,
        file_name,
    )
    .await
}

/// Stream a payout document
#[instrument(skip_all)]
pub async fn download_payout_document(
    State(state): State<AppState>,
    PathParams(path): PathParams,
) -> ApiResult<Response> {
    let input: FilePath = bind_validated(&path, None, b"", |_| {})?;
    let file_name = FileName::parse(input.file).map_err(ServiceError::from)?;
    let key = file_name.as_str().to_string();

    download::deliver(
        state.storage.documents.as_ref(),
        &state.temp_root(),
        &key,
        file_name,
    )
    .await
}
