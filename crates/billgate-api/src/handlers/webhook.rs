//! Payment provider webhooks

use axum::{extract::State, Json};
use billgate_backend::{billing, proto::ProcessWebhookRequest};
use tracing::{info, instrument};

use super::AppState;
use crate::adapter::Deadline;
use crate::context::RequestContext;
use crate::error::ApiResult;
use crate::responses::EmptyResponse;

/// Provider name recorded with billing webhooks
pub const BILLING_PROVIDER: &str = "billing";

/// Relay a signed provider notification to billing
///
/// The payload is forwarded byte for byte as it was signed.
#[instrument(skip_all, fields(bytes = ctx.raw_body.len()))]
pub async fn billing_webhook(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> ApiResult<Json<EmptyResponse>> {
    let request = ProcessWebhookRequest {
        provider: BILLING_PROVIDER.to_string(),
        payload: ctx.raw_body.to_vec(),
    };

    let billing = &state.billing;
    state
        .caller
        .call(
            billing::SERVICE_NAME,
            "ProcessWebhook",
            request,
            Deadline::Default,
            |req| billing.process_webhook(req),
        )
        .await?;

    info!("Webhook accepted");
    Ok(Json(EmptyResponse::default()))
}
