//! Handlers for signed merchant projects

use axum::{
    extract::{RawQuery, State},
    Json,
};
use billgate_backend::{billing, proto::OrderCreateRequest};
use billgate_service::CreateOrderInput;
use tracing::{error, info, instrument};

use super::AppState;
use crate::adapter::Deadline;
use crate::binding::bind_validated;
use crate::context::RequestContext;
use crate::error::{ApiError, ApiResult};
use crate::responses::OrderCreatedResponse;

/// Create a payment order for the signing project
#[instrument(skip_all, fields(project_id = %ctx.identity.id))]
pub async fn create_order(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
    ctx: RequestContext,
) -> ApiResult<Json<OrderCreatedResponse>> {
    let input: CreateOrderInput =
        bind_validated(&[], query.as_deref(), &ctx.raw_body, |input: &mut CreateOrderInput| {
            input.enrich(&ctx.identity)
        })?;
    let request = OrderCreateRequest::from(input);

    let billing = &state.billing;
    let response = state
        .caller
        .call(
            billing::SERVICE_NAME,
            "OrderCreateProcess",
            request,
            Deadline::Default,
            |req| billing.order_create(req),
        )
        .await?;

    let order = response.item.ok_or_else(|| {
        error!("Billing accepted the order without returning it");
        ApiError::transport()
    })?;

    info!(order_id = %order.id, "Order created");
    Ok(Json(OrderCreatedResponse {
        payment_form_url: state.config.urls.order_form_url(&order.id),
        id: order.id,
    }))
}
