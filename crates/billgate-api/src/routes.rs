//! API route definitions
//!
//! Routes are registered per [`RouteGroup`]. Every group router is wrapped in
//! the authentication layer for its tier; groups that require authorization
//! also get the policy check, which runs after authentication. Groups are
//! merged rather than nested so the matched path seen by the policy is the
//! full route template.

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use billgate_core::RouteGroup;

use crate::auth::{authenticate, authorize, AuthState};
use crate::handlers::{admin, common, project, system, webhook, AppState};

/// Route templates
pub mod paths {
    pub const HEALTH: &str = "/health";
    pub const VERSION: &str = "/version";

    pub const COUNTRIES: &str = "/api/v1/country";
    pub const COUNTRY: &str = "/api/v1/country/{code}";

    pub const BILLING_WEBHOOK: &str = "/webhook/billing";

    pub const ORDER: &str = "/auth/api/v1/order";

    pub const PAYOUTS: &str = "/admin/api/v1/payouts";
    pub const PAYOUT_DOCUMENT: &str = "/admin/api/v1/payouts/documents/{file}";
    pub const REPORT_FILE: &str = "/admin/api/v1/reports/file";
    pub const REPORT_FILE_DOWNLOAD: &str = "/admin/api/v1/reports/file/{file}";
    pub const MERCHANT_AGREEMENT: &str =
        "/admin/api/v1/merchants/{merchant_id}/agreement/document/{file}";

    pub const KEYS_UPLOAD: &str = "/system/api/v1/keys/upload";
    pub const TARIFF_RATES: &str = "/system/api/v1/tariffs/rates";
}

/// Build the API router with all route groups
pub fn build_router(state: AppState, auth: AuthState) -> Router {
    Router::new()
        .route(paths::HEALTH, get(common::health_check))
        .route(paths::VERSION, get(common::version_info))
        .merge(protect(RouteGroup::Common, common_routes(), &auth))
        .merge(protect(RouteGroup::WebHook, webhook_routes(), &auth))
        .merge(protect(RouteGroup::AuthProject, project_routes(), &auth))
        .merge(protect(RouteGroup::AuthUser, user_routes(), &auth))
        .merge(protect(RouteGroup::SystemUser, system_routes(), &auth))
        .with_state(state)
}

fn common_routes() -> Router<AppState> {
    Router::new()
        .route(paths::COUNTRIES, get(common::list_countries))
        .route(paths::COUNTRY, get(common::get_country))
}

fn webhook_routes() -> Router<AppState> {
    Router::new().route(paths::BILLING_WEBHOOK, post(webhook::billing_webhook))
}

fn project_routes() -> Router<AppState> {
    Router::new().route(paths::ORDER, post(project::create_order))
}

fn user_routes() -> Router<AppState> {
    Router::new()
        .route(paths::PAYOUTS, get(admin::list_payouts))
        .route(paths::PAYOUT_DOCUMENT, get(admin::download_payout_document))
        .route(paths::REPORT_FILE, post(admin::generate_report))
        .route(paths::REPORT_FILE_DOWNLOAD, get(admin::download_report))
        .route(paths::MERCHANT_AGREEMENT, get(admin::download_agreement))
}

fn system_routes() -> Router<AppState> {
    Router::new()
        .route(paths::KEYS_UPLOAD, post(system::upload_keys))
        .route(paths::TARIFF_RATES, post(system::set_tariff_rates))
}

/// Wrap a group router in the layers of its trust tier
fn protect(group: RouteGroup, routes: Router<AppState>, auth: &AuthState) -> Router<AppState> {
    let routes = if group.requires_authorization() {
        routes.route_layer(middleware::from_fn_with_state(auth.clone(), authorize))
    } else {
        routes
    };

    routes.route_layer(middleware::from_fn_with_state(
        (auth.clone(), group),
        authenticate,
    ))
}
