//! Authentication and authorization per route group

mod common;

use axum::http::StatusCode;
use common::fakes::{PROJECT_ID, PROJECT_SECRET};
use common::*;
use serde_json::json;

fn keys_body() -> serde_json::Value {
    json!({
        "key_product_id": "5be2e16701d96d00012d26c8",
        "platform_id": "steam",
        "keys": ["AAAA-BBBB-CCCC", "DDDD-EEEE-FFFF"]
    })
}

fn tariffs_body() -> serde_json::Value {
    json!({
        "rates": [{
            "payment_method": "card",
            "region": "EU",
            "min_amount": 0,
            "max_amount": 1000,
            "percent_fee": 2.5
        }]
    })
}

// ============================================================================
// SystemUser
// ============================================================================

#[tokio::test]
async fn test_system_routes_without_credential_are_rejected_before_backend() {
    let app = TestApp::new();

    for (uri, body) in [
        ("/system/api/v1/keys/upload", keys_body()),
        ("/system/api/v1/tariffs/rates", tariffs_body()),
    ] {
        let response = app.send(post_json(uri, &body)).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{uri}");
    }

    assert!(app.billing.calls().is_empty());
}

#[tokio::test]
async fn test_system_routes_with_wrong_credential_are_rejected() {
    let app = TestApp::new();
    let request = post_raw(
        "/system/api/v1/keys/upload",
        keys_body().to_string().into_bytes(),
        &[("x-system-token", "guessed")],
    );

    let response = app.send(request).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(app.billing.calls().is_empty());
}

#[tokio::test]
async fn test_upload_keys_returns_full_envelope() {
    let app = TestApp::new();
    let request = post_raw(
        "/system/api/v1/keys/upload",
        keys_body().to_string().into_bytes(),
        &[("x-system-token", SYSTEM_TOKEN)],
    );

    let response = app.send(request).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], 200);
    assert_eq!(body["key_count"], 2);

    let uploads = app.billing.key_uploads.lock().unwrap();
    assert_eq!(uploads[0].platform_id, "steam");
}

#[tokio::test]
async fn test_tariff_rates_return_empty_object() {
    let app = TestApp::new();
    let request = post_raw(
        "/system/api/v1/tariffs/rates",
        tariffs_body().to_string().into_bytes(),
        &[("x-system-token", SYSTEM_TOKEN)],
    );

    let response = app.send(request).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({}));
    assert_eq!(app.billing.tariffs.lock().unwrap()[0].rates.len(), 1);
}

// ============================================================================
// AuthUser
// ============================================================================

#[tokio::test]
async fn test_user_routes_without_token_are_unauthorized() {
    let app = TestApp::new();

    let response = app.send(get("/admin/api/v1/payouts")).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["code"], "UNAUTHORIZED");
    assert!(app.billing.calls().is_empty());
}

#[tokio::test]
async fn test_expired_token_is_reported_as_expired() {
    let app = TestApp::new();
    let token = app.expired_bearer("merchant");

    let response = app.send(get_as("/admin/api/v1/payouts", &token)).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        body_json(response).await["message"],
        "Authentication token has expired"
    );
}

#[tokio::test]
async fn test_token_from_another_issuer_is_rejected() {
    let app = TestApp::new();
    let claims = billgate_api::Claims::new("user-42", "https://elsewhere.test", CLIENT_ID, 600)
        .with_role("admin");
    let token = bearer_token(&claims);

    let response = app.send(get_as("/admin/api/v1/payouts", &token)).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_role_without_permission_is_forbidden_before_backend() {
    let app = TestApp::new();
    let token = app.bearer("guest", MERCHANT_ID, "");

    let requests = [
        get_as("/admin/api/v1/payouts", &token),
        get_as("/admin/api/v1/payouts/documents/payout.pdf", &token),
        get_as("/admin/api/v1/reports/file/report.pdf", &token),
        get_as(
            &format!("/admin/api/v1/merchants/{MERCHANT_ID}/agreement/document/a.pdf"),
            &token,
        ),
        post_json_as(
            "/admin/api/v1/reports/file",
            &token,
            &json!({"report_type": "vat", "file_type": "pdf"}),
        ),
    ];

    for request in requests {
        let uri = request.uri().to_string();
        let response = app.send(request).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN, "{uri}");
    }

    assert!(app.billing.calls().is_empty());
    assert!(app.reporter.requests.lock().unwrap().is_empty());
    assert!(app.reports.fetched().is_empty());
    assert!(app.agreements.fetched().is_empty());
    assert!(app.documents.fetched().is_empty());
}

#[tokio::test]
async fn test_merchant_role_may_list_payouts() {
    let app = TestApp::new();
    let token = app.bearer("merchant", MERCHANT_ID, "");

    let response = app.send(get_as("/admin/api/v1/payouts", &token)).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(app.billing.handler_calls(), vec!["GetPayoutDocuments"]);
}

#[tokio::test]
async fn test_authorization_bypass_lets_any_role_through() {
    let app = TestApp::with_config(|config| config.auth.disable_authz = true);
    let token = app.bearer("guest", MERCHANT_ID, "");

    let response = app.send(get_as("/admin/api/v1/payouts", &token)).await;

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_authentication_bypass_admits_anonymous_callers() {
    let app = TestApp::with_config(|config| {
        config.auth.disable_authn = true;
        config.auth.disable_authz = true;
    });

    let response = app
        .send(post_json("/system/api/v1/keys/upload", &keys_body()))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(app.billing.handler_calls(), vec!["UploadKeysFile"]);
}

#[tokio::test]
async fn test_authentication_bypass_alone_still_enforces_policy() {
    let app = TestApp::with_config(|config| config.auth.disable_authn = true);

    let response = app.send(get("/admin/api/v1/payouts")).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(app.billing.calls().is_empty());
}

// ============================================================================
// WebHook
// ============================================================================

#[tokio::test]
async fn test_signed_webhook_is_forwarded_verbatim() {
    let app = TestApp::new();
    let payload = br#"{"event":"payment.succeeded","id":"evt_1"}"#.to_vec();
    let signature = signed(WEBHOOK_SECRET, &payload);

    let response = app
        .send(post_raw(
            "/webhook/billing",
            payload.clone(),
            &[("x-webhook-signature", &signature)],
        ))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({}));

    let webhooks = app.billing.webhooks.lock().unwrap();
    assert_eq!(webhooks[0].payload, payload);
    assert_eq!(webhooks[0].provider, "billing");
}

#[tokio::test]
async fn test_unsigned_webhook_is_rejected() {
    let app = TestApp::new();
    let payload = br#"{"event":"payment.succeeded"}"#.to_vec();
    let signature = signed("not-the-secret", &payload);

    let missing = app.send(post_raw("/webhook/billing", payload.clone(), &[])).await;
    let forged = app
        .send(post_raw(
            "/webhook/billing",
            payload,
            &[("x-webhook-signature", &signature)],
        ))
        .await;

    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(forged.status(), StatusCode::UNAUTHORIZED);
    assert!(app.billing.calls().is_empty());
}

// ============================================================================
// AuthProject
// ============================================================================

fn order_body() -> Vec<u8> {
    json!({
        "project_id": "5be2e16701d96d00012d26ff",
        "merchant_order_id": "ord-1001",
        "amount": "19.99",
        "currency": "EUR",
        "customer_email": "buyer@example.com"
    })
    .to_string()
    .into_bytes()
}

#[tokio::test]
async fn test_signed_project_creates_order() {
    let app = TestApp::new();
    let body = order_body();
    let signature = signed(PROJECT_SECRET, &body);

    let response = app
        .send(post_raw(
            "/auth/api/v1/order",
            body,
            &[("x-project-id", PROJECT_ID), ("x-signature", &signature)],
        ))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({
            "id": "order-7",
            "payment_form_url": "https://pay.billgate.test/order/order-7"
        })
    );

    let orders = app.billing.orders.lock().unwrap();
    assert_eq!(orders[0].project_id, PROJECT_ID);
    assert_eq!(orders[0].amount, 19.99);
}

#[tokio::test]
async fn test_project_with_bad_signature_never_creates_order() {
    let app = TestApp::new();
    let body = order_body();
    let signature = signed("wrong-secret", &body);

    let response = app
        .send(post_raw(
            "/auth/api/v1/order",
            body,
            &[("x-project-id", PROJECT_ID), ("x-signature", &signature)],
        ))
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(app.billing.calls(), vec!["GetProject"]);
}

#[tokio::test]
async fn test_unknown_project_is_unauthorized() {
    let app = TestApp::new();
    let body = order_body();
    let signature = signed(PROJECT_SECRET, &body);

    let response = app
        .send(post_raw(
            "/auth/api/v1/order",
            body,
            &[("x-project-id", "5be2e16701d96d00012d2600"), ("x-signature", &signature)],
        ))
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(app.billing.handler_calls().is_empty());
}
