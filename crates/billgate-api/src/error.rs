//! API error handling
//!
//! Every failure leaving the gateway is an [`ApiError`]. Opaque failures
//! (transport, resource, internal) carry only `{message}`; everything else
//! carries `{code, message, details?}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use billgate_backend::proto::ResponseErrorMessage;
use billgate_service::{ServiceError, Violations};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::error;

/// Message returned for every failed backend call
pub const TRANSPORT_ERROR_MESSAGE: &str = "internal error, please try again later";

/// Message returned when a file cannot be delivered
pub const DOWNLOAD_ERROR_MESSAGE: &str = "unable to download the requested file";

/// Message returned when request parameters cannot be decoded
pub const BINDING_ERROR_MESSAGE: &str = "request parameters incorrect";

/// Message returned when decoded parameters break their constraints
pub const VALIDATION_ERROR_MESSAGE: &str = "request validation failed";

/// Failure classes of the gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Binding,
    Validation,
    Authentication,
    Authorization,
    Transport,
    Business,
    Resource,
    Internal,
}

impl ErrorKind {
    /// Opaque kinds never expose a code or details
    pub fn is_opaque(self) -> bool {
        matches!(
            self,
            ErrorKind::Transport | ErrorKind::Resource | ErrorKind::Internal
        )
    }
}

/// API error type that can be converted to HTTP responses
#[derive(Debug)]
pub struct ApiError {
    kind: ErrorKind,
    status_code: StatusCode,
    code: String,
    message: String,
    details: Option<String>,
}

impl ApiError {
    fn new(
        kind: ErrorKind,
        status_code: StatusCode,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            status_code,
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Request could not be decoded (400)
    pub fn binding() -> Self {
        Self::new(
            ErrorKind::Binding,
            StatusCode::BAD_REQUEST,
            "BINDING_FAILED",
            BINDING_ERROR_MESSAGE,
        )
    }

    /// Decoded request breaks its constraints (400)
    pub fn validation(violations: &Violations) -> Self {
        Self {
            details: Some(violations.to_string()),
            ..Self::new(
                ErrorKind::Validation,
                StatusCode::BAD_REQUEST,
                "VALIDATION_FAILED",
                VALIDATION_ERROR_MESSAGE,
            )
        }
    }

    /// Missing or invalid credential (401)
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(
            ErrorKind::Authentication,
            StatusCode::UNAUTHORIZED,
            "UNAUTHORIZED",
            message,
        )
    }

    /// Credential lacks the required permission (403)
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(
            ErrorKind::Authorization,
            StatusCode::FORBIDDEN,
            "FORBIDDEN",
            message,
        )
    }

    /// Backend call failed below the business layer (500)
    pub fn transport() -> Self {
        Self::new(
            ErrorKind::Transport,
            StatusCode::INTERNAL_SERVER_ERROR,
            "",
            TRANSPORT_ERROR_MESSAGE,
        )
    }

    /// File could not be fetched or streamed (500)
    pub fn resource() -> Self {
        Self::new(
            ErrorKind::Resource,
            StatusCode::INTERNAL_SERVER_ERROR,
            "",
            DOWNLOAD_ERROR_MESSAGE,
        )
    }

    /// Gateway invariant broken (500)
    pub fn internal() -> Self {
        Self::new(
            ErrorKind::Internal,
            StatusCode::INTERNAL_SERVER_ERROR,
            "",
            TRANSPORT_ERROR_MESSAGE,
        )
    }

    /// Backend reported business failure `status`
    ///
    /// The status becomes the HTTP status and the embedded message is
    /// returned verbatim. A status outside the HTTP range cannot be relayed
    /// and is reported as an opaque internal error.
    pub fn business(status: i32, message: Option<&ResponseErrorMessage>) -> Self {
        let Some(status_code) = u16::try_from(status)
            .ok()
            .and_then(|s| StatusCode::from_u16(s).ok())
        else {
            error!(status, "Backend returned a status outside the HTTP range");
            return Self::internal();
        };

        match message {
            Some(message) => Self {
                details: (!message.details.is_empty()).then(|| message.details.clone()),
                ..Self::new(
                    ErrorKind::Business,
                    status_code,
                    message.code.clone(),
                    message.message.clone(),
                )
            },
            None => Self::new(
                ErrorKind::Business,
                status_code,
                "",
                status_code.canonical_reason().unwrap_or_default(),
            ),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn status_code(&self) -> StatusCode {
        self.status_code
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn details(&self) -> Option<&str> {
        self.details.as_deref()
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ApiError {}

/// Body of opaque failures
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageResponse {
    pub message: String,
}

/// Body of structured failures
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    /// Stable error code for programmatic handling
    pub code: String,

    pub message: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.kind.is_opaque() {
            let body = MessageResponse {
                message: self.message,
            };
            return (self.status_code, Json(body)).into_response();
        }

        let body = ErrorResponse {
            code: self.code,
            message: self.message,
            details: self.details,
        };

        (self.status_code, Json(body)).into_response()
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(violations) => ApiError::validation(&violations),
            ServiceError::InvalidInput(_) => ApiError::binding(),
        }
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use billgate_service::{Constraint, ValidationSpec};
    use http_body_util::BodyExt;

    async fn body_json(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_transport_body_is_opaque() {
        let (status, body) = body_json(ApiError::transport()).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, serde_json::json!({"message": TRANSPORT_ERROR_MESSAGE}));
    }

    #[tokio::test]
    async fn test_resource_body_names_download() {
        let (status, body) = body_json(ApiError::resource()).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, serde_json::json!({"message": DOWNLOAD_ERROR_MESSAGE}));
    }

    #[tokio::test]
    async fn test_validation_body_lists_every_violation() {
        let violations = ValidationSpec::new()
            .field("a", [Constraint::Required])
            .field("b", [Constraint::Required])
            .check(&serde_json::json!({}))
            .unwrap_err();

        let (status, body) = body_json(ApiError::validation(&violations)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_FAILED");
        assert_eq!(body["details"], "a: required; b: required");
    }

    #[tokio::test]
    async fn test_business_error_relayed_verbatim() {
        let message = ResponseErrorMessage {
            code: "ma000012".to_string(),
            message: "merchant not found".to_string(),
            details: String::new(),
        };

        let (status, body) = body_json(ApiError::business(404, Some(&message))).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(
            body,
            serde_json::json!({"code": "ma000012", "message": "merchant not found"})
        );
    }

    #[tokio::test]
    async fn test_business_error_without_message() {
        let (status, body) = body_json(ApiError::business(409, None)).await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body, serde_json::json!({"code": "", "message": "Conflict"}));
    }

    #[test]
    fn test_business_status_out_of_range() {
        assert_eq!(ApiError::business(-1, None).kind(), ErrorKind::Internal);
        assert_eq!(ApiError::business(42, None).kind(), ErrorKind::Internal);
        assert_eq!(
            ApiError::business(1200, None).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_binding_error() {
        let err = ApiError::binding();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.message(), BINDING_ERROR_MESSAGE);
    }
}
