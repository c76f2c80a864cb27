//! Service call adapter
//!
//! Every backend call goes through [`ServiceCaller::call`], which applies one
//! translation:
//!
//! 1. RPC failure or deadline expiry: logged with service, method, error and
//!    request, then reported as an opaque 500.
//! 2. Business failure: the embedded status becomes the HTTP status and the
//!    embedded message the body.
//! 3. Success: the response is handed back so the handler can pick the
//!    payload field it returns.

use billgate_backend::{BusinessResponse, TransportStatus};
use std::fmt::Debug;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, error};

use crate::config::BackendConfig;
use crate::error::ApiError;

/// Deadline class of a backend call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deadline {
    /// Ordinary request deadline
    Default,
    /// Long-running bulk operations
    Extended,
}

/// Runs backend calls under a deadline and translates their outcome
#[derive(Debug, Clone)]
pub struct ServiceCaller {
    request_timeout: Duration,
    extended_timeout: Duration,
}

impl ServiceCaller {
    pub fn new(request_timeout: Duration, extended_timeout: Duration) -> Self {
        Self {
            request_timeout,
            extended_timeout,
        }
    }

    pub fn from_config(config: &BackendConfig) -> Self {
        Self::new(config.request_timeout(), config.extended_timeout())
    }

    pub fn timeout_for(&self, deadline: Deadline) -> Duration {
        match deadline {
            Deadline::Default => self.request_timeout,
            Deadline::Extended => self.extended_timeout,
        }
    }

    /// Invoke `method` of `service` with `request`
    ///
    /// No retries: the first failure is returned.
    pub async fn call<Req, Resp, F, Fut>(
        &self,
        service: &'static str,
        method: &'static str,
        request: Req,
        deadline: Deadline,
        invoke: F,
    ) -> Result<Resp, ApiError>
    where
        Req: Clone + Debug,
        Resp: BusinessResponse,
        F: FnOnce(Req) -> Fut,
        Fut: Future<Output = Result<Resp, TransportStatus>>,
    {
        let timeout = self.timeout_for(deadline);
        let logged = request.clone();

        let response = match tokio::time::timeout(timeout, invoke(request)).await {
            Ok(Ok(response)) => response,
            Ok(Err(status)) => {
                error!(
                    service,
                    method,
                    error = %status,
                    request = ?logged,
                    "Backend call failed"
                );
                return Err(ApiError::transport());
            }
            Err(_) => {
                error!(
                    service,
                    method,
                    error = "deadline exceeded",
                    timeout_ms = timeout.as_millis() as u64,
                    request = ?logged,
                    "Backend call failed"
                );
                return Err(ApiError::transport());
            }
        };

        if !response.is_ok() {
            debug!(
                service,
                method,
                status = response.status(),
                "Backend reported business failure"
            );
            return Err(ApiError::business(
                response.status(),
                response.error_message(),
            ));
        }

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, TRANSPORT_ERROR_MESSAGE};
    use axum::http::StatusCode;
    use billgate_backend::proto::{
        GetCountriesListRequest, GetCountriesListResponse, ResponseErrorMessage,
    };
    use billgate_backend::RESPONSE_STATUS_OK;

    fn caller() -> ServiceCaller {
        ServiceCaller::new(Duration::from_secs(1), Duration::from_secs(60))
    }

    fn request() -> GetCountriesListRequest {
        GetCountriesListRequest {
            name: "Germany".to_string(),
        }
    }

    #[tokio::test]
    async fn test_ok_response_returned() {
        let response = caller()
            .call("billing", "GetCountriesList", request(), Deadline::Default, |req| async move {
                assert_eq!(req.name, "Germany");
                Ok(GetCountriesListResponse {
                    status: RESPONSE_STATUS_OK,
                    message: None,
                    items: Vec::new(),
                })
            })
            .await
            .unwrap();

        assert!(response.items.is_empty());
    }

    #[tokio::test]
    async fn test_transport_error_is_opaque() {
        let err = caller()
            .call("billing", "GetCountriesList", request(), Deadline::Default, |_| async {
                Err::<GetCountriesListResponse, _>(TransportStatus::unavailable(
                    "connection refused: 10.0.0.7:50051",
                ))
            })
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Transport);
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message(), TRANSPORT_ERROR_MESSAGE);
        assert!(!err.message().contains("refused"));
    }

    #[tokio::test]
    async fn test_business_status_becomes_http_status() {
        let err = caller()
            .call("billing", "GetCountriesList", request(), Deadline::Default, |_| async {
                Ok(GetCountriesListResponse {
                    status: 404,
                    message: Some(ResponseErrorMessage {
                        code: "co000001".to_string(),
                        message: "country not found".to_string(),
                        details: String::new(),
                    }),
                    items: Vec::new(),
                })
            })
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Business);
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.code(), "co000001");
        assert_eq!(err.message(), "country not found");
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_expiry_is_transport_error() {
        let err = caller()
            .call("billing", "GetCountriesList", request(), Deadline::Default, |_| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(GetCountriesListResponse::default())
            })
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Transport);
    }

    #[tokio::test(start_paused = true)]
    async fn test_extended_deadline_outlives_default() {
        let response = caller()
            .call("billing", "UploadKeys", request(), Deadline::Extended, |_| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(GetCountriesListResponse {
                    status: RESPONSE_STATUS_OK,
                    ..Default::default()
                })
            })
            .await;

        assert!(response.is_ok());
    }
}
