//! Business status contract
//!
//! Every backend response embeds its own numeric status next to an optional
//! structured error. A successful RPC can still be a business failure; the
//! status is then reused verbatim as the HTTP status code.

use crate::proto::{
    CreateFileResponse, EmptyResponseWithStatus, GetCountriesListResponse, GetCountryResponse,
    GetProjectResponse, ListPayoutsResponse, OrderCreateResponse, ResponseErrorMessage,
    UploadKeysResponse,
};

/// The only status value treated as business success
pub const RESPONSE_STATUS_OK: i32 = 200;

/// Response carrying an embedded business status
pub trait BusinessResponse {
    /// Embedded numeric status
    fn status(&self) -> i32;

    /// Embedded error, present on business failures
    fn error_message(&self) -> Option<&ResponseErrorMessage>;

    /// Whether the backend reported business success
    fn is_ok(&self) -> bool {
        self.status() == RESPONSE_STATUS_OK
    }
}

macro_rules! business_response {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl BusinessResponse for $ty {
                fn status(&self) -> i32 {
                    self.status
                }

                fn error_message(&self) -> Option<&ResponseErrorMessage> {
                    self.message.as_ref()
                }
            }
        )+
    };
}

business_response!(
    EmptyResponseWithStatus,
    GetCountriesListResponse,
    GetCountryResponse,
    GetProjectResponse,
    OrderCreateResponse,
    ListPayoutsResponse,
    UploadKeysResponse,
    CreateFileResponse,
);
