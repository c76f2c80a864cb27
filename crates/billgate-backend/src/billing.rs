//! Billing service client

use async_trait::async_trait;
use tonic::transport::Channel;
use tonic::Status;

use crate::grpc::{self, GrpcChannelConfig};
use crate::proto::{
    EmptyResponseWithStatus, GetCountriesListRequest, GetCountriesListResponse, GetCountryRequest,
    GetCountryResponse, GetProjectRequest, GetProjectResponse, ListPayoutsRequest,
    ListPayoutsResponse, OrderCreateRequest, OrderCreateResponse, ProcessWebhookRequest,
    SetTariffRatesRequest, UploadKeysRequest, UploadKeysResponse,
};
use crate::BackendError;

/// Name used for the billing service in logs
pub const SERVICE_NAME: &str = "billing";

/// Operations of the billing backend used by the gateway
///
/// `Err` means the RPC itself failed. Business failures come back as `Ok`
/// with a non-OK embedded status.
#[async_trait]
pub trait BillingService: Send + Sync {
    async fn get_countries_list(
        &self,
        request: GetCountriesListRequest,
    ) -> Result<GetCountriesListResponse, Status>;

    async fn get_country(&self, request: GetCountryRequest) -> Result<GetCountryResponse, Status>;

    async fn get_project(&self, request: GetProjectRequest) -> Result<GetProjectResponse, Status>;

    async fn process_webhook(
        &self,
        request: ProcessWebhookRequest,
    ) -> Result<EmptyResponseWithStatus, Status>;

    async fn order_create(
        &self,
        request: OrderCreateRequest,
    ) -> Result<OrderCreateResponse, Status>;

    async fn list_payouts(
        &self,
        request: ListPayoutsRequest,
    ) -> Result<ListPayoutsResponse, Status>;

    async fn upload_keys(&self, request: UploadKeysRequest) -> Result<UploadKeysResponse, Status>;

    async fn set_tariff_rates(
        &self,
        request: SetTariffRatesRequest,
    ) -> Result<EmptyResponseWithStatus, Status>;
}

/// tonic client for the billing service
#[derive(Clone)]
pub struct GrpcBillingClient {
    channel: Channel,
    gzip: bool,
}

impl GrpcBillingClient {
    /// Wrap an existing channel
    pub fn new(channel: Channel) -> Self {
        Self {
            channel,
            gzip: false,
        }
    }

    /// Build a lazily connected client from configuration
    pub fn from_config(config: &GrpcChannelConfig) -> Result<Self, BackendError> {
        Ok(Self {
            channel: config.connect_lazy()?,
            gzip: config.gzip,
        })
    }

    async fn unary<Req, Resp>(&self, path: &'static str, request: Req) -> Result<Resp, Status>
    where
        Req: prost::Message + Send + 'static,
        Resp: prost::Message + Default + Send + 'static,
    {
        grpc::unary(self.channel.clone(), path, request, self.gzip).await
    }
}

#[async_trait]
impl BillingService for GrpcBillingClient {
    async fn get_countries_list(
        &self,
        request: GetCountriesListRequest,
    ) -> Result<GetCountriesListResponse, Status> {
        self.unary("/billing.BillingService/GetCountriesList", request)
            .await
    }

    async fn get_country(&self, request: GetCountryRequest) -> Result<GetCountryResponse, Status> {
        self.unary("/billing.BillingService/GetCountry", request)
            .await
    }

    async fn get_project(&self, request: GetProjectRequest) -> Result<GetProjectResponse, Status> {
        self.unary("/billing.BillingService/GetProject", request)
            .await
    }

    async fn process_webhook(
        &self,
        request: ProcessWebhookRequest,
    ) -> Result<EmptyResponseWithStatus, Status> {
        self.unary("/billing.BillingService/ProcessWebhook", request)
            .await
    }

    async fn order_create(
        &self,
        request: OrderCreateRequest,
    ) -> Result<OrderCreateResponse, Status> {
        self.unary("/billing.BillingService/OrderCreateProcess", request)
            .await
    }

    async fn list_payouts(
        &self,
        request: ListPayoutsRequest,
    ) -> Result<ListPayoutsResponse, Status> {
        self.unary("/billing.BillingService/GetPayoutDocuments", request)
            .await
    }

    async fn upload_keys(&self, request: UploadKeysRequest) -> Result<UploadKeysResponse, Status> {
        self.unary("/billing.BillingService/UploadKeysFile", request)
            .await
    }

    async fn set_tariff_rates(
        &self,
        request: SetTariffRatesRequest,
    ) -> Result<EmptyResponseWithStatus, Status> {
        self.unary("/billing.BillingService/SetMerchantTariffRates", request)
            .await
    }
}
