//! In-process stand-ins for the backend services and object storage
//!
//! Every fake records what it was asked so tests can assert that a request
//! was (or was not) forwarded, and with which fields.

use async_trait::async_trait;
use billgate_backend::proto::*;
use billgate_backend::{
    BillingService, ObjectStorage, ReporterService, StorageError, TransportStatus,
    RESPONSE_STATUS_OK,
};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

pub const PROJECT_ID: &str = "5be2e16701d96d00012d26c3";
pub const PROJECT_MERCHANT_ID: &str = "5be2e16701d96d00012d26c4";
pub const PROJECT_SECRET: &str = "project-secret-key";

pub const FILE_ID: &str = "5f1a0b2c3d4e5f6a7b8c9d0e";

/// Object key whose fetch writes part of the file and then fails
pub const BROKEN_OBJECT: &str = "broken.pdf";

/// What the fakes answer with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Ok,
    Business(i32),
    Transport,
}

pub fn business_message() -> ResponseErrorMessage {
    ResponseErrorMessage {
        code: "bl000001".to_string(),
        message: "merchant not found".to_string(),
        details: String::new(),
    }
}

pub fn countries() -> Vec<Country> {
    vec![
        Country {
            iso_code_a2: "DE".to_string(),
            name: "Germany".to_string(),
            currency: "EUR".to_string(),
            region: "EU".to_string(),
            vat_enabled: true,
        },
        Country {
            iso_code_a2: "FR".to_string(),
            name: "France".to_string(),
            currency: "EUR".to_string(),
            region: "EU".to_string(),
            vat_enabled: true,
        },
    ]
}

pub fn payout_page() -> PayoutDocumentsPaginate {
    PayoutDocumentsPaginate {
        count: 1,
        items: vec![PayoutDocument {
            id: "5be2e16701d96d00012d26d0".to_string(),
            merchant_id: "5be2e16701d96d00012d26c5".to_string(),
            amount: 1250.5,
            currency: "EUR".to_string(),
            status: "paid".to_string(),
            created_at: "2026-09-01T00:00:00Z".to_string(),
        }],
    }
}

/// Resolve `outcome` into the envelope fields of a response
fn envelope(outcome: Outcome) -> Result<(i32, Option<ResponseErrorMessage>), TransportStatus> {
    match outcome {
        Outcome::Ok => Ok((RESPONSE_STATUS_OK, None)),
        Outcome::Business(status) => Ok((status, Some(business_message()))),
        Outcome::Transport => Err(TransportStatus::unavailable(
            "connection refused: billing.internal:50051",
        )),
    }
}

/// Billing backend fake
pub struct FakeBilling {
    outcome: Mutex<Outcome>,
    calls: Mutex<Vec<&'static str>>,
    pub country_lists: Mutex<Vec<GetCountriesListRequest>>,
    pub orders: Mutex<Vec<OrderCreateRequest>>,
    pub payouts: Mutex<Vec<ListPayoutsRequest>>,
    pub webhooks: Mutex<Vec<ProcessWebhookRequest>>,
    pub key_uploads: Mutex<Vec<UploadKeysRequest>>,
    pub tariffs: Mutex<Vec<SetTariffRatesRequest>>,
}

impl FakeBilling {
    pub fn new() -> Self {
        Self {
            outcome: Mutex::new(Outcome::Ok),
            calls: Mutex::new(Vec::new()),
            country_lists: Mutex::new(Vec::new()),
            orders: Mutex::new(Vec::new()),
            payouts: Mutex::new(Vec::new()),
            webhooks: Mutex::new(Vec::new()),
            key_uploads: Mutex::new(Vec::new()),
            tariffs: Mutex::new(Vec::new()),
        }
    }

    /// Outcome of every following call except project lookups
    pub fn set_outcome(&self, outcome: Outcome) {
        *self.outcome.lock().unwrap() = outcome;
    }

    /// Methods invoked so far, project lookups included
    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    /// Methods invoked so far, project lookups excluded
    pub fn handler_calls(&self) -> Vec<&'static str> {
        self.calls()
            .into_iter()
            .filter(|m| *m != "GetProject")
            .collect()
    }

    fn record(
        &self,
        method: &'static str,
    ) -> Result<(i32, Option<ResponseErrorMessage>), TransportStatus> {
        self.calls.lock().unwrap().push(method);
        envelope(*self.outcome.lock().unwrap())
    }
}

#[async_trait]
impl BillingService for FakeBilling {
    async fn get_countries_list(
        &self,
        request: GetCountriesListRequest,
    ) -> Result<GetCountriesListResponse, TransportStatus> {
        self.country_lists.lock().unwrap().push(request);
        let (status, message) = self.record("GetCountriesList")?;
        Ok(GetCountriesListResponse {
            status,
            message,
            items: countries(),
        })
    }

    async fn get_country(
        &self,
        request: GetCountryRequest,
    ) -> Result<GetCountryResponse, TransportStatus> {
        let (status, message) = self.record("GetCountry")?;
        Ok(GetCountryResponse {
            status,
            message,
            item: countries()
                .into_iter()
                .find(|c| c.iso_code_a2 == request.iso_code),
        })
    }

    async fn get_project(
        &self,
        request: GetProjectRequest,
    ) -> Result<GetProjectResponse, TransportStatus> {
        self.calls.lock().unwrap().push("GetProject");

        if request.project_id != PROJECT_ID {
            return Ok(GetProjectResponse {
                status: 404,
                message: Some(ResponseErrorMessage {
                    code: "pr000001".to_string(),
                    message: "project not found".to_string(),
                    details: String::new(),
                }),
                item: None,
            });
        }

        Ok(GetProjectResponse {
            status: RESPONSE_STATUS_OK,
            message: None,
            item: Some(Project {
                id: PROJECT_ID.to_string(),
                merchant_id: PROJECT_MERCHANT_ID.to_string(),
                name: "Game store".to_string(),
                secret_key: PROJECT_SECRET.to_string(),
            }),
        })
    }

    async fn process_webhook(
        &self,
        request: ProcessWebhookRequest,
    ) -> Result<EmptyResponseWithStatus, TransportStatus> {
        self.webhooks.lock().unwrap().push(request);
        let (status, message) = self.record("ProcessWebhook")?;
        Ok(EmptyResponseWithStatus { status, message })
    }

    async fn order_create(
        &self,
        request: OrderCreateRequest,
    ) -> Result<OrderCreateResponse, TransportStatus> {
        let item = Order {
            id: "order-7".to_string(),
            project_id: request.project_id.clone(),
            amount: request.amount,
            currency: request.currency.clone(),
            status: "created".to_string(),
        };
        self.orders.lock().unwrap().push(request);
        let (status, message) = self.record("OrderCreateProcess")?;
        Ok(OrderCreateResponse {
            status,
            message,
            item: Some(item),
        })
    }

    async fn list_payouts(
        &self,
        request: ListPayoutsRequest,
    ) -> Result<ListPayoutsResponse, TransportStatus> {
        self.payouts.lock().unwrap().push(request);
        let (status, message) = self.record("GetPayoutDocuments")?;
        Ok(ListPayoutsResponse {
            status,
            message,
            item: Some(payout_page()),
        })
    }

    async fn upload_keys(
        &self,
        request: UploadKeysRequest,
    ) -> Result<UploadKeysResponse, TransportStatus> {
        let key_count = request.keys.len() as i32;
        self.key_uploads.lock().unwrap().push(request);
        let (status, message) = self.record("UploadKeysFile")?;
        Ok(UploadKeysResponse {
            status,
            message,
            key_count,
        })
    }

    async fn set_tariff_rates(
        &self,
        request: SetTariffRatesRequest,
    ) -> Result<EmptyResponseWithStatus, TransportStatus> {
        self.tariffs.lock().unwrap().push(request);
        let (status, message) = self.record("SetMerchantTariffRates")?;
        Ok(EmptyResponseWithStatus { status, message })
    }
}

/// Reporter backend fake
pub struct FakeReporter {
    outcome: Mutex<Outcome>,
    pub requests: Mutex<Vec<CreateFileRequest>>,
}

impl FakeReporter {
    pub fn new() -> Self {
        Self {
            outcome: Mutex::new(Outcome::Ok),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn set_outcome(&self, outcome: Outcome) {
        *self.outcome.lock().unwrap() = outcome;
    }

    pub fn last_request(&self) -> Option<CreateFileRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl ReporterService for FakeReporter {
    async fn create_file(
        &self,
        request: CreateFileRequest,
    ) -> Result<CreateFileResponse, TransportStatus> {
        self.requests.lock().unwrap().push(request);
        let (status, message) = envelope(*self.outcome.lock().unwrap())?;
        Ok(CreateFileResponse {
            status,
            message,
            file_id: FILE_ID.to_string(),
        })
    }
}

/// Object storage fake holding objects in memory
pub struct FakeStorage {
    objects: HashMap<String, Vec<u8>>,
    pub fetched: Mutex<Vec<String>>,
}

impl FakeStorage {
    pub fn new() -> Self {
        Self {
            objects: HashMap::new(),
            fetched: Mutex::new(Vec::new()),
        }
    }

    pub fn with_object(mut self, key: &str, content: &[u8]) -> Self {
        self.objects.insert(key.to_string(), content.to_vec());
        self
    }

    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObjectStorage for FakeStorage {
    async fn fetch_to_file(&self, key: &str, dest: &Path) -> Result<u64, StorageError> {
        self.fetched.lock().unwrap().push(key.to_string());

        if key.ends_with(BROKEN_OBJECT) {
            tokio::fs::write(dest, b"%PDF-1.4 trunc").await?;
            return Err(StorageError::UnexpectedStatus {
                status: 502,
                key: key.to_string(),
            });
        }

        let content = self
            .objects
            .get(key)
            .ok_or_else(|| StorageError::UnexpectedStatus {
                status: 404,
                key: key.to_string(),
            })?;

        tokio::fs::write(dest, content).await?;
        Ok(content.len() as u64)
    }
}
