//! Reporter service client

use async_trait::async_trait;
use tonic::transport::Channel;
use tonic::Status;

use crate::grpc::{self, GrpcChannelConfig};
use crate::proto::{CreateFileRequest, CreateFileResponse};
use crate::BackendError;

/// Name used for the reporter service in logs
pub const SERVICE_NAME: &str = "reporter";

/// Asynchronous report generation
#[async_trait]
pub trait ReporterService: Send + Sync {
    /// Queue a report file; the file id is returned before the file exists
    async fn create_file(&self, request: CreateFileRequest) -> Result<CreateFileResponse, Status>;
}

/// tonic client for the reporter service
#[derive(Clone)]
pub struct GrpcReporterClient {
    channel: Channel,
    gzip: bool,
}

impl GrpcReporterClient {
    pub fn new(channel: Channel) -> Self {
        Self {
            channel,
            gzip: false,
        }
    }

    pub fn from_config(config: &GrpcChannelConfig) -> Result<Self, BackendError> {
        Ok(Self {
            channel: config.connect_lazy()?,
            gzip: config.gzip,
        })
    }
}

#[async_trait]
impl ReporterService for GrpcReporterClient {
    async fn create_file(&self, request: CreateFileRequest) -> Result<CreateFileResponse, Status> {
        grpc::unary(
            self.channel.clone(),
            "/reporter.ReporterService/CreateFile",
            request,
            self.gzip,
        )
        .await
    }
}
