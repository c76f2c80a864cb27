//! Shared tonic plumbing for the backend clients

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tonic::codegen::http::uri::PathAndQuery;
use tonic::transport::{Channel, Endpoint};
use tonic::{Code, Status};
use tracing::debug;

use crate::error::BackendError;

/// Connection settings for one gRPC backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrpcChannelConfig {
    /// Endpoint URI, e.g. `http://billing:50051`
    pub endpoint: String,

    /// TCP connect timeout in seconds
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Enable gzip on the wire
    #[serde(default)]
    pub gzip: bool,
}

fn default_connect_timeout_secs() -> u64 {
    5
}

impl GrpcChannelConfig {
    /// Create a config for the given endpoint
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            connect_timeout_secs: default_connect_timeout_secs(),
            gzip: false,
        }
    }

    fn endpoint(&self) -> Result<Endpoint, BackendError> {
        let endpoint = Endpoint::from_shared(self.endpoint.clone()).map_err(|e| {
            BackendError::InvalidEndpoint {
                endpoint: self.endpoint.clone(),
                message: e.to_string(),
            }
        })?;

        // Per-call deadlines are enforced by the caller, not by the channel.
        Ok(endpoint.connect_timeout(Duration::from_secs(self.connect_timeout_secs)))
    }

    /// Connect eagerly, failing if the backend is unreachable
    pub async fn connect(&self) -> Result<Channel, BackendError> {
        debug!(endpoint = %self.endpoint, "Connecting to gRPC backend");
        Ok(self.endpoint()?.connect().await?)
    }

    /// Build a channel that connects on first use
    pub fn connect_lazy(&self) -> Result<Channel, BackendError> {
        Ok(self.endpoint()?.connect_lazy())
    }
}

/// Perform one unary call on `path` using the prost codec
pub(crate) async fn unary<Req, Resp>(
    channel: Channel,
    path: &'static str,
    request: Req,
    gzip: bool,
) -> Result<Resp, Status>
where
    Req: prost::Message + Send + 'static,
    Resp: prost::Message + Default + Send + 'static,
{
    let mut grpc = tonic::client::Grpc::new(channel);
    if gzip {
        grpc = grpc
            .send_compressed(tonic::codec::CompressionEncoding::Gzip)
            .accept_compressed(tonic::codec::CompressionEncoding::Gzip);
    }

    grpc.ready()
        .await
        .map_err(|e| Status::new(Code::Unknown, format!("Service was not ready: {}", e)))?;

    let codec = tonic::codec::ProstCodec::default();
    let path = PathAndQuery::from_static(path);

    grpc.unary(tonic::Request::new(request), path, codec)
        .await
        .map(tonic::Response::into_inner)
}
