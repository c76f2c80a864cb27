//! Backend collaborators of the billing gateway
//!
//! This crate owns everything the gateway talks to on the way out:
//!
//! - **proto**: protobuf messages exchanged with the billing and reporter services
//! - **status**: the business status contract embedded in every response
//! - **billing** / **reporter**: service traits and their tonic clients
//! - **storage**: object storage access for generated files
//!
//! Handlers depend on the traits only, so tests can substitute in-process
//! fakes for the gRPC clients and the object store.

pub mod billing;
pub mod error;
pub mod grpc;
pub mod proto;
pub mod reporter;
pub mod status;
pub mod storage;

pub use billing::{BillingService, GrpcBillingClient};
pub use error::{BackendError, StorageError};
pub use grpc::GrpcChannelConfig;
pub use reporter::{GrpcReporterClient, ReporterService};
pub use status::{BusinessResponse, RESPONSE_STATUS_OK};
pub use storage::{HttpObjectStorage, ObjectStorage, StorageBucketConfig};

/// Transport-level failure of a backend call
pub use tonic::Status as TransportStatus;
