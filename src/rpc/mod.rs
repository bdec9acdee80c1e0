//! RPC Surface
//!
//! One unary call: `GetTopDestinations`, no input message, ordered list out.
//! The handler delegates to [`TopDestinationsCache`] and maps domain errors
//! to gRPC status codes. The caller sees either a populated (possibly empty)
//! list or an error, never partial data.
//!
//! [`TopDestinationsCache`]: crate::cache::TopDestinationsCache

use std::net::SocketAddr;

use tonic::transport::Server;
use tracing::info;

use crate::error::{Error, Result};

mod service;

pub use service::ContentService;

// Generated Protobuf code
pub mod proto {
    tonic::include_proto!("wayfarer.content.v1");
}

use proto::content_server::ContentServer;

impl From<Error> for tonic::Status {
    fn from(err: Error) -> Self {
        match err {
            // Collaborator outages are retryable from the client's side
            Error::SourceUnavailable(_)
            | Error::CacheReadFailed { .. }
            | Error::CacheWriteFailed { .. } => tonic::Status::unavailable(err.to_string()),
            // Corrupt data is surfaced, never masked
            Error::CacheCorrupt { .. } => tonic::Status::internal(err.to_string()),
            _ => tonic::Status::internal(err.to_string()),
        }
    }
}

/// Serve the Content service on the given address until shutdown.
pub async fn serve(addr: SocketAddr, service: ContentService) -> Result<()> {
    info!("gRPC server listening on {}", addr);

    Server::builder()
        .add_service(ContentServer::new(service))
        .serve(addr)
        .await
        .map_err(|e| Error::Internal(format!("gRPC server error: {}", e)))
}
