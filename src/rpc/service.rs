//! Content Service Handler
//!
//! Thin delegation layer: the RPC handler owns no logic beyond invoking the
//! cache-aside core and converting between domain and wire types.

use std::sync::Arc;

use tonic::{Request, Response, Status};
use tracing::instrument;

use super::proto::content_server::Content;
use super::proto::{GetTopDestinationsRequest, GetTopDestinationsResponse, TopDestination};
use crate::cache::TopDestinationsCache;
use crate::domain::Destination;
use crate::metrics;

impl From<Destination> for TopDestination {
    fn from(dest: Destination) -> Self {
        Self {
            country: dest.country,
            description: dest.description,
            best_time_to_visit: dest.best_time_to_visit,
            popularity_score: dest.popularity_score,
        }
    }
}

/// gRPC handler for the Content service.
pub struct ContentService {
    cache: Arc<TopDestinationsCache>,
}

impl ContentService {
    /// Create a handler over the shared cache.
    pub fn new(cache: Arc<TopDestinationsCache>) -> Self {
        Self { cache }
    }
}

#[tonic::async_trait]
impl Content for ContentService {
    #[instrument(skip(self, _request))]
    async fn get_top_destinations(
        &self,
        _request: Request<GetTopDestinationsRequest>,
    ) -> Result<Response<GetTopDestinationsResponse>, Status> {
        metrics::RPC_REQUESTS.inc();

        let snapshot = self.cache.get().await?;
        Ok(Response::new(GetTopDestinationsResponse {
            destinations: snapshot
                .destinations
                .into_iter()
                .map(TopDestination::from)
                .collect(),
        }))
    }
}
