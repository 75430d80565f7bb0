//! External service port traits (network collaborator).

use async_trait::async_trait;
use propcache_shared::FetchRequest;

use super::error::NetworkError;

/// Outbound side of the network collaborator.
///
/// Fire-and-forget: a successful return only means the request was handed
/// off. Partial results and the terminal signal arrive out of band through
/// `PropositionOrchestrator::handle_message`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NetworkPort: Send + Sync {
    async fn send_fetch_request(&self, request: FetchRequest) -> Result<(), NetworkError>;
}
