//! Error types for port operations.

/// Failures handing a request to the network collaborator.
///
/// These only cover the hand-off; failures reported by the backend arrive
/// later as terminal error signals.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NetworkError {
    /// The collaborator is gone (its receiving side was dropped).
    #[error("Network channel closed")]
    ChannelClosed,
}
