//! Error classification for terminal error signals
//!
//! The network layer reports failures as an HTTP-like status plus a title
//! and detail. Callers only ever see the coarse [`ErrorCode`].

use serde::{Deserialize, Serialize};

// =============================================================================
// Error Codes
// =============================================================================

/// Error classification codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Empty or all-invalid scope set, or a 4xx rejection
    InvalidRequest,
    /// No terminal signal within the deadline, or a 408
    Timeout,
    /// Gateway failures (502, 504) and transport send failures
    NetworkError,
    /// Any other 5xx
    ServerError,
    /// Everything that fits nowhere else
    #[serde(other)]
    Unexpected,
}

impl ErrorCode {
    /// Classify a status code from a terminal error signal.
    ///
    /// | Status            | Code             |
    /// |-------------------|------------------|
    /// | 408               | `Timeout`        |
    /// | other 4xx         | `InvalidRequest` |
    /// | 502, 504          | `NetworkError`   |
    /// | other 5xx         | `ServerError`    |
    /// | anything else     | `Unexpected`     |
    pub fn from_status(status: u16) -> Self {
        match status {
            408 => Self::Timeout,
            400..=499 => Self::InvalidRequest,
            502 | 504 => Self::NetworkError,
            500..=599 => Self::ServerError,
            _ => Self::Unexpected,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidRequest => "invalid_request",
            Self::Timeout => "timeout",
            Self::NetworkError => "network_error",
            Self::ServerError => "server_error",
            Self::Unexpected => "unexpected",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
