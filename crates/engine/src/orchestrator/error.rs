//! Errors surfaced to update and get callers.

use propcache_shared::ErrorCode;

use crate::infrastructure::ports::NetworkError;

/// Outcome of a failed `update` or `get`
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// No valid scope, or the backend rejected the request (4xx)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// No terminal signal (or no release of a deferred get) within the deadline
    #[error("Request timed out")]
    Timeout,

    /// Transport hand-off failed (`status` is `None`) or a gateway error
    #[error("Network error{}: {title} {detail}", status_suffix(.status))]
    Network {
        status: Option<u16>,
        title: String,
        detail: String,
    },

    /// Backend failure (5xx other than gateway errors)
    #[error("Server error ({status}): {title} {detail}")]
    Server {
        status: u16,
        title: String,
        detail: String,
    },

    #[error("Unexpected error: {0}")]
    Unexpected(String),

    /// The request was dropped by `clear()` before it finished
    #[error("Request cancelled")]
    Cancelled,
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" ({})", s)).unwrap_or_default()
}

impl FetchError {
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Classify a terminal error signal.
    pub fn from_signal(status: u16, title: &str, detail: &str) -> Self {
        match ErrorCode::from_status(status) {
            ErrorCode::InvalidRequest => {
                Self::InvalidRequest(join_message(status, title, detail))
            }
            ErrorCode::Timeout => Self::Timeout,
            ErrorCode::NetworkError => Self::Network {
                status: Some(status),
                title: title.to_string(),
                detail: detail.to_string(),
            },
            ErrorCode::ServerError => Self::Server {
                status,
                title: title.to_string(),
                detail: detail.to_string(),
            },
            ErrorCode::Unexpected => Self::Unexpected(join_message(status, title, detail)),
        }
    }

    /// Wire-level classification code.
    ///
    /// `Cancelled` has no server-side counterpart and maps to `Unexpected`.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidRequest(_) => ErrorCode::InvalidRequest,
            Self::Timeout => ErrorCode::Timeout,
            Self::Network { .. } => ErrorCode::NetworkError,
            Self::Server { .. } => ErrorCode::ServerError,
            Self::Unexpected(_) | Self::Cancelled => ErrorCode::Unexpected,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }
}

fn join_message(status: u16, title: &str, detail: &str) -> String {
    match (title.is_empty(), detail.is_empty()) {
        (true, true) => format!("status {}", status),
        (false, true) => format!("{} (status {})", title, status),
        (true, false) => format!("{} (status {})", detail, status),
        (false, false) => format!("{}: {} (status {})", title, detail, status),
    }
}

impl From<NetworkError> for FetchError {
    fn from(err: NetworkError) -> Self {
        Self::Network {
            status: None,
            title: "Send failed".to_string(),
            detail: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_terminal_statuses() {
        assert_eq!(FetchError::from_signal(408, "", "").code(), ErrorCode::Timeout);
        assert!(FetchError::from_signal(408, "", "").is_timeout());
        assert_eq!(
            FetchError::from_signal(400, "Bad", "").code(),
            ErrorCode::InvalidRequest
        );
        assert_eq!(
            FetchError::from_signal(502, "Bad gateway", "").code(),
            ErrorCode::NetworkError
        );
        assert_eq!(
            FetchError::from_signal(504, "", "").code(),
            ErrorCode::NetworkError
        );
        assert_eq!(
            FetchError::from_signal(500, "Boom", "").code(),
            ErrorCode::ServerError
        );
        assert_eq!(
            FetchError::from_signal(302, "", "").code(),
            ErrorCode::Unexpected
        );
    }

    #[test]
    fn server_error_keeps_details() {
        let err = FetchError::from_signal(503, "Unavailable", "try later");
        assert_eq!(
            err,
            FetchError::Server {
                status: 503,
                title: "Unavailable".to_string(),
                detail: "try later".to_string(),
            }
        );
    }

    #[test]
    fn send_failure_is_a_network_error_without_status() {
        let err = FetchError::from(NetworkError::ChannelClosed);
        assert!(matches!(err, FetchError::Network { status: None, .. }));
        assert_eq!(err.code(), ErrorCode::NetworkError);
    }

    #[test]
    fn invalid_request_message_includes_status() {
        let err = FetchError::from_signal(404, "Not found", "no such scope");
        assert_eq!(
            err,
            FetchError::InvalidRequest("Not found: no such scope (status 404)".to_string())
        );
    }
}
