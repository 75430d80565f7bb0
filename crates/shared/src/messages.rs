//! Messages exchanged with the network collaborator
//!
//! Outbound: one [`FetchRequest`] per update. Inbound: zero or more partial
//! results followed by exactly one terminal signal, all carrying the
//! request id as `correlationId`.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dto::PropositionPayload;

// =============================================================================
// Outbound
// =============================================================================

/// Caller-supplied context forwarded with a fetch request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestContext {
    /// Experience data (structured event fields)
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub xdm: serde_json::Map<String, serde_json::Value>,
    /// Free-form data
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub data: serde_json::Map<String, serde_json::Value>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_xdm(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.xdm.insert(key.into(), value);
        self
    }

    pub fn with_data(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.data.insert(key.into(), value);
        self
    }
}

/// Request to fetch propositions for a set of scopes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchRequest {
    pub request_id: Uuid,
    pub decision_scopes: Vec<String>,
    #[serde(flatten)]
    pub context: RequestContext,
    /// Ask the network layer for an explicit completion signal
    pub send_completion: bool,
}

// =============================================================================
// Inbound
// =============================================================================

/// Terminal signal ending a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TerminalSignal {
    Completion,
    Error {
        status: u16,
        #[serde(default)]
        title: String,
        #[serde(default)]
        detail: String,
    },
}

/// Message delivered by the network collaborator
///
/// Terminal signals are matched first: a partial result never carries `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EdgeMessage {
    Terminal {
        #[serde(rename = "correlationId")]
        correlation_id: String,
        #[serde(flatten)]
        signal: TerminalSignal,
    },
    Propositions {
        #[serde(rename = "correlationId")]
        correlation_id: String,
        #[serde(deserialize_with = "crate::dto::lenient_vec")]
        propositions: Vec<PropositionPayload>,
    },
}

impl EdgeMessage {
    pub fn propositions(
        correlation_id: impl Into<String>,
        propositions: Vec<PropositionPayload>,
    ) -> Self {
        Self::Propositions {
            correlation_id: correlation_id.into(),
            propositions,
        }
    }

    pub fn completion(correlation_id: impl Into<String>) -> Self {
        Self::Terminal {
            correlation_id: correlation_id.into(),
            signal: TerminalSignal::Completion,
        }
    }

    pub fn error(
        correlation_id: impl Into<String>,
        status: u16,
        title: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self::Terminal {
            correlation_id: correlation_id.into(),
            signal: TerminalSignal::Error {
                status,
                title: title.into(),
                detail: detail.into(),
            },
        }
    }

    /// The request id this message answers, as sent on the wire.
    pub fn correlation_id(&self) -> &str {
        match self {
            Self::Terminal { correlation_id, .. } | Self::Propositions { correlation_id, .. } => {
                correlation_id
            }
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Terminal { .. })
    }
}
