//! Request ids correlating network responses with update operations.

use std::fmt;
use uuid::Uuid;

/// Identifier of one update operation, echoed back as `correlationId`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Generate a new request ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn to_uuid(self) -> Uuid {
        self.0
    }

    /// Parse a correlation id from the wire.
    ///
    /// Returns `None` for anything that is not a UUID; such messages cannot
    /// belong to a request issued here.
    pub fn parse(correlation_id: &str) -> Option<Self> {
        Uuid::parse_str(correlation_id).ok().map(Self)
    }

    /// Short format (first 8 characters) for logging.
    pub fn short(&self) -> String {
        self.0.to_string()[..8].to_string()
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl serde::Serialize for RequestId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::ser::Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de> serde::Deserialize<'de> for RequestId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::de::Deserializer<'de>,
    {
        Ok(Self(Uuid::deserialize(deserializer)?))
    }
}
