//! Decision scope - the key a proposition is fetched and cached under
//!
//! A scope is either:
//! - an opaque, non-empty name chosen by the caller, or
//! - a structured scope: the standard Base64 encoding of the canonical JSON
//!   object `{"activityId":"..","placementId":"..","itemCount":n}` (item count optional).
//!
//! The encoded form is byte-exact so names are interchangeable with other
//! clients of the same backend. Construction never fails; callers check
//! [`DecisionScope::is_valid`] before sending a scope anywhere.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::DomainError;

/// Decoded fields of a structured decision scope.
///
/// Field order matters: it is the serialization order of the canonical JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredScope {
    #[serde(default)]
    pub activity_id: String,
    #[serde(default)]
    pub placement_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_count: Option<u32>,
}

impl StructuredScope {
    /// Check the structured field rules.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if:
    /// - `activityId` is empty
    /// - `placementId` is empty
    /// - `itemCount` is present and zero
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.activity_id.is_empty() {
            return Err(DomainError::validation(
                "Decision scope activityId cannot be empty",
            ));
        }
        if self.placement_id.is_empty() {
            return Err(DomainError::validation(
                "Decision scope placementId cannot be empty",
            ));
        }
        if self.item_count == Some(0) {
            return Err(DomainError::validation(
                "Decision scope itemCount must be greater than zero",
            ));
        }
        Ok(())
    }

    /// Canonical Base64 name for these fields.
    fn encode(&self) -> String {
        let json = serde_json::to_vec(self).unwrap_or_default();
        STANDARD.encode(json)
    }
}

/// A decision scope name (opaque or Base64-encoded structured JSON).
///
/// Equality and hashing use the name string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct DecisionScope(String);

impl DecisionScope {
    /// Wrap a raw scope name. Any string is accepted; see [`Self::validate`].
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Build a structured scope from an activity and placement.
    ///
    /// Empty ids or an item count of zero still produce a scope, but one that
    /// fails validation and is therefore rejected by every operation.
    pub fn from_activity_and_placement(
        activity_id: impl Into<String>,
        placement_id: impl Into<String>,
        item_count: Option<u32>,
    ) -> Self {
        let fields = StructuredScope {
            activity_id: activity_id.into(),
            placement_id: placement_id.into(),
            item_count,
        };
        Self(fields.encode())
    }

    /// Returns the scope name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Decode the structured fields, if this name is a structured scope.
    ///
    /// Returns `None` for opaque names (including names that happen to be
    /// valid Base64 but do not decode to a JSON object with scope fields).
    /// Returns `Some(Err(..))` when the name is structured but its fields
    /// have the wrong types.
    pub fn structured(&self) -> Option<Result<StructuredScope, DomainError>> {
        let bytes = STANDARD.decode(self.0.as_bytes()).ok()?;
        let value: serde_json::Value = serde_json::from_slice(&bytes).ok()?;
        let object = value.as_object()?;
        if !object.contains_key("activityId") && !object.contains_key("placementId") {
            return None;
        }
        Some(
            serde_json::from_value::<StructuredScope>(value)
                .map_err(|e| DomainError::parse(format!("Malformed structured scope: {}", e))),
        )
    }

    /// Validate the scope.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the name is empty or if it is a
    /// structured scope whose fields break [`StructuredScope::validate`].
    /// A structured scope with mistyped fields is a `DomainError::Parse`.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.0.is_empty() {
            return Err(DomainError::validation("Decision scope name cannot be empty"));
        }
        match self.structured() {
            None => Ok(()),
            Some(fields) => fields?.validate(),
        }
    }

    /// Returns true if [`Self::validate`] succeeds.
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

impl fmt::Display for DecisionScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for DecisionScope {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for DecisionScope {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<DecisionScope> for String {
    fn from(scope: DecisionScope) -> String {
        scope.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opaque_names_are_valid() {
        assert!(DecisionScope::new("homepage-hero").is_valid());
        // Valid Base64 that is not JSON is still an opaque name
        assert!(DecisionScope::new("abcd").is_valid());
    }

    #[test]
    fn empty_name_is_invalid() {
        let err = DecisionScope::new("").validate().unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn structured_encoding_is_byte_exact() {
        let scope = DecisionScope::from_activity_and_placement("act", "plc", None);
        let decoded = STANDARD.decode(scope.as_str()).unwrap();
        assert_eq!(
            String::from_utf8(decoded).unwrap(),
            r#"{"activityId":"act","placementId":"plc"}"#
        );

        let scope = DecisionScope::from_activity_and_placement("act", "plc", Some(2));
        let decoded = STANDARD.decode(scope.as_str()).unwrap();
        assert_eq!(
            String::from_utf8(decoded).unwrap(),
            r#"{"activityId":"act","placementId":"plc","itemCount":2}"#
        );
    }

    #[test]
    fn structured_encoding_matches_known_name() {
        let scope = DecisionScope::from_activity_and_placement(
            "xcore:offer-activity:1111111111111111",
            "xcore:offer-placement:1111111111111111",
            None,
        );
        assert_eq!(
            scope.as_str(),
            "eyJhY3Rpdml0eUlkIjoieGNvcmU6b2ZmZXItYWN0aXZpdHk6MTExMTExMTExMTExMTExMSIsInBsYWNlbWVudElkIjoieGNvcmU6b2ZmZXItcGxhY2VtZW50OjExMTExMTExMTExMTExMTEifQ=="
        );
        assert!(scope.is_valid());
    }

    #[test]
    fn structured_with_empty_activity_is_invalid() {
        let scope = DecisionScope::from_activity_and_placement("", "plc", None);
        assert!(!scope.is_valid());
    }

    #[test]
    fn structured_with_empty_placement_is_invalid() {
        let scope = DecisionScope::from_activity_and_placement("act", "", Some(1));
        assert!(!scope.is_valid());
    }

    #[test]
    fn structured_with_zero_item_count_is_invalid() {
        let scope = DecisionScope::from_activity_and_placement("act", "plc", Some(0));
        assert!(!scope.is_valid());
    }

    #[test]
    fn structured_with_negative_item_count_is_parse_error() {
        let name = STANDARD.encode(r#"{"activityId":"a","placementId":"p","itemCount":-1}"#);
        let err = DecisionScope::new(name).validate().unwrap_err();
        assert!(!err.is_validation());
    }

    #[test]
    fn structured_roundtrips_fields() {
        let scope = DecisionScope::from_activity_and_placement("act", "plc", Some(3));
        let fields = scope.structured().unwrap().unwrap();
        assert_eq!(fields.activity_id, "act");
        assert_eq!(fields.placement_id, "plc");
        assert_eq!(fields.item_count, Some(3));
    }

    #[test]
    fn json_without_scope_fields_is_opaque() {
        let name = STANDARD.encode(r#"{"foo":"bar"}"#);
        let scope = DecisionScope::new(name);
        assert!(scope.structured().is_none());
        assert!(scope.is_valid());
    }

    #[test]
    fn serializes_as_bare_name() {
        let scope = DecisionScope::new("A");
        assert_eq!(serde_json::to_string(&scope).unwrap(), r#""A""#);
        let back: DecisionScope = serde_json::from_str(r#""A""#).unwrap();
        assert_eq!(back, scope);
    }
}
