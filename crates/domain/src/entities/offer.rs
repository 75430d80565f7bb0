//! Offer entity - a single piece of personalized content inside a proposition

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Content type of an offer, derived from its MIME format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OfferType {
    Json,
    Text,
    Html,
    Image,
    /// Missing or unrecognized format
    Unknown,
}

impl OfferType {
    /// Classify a MIME format string.
    pub fn from_format(format: Option<&str>) -> Self {
        let Some(format) = format else {
            return Self::Unknown;
        };
        let format = format.trim().to_ascii_lowercase();
        match format.as_str() {
            "application/json" => Self::Json,
            "text/plain" => Self::Text,
            "text/html" => Self::Html,
            f if f.starts_with("image/") => Self::Image,
            _ => Self::Unknown,
        }
    }
}

/// A personalized offer returned for a decision scope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Offer {
    pub id: String,
    pub schema: String,
    /// MIME type of `content`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// String or JSON object, depending on `format`
    pub content: serde_json::Value,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub language: Vec<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub characteristics: HashMap<String, String>,
}

impl Offer {
    /// Create a new validated offer.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if:
    /// - `id` is empty
    /// - `schema` is empty
    /// - `content` is null
    pub fn new(
        id: impl Into<String>,
        schema: impl Into<String>,
        content: serde_json::Value,
    ) -> Result<Self, DomainError> {
        let id = id.into();
        let schema = schema.into();
        if id.is_empty() {
            return Err(DomainError::validation("Offer id cannot be empty"));
        }
        if schema.is_empty() {
            return Err(DomainError::validation(format!(
                "Offer {} schema cannot be empty",
                id
            )));
        }
        if content.is_null() {
            return Err(DomainError::validation(format!(
                "Offer {} content cannot be null",
                id
            )));
        }
        Ok(Self {
            id,
            schema,
            format: None,
            content,
            language: Vec::new(),
            characteristics: HashMap::new(),
        })
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn with_language(mut self, language: Vec<String>) -> Self {
        self.language = language;
        self
    }

    pub fn with_characteristics(mut self, characteristics: HashMap<String, String>) -> Self {
        self.characteristics = characteristics;
        self
    }

    /// Content type derived from `format`.
    pub fn offer_type(&self) -> OfferType {
        OfferType::from_format(self.format.as_deref())
    }

    /// Content as text, when the server sent a string.
    pub fn content_str(&self) -> Option<&str> {
        self.content.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn offer_type_from_format() {
        assert_eq!(OfferType::from_format(Some("application/json")), OfferType::Json);
        assert_eq!(OfferType::from_format(Some("text/plain")), OfferType::Text);
        assert_eq!(OfferType::from_format(Some("TEXT/HTML")), OfferType::Html);
        assert_eq!(OfferType::from_format(Some("image/png")), OfferType::Image);
        assert_eq!(OfferType::from_format(Some("video/mp4")), OfferType::Unknown);
        assert_eq!(OfferType::from_format(None), OfferType::Unknown);
    }

    #[test]
    fn new_rejects_missing_fields() {
        assert!(Offer::new("", "schema", json!("x")).is_err());
        assert!(Offer::new("id", "", json!("x")).is_err());
        assert!(Offer::new("id", "schema", serde_json::Value::Null).is_err());
    }

    #[test]
    fn builder_sets_optional_fields() {
        let offer = Offer::new("o1", "https://ns.adobe.com/experience/offer-management/content-component-text", json!("Hello"))
            .unwrap()
            .with_format("text/plain")
            .with_language(vec!["en-us".to_string()]);
        assert_eq!(offer.offer_type(), OfferType::Text);
        assert_eq!(offer.content_str(), Some("Hello"));
        assert_eq!(offer.language, vec!["en-us".to_string()]);
    }
}
