//! Proposition and offer payloads as they arrive in partial-result messages
//!
//! Payloads are decoded leniently: missing fields default, and a list element
//! that does not decode (a mistyped offer or proposition) is dropped on its
//! own instead of failing the whole message. Conversion into domain types then
//! applies the offer rules and drops what does not pass.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

use propcache_domain::{DomainError, Offer, Proposition, ScopeDetails};

/// Wire shape of a proposition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropositionPayload {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub scope: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope_details: Option<ScopeDetails>,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub offers: Vec<OfferPayload>,
}

/// Wire shape of an offer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferPayload {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub schema: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default)]
    pub content: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub characteristics: Option<HashMap<String, String>>,
}

/// Decode a JSON array element by element, dropping elements that fail.
pub(crate) fn lenient_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let values = Vec::<serde_json::Value>::deserialize(deserializer)?;
    Ok(values
        .into_iter()
        .filter_map(|value| match serde_json::from_value::<T>(value) {
            Ok(item) => Some(item),
            Err(e) => {
                tracing::debug!(error = %e, "Dropping malformed payload element");
                None
            }
        })
        .collect())
}

impl OfferPayload {
    /// Convert into a domain offer.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the offer is missing its id,
    /// schema or content.
    pub fn into_domain(self) -> Result<Offer, DomainError> {
        let mut offer = Offer::new(self.id, self.schema, self.content)?;
        if let Some(format) = self.format {
            offer = offer.with_format(format);
        }
        if let Some(language) = self.language {
            offer = offer.with_language(language);
        }
        if let Some(characteristics) = self.characteristics {
            offer = offer.with_characteristics(characteristics);
        }
        Ok(offer)
    }
}

impl PropositionPayload {
    /// Convert into a domain proposition, keeping only valid offers.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the proposition has no id or
    /// scope, or if none of its offers are valid. A proposition without
    /// offers is treated as absent by the cache.
    pub fn into_domain(self) -> Result<Proposition, DomainError> {
        if self.id.is_empty() {
            return Err(DomainError::validation("Proposition id cannot be empty"));
        }
        if self.scope.is_empty() {
            return Err(DomainError::validation(format!(
                "Proposition {} scope cannot be empty",
                self.id
            )));
        }

        let offers: Vec<Offer> = self
            .offers
            .into_iter()
            .filter_map(|payload| match payload.into_domain() {
                Ok(offer) => Some(offer),
                Err(e) => {
                    tracing::debug!(proposition_id = %self.id, error = %e, "Dropping invalid offer");
                    None
                }
            })
            .collect();

        if offers.is_empty() {
            return Err(DomainError::validation(format!(
                "Proposition {} has no valid offers",
                self.id
            )));
        }

        let proposition = Proposition::new(self.id, self.scope, offers);
        Ok(match self.scope_details {
            Some(details) => proposition.with_scope_details(details),
            None => proposition,
        })
    }
}
