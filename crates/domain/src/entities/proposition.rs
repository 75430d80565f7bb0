//! Proposition entity - the fetched result for one decision scope
//!
//! A proposition owns its offers. Offers never point back at their
//! proposition; callers that need the parent (interaction reporting) go
//! through [`OfferRef`], a borrowed view pairing the proposition with an
//! offer index.

use serde::{Deserialize, Serialize};

use super::interaction::{InteractionKind, InteractionPayload};
use super::offer::Offer;
use crate::value_objects::DecisionScope;

/// Opaque scope metadata returned by the server
pub type ScopeDetails = serde_json::Map<String, serde_json::Value>;

/// Personalized content fetched for a single decision scope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proposition {
    id: String,
    scope: String,
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    scope_details: ScopeDetails,
    #[serde(default)]
    offers: Vec<Offer>,
}

impl Proposition {
    pub fn new(id: impl Into<String>, scope: impl Into<String>, offers: Vec<Offer>) -> Self {
        Self {
            id: id.into(),
            scope: scope.into(),
            scope_details: ScopeDetails::new(),
            offers,
        }
    }

    pub fn with_scope_details(mut self, scope_details: ScopeDetails) -> Self {
        self.scope_details = scope_details;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// The scope name as sent by the server.
    pub fn scope(&self) -> &str {
        &self.scope
    }

    pub fn decision_scope(&self) -> DecisionScope {
        DecisionScope::new(self.scope.clone())
    }

    pub fn scope_details(&self) -> &ScopeDetails {
        &self.scope_details
    }

    pub fn offers(&self) -> &[Offer] {
        &self.offers
    }

    /// A proposition without offers is treated as absent and never cached.
    pub fn has_offers(&self) -> bool {
        !self.offers.is_empty()
    }

    /// Borrowed view of the offer at `index`, linked to this proposition.
    pub fn offer_ref(&self, index: usize) -> Option<OfferRef<'_>> {
        (index < self.offers.len()).then_some(OfferRef {
            proposition: self,
            index,
        })
    }

    /// Borrowed views of all offers, in server order.
    pub fn offer_refs(&self) -> impl Iterator<Item = OfferRef<'_>> {
        (0..self.offers.len()).map(move |index| OfferRef {
            proposition: self,
            index,
        })
    }

    /// Interaction payload covering the given offers of this proposition.
    pub fn interaction<'a>(
        &self,
        kind: InteractionKind,
        offers: impl IntoIterator<Item = &'a Offer>,
    ) -> InteractionPayload {
        InteractionPayload::for_proposition(kind, self, offers)
    }
}

/// An offer together with the proposition that owns it.
#[derive(Debug, Clone, Copy)]
pub struct OfferRef<'a> {
    proposition: &'a Proposition,
    index: usize,
}

impl<'a> OfferRef<'a> {
    pub fn offer(&self) -> &'a Offer {
        &self.proposition.offers[self.index]
    }

    pub fn proposition(&self) -> &'a Proposition {
        self.proposition
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Payload reporting that this offer was displayed.
    pub fn display_interaction(&self) -> InteractionPayload {
        self.proposition
            .interaction(InteractionKind::Display, [self.offer()])
    }

    /// Payload reporting that this offer was clicked.
    pub fn tap_interaction(&self) -> InteractionPayload {
        self.proposition
            .interaction(InteractionKind::Tap, [self.offer()])
    }
}
