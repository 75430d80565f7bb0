//! Proposition interaction payloads
//!
//! Display and tap reports reference a proposition by id, scope and scope
//! details, plus the ids of the offers involved. Sending the payload is the
//! transport's job; this module only shapes it.

use serde::{Deserialize, Serialize};

use super::offer::Offer;
use super::proposition::{Proposition, ScopeDetails};

/// Kind of interaction being reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InteractionKind {
    Display,
    Tap,
}

impl InteractionKind {
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Display => "decisioning.propositionDisplay",
            Self::Tap => "decisioning.propositionInteract",
        }
    }
}

/// Interaction report for one or more propositions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionPayload {
    pub event_type: String,
    #[serde(rename = "_experience")]
    pub experience: ExperienceData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperienceData {
    pub decisioning: DecisioningData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisioningData {
    pub propositions: Vec<PropositionReference>,
}

/// Reference to a proposition inside an interaction report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropositionReference {
    pub id: String,
    pub scope: String,
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub scope_details: ScopeDetails,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<ItemReference>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemReference {
    pub id: String,
}

impl InteractionPayload {
    /// Report `kind` for the given offers of a single proposition.
    pub fn for_proposition<'a>(
        kind: InteractionKind,
        proposition: &Proposition,
        offers: impl IntoIterator<Item = &'a Offer>,
    ) -> Self {
        let items = offers
            .into_iter()
            .map(|offer| ItemReference {
                id: offer.id.clone(),
            })
            .collect();

        Self {
            event_type: kind.event_type().to_string(),
            experience: ExperienceData {
                decisioning: DecisioningData {
                    propositions: vec![PropositionReference {
                        id: proposition.id().to_string(),
                        scope: proposition.scope().to_string(),
                        scope_details: proposition.scope_details().clone(),
                        items,
                    }],
                },
            },
        }
    }
}
