//! Propcache Domain - decision scopes, propositions and offers.
//!
//! Pure types with their invariants. No async, no I/O.

pub mod entities;
pub mod error;
pub mod value_objects;

pub use entities::{
    InteractionKind, InteractionPayload, Offer, OfferRef, OfferType, Proposition, ScopeDetails,
};
pub use error::DomainError;
pub use value_objects::{DecisionScope, StructuredScope};

/// Propositions keyed by the scope they were fetched for.
pub type PropositionMap = std::collections::HashMap<DecisionScope, Proposition>;
