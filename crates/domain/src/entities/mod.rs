//! Domain entities - Fetched content and the reports derived from it

mod interaction;
mod offer;
mod proposition;

pub use interaction::{
    DecisioningData, ExperienceData, InteractionKind, InteractionPayload, ItemReference,
    PropositionReference,
};
pub use offer::{Offer, OfferType};
pub use proposition::{OfferRef, Proposition, ScopeDetails};
