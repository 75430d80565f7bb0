//! Propcache Shared - wire types for the network collaborator
//!
//! This crate contains the types exchanged with the layer that talks to the
//! personalization backend:
//! - Outbound fetch requests (`FetchRequest`)
//! - Inbound partial results and terminal signals (`EdgeMessage`)
//! - Proposition/offer payload DTOs and their conversion into domain types
//! - Error classification of terminal error signals
//!
//! # Design Principles
//!
//! 1. **Minimal dependencies** - Only serde, uuid, serde_json and tracing
//! 2. **No orchestration logic** - Pure data types and serialization
//! 3. **No domain IDs** - use raw `uuid::Uuid` / `String` on the wire

pub mod dto;
pub mod messages;
pub mod responses;

pub use dto::{OfferPayload, PropositionPayload};
pub use messages::{EdgeMessage, FetchRequest, RequestContext, TerminalSignal};
pub use responses::ErrorCode;
