//! Propcache Engine library.
//!
//! Fetches personalization propositions through a network collaborator,
//! caches them per decision scope and orders reads behind overlapping writes.
//!
//! ## Structure
//!
//! - `orchestrator/` - Update/get operations, in-flight tracking, ordering queue
//! - `infrastructure/` - Network port and channel adapter, cache, config, logging

pub mod infrastructure;
pub mod orchestrator;

pub use infrastructure::bridge::{create_connection, spawn_inbound_pump, ChannelNetwork, Connection};
pub use infrastructure::config::OrchestratorConfig;
pub use infrastructure::correlation::RequestId;
pub use infrastructure::ports::{NetworkError, NetworkPort};
pub use infrastructure::telemetry::init_tracing;
pub use orchestrator::{FetchError, PropositionOrchestrator};
