//! Port traits for infrastructure boundaries.
//!
//! The network collaborator is the only abstraction in the engine. Everything
//! else is concrete types.

mod error;
mod external;

pub use error::NetworkError;
pub use external::NetworkPort;

#[cfg(test)]
pub use external::MockNetworkPort;
