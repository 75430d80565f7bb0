//! Infrastructure implementations.
//!
//! Contains the network port, its channel-backed adapter and the supporting
//! pieces (cache, correlation ids, configuration, logging).

pub mod bridge;
pub mod cache;
pub mod config;
pub mod correlation;
pub mod ports;
pub mod telemetry;
