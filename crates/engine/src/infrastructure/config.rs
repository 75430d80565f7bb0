//! Orchestrator configuration.
//!
//! Defaults suit interactive clients; every value can be overridden through
//! environment variables (optionally from `.env.local` / `.env` at the repo
//! root) or the builder-style setters.

use std::time::Duration;

use anyhow::Context;

/// Environment variable names
pub const ENV_UPDATE_TIMEOUT_MS: &str = "PROPCACHE_UPDATE_TIMEOUT_MS";
pub const ENV_GET_TIMEOUT_MS: &str = "PROPCACHE_GET_TIMEOUT_MS";
pub const ENV_CHANNEL_CAPACITY: &str = "PROPCACHE_CHANNEL_CAPACITY";
pub const ENV_LOG: &str = "PROPCACHE_LOG";

/// Configuration for the proposition orchestrator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorConfig {
    /// Deadline for an update's terminal signal when the caller gives none
    pub update_timeout: Duration,
    /// Deadline for a deferred get when the caller gives none
    pub get_timeout: Duration,
    /// Capacity of the outbound/inbound channels built by `create_connection`
    pub channel_capacity: usize,
    /// Fallback `tracing` filter when `RUST_LOG` is unset
    pub log_filter: String,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            update_timeout: Duration::from_secs(10),
            get_timeout: Duration::from_secs(10),
            channel_capacity: 32,
            log_filter: "propcache_engine=info".to_string(),
        }
    }
}

impl OrchestratorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_update_timeout(mut self, timeout: Duration) -> Self {
        self.update_timeout = timeout;
        self
    }

    pub fn with_get_timeout(mut self, timeout: Duration) -> Self {
        self.get_timeout = timeout;
        self
    }

    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }

    pub fn with_log_filter(mut self, filter: impl Into<String>) -> Self {
        self.log_filter = filter.into();
        self
    }

    /// Load configuration from the process environment.
    ///
    /// Reads `.env.local` then `.env` from the repository root when present.
    /// Unset variables keep their defaults.
    ///
    /// # Errors
    ///
    /// Fails if a variable is set but is not a valid number, or if the
    /// channel capacity is zero.
    pub fn from_env() -> anyhow::Result<Self> {
        load_dotenv_from_repo_root();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let defaults = Self::default();

        let update_timeout = match lookup(ENV_UPDATE_TIMEOUT_MS) {
            Some(raw) => Duration::from_millis(parse_number(ENV_UPDATE_TIMEOUT_MS, &raw)?),
            None => defaults.update_timeout,
        };
        let get_timeout = match lookup(ENV_GET_TIMEOUT_MS) {
            Some(raw) => Duration::from_millis(parse_number(ENV_GET_TIMEOUT_MS, &raw)?),
            None => defaults.get_timeout,
        };
        let channel_capacity = match lookup(ENV_CHANNEL_CAPACITY) {
            Some(raw) => usize::try_from(parse_number(ENV_CHANNEL_CAPACITY, &raw)?)
                .with_context(|| format!("{} is too large", ENV_CHANNEL_CAPACITY))?,
            None => defaults.channel_capacity,
        };
        if channel_capacity == 0 {
            anyhow::bail!("{} must be greater than zero", ENV_CHANNEL_CAPACITY);
        }
        let log_filter = lookup(ENV_LOG)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or(defaults.log_filter);

        Ok(Self {
            update_timeout,
            get_timeout,
            channel_capacity,
            log_filter,
        })
    }
}

fn parse_number(name: &str, raw: &str) -> anyhow::Result<u64> {
    raw.trim()
        .parse::<u64>()
        .with_context(|| format!("{} must be a non-negative integer, got {:?}", name, raw))
}

fn load_dotenv_from_repo_root() {
    let repo_root = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..");

    // Prefer local overrides.
    for filename in [".env.local", ".env"] {
        let path = repo_root.join(filename);
        if path.exists() {
            let _ = dotenvy::from_path(path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn unset_variables_keep_defaults() {
        let config = OrchestratorConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, OrchestratorConfig::default());
    }

    #[test]
    fn reads_all_variables() {
        let config = OrchestratorConfig::from_lookup(lookup(&[
            (ENV_UPDATE_TIMEOUT_MS, "2500"),
            (ENV_GET_TIMEOUT_MS, " 750 "),
            (ENV_CHANNEL_CAPACITY, "8"),
            (ENV_LOG, "propcache_engine=debug"),
        ]))
        .unwrap();

        assert_eq!(config.update_timeout, Duration::from_millis(2500));
        assert_eq!(config.get_timeout, Duration::from_millis(750));
        assert_eq!(config.channel_capacity, 8);
        assert_eq!(config.log_filter, "propcache_engine=debug");
    }

    #[test]
    fn malformed_number_names_the_variable() {
        let err = OrchestratorConfig::from_lookup(lookup(&[(ENV_GET_TIMEOUT_MS, "soon")]))
            .unwrap_err();
        assert!(err.to_string().contains(ENV_GET_TIMEOUT_MS));
    }

    #[test]
    fn zero_capacity_is_rejected() {
        assert!(OrchestratorConfig::from_lookup(lookup(&[(ENV_CHANNEL_CAPACITY, "0")])).is_err());
    }

    #[test]
    fn builder_overrides_defaults() {
        let config = OrchestratorConfig::new()
            .with_update_timeout(Duration::from_millis(100))
            .with_get_timeout(Duration::from_millis(50))
            .with_channel_capacity(4)
            .with_log_filter("debug");
        assert_eq!(config.update_timeout, Duration::from_millis(100));
        assert_eq!(config.get_timeout, Duration::from_millis(50));
        assert_eq!(config.channel_capacity, 4);
        assert_eq!(config.log_filter, "debug");
    }
}
