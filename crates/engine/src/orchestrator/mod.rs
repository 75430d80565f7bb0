//! Proposition orchestrator.
//!
//! Issues fetches through the [`NetworkPort`], correlates the partial
//! results and terminal signals that come back, keeps the proposition cache
//! current and orders reads behind overlapping writes.
//!
//! ```text
//! update(scopes) ──► register + barrier ──► NetworkPort::send_fetch_request
//!                                                    │
//! handle_message ◄── partial* ── terminal ◄──────────┘
//!      │
//!      ├─ complete: merge, evict, resolve caller, pump queue, notify bus
//!      └─ error:    resolve caller with classified error, pump queue
//! ```

mod error;
mod in_flight;
mod ordering_queue;
mod state;
mod update_bus;


pub use error::FetchError;
pub use in_flight::UpdateResult;
pub use ordering_queue::GetResult;
pub use update_bus::UpdateBus;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use propcache_domain::{DecisionScope, PropositionMap};
use propcache_shared::{EdgeMessage, FetchRequest, PropositionPayload, RequestContext, TerminalSignal};
use tokio::sync::{oneshot, Mutex};

use crate::infrastructure::config::OrchestratorConfig;
use crate::infrastructure::correlation::RequestId;
use crate::infrastructure::ports::NetworkPort;
use state::OrchestratorState;

struct Inner {
    state: Mutex<OrchestratorState>,
    network: Arc<dyn NetworkPort>,
    update_bus: UpdateBus,
    config: OrchestratorConfig,
}

/// Cache-fronted proposition fetcher.
///
/// Cheap to clone; clones share the same state.
#[derive(Clone)]
pub struct PropositionOrchestrator {
    inner: Arc<Inner>,
}

impl PropositionOrchestrator {
    pub fn new(network: Arc<dyn NetworkPort>, config: OrchestratorConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(OrchestratorState::new()),
                network,
                update_bus: UpdateBus::new(),
                config,
            }),
        }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.inner.config
    }

    /// Fetch fresh propositions for `scopes` and store them in the cache.
    ///
    /// Resolves once the server signals completion, with the set of scopes it
    /// returned. Requested scopes the server did not return are evicted.
    /// Invalid scopes are dropped; if none remain the network is never
    /// contacted.
    ///
    /// # Errors
    ///
    /// * `InvalidRequest` - no valid scope, or the server rejected the request
    /// * `Timeout` - no terminal signal within `timeout` (default from config)
    /// * `Network` / `Server` / `Unexpected` - classified terminal error or
    ///   failed hand-off
    /// * `Cancelled` - `clear()` was called while the update was in flight
    pub async fn update<I, S>(
        &self,
        scopes: I,
        context: Option<RequestContext>,
        timeout: Option<Duration>,
    ) -> Result<HashSet<DecisionScope>, FetchError>
    where
        I: IntoIterator<Item = S>,
        S: Into<DecisionScope>,
    {
        let scopes = validate_scopes(scopes)?;
        let timeout = timeout.unwrap_or(self.inner.config.update_timeout);
        let id = RequestId::new();

        let mut decision_scopes: Vec<String> =
            scopes.iter().map(|s| s.as_str().to_string()).collect();
        decision_scopes.sort();
        let scope_count = decision_scopes.len();

        let (tx, mut rx) = oneshot::channel();
        {
            // Registered before the send so fast responses correlate, and the
            // expiry task cannot run before the record exists.
            let mut state = self.inner.state.lock().await;
            let inner = Arc::clone(&self.inner);
            let expiry = tokio::spawn(async move {
                tokio::time::sleep(timeout).await;
                if inner.state.lock().await.expire(&id) {
                    tracing::warn!(request_id = %id.short(), "Update timed out");
                }
            });
            state.register_update(id, scopes, tx, Some(expiry.abort_handle()));
        }

        let request = FetchRequest {
            request_id: id.to_uuid(),
            decision_scopes,
            context: context.unwrap_or_default(),
            send_completion: true,
        };

        tracing::info!(request_id = %id.short(), scope_count, "Sending fetch request");
        // A stalled hand-off must not outlive the expiry or a clear().
        tokio::select! {
            sent = self.inner.network.send_fetch_request(request) => {
                if let Err(e) = sent {
                    tracing::warn!(request_id = %id.short(), error = %e, "Failed to send fetch request");
                    self.inner.state.lock().await.fail(&id, FetchError::from(e));
                }
            }
            result = &mut rx => return result.unwrap_or(Err(FetchError::Cancelled)),
        }

        rx.await.unwrap_or(Err(FetchError::Cancelled))
    }

    /// Read cached propositions for `scopes`.
    ///
    /// Answers immediately when no in-flight update covers any requested
    /// scope. Otherwise waits until every overlapping update has terminated
    /// and then reads the cache. Scopes without a cached proposition are
    /// omitted from the result.
    ///
    /// # Errors
    ///
    /// * `InvalidRequest` - no valid scope
    /// * `Timeout` - overlapping updates did not finish within `timeout`
    pub async fn get<I, S>(
        &self,
        scopes: I,
        timeout: Option<Duration>,
    ) -> Result<PropositionMap, FetchError>
    where
        I: IntoIterator<Item = S>,
        S: Into<DecisionScope>,
    {
        let scopes = validate_scopes(scopes)?;
        let timeout = timeout.unwrap_or(self.inner.config.get_timeout);

        let (ticket, rx) = {
            let mut state = self.inner.state.lock().await;
            if let Some(found) = state.try_get_now(&scopes) {
                return Ok(found);
            }
            let (tx, rx) = oneshot::channel();
            (state.defer_get(scopes, tx), rx)
        };

        match tokio::time::timeout(timeout, rx).await {
            Ok(result) => result.unwrap_or(Err(FetchError::Cancelled)),
            Err(_) => {
                self.inner.state.lock().await.cancel_get(ticket);
                tracing::warn!("Deferred get timed out");
                Err(FetchError::Timeout)
            }
        }
    }

    /// Register a callback fired once per completed update.
    pub async fn subscribe(&self, callback: impl FnMut(&PropositionMap) + Send + 'static) {
        self.inner.update_bus.subscribe(callback).await;
    }

    pub async fn subscriber_count(&self) -> usize {
        self.inner.update_bus.subscriber_count().await
    }

    pub async fn clear_subscribers(&self) {
        self.inner.update_bus.clear().await;
    }

    /// Drop all cached propositions and cancel outstanding updates.
    ///
    /// Waiting update callers get `Cancelled`; deferred gets are released and
    /// see the empty cache. Responses that arrive later are ignored.
    pub async fn clear(&self) {
        self.inner.state.lock().await.reset();
    }

    /// Feed one inbound message from the network collaborator.
    pub async fn handle_message(&self, message: EdgeMessage) {
        let Some(id) = RequestId::parse(message.correlation_id()) else {
            tracing::debug!(
                correlation_id = message.correlation_id(),
                "Ignoring message with foreign correlation id"
            );
            return;
        };

        match message {
            EdgeMessage::Propositions { propositions, .. } => {
                let accepted = accept_propositions(propositions);
                let count = accepted.len();
                if !self.inner.state.lock().await.accumulate(&id, accepted) {
                    tracing::debug!(request_id = %id.short(), "Ignoring uncorrelated partial result");
                    return;
                }
                tracing::debug!(request_id = %id.short(), count, "Accumulated partial result");
            }
            EdgeMessage::Terminal {
                signal: TerminalSignal::Completion,
                ..
            } => {
                let (completed, mut subscribers) = {
                    let mut state = self.inner.state.lock().await;
                    let Some(completed) = state.complete(&id) else {
                        tracing::debug!(request_id = %id.short(), "Ignoring uncorrelated completion");
                        return;
                    };
                    // Queue for the bus before releasing the state so
                    // notifications follow completion order.
                    (completed, self.inner.update_bus.lock().await)
                };
                subscribers.dispatch(&completed);
            }
            EdgeMessage::Terminal {
                signal:
                    TerminalSignal::Error {
                        status,
                        title,
                        detail,
                    },
                ..
            } => {
                let error = FetchError::from_signal(status, &title, &detail);
                if self.inner.state.lock().await.fail(&id, error) {
                    tracing::warn!(request_id = %id.short(), status, %title, "Update failed");
                } else {
                    tracing::debug!(request_id = %id.short(), status, "Ignoring uncorrelated error signal");
                }
            }
        }
    }

    /// Decode and feed one inbound JSON message. Malformed input is dropped.
    pub async fn handle_raw_message(&self, raw: &str) {
        match serde_json::from_str::<EdgeMessage>(raw) {
            Ok(message) => self.handle_message(message).await,
            Err(e) => tracing::warn!(error = %e, "Discarding malformed inbound message"),
        }
    }

    pub async fn cached_scopes(&self) -> Vec<DecisionScope> {
        self.inner.state.lock().await.cached_scopes()
    }

    pub async fn in_flight_count(&self) -> usize {
        self.inner.state.lock().await.in_flight_count()
    }

    pub async fn queued_count(&self) -> usize {
        self.inner.state.lock().await.queued_count()
    }
}

impl std::fmt::Debug for PropositionOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PropositionOrchestrator")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

/// Keep valid scopes, logging the rest.
fn validate_scopes<I, S>(scopes: I) -> Result<HashSet<DecisionScope>, FetchError>
where
    I: IntoIterator<Item = S>,
    S: Into<DecisionScope>,
{
    let mut valid = HashSet::new();
    for scope in scopes.into_iter().map(Into::into) {
        match scope.validate() {
            Ok(()) => {
                valid.insert(scope);
            }
            Err(e) => tracing::warn!(scope = %scope, error = %e, "Dropping invalid decision scope"),
        }
    }
    if valid.is_empty() {
        return Err(FetchError::invalid_request("No valid decision scopes"));
    }
    Ok(valid)
}

/// Convert wire propositions, dropping any without valid offers or scope.
fn accept_propositions(payloads: Vec<PropositionPayload>) -> PropositionMap {
    payloads
        .into_iter()
        .filter_map(|payload| match payload.into_domain() {
            Ok(proposition) => {
                let scope = proposition.decision_scope();
                if proposition.has_offers() && scope.is_valid() {
                    Some((scope, proposition))
                } else {
                    None
                }
            }
            Err(e) => {
                tracing::debug!(error = %e, "Dropping proposition");
                None
            }
        })
        .collect()
}
