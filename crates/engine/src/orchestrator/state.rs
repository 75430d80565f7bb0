//! Orchestrator state machine.
//!
//! Everything here is synchronous and runs under the orchestrator's lock.
//! Each transition that can change readiness ends with a queue pump.

use std::collections::HashSet;

use propcache_domain::{DecisionScope, PropositionMap};
use tokio::sync::oneshot;
use tokio::task::AbortHandle;

use super::error::FetchError;
use super::in_flight::{InFlightRegistry, InFlightWrite, UpdateResult};
use super::ordering_queue::{GetResult, OrderingQueue, QueuedOperation, Ticket};
use crate::infrastructure::cache::PropositionCache;
use crate::infrastructure::correlation::RequestId;

#[derive(Debug, Default)]
pub struct OrchestratorState {
    cache: PropositionCache,
    in_flight: InFlightRegistry,
    queue: OrderingQueue,
}

impl OrchestratorState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new update and place its barrier in the queue.
    pub fn register_update(
        &mut self,
        id: RequestId,
        scopes: HashSet<DecisionScope>,
        responder: oneshot::Sender<UpdateResult>,
        expiry: Option<AbortHandle>,
    ) {
        self.in_flight
            .register(id, InFlightWrite::new(scopes, responder, expiry));
        self.queue.push(QueuedOperation::Barrier(id));
    }

    /// Returns false if the id is not in flight.
    pub fn accumulate(&mut self, id: &RequestId, propositions: PropositionMap) -> bool {
        self.in_flight.accumulate(id, propositions)
    }

    /// Finish an update successfully.
    ///
    /// Merges the accumulated propositions into the cache and evicts every
    /// requested scope the server did not return. Returns the merged
    /// propositions for subscribers, or `None` if the id was not in flight.
    pub fn complete(&mut self, id: &RequestId) -> Option<PropositionMap> {
        let mut write = self.in_flight.take(id)?;
        let returned_map = write.take_accumulator();

        let returned: HashSet<DecisionScope> = returned_map.keys().cloned().collect();
        let evicted = self
            .cache
            .evict(write.scopes().iter().filter(|scope| !returned.contains(*scope)));
        let stored = self.cache.merge(returned_map.clone());

        tracing::info!(
            request_id = %id.short(),
            returned = stored,
            evicted = evicted,
            "Update completed"
        );

        write.resolve(Ok(returned));
        self.pump();
        Some(returned_map)
    }

    /// Finish an update with an error. The cache is left untouched.
    ///
    /// Returns false if the id was not in flight.
    pub fn fail(&mut self, id: &RequestId, error: FetchError) -> bool {
        let Some(write) = self.in_flight.take(id) else {
            return false;
        };
        write.resolve(Err(error));
        self.pump();
        true
    }

    /// Drop an update whose deadline passed.
    pub fn expire(&mut self, id: &RequestId) -> bool {
        self.fail(id, FetchError::Timeout)
    }

    /// Answer a get right away if none of its scopes is being written.
    pub fn try_get_now(&self, scopes: &HashSet<DecisionScope>) -> Option<PropositionMap> {
        if self.in_flight.covers_any(scopes) {
            None
        } else {
            Some(self.cache.get(scopes))
        }
    }

    pub fn defer_get(
        &mut self,
        scopes: HashSet<DecisionScope>,
        responder: oneshot::Sender<GetResult>,
    ) -> Ticket {
        self.queue.push(QueuedOperation::Get { scopes, responder })
    }

    /// Withdraw a deferred get. Returns false if it was already released.
    pub fn cancel_get(&mut self, ticket: Ticket) -> bool {
        let removed = self.queue.cancel(ticket);
        if removed {
            self.pump();
        }
        removed
    }

    /// Empty the cache and cancel every outstanding update.
    pub fn reset(&mut self) {
        let cleared = self.cache.clear();
        let dropped = self.in_flight.drain();
        let cancelled = dropped.len();
        for (_, write) in dropped {
            write.resolve(Err(FetchError::Cancelled));
        }
        self.pump();
        tracing::info!(cleared, cancelled, "Orchestrator state reset");
    }

    fn pump(&mut self) -> usize {
        self.queue.pump(&self.in_flight, &self.cache)
    }

    pub fn cached_scopes(&self) -> Vec<DecisionScope> {
        self.cache.scopes()
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    pub fn queued_count(&self) -> usize {
        self.queue.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use propcache_domain::{Offer, Proposition};
    use serde_json::json;

    fn scopes(names: &[&str]) -> HashSet<DecisionScope> {
        names.iter().map(|n| DecisionScope::new(*n)).collect()
    }

    fn result(entries: &[(&str, &str)]) -> PropositionMap {
        entries
            .iter()
            .map(|(id, scope)| {
                let offer = Offer::new(format!("{}-o", id), "s", json!("x")).unwrap();
                (
                    DecisionScope::new(*scope),
                    Proposition::new(*id, *scope, vec![offer]),
                )
            })
            .collect()
    }

    fn start(state: &mut OrchestratorState, names: &[&str]) -> (RequestId, oneshot::Receiver<UpdateResult>) {
        let id = RequestId::new();
        let (tx, rx) = oneshot::channel();
        state.register_update(id, scopes(names), tx, None);
        (id, rx)
    }

    #[test]
    fn complete_merges_and_evicts() {
        let mut state = OrchestratorState::new();
        state.cache.merge(result(&[("old", "B")]));

        let (id, mut rx) = start(&mut state, &["A", "B"]);
        assert!(state.accumulate(&id, result(&[("p1", "A")])));
        let merged = state.complete(&id).unwrap();

        assert_eq!(merged.len(), 1);
        assert_eq!(state.cached_scopes(), vec![DecisionScope::new("A")]);
        assert_eq!(rx.try_recv().unwrap().unwrap(), scopes(&["A"]));
        assert_eq!(state.in_flight_count(), 0);
        assert_eq!(state.queued_count(), 0);
    }

    #[test]
    fn fail_leaves_cache_untouched() {
        let mut state = OrchestratorState::new();
        state.cache.merge(result(&[("old", "A")]));

        let (id, mut rx) = start(&mut state, &["A"]);
        state.accumulate(&id, result(&[("new", "A")]));
        assert!(state.fail(&id, FetchError::from_signal(500, "", "")));

        assert!(matches!(rx.try_recv().unwrap(), Err(FetchError::Server { .. })));
        let cached = state.try_get_now(&scopes(&["A"])).unwrap();
        assert_eq!(cached[&DecisionScope::new("A")].id(), "old");
    }

    #[test]
    fn unknown_ids_are_ignored() {
        let mut state = OrchestratorState::new();
        let stranger = RequestId::new();
        assert!(!state.accumulate(&stranger, result(&[("p1", "A")])));
        assert!(state.complete(&stranger).is_none());
        assert!(!state.expire(&stranger));
        assert!(state.cached_scopes().is_empty());
    }

    #[test]
    fn deferred_get_released_on_completion() {
        let mut state = OrchestratorState::new();
        let (id, _update_rx) = start(&mut state, &["A"]);

        assert!(state.try_get_now(&scopes(&["A"])).is_none());
        assert!(state.try_get_now(&scopes(&["B"])).is_some());

        let (tx, mut rx) = oneshot::channel();
        state.defer_get(scopes(&["A"]), tx);
        state.accumulate(&id, result(&[("p1", "A")]));
        state.complete(&id);

        let got = rx.try_recv().unwrap().unwrap();
        assert_eq!(got[&DecisionScope::new("A")].id(), "p1");
    }

    #[test]
    fn reset_cancels_updates_and_releases_gets() {
        let mut state = OrchestratorState::new();
        state.cache.merge(result(&[("old", "A")]));
        let (_id, mut update_rx) = start(&mut state, &["A"]);
        let (tx, mut get_rx) = oneshot::channel();
        state.defer_get(scopes(&["A"]), tx);

        state.reset();

        assert_eq!(update_rx.try_recv().unwrap(), Err(FetchError::Cancelled));
        assert!(get_rx.try_recv().unwrap().unwrap().is_empty());
        assert_eq!(state.in_flight_count(), 0);
        assert_eq!(state.queued_count(), 0);
    }

    #[test]
    fn cancel_get_unblocks_nothing_else() {
        let mut state = OrchestratorState::new();
        let (_id, _rx) = start(&mut state, &["A"]);
        let (tx, _get_rx) = oneshot::channel();
        let ticket = state.defer_get(scopes(&["A"]), tx);

        assert!(state.cancel_get(ticket));
        assert!(!state.cancel_get(ticket));
        // Barrier for the outstanding update remains
        assert_eq!(state.queued_count(), 1);
    }
}
