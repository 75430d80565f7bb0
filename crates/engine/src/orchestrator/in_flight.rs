//! Registry of updates that have been sent but not yet terminated.

use std::collections::{HashMap, HashSet};

use propcache_domain::{DecisionScope, PropositionMap};
use tokio::sync::oneshot;
use tokio::task::AbortHandle;

use super::error::FetchError;
use crate::infrastructure::correlation::RequestId;

/// Result delivered to an update caller: the scopes the server returned.
pub type UpdateResult = Result<HashSet<DecisionScope>, FetchError>;

/// One outstanding update.
#[derive(Debug)]
pub struct InFlightWrite {
    scopes: HashSet<DecisionScope>,
    accumulator: PropositionMap,
    responder: Option<oneshot::Sender<UpdateResult>>,
    expiry: Option<AbortHandle>,
}

impl InFlightWrite {
    pub fn new(
        scopes: HashSet<DecisionScope>,
        responder: oneshot::Sender<UpdateResult>,
        expiry: Option<AbortHandle>,
    ) -> Self {
        Self {
            scopes,
            accumulator: PropositionMap::new(),
            responder: Some(responder),
            expiry,
        }
    }

    pub fn scopes(&self) -> &HashSet<DecisionScope> {
        &self.scopes
    }

    pub fn covers_any<'a>(&self, scopes: impl IntoIterator<Item = &'a DecisionScope>) -> bool {
        scopes.into_iter().any(|scope| self.scopes.contains(scope))
    }

    /// Take the partial results gathered so far, leaving the accumulator empty.
    pub fn take_accumulator(&mut self) -> PropositionMap {
        std::mem::take(&mut self.accumulator)
    }

    /// Deliver the final result and stop the expiry task.
    ///
    /// A caller that stopped waiting is not an error.
    pub fn resolve(mut self, result: UpdateResult) {
        if let Some(expiry) = self.expiry.take() {
            expiry.abort();
        }
        if let Some(responder) = self.responder.take() {
            let _ = responder.send(result);
        }
    }
}

/// Outstanding updates keyed by request id.
#[derive(Debug, Default)]
pub struct InFlightRegistry {
    writes: HashMap<RequestId, InFlightWrite>,
}

impl InFlightRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, id: RequestId, write: InFlightWrite) {
        self.writes.insert(id, write);
    }

    /// Merge partial results into the request's accumulator.
    ///
    /// Returns false if the id is not in flight (stale or foreign).
    pub fn accumulate(&mut self, id: &RequestId, propositions: PropositionMap) -> bool {
        match self.writes.get_mut(id) {
            Some(write) => {
                write.accumulator.extend(propositions);
                true
            }
            None => false,
        }
    }

    /// Remove and return the record for `id`.
    pub fn take(&mut self, id: &RequestId) -> Option<InFlightWrite> {
        self.writes.remove(id)
    }

    pub fn contains(&self, id: &RequestId) -> bool {
        self.writes.contains_key(id)
    }

    /// True if any outstanding update was issued for one of `scopes`.
    pub fn covers_any(&self, scopes: &HashSet<DecisionScope>) -> bool {
        self.writes.values().any(|write| write.covers_any(scopes))
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    /// Remove every record.
    pub fn drain(&mut self) -> Vec<(RequestId, InFlightWrite)> {
        self.writes.drain().collect()
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

    fn write(names: &[&str]) -> (InFlightWrite, oneshot::Receiver<UpdateResult>) {
        let (tx, rx) = oneshot::channel();
        (InFlightWrite::new(scopes(names), tx, None), rx)
    }

    #[test]
    fn covers_any_checks_scope_overlap() {
        let mut registry = InFlightRegistry::new();
        let (w, _rx) = write(&["A", "B"]);
        registry.register(RequestId::new(), w);

        assert!(registry.covers_any(&scopes(&["B", "C"])));
        assert!(!registry.covers_any(&scopes(&["C"])));
    }

    #[test]
    fn accumulate_rejects_unknown_ids() {
        let mut registry = InFlightRegistry::new();
        assert!(!registry.accumulate(&RequestId::new(), PropositionMap::new()));
    }

    #[test]
    fn accumulator_collects_partials() {
        let mut registry = InFlightRegistry::new();
        let id = RequestId::new();
        let (w, _rx) = write(&["A", "B"]);
        registry.register(id, w);

        let offer = Offer::new("o1", "s", json!("x")).unwrap();
        let first = PropositionMap::from([(
            DecisionScope::new("A"),
            Proposition::new("p1", "A", vec![offer.clone()]),
        )]);
        let second = PropositionMap::from([(
            DecisionScope::new("B"),
            Proposition::new("p2", "B", vec![offer]),
        )]);
        assert!(registry.accumulate(&id, first));
        assert!(registry.accumulate(&id, second));

        let mut taken = registry.take(&id).unwrap();
        assert_eq!(taken.take_accumulator().len(), 2);
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn resolve_delivers_result() {
        let (w, rx) = write(&["A"]);
        w.resolve(Err(FetchError::Cancelled));
        assert_eq!(rx.await.unwrap(), Err(FetchError::Cancelled));
    }

    #[test]
    fn resolve_tolerates_dropped_caller() {
        let (w, rx) = write(&["A"]);
        drop(rx);
        w.resolve(Ok(HashSet::new()));
    }
}
