//! In-memory proposition cache.
//!
//! Holds the latest proposition per decision scope. The cache has no lock of
//! its own: it lives inside the orchestrator state and is only reached while
//! that state's lock is held.

use std::collections::HashMap;

use propcache_domain::{DecisionScope, Proposition, PropositionMap};

/// Latest fetched proposition per decision scope.
///
/// Only propositions with at least one offer are ever stored.
#[derive(Debug, Default)]
pub struct PropositionCache {
    entries: HashMap<DecisionScope, Proposition>,
}

impl PropositionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached propositions for the requested scopes. Missing scopes are omitted.
    pub fn get<'a>(&self, scopes: impl IntoIterator<Item = &'a DecisionScope>) -> PropositionMap {
        scopes
            .into_iter()
            .filter_map(|scope| {
                self.entries
                    .get(scope)
                    .map(|proposition| (scope.clone(), proposition.clone()))
            })
            .collect()
    }

    /// Upsert entries (last write wins). Returns the number stored.
    pub fn merge(&mut self, entries: PropositionMap) -> usize {
        let mut stored = 0;
        for (scope, proposition) in entries {
            if !proposition.has_offers() {
                continue;
            }
            self.entries.insert(scope, proposition);
            stored += 1;
        }
        stored
    }

    /// Remove the given scopes. Returns the number actually removed.
    pub fn evict<'a>(&mut self, scopes: impl IntoIterator<Item = &'a DecisionScope>) -> usize {
        scopes
            .into_iter()
            .filter(|scope| self.entries.remove(*scope).is_some())
            .count()
    }

    /// Remove everything. Returns the number of entries dropped.
    pub fn clear(&mut self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        count
    }

    pub fn contains(&self, scope: &DecisionScope) -> bool {
        self.entries.contains_key(scope)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All cached scopes, in no particular order.
    pub fn scopes(&self) -> Vec<DecisionScope> {
        self.entries.keys().cloned().collect()
    }
}
