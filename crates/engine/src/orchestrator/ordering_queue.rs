//! FIFO ordering of reads behind the writes issued before them.
//!
//! Every update enqueues a barrier and every deferred get enqueues itself.
//! The queue is pumped after each state transition: heads are released while
//! they are ready, and the first head that is not ready stops the pump. A get
//! therefore never overtakes an earlier write, even one on unrelated scopes
//! that was enqueued ahead of it.

use std::collections::{HashSet, VecDeque};

use propcache_domain::{DecisionScope, PropositionMap};
use tokio::sync::oneshot;

use super::error::FetchError;
use super::in_flight::InFlightRegistry;
use crate::infrastructure::cache::PropositionCache;
use crate::infrastructure::correlation::RequestId;

/// Result delivered to a get caller.
pub type GetResult = Result<PropositionMap, FetchError>;

/// Position of an item in the queue, used to cancel it later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ticket(u64);

#[derive(Debug)]
pub enum QueuedOperation {
    /// Ready once the update is no longer in flight
    Barrier(RequestId),
    /// Ready once no in-flight update covers any of `scopes`
    Get {
        scopes: HashSet<DecisionScope>,
        responder: oneshot::Sender<GetResult>,
    },
}

impl QueuedOperation {
    fn is_ready(&self, in_flight: &InFlightRegistry) -> bool {
        match self {
            Self::Barrier(id) => !in_flight.contains(id),
            Self::Get { scopes, .. } => !in_flight.covers_any(scopes),
        }
    }
}

#[derive(Debug, Default)]
pub struct OrderingQueue {
    items: VecDeque<(Ticket, QueuedOperation)>,
    next_ticket: u64,
}

impl OrderingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, operation: QueuedOperation) -> Ticket {
        let ticket = Ticket(self.next_ticket);
        self.next_ticket += 1;
        self.items.push_back((ticket, operation));
        ticket
    }

    /// Remove an item wherever it sits. Returns false if it was already released.
    pub fn cancel(&mut self, ticket: Ticket) -> bool {
        match self.items.iter().position(|(t, _)| *t == ticket) {
            Some(index) => {
                self.items.remove(index);
                true
            }
            None => false,
        }
    }

    /// Release ready heads. Returns the number of items released.
    pub fn pump(&mut self, in_flight: &InFlightRegistry, cache: &PropositionCache) -> usize {
        let mut released = 0;
        while let Some((_, head)) = self.items.front() {
            if !head.is_ready(in_flight) {
                break;
            }
            let Some((ticket, operation)) = self.items.pop_front() else {
                break;
            };
            released += 1;
            if let QueuedOperation::Get { scopes, responder } = operation {
                tracing::debug!(ticket = ticket.0, scope_count = scopes.len(), "Releasing deferred get");
                // Caller may have timed out already
                let _ = responder.send(Ok(cache.get(&scopes)));
            }
        }
        released
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
