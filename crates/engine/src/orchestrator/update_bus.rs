//! Update bus for notifying listeners of completed updates.
//!
//! Subscribers register synchronous callbacks that run once per completed
//! update with the propositions it returned. Callbacks run after the
//! orchestrator state lock is released but must not block; anything that
//! needs the orchestrator should hand the result off to a task. Dispatches
//! happen in the order updates completed.

use std::sync::Arc;

use propcache_domain::PropositionMap;
use tokio::sync::{Mutex, MutexGuard};

type Subscriber = Box<dyn FnMut(&PropositionMap) + Send + 'static>;

/// Push-based fan-out of update results.
///
/// The bus holds strong references to subscribers, so they persist until
/// cleared or the bus is dropped.
#[derive(Clone, Default)]
pub struct UpdateBus {
    subscribers: Arc<Mutex<Vec<Subscriber>>>,
}

/// Exclusive access to the subscriber list for one dispatch.
///
/// Acquired in lock order, so dispatches through guards taken one after
/// another run in that same order.
pub struct Dispatcher<'a> {
    subscribers: MutexGuard<'a, Vec<Subscriber>>,
}

impl Dispatcher<'_> {
    pub fn dispatch(&mut self, propositions: &PropositionMap) {
        for subscriber in self.subscribers.iter_mut() {
            subscriber(propositions);
        }
    }
}

impl UpdateBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn subscribe(&self, callback: impl FnMut(&PropositionMap) + Send + 'static) {
        self.subscribers.lock().await.push(Box::new(callback));
    }

    /// Reserve the next dispatch slot.
    pub async fn lock(&self) -> Dispatcher<'_> {
        Dispatcher {
            subscribers: self.subscribers.lock().await,
        }
    }

    /// Invoke every subscriber with the result of one update.
    pub async fn dispatch(&self, propositions: &PropositionMap) {
        self.lock().await.dispatch(propositions);
    }

    pub async fn subscriber_count(&self) -> usize {
        self.subscribers.lock().await.len()
    }

    pub async fn clear(&self) {
        self.subscribers.lock().await.clear();
    }
}

impl std::fmt::Debug for UpdateBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdateBus").finish_non_exhaustive()
    }
}
