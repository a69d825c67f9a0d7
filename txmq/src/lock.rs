use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::Mutex as AsyncMutex;

/// Keyed async mutex over chain ids.
///
/// `with_lock` guarantees that no two operations for the same chain id run
/// concurrently, while operations for distinct chain ids proceed fully in
/// parallel. A map entry exists only while at least one caller holds or waits
/// for that chain's lock; the last caller out removes it.
///
/// There is no ordering contract among waiters on the same chain beyond the
/// scheduler's wake order, and no timeout: a hung operation blocks its chain
/// until it settles.
pub struct ChainLockManager {
    slots: Mutex<HashMap<u64, Arc<AsyncMutex<()>>>>,
}

impl ChainLockManager {
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Run `op` while holding the lock for `chain_id`, returning its output.
    ///
    /// The output type is opaque: a failing operation simply resolves to its
    /// error value, which is returned to the caller unchanged. The lock is
    /// released on every exit path.
    pub async fn with_lock<T, F, Fut>(&self, chain_id: u64, op: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let slot = {
            let mut slots = self.slots.lock().unwrap();
            slots.entry(chain_id).or_default().clone()
        };

        let guard = slot.lock().await;
        tracing::trace!(chain_id, "chain lock acquired");
        let result = op().await;
        drop(guard);

        // Remove the slot only if nobody else holds a handle to it, so a
        // waiter that already fetched this slot never loses its entry.
        let mut slots = self.slots.lock().unwrap();
        if let Some(current) = slots.get(&chain_id) {
            if Arc::ptr_eq(current, &slot) && Arc::strong_count(current) == 2 {
                slots.remove(&chain_id);
                tracing::trace!(chain_id, "chain lock slot released");
            }
        }

        result
    }

    /// Number of chains with an operation currently in flight or waiting.
    pub fn locked_chains(&self) -> usize {
        self.slots.lock().unwrap().len()
    }
}

impl Default for ChainLockManager {
    fn default() -> Self {
        Self::new()
    }
}
