use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use tokio::sync::{Notify, oneshot};

use crate::queue::{QueueOptions, QueuedResult, Task};

struct Lane {
    tasks: VecDeque<Task>,
}

/// Keyed FIFO lanes: per-key mutual exclusion with deterministic per-key
/// ordering, and full concurrency across distinct keys.
///
/// This subsumes both a per-chain lock and a global serial queue: use the
/// chain id as the key and every submission for that chain runs alone and in
/// submission order, while other chains proceed in parallel. A lane exists in
/// the map only while it has work; its worker exits and the entry is removed
/// when the lane empties.
pub struct KeyedQueue {
    lanes: Mutex<HashMap<u64, Lane>>,
    options: QueueOptions,
    idle: Notify,
}

impl KeyedQueue {
    pub fn new() -> Self {
        Self::with_options(QueueOptions::default())
    }

    pub fn with_options(options: QueueOptions) -> Self {
        Self {
            lanes: Mutex::new(HashMap::new()),
            options,
            idle: Notify::new(),
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Append `op` to the lane for `key`. Must be called within a tokio
    /// runtime, since a fresh lane spawns its worker task here.
    pub fn enqueue<T, F, Fut>(self: &Arc<Self>, key: u64, op: F) -> QueuedResult<T>
    where
        T: Send + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = T> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let task: Task = Box::pin(async move {
            let result = op().await;
            let _ = tx.send(result);
        });

        let spawn_worker = {
            let mut lanes = self.lanes.lock().unwrap();
            match lanes.get_mut(&key) {
                Some(lane) => {
                    lane.tasks.push_back(task);
                    false
                }
                None => {
                    let mut tasks = VecDeque::new();
                    tasks.push_back(task);
                    lanes.insert(key, Lane { tasks });
                    true
                }
            }
        };

        if spawn_worker {
            let queue = Arc::clone(self);
            tokio::spawn(async move { queue.run_lane(key).await });
        }

        QueuedResult::new(rx)
    }

    async fn run_lane(self: Arc<Self>, key: u64) {
        tracing::debug!(key, "lane worker started");
        loop {
            let task = {
                let mut lanes = self.lanes.lock().unwrap();
                let lane = match lanes.get_mut(&key) {
                    Some(lane) => lane,
                    None => break,
                };
                match lane.tasks.pop_front() {
                    Some(task) => task,
                    None => {
                        lanes.remove(&key);
                        break;
                    }
                }
            };

            // Run in a child task so a panicking operation ends only itself;
            // the lane keeps draining and the panicked caller's handle settles
            // as `WorkerLost` when its sender drops.
            if let Err(e) = tokio::spawn(task).await {
                tracing::error!(key, "queued operation panicked: {e}");
            }

            if !self.options.pacing.is_zero() {
                tokio::time::sleep(self.options.pacing).await;
            }
        }
        tracing::debug!(key, "lane worker idle");
        self.idle.notify_waiters();
    }

    /// Number of keys with a lane currently active.
    pub fn active_keys(&self) -> usize {
        self.lanes.lock().unwrap().len()
    }

    /// Operations waiting in the lane for `key` (excludes the one currently
    /// executing).
    pub fn pending_count(&self, key: u64) -> usize {
        self.lanes
            .lock()
            .unwrap()
            .get(&key)
            .map(|lane| lane.tasks.len())
            .unwrap_or(0)
    }

    /// Wait until every lane has emptied and all workers have exited.
    pub async fn drain(&self) {
        loop {
            let notified = self.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.active_keys() == 0 {
                return;
            }
            notified.await;
        }
    }
}

impl Default for KeyedQueue {
    fn default() -> Self {
        Self::new()
    }
}
