use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::future::BoxFuture;
use tokio::sync::{Notify, oneshot};

use crate::error::TxmqError;

pub(crate) type Task = BoxFuture<'static, ()>;

#[derive(Clone, Debug)]
pub struct QueueOptions {
    /// Sleep between queue items. This gives the node time to observe the
    /// just-submitted transaction before the next item reads "next nonce".
    /// It is a heuristic, not a confirmation: under high network latency the
    /// retry layer is what actually recovers from a stale read.
    pub pacing: Duration,
}

impl Default for QueueOptions {
    fn default() -> Self {
        Self {
            pacing: Duration::from_millis(100),
        }
    }
}

/// Result handle for an enqueued operation.
///
/// Settles once the operation has run to completion in queue order, with the
/// operation's own output (success value or error).
pub struct QueuedResult<T> {
    rx: oneshot::Receiver<T>,
}

impl<T> QueuedResult<T> {
    pub(crate) fn new(rx: oneshot::Receiver<T>) -> Self {
        Self { rx }
    }

    pub async fn wait(self) -> Result<T, TxmqError> {
        self.rx.await.map_err(|_| TxmqError::WorkerLost)
    }
}

struct QueueState {
    tasks: VecDeque<Task>,
    worker_running: bool,
}

/// Single global FIFO lane for async operations.
///
/// `enqueue` appends an operation and returns a [`QueuedResult`] handle. One
/// worker task drains the queue in strict submission order, sleeping
/// [`QueueOptions::pacing`] between items, and exits when the queue is empty.
/// The next enqueue restarts it. A failing operation settles only its own
/// handle; the worker moves on to the next item.
pub struct SerialQueue {
    state: Mutex<QueueState>,
    options: QueueOptions,
    idle: Notify,
}

impl SerialQueue {
    pub fn new() -> Self {
        Self::with_options(QueueOptions::default())
    }

    pub fn with_options(options: QueueOptions) -> Self {
        Self {
            state: Mutex::new(QueueState {
                tasks: VecDeque::new(),
                worker_running: false,
            }),
            options,
            idle: Notify::new(),
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Append `op` to the queue. Must be called within a tokio runtime, since
    /// an idle queue spawns its worker task here.
    pub fn enqueue<T, F, Fut>(self: &Arc<Self>, op: F) -> QueuedResult<T>
    where
        T: Send + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = T> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let task: Task = Box::pin(async move {
            let result = op().await;
            // The caller may have stopped waiting; that is its business.
            let _ = tx.send(result);
        });

        let spawn_worker = {
            let mut state = self.state.lock().unwrap();
            state.tasks.push_back(task);
            if state.worker_running {
                false
            } else {
                state.worker_running = true;
                true
            }
        };

        if spawn_worker {
            let queue = Arc::clone(self);
            tokio::spawn(async move { queue.run_worker().await });
        }

        QueuedResult::new(rx)
    }

    async fn run_worker(self: Arc<Self>) {
        tracing::debug!("serial queue worker started");
        loop {
            let task = {
                let mut state = self.state.lock().unwrap();
                match state.tasks.pop_front() {
                    Some(task) => task,
                    None => {
                        state.worker_running = false;
                        break;
                    }
                }
            };

            // Each operation runs in its own task so a panic inside it cannot
            // take the worker loop down with it. The panicking operation's
            // result sender drops, settling its handle as `WorkerLost`.
            if let Err(e) = tokio::spawn(task).await {
                tracing::error!("queued operation panicked: {e}");
            }

            if !self.options.pacing.is_zero() {
                tokio::time::sleep(self.options.pacing).await;
            }
        }
        tracing::debug!("serial queue worker idle");
        self.idle.notify_waiters();
    }

    /// Number of operations waiting for their turn (excludes the one
    /// currently executing).
    pub fn pending_count(&self) -> usize {
        self.state.lock().unwrap().tasks.len()
    }

    pub fn is_idle(&self) -> bool {
        !self.state.lock().unwrap().worker_running
    }

    /// Wait until the queue has fully emptied and its worker has exited.
    pub async fn drain(&self) {
        loop {
            let notified = self.idle.notified();
            tokio::pin!(notified);
            // Register before checking, so a notify between the check and the
            // await is not lost.
            notified.as_mut().enable();
            if self.is_idle() {
                return;
            }
            notified.await;
        }
    }
}

impl Default for SerialQueue {
    fn default() -> Self {
        Self::new()
    }
}
