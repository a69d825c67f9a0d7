use futures::future::BoxFuture;

/// Handle for coordinating shutdown across multiple queues.
///
/// Queue workers exit on their own once their backlog empties; graceful
/// shutdown is therefore just waiting for every queue to drain before the
/// process stops accepting work.
pub struct DrainHandle<'a> {
    drains: Vec<BoxFuture<'a, ()>>,
}

impl<'a> DrainHandle<'a> {
    pub fn new() -> Self {
        Self { drains: Vec::new() }
    }

    /// Add a queue's drain future to be awaited on shutdown.
    pub fn add<F>(&mut self, drain: F)
    where
        F: Future<Output = ()> + Send + 'a,
    {
        self.drains.push(Box::pin(drain));
    }

    pub fn queue_count(&self) -> usize {
        self.drains.len()
    }

    /// Wait for all registered queues to empty.
    pub async fn drain(self) {
        let count = self.drains.len();
        tracing::info!(queues = count, "waiting for queues to drain");
        futures::future::join_all(self.drains).await;
        tracing::info!(queues = count, "all queues drained");
    }
}

impl Default for DrainHandle<'_> {
    fn default() -> Self {
        Self::new()
    }
}
