#[derive(thiserror::Error, Debug)]
pub enum TxmqError {
    /// The worker dropped a task's result channel before settling it. This
    /// only happens when the runtime is torn down while tasks are queued.
    #[error("queue worker was lost before the task completed")]
    WorkerLost,
}
