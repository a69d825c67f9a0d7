//! In-process serialization primitives for outbound blockchain transactions.
//!
//! Account-based chains reject two transactions carrying the same nonce, so a
//! process that reads "next nonce" from a node and submits concurrently will
//! race itself. The primitives here force at most one submission in flight per
//! resource: [`ChainLockManager`] is a keyed async mutex over chain ids,
//! [`SerialQueue`] is a single global FIFO lane with pacing between items, and
//! [`KeyedQueue`] combines both: per-key FIFO lanes with full concurrency
//! across distinct keys.
//!
//! All state is confined to the current process. Nothing survives a restart,
//! and horizontally scaled deployments do not share serialization state.

pub mod error;
pub mod keyed;
pub mod lock;
pub mod queue;
pub mod shutdown;

pub use error::TxmqError;
pub use keyed::KeyedQueue;
pub use lock::ChainLockManager;
pub use queue::{QueueOptions, QueuedResult, SerialQueue};
pub use shutdown::DrainHandle;
