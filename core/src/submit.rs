use std::sync::Arc;

use alloy::primitives::Address;
use txmq::{ChainLockManager, KeyedQueue, QueueOptions};

use crate::{
    error::FaucetError,
    nonce::NonceSource,
    retry::{NonceRetryConfig, with_nonce_retry},
};

/// Lock-based serialized submission: at most one in-flight submission per
/// chain id, a fresh pending nonce for every attempt, and nonce-conflict
/// retries around the caller's send.
///
/// This is the surface the faucet request handlers consume; they supply the
/// actual signing and broadcast in `send`.
pub struct SerializedSubmitter {
    locks: Arc<ChainLockManager>,
    retry: NonceRetryConfig,
}

impl SerializedSubmitter {
    pub fn new(retry: NonceRetryConfig) -> Self {
        Self {
            locks: Arc::new(ChainLockManager::new()),
            retry,
        }
    }

    pub async fn submit<S, T, F, Fut>(
        &self,
        chain_id: u64,
        nonces: &S,
        from: Address,
        send: F,
    ) -> Result<T, FaucetError>
    where
        S: NonceSource,
        F: Fn(u64) -> Fut,
        Fut: Future<Output = Result<T, FaucetError>>,
    {
        self.locks
            .with_lock(chain_id, || async {
                with_nonce_retry(&self.retry, || async {
                    let nonce = nonces.next_nonce(from).await?;
                    tracing::debug!(chain_id, %from, nonce, "submitting with fresh nonce");
                    send(nonce).await
                })
                .await
            })
            .await
    }
}

impl Default for SerializedSubmitter {
    fn default() -> Self {
        Self::new(NonceRetryConfig::default())
    }
}

/// Queue-based serialized submission: every chain gets its own FIFO lane, so
/// submissions for one chain run alone and in arrival order while other
/// chains proceed in parallel. Lane pacing gives the node time to observe a
/// submission before the next one reads its nonce.
pub struct QueuedSubmitter {
    lanes: Arc<KeyedQueue>,
    retry: NonceRetryConfig,
}

impl QueuedSubmitter {
    pub fn new(options: QueueOptions, retry: NonceRetryConfig) -> Self {
        Self {
            lanes: KeyedQueue::with_options(options).arc(),
            retry,
        }
    }

    pub async fn submit<S, T, F, Fut>(
        &self,
        chain_id: u64,
        nonces: Arc<S>,
        from: Address,
        send: F,
    ) -> Result<T, FaucetError>
    where
        S: NonceSource + 'static,
        T: Send + 'static,
        F: Fn(u64) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, FaucetError>> + Send + 'static,
    {
        let retry = self.retry.clone();
        self.lanes
            .enqueue(chain_id, move || async move {
                with_nonce_retry(&retry, || async {
                    let nonce = nonces.next_nonce(from).await?;
                    tracing::debug!(chain_id, %from, nonce, "submitting with fresh nonce");
                    send(nonce).await
                })
                .await
            })
            .wait()
            .await?
    }

    /// Wait for all lanes to empty, for graceful shutdown.
    pub async fn drain(&self) {
        self.lanes.drain().await;
    }
}
