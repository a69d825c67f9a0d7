use alloy::{primitives::Address, providers::Provider, transports::TransportError};

use crate::{
    chain::{Chain, HttpChain},
    error::{AlloyRpcErrorToFaucetError, FaucetError},
};

/// Extension trait for providers to read the candidate next nonce.
///
/// The value is the node's pending transaction count, read fresh on every
/// call and never cached. It is advisory: serialization correctness comes
/// from the lock/queue wrapping the submission, not from this read.
pub trait PendingNonce {
    fn pending_nonce(
        &self,
        address: Address,
    ) -> impl Future<Output = Result<u64, TransportError>> + Send;
}

impl<P> PendingNonce for P
where
    P: Provider,
{
    async fn pending_nonce(&self, address: Address) -> Result<u64, TransportError> {
        self.get_transaction_count(address).pending().await
    }
}

/// Seam between submission logic and the network: anything that can produce
/// the next nonce for an address.
pub trait NonceSource: Send + Sync {
    fn next_nonce(
        &self,
        address: Address,
    ) -> impl Future<Output = Result<u64, FaucetError>> + Send;
}

impl NonceSource for HttpChain {
    async fn next_nonce(&self, address: Address) -> Result<u64, FaucetError> {
        self.provider()
            .pending_nonce(address)
            .await
            .map_err(|e| e.to_faucet_error(self))
    }
}
