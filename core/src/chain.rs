use alloy::{
    providers::{ProviderBuilder, RootProvider},
    transports::http::reqwest::Url,
};

use crate::error::FaucetError;

/// An EVM network the faucet can submit to.
pub trait Chain: Send + Sync {
    fn chain_id(&self) -> u64;
    fn rpc_url(&self) -> Url;
    fn provider(&self) -> &RootProvider;
}

/// Chain backed by a plain HTTP JSON-RPC endpoint.
#[derive(Clone, Debug)]
pub struct HttpChain {
    chain_id: u64,
    rpc_url: Url,
    provider: RootProvider,
}

impl HttpChain {
    pub fn new(chain_id: u64, rpc_url: &str) -> Result<Self, FaucetError> {
        let rpc_url = Url::parse(rpc_url).map_err(|e| FaucetError::RpcConfigError {
            message: format!("Failed to parse RPC URL: {e}"),
        })?;

        let provider = ProviderBuilder::new()
            .disable_recommended_fillers()
            .connect_http(rpc_url.clone());

        Ok(Self {
            chain_id,
            rpc_url,
            provider,
        })
    }
}

impl Chain for HttpChain {
    fn chain_id(&self) -> u64 {
        self.chain_id
    }

    fn rpc_url(&self) -> Url {
        self.rpc_url.clone()
    }

    fn provider(&self) -> &RootProvider {
        &self.provider
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_malformed_rpc_url() {
        let err = HttpChain::new(1, "not a url").unwrap_err();
        match err {
            FaucetError::RpcConfigError { .. } => {}
            other => panic!("expected RpcConfigError, got {other:?}"),
        }
    }

    #[test]
    fn exposes_chain_id_and_url() {
        let chain = HttpChain::new(11155111, "https://rpc.sepolia.example/").unwrap();
        assert_eq!(chain.chain_id(), 11155111);
        assert_eq!(chain.rpc_url().as_str(), "https://rpc.sepolia.example/");
    }
}
