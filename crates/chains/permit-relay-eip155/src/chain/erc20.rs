use alloy_primitives::{Address, U256};
use alloy_provider::Provider;
use alloy_sol_types::sol;
use async_trait::async_trait;

sol!(
    #[allow(missing_docs)]
    #[derive(Debug)]
    #[sol(rpc)]
    interface IERC20Permit {
        function name() external view returns (string);
        function version() external view returns (string);
        function decimals() external view returns (uint8);
        function nonces(address owner) external view returns (uint256);
        function balanceOf(address account) external view returns (uint256);
    }
);

/// A failed chain read.
#[derive(Debug, thiserror::Error)]
#[error("{method} call failed: {source}")]
pub struct TokenReadError {
    /// The contract method (or RPC method) that failed.
    pub method: &'static str,
    #[source]
    pub source: Box<dyn std::error::Error + Send + Sync>,
}

impl TokenReadError {
    pub fn new<E>(method: &'static str, source: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self {
            method,
            source: source.into(),
        }
    }
}

/// Chain-reading capability needed to construct a permit.
///
/// Implemented by [`ProviderTokenReader`] for real chains; tests provide
/// in-memory implementations.
#[async_trait]
pub trait TokenReader {
    /// EIP-155 chain id of the connected chain.
    async fn chain_id(&self) -> Result<u64, TokenReadError>;
    /// ERC-20 `name()`.
    async fn name(&self, token: Address) -> Result<String, TokenReadError>;
    /// EIP-712 domain `version()`. Older tokens do not implement it.
    async fn version(&self, token: Address) -> Result<String, TokenReadError>;
    /// ERC-20 `decimals()`.
    async fn decimals(&self, token: Address) -> Result<u8, TokenReadError>;
    /// ERC-2612 `nonces(owner)`.
    async fn nonces(&self, token: Address, owner: Address) -> Result<U256, TokenReadError>;
    /// ERC-20 `balanceOf(owner)`.
    async fn balance_of(&self, token: Address, owner: Address) -> Result<U256, TokenReadError>;
}

#[async_trait]
impl<T: TokenReader + Sync + ?Sized> TokenReader for &T {
    async fn chain_id(&self) -> Result<u64, TokenReadError> {
        (**self).chain_id().await
    }

    async fn name(&self, token: Address) -> Result<String, TokenReadError> {
        (**self).name(token).await
    }

    async fn version(&self, token: Address) -> Result<String, TokenReadError> {
        (**self).version(token).await
    }

    async fn decimals(&self, token: Address) -> Result<u8, TokenReadError> {
        (**self).decimals(token).await
    }

    async fn nonces(&self, token: Address, owner: Address) -> Result<U256, TokenReadError> {
        (**self).nonces(token, owner).await
    }

    async fn balance_of(&self, token: Address, owner: Address) -> Result<U256, TokenReadError> {
        (**self).balance_of(token, owner).await
    }
}

/// [`TokenReader`] backed by an alloy [`Provider`].
#[derive(Debug, Clone)]
pub struct ProviderTokenReader<P> {
    provider: P,
}

impl<P> ProviderTokenReader<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<P> TokenReader for ProviderTokenReader<P>
where
    P: Provider + Clone + Send + Sync,
{
    async fn chain_id(&self) -> Result<u64, TokenReadError> {
        self.provider
            .get_chain_id()
            .await
            .map_err(|e| TokenReadError::new("eth_chainId", e))
    }

    async fn name(&self, token: Address) -> Result<String, TokenReadError> {
        let contract = IERC20Permit::new(token, self.provider.clone());
        contract
            .name()
            .call()
            .await
            .map_err(|e| TokenReadError::new("name", e))
    }

    async fn version(&self, token: Address) -> Result<String, TokenReadError> {
        let contract = IERC20Permit::new(token, self.provider.clone());
        contract
            .version()
            .call()
            .await
            .map_err(|e| TokenReadError::new("version", e))
    }

    async fn decimals(&self, token: Address) -> Result<u8, TokenReadError> {
        let contract = IERC20Permit::new(token, self.provider.clone());
        contract
            .decimals()
            .call()
            .await
            .map_err(|e| TokenReadError::new("decimals", e))
    }

    async fn nonces(&self, token: Address, owner: Address) -> Result<U256, TokenReadError> {
        let contract = IERC20Permit::new(token, self.provider.clone());
        contract
            .nonces(owner)
            .call()
            .await
            .map_err(|e| TokenReadError::new("nonces", e))
    }

    async fn balance_of(&self, token: Address, owner: Address) -> Result<U256, TokenReadError> {
        let contract = IERC20Permit::new(token, self.provider.clone());
        contract
            .balanceOf(owner)
            .call()
            .await
            .map_err(|e| TokenReadError::new("balanceOf", e))
    }
}
