pub mod client;
pub mod types;

use async_trait::async_trait;

use crate::error::Result;

pub use client::AlchemyClient;
pub use types::{ResolvedMetadata, TokenMetadata, UNKNOWN_TOKEN_NAME, UNKNOWN_TOKEN_SYMBOL};

/// Source of token balances and metadata for eligibility checks.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BalanceProvider: Send + Sync {
    /// Raw hex balance of `contract` held by `address`, `None` when the
    /// provider has no entry for it.
    async fn get_token_balance(&self, address: &str, contract: &str) -> Result<Option<String>>;

    async fn get_token_metadata(&self, contract: &str) -> Result<TokenMetadata>;
}
