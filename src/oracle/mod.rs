//! Oracle abstraction for on-chain metadata and price reads.
//!
//! Every read is independently fallible. The ledger never propagates an
//! [`OracleError`]: it substitutes a default from [`defaults`] or skips the
//! dependent update for the current event.

use crate::domain::{Address, StrategyBalances};
use alloy_primitives::U256;
use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

pub mod defaults;
pub mod mock;
pub mod rpc;

pub use defaults::{MetadataDefaults, STRATEGY_DEFAULTS, VAULT_DEFAULTS};
pub use mock::{MockContract, MockOracle};
pub use rpc::RpcOracle;

pub type OracleResult<T> = Result<T, OracleError>;

/// Read-only view of vault and strategy contracts.
///
/// Implementations own their timeouts and transport retries; to the ledger a
/// read either returns a value or fails, with no partial result.
#[async_trait]
pub trait Oracle: Send + Sync + fmt::Debug {
    async fn name(&self, contract: Address) -> OracleResult<String>;

    async fn symbol(&self, contract: Address) -> OracleResult<String>;

    async fn decimals(&self, contract: Address) -> OracleResult<u8>;

    /// Native asset of a vault or strategy.
    async fn asset(&self, contract: Address) -> OracleResult<Address>;

    /// Current native price-per-share, scaled by the contract's decimals.
    async fn price_per_share(&self, contract: Address) -> OracleResult<U256>;

    async fn total_assets(&self, contract: Address) -> OracleResult<U256>;

    async fn total_supply(&self, contract: Address) -> OracleResult<U256>;

    async fn performance_fee(&self, strategy: Address) -> OracleResult<u16>;

    /// Convert `amount` of the strategy's native asset into reference units.
    async fn convert_native_to_reference(
        &self,
        strategy: Address,
        amount: U256,
    ) -> OracleResult<U256>;

    /// Real asset balances of a leveraged strategy.
    async fn strategy_balances(&self, strategy: Address) -> OracleResult<StrategyBalances>;
}

/// Error type for oracle reads.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OracleError {
    /// The call reverted or the method is not implemented by the contract.
    #[error("Call reverted: {0}")]
    Reverted(String),
    /// Network error (e.g., connection timeout, DNS failure)
    #[error("Network error: {0}")]
    Network(String),
    /// HTTP error from the RPC endpoint
    #[error("HTTP error {status}: {message}")]
    Http { status: u16, message: String },
    /// Malformed or unexpected return data
    #[error("Decode error: {0}")]
    Decode(String),
    #[error("Rate limited")]
    RateLimited,
}
