//! Strategy record and strategy report history.

use crate::domain::{Address, Timestamp, B256};
use alloy_primitives::U256;

/// Running state of a strategy, keyed by contract address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Strategy {
    pub address: Address,
    /// Owning vault. None is the unassigned sentinel (never attached, or revoked).
    pub vault: Option<Address>,
    pub name: String,
    pub symbol: String,
    pub asset: Address,
    pub decimals: u8,
    pub total_assets: U256,
    pub total_supply: U256,
    pub total_collateral: U256,
    pub total_debt: U256,
    /// Debt the owning vault reported against this strategy.
    pub current_debt: U256,
    pub price_per_share: U256,
    pub performance_fee_bps: u16,
    pub total_profit: U256,
    pub total_loss: U256,
    pub total_protocol_fees: U256,
    pub total_performance_fees: U256,
    pub is_active: bool,
    pub last_report: Timestamp,
}

impl Strategy {
    /// A strategy with zeroed aggregates, unassigned and active.
    pub fn new(address: Address, name: String, symbol: String, asset: Address, decimals: u8) -> Self {
        Self {
            address,
            vault: None,
            name,
            symbol,
            asset,
            decimals,
            total_assets: U256::ZERO,
            total_supply: U256::ZERO,
            total_collateral: U256::ZERO,
            total_debt: U256::ZERO,
            current_debt: U256::ZERO,
            price_per_share: U256::ZERO,
            performance_fee_bps: 0,
            total_profit: U256::ZERO,
            total_loss: U256::ZERO,
            total_protocol_fees: U256::ZERO,
            total_performance_fees: U256::ZERO,
            is_active: true,
            last_report: Timestamp::default(),
        }
    }

    pub fn is_assigned(&self) -> bool {
        self.vault.is_some()
    }
}

/// Balances a leveraged strategy reports for itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StrategyBalances {
    pub total_assets: U256,
    pub total_collateral: U256,
    pub total_debt: U256,
}

/// Immutable record of a vault-side strategy report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyReport {
    pub vault: Address,
    pub strategy: Address,
    pub tx_hash: B256,
    pub log_index: u64,
    pub gain: U256,
    pub loss: U256,
    pub current_debt: U256,
    pub timestamp: Timestamp,
}
