//! Per-depositor position in a vault.

use crate::domain::{Address, Timestamp};
use alloy_primitives::{I256, U256};

/// Weighted-average-cost position of one participant in one vault.
///
/// Zero-share positions are kept as history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserVaultPosition {
    pub user: Address,
    pub vault: Address,
    pub current_shares: U256,
    /// Weighted-average native price-per-share paid.
    pub avg_price_per_share: U256,
    /// Weighted-average reference-unit price-per-share paid.
    pub avg_price_per_share_reference: U256,
    pub total_deposited: U256,
    pub total_withdrawn: U256,
    pub total_deposited_reference: U256,
    pub total_withdrawn_reference: U256,
    pub realized_pnl: I256,
    pub realized_pnl_reference: I256,
    pub last_updated: Timestamp,
}

impl UserVaultPosition {
    pub fn new(user: Address, vault: Address) -> Self {
        Self {
            user,
            vault,
            current_shares: U256::ZERO,
            avg_price_per_share: U256::ZERO,
            avg_price_per_share_reference: U256::ZERO,
            total_deposited: U256::ZERO,
            total_withdrawn: U256::ZERO,
            total_deposited_reference: U256::ZERO,
            total_withdrawn_reference: U256::ZERO,
            realized_pnl: I256::ZERO,
            realized_pnl_reference: I256::ZERO,
            last_updated: Timestamp::default(),
        }
    }

    /// Storage key, `<user>-<vault>`.
    pub fn key(&self) -> String {
        format!("{}-{}", self.user, self.vault)
    }

    pub fn is_closed(&self) -> bool {
        self.current_shares.is_zero()
    }
}
