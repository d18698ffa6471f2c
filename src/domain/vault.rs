//! Vault record.

use crate::domain::{Address, SnapshotKind, Timestamp};
use alloy_primitives::{I256, U256};

/// Running financial state of a vault, keyed by contract address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vault {
    pub address: Address,
    pub name: String,
    pub symbol: String,
    /// Native asset the vault accounts in.
    pub asset: Address,
    pub decimals: u8,
    pub total_assets: U256,
    pub total_supply: U256,
    /// Native price-per-share, last known value. Zero means never observed.
    pub price_per_share: U256,
    /// Reference-unit price-per-share, last known value. Zero means never observed.
    pub price_per_share_reference: U256,
    pub total_deposited: U256,
    pub total_withdrawn: U256,
    /// Cumulative realized PnL in reference units across strategy reports.
    pub realized_pnl_reference: I256,
    pub total_gain: U256,
    pub total_loss: U256,
    pub total_fees: U256,
    pub total_refunds: U256,
    /// Attached strategies in queue order. The first one is the default strategy.
    pub strategies: Vec<Address>,
    pub is_shutdown: bool,
    pub last_updated: Timestamp,
    pub last_hourly_snapshot: Timestamp,
    pub last_daily_snapshot: Timestamp,
    pub last_weekly_snapshot: Timestamp,
}

impl Vault {
    /// A vault with zeroed aggregates.
    pub fn new(address: Address, name: String, symbol: String, asset: Address, decimals: u8) -> Self {
        Self {
            address,
            name,
            symbol,
            asset,
            decimals,
            total_assets: U256::ZERO,
            total_supply: U256::ZERO,
            price_per_share: U256::ZERO,
            price_per_share_reference: U256::ZERO,
            total_deposited: U256::ZERO,
            total_withdrawn: U256::ZERO,
            realized_pnl_reference: I256::ZERO,
            total_gain: U256::ZERO,
            total_loss: U256::ZERO,
            total_fees: U256::ZERO,
            total_refunds: U256::ZERO,
            strategies: Vec::new(),
            is_shutdown: false,
            last_updated: Timestamp::default(),
            last_hourly_snapshot: Timestamp::default(),
            last_daily_snapshot: Timestamp::default(),
            last_weekly_snapshot: Timestamp::default(),
        }
    }

    /// The strategy that supplies the native to reference conversion rate.
    pub fn default_strategy(&self) -> Option<Address> {
        self.strategies.first().copied()
    }

    /// Append a strategy to the queue. Returns false if it was already attached.
    pub fn attach_strategy(&mut self, strategy: Address) -> bool {
        if self.strategies.contains(&strategy) {
            return false;
        }
        self.strategies.push(strategy);
        true
    }

    /// Remove a strategy from the queue. Returns false if it was not attached.
    pub fn detach_strategy(&mut self, strategy: Address) -> bool {
        let before = self.strategies.len();
        self.strategies.retain(|s| *s != strategy);
        self.strategies.len() != before
    }

    pub fn last_snapshot(&self, kind: SnapshotKind) -> Timestamp {
        match kind {
            SnapshotKind::Hourly => self.last_hourly_snapshot,
            SnapshotKind::Daily => self.last_daily_snapshot,
            SnapshotKind::Weekly => self.last_weekly_snapshot,
        }
    }

    pub fn set_last_snapshot(&mut self, kind: SnapshotKind, at: Timestamp) {
        match kind {
            SnapshotKind::Hourly => self.last_hourly_snapshot = at,
            SnapshotKind::Daily => self.last_daily_snapshot = at,
            SnapshotKind::Weekly => self.last_weekly_snapshot = at,
        }
    }
}
