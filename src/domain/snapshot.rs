//! Time-bucketed vault snapshots.

use crate::domain::{Address, Timestamp};
use alloy_primitives::U256;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Snapshot bucket kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotKind {
    Hourly,
    Daily,
    Weekly,
}

impl SnapshotKind {
    /// Evaluation order: finest bucket first.
    pub const ALL: [SnapshotKind; 3] = [
        SnapshotKind::Hourly,
        SnapshotKind::Daily,
        SnapshotKind::Weekly,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SnapshotKind::Hourly => "hourly",
            SnapshotKind::Daily => "daily",
            SnapshotKind::Weekly => "weekly",
        }
    }
}

impl std::fmt::Display for SnapshotKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SnapshotKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "hourly" => Ok(SnapshotKind::Hourly),
            "daily" => Ok(SnapshotKind::Daily),
            "weekly" => Ok(SnapshotKind::Weekly),
            other => Err(format!("unknown snapshot kind: {}", other)),
        }
    }
}

/// Immutable capture of vault state at a bucket boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultSnapshot {
    pub vault: Address,
    pub kind: SnapshotKind,
    pub timestamp: Timestamp,
    pub block_number: u64,
    pub price_per_share: U256,
    pub price_per_share_reference: U256,
    pub total_assets: U256,
    /// Yield-rate placeholders, always zero for now.
    pub deposit_apy: Decimal,
    pub borrow_apy: Decimal,
}

impl VaultSnapshot {
    /// Storage key, `<vault>-<timestamp>-<kind>`.
    pub fn key(&self) -> String {
        format!("{}-{}-{}", self.vault, self.timestamp, self.kind)
    }
}
