//! Time-bucket gating for vault snapshots.

use crate::domain::{SnapshotKind, Timestamp, Vault, VaultSnapshot};
use alloy_primitives::U256;
use rust_decimal::Decimal;
use std::str::FromStr;

/// How bucket kinds interact within one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SnapshotPolicy {
    /// Every elapsed bucket fires.
    #[default]
    Independent,
    /// Only the first elapsed bucket, in hourly, daily, weekly order, fires.
    FirstMatch,
}

impl FromStr for SnapshotPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "independent" => Ok(Self::Independent),
            "first_match" | "first-match" => Ok(Self::FirstMatch),
            other => Err(format!("unknown snapshot policy: {}", other)),
        }
    }
}

/// Bucket lengths in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketDurations {
    pub hourly: u64,
    pub daily: u64,
    pub weekly: u64,
}

impl Default for BucketDurations {
    fn default() -> Self {
        Self {
            hourly: 3_600,
            daily: 86_400,
            weekly: 604_800,
        }
    }
}

impl BucketDurations {
    pub fn of(&self, kind: SnapshotKind) -> u64 {
        match kind {
            SnapshotKind::Hourly => self.hourly,
            SnapshotKind::Daily => self.daily,
            SnapshotKind::Weekly => self.weekly,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SnapshotScheduler {
    policy: SnapshotPolicy,
    durations: BucketDurations,
}

impl SnapshotScheduler {
    pub fn new(policy: SnapshotPolicy, durations: BucketDurations) -> Self {
        Self { policy, durations }
    }

    pub fn policy(&self) -> SnapshotPolicy {
        self.policy
    }

    /// Bucket kinds whose duration has strictly elapsed since their last snapshot.
    pub fn due(&self, vault: &Vault, at: Timestamp) -> Vec<SnapshotKind> {
        let mut due = Vec::new();
        for kind in SnapshotKind::ALL {
            let next = vault
                .last_snapshot(kind)
                .saturating_add(self.durations.of(kind));
            if next < at {
                due.push(kind);
                if self.policy == SnapshotPolicy::FirstMatch {
                    break;
                }
            }
        }
        due
    }

    /// Emit the due snapshots and advance their timers to `at`.
    ///
    /// Missed intervals are not backfilled.
    pub fn capture(
        &self,
        vault: &mut Vault,
        at: Timestamp,
        block_number: u64,
        total_assets: U256,
    ) -> Vec<VaultSnapshot> {
        self.due(vault, at)
            .into_iter()
            .map(|kind| {
                vault.set_last_snapshot(kind, at);
                VaultSnapshot {
                    vault: vault.address,
                    kind,
                    timestamp: at,
                    block_number,
                    price_per_share: vault.price_per_share,
                    price_per_share_reference: vault.price_per_share_reference,
                    total_assets,
                    deposit_apy: Decimal::ZERO,
                    borrow_apy: Decimal::ZERO,
                }
            })
            .collect()
    }
}
