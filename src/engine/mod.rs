//! Pure computation engine(s) for deterministic ledger logic.

use crate::domain::Address;
use alloy_primitives::U256;
use thiserror::Error;

pub mod ledger;
pub mod scheduler;
pub mod valuation;

pub use ledger::{Movement, PositionLedger, PriceContext, Realized};
pub use scheduler::{BucketDurations, SnapshotPolicy, SnapshotScheduler};
pub use valuation::{convert_native_to_reference, pnl_delta, weighted_average};

/// An event that contradicts the stored state, pointing at an upstream
/// ordering or integrity problem. The affected position is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsistencyFault {
    #[error("withdrawal for {participant} in vault {vault} has no position")]
    MissingPosition { participant: Address, vault: Address },

    #[error("{participant} withdrew {requested} shares from vault {vault} but holds {held}")]
    InsufficientShares {
        participant: Address,
        vault: Address,
        held: U256,
        requested: U256,
    },
}
