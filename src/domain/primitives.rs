//! Domain primitives: Timestamp and identity re-exports.

use serde::{Deserialize, Serialize};

pub use alloy_primitives::{Address, B256};

/// Block timestamp in seconds since Unix epoch.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Timestamp(pub u64);

impl Timestamp {
    /// Create a Timestamp from seconds.
    pub fn new(secs: u64) -> Self {
        Timestamp(secs)
    }

    /// Get the underlying seconds value.
    pub fn as_secs(&self) -> u64 {
        self.0
    }

    /// Timestamp advanced by `secs`, saturating at `u64::MAX`.
    pub fn saturating_add(&self, secs: u64) -> Self {
        Timestamp(self.0.saturating_add(secs))
    }

    /// SQLite only stores signed 64-bit integers.
    pub fn as_i64(&self) -> i64 {
        i64::try_from(self.0).unwrap_or(i64::MAX)
    }

    pub fn from_i64(secs: i64) -> Self {
        Timestamp(u64::try_from(secs).unwrap_or(0))
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
