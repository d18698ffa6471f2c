//! Protocol-wide registry aggregate.

use crate::domain::Address;
use serde::{Deserialize, Serialize};

/// Singleton list of every known vault and strategy, in registration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolStats {
    pub vaults: Vec<Address>,
    pub strategies: Vec<Address>,
}

impl ProtocolStats {
    /// Storage key of the singleton row.
    pub const ID: &'static str = "0";

    /// Returns true if the vault was newly appended.
    pub fn register_vault(&mut self, vault: Address) -> bool {
        if self.vaults.contains(&vault) {
            return false;
        }
        self.vaults.push(vault);
        true
    }

    /// Returns true if the strategy was newly appended.
    pub fn register_strategy(&mut self, strategy: Address) -> bool {
        if self.strategies.contains(&strategy) {
            return false;
        }
        self.strategies.push(strategy);
        true
    }
}
