//! Fallback values for failed metadata reads.

use super::OracleResult;
use crate::domain::Address;
use alloy_primitives::U256;
use tracing::warn;

/// Defaults substituted field by field when a registry read fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetadataDefaults {
    pub name: &'static str,
    pub symbol: &'static str,
    pub decimals: u8,
    pub asset: Address,
    pub price_per_share: U256,
    pub performance_fee_bps: u16,
}

pub const VAULT_DEFAULTS: MetadataDefaults = MetadataDefaults {
    name: "Unknown Vault",
    symbol: "UNKNOWN",
    decimals: 18,
    asset: Address::ZERO,
    price_per_share: U256::ZERO,
    performance_fee_bps: 0,
};

pub const STRATEGY_DEFAULTS: MetadataDefaults = MetadataDefaults {
    name: "Unknown Strategy",
    symbol: "UNKNOWN",
    decimals: 18,
    asset: Address::ZERO,
    price_per_share: U256::ZERO,
    performance_fee_bps: 0,
};

/// Unwrap a read or fall back to `default`, logging the substitution.
pub fn or_default<T>(read: OracleResult<T>, default: T, field: &str, contract: Address) -> T {
    match read {
        Ok(value) => value,
        Err(e) => {
            warn!(
                contract = %contract,
                field,
                error = %e,
                "Oracle read failed, using default"
            );
            default
        }
    }
}

impl MetadataDefaults {
    pub fn name(&self, read: OracleResult<String>, contract: Address) -> String {
        or_default(read, self.name.to_string(), "name", contract)
    }

    pub fn symbol(&self, read: OracleResult<String>, contract: Address) -> String {
        or_default(read, self.symbol.to_string(), "symbol", contract)
    }

    pub fn decimals(&self, read: OracleResult<u8>, contract: Address) -> u8 {
        or_default(read, self.decimals, "decimals", contract)
    }

    pub fn asset(&self, read: OracleResult<Address>, contract: Address) -> Address {
        or_default(read, self.asset, "asset", contract)
    }

    pub fn price_per_share(&self, read: OracleResult<U256>, contract: Address) -> U256 {
        or_default(read, self.price_per_share, "pricePerShare", contract)
    }

    pub fn performance_fee_bps(&self, read: OracleResult<u16>, contract: Address) -> u16 {
        or_default(read, self.performance_fee_bps, "performanceFee", contract)
    }
}
