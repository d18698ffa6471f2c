//! Integer amount helpers for token-scaled quantities.
//!
//! Every amount is an integer already scaled by its asset's decimals. Amounts
//! cross text boundaries (SQLite, JSON) as base-10 strings so no precision is
//! lost.

use alloy_primitives::{I256, U256};
use rust_decimal::Decimal;
use std::str::FromStr;

/// Largest decimals value whose `10^decimals` fits in a U256.
pub const MAX_DECIMALS: u8 = 77;

/// `10^decimals`, or None when it does not fit in 256 bits.
pub fn pow10(decimals: u8) -> Option<U256> {
    U256::from(10u64).checked_pow(U256::from(decimals))
}

/// Widen an unsigned amount into the signed domain, saturating at `I256::MAX`.
pub fn to_signed(value: U256) -> I256 {
    I256::try_from(value).unwrap_or(I256::MAX)
}

/// Parse a base-10 unsigned amount.
pub fn parse_u256(s: &str) -> Result<U256, alloy_primitives::ruint::ParseError> {
    U256::from_str_radix(s.trim(), 10)
}

/// Parse a base-10 signed amount.
pub fn parse_i256(s: &str) -> Result<I256, alloy_primitives::ParseSignedError> {
    I256::from_dec_str(s.trim())
}

/// Render an integer amount in whole units (e.g. `1500000` with 6 decimals is `1.5`).
///
/// Returns None when the value does not fit a `rust_decimal::Decimal`.
pub fn to_display_decimal(value: U256, decimals: u8) -> Option<Decimal> {
    let limbs = value.as_limbs();
    if limbs[2] != 0 || limbs[3] != 0 {
        return None;
    }
    let raw = (u128::from(limbs[1]) << 64) | u128::from(limbs[0]);
    let raw = i128::try_from(raw).ok()?;
    Decimal::try_from_i128_with_scale(raw, u32::from(decimals))
        .ok()
        .map(|d| d.normalize())
}

/// Signed variant of [`to_display_decimal`].
pub fn to_display_decimal_signed(value: I256, decimals: u8) -> Option<Decimal> {
    let magnitude = to_display_decimal(value.unsigned_abs(), decimals)?;
    if value.is_negative() {
        Some(-magnitude)
    } else {
        Some(magnitude)
    }
}

/// Serde adapter: U256 as a base-10 string.
pub mod dec_u256 {
    use super::*;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
        let s = String::deserialize(deserializer)?;
        if let Some(hex) = s.strip_prefix("0x") {
            return U256::from_str_radix(hex, 16).map_err(de::Error::custom);
        }
        parse_u256(&s).map_err(de::Error::custom)
    }
}

/// Serde adapter: I256 as a base-10 string.
pub mod dec_i256 {
    use super::*;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &I256, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<I256, D::Error> {
        let s = String::deserialize(deserializer)?;
        I256::from_str(s.trim()).map_err(de::Error::custom)
    }
}
