//! Native to reference conversion and price-delta PnL.

use crate::domain::amount::{pow10, to_signed};
use crate::domain::Address;
use crate::oracle::Oracle;
use alloy_primitives::{I256, U256};
use tracing::warn;

/// Convert a native amount into reference units through `strategy`.
///
/// A failed read yields zero, meaning "no conversion this tick".
pub async fn convert_native_to_reference(
    oracle: &dyn Oracle,
    strategy: Address,
    amount: U256,
) -> U256 {
    match oracle.convert_native_to_reference(strategy, amount).await {
        Ok(converted) => converted,
        Err(e) => {
            warn!(
                strategy = %strategy,
                amount = %amount,
                error = %e,
                "Reference conversion failed"
            );
            U256::ZERO
        }
    }
}

/// `(current - previous) * units / 10^decimals`, truncated toward zero.
///
/// The magnitude saturates instead of wrapping when the product does not fit.
pub fn pnl_delta(previous: U256, current: U256, units: U256, decimals: u8) -> I256 {
    let Some(scale) = pow10(decimals) else {
        warn!(decimals, "Decimals out of range, PnL delta dropped");
        return I256::ZERO;
    };

    let (diff, negative) = if current >= previous {
        (current - previous, false)
    } else {
        (previous - current, true)
    };

    let magnitude = match diff.checked_mul(units) {
        Some(product) => product / scale,
        None => {
            warn!(diff = %diff, units = %units, "PnL product overflow, saturating");
            U256::MAX
        }
    };

    let signed = to_signed(magnitude);
    if negative {
        -signed
    } else {
        signed
    }
}

/// Running average after adding `added` units at `price` to `held` units at `avg`.
///
/// `None` when the new total is zero or the weighted sum overflows.
pub fn weighted_average(avg: U256, held: U256, price: U256, added: U256) -> Option<U256> {
    let total = held.checked_add(added)?;
    if total.is_zero() {
        return None;
    }
    let weighted = avg
        .checked_mul(held)?
        .checked_add(price.checked_mul(added)?)?;
    Some(weighted / total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::{MockContract, MockOracle};

    fn e18(n: u64) -> U256 {
        U256::from(n) * pow10(18).unwrap()
    }

    fn tenths(n: u64) -> U256 {
        U256::from(n) * pow10(17).unwrap()
    }

    #[test]
    fn test_pnl_delta_positive() {
        // (1.2 - 1.0) * 500 = 100
        let delta = pnl_delta(e18(1), tenths(12), e18(500), 18);
        assert_eq!(delta, to_signed(e18(100)));
    }

    #[test]
    fn test_pnl_delta_negative() {
        let delta = pnl_delta(tenths(12), e18(1), e18(500), 18);
        assert_eq!(delta, -to_signed(e18(100)));
    }

    #[test]
    fn test_pnl_delta_truncates_toward_zero() {
        // 7 * 1 / 10 = 0.7 -> 0 in both directions
        assert_eq!(
            pnl_delta(U256::ZERO, U256::from(7u64), U256::from(1u64), 1),
            I256::ZERO
        );
        assert_eq!(
            pnl_delta(U256::from(7u64), U256::ZERO, U256::from(1u64), 1),
            I256::ZERO
        );
        // 15 * 1 / 10 = 1.5 -> 1 and -1
        assert_eq!(
            pnl_delta(U256::ZERO, U256::from(15u64), U256::from(1u64), 1),
            I256::try_from(1i64).unwrap()
        );
        assert_eq!(
            pnl_delta(U256::from(15u64), U256::ZERO, U256::from(1u64), 1),
            I256::try_from(-1i64).unwrap()
        );
    }

    #[test]
    fn test_pnl_delta_unchanged_price() {
        assert_eq!(pnl_delta(e18(3), e18(3), e18(1000), 18), I256::ZERO);
    }

    #[test]
    fn test_pnl_delta_saturates() {
        let delta = pnl_delta(U256::ZERO, U256::MAX, U256::MAX, 0);
        assert_eq!(delta, I256::MAX);
    }

    #[test]
    fn test_weighted_average() {
        // 100 @ 1.0 + 100 @ 2.0 = 1.5
        let avg = weighted_average(e18(1), e18(100), e18(2), e18(100)).unwrap();
        assert_eq!(avg, tenths(15));

        assert_eq!(
            weighted_average(e18(1), U256::ZERO, e18(2), U256::ZERO),
            None
        );
        assert_eq!(
            weighted_average(U256::MAX, U256::from(2u64), U256::ZERO, U256::ZERO),
            None
        );
    }

    #[tokio::test]
    async fn test_conversion_failure_is_zero() {
        let strategy = Address::repeat_byte(0x02);
        let oracle = MockOracle::new();
        assert_eq!(
            convert_native_to_reference(&oracle, strategy, e18(5)).await,
            U256::ZERO
        );

        oracle.set_contract(
            strategy,
            MockContract::token("S", "S", 18).with_reference_rate(e18(3)),
        );
        assert_eq!(
            convert_native_to_reference(&oracle, strategy, e18(5)).await,
            e18(15)
        );
    }
}
