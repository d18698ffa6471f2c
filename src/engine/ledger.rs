//! Weighted-average-cost position ledger.
//!
//! Applies deposits and withdrawals to a single [`UserVaultPosition`] and books
//! realized PnL in native and reference units.

use crate::domain::{Timestamp, UserVaultPosition};
use alloy_primitives::{I256, U256};
use tracing::warn;

use super::valuation::{pnl_delta, weighted_average};
use super::ConsistencyFault;

/// Vault prices observed at the time of a movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PriceContext {
    /// Native price-per-share. Zero means unknown.
    pub price_per_share: U256,
    /// Reference price-per-share, `None` when the vault has no default strategy.
    pub price_per_share_reference: Option<U256>,
    pub decimals: u8,
}

impl PriceContext {
    fn native(&self) -> Option<U256> {
        Some(self.price_per_share).filter(|p| !p.is_zero())
    }

    fn reference(&self) -> Option<U256> {
        self.price_per_share_reference.filter(|p| !p.is_zero())
    }
}

/// Share and asset deltas of one deposit or withdrawal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Movement {
    pub shares: U256,
    pub assets: U256,
    /// `assets` converted to reference units, zero when unavailable.
    pub assets_reference: U256,
}

/// Realized PnL booked by a single withdrawal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Realized {
    pub native: I256,
    pub reference: I256,
}

/// Weighted-average-cost ledger for one (participant, vault) position.
pub struct PositionLedger {
    position: UserVaultPosition,
}

impl PositionLedger {
    pub fn new(position: UserVaultPosition) -> Self {
        Self { position }
    }

    pub fn position(&self) -> &UserVaultPosition {
        &self.position
    }

    pub fn into_position(self) -> UserVaultPosition {
        self.position
    }

    /// Add shares, moving both cost bases toward the current prices.
    pub fn record_deposit(&mut self, movement: &Movement, prices: &PriceContext, at: Timestamp) {
        let pos = &mut self.position;
        let held = pos.current_shares;

        let Some(new_shares) = held.checked_add(movement.shares) else {
            warn!(
                user = %pos.user,
                vault = %pos.vault,
                "Share balance overflow, deposit ignored"
            );
            return;
        };

        if let Some(price) = prices.native() {
            match weighted_average(pos.avg_price_per_share, held, price, movement.shares) {
                Some(avg) => pos.avg_price_per_share = avg,
                None if new_shares.is_zero() => {}
                None => warn!(user = %pos.user, vault = %pos.vault, "Native cost basis overflow"),
            }
        }

        if let Some(price) = prices.reference() {
            match weighted_average(
                pos.avg_price_per_share_reference,
                held,
                price,
                movement.shares,
            ) {
                Some(avg) => pos.avg_price_per_share_reference = avg,
                None if new_shares.is_zero() => {}
                None => warn!(user = %pos.user, vault = %pos.vault, "Reference cost basis overflow"),
            }
        }

        pos.total_deposited = pos.total_deposited.saturating_add(movement.assets);
        pos.total_deposited_reference = pos
            .total_deposited_reference
            .saturating_add(movement.assets_reference);
        pos.current_shares = new_shares;
        pos.last_updated = at;
    }

    /// Remove shares and book realized PnL against the unchanged cost bases.
    ///
    /// Requesting more shares than held leaves the position untouched.
    pub fn record_withdrawal(
        &mut self,
        movement: &Movement,
        prices: &PriceContext,
        at: Timestamp,
    ) -> Result<Realized, ConsistencyFault> {
        let pos = &mut self.position;

        let remaining = pos.current_shares.checked_sub(movement.shares).ok_or(
            ConsistencyFault::InsufficientShares {
                participant: pos.user,
                vault: pos.vault,
                held: pos.current_shares,
                requested: movement.shares,
            },
        )?;

        let mut realized = Realized::default();

        if let Some(price) = prices.native() {
            realized.native = pnl_delta(
                pos.avg_price_per_share,
                price,
                movement.shares,
                prices.decimals,
            );
            pos.realized_pnl = pos.realized_pnl.saturating_add(realized.native);

            // Reference PnL is only booked alongside a known native price.
            if let Some(reference) = prices.reference() {
                realized.reference = pnl_delta(
                    pos.avg_price_per_share_reference,
                    reference,
                    movement.shares,
                    prices.decimals,
                );
                pos.realized_pnl_reference = pos
                    .realized_pnl_reference
                    .saturating_add(realized.reference);
            }
        }

        pos.total_withdrawn = pos.total_withdrawn.saturating_add(movement.assets);
        pos.total_withdrawn_reference = pos
            .total_withdrawn_reference
            .saturating_add(movement.assets_reference);
        pos.current_shares = remaining;
        pos.last_updated = at;

        Ok(realized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::amount::{pow10, to_signed};
    use crate::domain::Address;

    fn e18(n: u64) -> U256 {
        U256::from(n) * pow10(18).unwrap()
    }

    fn tenths(n: u64) -> U256 {
        U256::from(n) * pow10(17).unwrap()
    }

    fn ledger() -> PositionLedger {
        PositionLedger::new(UserVaultPosition::new(
            Address::repeat_byte(0xaa),
            Address::repeat_byte(0x11),
        ))
    }

    fn native_only(pps: U256) -> PriceContext {
        PriceContext {
            price_per_share: pps,
            price_per_share_reference: None,
            decimals: 18,
        }
    }

    fn movement(shares: U256, assets: U256) -> Movement {
        Movement {
            shares,
            assets,
            assets_reference: U256::ZERO,
        }
    }

    #[test]
    fn test_deposit_then_withdraw_at_higher_price() {
        let mut ledger = ledger();

        ledger.record_deposit(
            &movement(e18(1000), e18(1000)),
            &native_only(e18(1)),
            Timestamp::new(100),
        );
        assert_eq!(ledger.position().current_shares, e18(1000));
        assert_eq!(ledger.position().avg_price_per_share, e18(1));

        let realized = ledger
            .record_withdrawal(
                &movement(e18(500), e18(600)),
                &native_only(tenths(12)),
                Timestamp::new(200),
            )
            .unwrap();

        let pos = ledger.position();
        assert_eq!(realized.native, to_signed(e18(100)));
        assert_eq!(pos.realized_pnl, to_signed(e18(100)));
        assert_eq!(pos.current_shares, e18(500));
        assert_eq!(pos.avg_price_per_share, e18(1));
        assert_eq!(pos.total_withdrawn, e18(600));
        assert_eq!(pos.last_updated, Timestamp::new(200));
    }

    #[test]
    fn test_same_price_deposits_keep_average() {
        let mut ledger = ledger();
        let price = U256::from(1_234_567_890_123_456_789u64);

        for (i, shares) in [1u64, 7, 1_000, 3, 999_999].into_iter().enumerate() {
            ledger.record_deposit(
                &movement(e18(shares), e18(shares)),
                &native_only(price),
                Timestamp::new(i as u64),
            );
            assert_eq!(ledger.position().avg_price_per_share, price);
        }
    }

    #[test]
    fn test_loss_is_negative() {
        let mut ledger = ledger();
        ledger.record_deposit(
            &movement(e18(10), e18(20)),
            &native_only(e18(2)),
            Timestamp::new(1),
        );

        let realized = ledger
            .record_withdrawal(
                &movement(e18(4), e18(6)),
                &native_only(tenths(15)),
                Timestamp::new(2),
            )
            .unwrap();

        // (1.5 - 2.0) * 4 = -2
        assert_eq!(realized.native, -to_signed(e18(2)));
        assert_eq!(ledger.position().realized_pnl, -to_signed(e18(2)));
    }

    #[test]
    fn test_overdraw_is_fault_and_leaves_position() {
        let mut ledger = ledger();
        ledger.record_deposit(
            &movement(e18(5), e18(5)),
            &native_only(e18(1)),
            Timestamp::new(1),
        );
        let before = ledger.position().clone();

        let result = ledger.record_withdrawal(
            &movement(e18(6), e18(6)),
            &native_only(e18(1)),
            Timestamp::new(2),
        );

        assert_eq!(
            result,
            Err(ConsistencyFault::InsufficientShares {
                participant: before.user,
                vault: before.vault,
                held: e18(5),
                requested: e18(6),
            })
        );
        assert_eq!(ledger.position(), &before);
    }

    #[test]
    fn test_withdraw_to_exactly_zero() {
        let mut ledger = ledger();
        ledger.record_deposit(
            &movement(e18(5), e18(5)),
            &native_only(e18(1)),
            Timestamp::new(1),
        );
        ledger
            .record_withdrawal(
                &movement(e18(5), e18(5)),
                &native_only(e18(1)),
                Timestamp::new(2),
            )
            .unwrap();

        assert!(ledger.position().is_closed());
        assert_eq!(ledger.position().realized_pnl, I256::ZERO);
    }

    #[test]
    fn test_conservation_without_price_change() {
        let mut ledger = ledger();
        let prices = native_only(e18(1));

        ledger.record_deposit(&movement(e18(1000), e18(1000)), &prices, Timestamp::new(1));
        ledger.record_deposit(&movement(e18(250), e18(250)), &prices, Timestamp::new(2));
        ledger
            .record_withdrawal(&movement(e18(300), e18(300)), &prices, Timestamp::new(3))
            .unwrap();

        let pos = ledger.into_position();
        let net = pos.total_deposited - pos.total_withdrawn;
        let held_value = pos.current_shares * pos.avg_price_per_share / pow10(18).unwrap();
        assert_eq!(net, held_value);
        assert_eq!(pos.realized_pnl, I256::ZERO);
    }

    #[test]
    fn test_unknown_price_skips_cost_basis() {
        let mut ledger = ledger();
        ledger.record_deposit(
            &movement(e18(10), e18(10)),
            &native_only(U256::ZERO),
            Timestamp::new(1),
        );

        let pos = ledger.position();
        assert_eq!(pos.current_shares, e18(10));
        assert_eq!(pos.avg_price_per_share, U256::ZERO);
        assert_eq!(pos.total_deposited, e18(10));
    }

    #[test]
    fn test_reference_basis_requires_default_strategy() {
        let mut ledger = ledger();
        ledger.record_deposit(
            &movement(e18(10), e18(10)),
            &native_only(e18(1)),
            Timestamp::new(1),
        );
        assert_eq!(ledger.position().avg_price_per_share_reference, U256::ZERO);

        let with_reference = PriceContext {
            price_per_share: e18(1),
            price_per_share_reference: Some(e18(2)),
            decimals: 18,
        };
        ledger.record_deposit(
            &Movement {
                shares: e18(10),
                assets: e18(10),
                assets_reference: e18(20),
            },
            &with_reference,
            Timestamp::new(2),
        );

        let pos = ledger.position();
        // (0 * 10 + 2 * 10) / 20
        assert_eq!(pos.avg_price_per_share_reference, e18(1));
        assert_eq!(pos.total_deposited_reference, e18(20));

        let realized = ledger
            .record_withdrawal(
                &movement(e18(5), e18(5)),
                &PriceContext {
                    price_per_share: e18(1),
                    price_per_share_reference: Some(e18(3)),
                    decimals: 18,
                },
                Timestamp::new(3),
            )
            .unwrap();
        // (3 - 1) * 5
        assert_eq!(realized.reference, to_signed(e18(10)));
        assert_eq!(realized.native, I256::ZERO);
    }

    #[test]
    fn test_unknown_native_price_books_no_reference_pnl() {
        let mut ledger = ledger();
        ledger.record_deposit(
            &Movement {
                shares: e18(10),
                assets: e18(10),
                assets_reference: e18(20),
            },
            &PriceContext {
                price_per_share: e18(1),
                price_per_share_reference: Some(e18(2)),
                decimals: 18,
            },
            Timestamp::new(1),
        );

        // Native price unreadable while the reference conversion still answers.
        let realized = ledger
            .record_withdrawal(
                &movement(e18(5), e18(5)),
                &PriceContext {
                    price_per_share: U256::ZERO,
                    price_per_share_reference: Some(e18(3)),
                    decimals: 18,
                },
                Timestamp::new(2),
            )
            .unwrap();

        let pos = ledger.position();
        assert_eq!(realized, Realized::default());
        assert_eq!(pos.realized_pnl, I256::ZERO);
        assert_eq!(pos.realized_pnl_reference, I256::ZERO);
        assert_eq!(pos.current_shares, e18(5));
        assert_eq!(pos.avg_price_per_share_reference, e18(2));
    }
}
