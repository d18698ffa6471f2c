//! Per-event dispatch: registry, ledger, valuation, snapshots, history.

use super::{EventOutcome, LedgerContext, ProcessError};
use crate::domain::ordering::sort_events_deterministic;
use crate::domain::{
    Address, EventMeta, EventPayload, LedgerEvent, StrategyChange, StrategyReport, Timestamp,
    UserVaultPosition, Vault, VaultSnapshot,
};
use crate::engine::{
    convert_native_to_reference, pnl_delta, ConsistencyFault, Movement, PositionLedger,
    PriceContext,
};
use alloy_primitives::U256;
use tracing::{debug, info, warn};

/// Direction of a share movement, used when tracked totals stand in for oracle reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    In,
    Out,
}

/// Amounts carried by a vault-side strategy report.
#[derive(Debug, Clone, Copy)]
struct ReportAmounts {
    gain: U256,
    loss: U256,
    current_debt: U256,
    protocol_fees: U256,
    total_fees: U256,
    total_refunds: U256,
}

impl LedgerContext {
    /// Sort a batch into chain order and apply it event by event.
    ///
    /// A consistency fault is reported in place and does not stop the batch;
    /// a storage error aborts it.
    pub async fn process_batch(
        &self,
        events: &mut [LedgerEvent],
    ) -> Result<Vec<EventOutcome>, ProcessError> {
        sort_events_deterministic(events);

        let mut outcomes = Vec::with_capacity(events.len());
        for event in events.iter() {
            outcomes.push(self.process_event(event).await?);
        }
        Ok(outcomes)
    }

    /// Apply a single event to the stored ledger.
    pub async fn process_event(&self, event: &LedgerEvent) -> Result<EventOutcome, ProcessError> {
        let meta = &event.meta;
        debug!(
            kind = event.payload.name(),
            address = %meta.address,
            block = meta.block_number,
            log_index = meta.log_index,
            "Processing event"
        );

        let outcome = match &event.payload {
            EventPayload::Deposit {
                owner,
                assets,
                shares,
                ..
            } => {
                self.log_event(event).await?;
                self.on_deposit(meta, *owner, *assets, *shares).await?
            }
            EventPayload::Withdraw {
                owner,
                assets,
                shares,
                ..
            } => {
                self.log_event(event).await?;
                self.on_withdraw(meta, *owner, *assets, *shares).await?
            }
            EventPayload::Transfer { .. } => {
                self.log_event(event).await?;
                EventOutcome::Applied
            }
            EventPayload::StrategyChanged { strategy, change } => {
                self.on_strategy_changed(meta, *strategy, *change).await?
            }
            EventPayload::StrategyReported {
                strategy,
                gain,
                loss,
                current_debt,
                protocol_fees,
                total_fees,
                total_refunds,
            } => {
                let amounts = ReportAmounts {
                    gain: *gain,
                    loss: *loss,
                    current_debt: *current_debt,
                    protocol_fees: *protocol_fees,
                    total_fees: *total_fees,
                    total_refunds: *total_refunds,
                };
                self.on_strategy_reported(meta, *strategy, amounts).await?
            }
            EventPayload::Reported {
                profit,
                loss,
                protocol_fees,
                performance_fees,
            } => {
                self.on_reported(meta, *profit, *loss, *protocol_fees, *performance_fees)
                    .await?
            }
            EventPayload::StrategyRebalance => self.on_rebalance(meta).await?,
            EventPayload::Shutdown => self.on_shutdown(meta).await?,
            EventPayload::NewVault { vault, asset } => self.on_new_vault(*vault, *asset).await?,
            EventPayload::NewStrategy { strategy, asset } => {
                self.on_new_strategy(*strategy, *asset).await?
            }
            EventPayload::Block => {
                self.maybe_snapshot(meta.address, meta.block_timestamp, meta.block_number)
                    .await?;
                EventOutcome::Applied
            }
        };

        if let EventOutcome::Fault(fault) = &outcome {
            warn!(
                tx_hash = %meta.tx_hash,
                log_index = meta.log_index,
                fault = %fault,
                "Consistency fault"
            );
        }
        Ok(outcome)
    }

    /// Emit due snapshots for a vault at a block tick.
    pub async fn maybe_snapshot(
        &self,
        vault: Address,
        at: Timestamp,
        block_number: u64,
    ) -> Result<Vec<VaultSnapshot>, sqlx::Error> {
        let mut vault = self.get_or_create_vault(vault).await?;
        if self.scheduler.due(&vault, at).is_empty() {
            return Ok(Vec::new());
        }

        let total_assets = match self.oracle.total_assets(vault.address).await {
            Ok(total_assets) => {
                vault.total_assets = total_assets;
                total_assets
            }
            Err(e) => {
                debug!(vault = %vault.address, error = %e, "totalAssets unavailable, using stored value");
                vault.total_assets
            }
        };

        let snapshots = self
            .scheduler
            .capture(&mut vault, at, block_number, total_assets);
        for snapshot in &snapshots {
            self.repo.insert_snapshot(snapshot).await?;
            info!(
                vault = %snapshot.vault,
                kind = %snapshot.kind,
                timestamp = %snapshot.timestamp,
                "Vault snapshot"
            );
        }
        self.repo.upsert_vault(&vault).await?;

        Ok(snapshots)
    }

    async fn on_deposit(
        &self,
        meta: &EventMeta,
        owner: Address,
        assets: U256,
        shares: U256,
    ) -> Result<EventOutcome, sqlx::Error> {
        let mut vault = self.get_or_create_vault(meta.address).await?;
        vault.total_deposited = vault.total_deposited.saturating_add(assets);
        self.refresh_totals(&mut vault, assets, shares, Flow::In).await;
        self.refresh_prices(&mut vault).await;
        vault.last_updated = meta.block_timestamp;

        let movement = self.movement(&vault, assets, shares).await;
        let position = self
            .repo
            .get_position(&owner, &vault.address)
            .await?
            .unwrap_or_else(|| UserVaultPosition::new(owner, vault.address));

        let mut ledger = PositionLedger::new(position);
        ledger.record_deposit(&movement, &price_context(&vault), meta.block_timestamp);

        self.repo.upsert_position(ledger.position()).await?;
        self.repo.upsert_vault(&vault).await?;
        Ok(EventOutcome::Applied)
    }

    async fn on_withdraw(
        &self,
        meta: &EventMeta,
        owner: Address,
        assets: U256,
        shares: U256,
    ) -> Result<EventOutcome, sqlx::Error> {
        let mut vault = self.get_or_create_vault(meta.address).await?;
        vault.total_withdrawn = vault.total_withdrawn.saturating_add(assets);
        self.refresh_totals(&mut vault, assets, shares, Flow::Out).await;
        self.refresh_prices(&mut vault).await;
        vault.last_updated = meta.block_timestamp;

        let outcome = match self.repo.get_position(&owner, &vault.address).await? {
            None => EventOutcome::Fault(ConsistencyFault::MissingPosition {
                participant: owner,
                vault: vault.address,
            }),
            Some(position) => {
                let movement = self.movement(&vault, assets, shares).await;
                let mut ledger = PositionLedger::new(position);
                match ledger.record_withdrawal(
                    &movement,
                    &price_context(&vault),
                    meta.block_timestamp,
                ) {
                    Ok(realized) => {
                        debug!(
                            user = %owner,
                            vault = %vault.address,
                            realized = %realized.native,
                            "Realized PnL"
                        );
                        self.repo.upsert_position(ledger.position()).await?;
                        EventOutcome::Applied
                    }
                    Err(fault) => EventOutcome::Fault(fault),
                }
            }
        };

        self.repo.upsert_vault(&vault).await?;
        Ok(outcome)
    }

    async fn on_strategy_changed(
        &self,
        meta: &EventMeta,
        strategy: Address,
        change: StrategyChange,
    ) -> Result<EventOutcome, sqlx::Error> {
        let mut vault = self.get_or_create_vault(meta.address).await?;
        let mut strategy = self.get_or_create_strategy(strategy).await?;

        match change {
            StrategyChange::Added => {
                if let Some(previous) = strategy.vault.filter(|v| *v != vault.address) {
                    self.detach_from(previous, strategy.address, meta.block_timestamp)
                        .await?;
                }
                strategy.vault = Some(vault.address);
                strategy.is_active = true;
                vault.attach_strategy(strategy.address);
                info!(vault = %vault.address, strategy = %strategy.address, "Strategy added");
            }
            StrategyChange::Revoked => {
                strategy.vault = None;
                strategy.is_active = false;
                vault.detach_strategy(strategy.address);
                info!(vault = %vault.address, strategy = %strategy.address, "Strategy revoked");
            }
        }

        vault.last_updated = meta.block_timestamp;
        self.repo.upsert_strategy(&strategy).await?;
        self.repo.upsert_vault(&vault).await?;
        Ok(EventOutcome::Applied)
    }

    async fn detach_from(
        &self,
        vault: Address,
        strategy: Address,
        at: Timestamp,
    ) -> Result<(), sqlx::Error> {
        if let Some(mut previous) = self.repo.get_vault(&vault).await? {
            if previous.detach_strategy(strategy) {
                previous.last_updated = at;
                self.repo.upsert_vault(&previous).await?;
            }
        }
        Ok(())
    }

    async fn on_strategy_reported(
        &self,
        meta: &EventMeta,
        strategy: Address,
        amounts: ReportAmounts,
    ) -> Result<EventOutcome, sqlx::Error> {
        let mut vault = self.get_or_create_vault(meta.address).await?;
        let mut strategy = self.get_or_create_strategy(strategy).await?;

        vault.total_gain = vault.total_gain.saturating_add(amounts.gain);
        vault.total_loss = vault.total_loss.saturating_add(amounts.loss);
        vault.total_fees = vault.total_fees.saturating_add(amounts.total_fees);
        vault.total_refunds = vault.total_refunds.saturating_add(amounts.total_refunds);

        let previous_reference = vault.price_per_share_reference;
        self.refresh_totals(&mut vault, U256::ZERO, U256::ZERO, Flow::In)
            .await;
        self.refresh_prices(&mut vault).await;

        if !previous_reference.is_zero() {
            let delta = pnl_delta(
                previous_reference,
                vault.price_per_share_reference,
                vault.total_supply,
                vault.decimals,
            );
            vault.realized_pnl_reference = vault.realized_pnl_reference.saturating_add(delta);
        }
        vault.last_updated = meta.block_timestamp;

        strategy.current_debt = amounts.current_debt;
        strategy.last_report = meta.block_timestamp;

        let report = StrategyReport {
            vault: vault.address,
            strategy: strategy.address,
            tx_hash: meta.tx_hash,
            log_index: meta.log_index,
            gain: amounts.gain,
            loss: amounts.loss,
            current_debt: amounts.current_debt,
            timestamp: meta.block_timestamp,
        };
        self.repo.insert_strategy_report(&report).await?;

        debug!(
            vault = %vault.address,
            strategy = %strategy.address,
            gain = %amounts.gain,
            loss = %amounts.loss,
            protocol_fees = %amounts.protocol_fees,
            "Strategy reported"
        );

        self.repo.upsert_strategy(&strategy).await?;
        self.repo.upsert_vault(&vault).await?;
        Ok(EventOutcome::Applied)
    }

    async fn on_reported(
        &self,
        meta: &EventMeta,
        profit: U256,
        loss: U256,
        protocol_fees: U256,
        performance_fees: U256,
    ) -> Result<EventOutcome, sqlx::Error> {
        let mut strategy = self.get_or_create_strategy(meta.address).await?;

        strategy.total_profit = strategy.total_profit.saturating_add(profit);
        strategy.total_loss = strategy.total_loss.saturating_add(loss);
        strategy.total_protocol_fees = strategy.total_protocol_fees.saturating_add(protocol_fees);
        strategy.total_performance_fees = strategy
            .total_performance_fees
            .saturating_add(performance_fees);
        strategy.last_report = meta.block_timestamp;

        match self.oracle.price_per_share(strategy.address).await {
            Ok(pps) => strategy.price_per_share = pps,
            Err(e) => {
                warn!(strategy = %strategy.address, error = %e, "pricePerShare unavailable, keeping last value")
            }
        }

        self.repo.upsert_strategy(&strategy).await?;
        Ok(EventOutcome::Applied)
    }

    async fn on_rebalance(&self, meta: &EventMeta) -> Result<EventOutcome, sqlx::Error> {
        let mut strategy = self.get_or_create_strategy(meta.address).await?;

        match self.oracle.strategy_balances(strategy.address).await {
            Ok(balances) => {
                strategy.total_assets = balances.total_assets;
                strategy.total_collateral = balances.total_collateral;
                strategy.total_debt = balances.total_debt;
                self.repo.upsert_strategy(&strategy).await?;
            }
            Err(e) => {
                warn!(strategy = %strategy.address, error = %e, "Strategy balances unavailable, left unchanged")
            }
        }
        Ok(EventOutcome::Applied)
    }

    async fn on_shutdown(&self, meta: &EventMeta) -> Result<EventOutcome, sqlx::Error> {
        let mut vault = self.get_or_create_vault(meta.address).await?;
        vault.is_shutdown = true;
        vault.last_updated = meta.block_timestamp;
        self.repo.upsert_vault(&vault).await?;
        info!(vault = %vault.address, "Vault shut down");
        Ok(EventOutcome::Applied)
    }

    async fn on_new_vault(&self, vault: Address, asset: Address) -> Result<EventOutcome, sqlx::Error> {
        let mut vault = self.get_or_create_vault(vault).await?;
        if vault.asset == Address::ZERO && asset != Address::ZERO {
            vault.asset = asset;
            self.repo.upsert_vault(&vault).await?;
        }
        Ok(EventOutcome::Applied)
    }

    async fn on_new_strategy(
        &self,
        strategy: Address,
        asset: Address,
    ) -> Result<EventOutcome, sqlx::Error> {
        let mut strategy = self.get_or_create_strategy(strategy).await?;
        if strategy.asset == Address::ZERO && asset != Address::ZERO {
            strategy.asset = asset;
            self.repo.upsert_strategy(&strategy).await?;
        }
        Ok(EventOutcome::Applied)
    }

    /// Refresh vault totals from the oracle, or track them from the event amounts.
    async fn refresh_totals(&self, vault: &mut Vault, assets: U256, shares: U256, flow: Flow) {
        let oracle = self.oracle.as_ref();
        let (total_assets, total_supply) = futures::join!(
            oracle.total_assets(vault.address),
            oracle.total_supply(vault.address)
        );

        vault.total_assets = match total_assets {
            Ok(value) => value,
            Err(e) => {
                debug!(vault = %vault.address, error = %e, "totalAssets unavailable, tracking locally");
                track(vault.address, "totalAssets", vault.total_assets, assets, flow)
            }
        };
        vault.total_supply = match total_supply {
            Ok(value) => value,
            Err(e) => {
                debug!(vault = %vault.address, error = %e, "totalSupply unavailable, tracking locally");
                track(vault.address, "totalSupply", vault.total_supply, shares, flow)
            }
        };
    }

    /// Refresh native and reference price-per-share, keeping last values on failure.
    async fn refresh_prices(&self, vault: &mut Vault) {
        match self.oracle.price_per_share(vault.address).await {
            Ok(pps) => vault.price_per_share = pps,
            Err(e) => {
                warn!(vault = %vault.address, error = %e, "pricePerShare unavailable, keeping last value")
            }
        }

        if let Some(strategy) = vault.default_strategy() {
            let reference =
                convert_native_to_reference(self.oracle.as_ref(), strategy, vault.price_per_share)
                    .await;
            if !reference.is_zero() {
                vault.price_per_share_reference = reference;
            }
        }
    }

    async fn movement(&self, vault: &Vault, assets: U256, shares: U256) -> Movement {
        let assets_reference = match vault.default_strategy() {
            Some(strategy) => {
                convert_native_to_reference(self.oracle.as_ref(), strategy, assets).await
            }
            None => U256::ZERO,
        };
        Movement {
            shares,
            assets,
            assets_reference,
        }
    }
}

fn price_context(vault: &Vault) -> PriceContext {
    PriceContext {
        price_per_share: vault.price_per_share,
        price_per_share_reference: vault
            .default_strategy()
            .map(|_| vault.price_per_share_reference),
        decimals: vault.decimals,
    }
}

fn track(vault: Address, field: &str, current: U256, delta: U256, flow: Flow) -> U256 {
    match flow {
        Flow::In => current.saturating_add(delta),
        Flow::Out => current.checked_sub(delta).unwrap_or_else(|| {
            warn!(
                vault = %vault,
                field,
                current = %current,
                delta = %delta,
                "Tracked total would underflow, left unchanged"
            );
            current
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_underflow_leaves_value() {
        let vault = Address::repeat_byte(0x11);
        assert_eq!(
            track(vault, "totalSupply", U256::from(5u64), U256::from(6u64), Flow::Out),
            U256::from(5u64)
        );
        assert_eq!(
            track(vault, "totalSupply", U256::from(5u64), U256::from(2u64), Flow::Out),
            U256::from(3u64)
        );
        assert_eq!(
            track(vault, "totalSupply", U256::from(5u64), U256::from(2u64), Flow::In),
            U256::from(7u64)
        );
    }

    #[test]
    fn test_reference_price_requires_default_strategy() {
        let mut vault = Vault::new(
            Address::repeat_byte(0x11),
            "Vault".to_string(),
            "yv".to_string(),
            Address::ZERO,
            18,
        );
        vault.price_per_share_reference = U256::from(3u64);
        assert_eq!(price_context(&vault).price_per_share_reference, None);

        vault.attach_strategy(Address::repeat_byte(0x05));
        assert_eq!(
            price_context(&vault).price_per_share_reference,
            Some(U256::from(3u64))
        );
    }
}
