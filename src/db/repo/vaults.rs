//! Vault, strategy and strategy report operations for the repository.

use crate::domain::{Address, Strategy, StrategyReport, Vault};
use sqlx::sqlite::{Sqlite, SqliteRow};
use sqlx::Executor;

use super::{
    addr, col_address, col_addresses, col_b256, col_i256, col_opt_address, col_small,
    col_timestamp, col_u256, col_u64, u64_to_i64, Repository,
};

impl Repository {
    /// Load a vault by address.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn get_vault(&self, address: &Address) -> Result<Option<Vault>, sqlx::Error> {
        let row = sqlx::query("SELECT * FROM vaults WHERE address = ?")
            .bind(addr(address))
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(vault_from_row))
    }

    /// Insert or replace a vault record.
    ///
    /// # Errors
    /// Returns an error if the write fails.
    pub async fn upsert_vault(&self, vault: &Vault) -> Result<(), sqlx::Error> {
        write_vault(&self.pool, vault).await
    }

    /// Load a strategy by address.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn get_strategy(&self, address: &Address) -> Result<Option<Strategy>, sqlx::Error> {
        let row = sqlx::query("SELECT * FROM strategies WHERE address = ?")
            .bind(addr(address))
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(strategy_from_row))
    }

    /// Insert or replace a strategy record.
    ///
    /// # Errors
    /// Returns an error if the write fails.
    pub async fn upsert_strategy(&self, strategy: &Strategy) -> Result<(), sqlx::Error> {
        write_strategy(&self.pool, strategy).await
    }

    /// Insert a strategy report idempotently.
    ///
    /// Returns true if the report was new.
    pub async fn insert_strategy_report(&self, report: &StrategyReport) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO strategy_reports
                (tx_hash, log_index, vault, strategy, gain, loss, current_debt, timestamp)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(tx_hash, log_index) DO NOTHING
            "#,
        )
        .bind(report.tx_hash.to_string())
        .bind(u64_to_i64(report.log_index))
        .bind(addr(&report.vault))
        .bind(addr(&report.strategy))
        .bind(report.gain.to_string())
        .bind(report.loss.to_string())
        .bind(report.current_debt.to_string())
        .bind(report.timestamp.as_i64())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Reports filed by a vault against one strategy, oldest first.
    pub async fn query_strategy_reports(
        &self,
        strategy: &Address,
    ) -> Result<Vec<StrategyReport>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT tx_hash, log_index, vault, strategy, gain, loss, current_debt, timestamp
            FROM strategy_reports
            WHERE strategy = ?
            ORDER BY timestamp ASC, tx_hash ASC, log_index ASC
            "#,
        )
        .bind(addr(strategy))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| StrategyReport {
                vault: col_address(row, "vault"),
                strategy: col_address(row, "strategy"),
                tx_hash: col_b256(row, "tx_hash"),
                log_index: col_u64(row, "log_index"),
                gain: col_u256(row, "gain"),
                loss: col_u256(row, "loss"),
                current_debt: col_u256(row, "current_debt"),
                timestamp: col_timestamp(row, "timestamp"),
            })
            .collect())
    }
}

pub(super) async fn write_vault<'e, E>(executor: E, vault: &Vault) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO vaults (
            address, name, symbol, asset, decimals,
            total_assets, total_supply, price_per_share, price_per_share_reference,
            total_deposited, total_withdrawn, realized_pnl_reference,
            total_gain, total_loss, total_fees, total_refunds,
            strategies, is_shutdown, last_updated,
            last_hourly_snapshot, last_daily_snapshot, last_weekly_snapshot
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(address) DO UPDATE SET
            name = excluded.name,
            symbol = excluded.symbol,
            asset = excluded.asset,
            decimals = excluded.decimals,
            total_assets = excluded.total_assets,
            total_supply = excluded.total_supply,
            price_per_share = excluded.price_per_share,
            price_per_share_reference = excluded.price_per_share_reference,
            total_deposited = excluded.total_deposited,
            total_withdrawn = excluded.total_withdrawn,
            realized_pnl_reference = excluded.realized_pnl_reference,
            total_gain = excluded.total_gain,
            total_loss = excluded.total_loss,
            total_fees = excluded.total_fees,
            total_refunds = excluded.total_refunds,
            strategies = excluded.strategies,
            is_shutdown = excluded.is_shutdown,
            last_updated = excluded.last_updated,
            last_hourly_snapshot = excluded.last_hourly_snapshot,
            last_daily_snapshot = excluded.last_daily_snapshot,
            last_weekly_snapshot = excluded.last_weekly_snapshot
        "#,
    )
    .bind(addr(&vault.address))
    .bind(&vault.name)
    .bind(&vault.symbol)
    .bind(addr(&vault.asset))
    .bind(i64::from(vault.decimals))
    .bind(vault.total_assets.to_string())
    .bind(vault.total_supply.to_string())
    .bind(vault.price_per_share.to_string())
    .bind(vault.price_per_share_reference.to_string())
    .bind(vault.total_deposited.to_string())
    .bind(vault.total_withdrawn.to_string())
    .bind(vault.realized_pnl_reference.to_string())
    .bind(vault.total_gain.to_string())
    .bind(vault.total_loss.to_string())
    .bind(vault.total_fees.to_string())
    .bind(vault.total_refunds.to_string())
    .bind(serde_json::to_string(&vault.strategies).unwrap_or_else(|_| "[]".to_string()))
    .bind(vault.is_shutdown)
    .bind(vault.last_updated.as_i64())
    .bind(vault.last_hourly_snapshot.as_i64())
    .bind(vault.last_daily_snapshot.as_i64())
    .bind(vault.last_weekly_snapshot.as_i64())
    .execute(executor)
    .await?;
    Ok(())
}

pub(super) async fn write_strategy<'e, E>(executor: E, strategy: &Strategy) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO strategies (
            address, vault, name, symbol, asset, decimals,
            total_assets, total_supply, total_collateral, total_debt, current_debt,
            price_per_share, performance_fee_bps,
            total_profit, total_loss, total_protocol_fees, total_performance_fees,
            is_active, last_report
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(address) DO UPDATE SET
            vault = excluded.vault,
            name = excluded.name,
            symbol = excluded.symbol,
            asset = excluded.asset,
            decimals = excluded.decimals,
            total_assets = excluded.total_assets,
            total_supply = excluded.total_supply,
            total_collateral = excluded.total_collateral,
            total_debt = excluded.total_debt,
            current_debt = excluded.current_debt,
            price_per_share = excluded.price_per_share,
            performance_fee_bps = excluded.performance_fee_bps,
            total_profit = excluded.total_profit,
            total_loss = excluded.total_loss,
            total_protocol_fees = excluded.total_protocol_fees,
            total_performance_fees = excluded.total_performance_fees,
            is_active = excluded.is_active,
            last_report = excluded.last_report
        "#,
    )
    .bind(addr(&strategy.address))
    .bind(strategy.vault.as_ref().map(addr))
    .bind(&strategy.name)
    .bind(&strategy.symbol)
    .bind(addr(&strategy.asset))
    .bind(i64::from(strategy.decimals))
    .bind(strategy.total_assets.to_string())
    .bind(strategy.total_supply.to_string())
    .bind(strategy.total_collateral.to_string())
    .bind(strategy.total_debt.to_string())
    .bind(strategy.current_debt.to_string())
    .bind(strategy.price_per_share.to_string())
    .bind(i64::from(strategy.performance_fee_bps))
    .bind(strategy.total_profit.to_string())
    .bind(strategy.total_loss.to_string())
    .bind(strategy.total_protocol_fees.to_string())
    .bind(strategy.total_performance_fees.to_string())
    .bind(strategy.is_active)
    .bind(strategy.last_report.as_i64())
    .execute(executor)
    .await?;
    Ok(())
}

fn vault_from_row(row: &SqliteRow) -> Vault {
    use sqlx::Row;
    Vault {
        address: col_address(row, "address"),
        name: row.get("name"),
        symbol: row.get("symbol"),
        asset: col_address(row, "asset"),
        decimals: col_small(row, "decimals"),
        total_assets: col_u256(row, "total_assets"),
        total_supply: col_u256(row, "total_supply"),
        price_per_share: col_u256(row, "price_per_share"),
        price_per_share_reference: col_u256(row, "price_per_share_reference"),
        total_deposited: col_u256(row, "total_deposited"),
        total_withdrawn: col_u256(row, "total_withdrawn"),
        realized_pnl_reference: col_i256(row, "realized_pnl_reference"),
        total_gain: col_u256(row, "total_gain"),
        total_loss: col_u256(row, "total_loss"),
        total_fees: col_u256(row, "total_fees"),
        total_refunds: col_u256(row, "total_refunds"),
        strategies: col_addresses(row, "strategies"),
        is_shutdown: row.get("is_shutdown"),
        last_updated: col_timestamp(row, "last_updated"),
        last_hourly_snapshot: col_timestamp(row, "last_hourly_snapshot"),
        last_daily_snapshot: col_timestamp(row, "last_daily_snapshot"),
        last_weekly_snapshot: col_timestamp(row, "last_weekly_snapshot"),
    }
}

fn strategy_from_row(row: &SqliteRow) -> Strategy {
    use sqlx::Row;
    Strategy {
        address: col_address(row, "address"),
        vault: col_opt_address(row, "vault"),
        name: row.get("name"),
        symbol: row.get("symbol"),
        asset: col_address(row, "asset"),
        decimals: col_small(row, "decimals"),
        total_assets: col_u256(row, "total_assets"),
        total_supply: col_u256(row, "total_supply"),
        total_collateral: col_u256(row, "total_collateral"),
        total_debt: col_u256(row, "total_debt"),
        current_debt: col_u256(row, "current_debt"),
        price_per_share: col_u256(row, "price_per_share"),
        performance_fee_bps: col_small(row, "performance_fee_bps"),
        total_profit: col_u256(row, "total_profit"),
        total_loss: col_u256(row, "total_loss"),
        total_protocol_fees: col_u256(row, "total_protocol_fees"),
        total_performance_fees: col_u256(row, "total_performance_fees"),
        is_active: row.get("is_active"),
        last_report: col_timestamp(row, "last_report"),
    }
}
