//! Repository layer for database operations.
//!
//! This module provides the `Repository` struct for all database operations.
//! Methods are organized across submodules by entity:
//! - `vaults.rs` - Vault, strategy and strategy report records
//! - `positions.rs` - Per-depositor positions
//! - `snapshots.rs` - Time-bucketed vault snapshots
//! - `transactions.rs` - Write-once transaction history

mod positions;
mod snapshots;
mod transactions;
mod vaults;

use crate::domain::amount::{parse_i256, parse_u256};
use crate::domain::{Address, ProtocolStats, Strategy, Timestamp, Vault, B256};
use alloy_primitives::{I256, U256};
use sqlx::sqlite::{Sqlite, SqlitePool, SqliteRow};
use sqlx::{Executor, Row};
use std::str::FromStr;
use tracing::{info, warn};

/// Repository for database operations.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Repository { pool }
    }

    /// Cheap connectivity probe for readiness checks.
    pub async fn ping(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    // =========================================================================
    // Protocol stats and registration
    // =========================================================================

    /// Load the singleton registry aggregate. Empty if nothing registered yet.
    pub async fn get_protocol_stats(&self) -> Result<ProtocolStats, sqlx::Error> {
        read_protocol_stats(&self.pool).await
    }

    /// Persist a new vault and append it to the protocol registry atomically.
    ///
    /// # Errors
    /// Returns an error if the transaction fails; nothing is written in that case.
    pub async fn register_vault(&self, vault: &Vault) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let mut stats = read_protocol_stats(&mut *tx).await?;
        if stats.register_vault(vault.address) {
            write_protocol_stats(&mut *tx, &stats).await?;
        }
        vaults::write_vault(&mut *tx, vault).await?;

        tx.commit().await?;
        info!(vault = %vault.address, name = %vault.name, "Registered vault");
        Ok(())
    }

    /// Persist a new strategy and append it to the protocol registry atomically.
    ///
    /// # Errors
    /// Returns an error if the transaction fails; nothing is written in that case.
    pub async fn register_strategy(&self, strategy: &Strategy) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let mut stats = read_protocol_stats(&mut *tx).await?;
        if stats.register_strategy(strategy.address) {
            write_protocol_stats(&mut *tx, &stats).await?;
        }
        vaults::write_strategy(&mut *tx, strategy).await?;

        tx.commit().await?;
        info!(strategy = %strategy.address, name = %strategy.name, "Registered strategy");
        Ok(())
    }
}

async fn read_protocol_stats<'e, E>(executor: E) -> Result<ProtocolStats, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let row = sqlx::query("SELECT vaults, strategies FROM protocol_stats WHERE id = ?")
        .bind(ProtocolStats::ID)
        .fetch_optional(executor)
        .await?;

    Ok(match row {
        Some(row) => ProtocolStats {
            vaults: col_addresses(&row, "vaults"),
            strategies: col_addresses(&row, "strategies"),
        },
        None => ProtocolStats::default(),
    })
}

async fn write_protocol_stats<'e, E>(executor: E, stats: &ProtocolStats) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO protocol_stats (id, vaults, strategies)
        VALUES (?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            vaults = excluded.vaults,
            strategies = excluded.strategies
        "#,
    )
    .bind(ProtocolStats::ID)
    .bind(addresses_json(&stats.vaults))
    .bind(addresses_json(&stats.strategies))
    .execute(executor)
    .await?;
    Ok(())
}

// =============================================================================
// Column codecs
// =============================================================================

pub(crate) fn addr(address: &Address) -> String {
    address.to_string()
}

/// SQLite only stores signed 64-bit integers.
pub(crate) fn u64_to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn addresses_json(addresses: &[Address]) -> String {
    serde_json::to_string(addresses).unwrap_or_else(|_| "[]".to_string())
}

pub(crate) fn col_u256(row: &SqliteRow, column: &str) -> U256 {
    let raw: String = row.get(column);
    parse_u256(&raw).unwrap_or_else(|e| {
        warn!(column, value = %raw, error = %e, "Failed to parse amount column, using zero");
        U256::ZERO
    })
}

pub(crate) fn col_i256(row: &SqliteRow, column: &str) -> I256 {
    let raw: String = row.get(column);
    parse_i256(&raw).unwrap_or_else(|e| {
        warn!(column, value = %raw, error = %e, "Failed to parse signed amount column, using zero");
        I256::ZERO
    })
}

pub(crate) fn col_address(row: &SqliteRow, column: &str) -> Address {
    let raw: String = row.get(column);
    Address::from_str(&raw).unwrap_or_else(|e| {
        warn!(column, value = %raw, error = %e, "Failed to parse address column, using zero address");
        Address::ZERO
    })
}

pub(crate) fn col_opt_address(row: &SqliteRow, column: &str) -> Option<Address> {
    let raw: Option<String> = row.get(column);
    raw.and_then(|raw| match Address::from_str(&raw) {
        Ok(address) => Some(address),
        Err(e) => {
            warn!(column, value = %raw, error = %e, "Failed to parse address column, treating as unset");
            None
        }
    })
}

pub(crate) fn col_b256(row: &SqliteRow, column: &str) -> B256 {
    let raw: String = row.get(column);
    B256::from_str(&raw).unwrap_or_else(|e| {
        warn!(column, value = %raw, error = %e, "Failed to parse hash column, using zero hash");
        B256::ZERO
    })
}

pub(crate) fn col_timestamp(row: &SqliteRow, column: &str) -> Timestamp {
    Timestamp::from_i64(row.get::<i64, _>(column))
}

pub(crate) fn col_u64(row: &SqliteRow, column: &str) -> u64 {
    u64::try_from(row.get::<i64, _>(column)).unwrap_or(0)
}

pub(crate) fn col_small<T: TryFrom<i64> + Default>(row: &SqliteRow, column: &str) -> T {
    let raw: i64 = row.get(column);
    T::try_from(raw).unwrap_or_else(|_| {
        warn!(column, value = raw, "Integer column out of range, using default");
        T::default()
    })
}

pub(crate) fn col_addresses(row: &SqliteRow, column: &str) -> Vec<Address> {
    let raw: String = row.get(column);
    serde_json::from_str(&raw).unwrap_or_else(|e| {
        warn!(column, value = %raw, error = %e, "Failed to parse address list, using empty");
        Vec::new()
    })
}
