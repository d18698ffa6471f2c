//! Vault snapshot operations for the repository.

use crate::domain::{Address, SnapshotKind, VaultSnapshot};
use rust_decimal::Decimal;
use sqlx::Row;
use std::str::FromStr;
use tracing::warn;

use super::{addr, col_address, col_timestamp, col_u256, col_u64, u64_to_i64, Repository};

impl Repository {
    /// Insert a snapshot idempotently. Returns true if it was new.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub async fn insert_snapshot(&self, snapshot: &VaultSnapshot) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO vault_snapshots (
                vault, kind, timestamp, block_number,
                price_per_share, price_per_share_reference, total_assets,
                deposit_apy, borrow_apy
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(vault, kind, timestamp) DO NOTHING
            "#,
        )
        .bind(addr(&snapshot.vault))
        .bind(snapshot.kind.as_str())
        .bind(snapshot.timestamp.as_i64())
        .bind(u64_to_i64(snapshot.block_number))
        .bind(snapshot.price_per_share.to_string())
        .bind(snapshot.price_per_share_reference.to_string())
        .bind(snapshot.total_assets.to_string())
        .bind(snapshot.deposit_apy.to_string())
        .bind(snapshot.borrow_apy.to_string())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Snapshots of a vault, oldest first, optionally limited to one bucket kind.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn query_snapshots(
        &self,
        vault: &Address,
        kind: Option<SnapshotKind>,
    ) -> Result<Vec<VaultSnapshot>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT vault, kind, timestamp, block_number,
                   price_per_share, price_per_share_reference, total_assets,
                   deposit_apy, borrow_apy
            FROM vault_snapshots
            WHERE vault = ?1 AND (?2 IS NULL OR kind = ?2)
            ORDER BY timestamp ASC, kind ASC
            "#,
        )
        .bind(addr(vault))
        .bind(kind.map(|k| k.as_str()))
        .fetch_all(&self.pool)
        .await?;

        let snapshots = rows
            .iter()
            .filter_map(|row| {
                let kind_str: String = row.get("kind");
                let kind = match SnapshotKind::from_str(&kind_str) {
                    Ok(kind) => kind,
                    Err(e) => {
                        warn!(kind = %kind_str, error = %e, "Skipping snapshot with unknown kind");
                        return None;
                    }
                };

                Some(VaultSnapshot {
                    vault: col_address(row, "vault"),
                    kind,
                    timestamp: col_timestamp(row, "timestamp"),
                    block_number: col_u64(row, "block_number"),
                    price_per_share: col_u256(row, "price_per_share"),
                    price_per_share_reference: col_u256(row, "price_per_share_reference"),
                    total_assets: col_u256(row, "total_assets"),
                    deposit_apy: col_decimal(row, "deposit_apy"),
                    borrow_apy: col_decimal(row, "borrow_apy"),
                })
            })
            .collect();

        Ok(snapshots)
    }
}

fn col_decimal(row: &sqlx::sqlite::SqliteRow, column: &str) -> Decimal {
    let raw: String = row.get(column);
    Decimal::from_str(&raw).unwrap_or_else(|e| {
        warn!(column, value = %raw, error = %e, "Failed to parse decimal column, using zero");
        Decimal::ZERO
    })
}
