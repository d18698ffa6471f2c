//! Per-depositor position operations for the repository.

use crate::domain::{Address, UserVaultPosition};
use sqlx::sqlite::SqliteRow;

use super::{addr, col_address, col_i256, col_timestamp, col_u256, Repository};

impl Repository {
    /// Load the position of `user` in `vault`.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn get_position(
        &self,
        user: &Address,
        vault: &Address,
    ) -> Result<Option<UserVaultPosition>, sqlx::Error> {
        let row = sqlx::query("SELECT * FROM user_vault_positions WHERE user = ? AND vault = ?")
            .bind(addr(user))
            .bind(addr(vault))
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(position_from_row))
    }

    /// Insert or replace a position.
    ///
    /// # Errors
    /// Returns an error if the write fails.
    pub async fn upsert_position(&self, position: &UserVaultPosition) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO user_vault_positions (
                user, vault, current_shares, avg_price_per_share, avg_price_per_share_reference,
                total_deposited, total_withdrawn, total_deposited_reference, total_withdrawn_reference,
                realized_pnl, realized_pnl_reference, last_updated
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(user, vault) DO UPDATE SET
                current_shares = excluded.current_shares,
                avg_price_per_share = excluded.avg_price_per_share,
                avg_price_per_share_reference = excluded.avg_price_per_share_reference,
                total_deposited = excluded.total_deposited,
                total_withdrawn = excluded.total_withdrawn,
                total_deposited_reference = excluded.total_deposited_reference,
                total_withdrawn_reference = excluded.total_withdrawn_reference,
                realized_pnl = excluded.realized_pnl,
                realized_pnl_reference = excluded.realized_pnl_reference,
                last_updated = excluded.last_updated
            "#,
        )
        .bind(addr(&position.user))
        .bind(addr(&position.vault))
        .bind(position.current_shares.to_string())
        .bind(position.avg_price_per_share.to_string())
        .bind(position.avg_price_per_share_reference.to_string())
        .bind(position.total_deposited.to_string())
        .bind(position.total_withdrawn.to_string())
        .bind(position.total_deposited_reference.to_string())
        .bind(position.total_withdrawn_reference.to_string())
        .bind(position.realized_pnl.to_string())
        .bind(position.realized_pnl_reference.to_string())
        .bind(position.last_updated.as_i64())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Positions filtered by user and/or vault, including closed ones.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn query_positions(
        &self,
        user: Option<&Address>,
        vault: Option<&Address>,
    ) -> Result<Vec<UserVaultPosition>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM user_vault_positions
            WHERE (?1 IS NULL OR user = ?1) AND (?2 IS NULL OR vault = ?2)
            ORDER BY user ASC, vault ASC
            "#,
        )
        .bind(user.map(addr))
        .bind(vault.map(addr))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(position_from_row).collect())
    }
}

fn position_from_row(row: &SqliteRow) -> UserVaultPosition {
    UserVaultPosition {
        user: col_address(row, "user"),
        vault: col_address(row, "vault"),
        current_shares: col_u256(row, "current_shares"),
        avg_price_per_share: col_u256(row, "avg_price_per_share"),
        avg_price_per_share_reference: col_u256(row, "avg_price_per_share_reference"),
        total_deposited: col_u256(row, "total_deposited"),
        total_withdrawn: col_u256(row, "total_withdrawn"),
        total_deposited_reference: col_u256(row, "total_deposited_reference"),
        total_withdrawn_reference: col_u256(row, "total_withdrawn_reference"),
        realized_pnl: col_i256(row, "realized_pnl"),
        realized_pnl_reference: col_i256(row, "realized_pnl_reference"),
        last_updated: col_timestamp(row, "last_updated"),
    }
}
