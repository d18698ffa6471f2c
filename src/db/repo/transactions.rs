//! Transaction history operations for the repository.

use crate::domain::{TransactionRecord, TransactionType, B256};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use std::str::FromStr;
use tracing::warn;

use super::{addr, col_address, col_b256, col_timestamp, col_u256, col_u64, u64_to_i64, Repository};

impl Repository {
    /// Insert a transaction record idempotently.
    ///
    /// The first record stored for a hash wins; returns false for duplicates.
    pub async fn insert_transaction(&self, record: &TransactionRecord) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO transactions (
                tx_hash, vault, kind, sender, owner, receiver,
                assets, shares, block_number, block_timestamp, log_index
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(tx_hash) DO NOTHING
            "#,
        )
        .bind(record.tx_hash.to_string())
        .bind(addr(&record.vault))
        .bind(record.kind.as_str())
        .bind(addr(&record.sender))
        .bind(addr(&record.owner))
        .bind(addr(&record.receiver))
        .bind(record.assets.to_string())
        .bind(record.shares.to_string())
        .bind(u64_to_i64(record.block_number))
        .bind(record.block_timestamp.as_i64())
        .bind(u64_to_i64(record.log_index))
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Load a transaction record by hash.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn get_transaction(
        &self,
        tx_hash: &B256,
    ) -> Result<Option<TransactionRecord>, sqlx::Error> {
        let row = sqlx::query("SELECT * FROM transactions WHERE tx_hash = ?")
            .bind(tx_hash.to_string())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().and_then(transaction_from_row))
    }
}

fn transaction_from_row(row: &SqliteRow) -> Option<TransactionRecord> {
    let kind_str: String = row.get("kind");
    let kind = match TransactionType::from_str(&kind_str) {
        Ok(kind) => kind,
        Err(e) => {
            warn!(kind = %kind_str, error = %e, "Unknown transaction type in storage");
            return None;
        }
    };

    Some(TransactionRecord {
        tx_hash: col_b256(row, "tx_hash"),
        vault: col_address(row, "vault"),
        kind,
        sender: col_address(row, "sender"),
        owner: col_address(row, "owner"),
        receiver: col_address(row, "receiver"),
        assets: col_u256(row, "assets"),
        shares: col_u256(row, "shares"),
        block_number: col_u64(row, "block_number"),
        block_timestamp: col_timestamp(row, "block_timestamp"),
        log_index: col_u64(row, "log_index"),
    })
}
