//! Deduplicated transaction history.

use super::LedgerContext;
use crate::domain::{LedgerEvent, TransactionRecord};
use tracing::debug;

impl LedgerContext {
    /// Store a history record unless its transaction was already recorded.
    ///
    /// Returns true if the record is new. The first record for a hash wins.
    pub async fn record_transaction(&self, record: &TransactionRecord) -> Result<bool, sqlx::Error> {
        let inserted = self.repo.insert_transaction(record).await?;
        if !inserted {
            debug!(
                tx_hash = %record.tx_hash,
                kind = %record.kind,
                "Transaction already recorded, skipping"
            );
        }
        Ok(inserted)
    }

    /// Classify and record a share movement. Other events are ignored.
    pub async fn log_event(&self, event: &LedgerEvent) -> Result<bool, sqlx::Error> {
        match TransactionRecord::from_event(event) {
            Some(record) => self.record_transaction(&record).await,
            None => Ok(false),
        }
    }
}
