//! Transaction history record.

use crate::domain::{Address, EventPayload, LedgerEvent, Timestamp, B256};
use alloy_primitives::U256;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Classification of a vault transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionType {
    VaultDeposit,
    VaultWithdraw,
    VaultTransfer,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::VaultDeposit => "VaultDeposit",
            TransactionType::VaultWithdraw => "VaultWithdraw",
            TransactionType::VaultTransfer => "VaultTransfer",
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "VaultDeposit" => Ok(TransactionType::VaultDeposit),
            "VaultWithdraw" => Ok(TransactionType::VaultWithdraw),
            "VaultTransfer" => Ok(TransactionType::VaultTransfer),
            other => Err(format!("unknown transaction type: {}", other)),
        }
    }
}

/// Write-once history entry keyed by transaction hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRecord {
    pub tx_hash: B256,
    pub vault: Address,
    pub kind: TransactionType,
    pub sender: Address,
    pub owner: Address,
    pub receiver: Address,
    pub assets: U256,
    pub shares: U256,
    pub block_number: u64,
    pub block_timestamp: Timestamp,
    pub log_index: u64,
}

impl TransactionRecord {
    /// Classify an event into a history record.
    ///
    /// Returns None for events that are not vault share movements.
    pub fn from_event(event: &LedgerEvent) -> Option<Self> {
        let meta = &event.meta;
        let (kind, sender, owner, receiver, assets, shares) = match &event.payload {
            EventPayload::Deposit {
                sender,
                owner,
                assets,
                shares,
            } => (
                TransactionType::VaultDeposit,
                *sender,
                *owner,
                *owner,
                *assets,
                *shares,
            ),
            EventPayload::Withdraw {
                sender,
                receiver,
                owner,
                assets,
                shares,
            } => (
                TransactionType::VaultWithdraw,
                *sender,
                *owner,
                *receiver,
                *assets,
                *shares,
            ),
            EventPayload::Transfer {
                sender,
                receiver,
                value,
            } => (
                TransactionType::VaultTransfer,
                *sender,
                *sender,
                *receiver,
                U256::ZERO,
                *value,
            ),
            _ => return None,
        };

        Some(Self {
            tx_hash: meta.tx_hash,
            vault: meta.address,
            kind,
            sender,
            owner,
            receiver,
            assets,
            shares,
            block_number: meta.block_number,
            block_timestamp: meta.block_timestamp,
            log_index: meta.log_index,
        })
    }
}
