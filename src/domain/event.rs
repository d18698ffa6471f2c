//! Inbound economic events.
//!
//! Events arrive as JSON from the ingestion harness:
//!
//! ```json
//! {
//!   "meta": {"address": "0x…", "txHash": "0x…", "logIndex": 0,
//!            "blockNumber": 1, "blockTimestamp": 1700000000},
//!   "payload": {"type": "deposit", "sender": "0x…", "owner": "0x…",
//!               "assets": "1000", "shares": "1000"}
//! }
//! ```

use crate::domain::amount::dec_u256;
use crate::domain::{Address, Timestamp, B256};
use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

/// Block and log coordinates shared by every event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventMeta {
    /// Emitting contract: a vault, a strategy, or a factory.
    pub address: Address,
    pub tx_hash: B256,
    pub log_index: u64,
    pub block_number: u64,
    pub block_timestamp: Timestamp,
}

/// Strategy membership change reported by a vault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyChange {
    Added,
    Revoked,
}

/// Event body, tagged by `type`. Field names are camelCase like [`EventMeta`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventPayload {
    Deposit {
        sender: Address,
        owner: Address,
        #[serde(with = "dec_u256")]
        assets: U256,
        #[serde(with = "dec_u256")]
        shares: U256,
    },
    Withdraw {
        sender: Address,
        receiver: Address,
        owner: Address,
        #[serde(with = "dec_u256")]
        assets: U256,
        #[serde(with = "dec_u256")]
        shares: U256,
    },
    Transfer {
        sender: Address,
        receiver: Address,
        #[serde(with = "dec_u256")]
        value: U256,
    },
    StrategyChanged {
        strategy: Address,
        change: StrategyChange,
    },
    /// Vault-side report of a strategy's gain/loss.
    #[serde(rename_all = "camelCase")]
    StrategyReported {
        strategy: Address,
        #[serde(with = "dec_u256")]
        gain: U256,
        #[serde(with = "dec_u256")]
        loss: U256,
        #[serde(with = "dec_u256")]
        current_debt: U256,
        #[serde(with = "dec_u256")]
        protocol_fees: U256,
        #[serde(with = "dec_u256")]
        total_fees: U256,
        #[serde(with = "dec_u256")]
        total_refunds: U256,
    },
    /// Strategy-side report, emitted by the strategy itself.
    #[serde(rename_all = "camelCase")]
    Reported {
        #[serde(with = "dec_u256")]
        profit: U256,
        #[serde(with = "dec_u256")]
        loss: U256,
        #[serde(with = "dec_u256")]
        protocol_fees: U256,
        #[serde(with = "dec_u256")]
        performance_fees: U256,
    },
    StrategyRebalance,
    Shutdown,
    NewVault {
        vault: Address,
        asset: Address,
    },
    NewStrategy {
        strategy: Address,
        asset: Address,
    },
    /// Block-processing tick for the vault at `meta.address`.
    Block,
}

impl EventPayload {
    pub fn name(&self) -> &'static str {
        match self {
            EventPayload::Deposit { .. } => "deposit",
            EventPayload::Withdraw { .. } => "withdraw",
            EventPayload::Transfer { .. } => "transfer",
            EventPayload::StrategyChanged { .. } => "strategy_changed",
            EventPayload::StrategyReported { .. } => "strategy_reported",
            EventPayload::Reported { .. } => "reported",
            EventPayload::StrategyRebalance => "strategy_rebalance",
            EventPayload::Shutdown => "shutdown",
            EventPayload::NewVault { .. } => "new_vault",
            EventPayload::NewStrategy { .. } => "new_strategy",
            EventPayload::Block => "block",
        }
    }
}

/// One delivered event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEvent {
    pub meta: EventMeta,
    pub payload: EventPayload,
}

impl LedgerEvent {
    pub fn new(meta: EventMeta, payload: EventPayload) -> Self {
        Self { meta, payload }
    }
}
