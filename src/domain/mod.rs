//! Domain types for the vault accounting ledger.
//!
//! This module provides:
//! - Integer amount helpers and decimal-string serde adapters
//! - Domain primitives: Timestamp, Address, B256
//! - Entity records: Vault, Strategy, UserVaultPosition, VaultSnapshot,
//!   TransactionRecord, ProtocolStats
//! - Inbound events and their stable chain ordering

pub mod amount;
pub mod event;
pub mod ordering;
pub mod position;
pub mod primitives;
pub mod protocol;
pub mod snapshot;
pub mod strategy;
pub mod transaction;
pub mod vault;

pub use event::{EventMeta, EventPayload, LedgerEvent, StrategyChange};
pub use ordering::EventOrderingKey;
pub use position::UserVaultPosition;
pub use primitives::{Address, Timestamp, B256};
pub use protocol::ProtocolStats;
pub use snapshot::{SnapshotKind, VaultSnapshot};
pub use strategy::{Strategy, StrategyBalances, StrategyReport};
pub use transaction::{TransactionRecord, TransactionType};
pub use vault::Vault;
