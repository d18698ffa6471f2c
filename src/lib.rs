pub mod api;
pub mod config;
pub mod db;
pub mod domain;
pub mod engine;
pub mod error;
pub mod oracle;
pub mod orchestration;

pub use config::Config;
pub use db::{init_db, Repository};
pub use domain::{
    Address, LedgerEvent, SnapshotKind, Strategy, Timestamp, TransactionRecord, UserVaultPosition,
    Vault, VaultSnapshot, B256,
};
pub use engine::{ConsistencyFault, SnapshotPolicy, SnapshotScheduler};
pub use error::AppError;
pub use oracle::{MockOracle, Oracle, OracleError, RpcOracle};
pub use orchestration::{EventOutcome, LedgerContext, ProcessError};
