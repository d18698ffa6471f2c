//! SQLite storage for ledger entities.
//!
//! Every entity is loaded by key and upserted by key. Write-once records
//! (transactions, snapshots, strategy reports) use `ON CONFLICT DO NOTHING`.

pub mod migrations;
pub mod repo;

pub use migrations::init_db;
pub use repo::Repository;
