//! Opening the ledger database.
//!
//! Connections are configured through [`SqliteConnectOptions`] so every pooled
//! connection gets the same journal, sync and lock settings. The schema is
//! applied in one transaction on startup.

use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

const SCHEMA: &str = include_str!("schema.sql");

/// A single writer plus a few concurrent API readers.
const MAX_CONNECTIONS: u32 = 4;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

fn connect_options(db_path: &Path) -> SqliteConnectOptions {
    SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .busy_timeout(BUSY_TIMEOUT)
}

/// Open the ledger database at `db_path`, creating the file and its parent
/// directories if needed, and bring the schema up to date.
pub async fn init_db(db_path: &str) -> Result<SqlitePool, sqlx::Error> {
    let path = Path::new(db_path);
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => std::fs::create_dir_all(dir)?,
        _ => {}
    }

    let pool = SqlitePoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .connect_with(connect_options(path))
        .await?;

    let applied = apply_schema(&pool).await?;
    info!(path = db_path, statements = applied, "Ledger database ready");
    Ok(pool)
}

/// Non-empty statements of `schema.sql`, in file order.
fn schema_statements(sql: &str) -> impl Iterator<Item = &str> {
    sql.split(';').map(str::trim).filter(|s| !s.is_empty())
}

/// Run every schema statement inside one transaction.
///
/// Statements are all `IF NOT EXISTS`, so applying to an existing
/// database changes nothing.
async fn apply_schema(pool: &SqlitePool) -> Result<usize, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let mut applied = 0;
    for statement in schema_statements(SCHEMA) {
        sqlx::query(statement).execute(&mut *tx).await?;
        applied += 1;
    }
    tx.commit().await?;

    debug!(applied, "Schema applied");
    Ok(applied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const TABLES: [&str; 7] = [
        "protocol_stats",
        "strategies",
        "strategy_reports",
        "transactions",
        "user_vault_positions",
        "vault_snapshots",
        "vaults",
    ];

    async fn tables(pool: &SqlitePool) -> Vec<String> {
        sqlx::query_scalar(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )
        .fetch_all(pool)
        .await
        .unwrap()
    }

    #[test]
    fn test_schema_statements_skip_blank_tail() {
        let statements: Vec<&str> = schema_statements("CREATE TABLE a (x);\n\n ;CREATE TABLE b (y);\n").collect();
        assert_eq!(statements, vec!["CREATE TABLE a (x)", "CREATE TABLE b (y)"]);

        assert!(schema_statements(SCHEMA).all(|s| s.contains("IF NOT EXISTS")));
    }

    #[tokio::test]
    async fn test_init_db_creates_nested_path_and_tables() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("data").join("nested").join("ledger.db");

        let pool = init_db(db_path.to_str().unwrap()).await.unwrap();

        assert!(db_path.exists());
        assert_eq!(tables(&pool).await, TABLES);
    }

    #[tokio::test]
    async fn test_reopen_keeps_rows() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("ledger.db");
        let db_path = db_path.to_str().unwrap();

        let pool = init_db(db_path).await.unwrap();
        sqlx::query("INSERT INTO protocol_stats (id) VALUES ('protocol')")
            .execute(&pool)
            .await
            .unwrap();
        pool.close().await;

        let pool = init_db(db_path).await.unwrap();
        let vaults: String = sqlx::query_scalar("SELECT vaults FROM protocol_stats WHERE id = 'protocol'")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(vaults, "[]");
        assert_eq!(tables(&pool).await.len(), TABLES.len());
    }

    #[tokio::test]
    async fn test_connections_share_settings() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("ledger.db");
        let pool = init_db(db_path.to_str().unwrap()).await.unwrap();

        // Hold one connection so the next query opens another.
        let mut held = pool.acquire().await.unwrap();
        let held_timeout: i64 = sqlx::query_scalar("PRAGMA busy_timeout")
            .fetch_one(&mut *held)
            .await
            .unwrap();
        let other_timeout: i64 = sqlx::query_scalar("PRAGMA busy_timeout")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(held_timeout, 5000);
        assert_eq!(other_timeout, 5000);

        // NORMAL
        let synchronous: i64 = sqlx::query_scalar("PRAGMA synchronous")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(synchronous, 1);

        let journal: String = sqlx::query_scalar("PRAGMA journal_mode")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(journal, "wal");
    }

    #[tokio::test]
    async fn test_vault_columns_are_required() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("ledger.db");
        let pool = init_db(db_path.to_str().unwrap()).await.unwrap();

        let result = sqlx::query("INSERT INTO vaults (address) VALUES ('0x1')")
            .execute(&pool)
            .await;
        assert!(result.is_err());

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM vaults")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }
}
