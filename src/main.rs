use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use vaultledger::engine::SnapshotScheduler;
use vaultledger::{api, config::Config, db::init_db, LedgerContext, Oracle, Repository, RpcOracle};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .init();

    let config = Config::from_env().context("Configuration error")?;
    let port = config.port;

    let pool = init_db(&config.database_path)
        .await
        .context("Failed to initialize database")?;

    let repo = Arc::new(Repository::new(pool));
    let oracle: Arc<dyn Oracle> = Arc::new(RpcOracle::new(config.rpc_url.clone()));
    let scheduler = SnapshotScheduler::new(config.snapshot_policy, config.bucket_durations);
    tracing::info!(
        policy = ?config.snapshot_policy,
        hourly = config.bucket_durations.hourly,
        daily = config.bucket_durations.daily,
        weekly = config.bucket_durations.weekly,
        "Snapshot scheduler configured"
    );

    let ledger = LedgerContext::new(repo, oracle, scheduler);
    let app = api::create_router(api::AppState::new(ledger));

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
