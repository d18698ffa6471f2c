pub mod events;
pub mod health;
pub mod positions;
pub mod transactions;
pub mod vaults;

use crate::db::Repository;
use crate::domain::{Address, Timestamp};
use crate::error::AppError;
use crate::orchestration::LedgerContext;
use axum::{
    routing::{get, post},
    Router,
};
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    /// Event processing is exclusive; reads go straight to the repository.
    pub ledger: Arc<Mutex<LedgerContext>>,
}

impl AppState {
    pub fn new(ledger: LedgerContext) -> Self {
        Self {
            repo: ledger.repo().clone(),
            ledger: Arc::new(Mutex::new(ledger)),
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route("/v1/events", post(events::post_events))
        .route("/v1/protocol", get(vaults::get_protocol))
        .route("/v1/vaults/:address", get(vaults::get_vault))
        .route("/v1/vaults/:address/snapshots", get(vaults::get_snapshots))
        .route("/v1/strategies/:address", get(vaults::get_strategy))
        .route("/v1/positions", get(positions::get_positions))
        .route("/v1/transactions/:hash", get(transactions::get_transaction))
        .layer(cors)
        .with_state(state)
}

pub(crate) fn parse_address(raw: &str, what: &str) -> Result<Address, AppError> {
    Address::from_str(raw).map_err(|_| AppError::BadRequest(format!("Invalid {} address", what)))
}

/// RFC 3339 rendering of a block timestamp; None for the zero "never" value.
pub(crate) fn iso(ts: Timestamp) -> Option<String> {
    if ts.as_secs() == 0 {
        return None;
    }
    chrono::DateTime::<chrono::Utc>::from_timestamp(ts.as_i64(), 0).map(|dt| dt.to_rfc3339())
}
