use crate::api::{iso, AppState};
use crate::domain::{TransactionRecord, B256};
use crate::error::AppError;
use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;
use std::str::FromStr;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDto {
    pub tx_hash: String,
    pub vault: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub sender: String,
    pub owner: String,
    pub receiver: String,
    pub assets: String,
    pub shares: String,
    pub block_number: u64,
    pub block_timestamp: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_time: Option<String>,
    pub log_index: u64,
}

impl From<&TransactionRecord> for TransactionDto {
    fn from(t: &TransactionRecord) -> Self {
        TransactionDto {
            tx_hash: t.tx_hash.to_string(),
            vault: t.vault.to_string(),
            kind: t.kind.to_string(),
            sender: t.sender.to_string(),
            owner: t.owner.to_string(),
            receiver: t.receiver.to_string(),
            assets: t.assets.to_string(),
            shares: t.shares.to_string(),
            block_number: t.block_number,
            block_timestamp: t.block_timestamp.as_secs(),
            block_time: iso(t.block_timestamp),
            log_index: t.log_index,
        }
    }
}

pub async fn get_transaction(
    Path(hash): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<TransactionDto>, AppError> {
    let tx_hash =
        B256::from_str(&hash).map_err(|_| AppError::BadRequest("Invalid transaction hash".into()))?;
    let record = state
        .repo
        .get_transaction(&tx_hash)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("transaction {}", tx_hash)))?;
    Ok(Json(TransactionDto::from(&record)))
}
