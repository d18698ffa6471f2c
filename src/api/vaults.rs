use crate::api::{iso, parse_address, AppState};
use crate::domain::amount::{to_display_decimal, to_display_decimal_signed};
use crate::domain::{SnapshotKind, Strategy, Vault, VaultSnapshot};
use crate::error::AppError;
use axum::extract::{Path, Query, State};
use axum::Json;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtocolResponse {
    pub vaults: Vec<String>,
    pub strategies: Vec<String>,
}

pub async fn get_protocol(State(state): State<AppState>) -> Result<Json<ProtocolResponse>, AppError> {
    let stats = state.repo.get_protocol_stats().await?;
    Ok(Json(ProtocolResponse {
        vaults: stats.vaults.iter().map(|a| a.to_string()).collect(),
        strategies: stats.strategies.iter().map(|a| a.to_string()).collect(),
    }))
}

/// Raw integer amounts as strings, plus a scaled rendering where it fits.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultDto {
    pub address: String,
    pub name: String,
    pub symbol: String,
    pub asset: String,
    pub decimals: u8,
    pub total_assets: String,
    pub total_supply: String,
    pub price_per_share: String,
    pub price_per_share_reference: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_per_share_display: Option<Decimal>,
    pub total_deposited: String,
    pub total_withdrawn: String,
    pub realized_pnl_reference: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub realized_pnl_reference_display: Option<Decimal>,
    pub total_gain: String,
    pub total_loss: String,
    pub total_fees: String,
    pub total_refunds: String,
    pub strategies: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_strategy: Option<String>,
    pub is_shutdown: bool,
    pub last_updated: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated_at: Option<String>,
    pub last_hourly_snapshot: u64,
    pub last_daily_snapshot: u64,
    pub last_weekly_snapshot: u64,
}

impl From<&Vault> for VaultDto {
    fn from(v: &Vault) -> Self {
        VaultDto {
            address: v.address.to_string(),
            name: v.name.clone(),
            symbol: v.symbol.clone(),
            asset: v.asset.to_string(),
            decimals: v.decimals,
            total_assets: v.total_assets.to_string(),
            total_supply: v.total_supply.to_string(),
            price_per_share: v.price_per_share.to_string(),
            price_per_share_reference: v.price_per_share_reference.to_string(),
            price_per_share_display: to_display_decimal(v.price_per_share, v.decimals),
            total_deposited: v.total_deposited.to_string(),
            total_withdrawn: v.total_withdrawn.to_string(),
            realized_pnl_reference: v.realized_pnl_reference.to_string(),
            realized_pnl_reference_display: to_display_decimal_signed(
                v.realized_pnl_reference,
                v.decimals,
            ),
            total_gain: v.total_gain.to_string(),
            total_loss: v.total_loss.to_string(),
            total_fees: v.total_fees.to_string(),
            total_refunds: v.total_refunds.to_string(),
            strategies: v.strategies.iter().map(|s| s.to_string()).collect(),
            default_strategy: v.default_strategy().map(|s| s.to_string()),
            is_shutdown: v.is_shutdown,
            last_updated: v.last_updated.as_secs(),
            last_updated_at: iso(v.last_updated),
            last_hourly_snapshot: v.last_hourly_snapshot.as_secs(),
            last_daily_snapshot: v.last_daily_snapshot.as_secs(),
            last_weekly_snapshot: v.last_weekly_snapshot.as_secs(),
        }
    }
}

pub async fn get_vault(
    Path(address): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<VaultDto>, AppError> {
    let address = parse_address(&address, "vault")?;
    let vault = state
        .repo
        .get_vault(&address)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("vault {}", address)))?;
    Ok(Json(VaultDto::from(&vault)))
}

#[derive(Debug, Deserialize)]
pub struct SnapshotsQuery {
    pub kind: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotDto {
    pub kind: SnapshotKind,
    pub timestamp: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp_at: Option<String>,
    pub block_number: u64,
    pub price_per_share: String,
    pub price_per_share_reference: String,
    pub total_assets: String,
    pub deposit_apy: Decimal,
    pub borrow_apy: Decimal,
}

impl From<&VaultSnapshot> for SnapshotDto {
    fn from(s: &VaultSnapshot) -> Self {
        SnapshotDto {
            kind: s.kind,
            timestamp: s.timestamp.as_secs(),
            timestamp_at: iso(s.timestamp),
            block_number: s.block_number,
            price_per_share: s.price_per_share.to_string(),
            price_per_share_reference: s.price_per_share_reference.to_string(),
            total_assets: s.total_assets.to_string(),
            deposit_apy: s.deposit_apy,
            borrow_apy: s.borrow_apy,
        }
    }
}

pub async fn get_snapshots(
    Path(address): Path<String>,
    Query(params): Query<SnapshotsQuery>,
    State(state): State<AppState>,
) -> Result<Json<Vec<SnapshotDto>>, AppError> {
    let address = parse_address(&address, "vault")?;
    let kind = match params.kind.as_deref() {
        Some(raw) => Some(SnapshotKind::from_str(raw).map_err(AppError::BadRequest)?),
        None => None,
    };

    let snapshots = state.repo.query_snapshots(&address, kind).await?;
    Ok(Json(snapshots.iter().map(SnapshotDto::from).collect()))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyDto {
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vault: Option<String>,
    pub name: String,
    pub symbol: String,
    pub asset: String,
    pub decimals: u8,
    pub total_assets: String,
    pub total_supply: String,
    pub total_collateral: String,
    pub total_debt: String,
    pub current_debt: String,
    pub price_per_share: String,
    pub performance_fee_bps: u16,
    pub total_profit: String,
    pub total_loss: String,
    pub total_protocol_fees: String,
    pub total_performance_fees: String,
    pub is_active: bool,
    pub last_report: u64,
}

impl From<&Strategy> for StrategyDto {
    fn from(s: &Strategy) -> Self {
        StrategyDto {
            address: s.address.to_string(),
            vault: s.vault.map(|v| v.to_string()),
            name: s.name.clone(),
            symbol: s.symbol.clone(),
            asset: s.asset.to_string(),
            decimals: s.decimals,
            total_assets: s.total_assets.to_string(),
            total_supply: s.total_supply.to_string(),
            total_collateral: s.total_collateral.to_string(),
            total_debt: s.total_debt.to_string(),
            current_debt: s.current_debt.to_string(),
            price_per_share: s.price_per_share.to_string(),
            performance_fee_bps: s.performance_fee_bps,
            total_profit: s.total_profit.to_string(),
            total_loss: s.total_loss.to_string(),
            total_protocol_fees: s.total_protocol_fees.to_string(),
            total_performance_fees: s.total_performance_fees.to_string(),
            is_active: s.is_active,
            last_report: s.last_report.as_secs(),
        }
    }
}

pub async fn get_strategy(
    Path(address): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<StrategyDto>, AppError> {
    let address = parse_address(&address, "strategy")?;
    let strategy = state
        .repo
        .get_strategy(&address)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("strategy {}", address)))?;
    Ok(Json(StrategyDto::from(&strategy)))
}
