use crate::api::{iso, parse_address, AppState};
use crate::domain::UserVaultPosition;
use crate::error::AppError;
use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct PositionsQuery {
    pub user: Option<String>,
    pub vault: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionDto {
    pub user: String,
    pub vault: String,
    pub current_shares: String,
    pub avg_price_per_share: String,
    pub avg_price_per_share_reference: String,
    pub total_deposited: String,
    pub total_withdrawn: String,
    pub total_deposited_reference: String,
    pub total_withdrawn_reference: String,
    pub realized_pnl: String,
    pub realized_pnl_reference: String,
    pub last_updated: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated_at: Option<String>,
}

impl From<&UserVaultPosition> for PositionDto {
    fn from(p: &UserVaultPosition) -> Self {
        PositionDto {
            user: p.user.to_string(),
            vault: p.vault.to_string(),
            current_shares: p.current_shares.to_string(),
            avg_price_per_share: p.avg_price_per_share.to_string(),
            avg_price_per_share_reference: p.avg_price_per_share_reference.to_string(),
            total_deposited: p.total_deposited.to_string(),
            total_withdrawn: p.total_withdrawn.to_string(),
            total_deposited_reference: p.total_deposited_reference.to_string(),
            total_withdrawn_reference: p.total_withdrawn_reference.to_string(),
            realized_pnl: p.realized_pnl.to_string(),
            realized_pnl_reference: p.realized_pnl_reference.to_string(),
            last_updated: p.last_updated.as_secs(),
            last_updated_at: iso(p.last_updated),
        }
    }
}

/// Positions for a user, a vault, or one (user, vault) pair. Closed positions are included.
pub async fn get_positions(
    Query(params): Query<PositionsQuery>,
    State(state): State<AppState>,
) -> Result<Json<Vec<PositionDto>>, AppError> {
    if params.user.is_none() && params.vault.is_none() {
        return Err(AppError::BadRequest("user or vault is required".into()));
    }

    let user = params
        .user
        .as_deref()
        .map(|u| parse_address(u, "user"))
        .transpose()?;
    let vault = params
        .vault
        .as_deref()
        .map(|v| parse_address(v, "vault"))
        .transpose()?;

    let positions = state
        .repo
        .query_positions(user.as_ref(), vault.as_ref())
        .await?;
    Ok(Json(positions.iter().map(PositionDto::from).collect()))
}
