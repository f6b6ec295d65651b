//! Payout account handlers

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode};
use serde_json::Value;

use super::super::state::AppState;
use super::super::types::ApiError;

/// Payout account balance
///
/// GET /api/account/balance
///
/// Gateway status and body are passed through unchanged.
#[utoipa::path(
    get,
    path = "/api/account/balance",
    responses(
        (status = 200, description = "Gateway balance response", content_type = "application/json"),
        (status = 502, description = "Gateway unreachable")
    ),
    tag = "Account"
)]
pub async fn get_account_balance(
    State(state): State<Arc<AppState>>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let balance = state.payout.account_balance().await?;
    let status = StatusCode::from_u16(balance.status).unwrap_or(StatusCode::BAD_GATEWAY);
    Ok((status, Json(balance.body)))
}
