//! Vendor payout handlers

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};

use super::super::state::AppState;
use super::super::types::{ApiError, ApiResult, FundTransferData, FundTransferRequest, ok};
use crate::payout::{Transaction, TransferResult};

/// Submit a fund transfer
///
/// POST /api/payout/fundTransfer
///
/// The transaction is recorded before dispatch, so a gateway failure still
/// returns its reference and final status in `data`.
#[utoipa::path(
    post,
    path = "/api/payout/fundTransfer",
    request_body = FundTransferRequest,
    responses(
        (status = 200, description = "Transfer accepted by the gateway", body = FundTransferData, content_type = "application/json"),
        (status = 400, description = "Invalid beneficiary, amount or body"),
        (status = 409, description = "Merchant reference already used"),
        (status = 502, description = "Gateway rejected or unreachable; transaction recorded as failed"),
        (status = 500, description = "Service misconfigured")
    ),
    tag = "Payout"
)]
pub async fn create_fund_transfer(
    State(state): State<Arc<AppState>>,
    body: Result<Json<FundTransferRequest>, JsonRejection>,
) -> ApiResult<FundTransferData> {
    let Json(body) = body.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let (req, vendor_id) = body.into_parts();

    let outcome = state.payout.submit(req, vendor_id).await?;
    let data = FundTransferData::new(&outcome.transaction, outcome.result.message());

    match outcome.result {
        TransferResult::Success { .. } => ok(data),
        TransferResult::Failure { error } => ApiError::from(error).with_data(data).into_err(),
    }
}

/// Look up a stored transaction
///
/// GET /api/payout/transactions/{merchant_reference_id}
#[utoipa::path(
    get,
    path = "/api/payout/transactions/{merchant_reference_id}",
    params(
        ("merchant_reference_id" = String, Path, description = "Merchant reference id")
    ),
    responses(
        (status = 200, description = "Transaction record", body = Transaction, content_type = "application/json"),
        (status = 404, description = "Unknown merchant reference")
    ),
    tag = "Payout"
)]
pub async fn get_transaction(
    State(state): State<Arc<AppState>>,
    Path(merchant_reference_id): Path<String>,
) -> ApiResult<Transaction> {
    let tx = state.payout.transaction(&merchant_reference_id).await?;
    ok(tx)
}
