//! Gateway webhook handler

use std::sync::Arc;

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};

use super::super::state::AppState;
use super::super::types::{ApiError, WebhookAck, error_codes};
use crate::payout::CallbackEnvelope;

/// Receive a settlement callback
///
/// POST /api/payout/webhook
///
/// Any non-2xx answer makes the gateway redeliver.
#[utoipa::path(
    post,
    path = "/api/payout/webhook",
    request_body = CallbackEnvelope,
    responses(
        (status = 200, description = "Applied or already applied", body = WebhookAck, content_type = "application/json"),
        (status = 400, description = "Undecryptable or malformed callback"),
        (status = 404, description = "Unknown merchant reference"),
        (status = 409, description = "Concurrent update conflict"),
        (status = 500, description = "Storage failure")
    ),
    tag = "Payout"
)]
pub async fn payout_webhook(
    State(state): State<Arc<AppState>>,
    body: Result<Json<CallbackEnvelope>, JsonRejection>,
) -> Result<Json<WebhookAck>, ApiError> {
    let Json(envelope) = body.map_err(|e| {
        ApiError::new(
            StatusCode::BAD_REQUEST,
            error_codes::MALFORMED_CALLBACK,
            e.body_text(),
        )
    })?;

    state.callbacks.process_callback(&envelope).await?;
    Ok(Json(WebhookAck { ok: true }))
}
