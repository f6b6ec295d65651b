pub mod handlers;
pub mod openapi;
pub mod state;
pub mod types;

use axum::{
    Json, Router,
    routing::{get, post},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use utoipa::OpenApi;

use state::AppState;

/// All routes, state attached.
pub fn build_router(state: Arc<AppState>) -> Router {
    let payout_routes = Router::new()
        .route("/fundTransfer", post(handlers::create_fund_transfer))
        .route("/webhook", post(handlers::payout_webhook))
        .route(
            "/transactions/{merchant_reference_id}",
            get(handlers::get_transaction),
        );

    Router::new()
        .route("/api/v1/health", get(handlers::health_check))
        .route("/api/account/balance", get(handlers::get_account_balance))
        .nest("/api/payout", payout_routes)
        .with_state(state)
        // Stateless, added after with_state
        .route(
            "/api-docs/openapi.json",
            get(|| async { Json(openapi::ApiDoc::openapi()) }),
        )
}

/// Bind and serve until the listener fails.
pub async fn run_server(host: &str, port: u16, state: Arc<AppState>) -> std::io::Result<()> {
    let app = build_router(state);

    let addr = format!("{}:{}", host, port);
    let listener = TcpListener::bind(&addr).await.inspect_err(|e| {
        tracing::error!("Failed to bind to {}: {} (port may already be in use)", addr, e);
    })?;

    tracing::info!("Gateway listening on http://{}", addr);
    tracing::info!("OpenAPI: http://{}/api-docs/openapi.json", addr);
    tracing::info!("Payout API: /api/payout/*");

    axum::serve(listener, app).await
}
