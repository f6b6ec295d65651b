//! Vendor payout service
//!
//! ```text
//! ┌──────────┐    ┌──────────────┐    ┌────────────┐    ┌─────────┐
//! │  Vendor  │───▶│ PayoutService│───▶│ Dispatcher │───▶│ Gateway │
//! │  (HTTP)  │    │ (store first)│    │(sign+AES)  │    │         │
//! └──────────┘    └──────────────┘    └────────────┘    └────┬────┘
//!                        ▲                                   │
//!                        │        ┌───────────────────┐      │
//!                        └────────│ CallbackProcessor │◀─────┘
//!                                 │ (decrypt + CAS)   │  webhook
//!                                 └───────────────────┘
//! ```

use std::sync::Arc;

use anyhow::Context;

use vendor_payout::config::{AppConfig, PaymentConfig};
use vendor_payout::db::Database;
use vendor_payout::gateway::{self, state::AppState};
use vendor_payout::payout::{
    CallbackProcessor, GatewayConfig, MemoryTransactionStore, PayoutService, PgTransactionStore,
    TransactionStore, TransferDispatcher,
};

/// Get environment from command line (--env argument)
fn get_env() -> String {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if (args[i] == "--env" || args[i] == "-e") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }
    "dev".to_string()
}

/// Get port override from command line (--port argument)
fn get_port_override() -> Option<u16> {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if args[i] == "--port" && i + 1 < args.len() {
            return args[i + 1].parse().ok();
        }
    }
    None
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = get_env();
    let app_config = AppConfig::load(&env).context("loading application config")?;
    let _log_guard = vendor_payout::logging::init_logging(&app_config)?;

    tracing::info!("Starting vendor payout service in {} mode", env);

    let payment = match PaymentConfig::from_env() {
        Ok(p) => p,
        Err(e) => {
            tracing::error!("Payment configuration invalid: {}", e);
            eprintln!("Payment configuration invalid: {}", e);
            std::process::exit(1);
        }
    };

    let (store, pg_db): (Arc<dyn TransactionStore>, Option<Arc<Database>>) =
        match &payment.database {
            Some(db_config) => {
                let db = Database::connect(db_config)
                    .await
                    .context("connecting to PostgreSQL")?;
                let store = PgTransactionStore::new(db.pool().clone());
                store.ensure_schema().await.context("applying schema")?;
                tracing::info!("Transaction store: PostgreSQL");
                (Arc::new(store), Some(Arc::new(db)))
            }
            None => {
                tracing::warn!(
                    "No database configured; transactions are kept in memory and lost on restart"
                );
                (Arc::new(MemoryTransactionStore::new()), None)
            }
        };

    let dispatcher = TransferDispatcher::new(GatewayConfig::from_payment(
        &payment,
        app_config.gateway.timeout(),
    ))
    .context("building gateway client")?;
    tracing::info!(
        base_url = %payment.api_url,
        timeout_secs = app_config.gateway.timeout_secs,
        "Gateway dispatcher ready"
    );

    let payout = Arc::new(PayoutService::new(Arc::new(dispatcher), store.clone()));
    let callbacks = Arc::new(CallbackProcessor::new(
        store,
        payment.encryption_key.clone(),
    ));
    let state = Arc::new(AppState::new(payout, callbacks, pg_db));

    let port = get_port_override().unwrap_or(app_config.server.port);
    gateway::run_server(&app_config.server.host, port, state)
        .await
        .context("gateway server")?;

    Ok(())
}
