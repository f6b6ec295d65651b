use std::sync::Arc;

use crate::db::Database;
use crate::payout::{CallbackProcessor, PayoutService};

/// Shared gateway state
#[derive(Clone)]
pub struct AppState {
    /// Outbound transfers and transaction lookups
    pub payout: Arc<PayoutService>,
    /// Inbound webhook reconciliation
    pub callbacks: Arc<CallbackProcessor>,
    /// PostgreSQL pool, `None` in in-memory mode
    pub pg_db: Option<Arc<Database>>,
}

impl AppState {
    pub fn new(
        payout: Arc<PayoutService>,
        callbacks: Arc<CallbackProcessor>,
        pg_db: Option<Arc<Database>>,
    ) -> Self {
        Self {
            payout,
            callbacks,
            pg_db,
        }
    }
}
