//! Payout Service
//!
//! Owns the transaction lifecycle around one dispatch:
//! validate -> record `pending` -> dispatch -> settle to processing/success/failed.

use std::sync::Arc;

use tracing::{error, info, warn};

use super::adapter::{BalancePassthrough, GatewayAdapter};
use super::error::PayoutError;
use super::payload;
use super::state::{self, TransactionStatus};
use super::store::TransactionStore;
use super::types::{Transaction, TransferRequest, TransferResult};

/// Stored record after dispatch plus the raw dispatcher result.
#[derive(Debug, Clone)]
pub struct SubmitOutcome {
    pub transaction: Transaction,
    pub result: TransferResult,
}

pub struct PayoutService {
    adapter: Arc<dyn GatewayAdapter>,
    store: Arc<dyn TransactionStore>,
}

impl PayoutService {
    pub fn new(adapter: Arc<dyn GatewayAdapter>, store: Arc<dyn TransactionStore>) -> Self {
        Self { adapter, store }
    }

    pub fn store(&self) -> Arc<dyn TransactionStore> {
        self.store.clone()
    }

    /// Submit a transfer.
    ///
    /// Validation errors return `Err` with nothing recorded. Once the pending
    /// record exists the call only fails on storage errors; gateway failures
    /// come back as `Ok` with a `failed` transaction.
    pub async fn submit(
        &self,
        req: TransferRequest,
        vendor_id: Option<String>,
    ) -> Result<SubmitOutcome, PayoutError> {
        let built = payload::build(&req)?;

        // Record under the reference the gateway will echo back
        let mut req = req;
        req.merchant_reference_id = built.merchant_reference_id;
        let reference = req.merchant_reference_id.clone();
        let pending = Transaction::pending(&req, vendor_id);
        self.store.create(&pending).await?;
        info!(
            merchant_reference_id = %reference,
            mode = %req.mode,
            adapter = self.adapter.name(),
            store = self.store.name(),
            "Payout recorded as pending"
        );

        let result = self.adapter.send_transfer(&req).await;

        let applied = match &result {
            TransferResult::Failure { error: e } => {
                if e.is_internal() {
                    error!(merchant_reference_id = %reference, error = %e, "Payout failed on an internal fault");
                }
                self.store
                    .mark_failed_if(&reference, TransactionStatus::Pending, &e.public_message())
                    .await?
            }
            TransferResult::Success { .. } => {
                let update = state::on_dispatch(&result);
                self.store
                    .update_if(&reference, TransactionStatus::Pending, None, &update)
                    .await?
            }
        };
        if !applied {
            // A callback settled the record while the gateway call was in flight
            warn!(
                merchant_reference_id = %reference,
                "Record left pending before dispatch completed; keeping its state"
            );
        }

        let transaction = self
            .store
            .get(&reference)
            .await?
            .ok_or_else(|| PayoutError::UnknownReference(reference.clone()))?;

        info!(
            merchant_reference_id = %reference,
            status = %transaction.status,
            "Payout dispatched"
        );
        Ok(SubmitOutcome {
            transaction,
            result,
        })
    }

    /// Look up a stored transaction.
    pub async fn transaction(&self, merchant_reference_id: &str) -> Result<Transaction, PayoutError> {
        self.store
            .get(merchant_reference_id)
            .await?
            .ok_or_else(|| PayoutError::UnknownReference(merchant_reference_id.to_string()))
    }

    pub async fn account_balance(&self) -> Result<BalancePassthrough, PayoutError> {
        self.adapter.account_balance().await
    }
}
