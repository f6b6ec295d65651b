//! Callback Processor
//!
//! Decrypts gateway webhooks and reconciles them onto stored transactions.
//!
//! Rules:
//! - Nothing is written unless the body decrypts and parses completely
//! - Unknown references are rejected, never created
//! - Re-delivery of an already applied report is a no-op
//! - Writes are CAS on the observed `(status, utr)`; a lost race re-reads and
//!   re-decides, bounded by [`MAX_RECONCILE_ATTEMPTS`]

use std::str::FromStr;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};
use utoipa::ToSchema;

use super::cipher::{self, EncryptionKey};
use super::error::PayoutError;
use super::state::{self, CallbackDecision, TransactionStatus};
use super::store::TransactionStore;
use super::types::{CallbackReport, ReconciliationOutcome};

pub const MAX_RECONCILE_ATTEMPTS: usize = 5;

/// Webhook body as delivered by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CallbackEnvelope {
    /// Base64 AES-256-CBC ciphertext
    pub data: String,
    /// 16-character IV used for this body
    pub iv: String,
}

pub struct CallbackProcessor {
    store: Arc<dyn TransactionStore>,
    encryption_key: EncryptionKey,
}

impl CallbackProcessor {
    pub fn new(store: Arc<dyn TransactionStore>, encryption_key: EncryptionKey) -> Self {
        Self {
            store,
            encryption_key,
        }
    }

    /// Decrypt, validate and reconcile one callback.
    pub async fn process_callback(
        &self,
        envelope: &CallbackEnvelope,
    ) -> Result<ReconciliationOutcome, PayoutError> {
        let report = match self.parse_report(envelope) {
            Ok(report) => report,
            Err(e) => {
                warn!(error = %e, "Rejected callback");
                return Err(e);
            }
        };

        debug!(
            merchant_reference_id = %report.merchant_reference_id,
            status = %report.status,
            "Callback decoded"
        );
        self.reconcile(&report).await
    }

    /// Decrypt the envelope and extract the settlement report.
    pub fn parse_report(&self, envelope: &CallbackEnvelope) -> Result<CallbackReport, PayoutError> {
        // The key was validated at startup, so a length fault here is the IV
        // the sender supplied.
        let plaintext = cipher::decrypt(
            &envelope.data,
            self.encryption_key.as_bytes(),
            envelope.iv.as_bytes(),
        )
        .map_err(|e| match e {
            PayoutError::InvalidKeyMaterial(msg) => PayoutError::DecryptionFailed(msg),
            other => other,
        })?;

        let body: Value = serde_json::from_slice(&plaintext)
            .map_err(|_| PayoutError::DecryptionFailed("plaintext is not valid JSON".into()))?;

        parse_report_body(&body)
    }

    async fn reconcile(&self, report: &CallbackReport) -> Result<ReconciliationOutcome, PayoutError> {
        let reference = report.merchant_reference_id.as_str();

        for attempt in 1..=MAX_RECONCILE_ATTEMPTS {
            let Some(current) = self.store.get(reference).await? else {
                warn!(merchant_reference_id = %reference, "Callback for unknown reference");
                return Err(PayoutError::UnknownReference(reference.to_string()));
            };

            if attempt == 1 {
                if let Some(amount) = report.amount {
                    if amount != current.amount {
                        warn!(
                            merchant_reference_id = %reference,
                            reported = %amount,
                            stored = %current.amount,
                            "Callback amount differs from stored amount"
                        );
                    }
                }
            }

            let (update, in_table, utr_conflict) = match state::on_callback(&current, report) {
                CallbackDecision::NoOp => {
                    info!(
                        merchant_reference_id = %reference,
                        status = %current.status,
                        "Duplicate callback ignored"
                    );
                    return Ok(ReconciliationOutcome::NoOp {
                        merchant_reference_id: reference.to_string(),
                        status: current.status,
                    });
                }
                CallbackDecision::Apply {
                    update,
                    in_table,
                    utr_conflict,
                } => (update, in_table, utr_conflict),
            };

            if !in_table {
                warn!(
                    merchant_reference_id = %reference,
                    from = %current.status,
                    to = %update.status,
                    "Out-of-order status transition applied"
                );
            }
            if utr_conflict {
                warn!(
                    merchant_reference_id = %reference,
                    "Callback carried a different utr; keeping the stored one"
                );
            }

            let applied = self
                .store
                .update_if(reference, current.status, current.utr.as_deref(), &update)
                .await?;

            if applied {
                info!(
                    merchant_reference_id = %reference,
                    from = %current.status,
                    to = %update.status,
                    "Callback reconciled"
                );
                return Ok(ReconciliationOutcome::Applied {
                    merchant_reference_id: reference.to_string(),
                    from: current.status,
                    to: update.status,
                    utr: update.utr,
                });
            }

            debug!(merchant_reference_id = %reference, attempt, "Lost update race, re-reading");
        }

        warn!(merchant_reference_id = %reference, "Callback gave up after repeated conflicts");
        Err(PayoutError::Conflict(reference.to_string()))
    }
}

/// Validate the decrypted `{ "data": { ... } }` document.
pub fn parse_report_body(body: &Value) -> Result<CallbackReport, PayoutError> {
    let data = body
        .get("data")
        .and_then(Value::as_object)
        .ok_or_else(|| PayoutError::MalformedCallback("missing data object".into()))?;

    let merchant_reference_id = data
        .get("merchant_reference_id")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| PayoutError::MalformedCallback("missing merchant_reference_id".into()))?
        .to_string();

    let status = data
        .get("status")
        .and_then(Value::as_str)
        .ok_or_else(|| PayoutError::MalformedCallback("missing status".into()))
        .and_then(|s| {
            TransactionStatus::from_str(s).map_err(PayoutError::MalformedCallback)
        })?;

    let utr = match data.get("utr") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Some(_) => return Err(PayoutError::MalformedCallback("utr must be a string".into())),
    };

    let amount = match data.get("amount") {
        None | Some(Value::Null) => None,
        Some(Value::Number(n)) => Some(parse_amount(&n.to_string())?),
        Some(Value::String(s)) => Some(parse_amount(s)?),
        Some(_) => return Err(PayoutError::MalformedCallback("amount must be numeric".into())),
    };

    Ok(CallbackReport {
        merchant_reference_id,
        utr,
        amount,
        status,
    })
}

fn parse_amount(raw: &str) -> Result<Decimal, PayoutError> {
    let raw = raw.trim();
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .map_err(|_| PayoutError::MalformedCallback(format!("invalid amount: {raw}")))
}
