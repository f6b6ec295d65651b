//! End-to-end payout flows: dispatch through the simulated gateway, then
//! settle through encrypted callbacks, all on the in-memory store.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde_json::json;

use crate::payout::callback::{CallbackEnvelope, CallbackProcessor};
use crate::payout::cipher::{self, EncryptionKey};
use crate::payout::dispatcher::TransferDispatcher;
use crate::payout::dispatcher::sim::{self, Behavior};
use crate::payout::error::PayoutError;
use crate::payout::service::PayoutService;
use crate::payout::state::TransactionStatus;
use crate::payout::store::{MemoryTransactionStore, TransactionStore};
use crate::payout::types::{
    Beneficiary, PaymentMode, ReconciliationOutcome, TransferRequest,
    generate_merchant_reference_id,
};

struct TestHarness {
    service: PayoutService,
    callbacks: CallbackProcessor,
    store: Arc<MemoryTransactionStore>,
    sim: sim::SimState,
}

impl TestHarness {
    async fn new(behavior: Behavior) -> Self {
        let (url, sim) = sim::spawn(behavior).await;
        let dispatcher = TransferDispatcher::new(sim::config(&url)).unwrap();
        let store = Arc::new(MemoryTransactionStore::new());
        Self {
            service: PayoutService::new(Arc::new(dispatcher), store.clone()),
            callbacks: CallbackProcessor::new(
                store.clone(),
                EncryptionKey::new(sim::ENC_KEY).unwrap(),
            ),
            store,
            sim,
        }
    }
}

fn gateway_callback(reference: &str, status: &str, utr: Option<&str>, amount: u32) -> CallbackEnvelope {
    let iv = "Qw3rTy7uI9oP1aS2";
    let body = json!({
        "data": {
            "merchant_reference_id": reference,
            "utr": utr,
            "amount": amount,
            "status": status
        }
    });
    CallbackEnvelope {
        data: cipher::encrypt(
            &serde_json::to_vec(&body).unwrap(),
            sim::ENC_KEY.as_bytes(),
            iv.as_bytes(),
        )
        .unwrap(),
        iv: iv.to_string(),
    }
}

fn upi(reference: &str) -> TransferRequest {
    TransferRequest::new(
        Beneficiary::upi("Jane Doe", "9999999999", "jane@upi"),
        Decimal::from(500),
        reference,
        PaymentMode::Upi,
    )
}

// ========================================================================
// Happy Path
// ========================================================================

/// pending -> processing -> success
#[tokio::test]
async fn test_upi_dispatch_then_success_callback() {
    let h = TestHarness::new(Behavior::Accept("processing")).await;
    let reference = generate_merchant_reference_id("a1b2c3d4-vendor");

    let outcome = h
        .service
        .submit(upi(&reference), Some("a1b2c3d4-vendor".into()))
        .await
        .unwrap();
    assert_eq!(outcome.transaction.status, TransactionStatus::Processing);

    let result = h
        .callbacks
        .process_callback(&gateway_callback(&reference, "success", Some("UTR1"), 500))
        .await
        .unwrap();
    assert!(matches!(result, ReconciliationOutcome::Applied { .. }));

    let tx = h.service.transaction(&reference).await.unwrap();
    assert_eq!(tx.status, TransactionStatus::Success);
    assert_eq!(tx.utr.as_deref(), Some("UTR1"));
    assert_eq!(h.sim.received.lock().unwrap().len(), 1);
}

/// Bank transfer, then a reversal after settlement
#[tokio::test]
async fn test_neft_success_then_reversal() {
    let h = TestHarness::new(Behavior::Accept("processing")).await;
    let req = TransferRequest::new(
        Beneficiary::bank("Ravi Kumar", "9876543210", "001234567890", "HDFC0001234", "HDFC Bank"),
        Decimal::new(125050, 2),
        "REF-NEFT-1",
        PaymentMode::Neft,
    );
    h.service.submit(req, None).await.unwrap();

    h.callbacks
        .process_callback(&gateway_callback("REF-NEFT-1", "success", Some("UTR9"), 1250))
        .await
        .unwrap();
    h.callbacks
        .process_callback(&gateway_callback("REF-NEFT-1", "reversed", None, 1250))
        .await
        .unwrap();

    let tx = h.store.get("REF-NEFT-1").await.unwrap().unwrap();
    assert_eq!(tx.status, TransactionStatus::Reversed);
    assert_eq!(tx.utr.as_deref(), Some("UTR9"));

    let payload = &h.sim.received.lock().unwrap()[0];
    assert_eq!(payload["transfer_type"], "NEFT");
    assert_eq!(payload["amount"], "1250.5");
}

// ========================================================================
// Failure Paths
// ========================================================================

#[tokio::test]
async fn test_gateway_rejection_marks_failed() {
    let h = TestHarness::new(Behavior::Reject("Invalid VPA")).await;
    let outcome = h.service.submit(upi("REF-REJ"), None).await.unwrap();

    assert_eq!(outcome.transaction.status, TransactionStatus::Failed);
    assert_eq!(outcome.transaction.error_message.as_deref(), Some("Invalid VPA"));
}

#[tokio::test]
async fn test_garbage_response_marks_failed() {
    let h = TestHarness::new(Behavior::Garbage).await;
    let outcome = h.service.submit(upi("REF-GARBAGE"), None).await.unwrap();
    assert_eq!(outcome.transaction.status, TransactionStatus::Failed);
}

/// Callback for a reference that was never dispatched
#[tokio::test]
async fn test_unsolicited_callback_rejected() {
    let h = TestHarness::new(Behavior::Accept("processing")).await;
    let err = h
        .callbacks
        .process_callback(&gateway_callback("REF-GHOST", "success", Some("UTR1"), 500))
        .await
        .unwrap_err();

    assert_eq!(err, PayoutError::UnknownReference("REF-GHOST".into()));
    assert!(h.store.is_empty());
}

/// Gateway retries the same webhook several times
#[tokio::test]
async fn test_retried_webhook_is_idempotent() {
    let h = TestHarness::new(Behavior::Accept("processing")).await;
    h.service.submit(upi("REF-RETRY"), None).await.unwrap();

    let callback = gateway_callback("REF-RETRY", "success", Some("UTR1"), 500);
    let first = h.callbacks.process_callback(&callback).await.unwrap();
    assert!(!first.is_noop());
    let writes = h.store.write_count();

    for _ in 0..3 {
        assert!(h.callbacks.process_callback(&callback).await.unwrap().is_noop());
    }
    assert_eq!(h.store.write_count(), writes);
}
