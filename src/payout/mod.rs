//! Vendor Payout Core
//!
//! Sends signed, AES-encrypted fund transfers (UPI / IMPS / NEFT) to the
//! payout gateway and reconciles the gateway's webhook callbacks.
//!
//! # Outbound
//!
//! ```text
//! TransferRequest ─▶ payload::build ─▶ signer ─▶ JSON ─▶ cipher(iv) ─▶ POST {encdata,key,iv}
//! ```
//!
//! # Inbound
//!
//! ```text
//! {data,iv} ─▶ cipher ─▶ CallbackReport ─▶ state::on_callback ─▶ store.update_if (CAS)
//! ```
//!
//! # Invariants
//!
//! 1. **Validate first**: bad beneficiary/amount fails before any crypto,
//!    network or storage work
//! 2. **One IV per request**: every dispatch draws a fresh IV
//! 3. **No unsolicited records**: callbacks never create transactions
//! 4. **Sticky utr**: once stored, a utr is never replaced
//! 5. **Idempotent callbacks**: re-applying the same `{status, utr}` writes nothing

pub mod adapter;
pub mod callback;
pub mod cipher;
pub mod db;
pub mod dispatcher;
pub mod error;
pub mod iv;
pub mod payload;
pub mod service;
pub mod signer;
pub mod state;
pub mod store;
pub mod types;

#[cfg(test)]
mod integration_tests;

pub use adapter::{BalancePassthrough, GatewayAdapter};
pub use callback::{CallbackEnvelope, CallbackProcessor};
pub use cipher::EncryptionKey;
pub use db::PgTransactionStore;
pub use dispatcher::{GatewayConfig, OutboundEnvelope, TransferDispatcher};
pub use error::PayoutError;
pub use service::{PayoutService, SubmitOutcome};
pub use state::TransactionStatus;
pub use store::{MemoryTransactionStore, TransactionStore};
pub use types::{
    Beneficiary, CallbackReport, PaymentMode, ReconciliationOutcome, Transaction,
    TransferRequest, TransferResult, generate_merchant_reference_id,
};
