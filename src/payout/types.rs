//! Payout domain types
//!
//! - [`TransferRequest`]: immutable vendor request (beneficiary + amount + mode)
//! - [`TransferResult`]: normalized dispatcher outcome, never an `Err`
//! - [`Transaction`]: the persisted record reconciled by callbacks
//! - [`CallbackReport`] / [`ReconciliationOutcome`]: inbound settlement data

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::error::PayoutError;
use super::state::TransactionStatus;

/// Transfer rail. Wire names are the upper-case tokens the gateway expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum PaymentMode {
    #[serde(rename = "UPI")]
    Upi,
    #[serde(rename = "IMPS")]
    Imps,
    #[serde(rename = "NEFT")]
    Neft,
}

impl PaymentMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMode::Upi => "UPI",
            PaymentMode::Imps => "IMPS",
            PaymentMode::Neft => "NEFT",
        }
    }
}

impl fmt::Display for PaymentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PaymentMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "UPI" => Ok(PaymentMode::Upi),
            "IMPS" => Ok(PaymentMode::Imps),
            "NEFT" => Ok(PaymentMode::Neft),
            other => Err(format!("unknown payment mode: {other}")),
        }
    }
}

/// Beneficiary descriptor.
///
/// Only the destination fields matching the request's mode are used: the VPA
/// for UPI, account number + IFSC + bank name for IMPS/NEFT.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Beneficiary {
    #[schema(example = "Jane Doe")]
    pub name: String,
    #[schema(example = "9999999999")]
    pub phone_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(example = "jane@upi")]
    pub vpa_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ifsc: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bank_name: Option<String>,
}

impl Beneficiary {
    /// UPI beneficiary
    pub fn upi(name: impl Into<String>, phone: impl Into<String>, vpa: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            phone_number: phone.into(),
            vpa_address: Some(vpa.into()),
            ..Default::default()
        }
    }

    /// IMPS/NEFT beneficiary
    pub fn bank(
        name: impl Into<String>,
        phone: impl Into<String>,
        account_number: impl Into<String>,
        ifsc: impl Into<String>,
        bank_name: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            phone_number: phone.into(),
            account_number: Some(account_number.into()),
            ifsc: Some(ifsc.into()),
            bank_name: Some(bank_name.into()),
            ..Default::default()
        }
    }
}

/// A single payout request. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    pub beneficiary: Beneficiary,
    pub amount: Decimal,
    pub merchant_reference_id: String,
    pub mode: PaymentMode,
    pub narration: Option<String>,
}

impl TransferRequest {
    pub fn new(
        beneficiary: Beneficiary,
        amount: Decimal,
        merchant_reference_id: impl Into<String>,
        mode: PaymentMode,
    ) -> Self {
        Self {
            beneficiary,
            amount,
            merchant_reference_id: merchant_reference_id.into(),
            mode,
            narration: None,
        }
    }

    pub fn with_narration(mut self, narration: impl Into<String>) -> Self {
        self.narration = Some(narration.into());
        self
    }
}

/// Normalized outcome of one dispatch. Every failure mode lands in `Failure`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferResult {
    /// Gateway answered 2xx with `status: "success"`
    Success {
        /// Status reported inside the gateway payload
        status: TransactionStatus,
        utr: Option<String>,
        message: String,
    },
    Failure { error: PayoutError },
}

impl TransferResult {
    pub fn failure(error: PayoutError) -> Self {
        TransferResult::Failure { error }
    }

    #[inline]
    pub fn is_success(&self) -> bool {
        matches!(self, TransferResult::Success { .. })
    }

    /// Human-readable message, safe for vendors
    pub fn message(&self) -> String {
        match self {
            TransferResult::Success { message, .. } => message.clone(),
            TransferResult::Failure { error } => error.public_message(),
        }
    }
}

/// Persisted payout record. Identity is `merchant_reference_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Transaction {
    #[schema(example = "VNDa1b2c3d41703260800001K3X9QZ")]
    pub merchant_reference_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendor_id: Option<String>,
    #[schema(value_type = String, example = "500")]
    pub amount: Decimal,
    pub mode: PaymentMode,
    pub status: TransactionStatus,
    pub utr: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub narration: Option<String>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    /// New record in `pending`
    pub fn new(
        merchant_reference_id: impl Into<String>,
        vendor_id: Option<String>,
        amount: Decimal,
        mode: PaymentMode,
        narration: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            merchant_reference_id: merchant_reference_id.into(),
            vendor_id,
            amount,
            mode,
            status: TransactionStatus::Pending,
            utr: None,
            narration,
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Pending record for a request about to be dispatched
    pub fn pending(req: &TransferRequest, vendor_id: Option<String>) -> Self {
        Self::new(
            req.merchant_reference_id.clone(),
            vendor_id,
            req.amount,
            req.mode,
            req.narration.clone(),
        )
    }
}

/// Settlement fields extracted from a decrypted callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackReport {
    pub merchant_reference_id: String,
    pub utr: Option<String>,
    pub amount: Option<Decimal>,
    pub status: TransactionStatus,
}

/// Result of reconciling one callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ReconciliationOutcome {
    Applied {
        merchant_reference_id: String,
        from: TransactionStatus,
        to: TransactionStatus,
        utr: Option<String>,
    },
    /// Duplicate delivery: record already reflects the report
    NoOp {
        merchant_reference_id: String,
        status: TransactionStatus,
    },
}

impl ReconciliationOutcome {
    #[inline]
    pub fn is_noop(&self) -> bool {
        matches!(self, ReconciliationOutcome::NoOp { .. })
    }
}

const REFERENCE_PREFIX: &str = "VND";
const REFERENCE_SUFFIX_LEN: usize = 6;

/// Generate a merchant reference id: `VND` + vendor prefix + unix millis + random base36.
///
/// Format: `VND{first 8 chars of vendor_id}{timestamp_ms}{6 x [0-9A-Z]}`
pub fn generate_merchant_reference_id(vendor_id: &str) -> String {
    let now_ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);

    let vendor_prefix: String = vendor_id.chars().take(8).collect();

    let mut rng = rand::thread_rng();
    let suffix: String = (0..REFERENCE_SUFFIX_LEN)
        .filter_map(|_| std::char::from_digit(rng.gen_range(0..36), 36))
        .map(|c| c.to_ascii_uppercase())
        .collect();

    format!("{REFERENCE_PREFIX}{vendor_prefix}{now_ms}{suffix}")
}
