//! Payout DTOs at the HTTP boundary

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::payout::{
    Beneficiary, PaymentMode, Transaction, TransactionStatus, TransferRequest,
    generate_merchant_reference_id,
};

/// Vendor fund transfer request
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FundTransferRequest {
    pub beneficiary: Beneficiary,
    /// Decimal amount, as a JSON number or string
    #[schema(value_type = String, example = "500")]
    pub amount: Decimal,
    pub mode: PaymentMode,
    /// Generated when absent
    #[serde(default)]
    pub merchant_reference_id: Option<String>,
    #[serde(default)]
    #[schema(example = "Invoice 42")]
    pub narration: Option<String>,
    #[serde(default)]
    pub vendor_id: Option<String>,
}

impl FundTransferRequest {
    /// Split into the core request and the owning vendor id.
    pub fn into_parts(self) -> (TransferRequest, Option<String>) {
        let vendor_id = self
            .vendor_id
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());
        let merchant_reference_id = self
            .merchant_reference_id
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| generate_merchant_reference_id(vendor_id.as_deref().unwrap_or("")));

        let mut req = TransferRequest::new(self.beneficiary, self.amount, merchant_reference_id, self.mode);
        req.narration = self.narration;
        (req, vendor_id)
    }
}

/// Fund transfer result as shown to the vendor
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FundTransferData {
    pub merchant_reference_id: String,
    pub status: TransactionStatus,
    pub utr: Option<String>,
    #[schema(example = "Transfer initiated")]
    pub message: String,
}

impl FundTransferData {
    pub fn new(transaction: &Transaction, message: String) -> Self {
        Self {
            merchant_reference_id: transaction.merchant_reference_id.clone(),
            status: transaction.status,
            utr: transaction.utr.clone(),
            message,
        }
    }
}

/// Webhook acknowledgement
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct WebhookAck {
    pub ok: bool,
}
