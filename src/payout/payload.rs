//! Canonical Payload Builder
//!
//! Turns a [`TransferRequest`] into the mode-specific field set the gateway
//! signs and decrypts. The serialized JSON carries only the fields of the
//! selected mode; `signature` is `null` until [`CanonicalPayload::signed`].

use rust_decimal::Decimal;
use serde::Serialize;

use super::error::PayoutError;
use super::signer;
use super::types::{PaymentMode, TransferRequest};

/// Fixed API code assigned to this gateway integration
pub const APICODE: u32 = 810;

/// Narration used when the vendor leaves it empty
pub const DEFAULT_NARRATION: &str = "PAYNINJA Fund Transfer";

/// Where the money goes, selected by mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Destination {
    Upi {
        ben_vpa_address: String,
    },
    Bank {
        ben_account_number: String,
        ben_ifsc: String,
        ben_bank_name: String,
    },
}

/// Gateway payload before encryption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CanonicalPayload {
    pub ben_name: String,
    pub ben_phone_number: String,
    #[serde(flatten)]
    pub destination: Destination,
    pub amount: String,
    pub merchant_reference_id: String,
    pub transfer_type: PaymentMode,
    pub apicode: u32,
    pub narration: String,
    pub signature: Option<String>,
}

impl CanonicalPayload {
    /// Compute the signature over the canonical string and store it.
    pub fn signed(mut self, secret: &str) -> Self {
        self.signature = Some(signer::sign(&self, secret));
        self
    }

    pub fn is_signed(&self) -> bool {
        self.signature.is_some()
    }
}

/// Build the canonical payload. Fails before any crypto or network work.
pub fn build(req: &TransferRequest) -> Result<CanonicalPayload, PayoutError> {
    let ben = &req.beneficiary;

    let ben_name = required(&ben.name, "beneficiary name")?;
    let ben_phone_number = required(&ben.phone_number, "beneficiary phone number")?;
    let merchant_reference_id = required(&req.merchant_reference_id, "merchant reference id")
        .map_err(|_| PayoutError::InvalidBeneficiary("merchant reference id is required".into()))?;

    let destination = match req.mode {
        PaymentMode::Upi => Destination::Upi {
            ben_vpa_address: required_opt(&ben.vpa_address, "UPI address")?,
        },
        PaymentMode::Imps | PaymentMode::Neft => Destination::Bank {
            ben_account_number: required_opt(&ben.account_number, "account number")?,
            ben_ifsc: required_opt(&ben.ifsc, "IFSC")?,
            ben_bank_name: required_opt(&ben.bank_name, "bank name")?,
        },
    };

    Ok(CanonicalPayload {
        ben_name,
        ben_phone_number,
        destination,
        amount: format_amount(req.amount)?,
        merchant_reference_id,
        transfer_type: req.mode,
        apicode: APICODE,
        narration: req
            .narration
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(DEFAULT_NARRATION)
            .to_string(),
        signature: None,
    })
}

/// Plain decimal string: no currency symbol, no exponent, no trailing zeros.
///
/// `500`, `500.0` and `500.00` all render as `"500"`; `1250.50` as `"1250.5"`.
pub fn format_amount(amount: Decimal) -> Result<String, PayoutError> {
    if amount <= Decimal::ZERO {
        return Err(PayoutError::InvalidAmount);
    }
    Ok(amount.normalize().to_string())
}

fn required(value: &str, field: &str) -> Result<String, PayoutError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(PayoutError::InvalidBeneficiary(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

fn required_opt(value: &Option<String>, field: &str) -> Result<String, PayoutError> {
    required(value.as_deref().unwrap_or_default(), field)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payout::types::Beneficiary;
    use std::str::FromStr;

    fn upi_request() -> TransferRequest {
        TransferRequest::new(
            Beneficiary::upi("Jane Doe", "9999999999", "jane@upi"),
            Decimal::from(500),
            "REF123",
            PaymentMode::Upi,
        )
    }

    fn bank_request(mode: PaymentMode) -> TransferRequest {
        TransferRequest::new(
            Beneficiary::bank(
                "Ravi Kumar",
                "9876543210",
                "001234567890",
                "HDFC0001234",
                "HDFC Bank",
            ),
            Decimal::from_str("1250.50").unwrap(),
            "REF456",
            mode,
        )
    }

    #[test]
    fn test_upi_payload_fields() {
        let payload = build(&upi_request()).unwrap();
        assert_eq!(payload.apicode, APICODE);
        assert_eq!(payload.amount, "500");
        assert_eq!(payload.narration, DEFAULT_NARRATION);
        assert!(!payload.is_signed());

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["ben_vpa_address"], "jane@upi");
        assert_eq!(json["transfer_type"], "UPI");
        assert_eq!(json["apicode"], 810);
        assert!(json["signature"].is_null());
        assert!(json.get("ben_account_number").is_none());
        assert!(json.get("ben_ifsc").is_none());
        assert!(json.get("ben_bank_name").is_none());
    }

    #[test]
    fn test_bank_payload_fields() {
        for mode in [PaymentMode::Imps, PaymentMode::Neft] {
            let payload = build(&bank_request(mode)).unwrap();
            let json = serde_json::to_value(&payload).unwrap();
            assert_eq!(json["ben_account_number"], "001234567890");
            assert_eq!(json["ben_ifsc"], "HDFC0001234");
            assert_eq!(json["ben_bank_name"], "HDFC Bank");
            assert_eq!(json["amount"], "1250.5");
            assert_eq!(json["transfer_type"], mode.as_str());
            assert!(json.get("ben_vpa_address").is_none());
        }
    }

    #[test]
    fn test_upi_ignores_bank_fields() {
        let mut req = upi_request();
        req.beneficiary.account_number = Some("123".into());
        let json = serde_json::to_value(build(&req).unwrap()).unwrap();
        assert!(json.get("ben_account_number").is_none());
    }

    #[test]
    fn test_missing_vpa_rejected() {
        let mut req = upi_request();
        req.beneficiary.vpa_address = None;
        assert!(matches!(build(&req), Err(PayoutError::InvalidBeneficiary(_))));

        req.beneficiary.vpa_address = Some("   ".into());
        assert!(matches!(build(&req), Err(PayoutError::InvalidBeneficiary(_))));
    }

    #[test]
    fn test_missing_bank_fields_rejected() {
        let mut req = bank_request(PaymentMode::Imps);
        req.beneficiary.ifsc = None;
        let err = build(&req).unwrap_err();
        assert_eq!(err, PayoutError::InvalidBeneficiary("IFSC is required".into()));

        let mut req = bank_request(PaymentMode::Neft);
        req.beneficiary.bank_name = Some(String::new());
        assert!(matches!(build(&req), Err(PayoutError::InvalidBeneficiary(_))));

        // A VPA does not stand in for bank details
        let mut req = bank_request(PaymentMode::Imps);
        req.beneficiary.account_number = None;
        req.beneficiary.vpa_address = Some("ravi@upi".into());
        assert!(matches!(build(&req), Err(PayoutError::InvalidBeneficiary(_))));
    }

    #[test]
    fn test_non_positive_amount_rejected() {
        let mut req = upi_request();
        req.amount = Decimal::ZERO;
        assert_eq!(build(&req), Err(PayoutError::InvalidAmount));
        req.amount = Decimal::from(-5);
        assert_eq!(build(&req), Err(PayoutError::InvalidAmount));
    }

    #[test]
    fn test_amount_formatting() {
        let fmt = |s: &str| format_amount(Decimal::from_str(s).unwrap()).unwrap();
        assert_eq!(fmt("500"), "500");
        assert_eq!(fmt("500.00"), "500");
        assert_eq!(fmt("0.01"), "0.01");
        assert_eq!(fmt("1000000"), "1000000");
        assert_eq!(fmt("99.990"), "99.99");
    }

    #[test]
    fn test_custom_narration_kept() {
        let req = upi_request().with_narration("Test");
        assert_eq!(build(&req).unwrap().narration, "Test");

        let req = upi_request().with_narration("  ");
        assert_eq!(build(&req).unwrap().narration, DEFAULT_NARRATION);
    }
}
