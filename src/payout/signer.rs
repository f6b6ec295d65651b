//! Payload signing.
//!
//! The gateway recomputes SHA-256 over a dash-joined field string with the
//! shared secret appended (no separator before the secret) and compares the
//! lowercase hex digest. Field order is part of the wire contract.

use sha2::{Digest, Sha256};

use super::payload::{CanonicalPayload, Destination};

/// Build the exact string that gets hashed.
///
/// - UPI: `name-phone-vpa-amount-ref-type-apicode-narration{secret}`
/// - IMPS/NEFT: `name-phone-account-ifsc-bank-amount-ref-type-apicode-narration{secret}`
pub fn signature_source(payload: &CanonicalPayload, secret: &str) -> String {
    let mut fields: Vec<&str> = vec![&payload.ben_name, &payload.ben_phone_number];
    match &payload.destination {
        Destination::Upi { ben_vpa_address } => fields.push(ben_vpa_address),
        Destination::Bank {
            ben_account_number,
            ben_ifsc,
            ben_bank_name,
        } => fields.extend([
            ben_account_number.as_str(),
            ben_ifsc.as_str(),
            ben_bank_name.as_str(),
        ]),
    }

    let apicode = payload.apicode.to_string();
    fields.extend([
        payload.amount.as_str(),
        payload.merchant_reference_id.as_str(),
        payload.transfer_type.as_str(),
        apicode.as_str(),
        payload.narration.as_str(),
    ]);

    let mut source = fields.join("-");
    source.push_str(secret);
    source
}

/// Lowercase hex SHA-256 of the signature source.
pub fn sign(payload: &CanonicalPayload, secret: &str) -> String {
    sha256_hex(&signature_source(payload, secret))
}

pub fn sha256_hex(input: &str) -> String {
    hex::encode(Sha256::digest(input.as_bytes()))
}

/// Recompute and compare a received signature.
pub fn verify(payload: &CanonicalPayload, secret: &str, signature: &str) -> bool {
    sign(payload, secret).eq_ignore_ascii_case(signature)
}
