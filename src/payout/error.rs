//! Payout Error Types
//!
//! One taxonomy for the whole payout core. Each variant carries an API error
//! code and an HTTP status suggestion so handlers can map it without matching.

use thiserror::Error;

/// Payout error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PayoutError {
    // === Local validation (never reaches the network) ===
    #[error("Invalid beneficiary: {0}")]
    InvalidBeneficiary(String),

    #[error("Amount must be greater than zero")]
    InvalidAmount,

    #[error("Duplicate merchant reference: {0}")]
    DuplicateReference(String),

    // === Misconfiguration ===
    #[error("Invalid key material: {0}")]
    InvalidKeyMaterial(String),

    #[error("Configuration error: {0}")]
    Config(String),

    // === Remote gateway ===
    #[error("{0}")]
    Gateway(String),

    // === Inbound callbacks ===
    #[error("Callback decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("Malformed callback: {0}")]
    MalformedCallback(String),

    #[error("Unknown merchant reference: {0}")]
    UnknownReference(String),

    #[error("Concurrent update conflict for {0}")]
    Conflict(String),

    // === System ===
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl PayoutError {
    /// Get the error code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            PayoutError::InvalidBeneficiary(_) => "INVALID_BENEFICIARY",
            PayoutError::InvalidAmount => "INVALID_AMOUNT",
            PayoutError::DuplicateReference(_) => "DUPLICATE_REFERENCE",
            PayoutError::InvalidKeyMaterial(_) => "INVALID_KEY_MATERIAL",
            PayoutError::Config(_) => "CONFIG_ERROR",
            PayoutError::Gateway(_) => "GATEWAY_ERROR",
            PayoutError::DecryptionFailed(_) => "DECRYPTION_FAILED",
            PayoutError::MalformedCallback(_) => "MALFORMED_CALLBACK",
            PayoutError::UnknownReference(_) => "UNKNOWN_REFERENCE",
            PayoutError::Conflict(_) => "CONFLICT",
            PayoutError::Serialization(_) => "SERIALIZATION_ERROR",
            PayoutError::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Get HTTP status code suggestion
    pub fn http_status(&self) -> u16 {
        match self {
            PayoutError::InvalidBeneficiary(_)
            | PayoutError::InvalidAmount
            | PayoutError::DecryptionFailed(_)
            | PayoutError::MalformedCallback(_) => 400,
            PayoutError::UnknownReference(_) => 404,
            PayoutError::DuplicateReference(_) | PayoutError::Conflict(_) => 409,
            PayoutError::Gateway(_) => 502,
            PayoutError::InvalidKeyMaterial(_)
            | PayoutError::Config(_)
            | PayoutError::Serialization(_)
            | PayoutError::Database(_) => 500,
        }
    }

    /// True for faults operators must act on (bad keys, missing config, storage).
    pub fn is_internal(&self) -> bool {
        self.http_status() >= 500 && !matches!(self, PayoutError::Gateway(_))
    }

    /// Message safe to show on the vendor-facing surface.
    ///
    /// Internal faults collapse to a generic phrase; their detail only goes to logs.
    pub fn public_message(&self) -> String {
        if self.is_internal() {
            "Payment service is temporarily unavailable".to_string()
        } else {
            self.to_string()
        }
    }
}

impl From<sqlx::Error> for PayoutError {
    fn from(e: sqlx::Error) -> Self {
        PayoutError::Database(e.to_string())
    }
}

impl From<serde_json::Error> for PayoutError {
    fn from(e: serde_json::Error) -> Self {
        PayoutError::Serialization(e.to_string())
    }
}
