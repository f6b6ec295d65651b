//! Per-request IV generation.
//!
//! An IV is 16 characters from `[A-Za-z0-9]`, so its UTF-8 form is exactly
//! 16 bytes. Sources are injectable so tests can pin the IV.

use rand::Rng;
use rand::distributions::Alphanumeric;
use rand::rngs::OsRng;

use super::cipher::IV_LEN;

/// Source of outbound IVs.
pub trait IvSource: Send + Sync {
    /// Produce a fresh 16-character alphanumeric IV
    fn generate(&self) -> String;
}

/// Operating-system CSPRNG, uniform over the 62-symbol alphabet.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsRngIvSource;

impl IvSource for OsRngIvSource {
    fn generate(&self) -> String {
        generate_iv()
    }
}

/// Always returns the same IV. For fixtures only.
#[derive(Debug, Clone)]
pub struct FixedIvSource(String);

impl FixedIvSource {
    pub fn new(iv: impl Into<String>) -> Self {
        Self(iv.into())
    }
}

impl IvSource for FixedIvSource {
    fn generate(&self) -> String {
        self.0.clone()
    }
}

/// `Alphanumeric` rejection-samples bytes, so every symbol is equally likely.
pub fn generate_iv() -> String {
    OsRng
        .sample_iter(&Alphanumeric)
        .take(IV_LEN)
        .map(char::from)
        .collect()
}
