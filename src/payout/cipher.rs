//! AES-256-CBC envelope cipher.
//!
//! Key and IV are the raw UTF-8 bytes of their configured strings, never
//! hex or base64 decoded. Ciphertext travels as standard padded base64.

use std::fmt;

use aes::Aes256;
use base64::{Engine, engine::general_purpose::STANDARD};
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit, block_padding::Pkcs7};

use super::error::PayoutError;

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

pub const KEY_LEN: usize = 32;
pub const IV_LEN: usize = 16;

/// Static 32-byte encryption key shared with the gateway.
///
/// The key is also sent verbatim in the outbound envelope, so it is kept as
/// the original string. `Debug` never prints it.
#[derive(Clone, PartialEq, Eq)]
pub struct EncryptionKey(String);

impl EncryptionKey {
    pub fn new(key: impl Into<String>) -> Result<Self, PayoutError> {
        let key = key.into();
        if key.len() != KEY_LEN {
            return Err(PayoutError::InvalidKeyMaterial(format!(
                "encryption key must be {KEY_LEN} bytes, got {}",
                key.len()
            )));
        }
        Ok(Self(key))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EncryptionKey(***)")
    }
}

fn check_key_material(key: &[u8], iv: &[u8]) -> Result<(), PayoutError> {
    if key.len() != KEY_LEN {
        return Err(PayoutError::InvalidKeyMaterial(format!(
            "key must be {KEY_LEN} bytes, got {}",
            key.len()
        )));
    }
    if iv.len() != IV_LEN {
        return Err(PayoutError::InvalidKeyMaterial(format!(
            "iv must be {IV_LEN} bytes, got {}",
            iv.len()
        )));
    }
    Ok(())
}

/// Encrypt with PKCS#7 padding and return base64.
pub fn encrypt(plaintext: &[u8], key: &[u8], iv: &[u8]) -> Result<String, PayoutError> {
    check_key_material(key, iv)?;
    let encryptor = Aes256CbcEnc::new_from_slices(key, iv)
        .map_err(|e| PayoutError::InvalidKeyMaterial(e.to_string()))?;
    let ciphertext = encryptor.encrypt_padded_vec_mut::<Pkcs7>(plaintext);
    Ok(STANDARD.encode(ciphertext))
}

/// Decode base64 and decrypt.
///
/// Corrupt base64, a ciphertext that is not a whole number of blocks, and bad
/// padding (usually a wrong key or IV) all fail with `DecryptionFailed`.
pub fn decrypt(encoded: &str, key: &[u8], iv: &[u8]) -> Result<Vec<u8>, PayoutError> {
    check_key_material(key, iv)?;
    let ciphertext = STANDARD
        .decode(encoded.trim())
        .map_err(|e| PayoutError::DecryptionFailed(format!("invalid base64: {e}")))?;
    let decryptor = Aes256CbcDec::new_from_slices(key, iv)
        .map_err(|e| PayoutError::InvalidKeyMaterial(e.to_string()))?;
    decryptor
        .decrypt_padded_vec_mut::<Pkcs7>(&ciphertext)
        .map_err(|_| PayoutError::DecryptionFailed("bad padding or corrupt ciphertext".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "0123456789abcdef0123456789abcdef";
    const IV: &str = "AbCdEfGh12345678";

    #[test]
    fn test_known_answer() {
        // openssl enc -aes-256-cbc with the UTF-8 bytes of KEY/IV as raw key material
        let encoded = encrypt(b"hello payout", KEY.as_bytes(), IV.as_bytes()).unwrap();
        assert_eq!(encoded, "iF6TXhrjme+HK0BhccBvew==");
    }

    #[test]
    fn test_known_answer_callback_body() {
        let encoded = "hO7RUPxr9KU77Z85IBJ6w+p/TYuizT6jYvONxRa4xE+mzg3JhtpH7ELCKSJbwvJO3D9+ZX5VXmRdBz8UwpIqiGqeZgnw5J75dH7pgLmaXSgd3ibDfSC83RqvtNqX13vo";
        let plain = decrypt(encoded, KEY.as_bytes(), IV.as_bytes()).unwrap();
        assert_eq!(
            String::from_utf8(plain).unwrap(),
            r#"{"data":{"merchant_reference_id":"REF123","utr":"UTR1","amount":500,"status":"success"}}"#
        );
    }

    #[test]
    fn test_round_trip_json_payloads() {
        let payloads = [
            serde_json::json!({}),
            serde_json::json!({"ben_name": "Jane Doe", "amount": "500", "signature": null}),
            serde_json::json!({"narration": "नमस्ते ₹500 payout", "nested": {"list": [1, 2, 3]}}),
            serde_json::json!({"exact_block": "0123456789a"}),
        ];
        for payload in payloads {
            let bytes = serde_json::to_vec(&payload).unwrap();
            let encoded = encrypt(&bytes, KEY.as_bytes(), IV.as_bytes()).unwrap();
            let decoded = decrypt(&encoded, KEY.as_bytes(), IV.as_bytes()).unwrap();
            assert_eq!(decoded, bytes);
        }
    }

    #[test]
    fn test_ciphertext_is_block_aligned() {
        // 16 bytes of input still gains a full padding block
        let encoded = encrypt(&[b'x'; 16], KEY.as_bytes(), IV.as_bytes()).unwrap();
        assert_eq!(STANDARD.decode(encoded).unwrap().len(), 32);
    }

    #[test]
    fn test_key_length_boundaries() {
        for len in [31usize, 33] {
            let key = vec![b'k'; len];
            assert!(matches!(
                encrypt(b"x", &key, IV.as_bytes()),
                Err(PayoutError::InvalidKeyMaterial(_))
            ));
            assert!(matches!(
                decrypt("AAAAAAAAAAAAAAAAAAAAAA==", &key, IV.as_bytes()),
                Err(PayoutError::InvalidKeyMaterial(_))
            ));
        }
        assert!(encrypt(b"x", &[b'k'; 32], IV.as_bytes()).is_ok());
    }

    #[test]
    fn test_iv_length_boundaries() {
        for len in [15usize, 17] {
            let iv = vec![b'i'; len];
            assert!(matches!(
                encrypt(b"x", KEY.as_bytes(), &iv),
                Err(PayoutError::InvalidKeyMaterial(_))
            ));
            assert!(matches!(
                decrypt("AAAAAAAAAAAAAAAAAAAAAA==", KEY.as_bytes(), &iv),
                Err(PayoutError::InvalidKeyMaterial(_))
            ));
        }
        assert!(encrypt(b"x", KEY.as_bytes(), &[b'i'; 16]).is_ok());
    }

    #[test]
    fn test_multibyte_key_counts_bytes_not_chars() {
        // 31 chars, 32 bytes
        let key = format!("{}é", "k".repeat(30));
        assert_eq!(key.chars().count(), 31);
        assert!(encrypt(b"x", key.as_bytes(), IV.as_bytes()).is_ok());
    }

    #[test]
    fn test_wrong_key_fails_decryption() {
        let encoded = encrypt(b"{\"data\":{}}", KEY.as_bytes(), IV.as_bytes()).unwrap();
        let other = "fedcba9876543210fedcba9876543210";
        match decrypt(&encoded, other.as_bytes(), IV.as_bytes()) {
            Err(PayoutError::DecryptionFailed(_)) => {}
            Ok(plain) => assert_ne!(plain, b"{\"data\":{}}".to_vec()),
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    #[test]
    fn test_corrupt_input_fails_decryption() {
        assert!(matches!(
            decrypt("not base64!!", KEY.as_bytes(), IV.as_bytes()),
            Err(PayoutError::DecryptionFailed(_))
        ));
        // 5 bytes: not a whole block
        assert!(matches!(
            decrypt("AAAAAAA=", KEY.as_bytes(), IV.as_bytes()),
            Err(PayoutError::DecryptionFailed(_))
        ));
    }

    #[test]
    fn test_encryption_key_validation() {
        assert!(EncryptionKey::new(KEY).is_ok());
        assert!(matches!(
            EncryptionKey::new("short"),
            Err(PayoutError::InvalidKeyMaterial(_))
        ));
        let key = EncryptionKey::new(KEY).unwrap();
        assert!(!format!("{key:?}").contains(KEY));
    }
}
