//! Opaque refresh and password-reset tokens, and email verification codes.
//!
//! Only the SHA-256 of a token is stored; the raw value is handed to the
//! client once.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use sha2::{Digest, Sha256};

pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

pub fn new_refresh_token() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// 32 random bytes, base64url without padding.
pub fn new_reset_token() -> String {
    let bytes: [u8; 32] = rand::random();

    URL_SAFE_NO_PAD.encode(bytes)
}

/// Six digits, never starting with zero.
pub fn new_verification_code() -> String {
    rand::random_range(100_000u32..1_000_000).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_stable_hex() {
        let hash = hash_token("abc");

        assert_eq!(hash.len(), 64);
        assert_eq!(hash, hash_token("abc"));
        assert_ne!(hash, hash_token("abd"));
    }

    #[test]
    fn test_reset_tokens_are_url_safe() {
        let token = new_reset_token();

        assert_eq!(token.len(), 43);
        assert!(!token.contains(['+', '/', '=']));
        assert_ne!(token, new_reset_token());
    }

    #[test]
    fn test_verification_codes_are_six_digits() {
        for _ in 0..100 {
            let code = new_verification_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }
}
