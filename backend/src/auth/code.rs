//! One-time codes for email verification and password reset
//!
//! Codes are 256 bits of OS randomness, hex-encoded. Only the SHA-256 digest
//! is ever persisted; the plaintext exists transiently in the emailed URL.
//! Endpoints recompute the digest from the presented plaintext and match it
//! against storage together with the expiry.

use chrono::{DateTime, Duration, Utc};
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};

/// A freshly generated one-time code
#[derive(Debug, Clone)]
pub struct OneTimeCode {
    /// Plaintext for out-of-band delivery; never persisted
    pub plaintext: String,
    /// SHA-256 hex digest for storage
    pub digest: String,
    /// Absolute expiry for storage
    pub expires_at: DateTime<Utc>,
}

/// Generate a code valid for the given duration
pub fn generate(ttl: Duration) -> OneTimeCode {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    let plaintext = hex::encode(bytes);
    let digest = digest(&plaintext);

    OneTimeCode {
        plaintext,
        digest,
        expires_at: Utc::now() + ttl,
    }
}

/// Recompute the storage digest of a presented plaintext code
pub fn digest(plaintext: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(plaintext.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_reproduces_stored_value() {
        let code = generate(Duration::hours(24));
        assert_eq!(digest(&code.plaintext), code.digest);
    }

    #[test]
    fn test_plaintext_is_256_bits_hex() {
        let code = generate(Duration::hours(24));
        assert_eq!(code.plaintext.len(), 64);
        assert!(code.plaintext.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_codes_are_unique() {
        let a = generate(Duration::minutes(10));
        let b = generate(Duration::minutes(10));
        assert_ne!(a.plaintext, b.plaintext);
        assert_ne!(a.digest, b.digest);
    }

    #[test]
    fn test_expiry_is_in_the_future() {
        let code = generate(Duration::minutes(10));
        assert!(code.expires_at > Utc::now());
        assert!(code.expires_at <= Utc::now() + Duration::minutes(10));
    }

    #[test]
    fn test_known_sha256_digest() {
        // SHA-256 of "hello"
        assert_eq!(
            digest("hello"),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }
}
