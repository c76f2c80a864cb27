//! Request signatures and shared-secret credentials

use ring::hmac;
use ring::rand::SystemRandom;

/// Hex-encoded HMAC-SHA256 of `payload` keyed by `secret`
pub fn sign_hex(secret: &[u8], payload: &[u8]) -> String {
    let key = hmac::Key::new(hmac::HMAC_SHA256, secret);
    hex::encode(hmac::sign(&key, payload).as_ref())
}

/// Check a hex-encoded HMAC-SHA256 signature in constant time
///
/// Malformed hex and empty secrets never verify.
pub fn verify_hex(secret: &[u8], payload: &[u8], signature: &str) -> bool {
    if secret.is_empty() {
        return false;
    }

    let Ok(tag) = hex::decode(signature.trim()) else {
        return false;
    };

    let key = hmac::Key::new(hmac::HMAC_SHA256, secret);
    hmac::verify(&key, payload, &tag).is_ok()
}

/// Constant-time check of a static shared token
///
/// The configured token is stored only as an HMAC tag under a per-process
/// random key; a presented token is accepted when its tag verifies.
pub struct TokenVerifier {
    key: hmac::Key,
    tag: Option<hmac::Tag>,
}

impl TokenVerifier {
    /// Verifier for `token`; an empty token rejects everything
    pub fn new(token: &str) -> Result<Self, ring::error::Unspecified> {
        let key = hmac::Key::generate(hmac::HMAC_SHA256, &SystemRandom::new())?;
        let tag = (!token.is_empty()).then(|| hmac::sign(&key, token.as_bytes()));
        Ok(Self { key, tag })
    }

    pub fn verify(&self, presented: &str) -> bool {
        match &self.tag {
            Some(tag) => hmac::verify(&self.key, presented.as_bytes(), tag.as_ref()).is_ok(),
            None => false,
        }
    }
}

impl std::fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenVerifier")
            .field("configured", &self.tag.is_some())
            .finish()
    }
}
