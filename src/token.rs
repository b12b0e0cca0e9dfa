//! Bearer-token issuance and verification.
//!
//! Tokens are opaque to the rest of the system: `payload.signature`, where
//! the payload is `player_id.issued_at.expires_at` (unix seconds) and the
//! signature is a SHA-256 digest over the server secret and the payload.
//! Both halves are base64url without padding.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;
use sha2::{Digest, Sha256};

use crate::core::{Result, StoreError};

/// 24-hour default expiry.
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 24 * 60 * 60;

pub struct TokenSigner {
    secret: String,
    ttl_secs: i64,
}

impl TokenSigner {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            ttl_secs: DEFAULT_TOKEN_TTL_SECS,
        }
    }

    pub fn with_ttl_secs(mut self, ttl_secs: i64) -> Self {
        self.ttl_secs = ttl_secs;
        self
    }

    /// Issue a signed, time-boxed credential for a player id.
    pub fn issue(&self, player_id: &str) -> Result<String> {
        if player_id.is_empty() {
            return Err(StoreError::Token("empty player id".to_string()));
        }
        let issued_at = Utc::now().timestamp();
        let expires_at = issued_at + self.ttl_secs;
        let payload = format!("{player_id}.{issued_at}.{expires_at}");
        Ok(format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(&payload),
            self.sign(&payload)
        ))
    }

    /// Check signature and expiry; return the embedded player id.
    pub fn verify(&self, token: &str) -> Result<String> {
        let (encoded_payload, signature) = token
            .split_once('.')
            .ok_or_else(|| StoreError::Token("malformed token".to_string()))?;

        let payload_bytes = URL_SAFE_NO_PAD
            .decode(encoded_payload)
            .map_err(|e| StoreError::Token(format!("bad token payload: {e}")))?;
        let payload = String::from_utf8(payload_bytes)
            .map_err(|e| StoreError::Token(format!("bad token payload: {e}")))?;

        if self.sign(&payload) != signature {
            return Err(StoreError::Token("signature mismatch".to_string()));
        }

        let mut parts = payload.rsplitn(3, '.');
        let expires_at: i64 = parts
            .next()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| StoreError::Token("bad token expiry".to_string()))?;
        let _issued_at = parts
            .next()
            .ok_or_else(|| StoreError::Token("bad token payload".to_string()))?;
        let player_id = parts
            .next()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| StoreError::Token("bad token payload".to_string()))?;

        if Utc::now().timestamp() > expires_at {
            return Err(StoreError::Token("token expired".to_string()));
        }
        Ok(player_id.to_string())
    }

    fn sign(&self, payload: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.secret.as_bytes());
        hasher.update(b".");
        hasher.update(payload.as_bytes());
        URL_SAFE_NO_PAD.encode(hasher.finalize())
    }
}
