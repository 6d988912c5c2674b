//! Shared-secret verifier.
//!
//! Stores HMAC-SHA256 of the secret under a fixed domain key, never the
//! secret itself. Comparison goes through `ring::hmac::verify`, which is
//! constant-time.

use super::Verifier;
use crate::error::{GovernanceError, GovernanceResult};
use ring::hmac;
use serde::{Deserialize, Serialize};

/// HMAC key for password digests (versioned for rotation).
const PASSWORD_DOMAIN: &[u8] = b"concord-password-v1";

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordVerifier {
    digest: Vec<u8>,
    created_at: u64,
}

fn domain_key() -> hmac::Key {
    hmac::Key::new(hmac::HMAC_SHA256, PASSWORD_DOMAIN)
}

impl PasswordVerifier {
    /// Build a verifier for `secret`.
    pub fn create(secret: &[u8], timestamp: u64) -> GovernanceResult<Self> {
        if secret.is_empty() {
            return Err(GovernanceError::EmptySecret);
        }

        let tag = hmac::sign(&domain_key(), secret);
        Ok(Self {
            digest: tag.as_ref().to_vec(),
            created_at: timestamp,
        })
    }

    pub fn created_at(&self) -> u64 {
        self.created_at
    }
}

impl Verifier for PasswordVerifier {
    fn verify(&self, input: &[u8]) -> bool {
        if input.is_empty() {
            return false;
        }
        hmac::verify(&domain_key(), input, &self.digest).is_ok()
    }
}

// The digest is redacted so verifiers can sit inside Debug-printed records.
impl std::fmt::Debug for PasswordVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordVerifier")
            .field("digest", &"<redacted>")
            .field("created_at", &self.created_at)
            .finish()
    }
}
