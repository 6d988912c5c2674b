//! Pluggable membership credential checks.
//!
//! A forum carries exactly one [`ForumVerifier`], fixed at creation. Joining
//! runs [`Verifier::verify_or_abort`] against it before any registry write.
//! New credential kinds (asset ownership, balance thresholds) are added as
//! variants of [`ForumVerifier`]; forums and memberships only see the trait.

pub mod password;

pub use password::PasswordVerifier;

use crate::error::{GovernanceError, GovernanceResult};
use serde::{Deserialize, Serialize};

/// Credential check capability.
pub trait Verifier {
    /// `true` iff `input` satisfies this verifier. Never reveals why not.
    fn verify(&self, input: &[u8]) -> bool;

    /// Same check, failing with [`GovernanceError::VerificationFailed`].
    fn verify_or_abort(&self, input: &[u8]) -> GovernanceResult<()> {
        if self.verify(input) {
            Ok(())
        } else {
            Err(GovernanceError::VerificationFailed)
        }
    }
}

/// Verifier stored on a forum record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ForumVerifier {
    Password(PasswordVerifier),
}

impl ForumVerifier {
    /// When the verifier was created (caller-supplied time).
    pub fn created_at(&self) -> u64 {
        match self {
            Self::Password(v) => v.created_at(),
        }
    }

    /// Kind name for display.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Password(_) => "password",
        }
    }
}

impl Verifier for ForumVerifier {
    fn verify(&self, input: &[u8]) -> bool {
        match self {
            Self::Password(v) => v.verify(input),
        }
    }
}

impl From<PasswordVerifier> for ForumVerifier {
    fn from(v: PasswordVerifier) -> Self {
        Self::Password(v)
    }
}
