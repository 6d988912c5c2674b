//! Governance error taxonomy.
//!
//! Every entry operation either commits completely or fails with one of these
//! before any write becomes visible. Callers decide whether to retry; the
//! duplicate-guarded operations (join, vote, execute) fail cleanly on replay.

use crate::identity::{ObjectId, ObjectKind};
use thiserror::Error;

/// Result type for governance operations.
pub type GovernanceResult<T> = Result<T, GovernanceError>;

/// Coarse classification of a [`GovernanceError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Malformed input, rejected before any lookup of shared state.
    Validation,
    /// Caller lacks the credential or membership the operation requires.
    Authorization,
    /// A legitimate competing state; expected and caller-recoverable.
    StateConflict,
    /// Caller passed ids that do not belong together.
    CrossReference,
    /// Caller passed an id that names no record.
    NotFound,
}

/// Governance operation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GovernanceError {
    #[error("verifier secret must not be empty")]
    EmptySecret,

    #[error("forum name must not be empty")]
    EmptyName,

    #[error("poll title must not be empty")]
    EmptyTitle,

    #[error("poll duration must be positive and end within the timestamp range")]
    InvalidDuration,

    #[error("credential verification failed")]
    VerificationFailed,

    #[error("caller is not a member of this forum")]
    NotMember,

    #[error("forum already has an active poll")]
    ActivePollExists,

    #[error("forum has no active poll")]
    NoActivePoll,

    #[error("poll has already been executed")]
    AlreadyExecuted,

    #[error("caller has already voted on this poll")]
    AlreadyVoted,

    #[error("caller is already a member of this forum")]
    AlreadyMember,

    #[error("poll has ended")]
    PollEnded,

    #[error("poll has not ended yet")]
    PollNotEnded,

    #[error("{kind} is already linked to a registry")]
    RegistryExists { kind: ObjectKind },

    #[error("cross-reference mismatch: expected {expected}, found {found}")]
    CrossReferenceMismatch { expected: ObjectId, found: ObjectId },

    #[error("{kind} {id} not found")]
    NotFound { kind: ObjectKind, id: ObjectId },
}

impl GovernanceError {
    /// Classify this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::EmptySecret | Self::EmptyName | Self::EmptyTitle | Self::InvalidDuration => {
                ErrorCategory::Validation
            }
            Self::VerificationFailed | Self::NotMember => ErrorCategory::Authorization,
            Self::ActivePollExists
            | Self::NoActivePoll
            | Self::AlreadyExecuted
            | Self::AlreadyVoted
            | Self::AlreadyMember
            | Self::PollEnded
            | Self::PollNotEnded
            | Self::RegistryExists { .. } => ErrorCategory::StateConflict,
            Self::CrossReferenceMismatch { .. } => ErrorCategory::CrossReference,
            Self::NotFound { .. } => ErrorCategory::NotFound,
        }
    }

    /// Check an id link, failing with [`GovernanceError::CrossReferenceMismatch`].
    pub(crate) fn ensure_linked(expected: ObjectId, found: ObjectId) -> GovernanceResult<()> {
        if expected == found {
            Ok(())
        } else {
            Err(Self::CrossReferenceMismatch { expected, found })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        assert_eq!(GovernanceError::EmptyName.category(), ErrorCategory::Validation);
        assert_eq!(
            GovernanceError::InvalidDuration.category(),
            ErrorCategory::Validation
        );
        assert_eq!(
            GovernanceError::VerificationFailed.category(),
            ErrorCategory::Authorization
        );
        assert_eq!(GovernanceError::NotMember.category(), ErrorCategory::Authorization);
        assert_eq!(
            GovernanceError::AlreadyVoted.category(),
            ErrorCategory::StateConflict
        );
        assert_eq!(
            GovernanceError::PollNotEnded.category(),
            ErrorCategory::StateConflict
        );
        assert_eq!(
            GovernanceError::CrossReferenceMismatch {
                expected: ObjectId::new([1; 32]),
                found: ObjectId::new([2; 32]),
            }
            .category(),
            ErrorCategory::CrossReference
        );
    }

    #[test]
    fn test_ensure_linked() {
        let a = ObjectId::new([1; 32]);
        let b = ObjectId::new([2; 32]);

        assert!(GovernanceError::ensure_linked(a, a).is_ok());
        assert_eq!(
            GovernanceError::ensure_linked(a, b),
            Err(GovernanceError::CrossReferenceMismatch {
                expected: a,
                found: b
            })
        );
    }

    #[test]
    fn test_not_found_display() {
        let err = GovernanceError::NotFound {
            kind: ObjectKind::Poll,
            id: ObjectId::new([0; 32]),
        };
        let msg = err.to_string();
        assert!(msg.starts_with("poll 0x"));
        assert!(msg.ends_with("not found"));
    }
}
