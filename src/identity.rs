//! Addresses and object identifiers.
//!
//! Every record in the ledger is addressed by a 32-byte [`ObjectId`]; every
//! caller is a 32-byte [`Address`]. Both render as `0x`-prefixed lowercase hex
//! and serialize in that form, so the same value reads identically in CBOR
//! snapshots, JSON event logs and CLI output.
//!
//! There are no pointers between records. Cross-references are plain ids and
//! are re-validated by every operation that touches more than one record.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Domain tag for label-derived addresses.
const ADDRESS_LABEL_DOMAIN: &[u8] = b"concord-address-v1";

/// Error parsing a hex identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseIdError {
    /// Input is not valid hex.
    #[error("invalid hex: {0}")]
    InvalidHex(String),

    /// Decoded value is not 32 bytes.
    #[error("expected 32 bytes, got {0}")]
    InvalidLength(usize),
}

macro_rules! hex_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name([u8; 32]);

        impl $name {
            /// Wrap raw bytes.
            pub const fn new(bytes: [u8; 32]) -> Self {
                Self(bytes)
            }

            /// Create from a slice; fails unless it is exactly 32 bytes.
            pub fn from_slice(bytes: &[u8]) -> Result<Self, ParseIdError> {
                let arr: [u8; 32] = bytes
                    .try_into()
                    .map_err(|_| ParseIdError::InvalidLength(bytes.len()))?;
                Ok(Self(arr))
            }

            /// Raw bytes.
            pub fn as_bytes(&self) -> &[u8; 32] {
                &self.0
            }

            /// First four bytes as hex, for log lines and terse output.
            pub fn short(&self) -> String {
                hex::encode(&self.0[..4])
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "0x{}", hex::encode(self.0))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}(0x{}…)", stringify!($name), self.short())
            }
        }

        impl FromStr for $name {
            type Err = ParseIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let digits = s.strip_prefix("0x").unwrap_or(s);
                let bytes =
                    hex::decode(digits).map_err(|e| ParseIdError::InvalidHex(e.to_string()))?;
                Self::from_slice(&bytes)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(de::Error::custom)
            }
        }
    };
}

hex_id!(
    /// A caller's account address.
    Address
);

hex_id!(
    /// Stable, opaque handle of a ledger record.
    ObjectId
);

hex_id!(
    /// Pseudonymous voter handle published on ballots.
    ///
    /// See [`crate::governance::anonymous_voter_id`] for how it is derived
    /// and why it is only pseudonymous.
    AnonymousVoterId
);

pub type ForumId = ObjectId;
pub type PollId = ObjectId;
pub type RegistryId = ObjectId;
pub type MembershipId = ObjectId;
pub type BallotId = ObjectId;

impl Address {
    /// Derive a stable address from a human-readable label.
    ///
    /// Same label always yields the same address. Used by operator tooling
    /// so people can say `--caller alice` instead of pasting 64 hex digits.
    pub fn from_label(label: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(ADDRESS_LABEL_DOMAIN);
        hasher.update(label.as_bytes());
        Self(digest_bytes(hasher))
    }
}

/// Finalize a SHA-256 hasher into a fixed array.
pub(crate) fn digest_bytes(hasher: Sha256) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(&hasher.finalize());
    out
}

/// Kind of ledger record, used in lookup errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    Forum,
    MemberRegistry,
    Membership,
    Poll,
    VoteRegistry,
    Ballot,
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Forum => "forum",
            Self::MemberRegistry => "member registry",
            Self::Membership => "membership",
            Self::Poll => "poll",
            Self::VoteRegistry => "vote registry",
            Self::Ballot => "ballot",
        };
        f.write_str(name)
    }
}
