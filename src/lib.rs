//! Concord - Forum Governance Core
//!
//! A deterministic state machine for small self-governing forums: members
//! join by presenting a shared secret, open one poll at a time to rename
//! their forum, vote under per-poll pseudonyms, and apply the result by
//! simple majority.
//!
//! Key principles:
//! - The core never reads a clock; callers pass time in
//! - Every operation is all-or-nothing
//! - Records reference each other by id and are re-linked on every call
//! - Ballots carry a pseudonym, never the voter's address
//!
//! Entry point for hosts is [`ledger::Ledger`]; the governance functions in
//! [`governance`] operate on records directly.

pub mod context;
pub mod error;
pub mod events;
pub mod governance;
pub mod identity;
pub mod ledger;
pub mod serialization;
pub mod verifier;

pub use error::{ErrorCategory, GovernanceError, GovernanceResult};
pub use identity::{Address, ObjectId, ObjectKind};
pub use ledger::{Ledger, SharedLedger};
