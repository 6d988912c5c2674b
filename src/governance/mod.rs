//! Governance state machine.
//!
//! Each function here takes the records it touches by `&mut` plus a
//! [`crate::context::TxContext`], validates everything before the first
//! write, and stages its events on the context. Record mutators that other
//! components must not reach (`set_active_poll`, `update_metadata`, tally
//! increments) are `pub(super)`: visible inside this module tree only.

pub mod ballot;
pub mod forum;
pub mod membership;
pub mod poll;

#[cfg(test)]
mod proptests;

pub use ballot::{anonymous_voter_id, vote, Ballot, VoteChoice, VoteRegistry};
pub use forum::Forum;
pub use membership::{join, MemberRegistry, Membership};
pub use poll::{execute, passes, Poll, PollOutcome, PollStatus, ProposalDraft};
