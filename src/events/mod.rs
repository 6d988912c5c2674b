//! Structured records published after each successful operation.
//!
//! Events are the only observability channel of the core. They are staged on
//! the [`crate::context::TxContext`] while an operation runs and handed to an
//! [`EventSink`] only after the ledger commits, so a failed operation never
//! publishes anything. Nothing inside the core reads events back.

pub mod sinks;
pub mod stream;

pub use sinks::{FanoutSink, JsonLinesSink, MemorySink, TracingSink};
pub use stream::{ChannelSink, EventStream};

use crate::identity::{Address, AnonymousVoterId, ForumId, MembershipId, PollId};
use serde::{Deserialize, Serialize};

/// One state change, as seen by an external indexer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GovernanceEvent {
    ForumCreated {
        forum_id: ForumId,
        name: String,
        description: String,
        /// Recorded for audit only; grants nothing.
        creator: Address,
        timestamp: u64,
    },
    MemberJoined {
        forum_id: ForumId,
        member: Address,
        membership_id: MembershipId,
        total_members: u64,
        timestamp: u64,
    },
    PollCreated {
        poll_id: PollId,
        forum_id: ForumId,
        title: String,
        description: String,
        creator: Address,
        start_time: u64,
        end_time: u64,
        timestamp: u64,
    },
    /// Carries the pseudonym only, never the voter's address.
    VoteReceived {
        poll_id: PollId,
        anonymous_voter_id: AnonymousVoterId,
        timestamp: u64,
    },
    PollExecuted {
        poll_id: PollId,
        forum_id: ForumId,
        yes_votes: u64,
        no_votes: u64,
        total_participants: u64,
        passed: bool,
        timestamp: u64,
    },
    ForumMetadataUpdated {
        forum_id: ForumId,
        poll_id: PollId,
        old_name: String,
        new_name: String,
        old_description: String,
        new_description: String,
        timestamp: u64,
    },
}

impl GovernanceEvent {
    /// Short event name, matching the serialized `type` tag.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ForumCreated { .. } => "ForumCreated",
            Self::MemberJoined { .. } => "MemberJoined",
            Self::PollCreated { .. } => "PollCreated",
            Self::VoteReceived { .. } => "VoteReceived",
            Self::PollExecuted { .. } => "PollExecuted",
            Self::ForumMetadataUpdated { .. } => "ForumMetadataUpdated",
        }
    }

    /// Timestamp supplied by the operation that produced the event.
    pub fn timestamp(&self) -> u64 {
        match self {
            Self::ForumCreated { timestamp, .. }
            | Self::MemberJoined { timestamp, .. }
            | Self::PollCreated { timestamp, .. }
            | Self::VoteReceived { timestamp, .. }
            | Self::PollExecuted { timestamp, .. }
            | Self::ForumMetadataUpdated { timestamp, .. } => *timestamp,
        }
    }
}

/// Consumer of published events.
///
/// Publication cannot fail the operation that produced the event: the state
/// change has already committed. Sinks that do I/O log their own failures.
pub trait EventSink: Send + Sync {
    fn publish(&self, event: &GovernanceEvent);
}

/// Sink that drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn publish(&self, _event: &GovernanceEvent) {}
}
