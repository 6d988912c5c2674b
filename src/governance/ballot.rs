//! Vote casting: double-vote ledger and pseudonymous ballots.
//!
//! The [`VoteRegistry`] remembers which addresses voted on a poll. The
//! published [`Ballot`] carries only `anonymous_voter_id(voter, poll)`.
//!
//! # Pseudonymous, not anonymous
//!
//! The voter id is a deterministic hash of public inputs. Anyone who knows a
//! candidate address and the poll id can recompute it, find the matching
//! ballot and read its choice. Ids for the same voter on different polls are
//! unrelated without such a guess. Unlinkable voting would need commitments
//! or zero-knowledge membership proofs, which this crate does not provide.

use super::membership::MemberRegistry;
use super::poll::Poll;
use crate::context::TxContext;
use crate::error::{GovernanceError, GovernanceResult};
use crate::events::GovernanceEvent;
use crate::identity::{digest_bytes, Address, AnonymousVoterId, BallotId, PollId, RegistryId};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashSet;

/// `sha256(voter_address ‖ poll_id)`, both as their raw 32 bytes.
pub fn anonymous_voter_id(voter: &Address, poll_id: &PollId) -> AnonymousVoterId {
    let mut hasher = Sha256::new();
    hasher.update(voter.as_bytes());
    hasher.update(poll_id.as_bytes());
    AnonymousVoterId::new(digest_bytes(hasher))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteChoice {
    Yes,
    No,
}

impl VoteChoice {
    pub fn is_yes(self) -> bool {
        matches!(self, Self::Yes)
    }
}

impl From<bool> for VoteChoice {
    fn from(yes: bool) -> Self {
        if yes {
            Self::Yes
        } else {
            Self::No
        }
    }
}

/// Addresses that have voted on one poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StoredVoteRegistry", into = "StoredVoteRegistry")]
pub struct VoteRegistry {
    id: RegistryId,
    poll_id: PollId,
    voters: HashSet<Address>,
    total_votes: u64,
}

/// Serialized form with voters sorted, so snapshots are deterministic.
#[derive(Serialize, Deserialize)]
struct StoredVoteRegistry {
    id: RegistryId,
    poll_id: PollId,
    voters: Vec<Address>,
}

impl From<StoredVoteRegistry> for VoteRegistry {
    fn from(stored: StoredVoteRegistry) -> Self {
        // Count from the set so a repeated address in a snapshot counts once.
        let voters: HashSet<Address> = stored.voters.into_iter().collect();
        Self {
            id: stored.id,
            poll_id: stored.poll_id,
            total_votes: voters.len() as u64,
            voters,
        }
    }
}

impl From<VoteRegistry> for StoredVoteRegistry {
    fn from(registry: VoteRegistry) -> Self {
        let mut voters: Vec<Address> = registry.voters.into_iter().collect();
        voters.sort();
        Self {
            id: registry.id,
            poll_id: registry.poll_id,
            voters,
        }
    }
}

impl VoteRegistry {
    pub fn init(poll_id: PollId, ctx: &mut TxContext) -> Self {
        Self {
            id: ctx.fresh_id(),
            poll_id,
            voters: HashSet::new(),
            total_votes: 0,
        }
    }

    pub fn id(&self) -> RegistryId {
        self.id
    }

    pub fn poll_id(&self) -> PollId {
        self.poll_id
    }

    pub fn has_voted(&self, address: &Address) -> bool {
        self.voters.contains(address)
    }

    pub fn total_votes(&self) -> u64 {
        self.total_votes
    }
}

/// Immutable public record of one cast vote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ballot {
    id: BallotId,
    poll_id: PollId,
    anonymous_voter_id: AnonymousVoterId,
    choice: VoteChoice,
    timestamp: u64,
}

impl Ballot {
    pub fn id(&self) -> BallotId {
        self.id
    }

    pub fn poll_id(&self) -> PollId {
        self.poll_id
    }

    pub fn anonymous_voter_id(&self) -> AnonymousVoterId {
        self.anonymous_voter_id
    }

    pub fn choice(&self) -> VoteChoice {
        self.choice
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }
}

/// Cast the context sender's vote on `poll`.
///
/// Checks run in order: id links, membership, poll still open (not ended and
/// not executed), no previous vote. All of them pass before the registry or tallies change.
pub fn vote(
    poll: &mut Poll,
    votes: &mut VoteRegistry,
    members: &MemberRegistry,
    choice: VoteChoice,
    ctx: &mut TxContext,
) -> GovernanceResult<Ballot> {
    GovernanceError::ensure_linked(poll.id(), votes.poll_id)?;
    GovernanceError::ensure_linked(poll.forum_id(), members.forum_id())?;

    let voter = ctx.sender();
    members.verify_member_or_abort(&voter)?;
    // Executed is terminal whatever time the caller claims.
    if poll.is_executed() || poll.has_ended(ctx.now()) {
        return Err(GovernanceError::PollEnded);
    }
    if !votes.voters.insert(voter) {
        return Err(GovernanceError::AlreadyVoted);
    }
    votes.total_votes += 1;

    match choice {
        VoteChoice::Yes => poll.increment_yes(),
        VoteChoice::No => poll.increment_no(),
    }

    let ballot = Ballot {
        id: ctx.fresh_id(),
        poll_id: poll.id(),
        anonymous_voter_id: anonymous_voter_id(&voter, &poll.id()),
        choice,
        timestamp: ctx.now(),
    };

    ctx.emit(GovernanceEvent::VoteReceived {
        poll_id: ballot.poll_id,
        anonymous_voter_id: ballot.anonymous_voter_id,
        timestamp: ballot.timestamp,
    });

    Ok(ballot)
}
