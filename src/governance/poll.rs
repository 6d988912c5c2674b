//! Polls: time-boxed proposals to change forum metadata.
//!
//! ```text
//! Active (now < end_time) ──► Ended (now ≥ end_time) ──► Executed
//! ```
//!
//! There is no cancel or withdraw path. Execution is the only way out of
//! Ended, it frees the forum's active-poll slot whatever the outcome, and it
//! rewrites forum metadata only when the poll passed.

use super::forum::Forum;
use super::membership::MemberRegistry;
use crate::context::TxContext;
use crate::error::{GovernanceError, GovernanceResult};
use crate::events::GovernanceEvent;
use crate::identity::{Address, ForumId, PollId};
use serde::{Deserialize, Serialize};

/// What a member proposes. `duration` is in the caller's time units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalDraft {
    pub title: String,
    pub description: String,
    pub proposed_name: String,
    pub proposed_description: String,
    pub duration: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PollStatus {
    /// Accepting votes.
    Active,
    /// Voting closed, waiting for execution.
    Ended,
    /// Terminal.
    Executed,
}

/// Final tallies reported by [`execute`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollOutcome {
    pub yes_votes: u64,
    pub no_votes: u64,
    pub total_participants: u64,
    pub passed: bool,
}

impl PollOutcome {
    pub fn from_tallies(yes_votes: u64, no_votes: u64) -> Self {
        Self {
            yes_votes,
            no_votes,
            total_participants: yes_votes + no_votes,
            passed: passes(yes_votes, no_votes),
        }
    }
}

/// Strict majority of cast votes; ties and zero turnout fail.
pub fn passes(yes_votes: u64, no_votes: u64) -> bool {
    yes_votes > no_votes && yes_votes + no_votes > 0
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Poll {
    id: PollId,
    forum_id: ForumId,
    title: String,
    description: String,
    proposed_name: String,
    proposed_description: String,
    creator: Address,
    start_time: u64,
    end_time: u64,
    yes_votes: u64,
    no_votes: u64,
    member_snapshot: u64,
    is_executed: bool,
}

impl Poll {
    /// Open a poll on `forum`, proposed by the context's sender.
    ///
    /// The caller must be a member, and the forum must have no active poll.
    pub fn create(
        forum: &mut Forum,
        registry: &MemberRegistry,
        draft: ProposalDraft,
        ctx: &mut TxContext,
    ) -> GovernanceResult<Self> {
        if draft.title.is_empty() {
            return Err(GovernanceError::EmptyTitle);
        }
        if draft.duration == 0 {
            return Err(GovernanceError::InvalidDuration);
        }
        let start_time = ctx.now();
        let end_time = start_time
            .checked_add(draft.duration)
            .ok_or(GovernanceError::InvalidDuration)?;

        GovernanceError::ensure_linked(forum.id(), registry.forum_id())?;
        registry.verify_member_or_abort(&ctx.sender())?;
        if forum.active_poll().is_some() {
            return Err(GovernanceError::ActivePollExists);
        }

        let poll = Self {
            id: ctx.fresh_id(),
            forum_id: forum.id(),
            title: draft.title,
            description: draft.description,
            proposed_name: draft.proposed_name,
            proposed_description: draft.proposed_description,
            creator: ctx.sender(),
            start_time,
            end_time,
            yes_votes: 0,
            no_votes: 0,
            member_snapshot: registry.total_count(),
            is_executed: false,
        };
        forum.set_active_poll(poll.id)?;

        ctx.emit(GovernanceEvent::PollCreated {
            poll_id: poll.id,
            forum_id: poll.forum_id,
            title: poll.title.clone(),
            description: poll.description.clone(),
            creator: poll.creator,
            start_time,
            end_time,
            timestamp: ctx.now(),
        });

        Ok(poll)
    }

    pub fn id(&self) -> PollId {
        self.id
    }

    pub fn forum_id(&self) -> ForumId {
        self.forum_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn proposed_name(&self) -> &str {
        &self.proposed_name
    }

    pub fn proposed_description(&self) -> &str {
        &self.proposed_description
    }

    pub fn creator(&self) -> Address {
        self.creator
    }

    pub fn start_time(&self) -> u64 {
        self.start_time
    }

    pub fn end_time(&self) -> u64 {
        self.end_time
    }

    pub fn yes_votes(&self) -> u64 {
        self.yes_votes
    }

    pub fn no_votes(&self) -> u64 {
        self.no_votes
    }

    /// Registry size when the poll opened.
    pub fn member_snapshot(&self) -> u64 {
        self.member_snapshot
    }

    pub fn is_executed(&self) -> bool {
        self.is_executed
    }

    pub fn has_ended(&self, now: u64) -> bool {
        now >= self.end_time
    }

    pub fn status(&self, now: u64) -> PollStatus {
        if self.is_executed {
            PollStatus::Executed
        } else if self.has_ended(now) {
            PollStatus::Ended
        } else {
            PollStatus::Active
        }
    }

    /// Votes cast over the member snapshot; 0.0 for an empty snapshot.
    pub fn participation_rate(&self) -> f64 {
        if self.member_snapshot == 0 {
            return 0.0;
        }
        (self.yes_votes + self.no_votes) as f64 / self.member_snapshot as f64
    }

    /// Outcome if the poll were executed with the current tallies.
    pub fn tally(&self) -> PollOutcome {
        PollOutcome::from_tallies(self.yes_votes, self.no_votes)
    }

    pub(super) fn increment_yes(&mut self) {
        self.yes_votes += 1;
    }

    pub(super) fn increment_no(&mut self) {
        self.no_votes += 1;
    }
}

/// Close `poll` and apply its outcome to `forum`.
///
/// Anyone may execute once the poll has ended. Emits `PollExecuted` whether
/// the poll passed or not, preceded by `ForumMetadataUpdated` when it passed.
pub fn execute(
    forum: &mut Forum,
    poll: &mut Poll,
    ctx: &mut TxContext,
) -> GovernanceResult<PollOutcome> {
    GovernanceError::ensure_linked(forum.id(), poll.forum_id)?;
    if poll.is_executed {
        return Err(GovernanceError::AlreadyExecuted);
    }
    if !poll.has_ended(ctx.now()) {
        return Err(GovernanceError::PollNotEnded);
    }

    let outcome = poll.tally();
    forum.clear_active_poll()?;
    poll.is_executed = true;

    if outcome.passed {
        forum.update_metadata(
            &poll.proposed_name,
            &poll.proposed_description,
            poll.id,
            ctx,
        );
    }

    ctx.emit(GovernanceEvent::PollExecuted {
        poll_id: poll.id,
        forum_id: forum.id(),
        yes_votes: outcome.yes_votes,
        no_votes: outcome.no_votes,
        total_participants: outcome.total_participants,
        passed: outcome.passed,
        timestamp: ctx.now(),
    });

    Ok(outcome)
}
