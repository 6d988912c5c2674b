//! The record store and entry-operation surface.
//!
//! Every entity lives in its own id-keyed map. There are no foreign keys:
//! each operation looks up the records it was handed, checks they belong
//! together, and runs the governance logic on copies. Only when that logic
//! succeeds are the copies written back, the commit nonce bumped and the
//! staged events published. A failed operation leaves no trace.

pub mod shared;

pub use shared::SharedLedger;

use crate::context::TxContext;
use crate::error::{GovernanceError, GovernanceResult};
use crate::events::{EventSink, NullSink};
use crate::governance::{
    self, Ballot, Forum, MemberRegistry, Membership, Poll, PollOutcome, ProposalDraft, VoteChoice,
    VoteRegistry,
};
use crate::identity::{
    Address, BallotId, ForumId, MembershipId, ObjectId, ObjectKind, PollId, RegistryId,
};
use crate::serialization::{from_cbor, to_cbor, SerializationError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Current snapshot schema.
pub const SCHEMA_VERSION: u32 = 1;

/// Everything that is persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct LedgerState {
    schema_version: u32,
    /// Number of committed operations; seeds id minting.
    nonce: u64,
    forums: BTreeMap<ForumId, Forum>,
    member_registries: BTreeMap<RegistryId, MemberRegistry>,
    memberships: BTreeMap<MembershipId, Membership>,
    polls: BTreeMap<PollId, Poll>,
    vote_registries: BTreeMap<RegistryId, VoteRegistry>,
    ballots: BTreeMap<BallotId, Ballot>,
    /// forum -> its member registry
    #[serde(default)]
    forum_links: BTreeMap<ForumId, RegistryId>,
    /// poll -> its vote registry
    #[serde(default)]
    poll_links: BTreeMap<PollId, RegistryId>,
}

impl Default for LedgerState {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            nonce: 0,
            forums: BTreeMap::new(),
            member_registries: BTreeMap::new(),
            memberships: BTreeMap::new(),
            polls: BTreeMap::new(),
            vote_registries: BTreeMap::new(),
            ballots: BTreeMap::new(),
            forum_links: BTreeMap::new(),
            poll_links: BTreeMap::new(),
        }
    }
}

fn lookup<'a, T>(
    map: &'a BTreeMap<ObjectId, T>,
    kind: ObjectKind,
    id: ObjectId,
) -> GovernanceResult<&'a T> {
    map.get(&id).ok_or(GovernanceError::NotFound { kind, id })
}

/// Log a rejected operation and pass the error through.
fn rejected(op: &'static str) -> impl Fn(GovernanceError) -> GovernanceError {
    move |e| {
        warn!(op, category = ?e.category(), "operation rejected: {}", e);
        e
    }
}

pub struct Ledger {
    state: LedgerState,
    sink: Arc<dyn EventSink>,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new(Arc::new(NullSink))
    }
}

impl std::fmt::Debug for Ledger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ledger")
            .field("nonce", &self.state.nonce)
            .field("forums", &self.state.forums.len())
            .field("polls", &self.state.polls.len())
            .field("ballots", &self.state.ballots.len())
            .finish_non_exhaustive()
    }
}

impl Ledger {
    /// Empty ledger publishing to `sink`.
    pub fn new(sink: Arc<dyn EventSink>) -> Self {
        Self {
            state: LedgerState::default(),
            sink,
        }
    }

    /// Number of committed operations.
    pub fn nonce(&self) -> u64 {
        self.state.nonce
    }

    fn begin(&self, op: &'static str, sender: Address, now: u64) -> TxContext {
        debug!(op, nonce = self.state.nonce, now, "operation started");
        TxContext::new(sender, now, self.state.nonce)
    }

    fn commit(&mut self, ctx: TxContext) {
        self.state.nonce += 1;
        for event in ctx.into_events() {
            self.sink.publish(&event);
        }
    }

    // ------------------------------------------------------------------
    // Entry operations
    // ------------------------------------------------------------------

    pub fn create_forum(
        &mut self,
        sender: Address,
        name: &str,
        description: &str,
        secret: &[u8],
        now: u64,
    ) -> GovernanceResult<ForumId> {
        let mut ctx = self.begin("create_forum", sender, now);
        let forum = Forum::create(name, description, secret, &mut ctx)
            .map_err(rejected("create_forum"))?;

        let forum_id = forum.id();
        self.state.forums.insert(forum_id, forum);
        self.commit(ctx);

        info!(forum = %forum_id.short(), "forum created");
        Ok(forum_id)
    }

    /// Create the member registry for `forum_id`.
    ///
    /// Separate from [`Ledger::create_forum`]: until this runs, the forum
    /// exists but nobody can join it. A forum gets at most one registry.
    pub fn init_member_registry(
        &mut self,
        sender: Address,
        forum_id: ForumId,
        now: u64,
    ) -> GovernanceResult<RegistryId> {
        lookup(&self.state.forums, ObjectKind::Forum, forum_id)
            .map_err(rejected("init_member_registry"))?;
        if self.state.forum_links.contains_key(&forum_id) {
            return Err(GovernanceError::RegistryExists {
                kind: ObjectKind::Forum,
            })
            .map_err(rejected("init_member_registry"));
        }

        let mut ctx = self.begin("init_member_registry", sender, now);
        let registry = MemberRegistry::init(forum_id, &mut ctx);

        let registry_id = registry.id();
        self.state.member_registries.insert(registry_id, registry);
        self.state.forum_links.insert(forum_id, registry_id);
        self.commit(ctx);

        info!(forum = %forum_id.short(), registry = %registry_id.short(), "member registry linked");
        Ok(registry_id)
    }

    pub fn join_forum(
        &mut self,
        sender: Address,
        forum_id: ForumId,
        registry_id: RegistryId,
        secret: &[u8],
        now: u64,
    ) -> GovernanceResult<MembershipId> {
        let op = "join_forum";
        let mut forum = lookup(&self.state.forums, ObjectKind::Forum, forum_id)
            .map_err(rejected(op))?
            .clone();
        let mut registry = lookup(
            &self.state.member_registries,
            ObjectKind::MemberRegistry,
            registry_id,
        )
        .map_err(rejected(op))?
        .clone();

        let mut ctx = self.begin(op, sender, now);
        let membership = governance::join(&mut forum, &mut registry, secret, &mut ctx)
            .map_err(rejected(op))?;

        let membership_id = membership.id();
        let total = forum.member_count();
        self.state.forums.insert(forum_id, forum);
        self.state.member_registries.insert(registry_id, registry);
        self.state.memberships.insert(membership_id, membership);
        self.commit(ctx);

        info!(forum = %forum_id.short(), total_members = total, "member joined");
        Ok(membership_id)
    }

    pub fn create_poll(
        &mut self,
        sender: Address,
        forum_id: ForumId,
        registry_id: RegistryId,
        draft: ProposalDraft,
        now: u64,
    ) -> GovernanceResult<PollId> {
        let op = "create_poll";
        let mut forum = lookup(&self.state.forums, ObjectKind::Forum, forum_id)
            .map_err(rejected(op))?
            .clone();
        let registry = lookup(
            &self.state.member_registries,
            ObjectKind::MemberRegistry,
            registry_id,
        )
        .map_err(rejected(op))?;

        let mut ctx = self.begin(op, sender, now);
        let poll = Poll::create(&mut forum, registry, draft, &mut ctx).map_err(rejected(op))?;

        let poll_id = poll.id();
        let end_time = poll.end_time();
        self.state.forums.insert(forum_id, forum);
        self.state.polls.insert(poll_id, poll);
        self.commit(ctx);

        info!(forum = %forum_id.short(), poll = %poll_id.short(), end_time, "poll created");
        Ok(poll_id)
    }

    /// Create the vote registry for `poll_id`. A poll gets at most one.
    pub fn init_vote_registry(
        &mut self,
        sender: Address,
        poll_id: PollId,
        now: u64,
    ) -> GovernanceResult<RegistryId> {
        lookup(&self.state.polls, ObjectKind::Poll, poll_id)
            .map_err(rejected("init_vote_registry"))?;
        if self.state.poll_links.contains_key(&poll_id) {
            return Err(GovernanceError::RegistryExists {
                kind: ObjectKind::Poll,
            })
            .map_err(rejected("init_vote_registry"));
        }

        let mut ctx = self.begin("init_vote_registry", sender, now);
        let registry = VoteRegistry::init(poll_id, &mut ctx);

        let registry_id = registry.id();
        self.state.vote_registries.insert(registry_id, registry);
        self.state.poll_links.insert(poll_id, registry_id);
        self.commit(ctx);

        info!(poll = %poll_id.short(), registry = %registry_id.short(), "vote registry linked");
        Ok(registry_id)
    }

    /// Cast `sender`'s vote. Only the ballot pseudonym leaves this call.
    pub fn vote(
        &mut self,
        sender: Address,
        poll_id: PollId,
        vote_registry_id: RegistryId,
        member_registry_id: RegistryId,
        choice: VoteChoice,
        now: u64,
    ) -> GovernanceResult<BallotId> {
        let op = "vote";
        let mut poll = lookup(&self.state.polls, ObjectKind::Poll, poll_id)
            .map_err(rejected(op))?
            .clone();
        let mut votes = lookup(
            &self.state.vote_registries,
            ObjectKind::VoteRegistry,
            vote_registry_id,
        )
        .map_err(rejected(op))?
        .clone();
        let members = lookup(
            &self.state.member_registries,
            ObjectKind::MemberRegistry,
            member_registry_id,
        )
        .map_err(rejected(op))?;

        let mut ctx = self.begin(op, sender, now);
        let ballot = governance::vote(&mut poll, &mut votes, members, choice, &mut ctx)
            .map_err(rejected(op))?;

        let ballot_id = ballot.id();
        let total_votes = votes.total_votes();
        self.state.polls.insert(poll_id, poll);
        self.state.vote_registries.insert(vote_registry_id, votes);
        self.state.ballots.insert(ballot_id, ballot);
        self.commit(ctx);

        info!(poll = %poll_id.short(), total_votes, "ballot published");
        Ok(ballot_id)
    }

    pub fn execute_poll(
        &mut self,
        sender: Address,
        forum_id: ForumId,
        poll_id: PollId,
        now: u64,
    ) -> GovernanceResult<PollOutcome> {
        let op = "execute_poll";
        let mut forum = lookup(&self.state.forums, ObjectKind::Forum, forum_id)
            .map_err(rejected(op))?
            .clone();
        let mut poll = lookup(&self.state.polls, ObjectKind::Poll, poll_id)
            .map_err(rejected(op))?
            .clone();

        let mut ctx = self.begin(op, sender, now);
        let outcome = governance::execute(&mut forum, &mut poll, &mut ctx).map_err(rejected(op))?;

        self.state.forums.insert(forum_id, forum);
        self.state.polls.insert(poll_id, poll);
        self.commit(ctx);

        info!(
            poll = %poll_id.short(),
            yes = outcome.yes_votes,
            no = outcome.no_votes,
            passed = outcome.passed,
            "poll executed"
        );
        Ok(outcome)
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn forum(&self, id: ForumId) -> Option<&Forum> {
        self.state.forums.get(&id)
    }

    pub fn forums(&self) -> impl Iterator<Item = &Forum> {
        self.state.forums.values()
    }

    pub fn member_registry(&self, id: RegistryId) -> Option<&MemberRegistry> {
        self.state.member_registries.get(&id)
    }

    /// The registry linked to `forum_id`, if one was initialised.
    pub fn member_registry_for(&self, forum_id: ForumId) -> Option<&MemberRegistry> {
        self.state
            .forum_links
            .get(&forum_id)
            .and_then(|id| self.state.member_registries.get(id))
    }

    pub fn is_member(&self, registry_id: RegistryId, address: &Address) -> bool {
        self.member_registry(registry_id)
            .is_some_and(|r| r.is_member(address))
    }

    pub fn membership(&self, id: MembershipId) -> Option<&Membership> {
        self.state.memberships.get(&id)
    }

    /// Membership record of `address` in `forum_id`.
    pub fn membership_of(&self, forum_id: ForumId, address: &Address) -> Option<&Membership> {
        self.state
            .memberships
            .values()
            .find(|m| m.forum_id() == forum_id && m.member() == *address)
    }

    pub fn poll(&self, id: PollId) -> Option<&Poll> {
        self.state.polls.get(&id)
    }

    /// All polls of `forum_id`, oldest first.
    pub fn polls_for(&self, forum_id: ForumId) -> Vec<&Poll> {
        let mut polls: Vec<&Poll> = self
            .state
            .polls
            .values()
            .filter(|p| p.forum_id() == forum_id)
            .collect();
        polls.sort_by_key(|p| (p.start_time(), p.id()));
        polls
    }

    pub fn vote_registry(&self, id: RegistryId) -> Option<&VoteRegistry> {
        self.state.vote_registries.get(&id)
    }

    /// The vote registry linked to `poll_id`, if one was initialised.
    pub fn vote_registry_for(&self, poll_id: PollId) -> Option<&VoteRegistry> {
        self.state
            .poll_links
            .get(&poll_id)
            .and_then(|id| self.state.vote_registries.get(id))
    }

    pub fn has_voted(&self, vote_registry_id: RegistryId, address: &Address) -> bool {
        self.vote_registry(vote_registry_id)
            .is_some_and(|r| r.has_voted(address))
    }

    pub fn ballot(&self, id: BallotId) -> Option<&Ballot> {
        self.state.ballots.get(&id)
    }

    /// Published ballots of `poll_id`, in timestamp order.
    pub fn ballots_for(&self, poll_id: PollId) -> Vec<&Ballot> {
        let mut ballots: Vec<&Ballot> = self
            .state
            .ballots
            .values()
            .filter(|b| b.poll_id() == poll_id)
            .collect();
        ballots.sort_by_key(|b| (b.timestamp(), b.id()));
        ballots
    }

    // ------------------------------------------------------------------
    // Snapshots
    // ------------------------------------------------------------------

    /// Encode the full state as CBOR. The sink is not included.
    pub fn to_snapshot(&self) -> Result<Vec<u8>, SerializationError> {
        to_cbor(&self.state)
    }

    /// Restore a ledger from [`Ledger::to_snapshot`] output.
    pub fn from_snapshot(
        bytes: &[u8],
        sink: Arc<dyn EventSink>,
    ) -> Result<Self, SerializationError> {
        let state: LedgerState = from_cbor(bytes)?;
        if state.schema_version > SCHEMA_VERSION {
            return Err(SerializationError::Decode(format!(
                "snapshot schema {} is newer than supported {}",
                state.schema_version, SCHEMA_VERSION
            )));
        }
        Ok(Self { state, sink })
    }
}
