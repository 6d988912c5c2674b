//! Member registry and membership records.
//!
//! The registry is the authoritative, append-only member set of one forum.
//! A set gives O(1) lookups; an ordered list alongside it gives deterministic
//! enumeration. A [`Membership`] is the joiner's audit record. It has no
//! owner-changing operation: memberships are bound to the address that joined.

use super::forum::Forum;
use crate::context::TxContext;
use crate::error::{GovernanceError, GovernanceResult};
use crate::events::GovernanceEvent;
use crate::identity::{Address, ForumId, MembershipId, RegistryId};
use crate::verifier::Verifier;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StoredRegistry", into = "StoredRegistry")]
pub struct MemberRegistry {
    id: RegistryId,
    forum_id: ForumId,
    members: HashSet<Address>,
    ordered: Vec<Address>,
    total_count: u64,
}

/// Serialized form: the ordered list only, so snapshots are deterministic.
/// The lookup set is rebuilt on load.
#[derive(Serialize, Deserialize)]
struct StoredRegistry {
    id: RegistryId,
    forum_id: ForumId,
    members: Vec<Address>,
}

impl From<StoredRegistry> for MemberRegistry {
    /// Repeated addresses keep their first position only.
    fn from(stored: StoredRegistry) -> Self {
        let mut members = HashSet::with_capacity(stored.members.len());
        let ordered: Vec<Address> = stored
            .members
            .into_iter()
            .filter(|address| members.insert(*address))
            .collect();
        Self {
            id: stored.id,
            forum_id: stored.forum_id,
            members,
            total_count: ordered.len() as u64,
            ordered,
        }
    }
}

impl From<MemberRegistry> for StoredRegistry {
    fn from(registry: MemberRegistry) -> Self {
        Self {
            id: registry.id,
            forum_id: registry.forum_id,
            members: registry.ordered,
        }
    }
}

impl MemberRegistry {
    /// Empty registry for `forum_id`.
    pub fn init(forum_id: ForumId, ctx: &mut TxContext) -> Self {
        Self {
            id: ctx.fresh_id(),
            forum_id,
            members: HashSet::new(),
            ordered: Vec::new(),
            total_count: 0,
        }
    }

    pub fn id(&self) -> RegistryId {
        self.id
    }

    pub fn forum_id(&self) -> ForumId {
        self.forum_id
    }

    pub fn is_member(&self, address: &Address) -> bool {
        self.members.contains(address)
    }

    /// Fails with [`GovernanceError::NotMember`] unless `address` joined.
    pub fn verify_member_or_abort(&self, address: &Address) -> GovernanceResult<()> {
        if self.is_member(address) {
            Ok(())
        } else {
            Err(GovernanceError::NotMember)
        }
    }

    /// Member at join position `index`.
    pub fn member_at(&self, index: usize) -> Option<Address> {
        self.ordered.get(index).copied()
    }

    /// All members in join order.
    pub fn all_members(&self) -> &[Address] {
        &self.ordered
    }

    pub fn total_count(&self) -> u64 {
        self.total_count
    }

    fn add(&mut self, address: Address) -> GovernanceResult<()> {
        if !self.members.insert(address) {
            return Err(GovernanceError::AlreadyMember);
        }
        self.ordered.push(address);
        self.total_count += 1;
        Ok(())
    }
}

/// Proof that an address joined a forum. Immutable once minted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    id: MembershipId,
    forum_id: ForumId,
    member: Address,
    joined_at: u64,
}

impl Membership {
    pub fn id(&self) -> MembershipId {
        self.id
    }

    pub fn forum_id(&self) -> ForumId {
        self.forum_id
    }

    pub fn member(&self) -> Address {
        self.member
    }

    pub fn joined_at(&self) -> u64 {
        self.joined_at
    }
}

/// Join `forum` through `registry` as the context's sender.
///
/// The credential is checked before anything is written; a rejected join
/// leaves both records untouched.
pub fn join(
    forum: &mut Forum,
    registry: &mut MemberRegistry,
    secret: &[u8],
    ctx: &mut TxContext,
) -> GovernanceResult<Membership> {
    GovernanceError::ensure_linked(forum.id(), registry.forum_id())?;
    forum.verifier().verify_or_abort(secret)?;

    let member = ctx.sender();
    registry.add(member)?;

    let membership = Membership {
        id: ctx.fresh_id(),
        forum_id: forum.id(),
        member,
        joined_at: ctx.now(),
    };
    let total_members = forum.increment_member_count();

    ctx.emit(GovernanceEvent::MemberJoined {
        forum_id: forum.id(),
        member,
        membership_id: membership.id,
        total_members,
        timestamp: ctx.now(),
    });

    Ok(membership)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::ObjectId;

    fn setup() -> (Forum, MemberRegistry) {
        let mut ctx = TxContext::new(Address::from_label("creator"), 0, 0);
        let forum = Forum::create("Alpha", "desc", b"pw1", &mut ctx).unwrap();
        let registry = MemberRegistry::init(forum.id(), &mut ctx);
        (forum, registry)
    }

    fn ctx_for(label: &str, nonce: u64) -> TxContext {
        TxContext::new(Address::from_label(label), 10, nonce)
    }

    #[test]
    fn test_join_adds_member() {
        let (mut forum, mut registry) = setup();
        let mut ctx = ctx_for("alice", 1);

        let membership = join(&mut forum, &mut registry, b"pw1", &mut ctx).unwrap();

        let alice = Address::from_label("alice");
        assert!(registry.is_member(&alice));
        assert_eq!(registry.total_count(), 1);
        assert_eq!(registry.member_at(0), Some(alice));
        assert_eq!(forum.member_count(), 1);
        assert_eq!(membership.member(), alice);
        assert_eq!(membership.forum_id(), forum.id());
        assert_eq!(membership.joined_at(), 10);
    }

    #[test]
    fn test_join_emits_member_joined() {
        let (mut forum, mut registry) = setup();
        let mut ctx = ctx_for("alice", 1);

        let membership = join(&mut forum, &mut registry, b"pw1", &mut ctx).unwrap();

        assert_eq!(
            ctx.events(),
            &[GovernanceEvent::MemberJoined {
                forum_id: forum.id(),
                member: Address::from_label("alice"),
                membership_id: membership.id(),
                total_members: 1,
                timestamp: 10,
            }]
        );
    }

    #[test]
    fn test_wrong_secret_leaves_state_untouched() {
        let (mut forum, mut registry) = setup();
        let before = (forum.clone(), registry.clone());
        let mut ctx = ctx_for("alice", 1);

        let result = join(&mut forum, &mut registry, b"wrong", &mut ctx);

        assert_eq!(result, Err(GovernanceError::VerificationFailed));
        assert_eq!((forum, registry), before);
        assert!(ctx.events().is_empty());
    }

    #[test]
    fn test_double_join_rejected() {
        let (mut forum, mut registry) = setup();
        join(&mut forum, &mut registry, b"pw1", &mut ctx_for("alice", 1)).unwrap();

        let result = join(&mut forum, &mut registry, b"pw1", &mut ctx_for("alice", 2));

        assert_eq!(result, Err(GovernanceError::AlreadyMember));
        assert_eq!(forum.member_count(), 1);
        assert_eq!(registry.total_count(), 1);
    }

    #[test]
    fn test_registry_for_other_forum_rejected() {
        let (mut forum, _) = setup();
        let mut ctx = TxContext::new(Address::from_label("creator"), 0, 9);
        let other = Forum::create("Other", "", b"pw1", &mut ctx).unwrap();
        let mut foreign = MemberRegistry::init(other.id(), &mut ctx);

        let result = join(&mut forum, &mut foreign, b"pw1", &mut ctx_for("alice", 1));

        assert!(matches!(
            result,
            Err(GovernanceError::CrossReferenceMismatch { .. })
        ));
        assert_eq!(foreign.total_count(), 0);
    }

    #[test]
    fn test_enumeration_is_join_order() {
        let (mut forum, mut registry) = setup();
        for (i, label) in ["carol", "alice", "bob"].iter().enumerate() {
            join(&mut forum, &mut registry, b"pw1", &mut ctx_for(label, i as u64 + 1)).unwrap();
        }

        let expected: Vec<Address> = ["carol", "alice", "bob"]
            .iter()
            .map(|l| Address::from_label(l))
            .collect();
        assert_eq!(registry.all_members(), expected.as_slice());
        assert_eq!(registry.member_at(3), None);
    }

    #[test]
    fn test_serialized_form_rebuilds_lookup_set() {
        let (mut forum, mut registry) = setup();
        join(&mut forum, &mut registry, b"pw1", &mut ctx_for("alice", 1)).unwrap();
        join(&mut forum, &mut registry, b"pw1", &mut ctx_for("bob", 2)).unwrap();

        let json = serde_json::to_string(&registry).unwrap();
        let restored: MemberRegistry = serde_json::from_str(&json).unwrap();

        assert_eq!(restored, registry);
        assert!(restored.is_member(&Address::from_label("bob")));
        assert_eq!(restored.total_count(), 2);
    }

    #[test]
    fn test_stored_duplicates_collapse_on_load() {
        let alice = Address::from_label("alice");
        let bob = Address::from_label("bob");
        let stored = StoredRegistry {
            id: ObjectId::new([1; 32]),
            forum_id: ObjectId::new([2; 32]),
            members: vec![alice, bob, alice],
        };

        let registry = MemberRegistry::from(stored);

        assert_eq!(registry.total_count(), 2);
        assert_eq!(registry.all_members(), &[alice, bob]);
        assert_eq!(registry.member_at(2), None);
    }

    #[test]
    fn test_verify_member_or_abort() {
        let (mut forum, mut registry) = setup();
        join(&mut forum, &mut registry, b"pw1", &mut ctx_for("alice", 1)).unwrap();

        assert!(registry
            .verify_member_or_abort(&Address::from_label("alice"))
            .is_ok());
        assert_eq!(
            registry.verify_member_or_abort(&Address::from_label("mallory")),
            Err(GovernanceError::NotMember)
        );
    }
}
