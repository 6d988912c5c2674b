//! Property-based tests for the governance state machine.
//!
//! - Pseudonyms: determinism, fixed length, separation by voter and poll
//! - Outcome rule: passed iff strict majority with non-zero turnout
//! - Guards: repeated joins and votes never change counts

use super::*;
use crate::context::TxContext;
use crate::error::GovernanceError;
use crate::identity::{Address, ObjectId};
use proptest::prelude::*;

fn address() -> impl Strategy<Value = Address> {
    any::<[u8; 32]>().prop_map(Address::new)
}

fn object_id() -> impl Strategy<Value = ObjectId> {
    any::<[u8; 32]>().prop_map(ObjectId::new)
}

proptest! {
    /// Property: same (voter, poll) always yields the same pseudonym
    #[test]
    fn anonymous_id_is_deterministic(voter in address(), poll in object_id()) {
        let a = anonymous_voter_id(&voter, &poll);
        let b = anonymous_voter_id(&voter, &poll);
        prop_assert_eq!(a, b);
        prop_assert_eq!(a.as_bytes().len(), 32);
    }

    /// Property: different voters on the same poll get different pseudonyms
    #[test]
    fn anonymous_id_separates_voters(v1 in address(), v2 in address(), poll in object_id()) {
        prop_assume!(v1 != v2);
        prop_assert_ne!(anonymous_voter_id(&v1, &poll), anonymous_voter_id(&v2, &poll));
    }

    /// Property: the same voter on different polls gets different pseudonyms
    #[test]
    fn anonymous_id_separates_polls(voter in address(), p1 in object_id(), p2 in object_id()) {
        prop_assume!(p1 != p2);
        prop_assert_ne!(anonymous_voter_id(&voter, &p1), anonymous_voter_id(&voter, &p2));
    }

    /// Property: passed ⇔ yes > no ∧ yes + no > 0
    #[test]
    fn outcome_rule(yes in 0u64..10_000, no in 0u64..10_000) {
        let outcome = PollOutcome::from_tallies(yes, no);
        prop_assert_eq!(outcome.passed, yes > no && yes + no > 0);
        prop_assert_eq!(outcome.total_participants, yes + no);
    }

    /// Property: ties never pass
    #[test]
    fn ties_never_pass(n in 0u64..10_000) {
        prop_assert!(!passes(n, n));
    }

    /// Property: member count equals distinct joiners, however often each retries
    #[test]
    fn repeated_joins_count_once(joins in prop::collection::vec(0u8..8, 1..40)) {
        let mut ctx = TxContext::new(Address::from_label("creator"), 0, 0);
        let mut forum = Forum::create("Alpha", "", b"pw", &mut ctx).unwrap();
        let mut registry = MemberRegistry::init(forum.id(), &mut ctx);

        let mut distinct = std::collections::HashSet::new();
        for (nonce, who) in joins.iter().enumerate() {
            let sender = Address::new([*who; 32]);
            let mut ctx = TxContext::new(sender, 1, nonce as u64 + 1);
            let result = join(&mut forum, &mut registry, b"pw", &mut ctx);
            if distinct.insert(*who) {
                prop_assert!(result.is_ok());
            } else {
                prop_assert_eq!(result, Err(GovernanceError::AlreadyMember));
            }
        }

        prop_assert_eq!(forum.member_count(), distinct.len() as u64);
        prop_assert_eq!(registry.total_count(), distinct.len() as u64);
    }

    /// Property: tallies equal the first vote of each distinct member
    #[test]
    fn tallies_count_first_vote_only(
        casts in prop::collection::vec((0u8..6, any::<bool>()), 1..40),
    ) {
        let mut ctx = TxContext::new(Address::from_label("creator"), 0, 0);
        let mut forum = Forum::create("Alpha", "", b"pw", &mut ctx).unwrap();
        let mut members = MemberRegistry::init(forum.id(), &mut ctx);
        for who in 0u8..6 {
            let mut ctx = TxContext::new(Address::new([who; 32]), 1, who as u64 + 1);
            join(&mut forum, &mut members, b"pw", &mut ctx).unwrap();
        }

        let mut ctx = TxContext::new(Address::new([0; 32]), 10, 100);
        let draft = ProposalDraft {
            title: "t".to_string(),
            description: String::new(),
            proposed_name: "n".to_string(),
            proposed_description: String::new(),
            duration: 1_000,
        };
        let mut poll = Poll::create(&mut forum, &members, draft, &mut ctx).unwrap();
        let mut votes = VoteRegistry::init(poll.id(), &mut ctx);

        let mut first = std::collections::HashMap::new();
        for (i, (who, yes)) in casts.iter().enumerate() {
            let mut ctx = TxContext::new(Address::new([*who; 32]), 20, 200 + i as u64);
            let result = vote(&mut poll, &mut votes, &members, VoteChoice::from(*yes), &mut ctx);
            if first.contains_key(who) {
                prop_assert_eq!(result, Err(GovernanceError::AlreadyVoted));
            } else {
                prop_assert!(result.is_ok());
                first.insert(*who, *yes);
            }
        }

        let expected_yes = first.values().filter(|y| **y).count() as u64;
        let expected_no = first.len() as u64 - expected_yes;
        prop_assert_eq!(poll.yes_votes(), expected_yes);
        prop_assert_eq!(poll.no_votes(), expected_no);
        prop_assert_eq!(votes.total_votes(), first.len() as u64);
    }
}
