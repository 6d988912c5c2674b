//! Forum: the root governance aggregate.
//!
//! Name and description change only through [`Forum::update_metadata`], which
//! is visible to this module tree alone and is called by poll execution after
//! a passed vote. The creator address is kept for audit; nothing reads it for
//! authorization.

use crate::context::TxContext;
use crate::error::{GovernanceError, GovernanceResult};
use crate::events::GovernanceEvent;
use crate::identity::{Address, ForumId, PollId};
use crate::verifier::{ForumVerifier, PasswordVerifier};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Forum {
    id: ForumId,
    name: String,
    description: String,
    creator: Address,
    verifier: ForumVerifier,
    member_count: u64,
    active_poll: Option<PollId>,
    created_at: u64,
}

impl Forum {
    /// Create a forum gated by a password verifier built from `secret`.
    pub fn create(
        name: &str,
        description: &str,
        secret: &[u8],
        ctx: &mut TxContext,
    ) -> GovernanceResult<Self> {
        if name.is_empty() {
            return Err(GovernanceError::EmptyName);
        }
        let verifier = PasswordVerifier::create(secret, ctx.now())?;
        Self::create_with_verifier(name, description, verifier.into(), ctx)
    }

    /// Create a forum gated by an already-built verifier.
    pub fn create_with_verifier(
        name: &str,
        description: &str,
        verifier: ForumVerifier,
        ctx: &mut TxContext,
    ) -> GovernanceResult<Self> {
        if name.is_empty() {
            return Err(GovernanceError::EmptyName);
        }
        let forum = Self {
            id: ctx.fresh_id(),
            name: name.to_string(),
            description: description.to_string(),
            creator: ctx.sender(),
            verifier,
            member_count: 0,
            active_poll: None,
            created_at: ctx.now(),
        };

        ctx.emit(GovernanceEvent::ForumCreated {
            forum_id: forum.id,
            name: forum.name.clone(),
            description: forum.description.clone(),
            creator: forum.creator,
            timestamp: ctx.now(),
        });

        Ok(forum)
    }

    pub fn id(&self) -> ForumId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn creator(&self) -> Address {
        self.creator
    }

    pub fn verifier(&self) -> &ForumVerifier {
        &self.verifier
    }

    pub fn member_count(&self) -> u64 {
        self.member_count
    }

    pub fn active_poll(&self) -> Option<PollId> {
        self.active_poll
    }

    pub fn created_at(&self) -> u64 {
        self.created_at
    }

    pub(super) fn set_active_poll(&mut self, poll_id: PollId) -> GovernanceResult<()> {
        if self.active_poll.is_some() {
            return Err(GovernanceError::ActivePollExists);
        }
        self.active_poll = Some(poll_id);
        Ok(())
    }

    pub(super) fn clear_active_poll(&mut self) -> GovernanceResult<()> {
        match self.active_poll.take() {
            Some(_) => Ok(()),
            None => Err(GovernanceError::NoActivePoll),
        }
    }

    /// Returns the new count.
    pub(super) fn increment_member_count(&mut self) -> u64 {
        self.member_count += 1;
        self.member_count
    }

    /// Only called by poll execution after a passed vote.
    pub(super) fn update_metadata(
        &mut self,
        new_name: &str,
        new_description: &str,
        poll_id: PollId,
        ctx: &mut TxContext,
    ) {
        let old_name = std::mem::replace(&mut self.name, new_name.to_string());
        let old_description =
            std::mem::replace(&mut self.description, new_description.to_string());

        debug!(forum = %self.id.short(), poll = %poll_id.short(), "forum metadata updated");

        ctx.emit(GovernanceEvent::ForumMetadataUpdated {
            forum_id: self.id,
            poll_id,
            old_name,
            new_name: self.name.clone(),
            old_description,
            new_description: self.description.clone(),
            timestamp: ctx.now(),
        });
    }
}
