//! Per-operation caller context.
//!
//! A [`TxContext`] is built by the ledger for exactly one operation. It carries
//! the caller's address and the caller-supplied time, mints fresh object ids,
//! and stages events until the operation commits. The core never reads a
//! clock; everything time-dependent goes through [`TxContext::now`].

use crate::events::GovernanceEvent;
use crate::identity::{digest_bytes, Address, ObjectId};
use sha2::{Digest, Sha256};

/// Domain tag for transaction digests.
const TX_DOMAIN: &[u8] = b"concord-tx-v1";

#[derive(Debug)]
pub struct TxContext {
    sender: Address,
    now: u64,
    digest: [u8; 32],
    ids_created: u64,
    events: Vec<GovernanceEvent>,
}

impl TxContext {
    /// Context for one operation by `sender` at time `now`.
    ///
    /// `nonce` must be unique per committed operation; the ledger uses its
    /// commit counter. Ids minted from the same `(nonce, sender)` repeat, so a
    /// re-executed operation reproduces the same ids.
    pub fn new(sender: Address, now: u64, nonce: u64) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(TX_DOMAIN);
        hasher.update(nonce.to_le_bytes());
        hasher.update(sender.as_bytes());

        Self {
            sender,
            now,
            digest: digest_bytes(hasher),
            ids_created: 0,
            events: Vec::new(),
        }
    }

    pub fn sender(&self) -> Address {
        self.sender
    }

    pub fn now(&self) -> u64 {
        self.now
    }

    /// Mint a new object id.
    pub fn fresh_id(&mut self) -> ObjectId {
        let mut hasher = Sha256::new();
        hasher.update(self.digest);
        hasher.update(self.ids_created.to_le_bytes());
        self.ids_created += 1;
        ObjectId::new(digest_bytes(hasher))
    }

    pub(crate) fn emit(&mut self, event: GovernanceEvent) {
        self.events.push(event);
    }

    /// Events staged so far.
    pub fn events(&self) -> &[GovernanceEvent] {
        &self.events
    }

    pub(crate) fn into_events(self) -> Vec<GovernanceEvent> {
        self.events
    }
}
