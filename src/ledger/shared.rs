//! Serialized access to one ledger from many threads or tasks.
//!
//! Operations on the same ledger are linearized by a single lock, so two
//! concurrent votes by the same member can never both commit.

use super::Ledger;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Clone, Default)]
pub struct SharedLedger {
    inner: Arc<Mutex<Ledger>>,
}

impl SharedLedger {
    pub fn new(ledger: Ledger) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ledger)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Ledger> {
        // Operations commit all-or-nothing, so a panicked holder cannot have
        // left half-written state behind.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run one or more operations under the lock.
    pub fn transact<T>(&self, f: impl FnOnce(&mut Ledger) -> T) -> T {
        f(&mut self.lock())
    }

    /// Read-only access under the lock.
    pub fn read<T>(&self, f: impl FnOnce(&Ledger) -> T) -> T {
        f(&self.lock())
    }

    /// Take the ledger back if this is the last handle.
    pub fn try_into_inner(self) -> Result<Ledger, Self> {
        match Arc::try_unwrap(self.inner) {
            Ok(mutex) => Ok(mutex.into_inner().unwrap_or_else(PoisonError::into_inner)),
            Err(inner) => Err(Self { inner }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GovernanceError;
    use crate::identity::Address;
    use std::thread;

    #[test]
    fn test_concurrent_joins_all_counted_once() {
        let shared = SharedLedger::default();
        let creator = Address::from_label("creator");
        let (forum_id, registry_id) = shared.transact(|l| {
            let forum_id = l.create_forum(creator, "Alpha", "", b"pw", 0).unwrap();
            let registry_id = l.init_member_registry(creator, forum_id, 0).unwrap();
            (forum_id, registry_id)
        });

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let shared = shared.clone();
                thread::spawn(move || {
                    let who = Address::from_label(&format!("member-{}", i % 4));
                    shared.transact(|l| l.join_forum(who, forum_id, registry_id, b"pw", 1))
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let ok = results.iter().filter(|r| r.is_ok()).count();
        let dup = results
            .iter()
            .filter(|r| **r == Err(GovernanceError::AlreadyMember))
            .count();

        assert_eq!(ok, 4);
        assert_eq!(dup, 4);
        assert_eq!(
            shared.read(|l| l.forum(forum_id).unwrap().member_count()),
            4
        );
    }

    #[test]
    fn test_try_into_inner_requires_last_handle() {
        let shared = SharedLedger::default();
        let other = shared.clone();

        let shared = shared.try_into_inner().unwrap_err();
        drop(other);
        assert!(shared.try_into_inner().is_ok());
    }
}
