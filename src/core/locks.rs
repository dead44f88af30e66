//! Per-account lock table for orchestrated operations
//!
//! The ledger already serializes each single-account mutation. The
//! orchestrator needs more: a transfer's withdraw, deposit and possible
//! compensating re-deposit must not interleave with any other orchestrated
//! operation on either account. `AccountLocks` hands out one mutex per account
//! id and always acquires a set of them in ascending id order, so two
//! transfers running in opposite directions cannot deadlock.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use dashmap::DashMap;

use crate::types::AccountId;

/// Lazily populated table of account mutexes
#[derive(Debug, Default)]
pub struct AccountLocks {
    locks: DashMap<AccountId, Arc<Mutex<()>>>,
}

/// The mutexes for a set of accounts, sorted and de-duplicated
#[derive(Debug)]
pub struct LockSet {
    handles: Vec<Arc<Mutex<()>>>,
}

impl AccountLocks {
    pub fn new() -> Self {
        AccountLocks {
            locks: DashMap::new(),
        }
    }

    fn handle(&self, id: &str) -> Arc<Mutex<()>> {
        Arc::clone(
            self.locks
                .entry(id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .value(),
        )
    }

    /// Collect the mutexes for `ids` in global (ascending id) order
    pub fn acquire(&self, ids: &[&str]) -> LockSet {
        let mut ordered: Vec<&str> = ids.to_vec();
        ordered.sort_unstable();
        ordered.dedup();

        LockSet {
            handles: ordered.into_iter().map(|id| self.handle(id)).collect(),
        }
    }
}

impl LockSet {
    /// Lock every account in the set; all are released when the guards drop
    pub fn lock(&self) -> Vec<MutexGuard<'_, ()>> {
        self.handles
            .iter()
            .map(|handle| handle.lock().unwrap_or_else(PoisonError::into_inner))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}
