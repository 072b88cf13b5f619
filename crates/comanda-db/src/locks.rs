//! # Keyed Locks
//!
//! Serializes mutations per order, per table and per ingredient while
//! letting unrelated work run in parallel.
//!
//! ## Acquisition Order
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  rank 0   origin:<table id>      create_order only                      │
//! │  rank 1   order:<order id>       every order mutation                   │
//! │  rank 2   ingredient:<id>        ascending id, once deltas are known    │
//! │                                                                         │
//! │  Then, and only then, a pooled connection + BEGIN.                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every task takes locks in increasing (rank, id) order, so two tasks can
//! never wait on each other in a cycle. Waits are bounded; a timeout is a
//! `Conflict` the caller may retry.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

use crate::error::{DbError, DbResult};

/// An entity whose mutations must not interleave.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LockKey {
    Origin(String),
    Order(String),
    Ingredient(String),
}

impl fmt::Display for LockKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LockKey::Origin(id) => write!(f, "origin:{}", id),
            LockKey::Order(id) => write!(f, "order:{}", id),
            LockKey::Ingredient(id) => write!(f, "ingredient:{}", id),
        }
    }
}

/// One async mutex per live key.
#[derive(Debug, Default)]
pub struct LockRegistry {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl LockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Locks every key in (rank, id) order, waiting at most `timeout` per key.
    ///
    /// Duplicate keys are locked once. On timeout every lock taken so far is
    /// released.
    pub async fn acquire(
        self: &Arc<Self>,
        keys: impl IntoIterator<Item = LockKey>,
        timeout: Duration,
    ) -> DbResult<LockSet> {
        let mut keys: Vec<LockKey> = keys.into_iter().collect();
        keys.sort();
        keys.dedup();

        let mut set = LockSet {
            registry: Arc::clone(self),
            held: Vec::with_capacity(keys.len()),
        };

        for key in keys {
            let name = key.to_string();
            let handle = self
                .locks
                .entry(name.clone())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone();

            let guard = tokio::time::timeout(timeout, handle.lock_owned())
                .await
                .map_err(|_| DbError::conflict(format!("timed out waiting for {}", name)))?;

            set.held.push((name, guard));
        }

        debug!(count = set.held.len(), "Locks acquired");
        Ok(set)
    }

    /// Number of keys currently tracked.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

/// Guards held for the duration of one mutation.
///
/// Dropping the set releases every lock and forgets keys nobody else is
/// waiting on.
pub struct LockSet {
    registry: Arc<LockRegistry>,
    held: Vec<(String, OwnedMutexGuard<()>)>,
}

impl fmt::Debug for LockSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keys: Vec<&str> = self.held.iter().map(|(k, _)| k.as_str()).collect();
        f.debug_struct("LockSet").field("keys", &keys).finish()
    }
}

impl Drop for LockSet {
    fn drop(&mut self) {
        for (name, guard) in self.held.drain(..) {
            drop(guard);
            // Only the map's own handle left: nobody holds or waits on it.
            self.registry
                .locks
                .remove_if(&name, |_, handle| Arc::strong_count(handle) == 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WAIT: Duration = Duration::from_millis(200);

    #[tokio::test]
    async fn test_same_key_is_exclusive() {
        let registry = Arc::new(LockRegistry::new());

        let held = registry
            .acquire([LockKey::Order("o-1".into())], WAIT)
            .await
            .unwrap();

        let err = registry
            .acquire([LockKey::Order("o-1".into())], Duration::from_millis(20))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Conflict(_)));

        drop(held);
        assert!(registry
            .acquire([LockKey::Order("o-1".into())], WAIT)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_unrelated_keys_do_not_block() {
        let registry = Arc::new(LockRegistry::new());

        let _a = registry
            .acquire([LockKey::Ingredient("cheese".into())], WAIT)
            .await
            .unwrap();
        let b = registry
            .acquire([LockKey::Ingredient("dough".into())], WAIT)
            .await;
        assert!(b.is_ok());
    }

    #[tokio::test]
    async fn test_released_keys_are_forgotten() {
        let registry = Arc::new(LockRegistry::new());

        let set = registry
            .acquire(
                [
                    LockKey::Ingredient("b".into()),
                    LockKey::Order("o".into()),
                    LockKey::Ingredient("a".into()),
                    LockKey::Ingredient("a".into()),
                ],
                WAIT,
            )
            .await
            .unwrap();
        assert_eq!(registry.len(), 3);

        drop(set);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_key_ordering() {
        let mut keys = vec![
            LockKey::Ingredient("a".into()),
            LockKey::Order("z".into()),
            LockKey::Origin("T1".into()),
        ];
        keys.sort();
        assert_eq!(keys[0].to_string(), "origin:T1");
        assert_eq!(keys[1].to_string(), "order:z");
        assert_eq!(keys[2].to_string(), "ingredient:a");
    }
}
