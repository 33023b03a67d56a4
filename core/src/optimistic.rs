//! Speculative apply / commit / rollback over a cached value.
//!
//! The admin console rewrites its cached lists before the server has
//! answered a mutation. [`Optimistic`] keeps a snapshot of the value taken
//! right before each speculative change, keyed by a [`MutationId`]:
//!
//! ```text
//! speculate(f) ──► snapshot stored, f applied ──► MutationId
//!                                                   │
//!          ┌────────────────────────────────────────┤
//!          ▼                                        ▼
//!   commit(id): snapshot dropped        rollback(id): snapshot restored
//!          │                                        │
//!          └──────────────► invalidate() ◄──────────┘
//!                               │
//!                               ▼
//!                    reconcile(server value)
//! ```
//!
//! Whatever the outcome, the owner marks the value stale once the request
//! settles and replaces it with server truth when the refetch arrives.
//! There is no conflict detection: the last response applied wins.

use std::collections::BTreeMap;
use std::fmt;

/// Identifier of one speculative mutation
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MutationId(u64);

impl MutationId {
    /// Raw numeric value
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for MutationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mutation-{}", self.0)
    }
}

/// A cached value with per-mutation rollback snapshots
#[derive(Clone, Debug)]
pub struct Optimistic<T> {
    value: T,
    snapshots: BTreeMap<MutationId, T>,
    next_id: u64,
    stale: bool,
}

impl<T: Clone> Optimistic<T> {
    /// Wrap a value that is known to match the server
    #[must_use]
    pub const fn new(value: T) -> Self {
        Self {
            value,
            snapshots: BTreeMap::new(),
            next_id: 1,
            stale: false,
        }
    }

    /// Current (possibly speculative) value
    #[must_use]
    pub const fn value(&self) -> &T {
        &self.value
    }

    /// Snapshot the current value, then apply `change` to it
    pub fn speculate<F>(&mut self, change: F) -> MutationId
    where
        F: FnOnce(&mut T),
    {
        let id = MutationId(self.next_id);
        self.next_id += 1;
        self.snapshots.insert(id, self.value.clone());
        change(&mut self.value);
        id
    }

    /// The server accepted the mutation; forget its snapshot.
    ///
    /// Returns `false` if the id is unknown (already settled).
    pub fn commit(&mut self, id: MutationId) -> bool {
        self.snapshots.remove(&id).is_some()
    }

    /// The server rejected the mutation; restore the value it replaced.
    ///
    /// Returns `false` if the id is unknown (already settled).
    pub fn rollback(&mut self, id: MutationId) -> bool {
        match self.snapshots.remove(&id) {
            Some(snapshot) => {
                self.value = snapshot;
                true
            },
            None => false,
        }
    }

    /// Change the value without a rollback point
    ///
    /// A later rollback of an older mutation discards this change too.
    pub fn apply<F>(&mut self, change: F)
    where
        F: FnOnce(&mut T),
    {
        change(&mut self.value);
    }

    /// Mark the value as needing a refetch
    pub const fn invalidate(&mut self) {
        self.stale = true;
    }

    /// Whether a refetch has been requested and not yet applied
    #[must_use]
    pub const fn is_stale(&self) -> bool {
        self.stale
    }

    /// Replace the value with server truth
    pub fn reconcile(&mut self, server: T) {
        self.value = server;
        self.stale = false;
    }

    /// Number of mutations still waiting for a server answer
    #[must_use]
    pub fn pending(&self) -> usize {
        self.snapshots.len()
    }

    /// Whether `id` is still waiting for a server answer
    #[must_use]
    pub fn is_pending(&self, id: MutationId) -> bool {
        self.snapshots.contains_key(&id)
    }
}

impl<T: Clone + Default> Default for Optimistic<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}
