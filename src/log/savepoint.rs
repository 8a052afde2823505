//! Savepoint tracking.

use crate::types::{Snapshot, TransactionId};

/// Committed state captured right before the earliest pending transaction.
#[derive(Clone, Debug, PartialEq)]
pub struct Savepoint {
    /// Replay base.
    pub snapshot: Snapshot,

    /// Transaction whose first entry follows this snapshot.
    pub anchor: TransactionId,
}

/// Holds the current savepoint, if any transaction is pending.
#[derive(Debug, Default)]
pub struct SavepointTracker {
    current: Option<Savepoint>,
}

impl SavepointTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<&Savepoint> {
        self.current.as_ref()
    }

    pub fn is_set(&self) -> bool {
        self.current.is_some()
    }

    /// Capture `snapshot` as the replay base unless one is already set.
    ///
    /// Returns true if a new savepoint was taken.
    pub fn capture(&mut self, snapshot: &Snapshot, anchor: TransactionId) -> bool {
        if self.current.is_some() {
            return false;
        }
        self.current = Some(Savepoint {
            snapshot: snapshot.clone(),
            anchor,
        });
        true
    }

    /// Swap in the savepoint computed by a replay.
    pub fn replace(&mut self, savepoint: Option<Savepoint>) {
        self.current = savepoint;
    }
}
