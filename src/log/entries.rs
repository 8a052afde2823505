//! Append-only store of logged patches.

use crate::state::Patch;
use crate::types::{Revision, TransactionId};

/// A patch recorded while some transaction was pending.
#[derive(Clone, Debug)]
pub struct LogEntry {
    /// The patch as supplied by the caller.
    pub patch: Patch,

    /// Transaction the patch belongs to (None = unconditional).
    pub transaction: Option<TransactionId>,

    /// Revision the original apply produced.
    pub revision: Revision,
}

impl LogEntry {
    pub fn new(patch: Patch, transaction: Option<TransactionId>, revision: Revision) -> Self {
        Self {
            patch,
            transaction,
            revision,
        }
    }

    /// True if the entry is tagged with `transaction`.
    pub fn belongs_to(&self, transaction: TransactionId) -> bool {
        self.transaction == Some(transaction)
    }
}

/// Ordered entries appended since the current savepoint.
///
/// Entries are only ever appended or replaced wholesale with a retained
/// subsequence; they are never reordered.
#[derive(Debug, Default)]
pub struct LogStore {
    entries: Vec<LogEntry>,
}

impl LogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry at the tail.
    pub fn append(&mut self, entry: LogEntry) {
        self.entries.push(entry);
    }

    /// Replace the whole log with the survivors of a replay.
    pub fn replace(&mut self, retained: Vec<LogEntry>) {
        self.entries = retained;
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True if any entry is tagged with `transaction`.
    pub fn contains(&self, transaction: TransactionId) -> bool {
        self.entries.iter().any(|e| e.belongs_to(transaction))
    }

    /// Distinct transactions still logged, in order of first appearance.
    pub fn pending_transactions(&self) -> Vec<TransactionId> {
        let mut pending: Vec<TransactionId> = Vec::new();
        for txn in self.entries.iter().filter_map(|e| e.transaction) {
            if !pending.contains(&txn) {
                pending.push(txn);
            }
        }
        pending
    }
}
