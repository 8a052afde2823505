//! Main store tying the log, savepoint, and subscriptions together.

use crate::error::{LogError, Result};
use crate::log::{replay, retract, LogEntry, LogStore, SavepointTracker};
use crate::state::{apply_patch, Patch};
use crate::subscriptions::{
    CommitCause, SubscriptionConfig, SubscriptionHandle, SubscriptionId, SubscriptionManager,
};
use crate::types::{LogStats, Revision, Snapshot, TransactionId};
use parking_lot::Mutex;
use tracing::{debug, trace, warn};

/// Store configuration.
#[derive(Clone, Debug, Default)]
pub struct StoreConfig {
    /// Committed state before any apply.
    pub initial_state: Snapshot,

    /// Used by [`OptimisticStore::subscribe_default`].
    pub subscription: SubscriptionConfig,
}

/// Outcome of a [`OptimisticStore::resolve`] call.
#[derive(Clone, Debug)]
pub struct ResolveSummary {
    pub transaction: TransactionId,
    /// Entries discarded for the transaction.
    pub dropped: usize,
    /// Entries left in the log.
    pub retained: usize,
    /// Transactions still awaiting resolution.
    pub still_pending: usize,
    /// Recomputed committed state.
    pub state: Snapshot,
}

/// Everything guarded by the write lock.
struct Inner {
    committed: Snapshot,
    revision: Revision,
    log: LogStore,
    savepoint: SavepointTracker,
}

/// State owner supporting optimistic updates and per-transaction retraction.
///
/// - `apply` merges a patch immediately; tagged patches start (or join)
///   speculation and are logged from the savepoint onward
/// - `resolve` discards one transaction's patches and replays the rest
/// - every commit is broadcast to subscribers in call order
///
/// Calls are serialized by an internal lock, which is held while patches
/// run. A patch must not call back into the store that is applying it.
pub struct OptimisticStore {
    /// Store configuration.
    config: StoreConfig,

    /// Committed state, log, and savepoint.
    inner: Mutex<Inner>,

    /// Subscription manager.
    subscriptions: SubscriptionManager,
}

impl OptimisticStore {
    /// Create a store from a config.
    pub fn new(config: StoreConfig) -> Self {
        let inner = Inner {
            committed: config.initial_state.clone(),
            revision: Revision::default(),
            log: LogStore::new(),
            savepoint: SavepointTracker::new(),
        };

        Self {
            config,
            inner: Mutex::new(inner),
            subscriptions: SubscriptionManager::new(),
        }
    }

    /// Create a store starting from `initial_state` with default settings.
    pub fn with_state(initial_state: Snapshot) -> Self {
        Self::new(StoreConfig {
            initial_state,
            ..Default::default()
        })
    }

    // --- Mutations ---

    /// Apply a patch, optionally as part of `transaction`.
    ///
    /// The result is committed and broadcast immediately. While any
    /// transaction is pending only computed patches are accepted; a literal
    /// patch fails with [`LogError::InvalidPatchForm`] and changes nothing.
    pub fn apply(&self, patch: Patch, transaction: Option<TransactionId>) -> Result<Snapshot> {
        let mut inner = self.inner.lock();

        if inner.savepoint.is_set() && !patch.is_computed() {
            let pending = inner.log.pending_transactions().len();
            warn!(pending, "rejecting literal patch while transactions are pending");
            return Err(LogError::InvalidPatchForm { pending });
        }

        // Run the patch before touching the savepoint or log, so a panicking
        // patch leaves the store as it was.
        let next = apply_patch(&inner.committed, &patch);

        if let Some(txn) = transaction {
            let committed = inner.committed.clone();
            if inner.savepoint.capture(&committed, txn) {
                debug!(transaction = %txn, "savepoint captured");
            }
        }

        let revision = inner.revision.next();

        if inner.savepoint.is_set() {
            trace!(?transaction, ?revision, "logging entry");
            inner.log.append(LogEntry::new(patch, transaction, revision));
        }

        inner.committed = next.clone();
        inner.revision = revision;

        self.subscriptions
            .broadcast_commit(revision, CommitCause::Apply { transaction }, &next);

        Ok(next)
    }

    /// Apply an unconditional patch.
    pub fn commit(&self, patch: Patch) -> Result<Snapshot> {
        self.apply(patch, None)
    }

    /// Apply a patch as part of `transaction`.
    pub fn speculate(&self, patch: Patch, transaction: TransactionId) -> Result<Snapshot> {
        self.apply(patch, Some(transaction))
    }

    /// Discard every logged patch of `transaction` and recompute the
    /// committed state from the savepoint.
    ///
    /// Unknown transactions are not an error: the log is replayed with
    /// nothing removed, and the savepoint is cleared if nothing else is
    /// pending. Callers that know the authoritative outcome should follow up
    /// with an untagged apply.
    pub fn resolve(&self, transaction: TransactionId) -> ResolveSummary {
        let mut inner = self.inner.lock();

        let base = match inner.savepoint.get() {
            Some(savepoint) => savepoint.snapshot.clone(),
            None => inner.committed.clone(),
        };
        let outcome = retract(&base, inner.log.entries(), transaction);

        let revision = inner.revision.next();
        let retained = outcome.retained.len();

        inner.committed = outcome.state.clone();
        inner.revision = revision;
        inner.log.replace(outcome.retained);
        match &outcome.savepoint {
            Some(savepoint) => debug!(anchor = %savepoint.anchor, "savepoint moved"),
            None if inner.savepoint.is_set() => debug!("savepoint cleared"),
            None => {}
        }
        inner.savepoint.replace(outcome.savepoint);

        let still_pending = inner.log.pending_transactions().len();
        debug!(
            transaction = %transaction,
            dropped = outcome.dropped,
            retained,
            still_pending,
            "transaction resolved"
        );

        self.subscriptions.broadcast_commit(
            revision,
            CommitCause::Resolve {
                transaction,
                dropped: outcome.dropped,
            },
            &outcome.state,
        );

        ResolveSummary {
            transaction,
            dropped: outcome.dropped,
            retained,
            still_pending,
            state: outcome.state,
        }
    }

    // --- Observation ---

    /// Current committed state.
    pub fn state(&self) -> Snapshot {
        self.inner.lock().committed.clone()
    }

    /// Number of commits performed so far.
    pub fn revision(&self) -> Revision {
        self.inner.lock().revision
    }

    /// Replay base, present while any transaction is pending.
    pub fn savepoint(&self) -> Option<Snapshot> {
        self.inner
            .lock()
            .savepoint
            .get()
            .map(|s| s.snapshot.clone())
    }

    /// True if `transaction` still has logged patches.
    pub fn is_pending(&self, transaction: TransactionId) -> bool {
        self.inner.lock().log.contains(transaction)
    }

    /// Pending transactions in order of first logged patch.
    pub fn pending_transactions(&self) -> Vec<TransactionId> {
        self.inner.lock().log.pending_transactions()
    }

    /// Number of logged entries.
    pub fn log_len(&self) -> usize {
        self.inner.lock().log.len()
    }

    /// Check that the savepoint replayed through the log reproduces the
    /// committed state.
    pub fn verify_replay(&self) -> Result<()> {
        let inner = self.inner.lock();

        let replayed = match inner.savepoint.get() {
            Some(savepoint) => replay(&savepoint.snapshot, inner.log.entries()),
            // Nothing pending: the log must be empty and state is its own base
            None if inner.log.is_empty() => return Ok(()),
            None => replay(&inner.committed, inner.log.entries()),
        };

        if replayed != inner.committed {
            return Err(LogError::ReplayDivergence {
                expected: inner.committed.digest(),
                got: replayed.digest(),
            });
        }
        Ok(())
    }

    /// Get store statistics.
    pub fn stats(&self) -> LogStats {
        let inner = self.inner.lock();
        LogStats {
            revision: inner.revision,
            log_entries: inner.log.len(),
            pending_transactions: inner.log.pending_transactions().len(),
            has_savepoint: inner.savepoint.is_set(),
            subscriptions: self.subscriptions.subscription_count(),
        }
    }

    // --- Subscriptions ---

    /// Subscribe to committed states.
    pub fn subscribe(&self, config: SubscriptionConfig) -> SubscriptionHandle {
        // Hold the lock so no commit slips between the current state and
        // the first broadcast.
        let inner = self.inner.lock();
        self.subscriptions
            .subscribe(config, (inner.revision, inner.committed.clone()))
    }

    /// Subscribe using the store's configured defaults.
    pub fn subscribe_default(&self) -> SubscriptionHandle {
        self.subscribe(self.config.subscription.clone())
    }

    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.subscriptions.unsubscribe(id);
    }
}

impl Default for OptimisticStore {
    fn default() -> Self {
        Self::new(StoreConfig::default())
    }
}
