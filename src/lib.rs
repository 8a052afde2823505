//! # Savepoint
//!
//! Optimistic application state with per-transaction retraction.
//!
//! ## Core Concepts
//!
//! - **Patches**: Literal fields or functions of the current snapshot, shallow-merged on apply
//! - **Transactions**: Caller tokens grouping speculative patches awaiting confirmation
//! - **Savepoint**: Committed state just before the earliest pending transaction
//! - **Replay**: Retraction rebuilds state from the savepoint, skipping one transaction
//!
//! ## Example
//!
//! ```ignore
//! use savepoint::{OptimisticStore, Patch, Snapshot, TransactionId};
//!
//! let store = OptimisticStore::with_state(Snapshot::from_value(json!({"items": ["a"]}))?);
//!
//! // Show the new item right away
//! let txn = TransactionId::generate();
//! store.speculate(Patch::computed(|s| push_item(s, "b")), txn)?;
//!
//! // Later, once the server answers
//! store.resolve(txn);
//! store.commit(Patch::computed(|s| push_item(s, "b (saved)")))?;
//! ```

pub mod error;
pub mod log;
pub mod state;
pub mod store;
pub mod subscriptions;
pub mod types;

// Re-exports
pub use error::{LogError, Result};
pub use log::{LogEntry, LogStore, ReplayOutcome, Savepoint, SavepointTracker};
pub use state::{apply_patch, merge, Patch, PatchFn};
pub use store::{OptimisticStore, ResolveSummary, StoreConfig};
pub use subscriptions::{
    CommitCause, DropReason, StateEvent, SubscriptionConfig, SubscriptionHandle, SubscriptionId,
    SubscriptionManager,
};
pub use types::*;
