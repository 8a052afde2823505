//! Subscription system for committed-state notifications.
//!
//! Every successful `apply` and every `resolve` produces exactly one
//! [`StateEvent::Committed`], delivered in call order. Subscribers:
//! - receive events over bounded channels, never via inline callbacks
//! - may ask for the current state as their first event
//! - are dropped when their buffer overflows or their receiver goes away
//!
//! # Example
//!
//! ```ignore
//! let store = OptimisticStore::with_state(Snapshot::from_value(json!({"items": []}))?);
//! let handle = store.subscribe(SubscriptionConfig::default());
//!
//! store.commit(Patch::set("items", json!(["a"])))?;
//!
//! match handle.recv() {
//!     Ok(StateEvent::Committed { state, .. }) => render(&state),
//!     Ok(StateEvent::Dropped { reason }) => eprintln!("dropped: {:?}", reason),
//!     _ => {}
//! }
//! ```

mod manager;
mod types;

pub use manager::SubscriptionManager;
pub use types::{
    CommitCause, DropReason, StateEvent, SubscriptionConfig, SubscriptionHandle, SubscriptionId,
};
