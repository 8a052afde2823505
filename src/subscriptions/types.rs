//! Subscription types for committed-state notifications.

use crate::types::{Revision, Snapshot, TransactionId};
use serde::{Deserialize, Serialize};

/// Configuration for a subscription.
#[derive(Clone, Debug)]
pub struct SubscriptionConfig {
    /// Max buffered events before dropping subscriber.
    /// Default: 1024
    ///
    /// Overflow ends the stream. The `Dropped` notice usually cannot fit in
    /// the full buffer, so the receiver sees the buffered events and then
    /// `Disconnected`.
    pub buffer_size: usize,

    /// Send the current committed state as the first event.
    pub include_current: bool,
}

impl Default for SubscriptionConfig {
    fn default() -> Self {
        Self {
            buffer_size: 1024,
            include_current: false,
        }
    }
}

/// What produced a commit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CommitCause {
    /// A caller-supplied patch.
    Apply {
        transaction: Option<TransactionId>,
    },

    /// A transaction's entries were retracted and state recomputed.
    Resolve {
        transaction: TransactionId,
        dropped: usize,
    },
}

/// Events emitted by subscriptions.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StateEvent {
    /// Committed state at subscribe time.
    Current { revision: Revision, state: Snapshot },

    /// A new committed state.
    Committed {
        revision: Revision,
        cause: CommitCause,
        state: Snapshot,
    },

    /// Subscription was dropped.
    Dropped { reason: DropReason },
}

impl StateEvent {
    /// The snapshot carried by this event, if any.
    pub fn state(&self) -> Option<&Snapshot> {
        match self {
            StateEvent::Current { state, .. } | StateEvent::Committed { state, .. } => Some(state),
            StateEvent::Dropped { .. } => None,
        }
    }
}

/// Why a subscription was dropped.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    /// Send buffer overflowed (slow consumer).
    BufferOverflow,
    /// Receiver went away.
    Disconnected,
    /// Explicitly unsubscribed.
    Unsubscribed,
}

/// Unique identifier for a subscription.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// Handle to manage a subscription.
pub struct SubscriptionHandle {
    pub id: SubscriptionId,
    /// Channel to receive events.
    pub receiver: crossbeam_channel::Receiver<StateEvent>,
}

impl SubscriptionHandle {
    /// Receive the next event (blocking).
    pub fn recv(&self) -> Result<StateEvent, crossbeam_channel::RecvError> {
        self.receiver.recv()
    }

    /// Try to receive an event (non-blocking).
    pub fn try_recv(&self) -> Result<StateEvent, crossbeam_channel::TryRecvError> {
        self.receiver.try_recv()
    }

    /// Receive with timeout.
    pub fn recv_timeout(
        &self,
        timeout: std::time::Duration,
    ) -> Result<StateEvent, crossbeam_channel::RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }

    /// Drain everything buffered right now.
    pub fn drain(&self) -> Vec<StateEvent> {
        self.receiver.try_iter().collect()
    }
}
