//! Replay engine.
//!
//! Retraction never subtracts a patch's effect. It rebuilds state from the
//! savepoint forward, skipping the retracted transaction's entries, so the
//! result is correct whatever the number of pending transactions, their
//! resolution order, or whether their patches commute.

use super::entries::LogEntry;
use super::savepoint::Savepoint;
use crate::state::apply_patch;
use crate::types::{Snapshot, TransactionId};

/// Result of retracting one transaction from the log.
#[derive(Debug)]
pub struct ReplayOutcome {
    /// Recomputed committed state.
    pub state: Snapshot,

    /// New replay base (None = nothing pending any more).
    pub savepoint: Option<Savepoint>,

    /// Entries to keep, in original order.
    pub retained: Vec<LogEntry>,

    /// Number of entries discarded for the retracted transaction.
    pub dropped: usize,
}

/// Fold every entry onto `base`, in order.
pub fn replay<'a, I>(base: &Snapshot, entries: I) -> Snapshot
where
    I: IntoIterator<Item = &'a LogEntry>,
{
    entries
        .into_iter()
        .fold(base.clone(), |state, entry| apply_patch(&state, &entry.patch))
}

/// Rebuild state from `base` through `entries`, dropping every entry tagged
/// with `transaction`.
///
/// The first surviving tagged entry becomes the new savepoint anchor; it and
/// everything after it (tagged or not) is retained for future retractions.
/// Untagged entries ahead of the anchor are folded into the new base and
/// forgotten.
pub fn retract(base: &Snapshot, entries: &[LogEntry], transaction: TransactionId) -> ReplayOutcome {
    let mut state = base.clone();
    let mut savepoint: Option<Savepoint> = None;
    let mut retained = Vec::new();
    let mut dropped = 0;

    for entry in entries {
        if entry.belongs_to(transaction) {
            dropped += 1;
            continue;
        }

        if let (Some(anchor), None) = (entry.transaction, &savepoint) {
            savepoint = Some(Savepoint {
                snapshot: state.clone(),
                anchor,
            });
        }

        if savepoint.is_some() {
            retained.push(entry.clone());
        }

        state = apply_patch(&state, &entry.patch);
    }

    ReplayOutcome {
        state,
        savepoint,
        retained,
        dropped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Patch;
    use crate::types::{Fields, Revision};
    use serde_json::json;

    fn push(item: &'static str) -> Patch {
        Patch::computed(move |s| {
            let mut items = s
                .get("items")
                .and_then(|v| v.as_array())
                .cloned()
                .unwrap_or_default();
            items.push(json!(item));
            let mut fields = Fields::new();
            fields.insert("items".into(), json!(items));
            fields
        })
    }

    fn entry(patch: Patch, txn: Option<u64>) -> LogEntry {
        LogEntry::new(patch, txn.map(TransactionId), Revision::default())
    }

    fn items(snapshot: &Snapshot) -> serde_json::Value {
        snapshot.get("items").cloned().unwrap_or(json!(null))
    }

    fn base() -> Snapshot {
        Snapshot::from_value(json!({"items": ["a"]})).unwrap()
    }

    #[test]
    fn test_replay_all() {
        let entries = vec![entry(push("b"), Some(1)), entry(push("c"), None)];
        let state = replay(&base(), &entries);
        assert_eq!(items(&state), json!(["a", "b", "c"]));
    }

    #[test]
    fn test_retract_only_transaction() {
        let entries = vec![entry(push("b"), Some(1))];
        let outcome = retract(&base(), &entries, TransactionId(1));

        assert_eq!(items(&outcome.state), json!(["a"]));
        assert!(outcome.savepoint.is_none());
        assert!(outcome.retained.is_empty());
        assert_eq!(outcome.dropped, 1);
    }

    #[test]
    fn test_retract_moves_anchor() {
        // T1 b, untagged x, T2 c, untagged y
        let entries = vec![
            entry(push("b"), Some(1)),
            entry(push("x"), None),
            entry(push("c"), Some(2)),
            entry(push("y"), None),
        ];
        let outcome = retract(&base(), &entries, TransactionId(1));

        assert_eq!(items(&outcome.state), json!(["a", "x", "c", "y"]));

        let savepoint = outcome.savepoint.unwrap();
        assert_eq!(savepoint.anchor, TransactionId(2));
        assert_eq!(items(&savepoint.snapshot), json!(["a", "x"]));

        // Leading untagged entry folded into the new base
        assert_eq!(outcome.retained.len(), 2);
        assert_eq!(outcome.retained[0].transaction, Some(TransactionId(2)));
        assert_eq!(outcome.retained[1].transaction, None);

        // Replaying the survivors reproduces the state
        assert_eq!(replay(&savepoint.snapshot, &outcome.retained), outcome.state);
    }

    #[test]
    fn test_retract_drops_every_entry_of_transaction() {
        let entries = vec![
            entry(push("b"), Some(1)),
            entry(push("c"), Some(2)),
            entry(push("d"), Some(1)),
        ];
        let outcome = retract(&base(), &entries, TransactionId(1));

        assert_eq!(items(&outcome.state), json!(["a", "c"]));
        assert_eq!(outcome.dropped, 2);
        assert_eq!(outcome.retained.len(), 1);
    }

    #[test]
    fn test_retract_unknown_is_plain_replay() {
        let entries = vec![entry(push("b"), Some(1)), entry(push("c"), None)];
        let outcome = retract(&base(), &entries, TransactionId(9));

        assert_eq!(outcome.state, replay(&base(), &entries));
        assert_eq!(outcome.dropped, 0);
        assert_eq!(outcome.retained.len(), 2);
        assert_eq!(outcome.savepoint.unwrap().snapshot, base());
    }
}
