//! Transaction log: logged entries, the savepoint, and replay.
//!
//! While any transaction is pending every apply is appended here, tagged or
//! not, so that the savepoint plus the log always replays to the committed
//! state.

mod entries;
pub mod replay;
mod savepoint;

pub use entries::{LogEntry, LogStore};
pub use replay::{replay, retract, ReplayOutcome};
pub use savepoint::{Savepoint, SavepointTracker};
