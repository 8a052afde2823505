//! Core types for the optimistic log.

use crate::error::{LogError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use sha2::{Digest as _, Sha256};
use std::fmt;
use std::ops::Index;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// A partial snapshot: the fields a patch wants to overwrite.
pub type Fields = serde_json::Map<String, Value>;

/// Counter backing [`TransactionId::generate`].
static NEXT_TRANSACTION: AtomicU64 = AtomicU64::new(1);

/// Caller-supplied token identifying one span of speculative work.
///
/// Matching in `resolve` is by equality. Ids from [`TransactionId::generate`]
/// are unique within the process; ids built with `From<u64>` are the
/// caller's responsibility.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TransactionId(pub u64);

impl TransactionId {
    /// Allocate a fresh, process-unique transaction id.
    pub fn generate() -> Self {
        TransactionId(NEXT_TRANSACTION.fetch_add(1, Ordering::Relaxed))
    }
}

impl From<u64> for TransactionId {
    fn from(id: u64) -> Self {
        TransactionId(id)
    }
}

impl fmt::Debug for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Txn({})", self.0)
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Number of commits the store has performed (one per apply or resolve).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct Revision(pub u64);

impl fmt::Debug for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Rev({})", self.0)
    }
}

impl Revision {
    pub fn next(self) -> Self {
        Revision(self.0 + 1)
    }
}

/// SHA-256 fingerprint of a snapshot's canonical JSON encoding.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Digest(pub [u8; 32]);

impl Digest {
    /// Compute digest from bytes.
    pub fn from_bytes(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        Digest(hasher.finalize().into())
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({}...)", &self.to_hex()[..8])
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Immutable view of the full state: named fields to JSON values.
///
/// Cloning is cheap; a new snapshot is only ever produced by merging a
/// [`Fields`] partial over an existing one.
#[derive(Clone, PartialEq, Default)]
pub struct Snapshot(Arc<Fields>);

impl Snapshot {
    /// An empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a snapshot from a JSON value, which must be an object.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(fields) => Ok(Snapshot(Arc::new(fields))),
            other => Err(LogError::InvalidSnapshot(format!(
                "expected a JSON object, got {}",
                json_kind(&other)
            ))),
        }
    }

    /// Borrow a single field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Borrow all fields.
    pub fn fields(&self) -> &Fields {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Fingerprint of the snapshot contents.
    ///
    /// Map keys are sorted, so equal snapshots always hash equally.
    pub fn digest(&self) -> Digest {
        let bytes = serde_json::to_vec(self.0.as_ref()).unwrap_or_default();
        Digest::from_bytes(&bytes)
    }

    /// True if both handles point at the same allocation.
    pub fn ptr_eq(&self, other: &Snapshot) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl From<Fields> for Snapshot {
    fn from(fields: Fields) -> Self {
        Snapshot(Arc::new(fields))
    }
}

impl TryFrom<Value> for Snapshot {
    type Error = LogError;

    fn try_from(value: Value) -> Result<Self> {
        Snapshot::from_value(value)
    }
}

impl Index<&str> for Snapshot {
    type Output = Value;

    /// Missing fields read as `null`, like indexing a JSON object.
    fn index(&self, key: &str) -> &Value {
        static NULL: Value = Value::Null;
        self.0.get(key).unwrap_or(&NULL)
    }
}

impl fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.0.as_ref(), f)
    }
}

impl Serialize for Snapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.as_ref().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Snapshot {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Fields::deserialize(deserializer).map(Snapshot::from)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Log statistics.
#[derive(Clone, Debug, Default)]
pub struct LogStats {
    pub revision: Revision,
    pub log_entries: usize,
    pub pending_transactions: usize,
    pub has_savepoint: bool,
    pub subscriptions: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_generated_transactions_are_unique() {
        let a = TransactionId::generate();
        let b = TransactionId::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn test_transaction_from_u64() {
        let txn = TransactionId::from(7);
        assert_eq!(txn, TransactionId(7));
        assert_eq!(format!("{:?} {}", txn, txn), "Txn(7) 7");
    }

    #[test]
    fn test_snapshot_try_from_value() {
        let snap = Snapshot::try_from(json!({"items": []})).unwrap();
        assert_eq!(snap["items"], json!([]));
        assert_eq!(snap["missing"], Value::Null);

        let err = Snapshot::try_from(json!("text")).unwrap_err();
        assert!(err.to_string().contains("a string"));
    }

    #[test]
    fn test_snapshot_from_non_object() {
        let result = Snapshot::from_value(json!([1, 2, 3]));
        assert!(matches!(result, Err(LogError::InvalidSnapshot(_))));
    }

    #[test]
    fn test_digest_ignores_insertion_order() {
        let a = Snapshot::from_value(json!({"a": 1, "b": 2})).unwrap();

        let mut fields = Fields::new();
        fields.insert("b".into(), json!(2));
        fields.insert("a".into(), json!(1));
        let b = Snapshot::from(fields);

        assert_eq!(a.digest(), b.digest());
        assert_ne!(a.digest(), Snapshot::new().digest());
    }

    #[test]
    fn test_snapshot_serde() {
        let snap = Snapshot::from_value(json!({"items": ["a"], "delay": 10})).unwrap();
        let encoded = serde_json::to_string(&snap).unwrap();
        let decoded: Snapshot = serde_json::from_str(&encoded).unwrap();
        assert_eq!(snap, decoded);
    }

    #[test]
    fn test_revision_next() {
        assert_eq!(Revision::default().next(), Revision(1));
    }
}
