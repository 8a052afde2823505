//! Patches: the unit of change recorded in the log.

use crate::types::{Fields, Snapshot};
use std::fmt;
use std::sync::Arc;

/// Function form of a patch, evaluated against the snapshot it is applied to.
pub type PatchFn = dyn Fn(&Snapshot) -> Fields + Send + Sync;

/// A change to merge onto the committed state.
///
/// While a transaction is pending only [`Patch::Computed`] is accepted:
/// any logged patch may be replayed against a different base later, so it
/// must derive its fields from whatever snapshot it is handed.
#[derive(Clone)]
pub enum Patch {
    /// Fields computed up front, merged as-is.
    Literal(Fields),

    /// Fields derived from the current snapshot at apply or replay time.
    Computed(Arc<PatchFn>),
}

impl Patch {
    /// Literal patch from a set of fields.
    pub fn literal(fields: Fields) -> Self {
        Patch::Literal(fields)
    }

    /// Literal patch setting a single field.
    pub fn set(key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        let mut fields = Fields::new();
        fields.insert(key.into(), value.into());
        Patch::literal(fields)
    }

    /// Computed patch from a closure.
    pub fn computed<F>(f: F) -> Self
    where
        F: Fn(&Snapshot) -> Fields + Send + Sync + 'static,
    {
        Patch::Computed(Arc::new(f))
    }

    pub fn is_computed(&self) -> bool {
        matches!(self, Patch::Computed(_))
    }

    /// Produce the partial this patch contributes on top of `base`.
    pub fn evaluate(&self, base: &Snapshot) -> Fields {
        match self {
            Patch::Literal(fields) => fields.clone(),
            Patch::Computed(f) => f(base),
        }
    }
}

impl fmt::Debug for Patch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Patch::Literal(fields) => f.debug_tuple("Literal").field(fields).finish(),
            Patch::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_literal_ignores_base() {
        let patch = Patch::set("delay", 5);
        let base = Snapshot::from_value(json!({"delay": 10})).unwrap();

        let fields = patch.evaluate(&base);
        assert_eq!(fields["delay"], 5);
        assert!(!patch.is_computed());
    }

    #[test]
    fn test_literal_from_fields() {
        let mut fields = Fields::new();
        fields.insert("items".into(), json!(["a"]));
        fields.insert("delay".into(), json!(1));
        let patch = Patch::literal(fields.clone());

        assert_eq!(patch.evaluate(&Snapshot::new()), fields);
    }

    #[test]
    fn test_computed_reads_base() {
        let patch = Patch::computed(|s| {
            let mut fields = Fields::new();
            let count = s.get("count").and_then(|v| v.as_i64()).unwrap_or(0);
            fields.insert("count".into(), json!(count + 1));
            fields
        });

        let base = Snapshot::from_value(json!({"count": 41})).unwrap();
        assert_eq!(patch.evaluate(&base)["count"], 42);
        assert!(patch.is_computed());
        assert_eq!(format!("{:?}", patch), "Computed(..)");
    }
}
