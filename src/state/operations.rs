//! Patch application.

use super::patch::Patch;
use crate::types::{Fields, Snapshot};

/// Shallow-merge `partial` over `base`, producing a new snapshot.
///
/// Every key in `partial` replaces the same key in `base`; other keys are
/// kept. `base` itself is never touched.
pub fn merge(base: &Snapshot, partial: Fields) -> Snapshot {
    if partial.is_empty() {
        return base.clone();
    }

    let mut fields = base.fields().clone();
    for (key, value) in partial {
        fields.insert(key, value);
    }
    Snapshot::from(fields)
}

/// Evaluate a patch against `base` and merge the result.
pub fn apply_patch(base: &Snapshot, patch: &Patch) -> Snapshot {
    merge(base, patch.evaluate(base))
}
