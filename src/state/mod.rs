//! Patches and how they are applied to snapshots.

mod operations;
mod patch;

pub use operations::{apply_patch, merge};
pub use patch::{Patch, PatchFn};
