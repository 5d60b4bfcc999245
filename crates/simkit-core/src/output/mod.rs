//! Output Module
//!
//! Snapshot projection and tick deltas.

pub mod diff;
pub mod snapshot;

pub use diff::compute_deltas;
pub use snapshot::{active_intents, build_snapshot};
