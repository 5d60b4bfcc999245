//! Shared data contracts for the SimKit engine.
//!
//! This crate contains pure data structures with no simulation logic:
//! action kinds and offers, atoms, events, snapshots, tick traces and the
//! session export format. Everything here serializes with serde and is the
//! stable surface external collaborators (decision engines, viewers, replay
//! tooling) build against.

pub mod action;
pub mod atom;
pub mod event;
pub mod export;
pub mod snapshot;
pub mod trace;

pub use action::{
    generate_action_id, ActionKind, ActionOffer, ActionPayload, ParseKindError, SimAction, Volume,
};
pub use atom::{Admission, Atom, AtomOrigin};
pub use event::{
    generate_event_id, ActionEvent, EventPayload, HazardPulseEvent, IntentCompleteEvent,
    SimEvent, SpeechEvent,
};
pub use export::{ExportError, SimExport, EXPORT_SCHEMA};
pub use snapshot::{
    generate_snapshot_id, CharacterSnapshot, FeatureSnapshot, LocationSnapshot, PosSnapshot,
    SimSnapshot, SnapshotDebug, SNAPSHOT_SCHEMA,
};
pub use trace::{
    ActionValidation, CharacterDelta, FactDelta, LocChange, ScalarChange, SimTickRecord,
    SimTrace, TickDeltas, ValidationOutcome,
};
