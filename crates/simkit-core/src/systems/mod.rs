//! Simulation systems, run in a fixed order by the simulator each tick.

pub mod action;
pub mod context;
pub mod memory;
pub mod perception;
pub mod trust;

pub use action::{
    enumerate_action_offers, execute_actions, select_actions, validate_action_strict,
    DecisionSource, ExecutionReport, SelectedActions, ValidationResult,
};
pub use context::update_context_facts;
pub use memory::{merge_beliefs, merge_inbox, MergeStats};
pub use perception::{drain_events, PerceptionStats};
pub use trust::{AcceptanceConfig, AcceptanceDecision};
