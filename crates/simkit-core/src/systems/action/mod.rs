//! Action Systems
//!
//! Offer generation, selection, strict validation and execution.

pub mod execute;
pub mod generate;
pub mod select;
pub mod validate;

pub use execute::{execute_actions, ExecutionReport};
pub use generate::{enumerate_action_offers, INTENT_KINDS};
pub use select::{greedy_actions, select_actions, DecisionSource, SelectedActions};
pub use validate::{validate_action_strict, ValidationResult};
