//! Tick Trace Types
//!
//! What happened during a tick: proposals, validations, applied actions,
//! applied events and before/after deltas.

use serde::{Deserialize, Serialize};

use crate::action::{ActionKind, ActionOffer, SimAction};
use crate::snapshot::SimSnapshot;

/// Which of the three validation outcomes an action received.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationOutcome {
    /// Allowed, completes this tick
    Single,
    /// Allowed, normalized into a `start_intent`
    Intent,
    /// Rejected, degraded to `wait`
    Disallowed,
}

/// Trace entry for one strict validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionValidation {
    pub action_id: String,
    pub actor_id: String,
    pub kind: ActionKind,
    pub outcome: ValidationOutcome,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reasons: Vec<String>,
    /// Kind that actually reached apply
    pub applied_kind: ActionKind,
}

/// Before/after pair for a scalar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScalarChange {
    pub before: f64,
    pub after: f64,
}

impl ScalarChange {
    pub fn delta(&self) -> f64 {
        self.after - self.before
    }
}

/// Location change of a character.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocChange {
    pub before: String,
    pub after: String,
}

/// Per-character changes over one tick. Only changed fields are present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterDelta {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stress: Option<ScalarChange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health: Option<ScalarChange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub energy: Option<ScalarChange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loc: Option<LocChange>,
    #[serde(default)]
    pub moved: bool,
}

impl CharacterDelta {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            stress: None,
            health: None,
            energy: None,
            loc: None,
            moved: false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.stress.is_none()
            && self.health.is_none()
            && self.energy.is_none()
            && self.loc.is_none()
            && !self.moved
    }
}

/// A fact that was added, removed or changed. `None` means absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactDelta {
    pub key: String,
    pub before: Option<serde_json::Value>,
    pub after: Option<serde_json::Value>,
}

/// All deltas of one tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TickDeltas {
    #[serde(default)]
    pub characters: Vec<CharacterDelta>,
    #[serde(default)]
    pub facts: Vec<FactDelta>,
}

impl TickDeltas {
    pub fn character(&self, id: &str) -> Option<&CharacterDelta> {
        self.characters.iter().find(|d| d.id == id)
    }

    pub fn fact(&self, key: &str) -> Option<&FactDelta> {
        self.facts.iter().find(|d| d.key == key)
    }
}

/// Everything the engine did during one tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimTrace {
    pub actions_proposed: Vec<ActionOffer>,
    pub actions_applied: Vec<SimAction>,
    /// Ids of events applied this tick
    pub events_applied: Vec<String>,
    pub deltas: TickDeltas,
    pub action_validations: Vec<ActionValidation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

/// Output of a single `step()`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimTickRecord {
    pub snapshot: SimSnapshot,
    pub trace: SimTrace,
}
