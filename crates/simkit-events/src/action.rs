//! Action Types
//!
//! Action kinds, unvalidated offers and concrete action instances.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::atom::Atom;

/// Every action kind the engine knows about.
///
/// The set is closed: each kind implements enumerate, both validation layers,
/// atomicity classification and apply in `simkit-core`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Wait,
    Rest,
    Observe,
    Move,
    MoveXy,
    Talk,
    Help,
    Attack,
    RepairFeature,
    StartIntent,
    ContinueIntent,
    AbortIntent,
}

impl ActionKind {
    /// Returns all action kinds in declaration order.
    pub fn all() -> &'static [ActionKind] {
        &[
            ActionKind::Wait,
            ActionKind::Rest,
            ActionKind::Observe,
            ActionKind::Move,
            ActionKind::MoveXy,
            ActionKind::Talk,
            ActionKind::Help,
            ActionKind::Attack,
            ActionKind::RepairFeature,
            ActionKind::StartIntent,
            ActionKind::ContinueIntent,
            ActionKind::AbortIntent,
        ]
    }

    /// Wire name, e.g. `repair_feature`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Wait => "wait",
            ActionKind::Rest => "rest",
            ActionKind::Observe => "observe",
            ActionKind::Move => "move",
            ActionKind::MoveXy => "move_xy",
            ActionKind::Talk => "talk",
            ActionKind::Help => "help",
            ActionKind::Attack => "attack",
            ActionKind::RepairFeature => "repair_feature",
            ActionKind::StartIntent => "start_intent",
            ActionKind::ContinueIntent => "continue_intent",
            ActionKind::AbortIntent => "abort_intent",
        }
    }

    /// Kinds that drive the intent state machine rather than the world.
    pub fn is_intent_control(&self) -> bool {
        matches!(
            self,
            ActionKind::StartIntent | ActionKind::ContinueIntent | ActionKind::AbortIntent
        )
    }

    /// Kinds still available to an actor with an open intent.
    pub fn allowed_during_intent(&self) -> bool {
        matches!(
            self,
            ActionKind::ContinueIntent | ActionKind::AbortIntent | ActionKind::Wait
        )
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown action kind name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown action kind: {0}")]
pub struct ParseKindError(pub String);

impl FromStr for ActionKind {
    type Err = ParseKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ActionKind::all()
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ParseKindError(s.to_string()))
    }
}

/// Loudness class of an utterance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Volume {
    Whisper,
    #[default]
    Normal,
    Shout,
}

impl fmt::Display for Volume {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Volume::Whisper => write!(f, "whisper"),
            Volume::Normal => write!(f, "normal"),
            Volume::Shout => write!(f, "shout"),
        }
    }
}

/// Kind-specific action data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionPayload {
    /// Free step inside the current location (used by `move_xy` without a nav node).
    Step { x: f64, y: f64 },
    /// What a `talk` action says and how loudly.
    Speech {
        #[serde(default)]
        volume: Volume,
        #[serde(default)]
        atoms: Vec<Atom>,
    },
    /// The wrapped action of a `start_intent`.
    Intent {
        original: Box<SimAction>,
        intent_ticks: u32,
    },
}

/// A concrete action chosen for execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimAction {
    pub id: String,
    pub kind: ActionKind,
    pub actor_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<ActionPayload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<serde_json::Value>,
}

/// Builds the deterministic id used for engine-generated actions.
pub fn generate_action_id(tick: u64, actor_id: &str, kind: ActionKind) -> String {
    format!("act:{:06}:{}:{}", tick, actor_id, kind)
}

impl SimAction {
    pub fn new(id: impl Into<String>, kind: ActionKind, actor_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            actor_id: actor_id.into(),
            target_id: None,
            payload: None,
            meta: None,
        }
    }

    /// The safe fallback every failed validation degrades to.
    pub fn wait(tick: u64, actor_id: impl Into<String>) -> Self {
        let actor_id = actor_id.into();
        Self::new(
            generate_action_id(tick, &actor_id, ActionKind::Wait),
            ActionKind::Wait,
            actor_id,
        )
    }

    pub fn with_target(mut self, target_id: impl Into<String>) -> Self {
        self.target_id = Some(target_id.into());
        self
    }

    pub fn with_payload(mut self, payload: ActionPayload) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn with_meta(mut self, meta: serde_json::Value) -> Self {
        self.meta = Some(meta);
        self
    }

    /// Speech payload if this action carries one.
    pub fn speech(&self) -> Option<(Volume, &[Atom])> {
        match &self.payload {
            Some(ActionPayload::Speech { volume, atoms }) => Some((*volume, atoms.as_slice())),
            _ => None,
        }
    }

    /// Wrapped original action of a `start_intent`.
    pub fn intent_original(&self) -> Option<(&SimAction, u32)> {
        match &self.payload {
            Some(ActionPayload::Intent {
                original,
                intent_ticks,
            }) => Some((original.as_ref(), *intent_ticks)),
            _ => None,
        }
    }
}

/// An unvalidated candidate action with a heuristic score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionOffer {
    pub kind: ActionKind,
    pub actor_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_id: Option<String>,
    pub score: f64,
    #[serde(default)]
    pub blocked: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ActionOffer {
    pub fn new(kind: ActionKind, actor_id: impl Into<String>, score: f64) -> Self {
        Self {
            kind,
            actor_id: actor_id.into(),
            target_id: None,
            score,
            blocked: false,
            reason: None,
        }
    }

    pub fn with_target(mut self, target_id: impl Into<String>) -> Self {
        self.target_id = Some(target_id.into());
        self
    }

    /// Marks the offer as blocked, keeping the first reason recorded.
    pub fn block(&mut self, reason: impl Into<String>) {
        if !self.blocked {
            self.blocked = true;
            self.reason = Some(reason.into());
        }
    }

    /// Total order used for offer lists: score descending, then actor id,
    /// target id and kind name ascending.
    pub fn rank_cmp(&self, other: &Self) -> Ordering {
        other
            .score
            .total_cmp(&self.score)
            .then_with(|| self.actor_id.cmp(&other.actor_id))
            .then_with(|| self.target_id.cmp(&other.target_id))
            .then_with(|| self.kind.as_str().cmp(other.kind.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names_round_trip() {
        for kind in ActionKind::all() {
            assert_eq!(kind.as_str().parse::<ActionKind>().unwrap(), *kind);
            let json = serde_json::to_string(kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
    }

    #[test]
    fn test_unknown_kind_is_an_error() {
        let err = "teleport".parse::<ActionKind>().unwrap_err();
        assert_eq!(err, ParseKindError("teleport".to_string()));
        assert!(serde_json::from_str::<ActionKind>("\"teleport\"").is_err());
    }

    #[test]
    fn test_offer_rank_is_total() {
        let a = ActionOffer::new(ActionKind::Talk, "b", 0.5).with_target("x");
        let b = ActionOffer::new(ActionKind::Attack, "a", 0.5).with_target("x");
        let c = ActionOffer::new(ActionKind::Wait, "z", 0.9);
        let d = ActionOffer::new(ActionKind::Attack, "b", 0.5).with_target("x");

        let mut offers = vec![a.clone(), b.clone(), c.clone(), d.clone()];
        offers.sort_by(|x, y| x.rank_cmp(y));

        assert_eq!(offers, vec![c, b, d, a]);
    }

    #[test]
    fn test_block_keeps_first_reason() {
        let mut offer = ActionOffer::new(ActionKind::Attack, "a", 0.4);
        offer.block("out_of_range");
        offer.block("norm:no_violence");
        assert!(offer.blocked);
        assert_eq!(offer.reason.as_deref(), Some("out_of_range"));
    }

    #[test]
    fn test_intent_payload_access() {
        let original = SimAction::new("act:1", ActionKind::RepairFeature, "ada").with_target("well");
        let wrapped = SimAction::new("act:2", ActionKind::StartIntent, "ada").with_payload(
            ActionPayload::Intent {
                original: Box::new(original.clone()),
                intent_ticks: 3,
            },
        );

        let (inner, ticks) = wrapped.intent_original().unwrap();
        assert_eq!(inner, &original);
        assert_eq!(ticks, 3);
        assert!(original.intent_original().is_none());
    }
}
