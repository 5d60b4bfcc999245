//! Event Types
//!
//! Typed records emitted by action application and drained once per tick.

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

use crate::action::{ActionKind, SimAction, Volume};
use crate::atom::Atom;

/// Generates an event id unique within a session.
pub fn generate_event_id(tick: u64, sequence: u64) -> String {
    format!("evt:{:06}:{:04}", tick, sequence)
}

/// A simulation event.
///
/// Serialized with a top-level `type` holding the full wire type
/// (`action:attack`, `speech:v1`, ...) so readers can filter without
/// decoding the payload. The field is derived from the payload and ignored
/// when parsing.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SimEvent {
    pub id: String,
    pub tick: u64,
    pub payload: EventPayload,
}

impl Serialize for SimEvent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("SimEvent", 4)?;
        state.serialize_field("id", &self.id)?;
        state.serialize_field("tick", &self.tick)?;
        state.serialize_field("type", &self.type_name())?;
        state.serialize_field("payload", &self.payload)?;
        state.end()
    }
}

/// Event bodies, tagged by their wire type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EventPayload {
    /// `action:<kind>`
    #[serde(rename = "action")]
    Action(ActionEvent),
    /// `action:intent_complete`
    #[serde(rename = "action:intent_complete")]
    IntentComplete(IntentCompleteEvent),
    /// `speech:v1`
    #[serde(rename = "speech:v1")]
    Speech(SpeechEvent),
    /// `hazardPulse`
    #[serde(rename = "hazardPulse")]
    HazardPulse(HazardPulseEvent),
}

/// Record of an applied action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionEvent {
    pub kind: ActionKind,
    pub action_id: String,
    pub actor_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_id: Option<String>,
    pub loc_id: String,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub details: serde_json::Value,
}

/// A committed multi-tick action finished.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentCompleteEvent {
    pub intent_id: String,
    pub actor_id: String,
    pub loc_id: String,
    pub original: SimAction,
}

/// An utterance waiting to be delivered to listeners.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeechEvent {
    pub speaker_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_id: Option<String>,
    pub loc_id: String,
    #[serde(default)]
    pub volume: Volume,
    #[serde(default)]
    pub atoms: Vec<Atom>,
}

/// A burst of danger inside a location, optionally bounded to a circle.
///
/// All fields except the location are optional so that adapters can inject
/// partial pulses; missing values fall back to harmless defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HazardPulseEvent {
    pub loc_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,
    #[serde(default)]
    pub damage: f64,
    #[serde(default)]
    pub stress: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl SimEvent {
    pub fn new(id: impl Into<String>, tick: u64, payload: EventPayload) -> Self {
        Self {
            id: id.into(),
            tick,
            payload,
        }
    }

    /// Wire type name, e.g. `action:attack` or `speech:v1`.
    pub fn type_name(&self) -> String {
        match &self.payload {
            EventPayload::Action(ev) => format!("action:{}", ev.kind),
            EventPayload::IntentComplete(_) => "action:intent_complete".to_string(),
            EventPayload::Speech(_) => "speech:v1".to_string(),
            EventPayload::HazardPulse(_) => "hazardPulse".to_string(),
        }
    }

    /// The character that caused the event, if any.
    pub fn actor_id(&self) -> Option<&str> {
        match &self.payload {
            EventPayload::Action(ev) => Some(&ev.actor_id),
            EventPayload::IntentComplete(ev) => Some(&ev.actor_id),
            EventPayload::Speech(ev) => Some(&ev.speaker_id),
            EventPayload::HazardPulse(_) => None,
        }
    }

    /// Location the event happened in.
    pub fn loc_id(&self) -> &str {
        match &self.payload {
            EventPayload::Action(ev) => &ev.loc_id,
            EventPayload::IntentComplete(ev) => &ev.loc_id,
            EventPayload::Speech(ev) => &ev.loc_id,
            EventPayload::HazardPulse(ev) => &ev.loc_id,
        }
    }

    /// Serializes the event to a single JSONL line.
    pub fn to_jsonl(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parses an event from a JSONL line.
    pub fn from_jsonl(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }
}
