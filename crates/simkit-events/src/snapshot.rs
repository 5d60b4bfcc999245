//! Snapshot Types
//!
//! Immutable projections of the world taken at the end of each tick.
//!
//! Characters and locations are always listed in id order so that two runs
//! with the same seed serialize to identical bytes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::event::SimEvent;

/// Schema tag written into every snapshot.
pub const SNAPSHOT_SCHEMA: &str = "SimKitSnapshotV1";

/// Generates a snapshot id for the given tick.
pub fn generate_snapshot_id(tick: u64) -> String {
    format!("snap_{:06}", tick)
}

/// Resolved character position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PosSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
    pub x: f64,
    pub y: f64,
}

/// Character state at the end of a tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterSnapshot {
    pub id: String,
    pub name: String,
    pub loc_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pos: Option<PosSnapshot>,
    pub stress: f64,
    pub health: f64,
    pub energy: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// Repairable fixture state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSnapshot {
    pub id: String,
    pub integrity: f64,
}

/// Location state at the end of a tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationSnapshot {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub neighbors: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub hazards: BTreeMap<String, f64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub norms: BTreeMap<String, f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub features: Vec<FeatureSnapshot>,
    #[serde(default)]
    pub characters_present: Vec<String>,
}

/// Diagnostic extras that are not part of the world proper.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnapshotDebug {
    /// Remaining ticks of every open intent, keyed by actor id
    #[serde(default)]
    pub active_intents: BTreeMap<String, u32>,
    #[serde(default)]
    pub offer_count: usize,
    #[serde(default)]
    pub fact_count: usize,
}

/// Complete world snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimSnapshot {
    pub schema: String,
    pub id: String,
    /// Logical time in milliseconds since the session start
    pub time: u64,
    pub tick_index: u64,
    pub characters: Vec<CharacterSnapshot>,
    pub locations: Vec<LocationSnapshot>,
    pub events: Vec<SimEvent>,
    #[serde(default)]
    pub debug: SnapshotDebug,
}

impl SimSnapshot {
    /// Creates an empty snapshot for a tick.
    pub fn new(tick_index: u64, time: u64) -> Self {
        Self {
            schema: SNAPSHOT_SCHEMA.to_string(),
            id: generate_snapshot_id(tick_index),
            time,
            tick_index,
            characters: Vec::new(),
            locations: Vec::new(),
            events: Vec::new(),
            debug: SnapshotDebug::default(),
        }
    }

    /// Finds a character by ID.
    pub fn find_character(&self, id: &str) -> Option<&CharacterSnapshot> {
        self.characters.iter().find(|c| c.id == id)
    }

    /// Finds a location by ID.
    pub fn find_location(&self, id: &str) -> Option<&LocationSnapshot> {
        self.locations.iter().find(|l| l.id == id)
    }

    /// Returns the events of a given wire type, e.g. `speech:v1`.
    pub fn events_of_type(&self, type_name: &str) -> Vec<&SimEvent> {
        self.events
            .iter()
            .filter(|e| e.type_name() == type_name)
            .collect()
    }

    /// Serializes the snapshot to pretty JSON.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Serializes the snapshot to compact JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes a snapshot from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
