//! World Model
//!
//! Characters, locations, the namespaced fact store and the transient event
//! queue.
//!
//! Characters, locations and fact values sit behind [`Arc`], so cloning a
//! [`World`] shares every entry and only the maps themselves are copied.
//! Mutation goes through [`Arc::make_mut`]; an entry that was never touched
//! after a clone stays pointer-equal to its counterpart, which is what the
//! per-tick delta computation relies on.

pub mod facts;

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;
use std::sync::Arc;

use simkit_events::SimEvent;

use crate::error::{Result, SimError};

pub use facts::{FactKey, FactStore};

/// Position of a character inside its location.
///
/// Any subset of the fields may be present; see `spatial::resolve_position`
/// for the fallback order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pos {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
}

impl Pos {
    pub fn at(x: f64, y: f64) -> Self {
        Self {
            node_id: None,
            x: Some(x),
            y: Some(y),
        }
    }

    pub fn on_node(node_id: impl Into<String>) -> Self {
        Self {
            node_id: Some(node_id.into()),
            x: None,
            y: None,
        }
    }

    /// Explicit coordinates, if both are set.
    pub fn xy(&self) -> Option<(f64, f64)> {
        match (self.x, self.y) {
            (Some(x), Some(y)) => Some((x, y)),
            _ => None,
        }
    }
}

fn one() -> f64 {
    1.0
}

/// An agent in the world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Character {
    pub id: String,
    pub name: String,
    pub loc_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pos: Option<Pos>,
    #[serde(default)]
    pub stress: f64,
    #[serde(default = "one")]
    pub health: f64,
    #[serde(default = "one")]
    pub energy: f64,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub tags: BTreeSet<String>,
    /// Opaque reference to the richer entity an adapter built this from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity: Option<serde_json::Value>,
}

impl Character {
    pub fn new(id: impl Into<String>, name: impl Into<String>, loc_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            loc_id: loc_id.into(),
            pos: None,
            stress: 0.0,
            health: 1.0,
            energy: 1.0,
            tags: BTreeSet::new(),
            entity: None,
        }
    }

    pub fn with_pos(mut self, pos: Pos) -> Self {
        self.pos = Some(pos);
        self
    }

    pub fn with_scalars(mut self, stress: f64, health: f64, energy: f64) -> Self {
        self.stress = stress;
        self.health = health;
        self.energy = energy;
        self.clamp_scalars();
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    pub fn adjust_stress(&mut self, delta: f64) {
        self.stress = clamp01(self.stress + delta);
    }

    pub fn adjust_health(&mut self, delta: f64) {
        self.health = clamp01(self.health + delta);
    }

    pub fn adjust_energy(&mut self, delta: f64) {
        self.energy = clamp01(self.energy + delta);
    }

    /// Forces stress/health/energy back into `[0, 1]`.
    pub fn clamp_scalars(&mut self) {
        self.stress = clamp01(self.stress);
        self.health = clamp01(self.health);
        self.energy = clamp01(self.energy);
    }
}

/// Clamps to `[0, 1]`, mapping NaN to 0.
pub fn clamp01(v: f64) -> f64 {
    if v.is_nan() {
        0.0
    } else {
        v.clamp(0.0, 1.0)
    }
}

/// A point in a location's fine navigation graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavNode {
    pub id: String,
    pub x: f64,
    pub y: f64,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub tags: BTreeSet<String>,
}

/// Undirected walkable edge between two nav nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavEdge {
    pub a: String,
    pub b: String,
}

/// Fine navigation graph inside a location.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Nav {
    #[serde(default)]
    pub nodes: Vec<NavNode>,
    #[serde(default)]
    pub edges: Vec<NavEdge>,
}

impl Nav {
    pub fn node(&self, id: &str) -> Option<&NavNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn has_edge(&self, a: &str, b: &str) -> bool {
        self.edges
            .iter()
            .any(|e| (e.a == a && e.b == b) || (e.a == b && e.b == a))
    }

    /// Nodes joined to `id` by an edge, sorted by id.
    pub fn adjacent(&self, id: &str) -> Vec<&NavNode> {
        let mut out: Vec<&NavNode> = self
            .edges
            .iter()
            .filter_map(|e| {
                if e.a == id {
                    self.node(&e.b)
                } else if e.b == id {
                    self.node(&e.a)
                } else {
                    None
                }
            })
            .collect();
        out.sort_by(|a, b| a.id.cmp(&b.id));
        out.dedup_by(|a, b| a.id == b.id);
        out
    }
}

fn default_point_radius() -> f64 {
    50.0
}

fn default_point_strength() -> f64 {
    0.5
}

/// A declared hazard or safe spot on a location map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapPoint {
    pub x: f64,
    pub y: f64,
    #[serde(default = "default_point_radius")]
    pub radius: f64,
    #[serde(default = "default_point_strength")]
    pub strength: f64,
}

/// Map geometry of a location.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationMap {
    pub width: f64,
    pub height: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hazard_points: Vec<MapPoint>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub safe_points: Vec<MapPoint>,
}

/// A repairable fixture inside a location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub id: String,
    pub x: f64,
    pub y: f64,
    #[serde(default = "one")]
    pub integrity: f64,
}

/// A place characters can occupy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: String,
    pub name: String,
    /// Coarse location graph
    #[serde(default)]
    pub neighbors: Vec<String>,
    #[serde(default)]
    pub nav: Nav,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub hazards: BTreeMap<String, f64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub norms: BTreeMap<String, f64>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub tags: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map: Option<LocationMap>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub features: Vec<Feature>,
}

impl Location {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            neighbors: Vec::new(),
            nav: Nav::default(),
            hazards: BTreeMap::new(),
            norms: BTreeMap::new(),
            tags: BTreeSet::new(),
            map: None,
            features: Vec::new(),
        }
    }

    pub fn with_neighbor(mut self, loc_id: impl Into<String>) -> Self {
        self.neighbors.push(loc_id.into());
        self
    }

    pub fn with_norm(mut self, name: impl Into<String>, level: f64) -> Self {
        self.norms.insert(name.into(), clamp01(level));
        self
    }

    pub fn with_hazard(mut self, name: impl Into<String>, level: f64) -> Self {
        self.hazards.insert(name.into(), clamp01(level));
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    pub fn with_map(mut self, map: LocationMap) -> Self {
        self.map = Some(map);
        self
    }

    pub fn with_feature(mut self, feature: Feature) -> Self {
        self.features.push(feature);
        self
    }

    /// Norm level, 0 when the norm is not declared.
    pub fn norm(&self, name: &str) -> f64 {
        self.norms.get(name).copied().unwrap_or(0.0)
    }

    /// Hazard level, 0 when the hazard is not declared.
    pub fn hazard(&self, name: &str) -> f64 {
        self.hazards.get(name).copied().unwrap_or(0.0)
    }

    pub fn is_neighbor(&self, loc_id: &str) -> bool {
        self.neighbors.iter().any(|n| n == loc_id)
    }

    /// Centre of the map geometry, if any.
    pub fn center(&self) -> Option<(f64, f64)> {
        self.map.as_ref().map(|m| (m.width / 2.0, m.height / 2.0))
    }

    pub fn feature(&self, id: &str) -> Option<&Feature> {
        self.features.iter().find(|f| f.id == id)
    }

    pub fn feature_mut(&mut self, id: &str) -> Option<&mut Feature> {
        self.features.iter_mut().find(|f| f.id == id)
    }
}

/// The complete simulation state owned by a simulator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct World {
    pub tick_index: u64,
    pub seed: u64,
    #[serde(default)]
    pub characters: BTreeMap<String, Arc<Character>>,
    #[serde(default)]
    pub locations: BTreeMap<String, Arc<Location>>,
    #[serde(default)]
    pub facts: FactStore,
    /// Pending events, drained once per step
    #[serde(default)]
    pub events: Vec<SimEvent>,
}

impl World {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    pub fn add_location(&mut self, location: Location) {
        self.locations
            .insert(location.id.clone(), Arc::new(location));
    }

    pub fn add_character(&mut self, character: Character) {
        let mut character = character;
        character.clamp_scalars();
        self.characters
            .insert(character.id.clone(), Arc::new(character));
    }

    /// Looks up a character; an unknown id is an upstream contract violation.
    pub fn get_char(&self, id: &str) -> Result<&Character> {
        self.characters
            .get(id)
            .map(|c| c.as_ref())
            .ok_or_else(|| SimError::UnknownCharacter(id.to_string()))
    }

    /// Mutable lookup; detaches the entry from any shared clone.
    pub fn get_char_mut(&mut self, id: &str) -> Result<&mut Character> {
        self.characters
            .get_mut(id)
            .map(Arc::make_mut)
            .ok_or_else(|| SimError::UnknownCharacter(id.to_string()))
    }

    /// Looks up a location; an unknown id is an upstream contract violation.
    pub fn get_loc(&self, id: &str) -> Result<&Location> {
        self.locations
            .get(id)
            .map(|l| l.as_ref())
            .ok_or_else(|| SimError::UnknownLocation(id.to_string()))
    }

    pub fn get_loc_mut(&mut self, id: &str) -> Result<&mut Location> {
        self.locations
            .get_mut(id)
            .map(Arc::make_mut)
            .ok_or_else(|| SimError::UnknownLocation(id.to_string()))
    }

    /// Non-failing lookup for gameplay checks on optional targets.
    pub fn find_char(&self, id: &str) -> Option<&Character> {
        self.characters.get(id).map(|c| c.as_ref())
    }

    pub fn find_loc(&self, id: &str) -> Option<&Location> {
        self.locations.get(id).map(|l| l.as_ref())
    }

    /// Character ids in processing order.
    pub fn character_ids(&self) -> Vec<String> {
        self.characters.keys().cloned().collect()
    }

    pub fn characters(&self) -> impl Iterator<Item = &Character> {
        self.characters.values().map(|c| c.as_ref())
    }

    pub fn locations(&self) -> impl Iterator<Item = &Location> {
        self.locations.values().map(|l| l.as_ref())
    }

    /// Characters currently in a location, in id order.
    pub fn characters_at<'a>(&'a self, loc_id: &'a str) -> impl Iterator<Item = &'a Character> {
        self.characters().filter(move |c| c.loc_id == loc_id)
    }

    pub fn push_event(&mut self, event: SimEvent) {
        self.events.push(event);
    }

    /// Checks referential integrity: every character stands in a known
    /// location and every neighbour link points at a known location.
    pub fn validate(&self) -> Result<()> {
        for character in self.characters() {
            if !self.locations.contains_key(&character.loc_id) {
                return Err(SimError::InvalidWorld(format!(
                    "character {} references unknown location {}",
                    character.id, character.loc_id
                )));
            }
        }
        for location in self.locations() {
            for neighbor in &location.neighbors {
                if !self.locations.contains_key(neighbor) {
                    return Err(SimError::InvalidWorld(format!(
                        "location {} lists unknown neighbour {}",
                        location.id, neighbor
                    )));
                }
            }
        }
        Ok(())
    }

    /// Parses a world produced by an adapter.
    pub fn from_json(json: &str) -> Result<Self> {
        let mut world: World = serde_json::from_str(json)?;
        for character in world.characters.values_mut() {
            Arc::make_mut(character).clamp_scalars();
        }
        Ok(world)
    }

    /// Reads and parses a world file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_json(&fs::read_to_string(path)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
