//! Spatial / Audibility
//!
//! Position resolution, in-location distance, privacy and hearing checks.
//! No action may span locations, so distance across locations is infinite.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

use simkit_events::Volume;

use crate::error::Result;
use crate::world::{clamp01, Character, Location, Pos, World};

/// Hearing ranges and privacy weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpatialConfig {
    pub whisper_range: f64,
    pub normal_range: f64,
    pub shout_range: f64,
    /// Speaker privacy needed for a whisper to carry at all
    pub whisper_min_privacy: f64,
    /// Privacy baseline when no tag applies
    pub default_privacy: f64,
    /// Weight of `hazards["surveillance"]` in the privacy score
    pub surveillance_k: f64,
    /// Weight of `hazards["crowd"]` in the privacy score
    pub crowd_k: f64,
}

impl Default for SpatialConfig {
    fn default() -> Self {
        Self {
            whisper_range: 30.0,
            normal_range: 90.0,
            shout_range: 250.0,
            whisper_min_privacy: 0.5,
            default_privacy: 0.5,
            surveillance_k: 0.5,
            crowd_k: 0.3,
        }
    }
}

impl SpatialConfig {
    pub fn range_for(&self, volume: Volume) -> f64 {
        match volume {
            Volume::Whisper => self.whisper_range,
            Volume::Normal => self.normal_range,
            Volume::Shout => self.shout_range,
        }
    }

    /// This config with the world's `spatial` fact applied on top.
    ///
    /// The fact is a partial object; fields it does not name keep their
    /// values. An override that does not fit the schema is ignored.
    pub fn effective(&self, world: &World) -> SpatialConfig {
        let Some(Value::Object(patch)) = world.facts.spatial_override() else {
            return self.clone();
        };
        let mut merged = match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => return self.clone(),
        };
        for (k, v) in patch {
            merged.insert(k.clone(), v.clone());
        }
        serde_json::from_value(Value::Object(merged)).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "ignoring malformed spatial override");
            self.clone()
        })
    }
}

/// Tag baselines, checked in this order.
const PRIVACY_TAGS: [(&str, f64); 4] = [
    ("private", 0.8),
    ("secluded", 0.7),
    ("public", 0.2),
    ("crowded", 0.1),
];

/// Resolves a character position inside its location.
///
/// Explicit `x/y` wins, then the nav node's coordinates, then the centre of
/// the location map, then the origin.
pub fn resolve_in(location: &Location, character: &Character) -> (f64, f64) {
    if let Some(pos) = &character.pos {
        if let Some(xy) = pos.xy() {
            return xy;
        }
        if let Some(node) = pos.node_id.as_deref().and_then(|id| location.nav.node(id)) {
            return (node.x, node.y);
        }
    }
    location.center().unwrap_or((0.0, 0.0))
}

pub fn resolve_position(world: &World, char_id: &str) -> Result<(f64, f64)> {
    let character = world.get_char(char_id)?;
    let location = world.get_loc(&character.loc_id)?;
    Ok(resolve_in(location, character))
}

/// Writes every resolved position back into `pos`. Characters whose
/// position is already explicit are left untouched.
pub fn resolve_all_positions(world: &mut World) -> Result<()> {
    for id in world.character_ids() {
        let (x, y) = resolve_position(world, &id)?;
        let current = world.get_char(&id)?.pos.as_ref().and_then(Pos::xy);
        if current == Some((x, y)) {
            continue;
        }
        let character = world.get_char_mut(&id)?;
        let pos = character.pos.get_or_insert_with(Pos::default);
        pos.x = Some(x);
        pos.y = Some(y);
    }
    Ok(())
}

/// Euclidean distance between two characters, infinite across locations.
pub fn distance(world: &World, a: &str, b: &str) -> Result<f64> {
    let ca = world.get_char(a)?;
    let cb = world.get_char(b)?;
    if ca.loc_id != cb.loc_id {
        return Ok(f64::INFINITY);
    }
    let location = world.get_loc(&ca.loc_id)?;
    let (ax, ay) = resolve_in(location, ca);
    let (bx, by) = resolve_in(location, cb);
    Ok(((ax - bx).powi(2) + (ay - by).powi(2)).sqrt())
}

/// Distance from a character to a point in its own location.
pub fn distance_to_point(world: &World, char_id: &str, x: f64, y: f64) -> Result<f64> {
    let (cx, cy) = resolve_position(world, char_id)?;
    Ok(((cx - x).powi(2) + (cy - y).powi(2)).sqrt())
}

fn tag_baseline(tags: &BTreeSet<String>) -> Option<f64> {
    PRIVACY_TAGS
        .iter()
        .find(|(tag, _)| tags.contains(*tag))
        .map(|(_, level)| *level)
}

/// Local privacy of a character in `[0, 1]`.
pub fn privacy_score(world: &World, char_id: &str, cfg: &SpatialConfig) -> Result<f64> {
    let character = world.get_char(char_id)?;
    let location = world.get_loc(&character.loc_id)?;

    let node = character
        .pos
        .as_ref()
        .and_then(|p| p.node_id.as_deref())
        .and_then(|id| location.nav.node(id));

    let baseline = node
        .and_then(|n| tag_baseline(&n.tags))
        .or_else(|| tag_baseline(&location.tags))
        .unwrap_or(cfg.default_privacy);

    Ok(clamp01(
        baseline
            - cfg.surveillance_k * location.hazard("surveillance")
            - cfg.crowd_k * location.hazard("crowd"),
    ))
}

/// Whether `listener` hears `speaker` at the given volume.
pub fn can_hear(
    world: &World,
    speaker: &str,
    listener: &str,
    volume: Volume,
    cfg: &SpatialConfig,
) -> Result<bool> {
    let d = distance(world, speaker, listener)?;
    if !d.is_finite() || d > cfg.range_for(volume) {
        return Ok(false);
    }
    if volume == Volume::Whisper && privacy_score(world, speaker, cfg)? < cfg.whisper_min_privacy {
        return Ok(false);
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{LocationMap, NavNode};
    use serde_json::json;
    use std::sync::Arc;

    fn world() -> World {
        let mut world = World::new(0);
        let mut plaza = Location::new("plaza", "Plaza")
            .with_tag("public")
            .with_map(LocationMap {
                width: 200.0,
                height: 100.0,
                ..LocationMap::default()
            });
        plaza.nav.nodes.push(NavNode {
            id: "nook".into(),
            x: 10.0,
            y: 10.0,
            tags: BTreeSet::from(["private".to_string()]),
        });
        world.add_location(plaza);
        world.add_location(Location::new("cellar", "Cellar"));
        world.add_character(Character::new("ada", "Ada", "plaza").with_pos(Pos::at(0.0, 0.0)));
        world.add_character(Character::new("bo", "Bo", "plaza").with_pos(Pos::at(3.0, 4.0)));
        world.add_character(Character::new("cy", "Cy", "plaza").with_pos(Pos::on_node("nook")));
        world.add_character(Character::new("di", "Di", "plaza"));
        world.add_character(Character::new("ed", "Ed", "cellar"));
        world
    }

    #[test]
    fn test_position_fallbacks() {
        let world = world();
        assert_eq!(resolve_position(&world, "bo").unwrap(), (3.0, 4.0));
        assert_eq!(resolve_position(&world, "cy").unwrap(), (10.0, 10.0));
        assert_eq!(resolve_position(&world, "di").unwrap(), (100.0, 50.0));
        assert_eq!(resolve_position(&world, "ed").unwrap(), (0.0, 0.0));
    }

    #[test]
    fn test_distance() {
        let world = world();
        assert_eq!(distance(&world, "ada", "bo").unwrap(), 5.0);
        assert_eq!(distance(&world, "ada", "ed").unwrap(), f64::INFINITY);
        assert!(distance(&world, "ada", "zed").is_err());
    }

    #[test]
    fn test_privacy_node_tags_override_location() {
        let mut world = world();
        let cfg = SpatialConfig::default();
        assert!((privacy_score(&world, "ada", &cfg).unwrap() - 0.2).abs() < 1e-9);
        assert!((privacy_score(&world, "cy", &cfg).unwrap() - 0.8).abs() < 1e-9);
        assert!((privacy_score(&world, "ed", &cfg).unwrap() - 0.5).abs() < 1e-9);

        world.get_loc_mut("plaza").unwrap().hazards.insert("surveillance".into(), 1.0);
        assert!((privacy_score(&world, "cy", &cfg).unwrap() - 0.3).abs() < 1e-9);
        assert_eq!(privacy_score(&world, "ada", &cfg).unwrap(), 0.0);
    }

    #[test]
    fn test_whisper_needs_range_and_privacy() {
        let world = world();
        let cfg = SpatialConfig::default();
        // 5 units apart but the plaza is public
        assert!(!can_hear(&world, "ada", "bo", Volume::Whisper, &cfg).unwrap());
        assert!(can_hear(&world, "ada", "bo", Volume::Normal, &cfg).unwrap());
        // private nook, ada is ~14 units away
        assert!(can_hear(&world, "cy", "ada", Volume::Whisper, &cfg).unwrap());
        // di stands at the map centre, far outside whisper range
        assert!(!can_hear(&world, "cy", "di", Volume::Whisper, &cfg).unwrap());
        assert!(can_hear(&world, "cy", "di", Volume::Shout, &cfg).unwrap());
        assert!(!can_hear(&world, "ada", "ed", Volume::Shout, &cfg).unwrap());
    }

    #[test]
    fn test_spatial_fact_overrides_named_fields() {
        let mut world = world();
        let cfg = SpatialConfig::default();
        world.facts.set(&crate::world::FactKey::Spatial, json!({"whisper_range": 5.0}));
        let eff = cfg.effective(&world);
        assert_eq!(eff.whisper_range, 5.0);
        assert_eq!(eff.normal_range, 90.0);

        world.facts.set(&crate::world::FactKey::Spatial, json!({"whisper_range": "far"}));
        assert_eq!(cfg.effective(&world), cfg);
    }

    #[test]
    fn test_resolve_all_writes_back_once() {
        let mut world = world();
        resolve_all_positions(&mut world).unwrap();
        assert_eq!(world.get_char("di").unwrap().pos, Some(Pos::at(100.0, 50.0)));
        let cy = world.get_char("cy").unwrap().pos.clone().unwrap();
        assert_eq!(cy.node_id.as_deref(), Some("nook"));
        assert_eq!(cy.xy(), Some((10.0, 10.0)));

        let before = world.clone();
        resolve_all_positions(&mut world).unwrap();
        for (id, c) in &world.characters {
            assert!(Arc::ptr_eq(c, &before.characters[id]));
        }
    }
}
