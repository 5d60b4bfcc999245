//! Context System
//!
//! Folds location hazards and map hazard/safe points into the per-character
//! `ctx:danger:<id>` and `ctx:privacy:<id>` facts read by actions and by
//! external collaborators.

use crate::error::Result;
use crate::spatial::{self, SpatialConfig};
use crate::world::{clamp01, Location, MapPoint, World};

/// Hazards that describe exposure rather than physical danger
pub const SOCIAL_HAZARDS: [&str; 2] = ["surveillance", "crowd"];

/// Strongest physical hazard declared on a location.
pub fn ambient_danger(location: &Location) -> f64 {
    location
        .hazards
        .iter()
        .filter(|(name, _)| !SOCIAL_HAZARDS.contains(&name.as_str()))
        .map(|(_, level)| *level)
        .fold(0.0, f64::max)
}

/// Linear falloff from `strength` at the point to 0 at its radius.
fn point_influence(point: &MapPoint, x: f64, y: f64) -> f64 {
    if point.radius <= 0.0 {
        return 0.0;
    }
    let d = ((point.x - x).powi(2) + (point.y - y).powi(2)).sqrt();
    if d >= point.radius {
        0.0
    } else {
        point.strength * (1.0 - d / point.radius)
    }
}

/// Danger felt at a spot: ambient hazard plus nearby hazard points, minus
/// nearby safe points.
pub fn danger_at(location: &Location, x: f64, y: f64) -> f64 {
    let mut danger = ambient_danger(location);
    if let Some(map) = &location.map {
        danger += map
            .hazard_points
            .iter()
            .map(|p| point_influence(p, x, y))
            .sum::<f64>();
        danger -= map
            .safe_points
            .iter()
            .map(|p| point_influence(p, x, y))
            .sum::<f64>();
    }
    clamp01(danger)
}

/// Recomputes danger and privacy for every character.
pub fn update_context_facts(world: &mut World, spatial_cfg: &SpatialConfig) -> Result<()> {
    for id in world.character_ids() {
        let (x, y) = spatial::resolve_position(world, &id)?;
        let loc_id = world.get_char(&id)?.loc_id.clone();
        let danger = danger_at(world.get_loc(&loc_id)?, x, y);
        let privacy = spatial::privacy_score(world, &id, spatial_cfg)?;
        world.facts.set_danger(&id, danger);
        world.facts.set_privacy(&id, privacy);
    }
    Ok(())
}
