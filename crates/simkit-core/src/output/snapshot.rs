//! Snapshot Builder
//!
//! Projects the world into an immutable [`SimSnapshot`].

use std::collections::BTreeMap;

use simkit_events::{
    CharacterSnapshot, FeatureSnapshot, LocationSnapshot, PosSnapshot, SimEvent, SimSnapshot,
    SnapshotDebug,
};

use crate::error::Result;
use crate::spatial;
use crate::world::World;

/// Open intents keyed by actor, with their remaining ticks.
pub fn active_intents(world: &World) -> BTreeMap<String, u32> {
    let mut out = BTreeMap::new();
    for id in world.characters.keys() {
        if let Some(record) = world.facts.intent(id) {
            out.insert(id.clone(), record.remaining_ticks);
        }
    }
    out
}

/// Builds the snapshot for the world's current tick.
///
/// `applied_events` are the events drained this tick; the live queue is
/// empty by the time this runs.
pub fn build_snapshot(
    world: &World,
    applied_events: &[SimEvent],
    offer_count: usize,
    tick_ms: u64,
) -> Result<SimSnapshot> {
    let mut snapshot = SimSnapshot::new(world.tick_index, world.tick_index.saturating_mul(tick_ms));

    for character in world.characters() {
        let location = world.get_loc(&character.loc_id)?;
        let (x, y) = spatial::resolve_in(location, character);
        snapshot.characters.push(CharacterSnapshot {
            id: character.id.clone(),
            name: character.name.clone(),
            loc_id: character.loc_id.clone(),
            pos: Some(PosSnapshot {
                node_id: character.pos.as_ref().and_then(|p| p.node_id.clone()),
                x,
                y,
            }),
            stress: character.stress,
            health: character.health,
            energy: character.energy,
            tags: character.tags.iter().cloned().collect(),
        });
    }

    for location in world.locations() {
        snapshot.locations.push(LocationSnapshot {
            id: location.id.clone(),
            name: location.name.clone(),
            neighbors: location.neighbors.clone(),
            tags: location.tags.iter().cloned().collect(),
            hazards: location.hazards.clone(),
            norms: location.norms.clone(),
            features: location
                .features
                .iter()
                .map(|f| FeatureSnapshot {
                    id: f.id.clone(),
                    integrity: f.integrity,
                })
                .collect(),
            characters_present: world
                .characters_at(&location.id)
                .map(|c| c.id.clone())
                .collect(),
        });
    }

    snapshot.events = applied_events.to_vec();
    snapshot.debug = SnapshotDebug {
        active_intents: active_intents(world),
        offer_count,
        fact_count: world.facts.len(),
    };
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{Character, Location};

    #[test]
    fn test_snapshot_is_sorted_and_timed() {
        let mut world = World::new(0);
        world.tick_index = 7;
        world.add_location(Location::new("z-hall", "Hall"));
        world.add_location(Location::new("a-yard", "Yard"));
        world.add_character(Character::new("cy", "Cy", "a-yard"));
        world.add_character(Character::new("ada", "Ada", "z-hall"));
        world.add_character(Character::new("bo", "Bo", "a-yard"));

        let snap = build_snapshot(&world, &[], 12, 250).unwrap();
        assert_eq!(snap.id, "snap_000007");
        assert_eq!(snap.time, 1750);
        let ids: Vec<&str> = snap.characters.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["ada", "bo", "cy"]);
        assert_eq!(snap.locations[0].id, "a-yard");
        assert_eq!(snap.locations[0].characters_present, vec!["bo", "cy"]);
        assert_eq!(snap.debug.offer_count, 12);
        assert_eq!(snap.find_character("ada").unwrap().pos.as_ref().unwrap().x, 0.0);
    }
}
