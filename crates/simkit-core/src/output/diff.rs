//! Tick Deltas
//!
//! Compares the world captured at the start of a tick with the world at its
//! end. Entries still sharing their `Arc` with the start-of-tick clone were
//! never written and are skipped without comparing contents.

use std::collections::BTreeSet;
use std::sync::Arc;

use simkit_events::{CharacterDelta, FactDelta, LocChange, ScalarChange, TickDeltas};

use crate::spatial;
use crate::world::{Character, World};

fn scalar(before: f64, after: f64) -> Option<ScalarChange> {
    (before != after).then_some(ScalarChange { before, after })
}

fn resolved(world: &World, c: &Character) -> Option<(f64, f64)> {
    world.find_loc(&c.loc_id).map(|loc| spatial::resolve_in(loc, c))
}

fn character_delta(before_world: &World, after_world: &World, before: &Character, after: &Character) -> CharacterDelta {
    let mut delta = CharacterDelta::new(after.id.clone());
    delta.stress = scalar(before.stress, after.stress);
    delta.health = scalar(before.health, after.health);
    delta.energy = scalar(before.energy, after.energy);
    if before.loc_id != after.loc_id {
        delta.loc = Some(LocChange {
            before: before.loc_id.clone(),
            after: after.loc_id.clone(),
        });
    }
    delta.moved =
        delta.loc.is_some() || resolved(before_world, before) != resolved(after_world, after);
    delta
}

/// Character and fact changes between two worlds.
pub fn compute_deltas(before: &World, after: &World) -> TickDeltas {
    let mut deltas = TickDeltas::default();

    for (id, now) in &after.characters {
        let Some(then) = before.characters.get(id) else {
            continue;
        };
        if Arc::ptr_eq(then, now) {
            continue;
        }
        let delta = character_delta(before, after, then, now);
        if !delta.is_empty() {
            deltas.characters.push(delta);
        }
    }

    let old = before.facts.entries();
    let new = after.facts.entries();
    let keys: BTreeSet<&String> = old.keys().chain(new.keys()).collect();
    for key in keys {
        match (old.get(key), new.get(key)) {
            (Some(a), Some(b)) if Arc::ptr_eq(a, b) || a == b => {}
            (a, b) => deltas.facts.push(FactDelta {
                key: key.clone(),
                before: a.map(|v| v.as_ref().clone()),
                after: b.map(|v| v.as_ref().clone()),
            }),
        }
    }

    deltas
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{Location, Pos};

    fn world() -> World {
        let mut world = World::new(0);
        world.add_location(Location::new("yard", "Yard").with_neighbor("hall"));
        world.add_location(Location::new("hall", "Hall"));
        world.add_character(Character::new("ada", "Ada", "yard"));
        world.add_character(Character::new("bo", "Bo", "yard"));
        world
    }

    #[test]
    fn test_untouched_world_has_no_deltas() {
        let w0 = world();
        let w1 = w0.clone();
        assert_eq!(compute_deltas(&w0, &w1), TickDeltas::default());
    }

    #[test]
    fn test_scalar_location_and_fact_changes() {
        let w0 = world();
        let mut w1 = w0.clone();
        {
            let ada = w1.get_char_mut("ada").unwrap();
            ada.adjust_health(-0.25);
            ada.loc_id = "hall".into();
        }
        w1.facts.set_danger("bo", 0.3);

        let deltas = compute_deltas(&w0, &w1);
        assert_eq!(deltas.characters.len(), 1);
        let ada = deltas.character("ada").unwrap();
        assert_eq!(ada.health.unwrap().after, 0.75);
        assert!(ada.stress.is_none());
        assert_eq!(ada.loc.as_ref().unwrap().after, "hall");
        assert!(ada.moved);

        let fact = deltas.fact("ctx:danger:bo").unwrap();
        assert!(fact.before.is_none());
        assert_eq!(fact.after, Some(serde_json::json!(0.3)));
    }

    #[test]
    fn test_touched_but_equal_character_is_skipped() {
        let w0 = world();
        let mut w1 = w0.clone();
        // origin is where an unplaced character resolves anyway
        w1.get_char_mut("bo").unwrap().pos = Some(Pos::at(0.0, 0.0));
        assert!(compute_deltas(&w0, &w1).characters.is_empty());
    }

    #[test]
    fn test_removed_fact_is_reported() {
        let mut w0 = world();
        w0.facts.set_danger("ada", 0.5);
        let mut w1 = w0.clone();
        w1.facts.remove(&crate::world::FactKey::danger("ada"));
        let deltas = compute_deltas(&w0, &w1);
        assert_eq!(deltas.facts[0].after, None);
    }
}
