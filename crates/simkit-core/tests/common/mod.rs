//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use simkit_core::world::Feature;
use simkit_core::{Character, Location, Pos, SimConfig, Simulator, World};

/// Open square with a broken well: ada at (0,0), bo at (3,4), cy at (200,0).
/// The chapel next door forbids violence.
pub fn square() -> World {
    let mut world = World::new(11);
    world.add_location(
        Location::new("square", "Square")
            .with_neighbor("chapel")
            .with_feature(Feature {
                id: "well".into(),
                x: 10.0,
                y: 0.0,
                integrity: 0.2,
            }),
    );
    world.add_location(
        Location::new("chapel", "Chapel")
            .with_neighbor("square")
            .with_norm("no_violence", 0.9),
    );
    world.add_character(Character::new("ada", "Ada", "square").with_pos(Pos::at(0.0, 0.0)));
    world.add_character(Character::new("bo", "Bo", "square").with_pos(Pos::at(3.0, 4.0)));
    world.add_character(Character::new("cy", "Cy", "square").with_pos(Pos::at(200.0, 0.0)));
    world
}

pub fn sim(world: World) -> Simulator {
    Simulator::new(world, SimConfig::default()).unwrap()
}

pub fn integrity(sim: &Simulator, feature: &str) -> f64 {
    sim.world()
        .get_loc("square")
        .unwrap()
        .feature(feature)
        .unwrap()
        .integrity
}
