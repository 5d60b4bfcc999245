//! Demo World
//!
//! A small walled compound: courtyard, workshop and chapel, with four
//! residents and a broken well.

use std::collections::BTreeSet;

use serde_json::json;
use simkit_events::Atom;

use crate::error::Result;
use crate::world::{
    Character, Feature, Location, LocationMap, MapPoint, Nav, NavEdge, NavNode, Pos, World,
};

fn node(id: &str, x: f64, y: f64) -> NavNode {
    NavNode {
        id: id.to_string(),
        x,
        y,
        tags: BTreeSet::new(),
    }
}

fn edge(a: &str, b: &str) -> NavEdge {
    NavEdge {
        a: a.to_string(),
        b: b.to_string(),
    }
}

fn courtyard() -> Location {
    let mut gate = node("gate", 20.0, 100.0);
    gate.tags.insert("public".into());
    let mut alcove = node("alcove", 180.0, 30.0);
    alcove.tags.insert("secluded".into());

    let mut location = Location::new("courtyard", "Courtyard")
        .with_neighbor("workshop")
        .with_neighbor("chapel")
        .with_tag("public")
        .with_hazard("crowd", 0.3)
        .with_map(LocationMap {
            width: 200.0,
            height: 200.0,
            hazard_points: vec![MapPoint {
                x: 150.0,
                y: 160.0,
                radius: 40.0,
                strength: 0.6,
            }],
            safe_points: Vec::new(),
        })
        .with_feature(Feature {
            id: "well".into(),
            x: 100.0,
            y: 100.0,
            integrity: 0.3,
        });
    location.nav = Nav {
        nodes: vec![gate, node("well_side", 95.0, 100.0), alcove],
        edges: vec![edge("gate", "well_side"), edge("well_side", "alcove")],
    };
    location
}

fn workshop() -> Location {
    Location::new("workshop", "Workshop")
        .with_neighbor("courtyard")
        .with_tag("private")
        .with_hazard("fire", 0.2)
        .with_map(LocationMap {
            width: 80.0,
            height: 60.0,
            hazard_points: Vec::new(),
            safe_points: vec![MapPoint {
                x: 10.0,
                y: 10.0,
                radius: 20.0,
                strength: 0.3,
            }],
        })
}

fn chapel() -> Location {
    Location::new("chapel", "Chapel")
        .with_neighbor("courtyard")
        .with_tag("secluded")
        .with_norm("no_violence", 0.9)
        .with_norm("silence", 0.8)
        .with_map(LocationMap {
            width: 60.0,
            height: 100.0,
            hazard_points: Vec::new(),
            safe_points: vec![MapPoint {
                x: 30.0,
                y: 80.0,
                radius: 30.0,
                strength: 0.5,
            }],
        })
}

/// Builds the demo compound. The same seed always yields the same world.
pub fn demo_world(seed: u64) -> Result<World> {
    let mut world = World::new(seed);
    world.add_location(courtyard());
    world.add_location(workshop());
    world.add_location(chapel());

    world.add_character(
        Character::new("ada", "Ada", "workshop")
            .with_pos(Pos::at(40.0, 30.0))
            .with_scalars(0.2, 1.0, 0.8)
            .with_tag("smith"),
    );
    world.add_character(
        Character::new("bo", "Bo", "courtyard")
            .with_pos(Pos::on_node("well_side"))
            .with_scalars(0.4, 0.9, 0.6),
    );
    world.add_character(
        Character::new("cy", "Cy", "courtyard")
            .with_pos(Pos::at(104.0, 103.0))
            .with_scalars(0.1, 1.0, 0.9)
            .with_tag("gossip"),
    );
    world.add_character(
        Character::new("di", "Di", "chapel")
            .with_pos(Pos::at(30.0, 70.0))
            .with_scalars(0.0, 0.8, 0.7)
            .with_tag("keeper"),
    );

    world.facts.set_agent_atoms(
        "cy",
        &[
            Atom::new("well:broken", 0.7, 0.9),
            Atom::new("rumor:fire_in_workshop", 0.4, 0.5).with_meta(json!({ "about": "ada" })),
        ],
    )?;
    world.facts.set_agent_atoms("ada", &[Atom::new("tools:ready", 0.6, 0.8)])?;
    world.facts.set_trust("bo", "cy", 0.7);
    world.facts.set_trust("ada", "cy", 0.3);
    world.facts.set_state_vector("bo", &[0.6, 0.2, 0.4]);
    world.facts.set_state_vector("cy", &[0.5, 0.3, 0.5]);

    Ok(world)
}
