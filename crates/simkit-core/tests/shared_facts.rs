//! Facts written by external collaborators in shapes the engine does not
//! produce must not stop the tick.

mod common;

use serde_json::json;
use simkit_events::{ActionKind, SimAction, ValidationOutcome};

use common::{sim, square};

#[test]
fn test_bare_atom_inbox_does_not_abort_step() {
    let mut world = square();
    world.facts.set_raw(
        "inboxAtoms".into(),
        json!({"bo": [{"id": "x", "magnitude": 1.0, "confidence": 0.9}]}),
    );
    let mut sim = sim(world);

    let record = sim.step().unwrap();
    assert_eq!(record.snapshot.tick_index, 0);
    assert!(!sim.world().facts.belief_atoms("bo").iter().any(|a| a.id == "x"));
    assert!(sim.world().facts.get_raw("inboxAtoms").is_none());
}

#[test]
fn test_malformed_intent_reads_as_none() {
    let mut world = square();
    world.facts.set_raw("intent:ada".into(), json!({"remainingTicks": 2}));
    let mut sim = sim(world);
    sim.enqueue_action(SimAction::new("r1", ActionKind::RepairFeature, "ada").with_target("well"));

    let record = sim.step().unwrap();
    assert!(record.snapshot.debug.active_intents.get("ada").is_some());
    assert_eq!(record.trace.action_validations[0].outcome, ValidationOutcome::Intent);
    assert_eq!(sim.world().facts.intent("ada").unwrap().remaining_ticks, 3);
}

#[test]
fn test_malformed_beliefs_are_replaced_on_merge() {
    let mut world = square();
    world.facts.set_raw("mem:beliefAtoms:bo".into(), json!("corrupt"));
    let mut sim = sim(world);
    sim.enqueue_action(SimAction::new("o1", ActionKind::Observe, "ada"));

    sim.step().unwrap();
    let beliefs = sim.world().facts.belief_atoms("bo");
    assert!(beliefs.iter().any(|a| a.id == "saw:observe:ada"));
}
