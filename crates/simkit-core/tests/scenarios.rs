//! End-to-end scenarios through `Simulator::step`.

mod common;

use simkit_core::world::facts::FactKey;
use simkit_events::{ActionKind, ActionPayload, Admission, Atom, SimAction, ValidationOutcome, Volume};

use common::{integrity, sim, square};

#[test]
fn test_talk_at_five_units_emits_talk_and_speech() {
    let mut sim = sim(square());
    sim.enqueue_action(
        SimAction::new("t1", ActionKind::Talk, "ada")
            .with_target("bo")
            .with_payload(ActionPayload::Speech {
                volume: Volume::Normal,
                atoms: vec![Atom::new("well:broken", 1.0, 0.9)],
            }),
    );

    let record = sim.step().unwrap();
    let snap = &record.snapshot;
    assert_eq!(snap.events.len(), 2);
    assert_eq!(snap.events_of_type("action:talk").len(), 1);
    assert_eq!(snap.events_of_type("speech:v1").len(), 1);
    assert_eq!(record.trace.events_applied.len(), 2);

    // trust 0.5, compat 0.6, confidence 0.9 clears the accept threshold
    let beliefs = sim.world().facts.belief_atoms("bo");
    let heard = beliefs.iter().find(|a| a.id == "well:broken").unwrap();
    let origin = heard.origin.as_ref().unwrap();
    assert_eq!(origin.source, "ada");
    assert_eq!(origin.admission, Admission::Accepted);

    // bo also saw the talk; cy is out of both hearing and witness range
    assert!(beliefs.iter().any(|a| a.id == "saw:talk:ada"));
    assert!(sim.world().facts.belief_atoms("cy").is_empty());
    assert!(!sim.world().facts.contains(&FactKey::InboxAtoms));
}

#[test]
fn test_attack_under_no_violence_degrades_to_wait() {
    let mut world = square();
    world
        .get_loc_mut("square")
        .unwrap()
        .norms
        .insert("no_violence".into(), 0.9);
    let mut sim = sim(world);
    sim.enqueue_action(SimAction::new("a1", ActionKind::Attack, "ada").with_target("bo"));

    let record = sim.step().unwrap();
    let validation = &record.trace.action_validations[0];
    assert_eq!(validation.outcome, ValidationOutcome::Disallowed);
    assert_eq!(validation.reasons, vec!["norm:no_violence".to_string()]);
    assert_eq!(validation.applied_kind, ActionKind::Wait);
    assert_eq!(record.trace.actions_applied[0].kind, ActionKind::Wait);
    assert_eq!(sim.world().get_char("bo").unwrap().health, 1.0);
    assert!(record.snapshot.events.is_empty());
    assert!(record.trace.deltas.character("bo").is_none());
}

#[test]
fn test_attack_without_norm_lands() {
    let mut sim = sim(square());
    sim.enqueue_action(SimAction::new("a1", ActionKind::Attack, "ada").with_target("bo"));

    let record = sim.step().unwrap();
    let health = sim.world().get_char("bo").unwrap().health;
    assert!(health <= 0.85 && health >= 0.8 - 1e-9);
    let delta = record.trace.deltas.character("bo").unwrap();
    assert!(delta.health.unwrap().delta() < 0.0);
}

#[test]
fn test_repair_only_takes_effect_after_third_continue() {
    let mut sim = sim(square());
    sim.enqueue_action(SimAction::new("r1", ActionKind::RepairFeature, "ada").with_target("well"));

    let record = sim.step().unwrap();
    assert_eq!(record.trace.action_validations[0].outcome, ValidationOutcome::Intent);
    assert_eq!(record.trace.actions_applied[0].kind, ActionKind::StartIntent);
    let types: Vec<String> = record.snapshot.events.iter().map(|e| e.type_name()).collect();
    assert_eq!(types, vec!["action:start_intent"]);
    assert_eq!(record.snapshot.debug.active_intents.get("ada"), Some(&3));
    assert_eq!(integrity(&sim, "well"), 0.2);

    for n in 1..=2 {
        sim.enqueue_action(SimAction::new(format!("c{}", n), ActionKind::ContinueIntent, "ada"));
        sim.step().unwrap();
        assert_eq!(integrity(&sim, "well"), 0.2);
        assert_eq!(sim.world().get_char("ada").unwrap().energy, 1.0);
    }

    sim.enqueue_action(SimAction::new("c3", ActionKind::ContinueIntent, "ada"));
    let record = sim.step().unwrap();
    assert!((integrity(&sim, "well") - 0.55).abs() < 1e-9);
    assert!(record.snapshot.events_of_type("action:intent_complete").len() == 1);
    assert!(record.snapshot.debug.active_intents.is_empty());
    assert!(!sim.world().facts.has_intent("ada"));
}

#[test]
fn test_move_to_neighbor_updates_location() {
    let mut sim = sim(square());
    sim.enqueue_action(SimAction::new("m1", ActionKind::Move, "bo").with_target("chapel"));

    let record = sim.step().unwrap();
    assert_eq!(sim.world().get_char("bo").unwrap().loc_id, "chapel");
    let moved = record.trace.deltas.character("bo").unwrap();
    assert_eq!(moved.loc.as_ref().unwrap().before, "square");
    assert!(moved.moved);
    let chapel = record.snapshot.find_location("chapel").unwrap();
    assert_eq!(chapel.characters_present, vec!["bo".to_string()]);
}
