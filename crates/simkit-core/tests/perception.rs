//! Hearing, the acceptance gate and belief memory.

mod common;

use simkit_core::spatial::{can_hear, privacy_score};
use simkit_core::systems::trust::evaluate;
use simkit_core::systems::{merge_beliefs, AcceptanceDecision};
use simkit_core::{AcceptanceConfig, FactKey, SimConfig, SpatialConfig, Simulator, World};
use simkit_events::{ActionKind, ActionPayload, Admission, Atom, SimAction, Volume};

use serde_json::json;

use common::square;

/// Listener offsets along the x axis, including the exact range boundaries.
const OFFSETS: [f64; 6] = [0.0, 4.9, 5.0, 29.9, 30.0, 60.0];
const RANGES: [f64; 4] = [0.0, 5.0, 30.0, 45.0];
const MIN_PRIVACY: [f64; 4] = [0.0, 0.25, 0.5, 0.75];

/// The square with bo moved to `(offset, 0)` and the given privacy setup.
fn square_with(offset: f64, tag: Option<&str>, surveillance: f64) -> World {
    let mut world = square();
    let loc = world.get_loc_mut("square").unwrap();
    if let Some(tag) = tag {
        loc.tags.insert(tag.into());
    }
    if surveillance > 0.0 {
        loc.hazards.insert("surveillance".into(), surveillance);
    }
    world.get_char_mut("bo").unwrap().pos = Some(simkit_core::Pos::at(offset, 0.0));
    world
}

fn privacy_setups() -> Vec<(Option<&'static str>, f64)> {
    vec![
        (None, 0.0),
        (Some("secluded"), 0.0),
        (Some("private"), 0.4),
        (Some("public"), 0.0),
        (Some("crowded"), 0.0),
    ]
}

fn whisper(atom: &str) -> SimAction {
    SimAction::new("w1", ActionKind::Talk, "ada")
        .with_target("bo")
        .with_payload(ActionPayload::Speech {
            volume: Volume::Whisper,
            atoms: vec![Atom::new(atom, 1.0, 0.9)],
        })
}

#[test]
fn test_volume_ranges() {
    let world = square();
    let cfg = SpatialConfig::default();
    assert!(can_hear(&world, "ada", "bo", Volume::Whisper, &cfg).unwrap());
    assert!(!can_hear(&world, "ada", "cy", Volume::Whisper, &cfg).unwrap());
    assert!(!can_hear(&world, "ada", "cy", Volume::Normal, &cfg).unwrap());
    assert!(can_hear(&world, "ada", "cy", Volume::Shout, &cfg).unwrap());
}

#[test]
fn test_whisper_needs_privacy() {
    let mut world = square();
    world.get_loc_mut("square").unwrap().tags.insert("public".into());
    let cfg = SpatialConfig::default();
    assert!(privacy_score(&world, "ada", &cfg).unwrap() < cfg.whisper_min_privacy);
    assert!(!can_hear(&world, "ada", "bo", Volume::Whisper, &cfg).unwrap());
    assert!(can_hear(&world, "ada", "bo", Volume::Normal, &cfg).unwrap());
}

#[test]
fn test_nobody_hears_across_locations() {
    let mut world = square();
    world.get_char_mut("bo").unwrap().loc_id = "chapel".into();
    let cfg = SpatialConfig::default();
    assert!(!can_hear(&world, "ada", "bo", Volume::Shout, &cfg).unwrap());
}

#[test]
fn test_gate_thresholds() {
    let cfg = AcceptanceConfig::default();
    let mut world = square();

    // trust 0.5, compat 0.6, confidence 0.5 lands between the thresholds
    let middling = Atom::new("rumor", 1.0, 0.5);
    let verdict = evaluate(&world, "bo", "ada", &middling, &cfg).unwrap();
    assert!(verdict.p >= cfg.reject_threshold && verdict.p < cfg.accept_threshold);
    match verdict.decision {
        AcceptanceDecision::Quarantine { confidence } => {
            assert!((confidence - 0.5 * verdict.p).abs() < 1e-9)
        }
        other => panic!("expected quarantine, got {:?}", other),
    }

    world.facts.set_last_action("bo", ActionKind::Observe);
    let boosted = evaluate(&world, "bo", "ada", &middling, &cfg).unwrap();
    assert_eq!(boosted.decision, AcceptanceDecision::Accept);

    world.facts.set_trust("cy", "ada", 0.1);
    let distrusted = evaluate(&world, "cy", "ada", &middling, &cfg).unwrap();
    assert!(distrusted.p < cfg.reject_threshold);
    assert_eq!(distrusted.decision, AcceptanceDecision::Reject);

    world.facts.set_trust("cy", "bo", 0.9);
    world.facts.set_state_vector("cy", &[1.0, 0.0]);
    world.facts.set_state_vector("bo", &[1.0, 0.0]);
    let trusted = evaluate(&world, "cy", "bo", &Atom::new("news", 1.0, 0.9), &cfg).unwrap();
    assert_eq!(trusted.compat, 1.0);
    assert_eq!(trusted.decision, AcceptanceDecision::Accept);
}

#[test]
fn test_stress_lowers_acceptance() {
    let cfg = AcceptanceConfig::default();
    let mut world = square();
    let atom = Atom::new("news", 1.0, 0.8);
    let calm = evaluate(&world, "bo", "ada", &atom, &cfg).unwrap();
    world.get_char_mut("bo").unwrap().stress = 1.0;
    let stressed = evaluate(&world, "bo", "ada", &atom, &cfg).unwrap();
    assert!((calm.base - stressed.base - cfg.stress_penalty).abs() < 1e-9);
    assert!(stressed.p < calm.p);
}

#[test]
fn test_merge_dedupes_and_caps() {
    let mut beliefs = vec![Atom::new("a", 1.0, 0.9), Atom::new("b", 1.0, 0.3)];
    let evicted = merge_beliefs(
        &mut beliefs,
        vec![Atom::new("a", 1.0, 0.4), Atom::new("c", 1.0, 0.5)],
        2,
    );
    assert_eq!(evicted, 1);
    let mut ids: Vec<&str> = beliefs.iter().map(|a| a.id.as_str()).collect();
    ids.sort();
    assert_eq!(ids, vec!["a", "c"]);
    assert_eq!(beliefs.iter().find(|a| a.id == "a").unwrap().confidence, 0.9);
}

#[test]
fn test_quarantined_speech_is_kept_with_lower_confidence() {
    let mut sim = Simulator::new(square(), SimConfig::default()).unwrap();
    sim.enqueue_action(
        SimAction::new("t1", ActionKind::Talk, "ada")
            .with_target("bo")
            .with_payload(ActionPayload::Speech {
                volume: Volume::Normal,
                atoms: vec![Atom::new("rumor", 1.0, 0.5)],
            }),
    );
    sim.step().unwrap();

    let beliefs = sim.world().facts.belief_atoms("bo");
    let rumor = beliefs.iter().find(|a| a.id == "rumor").unwrap();
    assert_eq!(rumor.origin.as_ref().unwrap().admission, Admission::Quarantined);
    assert!(rumor.confidence < 0.5);
}

#[test]
fn test_belief_cap_applies_through_the_tick() {
    let mut config = SimConfig::default();
    config.memory.max_belief_atoms = 1;
    let mut sim = Simulator::new(square(), config).unwrap();
    sim.enqueue_action(
        SimAction::new("t1", ActionKind::Talk, "ada")
            .with_target("bo")
            .with_payload(ActionPayload::Speech {
                volume: Volume::Normal,
                atoms: vec![
                    Atom::new("x", 1.0, 0.9),
                    Atom::new("y", 1.0, 0.8),
                    Atom::new("z", 1.0, 0.7),
                ],
            }),
    );
    sim.step().unwrap();

    let beliefs = sim.world().facts.belief_atoms("bo");
    assert_eq!(beliefs.len(), 1);
    assert_eq!(beliefs[0].id, "saw:talk:ada");
}

#[test]
fn test_whisper_sweep_over_range_and_privacy() {
    for (tag, surveillance) in privacy_setups() {
        for offset in OFFSETS {
            let world = square_with(offset, tag, surveillance);
            for range in RANGES {
                for min_privacy in MIN_PRIVACY {
                    let cfg = SpatialConfig {
                        whisper_range: range,
                        whisper_min_privacy: min_privacy,
                        ..SpatialConfig::default()
                    };
                    let privacy = privacy_score(&world, "ada", &cfg).unwrap();
                    let heard = can_hear(&world, "ada", "bo", Volume::Whisper, &cfg).unwrap();
                    let case = format!(
                        "tag={:?} surveillance={} offset={} range={} min_privacy={} privacy={}",
                        tag, surveillance, offset, range, min_privacy, privacy
                    );
                    if offset > range || privacy < min_privacy {
                        assert!(!heard, "whisper leaked: {}", case);
                    } else {
                        assert!(heard, "whisper dropped: {}", case);
                    }
                }
            }
        }
    }
}

#[test]
fn test_whisper_sweep_through_spatial_fact() {
    let base = SpatialConfig::default();
    for (tag, surveillance) in privacy_setups() {
        for offset in OFFSETS {
            for range in RANGES {
                for min_privacy in MIN_PRIVACY {
                    let mut world = square_with(offset, tag, surveillance);
                    world.facts.set(
                        &FactKey::Spatial,
                        json!({ "whisper_range": range, "whisper_min_privacy": min_privacy }),
                    );
                    let cfg = base.effective(&world);
                    assert_eq!(cfg.whisper_range, range);
                    assert_eq!(cfg.whisper_min_privacy, min_privacy);
                    assert_eq!(cfg.normal_range, base.normal_range);

                    let privacy = privacy_score(&world, "ada", &cfg).unwrap();
                    let heard = can_hear(&world, "ada", "bo", Volume::Whisper, &cfg).unwrap();
                    assert_eq!(
                        heard,
                        offset <= range && privacy >= min_privacy,
                        "tag={:?} offset={} range={} min_privacy={}",
                        tag,
                        offset,
                        range,
                        min_privacy
                    );
                }
            }
        }
    }
}

#[test]
fn test_whisper_delivery_follows_spatial_fact_during_step() {
    for (tag, surveillance) in privacy_setups() {
        for (offset, range, min_privacy) in [(4.0, 5.0, 0.0), (20.0, 5.0, 0.0), (4.0, 30.0, 0.75)] {
            let mut world = square_with(offset, tag, surveillance);
            world.facts.set(
                &FactKey::Spatial,
                json!({ "whisper_range": range, "whisper_min_privacy": min_privacy }),
            );
            let cfg = SpatialConfig::default().effective(&world);
            let privacy = privacy_score(&world, "ada", &cfg).unwrap();

            let mut sim = Simulator::new(world, SimConfig::default()).unwrap();
            sim.enqueue_action(whisper("secret"));
            let record = sim.step().unwrap();
            assert_eq!(record.trace.actions_applied.len(), 1);

            let heard = sim
                .world()
                .facts
                .belief_atoms("bo")
                .iter()
                .any(|a| a.id == "secret");
            assert_eq!(
                heard,
                offset <= range && privacy >= min_privacy,
                "tag={:?} offset={} range={} min_privacy={}",
                tag,
                offset,
                range,
                min_privacy
            );
        }
    }
}
