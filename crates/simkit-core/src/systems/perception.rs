//! Perception System
//!
//! Drains the pending event queue once per tick. Hazard pulses hurt whoever
//! they reach, speech is delivered to everyone who can hear it and every
//! action is observed by nearby witnesses. Deliveries land in the
//! `inboxAtoms` fact and are folded into memory afterwards.
//!
//! Event application is defensive: an event naming an unknown character or
//! location is skipped, never an error.

use serde_json::json;

use simkit_events::{Atom, EventPayload, HazardPulseEvent, SimEvent, SpeechEvent};

use crate::config::MemoryConfig;
use crate::error::Result;
use crate::spatial::{self, SpatialConfig};
use crate::world::facts::{Channel, Inbox, InboxEntry};
use crate::world::World;

/// Counts from one drain pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PerceptionStats {
    pub pulses_hit: usize,
    pub speech_delivered: usize,
    pub observations: usize,
}

fn apply_hazard_pulse(world: &mut World, pulse: &HazardPulseEvent) -> Result<usize> {
    if world.find_loc(&pulse.loc_id).is_none() {
        tracing::debug!(loc = %pulse.loc_id, "hazard pulse for unknown location skipped");
        return Ok(0);
    }

    let mut hit = Vec::new();
    for c in world.characters_at(&pulse.loc_id) {
        let inside = match (pulse.x, pulse.y, pulse.radius) {
            (Some(x), Some(y), Some(radius)) => {
                spatial::distance_to_point(world, &c.id, x, y)? <= radius
            }
            _ => true,
        };
        if inside {
            hit.push(c.id.clone());
        }
    }

    let damage = if pulse.damage.is_finite() { pulse.damage } else { 0.0 };
    let stress = if pulse.stress.is_finite() { pulse.stress } else { 0.0 };
    for id in &hit {
        let c = world.get_char_mut(id)?;
        c.adjust_health(-damage);
        c.adjust_stress(stress);
    }
    Ok(hit.len())
}

fn deliver_speech(
    world: &World,
    speech: &SpeechEvent,
    spatial_cfg: &SpatialConfig,
    inbox: &mut Inbox,
) -> Result<usize> {
    if world.find_char(&speech.speaker_id).is_none() {
        tracing::debug!(speaker = %speech.speaker_id, "speech from unknown speaker skipped");
        return Ok(0);
    }

    let mut delivered = 0;
    for listener in world.characters_at(&speech.loc_id) {
        if listener.id == speech.speaker_id {
            continue;
        }
        if !spatial::can_hear(world, &speech.speaker_id, &listener.id, speech.volume, spatial_cfg)? {
            continue;
        }
        tracing::trace!(
            speaker = %speech.speaker_id,
            listener = %listener.id,
            volume = %speech.volume,
            atoms = speech.atoms.len(),
            "speech delivered"
        );
        let entries = inbox.entry(listener.id.clone()).or_default();
        for atom in &speech.atoms {
            entries.push(InboxEntry {
                from: speech.speaker_id.clone(),
                channel: Channel::Heard,
                atom: atom.clone(),
            });
        }
        delivered += 1;
    }
    Ok(delivered)
}

/// Who sees an event. Witnesses stand in the event's location within
/// `witness_range` of the actor; an actor who has already left is seen by
/// everyone it left behind.
fn witnesses(world: &World, event: &SimEvent, range: f64) -> Result<Vec<String>> {
    let Some(actor_id) = event.actor_id() else {
        return Ok(Vec::new());
    };
    let Some(actor) = world.find_char(actor_id) else {
        return Ok(Vec::new());
    };
    let loc_id = event.loc_id();
    let departed = actor.loc_id != loc_id;

    let mut out = Vec::new();
    for c in world.characters_at(loc_id) {
        if c.id == actor.id {
            continue;
        }
        if departed || spatial::distance(world, &actor.id, &c.id)? <= range {
            out.push(c.id.clone());
        }
    }
    Ok(out)
}

fn observation_atom(event: &SimEvent) -> Option<Atom> {
    let (kind, actor, target) = match &event.payload {
        EventPayload::Action(ev) => (ev.kind.as_str(), &ev.actor_id, ev.target_id.as_deref()),
        EventPayload::IntentComplete(ev) => ("intent_complete", &ev.actor_id, ev.original.target_id.as_deref()),
        _ => return None,
    };
    Some(
        Atom::new(format!("saw:{}:{}", kind, actor), 1.0, 1.0).with_meta(json!({
            "event_id": event.id,
            "target_id": target,
        })),
    )
}

/// Applies and removes every pending event, returning them in queue order.
pub fn drain_events(
    world: &mut World,
    spatial_cfg: &SpatialConfig,
    memory: &MemoryConfig,
) -> Result<(Vec<SimEvent>, PerceptionStats)> {
    let events = std::mem::take(&mut world.events);
    let mut inbox = world.facts.inbox();
    let mut stats = PerceptionStats::default();

    for event in &events {
        match &event.payload {
            EventPayload::HazardPulse(pulse) => {
                stats.pulses_hit += apply_hazard_pulse(world, pulse)?;
            }
            EventPayload::Speech(speech) => {
                stats.speech_delivered += deliver_speech(world, speech, spatial_cfg, &mut inbox)?;
            }
            EventPayload::Action(_) | EventPayload::IntentComplete(_) => {
                let Some(atom) = observation_atom(event) else {
                    continue;
                };
                for witness in witnesses(world, event, memory.witness_range)? {
                    inbox.entry(witness.clone()).or_default().push(InboxEntry {
                        from: witness,
                        channel: Channel::Observed,
                        atom: atom.clone(),
                    });
                    stats.observations += 1;
                }
            }
        }
    }

    if !inbox.is_empty() {
        world.facts.set_inbox(&inbox)?;
    }
    Ok((events, stats))
}
