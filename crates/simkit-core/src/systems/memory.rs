//! Belief Memory System
//!
//! Moves inbox atoms into each recipient's `mem:beliefAtoms:<id>` list.
//! Heard atoms go through the acceptance gate first; observed atoms are
//! stored as they are.

use simkit_events::{Admission, Atom};

use crate::config::MemoryConfig;
use crate::error::Result;
use crate::systems::trust::{self, AcceptanceConfig, AcceptanceDecision};
use crate::world::facts::Channel;
use crate::world::World;

/// Counts from one merge pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    pub observed: usize,
    pub accepted: usize,
    pub quarantined: usize,
    pub rejected: usize,
    pub evicted: usize,
}

fn origin_tick(atom: &Atom) -> u64 {
    atom.origin.as_ref().map(|o| o.tick).unwrap_or(0)
}

/// Merges `incoming` into `beliefs`.
///
/// Atoms with the same id collapse into the more confident one (the newer
/// one on a tie). Past `cap`, the least confident atom is evicted first and
/// the oldest breaks ties. Returns how many atoms were evicted.
pub fn merge_beliefs(beliefs: &mut Vec<Atom>, incoming: Vec<Atom>, cap: usize) -> usize {
    for atom in incoming {
        match beliefs.iter_mut().find(|b| b.id == atom.id) {
            Some(existing) => {
                if atom.confidence >= existing.confidence {
                    *existing = atom;
                }
            }
            None => beliefs.push(atom),
        }
    }

    let mut evicted = 0;
    while beliefs.len() > cap {
        let victim = beliefs
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| {
                a.confidence
                    .total_cmp(&b.confidence)
                    .then_with(|| origin_tick(a).cmp(&origin_tick(b)))
            })
            .map(|(i, _)| i);
        match victim {
            Some(i) => {
                beliefs.remove(i);
                evicted += 1;
            }
            None => break,
        }
    }
    evicted
}

/// Drains `inboxAtoms` into belief memory.
pub fn merge_inbox(
    world: &mut World,
    acceptance: &AcceptanceConfig,
    memory: &MemoryConfig,
    tick: u64,
) -> Result<MergeStats> {
    let inbox = world.facts.take_inbox();
    let mut stats = MergeStats::default();

    for (recipient, entries) in inbox {
        if world.find_char(&recipient).is_none() {
            tracing::debug!(recipient = %recipient, "dropping inbox for unknown recipient");
            continue;
        }

        let mut admitted = Vec::with_capacity(entries.len());
        for entry in entries {
            match entry.channel {
                Channel::Observed => {
                    stats.observed += 1;
                    admitted.push(entry.atom.with_origin(&recipient, tick, Admission::Observed));
                }
                Channel::Heard => {
                    let verdict = trust::evaluate(world, &recipient, &entry.from, &entry.atom, acceptance)?;
                    match verdict.decision {
                        AcceptanceDecision::Accept => {
                            stats.accepted += 1;
                            admitted.push(entry.atom.with_origin(&entry.from, tick, Admission::Accepted));
                        }
                        AcceptanceDecision::Quarantine { confidence } => {
                            stats.quarantined += 1;
                            let mut atom = entry.atom.with_origin(&entry.from, tick, Admission::Quarantined);
                            atom.confidence = confidence;
                            admitted.push(atom);
                        }
                        AcceptanceDecision::Reject => {
                            stats.rejected += 1;
                            tracing::trace!(
                                listener = %recipient,
                                speaker = %entry.from,
                                atom = %entry.atom.id,
                                p = verdict.p,
                                "atom rejected"
                            );
                        }
                    }
                }
            }
        }

        if admitted.is_empty() {
            continue;
        }
        let mut beliefs = world.facts.belief_atoms(&recipient);
        stats.evicted += merge_beliefs(&mut beliefs, admitted, memory.max_belief_atoms);
        world.facts.set_belief_atoms(&recipient, &beliefs)?;
    }

    Ok(stats)
}
