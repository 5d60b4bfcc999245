//! Action Selection
//!
//! Decides which action each actor attempts this tick. Forced actions win
//! outright, then the first plugin with a non-empty answer, then a greedy
//! pick of each actor's best unblocked offer.

use std::collections::BTreeSet;
use std::fmt;

use simkit_events::{ActionOffer, SimAction};

use crate::actions::action_from_offer;
use crate::config::SimConfig;
use crate::plugin::SimPlugin;
use crate::rng::SimRng;
use crate::world::World;

/// Where this tick's actions came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecisionSource {
    Forced,
    Plugin(String),
    Greedy,
}

impl fmt::Display for DecisionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecisionSource::Forced => write!(f, "forced"),
            DecisionSource::Plugin(name) => write!(f, "plugin:{}", name),
            DecisionSource::Greedy => write!(f, "greedy"),
        }
    }
}

/// At most one action per actor, in actor id order
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedActions {
    pub actions: Vec<SimAction>,
    pub source: DecisionSource,
    pub notes: Vec<String>,
}

/// Best unblocked offer per actor. `offers` must already be in rank order.
pub fn greedy_actions(world: &World, cfg: &SimConfig, offers: &[ActionOffer]) -> Vec<SimAction> {
    let mut seen = BTreeSet::new();
    offers
        .iter()
        .filter(|o| !o.blocked)
        .filter(|o| seen.insert(o.actor_id.as_str()))
        .map(|o| action_from_offer(world, cfg, o))
        .collect()
}

/// Keeps the first action per actor and orders the survivors by actor id.
fn one_per_actor(actions: Vec<SimAction>, notes: &mut Vec<String>) -> Vec<SimAction> {
    let mut seen = BTreeSet::new();
    let mut kept = Vec::with_capacity(actions.len());
    for action in actions {
        if seen.insert(action.actor_id.clone()) {
            kept.push(action);
        } else {
            tracing::warn!(action = %action.id, actor = %action.actor_id, "dropping duplicate action for actor");
            notes.push(format!("duplicate action {} for {} dropped", action.id, action.actor_id));
        }
    }
    kept.sort_by(|a, b| a.actor_id.cmp(&b.actor_id));
    kept
}

/// Resolves this tick's actions.
pub fn select_actions(
    world: &World,
    cfg: &SimConfig,
    offers: &[ActionOffer],
    mut forced: Vec<SimAction>,
    plugins: &mut [Box<dyn SimPlugin>],
    rng: &mut SimRng,
) -> SelectedActions {
    let mut notes = Vec::new();

    let (actions, source) = if !forced.is_empty() {
        forced.sort_by(|a, b| a.id.cmp(&b.id));
        (forced, DecisionSource::Forced)
    } else {
        let mut decided = None;
        for plugin in plugins.iter_mut() {
            match plugin.decide_actions(world, offers, rng, world.tick_index) {
                Some(actions) if !actions.is_empty() => {
                    decided = Some((actions, DecisionSource::Plugin(plugin.name().to_string())));
                    break;
                }
                _ => {}
            }
        }
        decided.unwrap_or_else(|| (greedy_actions(world, cfg, offers), DecisionSource::Greedy))
    };

    let actions = one_per_actor(actions, &mut notes);
    SelectedActions {
        actions,
        source,
        notes,
    }
}
