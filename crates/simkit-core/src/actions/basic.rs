//! Basic Actions
//!
//! `wait`, `rest` and `observe`: untargeted actions that never leave the
//! actor's spot.

use serde_json::json;

use simkit_events::{ActionKind, ActionOffer, SimAction};

use super::{ActionCtx, ActionSpec, ApplyCtx, ApplyOutcome, Check};
use crate::error::Result;
use crate::world::Character;

/// Offer scores and effect sizes for basic actions
pub mod basic_weights {
    /// Score of the always-available fallback
    pub const WAIT_SCORE: f64 = 0.05;
    /// Rest score before the fatigue term
    pub const REST_BASE: f64 = 0.1;
    /// Rest score per point of missing energy
    pub const REST_FATIGUE: f64 = 0.5;
    pub const REST_ENERGY_GAIN: f64 = 0.2;
    pub const REST_STRESS_RELIEF: f64 = 0.05;
    pub const OBSERVE_BASE: f64 = 0.15;
    /// Observe score per point of local danger
    pub const OBSERVE_DANGER: f64 = 0.3;
}

use basic_weights::*;

pub struct WaitSpec;

impl ActionSpec for WaitSpec {
    fn kind(&self) -> ActionKind {
        ActionKind::Wait
    }

    fn enumerate(&self, _ctx: &ActionCtx, actor: &Character) -> Result<Vec<ActionOffer>> {
        Ok(vec![ActionOffer::new(ActionKind::Wait, actor.id.clone(), WAIT_SCORE)])
    }

    fn apply(&self, _ctx: &mut ApplyCtx, _action: &SimAction) -> Result<ApplyOutcome> {
        Ok(ApplyOutcome::default())
    }
}

pub struct RestSpec;

impl ActionSpec for RestSpec {
    fn kind(&self) -> ActionKind {
        ActionKind::Rest
    }

    fn enumerate(&self, _ctx: &ActionCtx, actor: &Character) -> Result<Vec<ActionOffer>> {
        let score = REST_BASE + (1.0 - actor.energy) * REST_FATIGUE;
        Ok(vec![ActionOffer::new(ActionKind::Rest, actor.id.clone(), score)])
    }

    fn validate_v2(&self, ctx: &ActionCtx, action: &SimAction) -> Result<Check> {
        if ctx.world.facts.danger(&action.actor_id) >= ctx.cfg.actions.rest_max_danger {
            return Ok(Check::fail("danger:too_high"));
        }
        Ok(Check::Pass)
    }

    fn apply(&self, ctx: &mut ApplyCtx, action: &SimAction) -> Result<ApplyOutcome> {
        let actor = ctx.world.get_char_mut(&action.actor_id)?;
        actor.adjust_energy(REST_ENERGY_GAIN);
        actor.adjust_stress(-REST_STRESS_RELIEF);
        let energy = actor.energy;
        ctx.action_event(action, json!({ "energy": energy })).map(ApplyOutcome::with_event)
    }
}

pub struct ObserveSpec;

impl ActionSpec for ObserveSpec {
    fn kind(&self) -> ActionKind {
        ActionKind::Observe
    }

    fn enumerate(&self, ctx: &ActionCtx, actor: &Character) -> Result<Vec<ActionOffer>> {
        let score = OBSERVE_BASE + ctx.world.facts.danger(&actor.id) * OBSERVE_DANGER;
        Ok(vec![ActionOffer::new(ActionKind::Observe, actor.id.clone(), score)])
    }

    fn apply(&self, ctx: &mut ApplyCtx, action: &SimAction) -> Result<ApplyOutcome> {
        ctx.action_event(action, serde_json::Value::Null).map(ApplyOutcome::with_event)
    }
}
