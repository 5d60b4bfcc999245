//! Feature Actions
//!
//! Repair work on location fixtures. Repairs take several ticks, so V3
//! classifies them as intents and their effects only land on completion.

use serde_json::json;

use simkit_events::{ActionKind, ActionOffer, SimAction};

use super::{intent_ticks, ActionCtx, ActionSpec, ApplyCtx, ApplyOutcome, Atomicity, Check};
use crate::config::SimConfig;
use crate::error::Result;
use crate::spatial;
use crate::world::{clamp01, Character};

/// Offer scores and effect sizes for repairs
pub mod repair_weights {
    /// Repair score per point of missing integrity
    pub const REPAIR_NEED: f64 = 0.6;
    pub const INTEGRITY_GAIN: f64 = 0.35;
    pub const ENERGY_COST: f64 = 0.15;
    pub const HEALTH_COST: f64 = 0.02;
}

use repair_weights::*;

pub struct RepairFeatureSpec;

impl ActionSpec for RepairFeatureSpec {
    fn kind(&self) -> ActionKind {
        ActionKind::RepairFeature
    }

    fn enumerate(&self, ctx: &ActionCtx, actor: &Character) -> Result<Vec<ActionOffer>> {
        let location = ctx.world.get_loc(&actor.loc_id)?;
        Ok(location
            .features
            .iter()
            .filter(|f| f.integrity < 1.0)
            .map(|f| {
                let score = (1.0 - f.integrity) * REPAIR_NEED;
                ActionOffer::new(ActionKind::RepairFeature, actor.id.clone(), score).with_target(f.id.clone())
            })
            .collect())
    }

    fn validate_v1(&self, ctx: &ActionCtx, action: &SimAction) -> Result<Check> {
        let actor = ctx.world.get_char(&action.actor_id)?;
        let Some(feature_id) = action.target_id.as_deref() else {
            return Ok(Check::fail("target:missing"));
        };
        let Some(feature) = ctx.world.get_loc(&actor.loc_id)?.feature(feature_id) else {
            return Ok(Check::fail("feature:unknown"));
        };
        let d = spatial::distance_to_point(ctx.world, &actor.id, feature.x, feature.y)?;
        if d > ctx.cfg.actions.repair_range {
            return Ok(Check::fail("range:too_far"));
        }
        Ok(Check::Pass)
    }

    fn validate_v2(&self, ctx: &ActionCtx, action: &SimAction) -> Result<Check> {
        if ctx.world.get_char(&action.actor_id)?.energy < ctx.cfg.actions.min_repair_energy {
            return Ok(Check::fail("fatigue:exhausted"));
        }
        Ok(Check::Pass)
    }

    fn classify_v3(&self, cfg: &SimConfig, action: &SimAction) -> Atomicity {
        Atomicity::Intent {
            ticks: intent_ticks(action, cfg.actions.repair_intent_ticks),
        }
    }

    fn apply(&self, ctx: &mut ApplyCtx, action: &SimAction) -> Result<ApplyOutcome> {
        let loc_id = ctx.world.get_char(&action.actor_id)?.loc_id.clone();
        let Some(feature_id) = action.target_id.as_deref() else {
            return Ok(ApplyOutcome::noop("repair blocked (no feature)"));
        };

        let location = ctx.world.get_loc_mut(&loc_id)?;
        let Some(feature) = location.feature_mut(feature_id) else {
            return Ok(ApplyOutcome::noop(format!(
                "repair blocked (feature {} not in {})",
                feature_id, loc_id
            )));
        };
        feature.integrity = clamp01(feature.integrity + INTEGRITY_GAIN);
        let integrity = feature.integrity;

        let actor = ctx.world.get_char_mut(&action.actor_id)?;
        actor.adjust_energy(-ENERGY_COST);
        actor.adjust_health(-HEALTH_COST);

        ctx.action_event(action, json!({ "integrity": integrity }))
            .map(ApplyOutcome::with_event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::test_support::{apply, v1, v2, yard};
    use serde_json::json;

    fn repair() -> SimAction {
        SimAction::new("r", ActionKind::RepairFeature, "ada").with_target("well")
    }

    #[test]
    fn test_repair_is_an_intent() {
        let cfg = SimConfig::default();
        assert_eq!(
            RepairFeatureSpec.classify_v3(&cfg, &repair()),
            Atomicity::Intent { ticks: 3 }
        );
        let quick = repair().with_meta(json!({"intentTicks": 1}));
        assert_eq!(
            RepairFeatureSpec.classify_v3(&cfg, &quick),
            Atomicity::Intent { ticks: 1 }
        );
    }

    #[test]
    fn test_repair_checks() {
        let mut world = yard();
        assert!(v1(&world, &repair()).is_pass());
        let missing = SimAction::new("r", ActionKind::RepairFeature, "ada").with_target("gate");
        assert_eq!(v1(&world, &missing), Check::fail("feature:unknown"));

        world.get_char_mut("ada").unwrap().energy = 0.05;
        assert_eq!(v2(&world, &repair()), Check::fail("fatigue:exhausted"));
    }

    #[test]
    fn test_repair_effects() {
        let mut world = yard();
        apply(&mut world, &repair());
        let well = world.get_loc("yard").unwrap().feature("well").unwrap().integrity;
        assert!((well - 0.55).abs() < 1e-9);
        let ada = world.get_char("ada").unwrap();
        assert!((ada.energy - 0.85).abs() < 1e-9);
        assert!((ada.health - 0.98).abs() < 1e-9);
    }
}
