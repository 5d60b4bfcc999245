//! Conflict Actions

use serde_json::json;

use simkit_events::{ActionKind, ActionOffer, SimAction};

use super::{check_character_target, co_located, ActionCtx, ActionSpec, ApplyCtx, ApplyOutcome, Check};
use crate::error::Result;
use crate::world::Character;

/// Offer scores and effect sizes for attacks
pub mod conflict_weights {
    pub const ATTACK_BASE: f64 = 0.05;
    /// Attack score per point of actor stress
    pub const ATTACK_STRESS: f64 = 0.4;
    /// Minimum health damage
    pub const DAMAGE_BASE: f64 = 0.15;
    /// Random extra damage, scaled by a draw in [0, 1)
    pub const DAMAGE_SPREAD: f64 = 0.05;
    pub const TARGET_STRESS: f64 = 0.2;
    pub const ATTACKER_ENERGY_COST: f64 = 0.05;
    pub const ATTACKER_STRESS: f64 = 0.05;
}

use conflict_weights::*;

pub struct AttackSpec;

impl ActionSpec for AttackSpec {
    fn kind(&self) -> ActionKind {
        ActionKind::Attack
    }

    fn enumerate(&self, ctx: &ActionCtx, actor: &Character) -> Result<Vec<ActionOffer>> {
        let score = ATTACK_BASE + actor.stress * ATTACK_STRESS;
        Ok(co_located(ctx.world, actor)
            .into_iter()
            .map(|t| ActionOffer::new(ActionKind::Attack, actor.id.clone(), score).with_target(t.id.clone()))
            .collect())
    }

    fn validate_v1(&self, ctx: &ActionCtx, action: &SimAction) -> Result<Check> {
        check_character_target(ctx, action, ctx.cfg.actions.attack_range)
    }

    fn validate_v2(&self, ctx: &ActionCtx, action: &SimAction) -> Result<Check> {
        let actor = ctx.world.get_char(&action.actor_id)?;
        let location = ctx.world.get_loc(&actor.loc_id)?;
        if location.norm("no_violence") >= ctx.cfg.actions.no_violence_threshold {
            return Ok(Check::fail("norm:no_violence"));
        }
        Ok(Check::Pass)
    }

    fn apply(&self, ctx: &mut ApplyCtx, action: &SimAction) -> Result<ApplyOutcome> {
        let Some(target_id) = action
            .target_id
            .as_deref()
            .filter(|t| ctx.world.find_char(t).is_some())
        else {
            return Ok(ApplyOutcome::noop("attack blocked (no target)"));
        };

        let damage = DAMAGE_BASE + ctx.rng.next() * DAMAGE_SPREAD;
        let target = ctx.world.get_char_mut(target_id)?;
        target.adjust_health(-damage);
        target.adjust_stress(TARGET_STRESS);
        let health = target.health;

        let actor = ctx.world.get_char_mut(&action.actor_id)?;
        actor.adjust_energy(-ATTACKER_ENERGY_COST);
        actor.adjust_stress(ATTACKER_STRESS);

        ctx.action_event(action, json!({ "damage": damage, "target_health": health }))
            .map(ApplyOutcome::with_event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::test_support::{apply, v1, v2, yard};

    fn attack() -> SimAction {
        SimAction::new("x", ActionKind::Attack, "ada").with_target("bo")
    }

    #[test]
    fn test_attack_damage_is_bounded() {
        let mut world = yard();
        apply(&mut world, &attack());
        let bo = world.get_char("bo").unwrap();
        assert!(bo.health <= 0.85 && bo.health > 0.8);
        assert!((bo.stress - 0.2).abs() < 1e-9);
        let ada = world.get_char("ada").unwrap();
        assert!((ada.energy - 0.95).abs() < 1e-9);
        assert!((ada.stress - 0.05).abs() < 1e-9);
    }

    #[test]
    fn test_no_violence_norm_blocks() {
        let mut world = yard();
        assert!(v2(&world, &attack()).is_pass());
        world.get_loc_mut("yard").unwrap().norms.insert("no_violence".into(), 0.9);
        assert_eq!(v2(&world, &attack()), Check::fail("norm:no_violence"));
    }

    #[test]
    fn test_attack_out_of_range() {
        let mut world = yard();
        world.get_char_mut("bo").unwrap().pos = Some(crate::world::Pos::at(100.0, 0.0));
        assert_eq!(v1(&world, &attack()), Check::fail("range:too_far"));
    }

    #[test]
    fn test_attack_without_target_is_a_noop() {
        let mut world = yard();
        let before = world.clone();
        let out = apply(&mut world, &SimAction::new("x", ActionKind::Attack, "ada"));
        assert_eq!(out.notes, vec!["attack blocked (no target)"]);
        assert_eq!(world, before);
    }
}
