//! Social Actions
//!
//! `talk` shares atoms with whoever can hear it; `help` patches up a nearby
//! character at some cost to the helper.

use serde_json::json;

use simkit_events::{ActionKind, ActionOffer, EventPayload, SimAction, SpeechEvent, Volume};

use super::{check_character_target, co_located, ActionCtx, ActionSpec, ApplyCtx, ApplyOutcome, Check};
use crate::error::Result;
use crate::world::Character;

/// Offer scores and effect sizes for social actions
pub mod social_weights {
    pub const TALK_BASE: f64 = 0.2;
    /// Extra talk score when the actor has something to share
    pub const TALK_HAS_NEWS: f64 = 0.1;
    pub const HELP_BASE: f64 = 0.1;
    /// Help score per point of the target's missing health
    pub const HELP_NEED: f64 = 0.6;
    pub const HELP_HEALTH_GAIN: f64 = 0.1;
    pub const HELP_STRESS_RELIEF: f64 = 0.1;
    pub const HELP_ENERGY_COST: f64 = 0.05;
}

use social_weights::*;

pub struct TalkSpec;

impl ActionSpec for TalkSpec {
    fn kind(&self) -> ActionKind {
        ActionKind::Talk
    }

    fn enumerate(&self, ctx: &ActionCtx, actor: &Character) -> Result<Vec<ActionOffer>> {
        let mut score = TALK_BASE;
        if !ctx.world.facts.agent_atoms(&actor.id).is_empty() {
            score += TALK_HAS_NEWS;
        }
        Ok(co_located(ctx.world, actor)
            .into_iter()
            .map(|t| ActionOffer::new(ActionKind::Talk, actor.id.clone(), score).with_target(t.id.clone()))
            .collect())
    }

    fn validate_v1(&self, ctx: &ActionCtx, action: &SimAction) -> Result<Check> {
        check_character_target(ctx, action, ctx.cfg.actions.talk_range)
    }

    fn validate_v2(&self, ctx: &ActionCtx, action: &SimAction) -> Result<Check> {
        let actor = ctx.world.get_char(&action.actor_id)?;
        let location = ctx.world.get_loc(&actor.loc_id)?;
        let volume = action.speech().map(|(v, _)| v).unwrap_or_default();
        if volume != Volume::Whisper && location.norm("silence") >= ctx.cfg.actions.norm_threshold {
            return Ok(Check::fail("norm:silence"));
        }
        Ok(Check::Pass)
    }

    fn apply(&self, ctx: &mut ApplyCtx, action: &SimAction) -> Result<ApplyOutcome> {
        let target_present = action
            .target_id
            .as_deref()
            .is_some_and(|t| ctx.world.find_char(t).is_some());
        if !target_present {
            return Ok(ApplyOutcome::noop("talk blocked (no target)"));
        }

        let (volume, atoms) = action
            .speech()
            .map(|(v, atoms)| (v, atoms.to_vec()))
            .unwrap_or_default();
        let loc_id = ctx.world.get_char(&action.actor_id)?.loc_id.clone();

        let talk = ctx.action_event(
            action,
            json!({ "volume": volume.to_string(), "atoms": atoms.len() }),
        )?;
        let speech = ctx.event(EventPayload::Speech(SpeechEvent {
            speaker_id: action.actor_id.clone(),
            target_id: action.target_id.clone(),
            loc_id,
            volume,
            atoms,
        }));
        Ok(ApplyOutcome {
            events: vec![talk, speech],
            notes: Vec::new(),
        })
    }
}

pub struct HelpSpec;

impl ActionSpec for HelpSpec {
    fn kind(&self) -> ActionKind {
        ActionKind::Help
    }

    fn enumerate(&self, ctx: &ActionCtx, actor: &Character) -> Result<Vec<ActionOffer>> {
        Ok(co_located(ctx.world, actor)
            .into_iter()
            .map(|t| {
                let score = HELP_BASE + (1.0 - t.health) * HELP_NEED;
                ActionOffer::new(ActionKind::Help, actor.id.clone(), score).with_target(t.id.clone())
            })
            .collect())
    }

    fn validate_v1(&self, ctx: &ActionCtx, action: &SimAction) -> Result<Check> {
        check_character_target(ctx, action, ctx.cfg.actions.help_range)
    }

    fn apply(&self, ctx: &mut ApplyCtx, action: &SimAction) -> Result<ApplyOutcome> {
        let Some(target_id) = action
            .target_id
            .as_deref()
            .filter(|t| ctx.world.find_char(t).is_some())
        else {
            return Ok(ApplyOutcome::noop("help blocked (no target)"));
        };

        let target = ctx.world.get_char_mut(target_id)?;
        target.adjust_health(HELP_HEALTH_GAIN);
        target.adjust_stress(-HELP_STRESS_RELIEF);
        let health = target.health;
        ctx.world
            .get_char_mut(&action.actor_id)?
            .adjust_energy(-HELP_ENERGY_COST);

        ctx.action_event(action, json!({ "target_health": health }))
            .map(ApplyOutcome::with_event)
    }
}
