//! Intent Engine
//!
//! Committed multi-tick actions. Each actor has at most one open intent,
//! stored under `intent:<actor>`:
//!
//! ```text
//! none --start_intent--> active(remaining) --continue_intent x N--> complete --> none
//!                              |
//!                              +--abort_intent--> aborted --> none
//! ```
//!
//! The wrapped action was validated when the intent started; completion
//! applies it directly without validating again.

use serde::{Deserialize, Serialize};
use serde_json::json;

use simkit_events::{ActionKind, ActionOffer, EventPayload, IntentCompleteEvent, SimAction};

use super::{spec_for, ActionCtx, ActionSpec, ApplyCtx, ApplyOutcome, Check};
use crate::error::Result;
use crate::world::Character;

/// Offer scores while an intent is open
pub mod intent_weights {
    /// Keep going unless something better is forced
    pub const CONTINUE_SCORE: f64 = 0.9;
    pub const ABORT_SCORE: f64 = 0.02;
}

use intent_weights::*;

/// The wrapped action of an intent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentBody {
    pub original_action: SimAction,
}

/// Stored state of an open intent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentRecord {
    pub id: String,
    pub started_at_tick: u64,
    pub remaining_ticks: u32,
    pub intent: IntentBody,
}

/// Generates the id of an intent started by `actor_id` at `tick`.
pub fn generate_intent_id(tick: u64, actor_id: &str) -> String {
    format!("intent:{:06}:{}", tick, actor_id)
}

pub struct StartIntentSpec;

impl ActionSpec for StartIntentSpec {
    fn kind(&self) -> ActionKind {
        ActionKind::StartIntent
    }

    /// Intents start through V3 normalisation, never from an offer.
    fn enumerate(&self, _ctx: &ActionCtx, _actor: &Character) -> Result<Vec<ActionOffer>> {
        Ok(Vec::new())
    }

    fn validate_v1(&self, ctx: &ActionCtx, action: &SimAction) -> Result<Check> {
        let Some((original, _)) = action.intent_original() else {
            return Ok(Check::fail("payload:missing"));
        };
        if original.actor_id != action.actor_id || original.kind.is_intent_control() {
            return Ok(Check::fail("intent:bad_original"));
        }
        if ctx.world.facts.has_intent(&action.actor_id) {
            return Ok(Check::fail("intent:active"));
        }
        spec_for(original.kind).validate_v1(ctx, original)
    }

    fn validate_v2(&self, ctx: &ActionCtx, action: &SimAction) -> Result<Check> {
        match action.intent_original() {
            Some((original, _)) => spec_for(original.kind).validate_v2(ctx, original),
            None => Ok(Check::Pass),
        }
    }

    fn apply(&self, ctx: &mut ApplyCtx, action: &SimAction) -> Result<ApplyOutcome> {
        let Some((original, ticks)) = action.intent_original() else {
            return Ok(ApplyOutcome::noop("start_intent ignored (no payload)"));
        };
        if ctx.world.facts.has_intent(&action.actor_id) {
            return Ok(ApplyOutcome::noop("start_intent ignored (intent already open)"));
        }

        let record = IntentRecord {
            id: generate_intent_id(ctx.seq.tick(), &action.actor_id),
            started_at_tick: ctx.seq.tick(),
            remaining_ticks: ticks.max(1),
            intent: IntentBody {
                original_action: original.clone(),
            },
        };
        ctx.world.facts.set_intent(&action.actor_id, &record)?;

        let details = json!({
            "intent_id": record.id,
            "original": original.kind.as_str(),
            "remaining_ticks": record.remaining_ticks,
        });
        ctx.action_event(action, details).map(ApplyOutcome::with_event)
    }
}

pub struct ContinueIntentSpec;

impl ActionSpec for ContinueIntentSpec {
    fn kind(&self) -> ActionKind {
        ActionKind::ContinueIntent
    }

    fn enumerate(&self, ctx: &ActionCtx, actor: &Character) -> Result<Vec<ActionOffer>> {
        if !ctx.world.facts.has_intent(&actor.id) {
            return Ok(Vec::new());
        }
        Ok(vec![ActionOffer::new(ActionKind::ContinueIntent, actor.id.clone(), CONTINUE_SCORE)])
    }

    fn validate_v1(&self, ctx: &ActionCtx, action: &SimAction) -> Result<Check> {
        if !ctx.world.facts.has_intent(&action.actor_id) {
            return Ok(Check::fail("intent:none"));
        }
        Ok(Check::Pass)
    }

    fn apply(&self, ctx: &mut ApplyCtx, action: &SimAction) -> Result<ApplyOutcome> {
        let Some(mut record) = ctx.world.facts.intent(&action.actor_id) else {
            return Ok(ApplyOutcome::noop("continue_intent ignored (no intent)"));
        };

        record.remaining_ticks = record.remaining_ticks.saturating_sub(1);
        if record.remaining_ticks > 0 {
            ctx.world.facts.set_intent(&action.actor_id, &record)?;
            let details = json!({
                "intent_id": record.id,
                "remaining_ticks": record.remaining_ticks,
            });
            return ctx.action_event(action, details).map(ApplyOutcome::with_event);
        }

        let original = record.intent.original_action;
        let mut outcome = spec_for(original.kind).apply(ctx, &original)?;
        ctx.world.facts.clear_intent(&action.actor_id);

        let loc_id = ctx.world.get_char(&action.actor_id)?.loc_id.clone();
        let complete = ctx.event(EventPayload::IntentComplete(IntentCompleteEvent {
            intent_id: record.id,
            actor_id: action.actor_id.clone(),
            loc_id,
            original,
        }));
        outcome.events.push(complete);
        Ok(outcome)
    }
}

pub struct AbortIntentSpec;

impl ActionSpec for AbortIntentSpec {
    fn kind(&self) -> ActionKind {
        ActionKind::AbortIntent
    }

    fn enumerate(&self, ctx: &ActionCtx, actor: &Character) -> Result<Vec<ActionOffer>> {
        if !ctx.world.facts.has_intent(&actor.id) {
            return Ok(Vec::new());
        }
        Ok(vec![ActionOffer::new(ActionKind::AbortIntent, actor.id.clone(), ABORT_SCORE)])
    }

    fn validate_v1(&self, ctx: &ActionCtx, action: &SimAction) -> Result<Check> {
        if !ctx.world.facts.has_intent(&action.actor_id) {
            return Ok(Check::fail("intent:none"));
        }
        Ok(Check::Pass)
    }

    fn apply(&self, ctx: &mut ApplyCtx, action: &SimAction) -> Result<ApplyOutcome> {
        let record = ctx.world.facts.intent(&action.actor_id);
        ctx.world.facts.clear_intent(&action.actor_id);
        let details = match record {
            Some(r) => json!({ "intent_id": r.id, "remaining_ticks": r.remaining_ticks }),
            None => serde_json::Value::Null,
        };
        ctx.action_event(action, details).map(ApplyOutcome::with_event)
    }
}
