//! Action Execution
//!
//! Validates and applies the selected actions one actor at a time, in actor
//! id order. Events emitted by apply are queued on the world for the
//! perception pass.

use simkit_events::{ActionValidation, SimAction};

use crate::actions::{spec_for, ActionCtx, ApplyCtx, EventSequence};
use crate::config::SimConfig;
use crate::error::Result;
use crate::rng::SimRng;
use crate::spatial::SpatialConfig;
use crate::world::World;

use super::validate::validate_action_strict;

/// What execution did this tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionReport {
    /// Actions that reached apply, after normalisation or fallback
    pub applied: Vec<SimAction>,
    pub validations: Vec<ActionValidation>,
    pub notes: Vec<String>,
}

/// Runs every action through strict validation and applies the result.
pub fn execute_actions(
    world: &mut World,
    actions: &[SimAction],
    cfg: &SimConfig,
    spatial: &SpatialConfig,
    rng: &mut SimRng,
    seq: &mut EventSequence,
) -> Result<ExecutionReport> {
    let mut report = ExecutionReport::default();

    for submitted in actions {
        let result = {
            let ctx = ActionCtx {
                world: &*world,
                cfg,
                spatial: spatial.clone(),
            };
            validate_action_strict(&ctx, submitted)?
        };
        report.validations.push(result.to_trace(submitted));
        let action = result.into_action();

        let outcome = {
            let mut ctx = ApplyCtx {
                world: &mut *world,
                rng: &mut *rng,
                cfg,
                spatial,
                seq: &mut *seq,
            };
            spec_for(action.kind).apply(&mut ctx, &action)?
        };

        for note in &outcome.notes {
            tracing::debug!(action = %action.id, actor = %action.actor_id, note = %note, "apply note");
        }
        report.notes.extend(outcome.notes);
        world.events.extend(outcome.events);
        world.facts.set_last_action(&action.actor_id, action.kind);
        report.applied.push(action);
    }

    Ok(report)
}
