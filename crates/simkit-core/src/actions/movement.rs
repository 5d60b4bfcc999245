//! Movement Actions
//!
//! `move` walks the coarse location graph, `move_xy` steps inside the
//! current location either to a nav node or to free coordinates.

use serde_json::json;

use simkit_events::{ActionKind, ActionOffer, ActionPayload, SimAction};

use super::{ActionCtx, ActionSpec, ApplyCtx, ApplyOutcome, Check};
use crate::error::Result;
use crate::spatial;
use crate::world::{Character, Pos, World};

/// Offer scores and costs for movement
pub mod movement_weights {
    pub const MOVE_BASE: f64 = 0.1;
    /// Move score per point of danger where the actor stands
    pub const MOVE_DANGER: f64 = 0.4;
    pub const MOVE_ENERGY_COST: f64 = 0.02;
    pub const STEP_SCORE: f64 = 0.08;
    pub const STEP_ENERGY_COST: f64 = 0.01;
}

use movement_weights::*;

pub struct MoveSpec;

impl ActionSpec for MoveSpec {
    fn kind(&self) -> ActionKind {
        ActionKind::Move
    }

    fn enumerate(&self, ctx: &ActionCtx, actor: &Character) -> Result<Vec<ActionOffer>> {
        let location = ctx.world.get_loc(&actor.loc_id)?;
        let score = MOVE_BASE + ctx.world.facts.danger(&actor.id) * MOVE_DANGER;
        Ok(location
            .neighbors
            .iter()
            .map(|to| ActionOffer::new(ActionKind::Move, actor.id.clone(), score).with_target(to.clone()))
            .collect())
    }

    fn validate_v1(&self, ctx: &ActionCtx, action: &SimAction) -> Result<Check> {
        let actor = ctx.world.get_char(&action.actor_id)?;
        let Some(to) = action.target_id.as_deref() else {
            return Ok(Check::fail("target:missing"));
        };
        if ctx.world.find_loc(to).is_none() {
            return Ok(Check::fail("move:unknown_location"));
        }
        if !ctx.world.get_loc(&actor.loc_id)?.is_neighbor(to) {
            return Ok(Check::fail("move:not_neighbor"));
        }
        Ok(Check::Pass)
    }

    fn validate_v2(&self, ctx: &ActionCtx, action: &SimAction) -> Result<Check> {
        let blocked = action
            .target_id
            .as_deref()
            .and_then(|to| ctx.world.find_loc(to))
            .is_some_and(|loc| loc.norm("no_entry") >= ctx.cfg.actions.norm_threshold);
        if blocked {
            return Ok(Check::fail("norm:no_entry"));
        }
        Ok(Check::Pass)
    }

    fn apply(&self, ctx: &mut ApplyCtx, action: &SimAction) -> Result<ApplyOutcome> {
        let Some(to) = action.target_id.clone() else {
            return Ok(ApplyOutcome::noop("move blocked (no destination)"));
        };
        let Some(destination) = ctx.world.find_loc(&to) else {
            return Ok(ApplyOutcome::noop(format!("move blocked (unknown location {})", to)));
        };
        let entry = destination
            .nav
            .nodes
            .first()
            .map(|n| Pos {
                node_id: Some(n.id.clone()),
                x: Some(n.x),
                y: Some(n.y),
            });

        let from = ctx.world.get_char(&action.actor_id)?.loc_id.clone();
        // recorded where the actor left from, so witnesses there see it
        let event = ctx.action_event(action, json!({ "from": from, "to": to }))?;

        let actor = ctx.world.get_char_mut(&action.actor_id)?;
        actor.loc_id = to;
        actor.pos = entry;
        actor.adjust_energy(-MOVE_ENERGY_COST);
        Ok(ApplyOutcome::with_event(event))
    }
}

pub struct MoveXySpec;

/// Where a `move_xy` goes: a nav node or free coordinates.
fn step_target(world: &World, action: &SimAction) -> Result<std::result::Result<Pos, &'static str>> {
    let actor = world.get_char(&action.actor_id)?;
    let location = world.get_loc(&actor.loc_id)?;

    if let Some(node_id) = action.target_id.as_deref() {
        let Some(node) = location.nav.node(node_id) else {
            return Ok(Err("nav:unknown_node"));
        };
        let current = actor.pos.as_ref().and_then(|p| p.node_id.as_deref());
        if let Some(current) = current {
            if current != node_id && !location.nav.has_edge(current, node_id) {
                return Ok(Err("nav:no_edge"));
            }
        }
        return Ok(Ok(Pos {
            node_id: Some(node.id.clone()),
            x: Some(node.x),
            y: Some(node.y),
        }));
    }

    match &action.payload {
        Some(ActionPayload::Step { x, y }) if x.is_finite() && y.is_finite() => {
            if let Some(map) = &location.map {
                if *x < 0.0 || *y < 0.0 || *x > map.width || *y > map.height {
                    return Ok(Err("move:out_of_bounds"));
                }
            }
            Ok(Ok(Pos::at(*x, *y)))
        }
        Some(ActionPayload::Step { .. }) => Ok(Err("move:bad_step")),
        _ => Ok(Err("target:missing")),
    }
}

impl ActionSpec for MoveXySpec {
    fn kind(&self) -> ActionKind {
        ActionKind::MoveXy
    }

    fn enumerate(&self, ctx: &ActionCtx, actor: &Character) -> Result<Vec<ActionOffer>> {
        let location = ctx.world.get_loc(&actor.loc_id)?;
        let current = actor.pos.as_ref().and_then(|p| p.node_id.as_deref());
        let candidates: Vec<&str> = match current {
            Some(node_id) => location
                .nav
                .adjacent(node_id)
                .into_iter()
                .map(|n| n.id.as_str())
                .collect(),
            None => location.nav.nodes.iter().map(|n| n.id.as_str()).collect(),
        };
        Ok(candidates
            .into_iter()
            .map(|node| {
                ActionOffer::new(ActionKind::MoveXy, actor.id.clone(), STEP_SCORE).with_target(node)
            })
            .collect())
    }

    fn validate_v1(&self, ctx: &ActionCtx, action: &SimAction) -> Result<Check> {
        let to = match step_target(ctx.world, action)? {
            Ok(pos) => pos,
            Err(reason) => return Ok(Check::fail(reason)),
        };
        let (x, y) = to.xy().unwrap_or_default();
        if spatial::distance_to_point(ctx.world, &action.actor_id, x, y)? > ctx.cfg.actions.move_max_delta {
            return Ok(Check::fail("move:too_far"));
        }
        Ok(Check::Pass)
    }

    fn apply(&self, ctx: &mut ApplyCtx, action: &SimAction) -> Result<ApplyOutcome> {
        let to = match step_target(ctx.world, action)? {
            Ok(pos) => pos,
            Err(reason) => return Ok(ApplyOutcome::noop(format!("move_xy blocked ({})", reason))),
        };
        let event = ctx.action_event(
            action,
            json!({ "node_id": to.node_id, "x": to.x, "y": to.y }),
        )?;
        let actor = ctx.world.get_char_mut(&action.actor_id)?;
        actor.pos = Some(to);
        actor.adjust_energy(-STEP_ENERGY_COST);
        Ok(ApplyOutcome::with_event(event))
    }
}
