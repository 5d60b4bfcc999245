//! ActionSpec Registry
//!
//! Every [`ActionKind`] has one [`ActionSpec`] implementing the five
//! operations of the pipeline: enumerate, reachability validation (V1),
//! policy validation (V2), atomicity classification (V3) and apply.
//! [`spec_for`] is an exhaustive match, so adding a kind without a spec does
//! not compile.

pub mod basic;
pub mod conflict;
pub mod feature;
pub mod intent;
pub mod movement;
pub mod social;

use serde_json::Value;

use simkit_events::{
    generate_action_id, generate_event_id, ActionEvent, ActionKind, ActionOffer, ActionPayload,
    EventPayload, SimAction, SimEvent, Volume,
};

use crate::config::SimConfig;
use crate::error::Result;
use crate::rng::SimRng;
use crate::spatial::{self, SpatialConfig};
use crate::world::{Character, World};

/// Result of a validation layer. Failing is gameplay, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Check {
    Pass,
    Fail(String),
}

impl Check {
    pub fn fail(reason: impl Into<String>) -> Self {
        Check::Fail(reason.into())
    }

    pub fn is_pass(&self) -> bool {
        matches!(self, Check::Pass)
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Check::Pass => None,
            Check::Fail(reason) => Some(reason),
        }
    }
}

/// How long an action takes to complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Atomicity {
    /// Completes this tick
    Single,
    /// Needs a committed intent of `ticks` continues
    Intent { ticks: u32 },
}

/// Read-only context for enumeration and validation.
#[derive(Debug)]
pub struct ActionCtx<'a> {
    pub world: &'a World,
    pub cfg: &'a SimConfig,
    /// Spatial config with the world's `spatial` fact applied
    pub spatial: SpatialConfig,
}

impl<'a> ActionCtx<'a> {
    pub fn new(world: &'a World, cfg: &'a SimConfig) -> Self {
        Self {
            world,
            cfg,
            spatial: cfg.spatial.effective(world),
        }
    }

    pub fn tick(&self) -> u64 {
        self.world.tick_index
    }
}

/// Sequential event ids within a tick.
#[derive(Debug, Clone, Default)]
pub struct EventSequence {
    tick: u64,
    next: u64,
}

impl EventSequence {
    pub fn new(tick: u64) -> Self {
        Self { tick, next: 0 }
    }

    pub fn generate_id(&mut self) -> String {
        let id = generate_event_id(self.tick, self.next);
        self.next += 1;
        id
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }
}

/// Mutable context handed to `apply`.
pub struct ApplyCtx<'a> {
    pub world: &'a mut World,
    pub rng: &'a mut SimRng,
    pub cfg: &'a SimConfig,
    pub spatial: &'a SpatialConfig,
    pub seq: &'a mut EventSequence,
}

impl ApplyCtx<'_> {
    pub fn event(&mut self, payload: EventPayload) -> SimEvent {
        SimEvent::new(self.seq.generate_id(), self.seq.tick(), payload)
    }

    /// The standard `action:<kind>` record for an applied action.
    pub fn action_event(&mut self, action: &SimAction, details: Value) -> Result<SimEvent> {
        let loc_id = self.world.get_char(&action.actor_id)?.loc_id.clone();
        Ok(self.event(EventPayload::Action(ActionEvent {
            kind: action.kind,
            action_id: action.id.clone(),
            actor_id: action.actor_id.clone(),
            target_id: action.target_id.clone(),
            loc_id,
            details,
        })))
    }
}

/// What an apply produced besides its world mutations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApplyOutcome {
    pub events: Vec<SimEvent>,
    pub notes: Vec<String>,
}

impl ApplyOutcome {
    pub fn with_event(event: SimEvent) -> Self {
        Self {
            events: vec![event],
            notes: Vec::new(),
        }
    }

    /// A gameplay no-op.
    pub fn noop(note: impl Into<String>) -> Self {
        Self {
            events: Vec::new(),
            notes: vec![note.into()],
        }
    }

    pub fn merge(&mut self, other: ApplyOutcome) {
        self.events.extend(other.events);
        self.notes.extend(other.notes);
    }
}

/// The five operations every action kind implements.
pub trait ActionSpec: Sync {
    fn kind(&self) -> ActionKind;

    /// Candidate offers for one actor, before validation.
    fn enumerate(&self, ctx: &ActionCtx, actor: &Character) -> Result<Vec<ActionOffer>>;

    /// Syntax and reachability.
    fn validate_v1(&self, _ctx: &ActionCtx, _action: &SimAction) -> Result<Check> {
        Ok(Check::Pass)
    }

    /// Policy and norms.
    fn validate_v2(&self, _ctx: &ActionCtx, _action: &SimAction) -> Result<Check> {
        Ok(Check::Pass)
    }

    fn classify_v3(&self, _cfg: &SimConfig, _action: &SimAction) -> Atomicity {
        Atomicity::Single
    }

    /// Mutates the world. Only contract violations are errors; gameplay
    /// edge cases come back as no-op notes.
    fn apply(&self, ctx: &mut ApplyCtx, action: &SimAction) -> Result<ApplyOutcome>;
}

/// The spec for a kind.
pub fn spec_for(kind: ActionKind) -> &'static dyn ActionSpec {
    match kind {
        ActionKind::Wait => &basic::WaitSpec,
        ActionKind::Rest => &basic::RestSpec,
        ActionKind::Observe => &basic::ObserveSpec,
        ActionKind::Move => &movement::MoveSpec,
        ActionKind::MoveXy => &movement::MoveXySpec,
        ActionKind::Talk => &social::TalkSpec,
        ActionKind::Help => &social::HelpSpec,
        ActionKind::Attack => &conflict::AttackSpec,
        ActionKind::RepairFeature => &feature::RepairFeatureSpec,
        ActionKind::StartIntent => &intent::StartIntentSpec,
        ActionKind::ContinueIntent => &intent::ContinueIntentSpec,
        ActionKind::AbortIntent => &intent::AbortIntentSpec,
    }
}

/// Turns an offer into a concrete action for the current tick, filling in
/// the default payload a kind needs.
pub fn action_from_offer(world: &World, cfg: &SimConfig, offer: &ActionOffer) -> SimAction {
    let id = generate_action_id(world.tick_index, &offer.actor_id, offer.kind);
    let mut action = SimAction::new(id, offer.kind, offer.actor_id.clone());
    action.target_id = offer.target_id.clone();
    if offer.kind == ActionKind::Talk {
        let mut atoms = world.facts.agent_atoms(&offer.actor_id);
        atoms.truncate(cfg.memory.max_shared_atoms);
        action.payload = Some(ActionPayload::Speech {
            volume: Volume::Normal,
            atoms,
        });
    }
    action
}

/// Intent length for an intent-class action: the kind default unless
/// `meta.intentTicks` overrides it. Never less than one tick.
pub fn intent_ticks(action: &SimAction, default_ticks: u32) -> u32 {
    action
        .meta
        .as_ref()
        .and_then(|m| m.get("intentTicks"))
        .and_then(Value::as_u64)
        .map(|t| u32::try_from(t).unwrap_or(u32::MAX))
        .unwrap_or(default_ticks)
        .max(1)
}

/// Shared V1 for character-targeted kinds: the target exists, is someone
/// else, stands in the same location and within `range`.
pub(crate) fn check_character_target(
    ctx: &ActionCtx,
    action: &SimAction,
    range: f64,
) -> Result<Check> {
    let actor = ctx.world.get_char(&action.actor_id)?;
    let Some(target_id) = action.target_id.as_deref() else {
        return Ok(Check::fail("target:missing"));
    };
    if target_id == actor.id {
        return Ok(Check::fail("target:self"));
    }
    let Some(target) = ctx.world.find_char(target_id) else {
        return Ok(Check::fail("target:unknown"));
    };
    if target.loc_id != actor.loc_id {
        return Ok(Check::fail("target:elsewhere"));
    }
    if spatial::distance(ctx.world, &actor.id, target_id)? > range {
        return Ok(Check::fail("range:too_far"));
    }
    Ok(Check::Pass)
}

/// Other characters sharing the actor's location, in id order.
pub(crate) fn co_located<'a>(world: &'a World, actor: &'a Character) -> Vec<&'a Character> {
    world
        .characters_at(&actor.loc_id)
        .filter(|c| c.id != actor.id)
        .collect()
}
