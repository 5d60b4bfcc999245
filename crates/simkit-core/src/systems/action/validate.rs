//! Strict Validation
//!
//! Runs V1, V2 and V3 in order. A failure at V1 or V2 degrades the action to
//! `wait`; V3 wraps intent-class actions into a `start_intent`. No action
//! reaches apply any other way.

use simkit_events::{
    generate_action_id, ActionKind, ActionPayload, ActionValidation, SimAction, ValidationOutcome,
};

use crate::actions::{spec_for, ActionCtx, Atomicity, Check};
use crate::error::Result;

/// Exactly one of the three validation outcomes.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationResult {
    /// Allowed; completes this tick as submitted
    Single(SimAction),
    /// Allowed; normalised into this `start_intent`
    Intent(SimAction),
    /// Rejected; `fallback` is always a `wait`
    Disallowed {
        reasons: Vec<String>,
        fallback: SimAction,
    },
}

impl ValidationResult {
    pub fn allowed(&self) -> bool {
        !matches!(self, ValidationResult::Disallowed { .. })
    }

    /// The action that goes to apply.
    pub fn action(&self) -> &SimAction {
        match self {
            ValidationResult::Single(action) | ValidationResult::Intent(action) => action,
            ValidationResult::Disallowed { fallback, .. } => fallback,
        }
    }

    pub fn into_action(self) -> SimAction {
        match self {
            ValidationResult::Single(action) | ValidationResult::Intent(action) => action,
            ValidationResult::Disallowed { fallback, .. } => fallback,
        }
    }

    pub fn reasons(&self) -> &[String] {
        match self {
            ValidationResult::Disallowed { reasons, .. } => reasons,
            _ => &[],
        }
    }

    pub fn outcome(&self) -> ValidationOutcome {
        match self {
            ValidationResult::Single(_) => ValidationOutcome::Single,
            ValidationResult::Intent(_) => ValidationOutcome::Intent,
            ValidationResult::Disallowed { .. } => ValidationOutcome::Disallowed,
        }
    }

    /// Trace entry for the submitted action.
    pub fn to_trace(&self, submitted: &SimAction) -> ActionValidation {
        ActionValidation {
            action_id: submitted.id.clone(),
            actor_id: submitted.actor_id.clone(),
            kind: submitted.kind,
            outcome: self.outcome(),
            reasons: self.reasons().to_vec(),
            applied_kind: self.action().kind,
        }
    }
}

fn disallow(ctx: &ActionCtx, action: &SimAction, reason: String) -> ValidationResult {
    tracing::debug!(
        action = %action.id,
        actor = %action.actor_id,
        kind = %action.kind,
        reason = %reason,
        "action disallowed, falling back to wait"
    );
    ValidationResult::Disallowed {
        reasons: vec![reason],
        fallback: SimAction::wait(ctx.tick(), action.actor_id.clone()),
    }
}

/// Validates one action through all three layers.
///
/// Errors only for contract violations such as an unknown actor id.
pub fn validate_action_strict(ctx: &ActionCtx, action: &SimAction) -> Result<ValidationResult> {
    // unknown actors are a contract violation, not a gameplay failure
    ctx.world.get_char(&action.actor_id)?;

    if !action.kind.allowed_during_intent() && ctx.world.facts.has_intent(&action.actor_id) {
        return Ok(disallow(ctx, action, "intent:active".to_string()));
    }

    let spec = spec_for(action.kind);
    if let Check::Fail(reason) = spec.validate_v1(ctx, action)? {
        return Ok(disallow(ctx, action, reason));
    }
    if let Check::Fail(reason) = spec.validate_v2(ctx, action)? {
        return Ok(disallow(ctx, action, reason));
    }

    match spec.classify_v3(ctx.cfg, action) {
        Atomicity::Single => Ok(ValidationResult::Single(action.clone())),
        Atomicity::Intent { ticks } => {
            let wrapped = SimAction::new(
                generate_action_id(ctx.tick(), &action.actor_id, ActionKind::StartIntent),
                ActionKind::StartIntent,
                action.actor_id.clone(),
            )
            .with_payload(ActionPayload::Intent {
                original: Box::new(action.clone()),
                intent_ticks: ticks,
            });
            Ok(ValidationResult::Intent(wrapped))
        }
    }
}
