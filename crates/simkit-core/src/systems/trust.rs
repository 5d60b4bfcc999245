//! Trust / Acceptance Gate
//!
//! Decides whether a communicated atom enters the listener's belief memory.
//! Dyadic trust, state-vector compatibility, the atom's own confidence, an
//! attentiveness boost and a stress penalty are blended into one score and
//! passed through a sharpened sigmoid.

use serde::{Deserialize, Serialize};

use simkit_events::{ActionKind, Atom};

use crate::error::Result;
use crate::world::World;

/// Weights and thresholds of the acceptance gate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AcceptanceConfig {
    /// Probability at or above which an atom is accepted
    pub accept_threshold: f64,
    /// Probability below which an atom is rejected
    pub reject_threshold: f64,
    pub w_trust: f64,
    pub w_compat: f64,
    pub w_confidence: f64,
    /// Added when the listener's last action was `observe`
    pub observe_boost: f64,
    /// Multiplied by listener stress and subtracted
    pub stress_penalty: f64,
    /// Sigmoid steepness around 0.5
    pub sharpness: f64,
    /// Trust assumed when no `trust:<a>:<b>` fact exists
    pub default_trust: f64,
    /// Compatibility assumed when state vectors are missing or unusable
    pub default_compat: f64,
}

impl Default for AcceptanceConfig {
    fn default() -> Self {
        Self {
            accept_threshold: 0.62,
            reject_threshold: 0.32,
            w_trust: 0.45,
            w_compat: 0.25,
            w_confidence: 0.30,
            observe_boost: 0.15,
            stress_penalty: 0.25,
            sharpness: 6.0,
            default_trust: 0.5,
            default_compat: 0.6,
        }
    }
}

/// Outcome of the gate for one atom
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AcceptanceDecision {
    Accept,
    /// Kept but flagged uncertain, with its confidence scaled by `p`
    Quarantine { confidence: f64 },
    Reject,
}

/// Everything the gate looked at, for tracing and tests
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Acceptance {
    pub trust: f64,
    pub compat: f64,
    pub base: f64,
    pub p: f64,
    pub decision: AcceptanceDecision,
}

pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Cosine similarity mapped from `[-1, 1]` to `[0, 1]`.
///
/// `None` when either vector is empty, the lengths differ or a norm is zero.
pub fn cosine_compat(a: &[f64], b: &[f64]) -> Option<f64> {
    if a.is_empty() || a.len() != b.len() {
        return None;
    }
    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let na = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let nb = b.iter().map(|x| x * x).sum::<f64>().sqrt();
    if na == 0.0 || nb == 0.0 {
        return None;
    }
    let cos = (dot / (na * nb)).clamp(-1.0, 1.0);
    Some((cos + 1.0) / 2.0)
}

impl AcceptanceConfig {
    /// Maps a probability to a decision.
    pub fn decide(&self, p: f64, confidence: f64) -> AcceptanceDecision {
        if p >= self.accept_threshold {
            AcceptanceDecision::Accept
        } else if p >= self.reject_threshold {
            AcceptanceDecision::Quarantine {
                confidence: (confidence * p).clamp(0.0, 1.0),
            }
        } else {
            AcceptanceDecision::Reject
        }
    }
}

/// Runs the gate for an atom `listener` received from `speaker`.
pub fn evaluate(
    world: &World,
    listener: &str,
    speaker: &str,
    atom: &Atom,
    cfg: &AcceptanceConfig,
) -> Result<Acceptance> {
    let listener_char = world.get_char(listener)?;

    let trust = world
        .facts
        .trust(listener, speaker)
        .map(|t| t.clamp(0.0, 1.0))
        .unwrap_or(cfg.default_trust);

    let compat = match (
        world.facts.state_vector(listener),
        world.facts.state_vector(speaker),
    ) {
        (Some(a), Some(b)) => cosine_compat(&a, &b).unwrap_or(cfg.default_compat),
        _ => cfg.default_compat,
    };

    let boost = if world.facts.last_action(listener) == Some(ActionKind::Observe) {
        cfg.observe_boost
    } else {
        0.0
    };

    let base = cfg.w_trust * trust + cfg.w_compat * compat + cfg.w_confidence * atom.confidence
        + boost
        - cfg.stress_penalty * listener_char.stress;
    let p = sigmoid(cfg.sharpness * (base - 0.5));

    Ok(Acceptance {
        trust,
        compat,
        base,
        p,
        decision: cfg.decide(p, atom.confidence),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{Character, Location};

    fn pair() -> World {
        let mut world = World::new(0);
        world.add_location(Location::new("yard", "Yard"));
        world.add_character(Character::new("ada", "Ada", "yard"));
        world.add_character(Character::new("bo", "Bo", "yard"));
        world
    }

    #[test]
    fn test_cosine_compat() {
        assert_eq!(cosine_compat(&[1.0, 0.0], &[1.0, 0.0]), Some(1.0));
        assert_eq!(cosine_compat(&[1.0, 0.0], &[-1.0, 0.0]), Some(0.0));
        assert_eq!(cosine_compat(&[1.0, 0.0], &[0.0, 1.0]), Some(0.5));
        assert_eq!(cosine_compat(&[1.0], &[1.0, 0.0]), None);
        assert_eq!(cosine_compat(&[0.0, 0.0], &[1.0, 0.0]), None);
        assert_eq!(cosine_compat(&[], &[]), None);
    }

    #[test]
    fn test_decision_thresholds() {
        let cfg = AcceptanceConfig::default();
        assert_eq!(cfg.decide(0.62, 1.0), AcceptanceDecision::Accept);
        assert_eq!(cfg.decide(0.319, 1.0), AcceptanceDecision::Reject);
        match cfg.decide(0.5, 0.8) {
            AcceptanceDecision::Quarantine { confidence } => {
                assert!((confidence - 0.4).abs() < 1e-9)
            }
            other => panic!("expected quarantine, got {:?}", other),
        }
        assert!(matches!(
            cfg.decide(0.32, 1.0),
            AcceptanceDecision::Quarantine { .. }
        ));
    }

    #[test]
    fn test_defaults_accept_confident_atom() {
        // 0.45*0.5 + 0.25*0.6 + 0.30*1.0 = 0.675, p = sigmoid(1.05) ~ 0.74
        let world = pair();
        let result = evaluate(
            &world,
            "ada",
            "bo",
            &Atom::new("news", 1.0, 1.0),
            &AcceptanceConfig::default(),
        )
        .unwrap();
        assert_eq!(result.trust, 0.5);
        assert_eq!(result.compat, 0.6);
        assert!((result.base - 0.675).abs() < 1e-9);
        assert!(result.p > 0.73 && result.p < 0.75);
        assert_eq!(result.decision, AcceptanceDecision::Accept);
    }

    #[test]
    fn test_distrust_and_stress_reject() {
        let mut world = pair();
        world.facts.set_trust("ada", "bo", 0.0);
        world.facts.set_state_vector("ada", &[1.0, 0.0]);
        world.facts.set_state_vector("bo", &[-1.0, 0.0]);
        world.get_char_mut("ada").unwrap().stress = 1.0;
        let result = evaluate(
            &world,
            "ada",
            "bo",
            &Atom::new("rumor", 1.0, 0.5),
            &AcceptanceConfig::default(),
        )
        .unwrap();
        assert_eq!(result.compat, 0.0);
        assert_eq!(result.decision, AcceptanceDecision::Reject);
    }

    #[test]
    fn test_observe_boost_lifts_quarantine_to_accept() {
        // base without boost = 0.225 + 0.15 + 0.15 = 0.525, p ~ 0.537
        let mut world = pair();
        let atom = Atom::new("rumor", 1.0, 0.5);
        let cfg = AcceptanceConfig::default();

        let plain = evaluate(&world, "ada", "bo", &atom, &cfg).unwrap();
        assert!(matches!(plain.decision, AcceptanceDecision::Quarantine { .. }));

        world.facts.set_last_action("ada", ActionKind::Observe);
        let boosted = evaluate(&world, "ada", "bo", &atom, &cfg).unwrap();
        assert_eq!(boosted.decision, AcceptanceDecision::Accept);
    }

    #[test]
    fn test_unknown_listener_is_an_error() {
        let world = pair();
        assert!(evaluate(
            &world,
            "zed",
            "bo",
            &Atom::new("x", 0.0, 1.0),
            &AcceptanceConfig::default()
        )
        .is_err());
    }
}
