//! Atoms
//!
//! Small typed fact records exchanged with belief, affect and ToM collaborators.

use serde::{Deserialize, Serialize};

/// How an atom entered an agent's belief memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Admission {
    /// First-hand observation, never gated
    Observed,
    /// Communicated and accepted by the trust gate
    Accepted,
    /// Communicated, kept but flagged uncertain
    Quarantined,
}

/// Provenance stamped on atoms once they are stored as beliefs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtomOrigin {
    /// Speaker id, or the holder's own id for observations
    pub source: String,
    pub tick: u64,
    pub admission: Admission,
}

/// A small typed fact: `id`, `magnitude`, `confidence` and free-form `meta`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Atom {
    pub id: String,
    #[serde(default)]
    pub magnitude: f64,
    #[serde(default = "default_confidence")]
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<AtomOrigin>,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub meta: serde_json::Value,
}

fn default_confidence() -> f64 {
    1.0
}

impl Atom {
    pub fn new(id: impl Into<String>, magnitude: f64, confidence: f64) -> Self {
        Self {
            id: id.into(),
            magnitude,
            confidence: confidence.clamp(0.0, 1.0),
            origin: None,
            meta: serde_json::Value::Null,
        }
    }

    pub fn with_meta(mut self, meta: serde_json::Value) -> Self {
        self.meta = meta;
        self
    }

    pub fn with_origin(mut self, source: impl Into<String>, tick: u64, admission: Admission) -> Self {
        self.origin = Some(AtomOrigin {
            source: source.into(),
            tick,
            admission,
        });
        self
    }

    /// True when the atom was kept but flagged uncertain.
    pub fn is_quarantined(&self) -> bool {
        matches!(
            self.origin,
            Some(AtomOrigin {
                admission: Admission::Quarantined,
                ..
            })
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_is_clamped() {
        assert_eq!(Atom::new("a", 1.0, 1.7).confidence, 1.0);
        assert_eq!(Atom::new("a", 1.0, -0.2).confidence, 0.0);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let atom: Atom = serde_json::from_str(r#"{"id":"threat:wolf"}"#).unwrap();
        assert_eq!(atom.magnitude, 0.0);
        assert_eq!(atom.confidence, 1.0);
        assert!(atom.origin.is_none());
        assert!(atom.meta.is_null());
    }

    #[test]
    fn test_quarantine_flag() {
        let atom = Atom::new("rumor", 0.5, 0.4).with_origin("bo", 3, Admission::Quarantined);
        assert!(atom.is_quarantined());
        let atom = Atom::new("rumor", 0.5, 0.4).with_origin("bo", 3, Admission::Accepted);
        assert!(!atom.is_quarantined());
    }
}
