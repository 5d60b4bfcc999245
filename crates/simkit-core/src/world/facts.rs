//! Namespaced fact store.
//!
//! Facts are JSON values under stable string keys shared with external
//! belief, affect and ToM collaborators. Inside the engine every key is a
//! [`FactKey`] and every namespace the engine owns has a typed accessor;
//! keys it does not recognise round-trip untouched as [`FactKey::Other`].

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use simkit_events::{ActionKind, Atom};

use crate::actions::intent::IntentRecord;
use crate::error::{Result, SimError};

/// Typed form of a fact key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FactKey {
    /// `ctx:danger:<id>`
    Danger(String),
    /// `ctx:privacy:<id>`
    Privacy(String),
    /// `intent:<id>`
    Intent(String),
    /// `lastAction:<id>`
    LastAction(String),
    /// `agentAtoms:<id>`, atoms an agent is willing to share
    AgentAtoms(String),
    /// `inboxAtoms`, undelivered atoms keyed by recipient
    InboxAtoms,
    /// `mem:beliefAtoms:<id>`
    BeliefAtoms(String),
    /// `spatial`, partial override of the spatial config
    Spatial,
    /// `trust:<observer>:<target>`
    Trust { observer: String, target: String },
    /// `vec:<id>`, state vector used for compatibility
    StateVector(String),
    Other(String),
}

impl FactKey {
    pub fn danger(id: &str) -> Self {
        FactKey::Danger(id.to_string())
    }

    pub fn privacy(id: &str) -> Self {
        FactKey::Privacy(id.to_string())
    }

    pub fn intent(id: &str) -> Self {
        FactKey::Intent(id.to_string())
    }

    pub fn last_action(id: &str) -> Self {
        FactKey::LastAction(id.to_string())
    }

    pub fn agent_atoms(id: &str) -> Self {
        FactKey::AgentAtoms(id.to_string())
    }

    pub fn belief_atoms(id: &str) -> Self {
        FactKey::BeliefAtoms(id.to_string())
    }

    pub fn trust(observer: &str, target: &str) -> Self {
        FactKey::Trust {
            observer: observer.to_string(),
            target: target.to_string(),
        }
    }

    pub fn state_vector(id: &str) -> Self {
        FactKey::StateVector(id.to_string())
    }
}

impl fmt::Display for FactKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FactKey::Danger(id) => write!(f, "ctx:danger:{}", id),
            FactKey::Privacy(id) => write!(f, "ctx:privacy:{}", id),
            FactKey::Intent(id) => write!(f, "intent:{}", id),
            FactKey::LastAction(id) => write!(f, "lastAction:{}", id),
            FactKey::AgentAtoms(id) => write!(f, "agentAtoms:{}", id),
            FactKey::InboxAtoms => f.write_str("inboxAtoms"),
            FactKey::BeliefAtoms(id) => write!(f, "mem:beliefAtoms:{}", id),
            FactKey::Spatial => f.write_str("spatial"),
            FactKey::Trust { observer, target } => write!(f, "trust:{}:{}", observer, target),
            FactKey::StateVector(id) => write!(f, "vec:{}", id),
            FactKey::Other(raw) => f.write_str(raw),
        }
    }
}

impl FromStr for FactKey {
    type Err = Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let id = |prefix: &str| {
            s.strip_prefix(prefix)
                .filter(|rest| !rest.is_empty())
                .map(str::to_string)
        };

        let key = match s {
            "inboxAtoms" => FactKey::InboxAtoms,
            "spatial" => FactKey::Spatial,
            _ => {
                if let Some(id) = id("ctx:danger:") {
                    FactKey::Danger(id)
                } else if let Some(id) = id("ctx:privacy:") {
                    FactKey::Privacy(id)
                } else if let Some(id) = id("intent:") {
                    FactKey::Intent(id)
                } else if let Some(id) = id("lastAction:") {
                    FactKey::LastAction(id)
                } else if let Some(id) = id("agentAtoms:") {
                    FactKey::AgentAtoms(id)
                } else if let Some(id) = id("mem:beliefAtoms:") {
                    FactKey::BeliefAtoms(id)
                } else if let Some(pair) = id("trust:") {
                    match pair.split_once(':') {
                        Some((observer, target)) if !observer.is_empty() && !target.is_empty() => {
                            FactKey::Trust {
                                observer: observer.to_string(),
                                target: target.to_string(),
                            }
                        }
                        _ => FactKey::Other(s.to_string()),
                    }
                } else if let Some(id) = id("vec:") {
                    FactKey::StateVector(id)
                } else {
                    FactKey::Other(s.to_string())
                }
            }
        };
        Ok(key)
    }
}

/// How an atom reached a recipient's inbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    /// Delivered by speech, subject to the trust gate
    Heard,
    /// Witnessed first hand
    Observed,
}

/// One undelivered atom.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboxEntry {
    pub from: String,
    pub channel: Channel,
    pub atom: Atom,
}

/// Contents of the `inboxAtoms` fact, keyed by recipient id.
pub type Inbox = BTreeMap<String, Vec<InboxEntry>>;

/// Fact map with shared values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FactStore {
    entries: BTreeMap<String, Arc<Value>>,
}

impl FactStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Raw entries in key order.
    pub fn entries(&self) -> &BTreeMap<String, Arc<Value>> {
        &self.entries
    }

    pub fn get(&self, key: &FactKey) -> Option<&Value> {
        self.get_raw(&key.to_string())
    }

    pub fn get_raw(&self, key: &str) -> Option<&Value> {
        self.entries.get(key).map(|v| v.as_ref())
    }

    pub fn contains(&self, key: &FactKey) -> bool {
        self.entries.contains_key(&key.to_string())
    }

    /// Stores a value. Writing an equal value keeps the existing allocation
    /// so the entry does not show up as changed in tick deltas.
    pub fn set(&mut self, key: &FactKey, value: Value) {
        self.set_raw(key.to_string(), value);
    }

    pub fn set_raw(&mut self, key: String, value: Value) {
        if self.entries.get(&key).map(|v| v.as_ref()) == Some(&value) {
            return;
        }
        self.entries.insert(key, Arc::new(value));
    }

    pub fn remove(&mut self, key: &FactKey) -> Option<Value> {
        self.entries
            .remove(&key.to_string())
            .map(Arc::unwrap_or_clone)
    }

    /// Iterates parsed keys and values in key order.
    pub fn iter(&self) -> impl Iterator<Item = (FactKey, &Value)> {
        self.entries.iter().map(|(k, v)| {
            let key = match k.parse::<FactKey>() {
                Ok(key) => key,
                Err(never) => match never {},
            };
            (key, v.as_ref())
        })
    }

    /// Decodes a fact into a typed value.
    pub fn get_as<T: DeserializeOwned>(&self, key: &FactKey) -> Result<Option<T>> {
        match self.get(key) {
            None => Ok(None),
            Some(value) => serde_json::from_value(value.clone())
                .map(Some)
                .map_err(|source| SimError::FactDecode {
                    key: key.to_string(),
                    source,
                }),
        }
    }

    /// Decodes a fact written by a collaborator. A value of the wrong shape
    /// is logged and reads as absent.
    fn get_lenient<T: DeserializeOwned>(&self, key: &FactKey) -> Option<T> {
        match self.get_as(key) {
            Ok(value) => value,
            Err(e) => {
                tracing::debug!(error = %e, "ignoring malformed fact");
                None
            }
        }
    }

    pub fn set_as<T: Serialize>(&mut self, key: &FactKey, value: &T) -> Result<()> {
        let value = serde_json::to_value(value)?;
        self.set(key, value);
        Ok(())
    }

    fn number(&self, key: &FactKey) -> Option<f64> {
        self.get(key).and_then(Value::as_f64).filter(|v| v.is_finite())
    }

    /// `ctx:danger:<id>`, 0 when absent.
    pub fn danger(&self, id: &str) -> f64 {
        self.number(&FactKey::danger(id)).unwrap_or(0.0)
    }

    pub fn set_danger(&mut self, id: &str, level: f64) {
        self.set(&FactKey::danger(id), Value::from(level));
    }

    pub fn privacy(&self, id: &str) -> Option<f64> {
        self.number(&FactKey::privacy(id))
    }

    pub fn set_privacy(&mut self, id: &str, level: f64) {
        self.set(&FactKey::privacy(id), Value::from(level));
    }

    /// True when `intent:<actor>` holds a decodable record.
    pub fn has_intent(&self, actor_id: &str) -> bool {
        self.intent(actor_id).is_some()
    }

    /// Open intent of an actor. A malformed record reads as no intent and
    /// is overwritten by the next `start_intent`.
    pub fn intent(&self, actor_id: &str) -> Option<IntentRecord> {
        self.get_lenient(&FactKey::intent(actor_id))
    }

    pub fn set_intent(&mut self, actor_id: &str, record: &IntentRecord) -> Result<()> {
        self.set_as(&FactKey::intent(actor_id), record)
    }

    pub fn clear_intent(&mut self, actor_id: &str) -> bool {
        self.remove(&FactKey::intent(actor_id)).is_some()
    }

    /// Kind of the last applied action; unknown names read as absent.
    pub fn last_action(&self, actor_id: &str) -> Option<ActionKind> {
        self.get(&FactKey::last_action(actor_id))
            .and_then(Value::as_str)
            .and_then(|s| s.parse().ok())
    }

    pub fn set_last_action(&mut self, actor_id: &str, kind: ActionKind) {
        self.set(
            &FactKey::last_action(actor_id),
            Value::String(kind.as_str().to_string()),
        );
    }

    /// Atoms an agent shares when it talks. Written by external collaborators,
    /// so a malformed value reads as empty.
    pub fn agent_atoms(&self, actor_id: &str) -> Vec<Atom> {
        self.get_lenient(&FactKey::agent_atoms(actor_id))
            .unwrap_or_default()
    }

    pub fn set_agent_atoms(&mut self, actor_id: &str, atoms: &[Atom]) -> Result<()> {
        self.set_as(&FactKey::agent_atoms(actor_id), &atoms)
    }

    /// Pending deliveries. Entries that are not `{from, channel, atom}`
    /// are dropped one by one; the rest of the inbox survives.
    pub fn inbox(&self) -> Inbox {
        let raw: BTreeMap<String, Vec<Value>> =
            self.get_lenient(&FactKey::InboxAtoms).unwrap_or_default();
        let mut inbox = Inbox::new();
        for (recipient, entries) in raw {
            let decoded: Vec<InboxEntry> = entries
                .into_iter()
                .filter_map(|entry| match serde_json::from_value(entry) {
                    Ok(entry) => Some(entry),
                    Err(e) => {
                        tracing::debug!(recipient = %recipient, error = %e, "dropping malformed inbox entry");
                        None
                    }
                })
                .collect();
            if !decoded.is_empty() {
                inbox.insert(recipient, decoded);
            }
        }
        inbox
    }

    pub fn set_inbox(&mut self, inbox: &Inbox) -> Result<()> {
        self.set_as(&FactKey::InboxAtoms, inbox)
    }

    /// Removes and returns the pending inbox.
    pub fn take_inbox(&mut self) -> Inbox {
        let inbox = self.inbox();
        self.remove(&FactKey::InboxAtoms);
        inbox
    }

    /// Belief memory; a malformed list reads as empty.
    pub fn belief_atoms(&self, id: &str) -> Vec<Atom> {
        self.get_lenient(&FactKey::belief_atoms(id)).unwrap_or_default()
    }

    pub fn set_belief_atoms(&mut self, id: &str, atoms: &[Atom]) -> Result<()> {
        self.set_as(&FactKey::belief_atoms(id), &atoms)
    }

    /// Dyadic trust of `observer` in `target`, if recorded.
    pub fn trust(&self, observer: &str, target: &str) -> Option<f64> {
        self.number(&FactKey::trust(observer, target))
    }

    pub fn set_trust(&mut self, observer: &str, target: &str, level: f64) {
        self.set(&FactKey::trust(observer, target), Value::from(level));
    }

    /// State vector; non-numeric entries make the whole vector absent.
    pub fn state_vector(&self, id: &str) -> Option<Vec<f64>> {
        self.get(&FactKey::state_vector(id))?
            .as_array()?
            .iter()
            .map(Value::as_f64)
            .collect()
    }

    pub fn set_state_vector(&mut self, id: &str, vector: &[f64]) {
        self.set(&FactKey::state_vector(id), Value::from(vector.to_vec()));
    }

    pub fn spatial_override(&self) -> Option<&Value> {
        self.get(&FactKey::Spatial)
    }
}
