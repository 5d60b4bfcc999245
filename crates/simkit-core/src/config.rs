//! Configuration System
//!
//! Loads tuning parameters from a TOML file so constants can be adjusted
//! without recompiling. Every section and field has a default, so a partial
//! file only overrides what it names.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::spatial::SpatialConfig;
use crate::systems::trust::AcceptanceConfig;

/// Default tuning file path
pub const DEFAULT_TUNING_PATH: &str = "simkit.toml";

/// Top-level configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub simulation: SimulationConfig,
    pub spatial: SpatialConfig,
    pub acceptance: AcceptanceConfig,
    pub actions: ActionConfig,
    pub memory: MemoryConfig,
}

/// Orchestrator parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// History ring size; older tick records are evicted
    pub max_records: usize,
    /// Logical milliseconds per tick, used for snapshot time
    pub tick_ms: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            max_records: 500,
            tick_ms: 1000,
        }
    }
}

/// Action ranges, costs and policy thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionConfig {
    pub talk_range: f64,
    pub help_range: f64,
    pub attack_range: f64,
    pub repair_range: f64,
    /// Longest free step a `move_xy` may take
    pub move_max_delta: f64,
    /// `no_violence` norm level at which attacks are refused
    pub no_violence_threshold: f64,
    /// Level at which `no_entry` and `silence` norms apply
    pub norm_threshold: f64,
    /// Danger level above which resting is refused
    pub rest_max_danger: f64,
    /// Energy below which repair work is refused
    pub min_repair_energy: f64,
    /// Ticks a `repair_feature` intent takes
    pub repair_intent_ticks: u32,
}

impl Default for ActionConfig {
    fn default() -> Self {
        Self {
            talk_range: 90.0,
            help_range: 40.0,
            attack_range: 40.0,
            repair_range: 40.0,
            move_max_delta: 60.0,
            no_violence_threshold: 0.7,
            norm_threshold: 0.7,
            rest_max_danger: 0.7,
            min_repair_energy: 0.1,
            repair_intent_ticks: 3,
        }
    }
}

/// Perception and belief memory parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Belief list cap per agent
    pub max_belief_atoms: usize,
    /// Distance within which an action is witnessed
    pub witness_range: f64,
    /// Atoms an agent shares per utterance
    pub max_shared_atoms: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            max_belief_atoms: 64,
            witness_range: 150.0,
            max_shared_atoms: 3,
        }
    }
}

impl SimConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from a path, or use defaults if it cannot be read
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        Self::load(path).unwrap_or_else(|e| {
            tracing::warn!(path = %path.display(), error = %e, "could not load tuning file, using defaults");
            Self::default()
        })
    }

    /// Render the configuration as TOML
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

/// Configuration error type
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),
}
