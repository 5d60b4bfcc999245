//! SimKit Core
//!
//! Deterministic, tick-based social simulation engine. A [`Simulator`]
//! owns a [`World`] and advances it one tick at a time, recording a
//! snapshot and trace per tick. Decision engines plug in through
//! [`SimPlugin`].

pub mod actions;
pub mod config;
pub mod error;
pub mod output;
pub mod plugin;
pub mod rng;
pub mod setup;
pub mod simulator;
pub mod spatial;
pub mod systems;
pub mod world;

pub use actions::{spec_for, ActionSpec, Atomicity, Check};
pub use config::{ConfigError, SimConfig};
pub use error::{Result, SimError};
pub use plugin::SimPlugin;
pub use rng::SimRng;
pub use setup::demo_world;
pub use simulator::Simulator;
pub use spatial::SpatialConfig;
pub use systems::{AcceptanceConfig, ValidationResult};
pub use world::{Character, FactKey, FactStore, Location, Pos, World};
