//! Engine errors.
//!
//! Only contract violations are errors. Gameplay failures (blocked moves,
//! norm violations, out-of-range targets) are data on offers and validation
//! results and never surface here.

use thiserror::Error;

use crate::config::ConfigError;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("unknown character: {0}")]
    UnknownCharacter(String),

    #[error("unknown location: {0}")]
    UnknownLocation(String),

    #[error("invalid world: {0}")]
    InvalidWorld(String),

    #[error("fact {key} could not be decoded: {source}")]
    FactDecode {
        key: String,
        source: serde_json::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("export error: {0}")]
    Export(#[from] simkit_events::ExportError),
}

pub type Result<T> = std::result::Result<T, SimError>;
