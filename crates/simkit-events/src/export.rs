//! Session Export
//!
//! Deterministic persistence format for a recorded session.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::trace::SimTickRecord;

/// Schema tag written into every export.
pub const EXPORT_SCHEMA: &str = "SimKitExportV1";

/// Errors that can occur while reading or writing an export file.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported export schema: {0}")]
    Schema(String),
}

/// A recorded session: seed, scenario and every retained tick record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimExport {
    pub schema: String,
    /// Wall-clock creation time in unix milliseconds
    pub created_at: u64,
    pub seed: u64,
    pub scenario_id: String,
    pub records: Vec<SimTickRecord>,
}

impl SimExport {
    pub fn new(
        scenario_id: impl Into<String>,
        seed: u64,
        created_at: u64,
        records: Vec<SimTickRecord>,
    ) -> Self {
        Self {
            schema: EXPORT_SCHEMA.to_string(),
            created_at,
            seed,
            scenario_id: scenario_id.into(),
            records,
        }
    }

    /// Tick index of the last record, if any.
    pub fn last_tick(&self) -> Option<u64> {
        self.records.last().map(|r| r.snapshot.tick_index)
    }

    /// Serializes the export to pretty JSON.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Parses an export and checks its schema tag.
    pub fn from_json(json: &str) -> Result<Self, ExportError> {
        let export: SimExport = serde_json::from_str(json)?;
        if export.schema != EXPORT_SCHEMA {
            return Err(ExportError::Schema(export.schema));
        }
        Ok(export)
    }

    /// Writes the export as pretty JSON.
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> Result<(), ExportError> {
        fs::write(path, self.to_json_pretty()?)?;
        Ok(())
    }

    /// Reads an export written by [`SimExport::write_to_file`].
    pub fn read_from_file(path: impl AsRef<Path>) -> Result<Self, ExportError> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }
}
