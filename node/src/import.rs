//! Bulk record import from JSON.

use serde::{Deserialize, Serialize};

use tally_types::{Record, RecordId};

use crate::NodeError;

/// One record as it appears in an import file.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct RecordEntry {
    pub id: String,
    pub data_1: String,
    pub data_2: String,
}

impl RecordEntry {
    /// Build a pending record, validating the id.
    pub fn into_record(self) -> Result<Record, NodeError> {
        let id = RecordId::parse(self.id)?;
        Ok(Record::pending(id, self.data_1, self.data_2))
    }
}

/// Result of an import run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub inserted: u64,
    /// Entries whose id was already present.
    pub skipped: u64,
}

/// Parse a JSON array of `{id, data_1, data_2}` objects.
pub fn parse_records_json(json: &str) -> Result<Vec<RecordEntry>, NodeError> {
    serde_json::from_str(json).map_err(|e| NodeError::Config(format!("invalid record file: {e}")))
}
