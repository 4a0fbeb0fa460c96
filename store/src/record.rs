//! Record storage trait.

use crate::StoreError;
use tally_types::{Record, RecordId, RecordStatus};

/// Result of a conditional status write.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusChange {
    /// The record was pending and now holds the requested terminal status.
    Transitioned,
    /// The record was already terminal; it keeps the status carried here.
    Unchanged(RecordStatus),
}

impl StatusChange {
    /// The status the record holds after the call.
    pub fn resulting_status(&self, requested: RecordStatus) -> RecordStatus {
        match self {
            Self::Transitioned => requested,
            Self::Unchanged(current) => *current,
        }
    }
}

/// Trait for storing records and their status.
pub trait RecordStore {
    /// Insert a new record. Fails with [`StoreError::Duplicate`] if the id exists.
    fn insert_record(&self, record: &Record) -> Result<(), StoreError>;

    fn get_record(&self, id: &RecordId) -> Result<Option<Record>, StoreError>;

    /// Move a pending record to `terminal`, atomically conditional on it still
    /// being pending. Terminal records are left untouched.
    ///
    /// Fails with [`StoreError::NotFound`] for unknown ids.
    fn finalize_status(
        &self,
        id: &RecordId,
        terminal: RecordStatus,
    ) -> Result<StatusChange, StoreError>;

    /// A pending record for display, lowest id first. `None` when nothing is pending.
    fn next_pending(&self) -> Result<Option<Record>, StoreError>;

    fn record_count(&self) -> Result<u64, StoreError>;
}
