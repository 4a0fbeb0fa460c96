use tally_types::RecordId;
use thiserror::Error;

/// Failures reported by any storage backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The addressed entry does not exist, e.g. `"record r1"`.
    #[error("{0} not found")]
    NotFound(String),

    /// A record with this id was already inserted.
    #[error("record {0} already exists")]
    Duplicate(RecordId),

    #[error("storage backend failure: {0}")]
    Backend(String),

    #[error("could not encode or decode a stored value: {0}")]
    Serialization(String),

    /// Stored entries disagree with each other (e.g. an index points nowhere).
    #[error("stored data is inconsistent: {0}")]
    Corruption(String),
}
