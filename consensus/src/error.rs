use tally_store::StoreError;
use tally_types::{RecordId, RecordStatus, TallyError, VoterId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConsensusError {
    #[error("record {0} not found")]
    RecordNotFound(RecordId),

    #[error("record {record} is already {status}; votes on finalized records are disabled")]
    RecordFinalized {
        record: RecordId,
        status: RecordStatus,
    },

    #[error("voter {voter} has already voted on record {record}")]
    DuplicateVote { voter: VoterId, record: RecordId },

    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] TallyError),

    #[error("storage failure: {0}")]
    Store(#[from] StoreError),
}

impl ConsensusError {
    /// Storage failures are transient; everything else is a caller error that a
    /// retry would reproduce.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Store(_))
    }
}
