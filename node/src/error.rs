use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("consensus error: {0}")]
    Consensus(#[from] tally_consensus::ConsensusError),

    #[error("store error: {0}")]
    Store(#[from] tally_store::StoreError),

    #[error("LMDB error: {0}")]
    Lmdb(#[from] tally_store_lmdb::LmdbError),

    #[error("invalid input: {0}")]
    Input(#[from] tally_types::TallyError),

    #[error("config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("vote task failed: {0}")]
    Join(String),

    #[error("vote processor is shut down")]
    ProcessorClosed,
}
