//! Top-level error type shared across crates.

use thiserror::Error;

/// Errors raised while constructing or parsing Tally types.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TallyError {
    #[error("invalid record id: {0:?}")]
    InvalidRecordId(String),

    #[error("invalid voter id: {0:?}")]
    InvalidVoterId(String),

    #[error("unknown polarity {0:?} (expected \"verified\" or \"rejected\")")]
    UnknownPolarity(String),

    #[error("unknown record status {0:?}")]
    UnknownStatus(String),

    #[error("invalid consensus parameters: {0}")]
    InvalidParams(String),
}
