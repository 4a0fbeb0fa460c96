//! LMDB storage backend for Tally.
//!
//! Implements all storage traits from `tally-store` using the `heed` LMDB bindings.
//! Each logical store maps to one or more named databases within a single environment.
//!
//! LMDB serializes write transactions, so every conditional write (status
//! compare-and-swap, artifact test-and-set, award-once, unique vote append)
//! performs its check and its write inside one write transaction.

pub mod environment;
pub mod error;
mod keys;
pub mod outcome;
pub mod record;
pub mod reward;
pub mod vote;

pub use environment::LmdbEnvironment;
pub use error::LmdbError;
pub use outcome::LmdbOutcomeStore;
pub use record::LmdbRecordStore;
pub use reward::LmdbRewardLedger;
pub use vote::LmdbVoteStore;
