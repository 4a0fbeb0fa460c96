//! Abstract storage traits for Tally.
//!
//! Every storage backend (LMDB, in-memory for testing) implements these traits.
//! The consensus engine depends only on the traits.
//!
//! Operations that guard an invariant are conditional writes and must be atomic
//! in the backend: [`RecordStore::finalize_status`], [`OutcomeStore::create`],
//! [`RewardLedger::award_once`] and [`VoteStore::append_unique`]. The engine
//! never relies on a read followed by a separate write for correctness.

pub mod error;
pub mod outcome;
pub mod record;
pub mod reward;
pub mod vote;

pub use error::StoreError;
pub use outcome::{CreateOutcome, OutcomeStore};
pub use record::{RecordStore, StatusChange};
pub use reward::RewardLedger;
pub use vote::VoteStore;
