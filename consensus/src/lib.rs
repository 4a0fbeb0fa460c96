//! Consensus — finalizes records once enough voters agree.
//!
//! A record collects binary verdicts from independent voters. When strictly more
//! than `threshold` votes share a verdict while the record is still pending, the
//! record is finalized exactly once:
//! - its status moves to `verified` / `rejected` (compare-and-swap on pending),
//! - one outcome artifact is written for `(record, polarity)` (atomic test-and-set),
//! - each distinct contributing voter is credited once (`award_once`).
//!
//! ## Module overview
//!
//! - [`transition`] — Pure status transition rule.
//! - [`engine`] — [`ConsensusEngine`], the vote submission path.
//! - [`outcome`] — Submission results and their external representation.
//! - [`error`] — Consensus error types.

pub mod engine;
pub mod error;
pub mod outcome;
pub mod transition;

pub use engine::{ConsensusEngine, RecordTally, Stores};
pub use error::ConsensusError;
pub use outcome::{SubmissionStatus, VoteOutcome, VoteResponse};
pub use transition::next_status;
