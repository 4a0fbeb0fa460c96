//! Fundamental types for Tally.
//!
//! This crate defines the types shared across every other crate in the workspace:
//! identifiers, verdicts and polarities, record status, votes, outcome artifacts,
//! timestamps and consensus parameters.

pub mod error;
pub mod id;
pub mod params;
pub mod record;
pub mod state;
pub mod time;

pub use error::TallyError;
pub use id::{ArtifactId, RecordId, VoteId, VoterId};
pub use params::ConsensusParams;
pub use record::{Ballot, OutcomeArtifact, Record, StoredArtifact, Vote};
pub use state::{Polarity, RecordStatus};
pub use time::Timestamp;
