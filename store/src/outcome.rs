//! Outcome artifact storage trait.

use crate::StoreError;
use tally_types::{ArtifactId, OutcomeArtifact, Polarity, RecordId, StoredArtifact};

/// Result of [`OutcomeStore::create`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CreateOutcome {
    Created(ArtifactId),
    /// Another caller already finalized this `(record, polarity)`. Not an error.
    AlreadyExists,
}

/// Holds at most one artifact per `(record, polarity)`.
pub trait OutcomeStore {
    fn exists(&self, record: &RecordId, polarity: Polarity) -> Result<bool, StoreError>;

    /// Insert the artifact unless one already exists for its key.
    /// The existence check and the insert are one atomic step.
    fn create(&self, artifact: &OutcomeArtifact) -> Result<CreateOutcome, StoreError>;

    fn get(
        &self,
        record: &RecordId,
        polarity: Polarity,
    ) -> Result<Option<StoredArtifact>, StoreError>;

    /// Every artifact of one polarity, ordered by record id.
    fn list(&self, polarity: Polarity) -> Result<Vec<StoredArtifact>, StoreError>;
}
