//! LMDB implementation of OutcomeStore.
//!
//! Key: `polarity_tag ++ record_id`. The tag is a fixed single byte, so listing
//! one polarity is a prefix scan and each `(record, polarity)` has exactly one key.

use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env};

use tally_store::outcome::{CreateOutcome, OutcomeStore};
use tally_store::StoreError;
use tally_types::{ArtifactId, OutcomeArtifact, Polarity, RecordId, StoredArtifact};

use crate::keys::{range_scan, read_u64, NEXT_ARTIFACT_ID_KEY};
use crate::LmdbError;

pub struct LmdbOutcomeStore {
    pub(crate) env: Arc<Env>,
    pub(crate) outcomes_db: Database<Bytes, Bytes>,
    pub(crate) meta_db: Database<Bytes, Bytes>,
}

fn outcome_key(record: &RecordId, polarity: Polarity) -> Vec<u8> {
    let id = record.as_str().as_bytes();
    let mut key = Vec::with_capacity(1 + id.len());
    key.push(polarity.tag());
    key.extend_from_slice(id);
    key
}

impl OutcomeStore for LmdbOutcomeStore {
    fn exists(&self, record: &RecordId, polarity: Polarity) -> Result<bool, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let found = self
            .outcomes_db
            .get(&rtxn, &outcome_key(record, polarity))
            .map_err(LmdbError::from)?
            .is_some();
        Ok(found)
    }

    fn create(&self, artifact: &OutcomeArtifact) -> Result<CreateOutcome, StoreError> {
        let key = outcome_key(&artifact.record, artifact.polarity);
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        if self
            .outcomes_db
            .get(&wtxn, &key)
            .map_err(LmdbError::from)?
            .is_some()
        {
            return Ok(CreateOutcome::AlreadyExists);
        }

        let seq = read_u64(&self.meta_db, &wtxn, NEXT_ARTIFACT_ID_KEY)?.unwrap_or(1);
        let id = ArtifactId::new(seq);
        let stored = StoredArtifact {
            id,
            artifact: artifact.clone(),
        };
        let bytes = bincode::serialize(&stored).map_err(LmdbError::from)?;
        self.outcomes_db
            .put(&mut wtxn, &key, &bytes)
            .map_err(LmdbError::from)?;
        self.meta_db
            .put(&mut wtxn, NEXT_ARTIFACT_ID_KEY, &(seq + 1).to_be_bytes())
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(CreateOutcome::Created(id))
    }

    fn get(
        &self,
        record: &RecordId,
        polarity: Polarity,
    ) -> Result<Option<StoredArtifact>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let val = self
            .outcomes_db
            .get(&rtxn, &outcome_key(record, polarity))
            .map_err(LmdbError::from)?;
        match val {
            Some(bytes) => Ok(Some(
                bincode::deserialize(bytes).map_err(LmdbError::from)?,
            )),
            None => Ok(None),
        }
    }

    fn list(&self, polarity: Polarity) -> Result<Vec<StoredArtifact>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let entries = range_scan(&self.outcomes_db, &rtxn, &[polarity.tag()])?;
        let mut results = Vec::with_capacity(entries.len());
        for (_key, val) in entries {
            results.push(bincode::deserialize(&val).map_err(LmdbError::from)?);
        }
        Ok(results)
    }
}
