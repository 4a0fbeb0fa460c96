//! LMDB implementation of RecordStore.
//!
//! Records are keyed by their raw id bytes. A separate `pending` index holds the
//! ids of records that have not been finalized; it is updated in the same write
//! transaction as the status change.

use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env, RoTxn};

use tally_store::record::{RecordStore, StatusChange};
use tally_store::StoreError;
use tally_types::{Record, RecordId, RecordStatus};

use crate::LmdbError;

pub struct LmdbRecordStore {
    pub(crate) env: Arc<Env>,
    pub(crate) records_db: Database<Bytes, Bytes>,
    pub(crate) pending_db: Database<Bytes, Bytes>,
}

impl LmdbRecordStore {
    fn load(&self, txn: &RoTxn<'_>, id: &RecordId) -> Result<Option<Record>, LmdbError> {
        match self.records_db.get(txn, id.as_str().as_bytes())? {
            Some(bytes) => Ok(Some(bincode::deserialize(bytes)?)),
            None => Ok(None),
        }
    }
}

impl RecordStore for LmdbRecordStore {
    fn insert_record(&self, record: &Record) -> Result<(), StoreError> {
        let key = record.id.as_str().as_bytes();
        let bytes = bincode::serialize(record).map_err(LmdbError::from)?;
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        if self
            .records_db
            .get(&wtxn, key)
            .map_err(LmdbError::from)?
            .is_some()
        {
            return Err(StoreError::Duplicate(record.id.clone()));
        }
        self.records_db
            .put(&mut wtxn, key, &bytes)
            .map_err(LmdbError::from)?;
        if record.status.is_pending() {
            self.pending_db
                .put(&mut wtxn, key, &[])
                .map_err(LmdbError::from)?;
        }
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn get_record(&self, id: &RecordId) -> Result<Option<Record>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        Ok(self.load(&rtxn, id)?)
    }

    fn finalize_status(
        &self,
        id: &RecordId,
        terminal: RecordStatus,
    ) -> Result<StatusChange, StoreError> {
        if terminal.is_pending() {
            return Err(StoreError::Backend(
                "finalize_status requires a terminal status".to_string(),
            ));
        }
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let mut record = self
            .load(&wtxn, id)?
            .ok_or_else(|| LmdbError::NotFound(format!("record {id}")))?;
        if record.status.is_terminal() {
            // Read-only outcome; dropping the transaction aborts it.
            return Ok(StatusChange::Unchanged(record.status));
        }
        record.status = terminal;
        let key = id.as_str().as_bytes();
        let bytes = bincode::serialize(&record).map_err(LmdbError::from)?;
        self.records_db
            .put(&mut wtxn, key, &bytes)
            .map_err(LmdbError::from)?;
        self.pending_db
            .delete(&mut wtxn, key)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        tracing::debug!(record = %id, status = %terminal, "record status finalized");
        Ok(StatusChange::Transitioned)
    }

    fn next_pending(&self) -> Result<Option<Record>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let first = self.pending_db.first(&rtxn).map_err(LmdbError::from)?;
        let Some((key, _)) = first else {
            return Ok(None);
        };
        let id = std::str::from_utf8(key)
            .map_err(|e| StoreError::Corruption(format!("pending index key: {e}")))?;
        let id = RecordId::parse(id).map_err(|e| StoreError::Corruption(e.to_string()))?;
        match self.load(&rtxn, &id)? {
            Some(record) => Ok(Some(record)),
            None => Err(StoreError::Corruption(format!(
                "pending index points at missing record {id}"
            ))),
        }
    }

    fn record_count(&self) -> Result<u64, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let count = self.records_db.len(&rtxn).map_err(LmdbError::from)?;
        Ok(count)
    }
}
