//! LMDB environment setup.

use std::path::Path;
use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};

use crate::keys::{read_u64, SCHEMA_VERSION_KEY};
use crate::{LmdbError, LmdbOutcomeStore, LmdbRecordStore, LmdbRewardLedger, LmdbVoteStore};

/// Current on-disk layout version, stored in the meta database.
pub const SCHEMA_VERSION: u64 = 1;

/// Number of named databases the environment creates.
pub const DATABASE_COUNT: u32 = 9;

/// Wraps the LMDB environment and all database handles.
pub struct LmdbEnvironment {
    env: Arc<Env>,
    /// record id → bincode `Record`
    records_db: Database<Bytes, Bytes>,
    /// record id → empty; index of records still pending
    pending_db: Database<Bytes, Bytes>,
    /// seg(record) ++ vote_seq → bincode `Vote`
    votes_db: Database<Bytes, Bytes>,
    /// seg(record) ++ seg(voter) → first vote_seq
    voter_index_db: Database<Bytes, Bytes>,
    /// seg(record) ++ verdict byte → vote count
    tallies_db: Database<Bytes, Bytes>,
    /// polarity tag ++ record id → bincode `StoredArtifact`
    outcomes_db: Database<Bytes, Bytes>,
    /// voter id → points
    balances_db: Database<Bytes, Bytes>,
    /// seg(voter) ++ record id → points awarded
    awards_db: Database<Bytes, Bytes>,
    /// counters and schema version
    meta_db: Database<Bytes, Bytes>,
}

impl LmdbEnvironment {
    /// Open or create an LMDB environment at the given path.
    ///
    /// `max_dbs` must be at least [`DATABASE_COUNT`].
    pub fn open(path: &Path, max_dbs: u32, map_size: usize) -> Result<Self, LmdbError> {
        if max_dbs < DATABASE_COUNT {
            return Err(LmdbError::Heed(format!(
                "max_dbs must be at least {DATABASE_COUNT}, got {max_dbs}"
            )));
        }
        std::fs::create_dir_all(path).map_err(|e| LmdbError::Io(e.to_string()))?;

        // SAFETY: each data directory is opened by a single environment per
        // process, and the files are not modified outside LMDB.
        let env = unsafe {
            EnvOpenOptions::new()
                .max_dbs(max_dbs)
                .map_size(map_size)
                .open(path)?
        };

        let mut wtxn = env.write_txn()?;
        let records_db = env.create_database(&mut wtxn, Some("records"))?;
        let pending_db = env.create_database(&mut wtxn, Some("pending"))?;
        let votes_db = env.create_database(&mut wtxn, Some("votes"))?;
        let voter_index_db = env.create_database(&mut wtxn, Some("voter_index"))?;
        let tallies_db = env.create_database(&mut wtxn, Some("tallies"))?;
        let outcomes_db = env.create_database(&mut wtxn, Some("outcomes"))?;
        let balances_db = env.create_database(&mut wtxn, Some("balances"))?;
        let awards_db = env.create_database(&mut wtxn, Some("awards"))?;
        let meta_db: Database<Bytes, Bytes> = env.create_database(&mut wtxn, Some("meta"))?;

        match read_u64(&meta_db, &wtxn, SCHEMA_VERSION_KEY)? {
            None => {
                meta_db.put(&mut wtxn, SCHEMA_VERSION_KEY, &SCHEMA_VERSION.to_be_bytes())?;
            }
            Some(SCHEMA_VERSION) => {}
            Some(other) => {
                return Err(LmdbError::Heed(format!(
                    "unsupported schema version {other} (expected {SCHEMA_VERSION})"
                )));
            }
        }
        wtxn.commit()?;

        tracing::info!(path = %path.display(), map_size, "opened LMDB environment");

        Ok(Self {
            env: Arc::new(env),
            records_db,
            pending_db,
            votes_db,
            voter_index_db,
            tallies_db,
            outcomes_db,
            balances_db,
            awards_db,
            meta_db,
        })
    }

    pub fn env(&self) -> &Env {
        &self.env
    }

    pub fn record_store(&self) -> LmdbRecordStore {
        LmdbRecordStore {
            env: Arc::clone(&self.env),
            records_db: self.records_db,
            pending_db: self.pending_db,
        }
    }

    pub fn vote_store(&self) -> LmdbVoteStore {
        LmdbVoteStore {
            env: Arc::clone(&self.env),
            votes_db: self.votes_db,
            voter_index_db: self.voter_index_db,
            tallies_db: self.tallies_db,
            meta_db: self.meta_db,
        }
    }

    pub fn outcome_store(&self) -> LmdbOutcomeStore {
        LmdbOutcomeStore {
            env: Arc::clone(&self.env),
            outcomes_db: self.outcomes_db,
            meta_db: self.meta_db,
        }
    }

    pub fn reward_ledger(&self) -> LmdbRewardLedger {
        LmdbRewardLedger {
            env: Arc::clone(&self.env),
            balances_db: self.balances_db,
            awards_db: self.awards_db,
        }
    }

    /// Flush the memory map to disk.
    pub fn force_sync(&self) -> Result<(), LmdbError> {
        self.env.force_sync()?;
        Ok(())
    }
}
