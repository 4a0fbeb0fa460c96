//! The main Tally node struct — wires storage, engine and processor together.

use std::path::Path;
use std::sync::Arc;

use tally_consensus::{ConsensusEngine, RecordTally, Stores, VoteOutcome};
use tally_store::{OutcomeStore, RecordStore, RewardLedger, StoreError, VoteStore};
use tally_store_lmdb::LmdbEnvironment;
use tally_types::{Polarity, Record, RecordId, StoredArtifact, Vote, VoterId};

use crate::config::NodeConfig;
use crate::error::NodeError;
use crate::import::{parse_records_json, ImportSummary, RecordEntry};
use crate::processor::VoteProcessor;

/// Build the engine's store handles over one LMDB environment.
pub fn lmdb_stores(env: &LmdbEnvironment) -> Stores {
    Stores {
        records: Arc::new(env.record_store()),
        votes: Arc::new(env.vote_store()),
        outcomes: Arc::new(env.outcome_store()),
        rewards: Arc::new(env.reward_ledger()),
    }
}

pub struct Node {
    config: NodeConfig,
    env: LmdbEnvironment,
    engine: Arc<ConsensusEngine>,
    processor: VoteProcessor,
}

impl Node {
    /// Open (or create) the data directory and build the engine.
    pub fn open(config: NodeConfig) -> Result<Self, NodeError> {
        config.validate()?;
        let env = LmdbEnvironment::open(&config.data_dir, config.max_dbs, config.map_size)?;
        let engine = Arc::new(ConsensusEngine::new(
            lmdb_stores(&env),
            config.consensus.clone(),
        )?);
        let processor = VoteProcessor::new(
            Arc::clone(&engine),
            config.max_concurrent_votes,
            config.record_leases,
        );

        tracing::info!(
            data_dir = %config.data_dir.display(),
            threshold = config.consensus.threshold,
            reward_amount = config.consensus.reward_amount,
            records = engine.stores().records.record_count()?,
            "node opened"
        );

        Ok(Self {
            config,
            env,
            engine,
            processor,
        })
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn stores(&self) -> &Stores {
        self.engine.stores()
    }

    /// Submit a vote through the processor.
    pub async fn submit_vote(
        &self,
        voter: VoterId,
        record: RecordId,
        verdict: bool,
    ) -> Result<VoteOutcome, NodeError> {
        self.processor.submit(voter, record, verdict).await
    }

    pub fn add_record(&self, record: &Record) -> Result<(), NodeError> {
        self.stores().records.insert_record(record)?;
        tracing::debug!(record = %record.id, "record added");
        Ok(())
    }

    /// Insert every entry as a pending record. Ids that already exist are
    /// skipped; an invalid id aborts the import.
    pub fn import_records(&self, entries: Vec<RecordEntry>) -> Result<ImportSummary, NodeError> {
        let mut summary = ImportSummary::default();
        for entry in entries {
            let record = entry.into_record()?;
            match self.stores().records.insert_record(&record) {
                Ok(()) => summary.inserted += 1,
                Err(StoreError::Duplicate(_)) => summary.skipped += 1,
                Err(e) => return Err(e.into()),
            }
        }
        tracing::info!(
            inserted = summary.inserted,
            skipped = summary.skipped,
            "records imported"
        );
        Ok(summary)
    }

    /// Import a JSON file of `{id, data_1, data_2}` entries.
    pub fn import_file(&self, path: &Path) -> Result<ImportSummary, NodeError> {
        let json = std::fs::read_to_string(path)?;
        self.import_records(parse_records_json(&json)?)
    }

    pub fn record(&self, id: &RecordId) -> Result<Option<Record>, NodeError> {
        Ok(self.stores().records.get_record(id)?)
    }

    pub fn next_pending_record(&self) -> Result<Option<Record>, NodeError> {
        Ok(self.stores().records.next_pending()?)
    }

    pub fn tally(&self, id: &RecordId) -> Result<RecordTally, NodeError> {
        Ok(self.engine.tally(id)?)
    }

    pub fn votes_for(&self, id: &RecordId) -> Result<Vec<Vote>, NodeError> {
        Ok(self.stores().votes.votes_for(id)?)
    }

    pub fn points(&self, voter: &VoterId) -> Result<u64, NodeError> {
        Ok(self.stores().rewards.points(voter)?)
    }

    pub fn outcome(
        &self,
        id: &RecordId,
        polarity: Polarity,
    ) -> Result<Option<StoredArtifact>, NodeError> {
        Ok(self.stores().outcomes.get(id, polarity)?)
    }

    pub fn outcomes(&self, polarity: Polarity) -> Result<Vec<StoredArtifact>, NodeError> {
        Ok(self.stores().outcomes.list(polarity)?)
    }

    /// Stop taking votes and flush the environment to disk.
    pub fn shutdown(&self) -> Result<(), NodeError> {
        self.processor.close();
        self.env.force_sync()?;
        tracing::info!("node shut down");
        Ok(())
    }
}
