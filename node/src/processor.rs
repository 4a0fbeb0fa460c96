//! Async front door for vote submissions.
//!
//! Each submission runs the synchronous [`ConsensusEngine`] on the blocking
//! pool. A semaphore bounds the number of submissions in flight, and with
//! record leases enabled, submissions on the same record are serialized.
//! Different records always proceed in parallel.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, Semaphore};
use tracing::debug;

use tally_consensus::{ConsensusEngine, VoteOutcome};
use tally_types::{RecordId, VoterId};

use crate::NodeError;

pub struct VoteProcessor {
    engine: Arc<ConsensusEngine>,
    /// Per-record mutexes, present only when leases are enabled.
    record_locks: Option<Arc<Mutex<HashMap<RecordId, Arc<Mutex<()>>>>>>,
    /// Maximum concurrent submissions
    max_concurrent: usize,
    semaphore: Arc<Semaphore>,
}

impl VoteProcessor {
    pub fn new(engine: Arc<ConsensusEngine>, max_concurrent: usize, record_leases: bool) -> Self {
        Self {
            engine,
            record_locks: record_leases.then(|| Arc::new(Mutex::new(HashMap::new()))),
            max_concurrent,
            semaphore: Arc::new(Semaphore::new(max_concurrent)),
        }
    }

    /// Get or create the lease for a record.
    async fn record_lock(&self, record: &RecordId) -> Option<Arc<Mutex<()>>> {
        let locks = self.record_locks.as_ref()?;
        let mut locks = locks.lock().await;
        Some(
            locks
                .entry(record.clone())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone(),
        )
    }

    /// Submit one vote and wait for the engine's answer.
    pub async fn submit(
        &self,
        voter: VoterId,
        record: RecordId,
        verdict: bool,
    ) -> Result<VoteOutcome, NodeError> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| NodeError::ProcessorClosed)?;
        let lease = self.record_lock(&record).await;
        let _lease_guard = match &lease {
            Some(lock) => Some(lock.lock().await),
            None => None,
        };

        debug!(voter = %voter, record = %record, verdict, "processing vote");
        let engine = Arc::clone(&self.engine);
        let outcome = tokio::task::spawn_blocking(move || {
            engine.submit_vote(&voter, &record, verdict)
        })
        .await
        .map_err(|e| NodeError::Join(e.to_string()))??;
        Ok(outcome)
    }

    /// Stop accepting submissions. In-flight submissions finish normally.
    pub fn close(&self) {
        self.semaphore.close();
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Number of records that currently hold a lease entry.
    pub async fn active_records(&self) -> usize {
        match &self.record_locks {
            Some(locks) => locks.lock().await.len(),
            None => 0,
        }
    }

    /// Drop leases for records no longer being processed.
    pub async fn cleanup(&self) {
        if let Some(locks) = &self.record_locks {
            locks
                .lock()
                .await
                .retain(|_, lock| Arc::strong_count(lock) > 1);
        }
    }
}
