//! Node configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use tally_types::ConsensusParams;

use crate::{LogFormat, NodeError};

/// Configuration for a Tally node.
///
/// Can be loaded from a TOML file via [`NodeConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
///
/// ```toml
/// data_dir = "./tally_data"
/// log_format = "json"
///
/// [consensus]
/// threshold = 2
/// reward_amount = 1
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Data directory for the LMDB environment.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// LMDB memory map size in bytes (upper bound on database size).
    #[serde(default = "default_map_size")]
    pub map_size: usize,

    /// Maximum number of named LMDB databases.
    #[serde(default = "default_max_dbs")]
    pub max_dbs: u32,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Upper bound on vote submissions in flight at once.
    #[serde(default = "default_max_concurrent_votes")]
    pub max_concurrent_votes: usize,

    /// Serialize submissions on the same record with an in-process lease.
    /// Correctness does not depend on it; it only reduces contention.
    #[serde(default)]
    pub record_leases: bool,

    /// Consensus parameters.
    #[serde(default)]
    pub consensus: ConsensusParams,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_data_dir() -> PathBuf {
    PathBuf::from("./tally_data")
}

fn default_map_size() -> usize {
    1 << 30
}

fn default_max_dbs() -> u32 {
    16
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_concurrent_votes() -> usize {
    64
}

// ── Impl ───────────────────────────────────────────────────────────────

impl NodeConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &str) -> Result<Self, NodeError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| NodeError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, NodeError> {
        toml::from_str(s).map_err(|e| NodeError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, NodeError> {
        toml::to_string_pretty(self).map_err(|e| NodeError::Config(e.to_string()))
    }

    pub fn log_format(&self) -> Result<LogFormat, NodeError> {
        self.log_format.parse()
    }

    /// Reject settings the node cannot start with.
    pub fn validate(&self) -> Result<(), NodeError> {
        self.consensus
            .validate()
            .map_err(|e| NodeError::Config(e.to_string()))?;
        if self.max_concurrent_votes == 0 {
            return Err(NodeError::Config(
                "max_concurrent_votes must be greater than zero".to_string(),
            ));
        }
        self.log_format()?;
        Ok(())
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            map_size: default_map_size(),
            max_dbs: default_max_dbs(),
            log_format: default_log_format(),
            log_level: default_log_level(),
            max_concurrent_votes: default_max_concurrent_votes(),
            record_leases: false,
            consensus: ConsensusParams::default(),
        }
    }
}
