//! Tally node — hosts the consensus engine.
//!
//! The node is the coordinator that:
//! - Loads configuration (TOML + overrides)
//! - Initialises structured logging
//! - Opens the LMDB environment and builds the stores
//! - Runs vote submissions through the [`VoteProcessor`]
//! - Exposes record import and read-side queries for the CLI

pub mod config;
pub mod error;
pub mod import;
pub mod logging;
pub mod node;
pub mod processor;

pub use config::NodeConfig;
pub use error::NodeError;
pub use import::{parse_records_json, ImportSummary, RecordEntry};
pub use logging::{init_logging, LogFormat};
pub use node::{lmdb_stores, Node};
pub use processor::VoteProcessor;
