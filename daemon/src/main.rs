//! Tally daemon — command-line entry point for a Tally node.

use std::path::PathBuf;

use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand};
use serde::Serialize;

use tally_consensus::VoteResponse;
use tally_node::{init_logging, Node, NodeConfig};
use tally_types::{Polarity, Record, RecordId, VoterId};

#[derive(Parser)]
#[command(name = "tally-daemon", about = "Consensus vote tally node")]
struct Cli {
    /// Data directory for the LMDB environment.
    #[arg(long, env = "TALLY_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "TALLY_CONFIG")]
    config: Option<PathBuf>,

    /// Matching votes needed to finalize a record, exclusive.
    #[arg(long, env = "TALLY_THRESHOLD")]
    threshold: Option<u64>,

    /// Points credited to each contributor of a finalized record.
    #[arg(long, env = "TALLY_REWARD_AMOUNT")]
    reward_amount: Option<u64>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "TALLY_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "TALLY_LOG_FORMAT")]
    log_format: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Manage records.
    Record {
        #[command(subcommand)]
        action: RecordAction,
    },
    /// Cast a vote on a record.
    Vote {
        voter: VoterId,
        record: RecordId,
        /// `true` to verify, `false` to reject.
        #[arg(action = ArgAction::Set)]
        verdict: bool,
    },
    /// Show a voter's points.
    Points { voter: VoterId },
    /// Show the artifact of a finalized record.
    Outcome { record: RecordId, polarity: Polarity },
    /// List every artifact of one polarity.
    Outcomes { polarity: Polarity },
}

#[derive(Subcommand)]
enum RecordAction {
    /// Add one pending record.
    Add {
        id: RecordId,
        data_1: String,
        data_2: String,
    },
    /// Import pending records from a JSON array of `{id, data_1, data_2}`.
    Import { file: PathBuf },
    /// Show a record with its vote counts.
    Show { id: RecordId },
    /// Show the first pending record.
    Next,
}

fn load_config(cli: &Cli) -> anyhow::Result<NodeConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let path = path.to_string_lossy();
            NodeConfig::from_toml_file(&path)
                .with_context(|| format!("failed to load config file {path}"))?
        }
        None => NodeConfig::default(),
    };

    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(threshold) = cli.threshold {
        config.consensus.threshold = threshold;
    }
    if let Some(amount) = cli.reward_amount {
        config.consensus.reward_amount = amount;
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    if let Some(format) = &cli.log_format {
        config.log_format = format.clone();
    }
    Ok(config)
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = load_config(&cli)?;
    init_logging(config.log_format()?, &config.log_level)?;
    if let Some(path) = &cli.config {
        tracing::info!("Loaded config from {}", path.display());
    }

    let node = Node::open(config).context("failed to open node")?;
    run(&node, cli.command).await
}

/// Run one command, then close the node whatever the command returned.
async fn run(node: &Node, command: Command) -> anyhow::Result<()> {
    let result = execute(node, command).await;
    let shutdown = node.shutdown();
    result?;
    shutdown?;
    Ok(())
}

async fn execute(node: &Node, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Record { action } => match action {
            RecordAction::Add { id, data_1, data_2 } => {
                let record = Record::pending(id, data_1, data_2);
                node.add_record(&record)?;
                print_json(&record)?;
            }
            RecordAction::Import { file } => {
                let summary = node
                    .import_file(&file)
                    .with_context(|| format!("failed to import {}", file.display()))?;
                print_json(&summary)?;
            }
            RecordAction::Show { id } => {
                let tally = node.tally(&id)?;
                print_json(&serde_json::json!({
                    "record": tally.record,
                    "approvals": tally.approvals,
                    "rejections": tally.rejections,
                }))?;
            }
            RecordAction::Next => print_json(&node.next_pending_record()?)?,
        },
        Command::Vote {
            voter,
            record,
            verdict,
        } => {
            let outcome = node.submit_vote(voter, record, verdict).await?;
            print_json(&VoteResponse::from(outcome))?;
        }
        Command::Points { voter } => {
            let points = node.points(&voter)?;
            print_json(&serde_json::json!({ "voter": voter, "points": points }))?;
        }
        Command::Outcome { record, polarity } => match node.outcome(&record, polarity)? {
            Some(stored) => print_json(&stored)?,
            None => anyhow::bail!("no {polarity} outcome for record {record}"),
        },
        Command::Outcomes { polarity } => print_json(&node.outcomes(polarity)?)?,
    }

    Ok(())
}
