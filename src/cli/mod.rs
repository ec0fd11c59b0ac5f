//! CLI argument parsing using clap 4.x derive macros

pub mod deploy;
pub mod perpetual;
pub mod status;
pub mod wallet;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Deploy AI agents to the Spheron compute marketplace and keep them alive
#[derive(Parser, Debug)]
#[command(name = "spheron-agent")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(disable_version_flag = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Settings file (defaults to ./spheron-agent.toml, then the user config dir)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print version information
    #[arg(long)]
    pub version: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyze content and deploy an agent if warranted
    Deploy {
        /// Content to analyze
        #[arg(required_unless_present = "file", num_args = 1..)]
        text: Vec<String>,

        /// Read the content from a file instead
        #[arg(short, long, conflicts_with = "text")]
        file: Option<PathBuf>,
    },

    /// Render a deployment config into a manifest
    Render {
        /// Deployment config (YAML)
        #[arg(id = "config_file", value_name = "CONFIG")]
        config: PathBuf,

        /// Write the manifest here instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Parse a manifest and print the deployment config it describes
    Inspect {
        /// Manifest file
        manifest: PathBuf,
    },

    /// Keep a deployment alive by renewing it before its lease ends
    Perpetual {
        /// Deployment config used for every renewal (YAML)
        #[arg(id = "config_file", value_name = "CONFIG")]
        config: PathBuf,

        /// Deployment already running; omit to deploy first
        #[arg(short, long)]
        deployment_id: Option<String>,

        /// Seconds between lease checks
        #[arg(short, long)]
        interval: Option<u64>,

        /// Renew when this many seconds or fewer remain
        #[arg(short, long)]
        threshold: Option<u64>,
    },

    /// Show deployment status
    Status {
        id: String,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show deployment logs
    Logs { id: String },

    /// Show time left on a deployment's lease
    Remaining { id: String },

    /// Close a deployment
    Close { id: String },

    /// Replace a deployment's manifest
    Update {
        id: String,

        /// Deployment config (YAML)
        #[arg(id = "config_file", value_name = "CONFIG")]
        config: PathBuf,
    },

    /// Show escrow balance
    Balance,

    /// Show escrow transactions
    Transactions,

    /// Deposit into escrow
    Deposit { amount: String },

    /// Withdraw from escrow
    Withdraw { amount: String },

    /// Show the local deployment ledger
    History,
}
