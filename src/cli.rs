//! Command-line interface definition for HelpDesk
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for the HTTP service, agent discovery, the sentiment
//! simulator and the interactive support chat.

use crate::chat::SuggestionField;
use crate::sentiment::{Scenario, ServiceLevel};
use clap::{Parser, Subcommand};

/// HelpDesk - AI support desk back end
///
/// Serve the support portal and agent-service API, browse agents on the
/// registry, and simulate customer sentiment.
#[derive(Parser, Debug, Clone)]
#[command(name = "helpdesk")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file (default: config/config.yaml)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run the HTTP service
    Serve {
        /// Override the bind host
        #[arg(long)]
        host: Option<String>,

        /// Override the bind port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Discover and call agents on the registry
    Agents {
        #[command(subcommand)]
        command: AgentsCommand,
    },

    /// Stream simulated sentiment to the terminal
    Simulate {
        /// Scenario: balanced, very-negative, positive
        #[arg(short, long)]
        scenario: Option<Scenario>,

        /// Emission interval in milliseconds
        #[arg(short, long)]
        interval_ms: Option<u64>,

        /// Stop after this many seconds
        #[arg(short, long, default_value_t = 10)]
        duration_secs: u64,

        /// Generate this many values at once and print statistics instead
        #[arg(short, long)]
        batch: Option<usize>,
    },

    /// Compare simulated sentiment across service levels
    Demo {
        /// Samples per service level
        #[arg(short = 'n', long, default_value_t = 10)]
        count: usize,
    },

    /// Start an interactive support chat
    Support {
        /// Service level of the first session
        #[arg(short, long)]
        level: Option<ServiceLevel>,

        /// Answer with canned replies instead of calling the chat API
        #[arg(long)]
        offline: bool,
    },

    /// Suggest an agent profile for a business
    Suggest {
        /// Business description
        business: String,

        /// Regenerate only this field (name, bio, description)
        #[arg(short, long)]
        field: Option<SuggestionField>,
    },
}

/// Agent subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum AgentsCommand {
    /// List online agents
    List {
        /// Case-insensitive search text
        #[arg(short, long)]
        search: Option<String>,

        /// Only support-like agents
        #[arg(long)]
        support_only: bool,

        /// Page to show (1-based)
        #[arg(short, long, default_value_t = 1)]
        page: usize,

        /// Maximum entries to request from the registry
        #[arg(short, long)]
        limit: Option<usize>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show one agent's details
    Show {
        /// Agent identifier
        identifier: String,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Probe support agents and report which answer
    Test {
        /// Number of agents to probe
        #[arg(short, long, default_value_t = 5)]
        limit: usize,
    },

    /// Send a question to an agent and wait for the answer
    Query {
        /// Agent identifier; defaults to the best working support agent
        #[arg(short, long)]
        agent: Option<String>,

        /// Question text
        query: String,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
