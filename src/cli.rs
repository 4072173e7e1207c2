//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use teams_inventory_core::walker::ExtractionMode;

/// Export Teams metadata from Microsoft Graph.
///
/// Walks every joined team and its channels, collecting either OneNote
/// notebooks with their sections or Planner task-list tabs, and writes the
/// flattened records to a JSON file. The tasks command exports the buckets,
/// tasks and checklist items of Planner plans instead. The bearer token is read from
/// ACCESS_TOKEN (or MS_ACCESS_TOKEN), optionally via a .env file.
#[derive(Parser, Debug)]
#[command(name = "teams-inventory")]
#[command(author, version, about)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Graph API base URL
    #[arg(long, global = true, value_name = "URL")]
    pub base_url: Option<String>,

    /// Output file (defaults to a per-mode file in the current directory)
    #[arg(short, long, global = true, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Read the team list from a JSON file instead of querying joined teams
    #[arg(long, global = true, value_name = "PATH")]
    pub teams_file: Option<PathBuf>,

    /// Only process the team with this id (repeatable)
    #[arg(long = "team", global = true, value_name = "TEAM_ID")]
    pub teams: Vec<String>,

    /// Pause between teams in milliseconds (0 to disable, max 60000)
    #[arg(short = 'l', long, global = true, value_parser = clap::value_parser!(u64).range(0..=60000))]
    pub team_delay_ms: Option<u64>,

    /// Keep going when the token is rejected instead of aborting the run
    #[arg(long, global = true)]
    pub continue_on_auth_error: bool,
}

/// What to extract.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Export OneNote notebooks and their sections
    Notebooks,
    /// Export Planner task-list tabs per channel
    Planner,
    /// Export bucket, task and checklist rows of Planner plans
    Tasks {
        /// Plan to export (repeatable); without it, plans are collected
        /// from the task-list tabs of every team
        #[arg(long = "plan", value_name = "PLAN_ID")]
        plans: Vec<String>,
    },
}

impl Command {
    /// Walk mode selected by this subcommand.
    #[must_use]
    pub fn mode(&self) -> ExtractionMode {
        match self {
            Self::Notebooks => ExtractionMode::Notebooks,
            Self::Planner => ExtractionMode::Planner,
            Self::Tasks { .. } => ExtractionMode::Tasks,
        }
    }

    /// Plan ids given on the command line.
    #[must_use]
    pub fn plan_ids(&self) -> &[String] {
        match self {
            Self::Tasks { plans } => plans,
            Self::Notebooks | Self::Planner => &[],
        }
    }
}
