//! CLI argument definitions and parsing structures
//!
//! This module defines the command-line interface structure using clap,
//! including the main `Cli` struct and the subcommand enum.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use sdlcflow_utils::logging::LogFormat;

/// sdlcflow - confirmation-gated SDLC agent pipeline
#[derive(Parser, Debug)]
#[command(name = "sdlcflow")]
#[command(about = "Drive a software project through SDLC phases with LLM agents")]
#[command(long_about = r#"
sdlcflow runs a prompt through a fixed pipeline of agents. Each agent serves one
phase and the workflow pauses after every phase until you confirm it.

EXAMPLES:
  # Start a workflow and confirm each phase interactively
  sdlcflow run "Build a todo app"

  # Fully automated offline run
  sdlcflow run "Build a todo app" --provider stub --auto-confirm

  # Emit every state as canonical JSON (one object per line)
  sdlcflow run "Build a todo app" --auto-confirm --json

  # Show phases and configuration
  sdlcflow phases
  sdlcflow config --json

AT A CONFIRMATION GATE:
  <text>          confirm and pass <text> to the next phase
  <empty line>    confirm with the staged message, if any
  :edit <text>    stage <text> without confirming
  :show           print the current state as JSON
  :quit           stop; the workflow id is printed

CONFIGURATION:
  Configuration is loaded with precedence: CLI flags > config file > defaults
  The config file is --config, else $SDLCFLOW_CONFIG, else the nearest
  .sdlcflow/config.toml searching upward from the current directory

PHASES:
  intake → analysis → design → implementation → testing → deployment → retrospective
"#)]
#[command(version)]
pub struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// LLM provider: auto, openai or stub
    #[arg(long, global = true)]
    pub provider: Option<String>,

    /// Model used for every phase without a per-phase override
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// LLM invocation timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Maximum consecutive phase steps without a confirmation gate
    #[arg(long, global = true)]
    pub max_steps: Option<usize>,

    /// Number of history messages included in each agent's input
    #[arg(long, global = true)]
    pub history_window: Option<usize>,

    /// Emit per-step observability events
    #[arg(long, global = true)]
    pub observability: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormatArg::Compact)]
    pub log_format: LogFormatArg,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start a workflow from a prompt and drive it through the pipeline
    Run {
        /// Initial project description
        prompt: String,

        /// Confirm every phase without waiting for input
        #[arg(long)]
        auto_confirm: bool,

        /// Print state views as canonical JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// List the pipeline phases and the agents bound to them
    Phases {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the effective configuration and where each value came from
    Config {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Log format selectable on the command line.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormatArg {
    Compact,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Compact => LogFormat::Compact,
            LogFormatArg::Json => LogFormat::Json,
        }
    }
}

/// Build the clap command, for introspection in tests and tooling.
#[must_use]
pub fn build_cli() -> clap::Command {
    <Cli as clap::CommandFactory>::command()
}
