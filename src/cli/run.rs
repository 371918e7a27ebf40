//! CLI entry point and dispatch logic
//!
//! This module owns the `run()` function which:
//! - Parses CLI arguments
//! - Initializes logging
//! - Builds CliArgs and discovers Config
//! - Creates the tokio runtime
//! - Dispatches to command handlers
//! - Handles all error output

use clap::Parser;

use super::args::{Cli, Commands};
use super::commands;

use crate::{CliArgs, Config, ExitCode, SdlcError};

/// Main CLI execution function.
///
/// Handles ALL output including errors and returns `Result<(), ExitCode>`:
/// - On success: returns `Ok(())` after printing any output
/// - On error: prints the user-facing report, returns `Err(ExitCode)`
///
/// main.rs only calls `std::process::exit(code.as_i32())` on error; it does not print.
pub fn run() -> Result<(), ExitCode> {
    let cli = Cli::parse();

    init_logging(&cli);

    let cli_args = CliArgs {
        config_path: cli.config.clone(),
        llm_provider: cli.provider.clone(),
        model: cli.model.clone(),
        timeout_secs: cli.timeout,
        max_steps: cli.max_steps,
        history_window: cli.history_window,
        observability: cli.observability.then_some(true),
    };

    let config = match Config::discover(&cli_args) {
        Ok(config) => config,
        Err(err) => return Err(report(&SdlcError::Config(err))),
    };

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("✗ Failed to create async runtime: {e}");
            return Err(ExitCode::INTERNAL);
        }
    };

    let result = rt.block_on(async {
        match cli.command {
            Commands::Run {
                prompt,
                auto_confirm,
                json,
            } => commands::execute_run_command(&prompt, auto_confirm, json, &config).await,
            Commands::Phases { json } => commands::execute_phases_command(json, &config),
            Commands::Config { json } => commands::execute_config_command(json, &config),
        }
    });

    if let Err(error) = result {
        return Err(match classify_error(error) {
            Ok(sdlc_error) => report(&sdlc_error),
            Err(error) => {
                let redacted = crate::redaction::redact_error_message(&format!("{error:#}"));
                eprintln!("✗ Unexpected error: {redacted}");
                eprintln!("\n  Run with --verbose for more detailed output");
                ExitCode::INTERNAL
            }
        });
    }

    Ok(())
}

/// Install the stderr subscriber. Returns `false` when one is already installed.
pub(crate) fn init_logging(cli: &Cli) -> bool {
    match crate::logging::init_tracing(cli.verbose, cli.log_format.into()) {
        Ok(()) => true,
        Err(err) => {
            tracing::debug!(error = %err, "tracing subscriber already installed");
            false
        }
    }
}

/// Recover the typed error behind a command failure.
///
/// I/O failures on stdin or stdout become [`SdlcError::Io`]; anything else is
/// returned unchanged.
pub(crate) fn classify_error(error: anyhow::Error) -> Result<SdlcError, anyhow::Error> {
    match error.downcast::<SdlcError>() {
        Ok(sdlc_error) => Ok(sdlc_error),
        Err(error) => error.downcast::<std::io::Error>().map(SdlcError::Io),
    }
}

fn report(error: &SdlcError) -> ExitCode {
    eprint!("{}", error.display_for_user());
    error.to_exit_code()
}
