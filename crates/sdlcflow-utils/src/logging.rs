//! Logging and observability infrastructure for sdlcflow
//!
//! Structured logging via `tracing`. Workflow steps are logged with the workflow id,
//! the phase and the step duration so a run can be followed from the log alone.

use std::io::IsTerminal;
use tracing::{Level, error, info, span};
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::redaction::redact_error_message;

/// Output format of the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable single-line events.
    #[default]
    Compact,
    /// One JSON object per event.
    Json,
}

/// Check if colored output should be used.
///
/// Logs go to stderr, so color is only enabled when stderr is a terminal and
/// `NO_COLOR` is not set.
fn use_color() -> bool {
    std::io::stderr().is_terminal() && std::env::var_os("NO_COLOR").is_none()
}

fn default_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| {
            if verbose {
                EnvFilter::try_new("sdlcflow=debug,info")
            } else {
                EnvFilter::try_new("sdlcflow=info,warn")
            }
        })
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initialize the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the built-in filter. Verbose mode lowers the
/// crate's level to `debug`, prints targets and emits span close events with timings.
///
/// Returns an error if a global subscriber is already installed.
pub fn init_tracing(
    verbose: bool,
    format: LogFormat,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let env_filter = default_filter(verbose);
    let span_events = if verbose {
        FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    fmt::layer()
                        .json()
                        .with_writer(std::io::stderr)
                        .with_span_events(span_events)
                        .with_current_span(true),
                )
                .try_init()?;
        }
        LogFormat::Compact => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_ansi(use_color())
                        .with_target(verbose)
                        .with_thread_ids(false)
                        .with_thread_names(false)
                        .with_line_number(false)
                        .with_file(false)
                        .with_span_events(span_events)
                        .compact(),
                )
                .try_init()?;
        }
    }

    Ok(())
}

/// Create a span covering one workflow step.
pub fn workflow_span(workflow_id: &str, phase: &str) -> tracing::Span {
    span!(
        Level::INFO,
        "workflow_step",
        workflow_id = %workflow_id,
        phase = %phase,
    )
}

/// Log step start with structured fields
pub fn log_step_start(workflow_id: &str, step: &str) {
    info!(
        workflow_id = %workflow_id,
        step = %step,
        "Starting workflow step"
    );
}

/// Log step completion with duration
pub fn log_step_complete(workflow_id: &str, step: &str, duration_ms: u128) {
    info!(
        workflow_id = %workflow_id,
        step = %step,
        duration_ms = %duration_ms,
        "Workflow step completed"
    );
}

/// Log step failure with context.
///
/// The error message is redacted before it is recorded.
pub fn log_step_error(workflow_id: &str, step: &str, error: &str, duration_ms: u128) {
    let sanitized_error = redact_error_message(error);
    error!(
        workflow_id = %workflow_id,
        step = %step,
        duration_ms = %duration_ms,
        error = %sanitized_error,
        "Workflow step failed"
    );
}
