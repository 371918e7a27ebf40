//! sdlcflow - confirmation-gated SDLC agent pipeline
//!
//! A workflow moves through seven fixed phases (intake → analysis → design →
//! implementation → testing → deployment → retrospective). Each phase is served by a
//! handler that asks an LLM for output; the workflow then halts until the caller
//! confirms, optionally with new input for the next phase.
//!
//! sdlcflow can be used in two ways:
//! - **CLI**: `sdlcflow run "Build a todo app"` drives a workflow interactively
//! - **Library**: embed [`WorkflowOrchestrator`] and drive workflows programmatically
//!
//! # Quick Start (CLI)
//!
//! ```bash
//! # Offline run with the stub backend, confirming every gate
//! sdlcflow run "Build a todo app" --provider stub --auto-confirm
//!
//! # List phases and their handlers
//! sdlcflow phases
//!
//! # Show effective configuration with sources
//! sdlcflow config --json
//! ```
//!
//! # Quick Start (Library)
//!
//! ```rust,no_run
//! use sdlcflow::{Config, WorkflowOrchestrator};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::builder().provider("stub").build()?;
//! let (orchestrator, _) = WorkflowOrchestrator::from_config(&config)?;
//!
//! let state = orchestrator.start("Build a todo app").await?;
//! let state = orchestrator
//!     .continue_with_confirmation(&state.workflow_id, Some("use React".to_string()))
//!     .await?;
//! assert_eq!(state.history.len(), 2);
//! # Ok(())
//! # }
//! ```
//!
//! # JSON Output
//!
//! State views and configuration are emitted in JCS (RFC 8785) canonical form. Use
//! [`emit_jcs`] for your own integrations.

// ============================================================================
// Stable Public API
// ============================================================================

/// Session-level API: start, confirm, edit and inspect workflows.
pub use sdlcflow_engine::WorkflowOrchestrator;

/// Serialized state shape returned by the control surface.
pub use sdlcflow_engine::WorkflowStateView;

pub use sdlcflow_engine::{
    NoopObserver, PhaseRegistry, RegistryBuilder, StepContext, StepObserver, StepOutcome,
    TracingObserver, WorkflowRunner,
};

/// The fixed pipeline phases.
pub use sdlcflow_utils::types::Phase;

pub use sdlcflow_phase_api::{AgentMessage, ArtifactMap, HandlerResult, PhaseHandler, WorkflowState};

/// Configuration with discovery and precedence: CLI > config file > defaults.
///
/// Use [`Config::discover()`] for CLI-like behavior or [`Config::builder()`]
/// for programmatic configuration.
pub use sdlcflow_config::Config;

/// Builder for programmatic configuration.
///
/// # Example
///
/// ```rust
/// use sdlcflow::Config;
/// use std::time::Duration;
///
/// let config = Config::builder()
///     .provider("stub")
///     .timeout(Duration::from_secs(30))
///     .max_steps(10)
///     .build()
///     .expect("valid config");
/// assert_eq!(config.workflow.max_steps, 10);
/// ```
pub use sdlcflow_config::ConfigBuilder;

/// CLI-level configuration overrides.
pub use sdlcflow_config::CliArgs;

/// Generation capability.
pub use sdlcflow_llm::{LlmBackend, LlmFallbackInfo, LlmInvocation, LlmResult, StubBackend};

/// Library-level error type.
///
/// Provides user-friendly reports via [`display_for_user()`](SdlcError::display_for_user)
/// and exit code mapping via [`to_exit_code()`](SdlcError::to_exit_code). Library code
/// never calls `std::process::exit()`.
pub use sdlcflow_utils::error::SdlcError;

pub use sdlcflow_utils::error::{
    ConfigError, ErrorCategory, LlmError, RegistryError, UserFriendlyError, WorkflowError,
};

/// Exit codes matching the documented exit code table.
pub use sdlcflow_utils::exit_codes::ExitCode;

pub use canonicalization::emit_jcs;

// ============================================================================
// Internal modules - accessible but not stable
// ============================================================================

mod canonicalization;

#[doc(hidden)]
pub use sdlcflow_utils::{logging, redaction};

#[doc(hidden)]
pub use sdlcflow_phases as phases;

#[cfg(any(test, feature = "test-utils"))]
#[doc(hidden)]
pub use sdlcflow_engine::test_support;

// CLI module - used by main.rs; exported for white-box tests of argument parsing
#[doc(hidden)]
pub mod cli;
