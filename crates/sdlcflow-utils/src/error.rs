use std::fmt;
use std::time::Duration;
use thiserror::Error;

use crate::types::Phase;

/// Library-level error type with user-friendly reporting.
///
/// `SdlcError` is the error returned at the crate boundary. It provides:
/// - Detailed variants for programmatic handling
/// - User-friendly messages with context and suggestions
/// - Mapping to CLI exit codes
///
/// # Exit Code Mapping
///
/// | Exit Code | Error Type |
/// |-----------|------------|
/// | 2 | Configuration / registry errors |
/// | 3 | Unknown workflow id |
/// | 4 | Confirmation while not pending |
/// | 5 | Auto-chaining iteration limit exceeded |
/// | 70 | Generation backend failure |
/// | 1 | Other errors |
///
/// Library code returns `SdlcError` and never calls `std::process::exit()`.
#[derive(Error, Debug)]
pub enum SdlcError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Workflow error: {0}")]
    Workflow(#[from] WorkflowError),

    #[error("LLM backend error: {0}")]
    Llm(#[from] LlmError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Trait for providing user-friendly error reporting with context and suggestions
pub trait UserFriendlyError {
    /// Get a user-friendly error message
    fn user_message(&self) -> String;

    /// Get contextual information about the error
    fn context(&self) -> Option<String>;

    /// Get suggested actions to resolve the error
    fn suggestions(&self) -> Vec<String>;

    /// Get the error category for grouping similar errors
    fn category(&self) -> ErrorCategory;
}

/// Categories of errors for better organization and handling
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Workflow,
    Generation,
    Io,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration => write!(f, "Configuration"),
            Self::Workflow => write!(f, "Workflow"),
            Self::Generation => write!(f, "Generation"),
            Self::Io => write!(f, "I/O"),
        }
    }
}

/// Configuration-related errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid configuration file: {0}")]
    InvalidFile(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Invalid configuration value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found at {path}")]
    NotFound { path: String },

    #[error("Configuration discovery failed: {reason}")]
    DiscoveryFailed { reason: String },
}

/// Errors raised while assembling the phase registry.
///
/// A registry that constructs successfully is total over [`Phase::ALL`], so these are
/// the only place a missing handler can surface.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("No handler registered for phase '{0}'")]
    MissingHandler(Phase),

    #[error("Handler '{handler}' serves phase '{actual}' but was bound to '{bound}'")]
    PhaseMismatch {
        handler: String,
        bound: Phase,
        actual: Phase,
    },

    #[error("Phase '{phase}' is already bound to '{existing}'; refusing '{rejected}'")]
    DuplicateHandler {
        phase: Phase,
        existing: String,
        rejected: String,
    },
}

/// Errors surfaced by workflow operations.
#[derive(Error, Debug)]
pub enum WorkflowError {
    /// The workflow id is not known to the session store.
    #[error("Workflow {workflow_id} not found")]
    NotFound { workflow_id: String },

    /// Confirmation attempted while the workflow is not waiting for one.
    #[error("Invalid transition for workflow {workflow_id}: {reason}")]
    InvalidTransition { workflow_id: String, reason: String },

    /// The auto-chaining loop ran past its bound without reaching a halt point.
    #[error(
        "Workflow {workflow_id} exceeded {limit} consecutive phase steps (still at {phase}); \
         the handler graph has no reachable halting point"
    )]
    IterationLimitExceeded {
        workflow_id: String,
        phase: Phase,
        limit: usize,
    },

    /// The generation backend failed while running a phase handler.
    #[error("Generation failed: {0}")]
    Generation(#[from] LlmError),
}

/// LLM backend errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LlmError {
    /// Transport-level failure (HTTP connectivity, malformed response)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Provider authentication failure (401, 403, missing API key)
    #[error("Provider authentication error: {0}")]
    ProviderAuth(String),

    /// Provider quota/rate limit exceeded (429)
    #[error("Provider quota exceeded: {0}")]
    ProviderQuota(String),

    /// Provider service outage (5xx errors)
    #[error("Provider outage: {0}")]
    ProviderOutage(String),

    /// Invocation timed out
    #[error("Timeout after {duration:?}")]
    Timeout { duration: Duration },

    /// Configuration error
    #[error("Misconfiguration: {0}")]
    Misconfiguration(String),

    /// Unsupported feature or provider
    #[error("Unsupported: {0}")]
    Unsupported(String),
}

impl UserFriendlyError for SdlcError {
    fn user_message(&self) -> String {
        match self {
            Self::Config(err) => err.user_message(),
            Self::Registry(err) => format!("Phase registry is invalid: {err}"),
            Self::Workflow(err) => err.user_message(),
            Self::Llm(err) => err.user_message(),
            Self::Io(err) => format!("Reading input or writing output failed: {err}"),
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::Config(err) => err.context(),
            Self::Registry(_) => Some(
                "Every phase of the pipeline must be bound to exactly one handler.".to_string(),
            ),
            Self::Workflow(err) => err.context(),
            Self::Llm(err) => err.context(),
            Self::Io(_) => None,
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Config(err) => err.suggestions(),
            Self::Registry(_) => vec![
                "Register a handler for every phase before building the registry".to_string(),
            ],
            Self::Workflow(err) => err.suggestions(),
            Self::Llm(err) => err.suggestions(),
            Self::Io(_) => vec![
                "Check that the terminal or pipe connected to sdlcflow is still open".to_string(),
            ],
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Config(_) | Self::Registry(_) => ErrorCategory::Configuration,
            Self::Workflow(err) => err.category(),
            Self::Llm(_) => ErrorCategory::Generation,
            Self::Io(_) => ErrorCategory::Io,
        }
    }
}

impl SdlcError {
    /// User-facing report: message, optional context and suggestions.
    ///
    /// The whole report is redacted before it is returned.
    #[must_use]
    pub fn display_for_user(&self) -> String {
        let mut output = format!("Error: {}\n", self.user_message());

        if let Some(ctx) = self.context() {
            output.push_str(&format!("\nContext: {ctx}\n"));
        }

        let suggestions = self.suggestions();
        if !suggestions.is_empty() {
            output.push_str("\nSuggestions:\n");
            for suggestion in suggestions {
                output.push_str(&format!("  • {suggestion}\n"));
            }
        }

        crate::redaction::redact_error_message(&output)
    }
}

impl UserFriendlyError for ConfigError {
    fn user_message(&self) -> String {
        match self {
            Self::InvalidFile(msg) => format!("The configuration file is invalid: {msg}"),
            Self::MissingRequired(key) => format!("Required setting '{key}' is missing"),
            Self::InvalidValue { key, value } => format!("Setting '{key}' is invalid: {value}"),
            Self::NotFound { path } => format!("No configuration file at {path}"),
            Self::DiscoveryFailed { reason } => {
                format!("Could not locate configuration: {reason}")
            }
        }
    }

    fn context(&self) -> Option<String> {
        Some(
            "Configuration precedence is CLI flags > .sdlcflow/config.toml > built-in defaults."
                .to_string(),
        )
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::NotFound { .. } => vec![
                "Check the --config path or SDLCFLOW_CONFIG environment variable".to_string(),
            ],
            Self::InvalidFile(_) => vec!["Validate the TOML syntax of the config file".to_string()],
            _ => vec!["Run `sdlcflow config` to inspect the effective configuration".to_string()],
        }
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Configuration
    }
}

impl UserFriendlyError for WorkflowError {
    fn user_message(&self) -> String {
        match self {
            Self::NotFound { workflow_id } => format!("Unknown workflow '{workflow_id}'"),
            Self::InvalidTransition { reason, .. } => reason.clone(),
            Self::IterationLimitExceeded { limit, phase, .. } => format!(
                "Phase handlers kept advancing without a confirmation gate ({limit} steps, stopped at {phase})"
            ),
            Self::Generation(err) => err.user_message(),
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::NotFound { .. } => {
                Some("Workflow sessions only live for the lifetime of the process.".to_string())
            }
            Self::InvalidTransition { .. } => Some(
                "A workflow can only be confirmed while it is waiting at a confirmation gate."
                    .to_string(),
            ),
            Self::IterationLimitExceeded { .. } => Some(
                "This indicates a handler configuration bug such as a self-referencing phase."
                    .to_string(),
            ),
            Self::Generation(err) => err.context(),
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::NotFound { .. } => vec!["Start a new workflow".to_string()],
            Self::InvalidTransition { .. } => {
                vec!["Inspect the workflow state before confirming".to_string()]
            }
            Self::IterationLimitExceeded { .. } => vec![
                "Check suggested_next_phase and requires_confirmation of overridden handlers"
                    .to_string(),
                "Raise [workflow] max_steps only if the pipeline legitimately needs more steps"
                    .to_string(),
            ],
            Self::Generation(err) => err.suggestions(),
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::IterationLimitExceeded { .. } => ErrorCategory::Configuration,
            Self::Generation(_) => ErrorCategory::Generation,
            _ => ErrorCategory::Workflow,
        }
    }
}

impl UserFriendlyError for LlmError {
    fn user_message(&self) -> String {
        match self {
            Self::Transport(msg) => format!("LLM transport error: {msg}"),
            Self::ProviderAuth(msg) => format!("LLM provider rejected the credentials: {msg}"),
            Self::ProviderQuota(msg) => format!("LLM provider quota exceeded: {msg}"),
            Self::ProviderOutage(msg) => format!("LLM provider is unavailable: {msg}"),
            Self::Timeout { duration } => {
                format!("LLM invocation timed out after {}s", duration.as_secs())
            }
            Self::Misconfiguration(msg) => format!("LLM backend is misconfigured: {msg}"),
            Self::Unsupported(msg) => format!("Unsupported LLM configuration: {msg}"),
        }
    }

    fn context(&self) -> Option<String> {
        Some(
            "The failed phase was not committed; the workflow keeps its previous state."
                .to_string(),
        )
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::ProviderAuth(_) => vec!["Check that OPENAI_API_KEY is set and valid".to_string()],
            Self::ProviderQuota(_) => vec!["Wait for the rate limit window to reset".to_string()],
            Self::Timeout { .. } => vec!["Increase [llm] timeout_secs".to_string()],
            Self::Misconfiguration(_) | Self::Unsupported(_) => vec![
                "Use --provider stub to run without network access".to_string(),
            ],
            _ => vec!["Retry the confirmation once the provider is reachable".to_string()],
        }
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Generation
    }
}
