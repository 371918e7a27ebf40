//! Exit code constants and error mapping for sdlcflow.
//!
//! # Exit Code Table
//!
//! | Code | Constant | Description |
//! |------|----------|-------------|
//! | 0 | `SUCCESS` | Operation completed successfully |
//! | 1 | `INTERNAL` | General/internal failure |
//! | 2 | `CLI_ARGS` | Invalid CLI arguments or configuration |
//! | 3 | `WORKFLOW_NOT_FOUND` | Unknown workflow id |
//! | 4 | `INVALID_TRANSITION` | Confirmation while not pending |
//! | 5 | `ITERATION_LIMIT` | Auto-chaining bound exceeded |
//! | 70 | `GENERATION_FAILURE` | LLM backend invocation failed |

use crate::error::{LlmError, SdlcError, WorkflowError};

/// Exit codes matching the documented exit code table.
///
/// # Example
///
/// ```rust
/// use sdlcflow_utils::exit_codes::ExitCode;
///
/// assert_eq!(ExitCode::SUCCESS.as_i32(), 0);
/// assert_eq!(ExitCode::from_i32(70), ExitCode::GENERATION_FAILURE);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(i32);

impl ExitCode {
    /// Success - operation completed successfully
    pub const SUCCESS: ExitCode = ExitCode(0);

    /// Internal error - general failure
    pub const INTERNAL: ExitCode = ExitCode(1);

    /// CLI arguments error - invalid arguments or configuration
    pub const CLI_ARGS: ExitCode = ExitCode(2);

    /// Workflow not found - the workflow id is unknown to the session store
    pub const WORKFLOW_NOT_FOUND: ExitCode = ExitCode(3);

    /// Invalid transition - confirmation attempted while not pending
    pub const INVALID_TRANSITION: ExitCode = ExitCode(4);

    /// Iteration limit - phase handlers never reached a halting point
    pub const ITERATION_LIMIT: ExitCode = ExitCode(5);

    /// Generation failure - the LLM backend failed
    pub const GENERATION_FAILURE: ExitCode = ExitCode(70);

    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self.0
    }

    #[must_use]
    pub const fn from_i32(code: i32) -> Self {
        ExitCode(code)
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code.0
    }
}

impl SdlcError {
    /// Map this error to a CLI exit code.
    #[must_use]
    pub fn to_exit_code(&self) -> ExitCode {
        match self {
            Self::Config(_) | Self::Registry(_) => ExitCode::CLI_ARGS,
            Self::Workflow(err) => err.to_exit_code(),
            Self::Llm(err) => llm_exit_code(err),
            Self::Io(_) => ExitCode::INTERNAL,
        }
    }
}

impl WorkflowError {
    /// Map this error to a CLI exit code.
    #[must_use]
    pub fn to_exit_code(&self) -> ExitCode {
        match self {
            Self::NotFound { .. } => ExitCode::WORKFLOW_NOT_FOUND,
            Self::InvalidTransition { .. } => ExitCode::INVALID_TRANSITION,
            Self::IterationLimitExceeded { .. } => ExitCode::ITERATION_LIMIT,
            Self::Generation(err) => llm_exit_code(err),
        }
    }

    /// HTTP status a request/response surface would report for this error.
    #[must_use]
    pub fn http_status(&self) -> u16 {
        match self {
            Self::NotFound { .. } => 404,
            Self::InvalidTransition { .. } => 409,
            Self::IterationLimitExceeded { .. } => 500,
            Self::Generation(_) => 502,
        }
    }
}

fn llm_exit_code(err: &LlmError) -> ExitCode {
    match err {
        LlmError::Misconfiguration(_) | LlmError::Unsupported(_) => ExitCode::CLI_ARGS,
        _ => ExitCode::GENERATION_FAILURE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;
    use crate::types::Phase;

    #[test]
    fn test_workflow_errors_map_to_distinct_codes() {
        let not_found = WorkflowError::NotFound {
            workflow_id: "x".to_string(),
        };
        let invalid = WorkflowError::InvalidTransition {
            workflow_id: "x".to_string(),
            reason: "not pending".to_string(),
        };
        let limit = WorkflowError::IterationLimitExceeded {
            workflow_id: "x".to_string(),
            phase: Phase::Intake,
            limit: 1,
        };

        assert_eq!(not_found.to_exit_code(), ExitCode::WORKFLOW_NOT_FOUND);
        assert_eq!(invalid.to_exit_code(), ExitCode::INVALID_TRANSITION);
        assert_eq!(limit.to_exit_code(), ExitCode::ITERATION_LIMIT);
        assert_eq!(not_found.http_status(), 404);
        assert_eq!(invalid.http_status(), 409);
    }

    #[test]
    fn test_generation_errors_map_to_generation_failure() {
        let err = SdlcError::from(WorkflowError::Generation(LlmError::Transport(
            "connection reset".to_string(),
        )));
        assert_eq!(err.to_exit_code(), ExitCode::GENERATION_FAILURE);

        let err = SdlcError::from(LlmError::Misconfiguration("no key".to_string()));
        assert_eq!(err.to_exit_code(), ExitCode::CLI_ARGS);
    }

    #[test]
    fn test_config_errors_map_to_cli_args() {
        let err = SdlcError::from(ConfigError::InvalidFile("bad toml".to_string()));
        assert_eq!(err.to_exit_code(), ExitCode::CLI_ARGS);
    }
}
