//! Workflow orchestrator
//!
//! The session-level API over [`WorkflowRunner`]: start a workflow, confirm a gate,
//! edit the pending input and inspect state. Every operation either commits a complete
//! new snapshot or leaves the stored one untouched.
//!
//! # Example
//!
//! ```rust,no_run
//! use sdlcflow_config::Config;
//! use sdlcflow_engine::WorkflowOrchestrator;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let (orchestrator, _fallback) = WorkflowOrchestrator::from_config(&Config::default())?;
//!
//! let state = orchestrator.start("Build a todo app").await?;
//! assert!(state.pending_confirmation);
//!
//! let state = orchestrator
//!     .continue_with_confirmation(&state.workflow_id, Some("use React".to_string()))
//!     .await?;
//! println!("now at {:?}", state.phase);
//! # Ok(())
//! # }
//! ```

mod store;

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use sdlcflow_config::Config;
use sdlcflow_llm::{LlmBackend, LlmFallbackInfo};
use sdlcflow_phase_api::{Phase, PhaseHandler, WorkflowState};
use sdlcflow_utils::error::{RegistryError, SdlcError, WorkflowError};

use crate::observer::observer_for;
use crate::registry::PhaseRegistry;
use crate::runner::WorkflowRunner;

use self::store::{Session, SessionStore};

/// Owns the workflow sessions of one process.
#[derive(Debug)]
pub struct WorkflowOrchestrator {
    runner: WorkflowRunner,
    store: SessionStore,
}

impl WorkflowOrchestrator {
    #[must_use]
    pub fn new(runner: WorkflowRunner) -> Self {
        Self {
            runner,
            store: SessionStore::default(),
        }
    }

    /// Orchestrator over the default handlers, all generating through `backend`.
    ///
    /// # Errors
    ///
    /// Returns a registry error if a default handler is missing.
    pub fn with_backend(config: &Config, backend: Arc<dyn LlmBackend>) -> Result<Self, SdlcError> {
        let registry = PhaseRegistry::from_config(backend, config)?;
        let runner = WorkflowRunner::from_config(registry, config)
            .with_observer(observer_for(config.observability.enabled));
        Ok(Self::new(runner))
    }

    /// Orchestrator with the backend selected by `[llm] provider`.
    ///
    /// The second value reports a fallback from `auto` to the stub backend.
    ///
    /// # Errors
    ///
    /// Returns an LLM error for an unusable provider configuration.
    pub fn from_config(config: &Config) -> Result<(Self, Option<LlmFallbackInfo>), SdlcError> {
        let (backend, fallback) = sdlcflow_llm::from_config(config)?;
        Ok((Self::with_backend(config, backend)?, fallback))
    }

    /// Create a workflow and run it to its first halt.
    ///
    /// Nothing is stored if the first run fails.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Generation`] or [`WorkflowError::IterationLimitExceeded`].
    pub async fn start(
        &self,
        initial_message: impl Into<String>,
    ) -> Result<WorkflowState, WorkflowError> {
        let workflow_id = Uuid::new_v4().to_string();
        info!(workflow_id = %workflow_id, "Starting workflow");

        let state = WorkflowState::new(workflow_id, Some(initial_message.into()));
        let state = self.runner.advance(state).await?;

        self.store.insert(state.clone());
        Ok(state)
    }

    /// Clear the confirmation gate and run to the next halt.
    ///
    /// `message` becomes the input of the next step; `None` clears any staged input.
    ///
    /// # Errors
    ///
    /// - [`WorkflowError::NotFound`] for an unknown id
    /// - [`WorkflowError::InvalidTransition`] if the workflow is not waiting for
    ///   confirmation, which includes completed workflows
    /// - any error of the run itself; the stored snapshot is then unchanged
    pub async fn continue_with_confirmation(
        &self,
        workflow_id: &str,
        message: Option<String>,
    ) -> Result<WorkflowState, WorkflowError> {
        let session = self.session(workflow_id)?;
        let _op = session.lock().await;

        let mut working = session.snapshot();
        if !working.pending_confirmation {
            let reason = if working.is_complete() {
                "Workflow has already completed; there is nothing to confirm"
            } else {
                "Workflow is not awaiting confirmation; cannot advance"
            };
            return Err(WorkflowError::InvalidTransition {
                workflow_id: workflow_id.to_string(),
                reason: reason.to_string(),
            });
        }

        debug!(
            workflow_id = %workflow_id,
            phase = ?working.phase.map(|p| p.as_str()),
            has_message = message.is_some(),
            "Confirmation received"
        );

        working.pending_confirmation = false;
        working.user_message = message;
        let next = self.runner.advance(working).await?;

        session.commit(next.clone());
        Ok(next)
    }

    /// Replace the staged input without running anything.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::NotFound`] for an unknown id.
    pub async fn update_user_message(
        &self,
        workflow_id: &str,
        message: impl Into<String>,
    ) -> Result<WorkflowState, WorkflowError> {
        let session = self.session(workflow_id)?;
        let _op = session.lock().await;

        let mut working = session.snapshot();
        working.user_message = Some(message.into());
        working.updated_at = Utc::now();

        session.commit(working.clone());
        Ok(working)
    }

    /// Copy of the last committed snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::NotFound`] for an unknown id.
    pub fn get_state(&self, workflow_id: &str) -> Result<WorkflowState, WorkflowError> {
        Ok(self.session(workflow_id)?.snapshot())
    }

    /// Substitute the handler for `phase` in subsequent steps.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::PhaseMismatch`] if the handler serves another phase.
    pub fn override_handler(
        &self,
        phase: Phase,
        handler: Arc<dyn PhaseHandler>,
    ) -> Result<(), RegistryError> {
        self.runner.override_handler(phase, handler)
    }

    #[must_use]
    pub fn available_phases(&self) -> Vec<Phase> {
        self.runner.registry().available_phases()
    }

    /// Identifier of the handler currently bound to `phase`.
    #[must_use]
    pub fn handler_id(&self, phase: Phase) -> String {
        self.runner.registry().get(phase).id().to_string()
    }

    /// Number of stored workflows.
    #[must_use]
    pub fn session_count(&self) -> usize {
        self.store.len()
    }

    fn session(&self, workflow_id: &str) -> Result<Arc<Session>, WorkflowError> {
        self.store
            .get(workflow_id)
            .ok_or_else(|| WorkflowError::NotFound {
                workflow_id: workflow_id.to_string(),
            })
    }
}
