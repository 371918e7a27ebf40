//! Workflow runner
//!
//! The transition function over [`Phase`]. One call to [`WorkflowRunner::advance`]
//! executes phase steps until the workflow halts at a confirmation gate, reaches the
//! terminal state, or runs past the configured step bound.

use std::sync::{Arc, PoisonError, RwLock};

use chrono::Utc;
use tracing::{Instrument, debug, warn};

use sdlcflow_config::Config;
use sdlcflow_phase_api::{AgentMessage, Phase, PhaseHandler, WorkflowState};
use sdlcflow_utils::error::{RegistryError, WorkflowError};

use crate::observer::{NoopObserver, StepContext, StepGuard, StepObserver};
use crate::registry::PhaseRegistry;

/// Executes phase steps against a registry.
pub struct WorkflowRunner {
    registry: RwLock<Arc<PhaseRegistry>>,
    observer: Arc<dyn StepObserver>,
    max_steps: usize,
}

impl std::fmt::Debug for WorkflowRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowRunner")
            .field("registry", &self.registry())
            .field("max_steps", &self.max_steps)
            .finish_non_exhaustive()
    }
}

impl WorkflowRunner {
    /// Runner without observability. `max_steps` is clamped to at least one.
    #[must_use]
    pub fn new(registry: PhaseRegistry, max_steps: usize) -> Self {
        Self {
            registry: RwLock::new(Arc::new(registry)),
            observer: Arc::new(NoopObserver),
            max_steps: max_steps.max(1),
        }
    }

    /// Runner bounded by `[workflow] max_steps`.
    #[must_use]
    pub fn from_config(registry: PhaseRegistry, config: &Config) -> Self {
        Self::new(registry, config.workflow.max_steps)
    }

    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn StepObserver>) -> Self {
        self.observer = observer;
        self
    }

    #[must_use]
    pub fn max_steps(&self) -> usize {
        self.max_steps
    }

    /// Current registry. Steps already running keep the registry they started with.
    #[must_use]
    pub fn registry(&self) -> Arc<PhaseRegistry> {
        Arc::clone(&self.registry.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Replace the handler for `phase` in subsequent steps.
    pub fn override_handler(
        &self,
        phase: Phase,
        handler: Arc<dyn PhaseHandler>,
    ) -> Result<(), RegistryError> {
        let mut guard = self.registry.write().unwrap_or_else(PoisonError::into_inner);
        let mut next = PhaseRegistry::clone(&guard);
        next.override_handler(phase, handler)?;
        *guard = Arc::new(next);
        Ok(())
    }

    /// Run steps until the workflow halts.
    ///
    /// A terminal snapshot is returned unchanged, as is a snapshot already waiting
    /// for confirmation. The snapshot is consumed; on error the partial work is
    /// dropped with it.
    ///
    /// # Errors
    ///
    /// - [`WorkflowError::Generation`] when a handler's backend fails
    /// - [`WorkflowError::IterationLimitExceeded`] after `max_steps` consecutive steps
    ///   without reaching a halt point
    pub async fn advance(&self, mut state: WorkflowState) -> Result<WorkflowState, WorkflowError> {
        let registry = self.registry();
        let mut steps = 0usize;

        while let Some(phase) = state.phase {
            if state.pending_confirmation {
                break;
            }
            if steps == self.max_steps {
                warn!(
                    workflow_id = %state.workflow_id,
                    phase = %phase,
                    limit = self.max_steps,
                    "Step bound reached without a halt point"
                );
                return Err(WorkflowError::IterationLimitExceeded {
                    workflow_id: state.workflow_id,
                    phase,
                    limit: self.max_steps,
                });
            }

            self.step(registry.get(phase).as_ref(), phase, &mut state)
                .await?;
            steps += 1;
        }

        debug!(
            workflow_id = %state.workflow_id,
            steps,
            phase = ?state.phase.map(|p| p.as_str()),
            pending = state.pending_confirmation,
            "Workflow halted"
        );
        Ok(state)
    }

    async fn step(
        &self,
        handler: &dyn PhaseHandler,
        phase: Phase,
        state: &mut WorkflowState,
    ) -> Result<(), WorkflowError> {
        let mut guard = StepGuard::begin(
            Arc::clone(&self.observer),
            StepContext::new(state.workflow_id.clone(), phase),
        );

        let span = sdlcflow_utils::logging::workflow_span(&state.workflow_id, phase.as_str());
        let snapshot: &WorkflowState = state;
        let outcome = handler
            .run(snapshot, snapshot.user_message.as_deref())
            .instrument(span)
            .await;

        let result = match outcome {
            Ok(result) => {
                guard.succeed();
                result
            }
            Err(err) => {
                guard.fail(err.to_string());
                return Err(WorkflowError::Generation(err));
            }
        };
        drop(guard);

        let sender = handler.id().to_string();
        state.history.push(AgentMessage {
            sender: sender.clone(),
            phase,
            content: result.output.clone(),
            metadata: result.artifacts.clone(),
        });
        state.artifacts.insert(sender, result.artifacts.clone());
        state.pending_confirmation = result.requires_confirmation;
        state.phase = result.suggested_next_phase;
        state.user_message = None;
        state.last_result = Some(result);
        state.updated_at = Utc::now();

        Ok(())
    }
}
