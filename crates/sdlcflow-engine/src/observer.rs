//! Observability around phase steps
//!
//! Every handler invocation is bracketed by [`StepObserver::begin`] and
//! [`StepObserver::end`]. The bracket is held by a [`StepGuard`], so `end` runs
//! exactly once on success, on failure, and when the step future is dropped.

use std::sync::Arc;
use std::time::{Duration, Instant};

use sdlcflow_phase_api::Phase;
use sdlcflow_utils::logging;

/// What a step bracket is about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepContext {
    /// `<phase>_agent`
    pub step_name: String,
    pub workflow_id: String,
    pub phase: Phase,
}

impl StepContext {
    #[must_use]
    pub fn new(workflow_id: impl Into<String>, phase: Phase) -> Self {
        Self {
            step_name: format!("{phase}_agent"),
            workflow_id: workflow_id.into(),
            phase,
        }
    }
}

/// How a bracketed step ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Success,
    Failure { error: String },
    /// The guard was dropped before an outcome was recorded.
    Abandoned,
}

/// Scoped begin/end hooks around each handler invocation.
///
/// Implementations must not influence the workflow; the runner behaves the same
/// with [`NoopObserver`].
pub trait StepObserver: Send + Sync {
    fn begin(&self, ctx: &StepContext);

    fn end(&self, ctx: &StepContext, outcome: &StepOutcome, elapsed: Duration);
}

/// Observer that does nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl StepObserver for NoopObserver {
    fn begin(&self, _ctx: &StepContext) {}

    fn end(&self, _ctx: &StepContext, _outcome: &StepOutcome, _elapsed: Duration) {}
}

/// Observer that emits structured `tracing` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl StepObserver for TracingObserver {
    fn begin(&self, ctx: &StepContext) {
        logging::log_step_start(&ctx.workflow_id, &ctx.step_name);
    }

    fn end(&self, ctx: &StepContext, outcome: &StepOutcome, elapsed: Duration) {
        let duration_ms = elapsed.as_millis();
        match outcome {
            StepOutcome::Success => {
                logging::log_step_complete(&ctx.workflow_id, &ctx.step_name, duration_ms);
            }
            StepOutcome::Failure { error } => {
                logging::log_step_error(&ctx.workflow_id, &ctx.step_name, error, duration_ms);
            }
            StepOutcome::Abandoned => {
                logging::log_step_error(
                    &ctx.workflow_id,
                    &ctx.step_name,
                    "step abandoned before completion",
                    duration_ms,
                );
            }
        }
    }
}

/// RAII bracket for one step.
pub struct StepGuard {
    observer: Arc<dyn StepObserver>,
    ctx: StepContext,
    started: Instant,
    outcome: Option<StepOutcome>,
}

impl StepGuard {
    /// Call `begin` and return the guard that will call `end`.
    #[must_use]
    pub fn begin(observer: Arc<dyn StepObserver>, ctx: StepContext) -> Self {
        observer.begin(&ctx);
        Self {
            observer,
            ctx,
            started: Instant::now(),
            outcome: None,
        }
    }

    pub fn succeed(&mut self) {
        self.outcome = Some(StepOutcome::Success);
    }

    pub fn fail(&mut self, error: impl Into<String>) {
        self.outcome = Some(StepOutcome::Failure {
            error: error.into(),
        });
    }
}

impl Drop for StepGuard {
    fn drop(&mut self) {
        let outcome = self.outcome.take().unwrap_or(StepOutcome::Abandoned);
        self.observer
            .end(&self.ctx, &outcome, self.started.elapsed());
    }
}

/// Observer selected by `[observability] enabled`.
#[must_use]
pub fn observer_for(enabled: bool) -> Arc<dyn StepObserver> {
    if enabled {
        Arc::new(TracingObserver)
    } else {
        Arc::new(NoopObserver)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ObservedEvent, RecordingObserver};

    #[test]
    fn test_step_name_uses_phase() {
        let ctx = StepContext::new("wf", Phase::Deployment);
        assert_eq!(ctx.step_name, "deployment_agent");
    }

    #[test]
    fn test_guard_reports_recorded_outcome() {
        let observer = Arc::new(RecordingObserver::default());
        {
            let mut guard = StepGuard::begin(observer.clone(), StepContext::new("wf", Phase::Intake));
            guard.fail("boom");
        }

        let events = observer.events();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], ObservedEvent::Begin { .. }));
        assert_eq!(
            events[1],
            ObservedEvent::End {
                step_name: "intake_agent".to_string(),
                outcome: StepOutcome::Failure {
                    error: "boom".to_string()
                },
            }
        );
    }

    #[test]
    fn test_dropped_guard_reports_abandoned() {
        let observer = Arc::new(RecordingObserver::default());
        drop(StepGuard::begin(observer.clone(), StepContext::new("wf", Phase::Testing)));

        assert_eq!(
            observer.events().last(),
            Some(&ObservedEvent::End {
                step_name: "testing_agent".to_string(),
                outcome: StepOutcome::Abandoned,
            })
        );
    }

    #[test]
    fn test_tracing_observer_handles_all_outcomes() {
        let observer = TracingObserver;
        let ctx = StepContext::new("wf", Phase::Design);
        observer.begin(&ctx);
        observer.end(&ctx, &StepOutcome::Success, Duration::from_millis(3));
        observer.end(
            &ctx,
            &StepOutcome::Failure {
                error: "x".to_string(),
            },
            Duration::ZERO,
        );
        observer.end(&ctx, &StepOutcome::Abandoned, Duration::ZERO);
    }
}
