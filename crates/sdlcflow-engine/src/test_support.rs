//! Deterministic test doubles for the engine
//!
//! Available to this crate's tests and, with the `test-utils` feature, to integration
//! tests of dependent crates.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use sdlcflow_llm::{LlmBackend, LlmError, LlmInvocation, LlmResult};
use sdlcflow_phase_api::{HandlerResult, Phase, PhaseHandler, WorkflowState, baseline_result};

use crate::observer::{StepContext, StepObserver, StepOutcome};
use crate::registry::PhaseRegistry;

/// Handler with a fixed, configurable outcome that never calls a backend.
///
/// By default it behaves like the shipped handlers: it suggests the next phase in
/// order and gates on confirmation, except for the last phase.
#[derive(Debug, Clone)]
pub struct FixedHandler {
    id: String,
    phase: Phase,
    next: Option<Phase>,
    requires_confirmation: bool,
    failure: Option<LlmError>,
    delay: Option<Duration>,
    calls: Arc<AtomicUsize>,
    active: Arc<AtomicUsize>,
    max_active: Arc<AtomicUsize>,
    inputs: Arc<Mutex<Vec<Option<String>>>>,
}

impl FixedHandler {
    /// Handler with id `fixed_<phase>` following the default phase order.
    #[must_use]
    pub fn advancing(phase: Phase) -> Self {
        Self {
            id: format!("fixed_{phase}"),
            phase,
            next: phase.next(),
            requires_confirmation: !phase.is_last(),
            failure: None,
            delay: None,
            calls: Arc::new(AtomicUsize::new(0)),
            active: Arc::new(AtomicUsize::new(0)),
            max_active: Arc::new(AtomicUsize::new(0)),
            inputs: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Handler that never gates and always suggests its own phase.
    #[must_use]
    pub fn self_cycle(phase: Phase) -> Self {
        Self::advancing(phase).ungated().suggesting(Some(phase))
    }

    /// Handler whose every run fails with `error`.
    #[must_use]
    pub fn failing(phase: Phase, error: LlmError) -> Self {
        Self {
            failure: Some(error),
            ..Self::advancing(phase)
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    #[must_use]
    pub fn ungated(mut self) -> Self {
        self.requires_confirmation = false;
        self
    }

    #[must_use]
    pub fn suggesting(mut self, next: Option<Phase>) -> Self {
        self.next = next;
        self
    }

    /// Sleep for `delay` inside every run.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of runs started.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Highest number of runs observed in flight at once.
    #[must_use]
    pub fn max_active(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }

    /// User messages passed to each run, in order.
    #[must_use]
    pub fn inputs(&self) -> Vec<Option<String>> {
        self.inputs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn output(&self, user_message: Option<&str>) -> String {
        match user_message {
            Some(msg) => format!("{} output for: {msg}", self.phase),
            None => format!("{} output", self.phase),
        }
    }
}

#[async_trait]
impl PhaseHandler for FixedHandler {
    fn id(&self) -> &str {
        &self.id
    }

    fn phase(&self) -> Phase {
        self.phase
    }

    fn system_prompt(&self) -> &str {
        "fixed"
    }

    fn build_input(&self, _state: &WorkflowState, user_message: Option<&str>) -> String {
        user_message.unwrap_or_default().to_string()
    }

    fn parse_result(&self, raw: &str, _state: &WorkflowState) -> HandlerResult {
        let mut result = baseline_result(&self.id, self.phase, raw);
        result.requires_confirmation = self.requires_confirmation;
        result.suggested_next_phase = self.next;
        result
    }

    async fn run(
        &self,
        state: &WorkflowState,
        user_message: Option<&str>,
    ) -> Result<HandlerResult, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inputs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(user_message.map(str::to_string));

        let now_active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now_active, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.active.fetch_sub(1, Ordering::SeqCst);

        if let Some(err) = &self.failure {
            return Err(err.clone());
        }
        Ok(self.parse_result(&self.output(user_message), state))
    }
}

/// Registry of [`FixedHandler::advancing`] handlers for every phase.
#[must_use]
pub fn fixed_registry() -> PhaseRegistry {
    let builder = Phase::ALL
        .into_iter()
        .fold(PhaseRegistry::builder(), |builder, phase| {
            builder.register(Arc::new(FixedHandler::advancing(phase)))
        });
    match builder.build() {
        Ok(registry) => registry,
        Err(err) => panic!("fixed registry covers every phase: {err}"),
    }
}

/// Backend that answers from a script, then with a fixed message.
#[derive(Debug, Default)]
pub struct ScriptedBackend {
    script: Mutex<VecDeque<Result<String, LlmError>>>,
    invocations: Mutex<Vec<LlmInvocation>>,
}

impl ScriptedBackend {
    #[must_use]
    pub fn new<I>(script: I) -> Self
    where
        I: IntoIterator<Item = Result<String, LlmError>>,
    {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            invocations: Mutex::new(Vec::new()),
        }
    }

    /// Every invocation received so far.
    #[must_use]
    pub fn invocations(&self) -> Vec<LlmInvocation> {
        self.invocations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl LlmBackend for ScriptedBackend {
    async fn invoke(&self, inv: LlmInvocation) -> Result<LlmResult, LlmError> {
        let model = inv.model.clone();
        let phase = inv.phase;
        self.invocations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(inv);

        let next = self
            .script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or_else(|| Ok(format!("scripted {phase} output")));

        next.map(|text| LlmResult::new(text, "scripted", model))
    }

    fn provider_name(&self) -> &str {
        "scripted"
    }
}

/// One observer callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObservedEvent {
    Begin {
        step_name: String,
        workflow_id: String,
    },
    End {
        step_name: String,
        outcome: StepOutcome,
    },
}

/// Observer that records every callback.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<ObservedEvent>>,
}

impl RecordingObserver {
    #[must_use]
    pub fn events(&self) -> Vec<ObservedEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn begin_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, ObservedEvent::Begin { .. }))
            .count()
    }

    #[must_use]
    pub fn end_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, ObservedEvent::End { .. }))
            .count()
    }

    fn record(&self, event: ObservedEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

impl StepObserver for RecordingObserver {
    fn begin(&self, ctx: &StepContext) {
        self.record(ObservedEvent::Begin {
            step_name: ctx.step_name.clone(),
            workflow_id: ctx.workflow_id.clone(),
        });
    }

    fn end(&self, ctx: &StepContext, outcome: &StepOutcome, _elapsed: Duration) {
        self.record(ObservedEvent::End {
            step_name: ctx.step_name.clone(),
            outcome: outcome.clone(),
        });
    }
}
