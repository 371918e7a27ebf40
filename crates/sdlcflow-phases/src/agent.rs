use async_trait::async_trait;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use sdlcflow_llm::{LlmBackend, LlmInvocation, Message};
use sdlcflow_phase_api::{
    HandlerResult, LlmError, Phase, PhaseHandler, WorkflowState, baseline_result, render_history,
};

use crate::profiles::AgentProfile;

/// Generation settings resolved once when a handler is built.
#[derive(Clone)]
pub struct Generator {
    backend: Arc<dyn LlmBackend>,
    model: String,
    timeout: Duration,
    history_window: usize,
}

impl Generator {
    #[must_use]
    pub fn new(
        backend: Arc<dyn LlmBackend>,
        model: impl Into<String>,
        timeout: Duration,
        history_window: usize,
    ) -> Self {
        Self {
            backend,
            model: model.into(),
            timeout,
            history_window,
        }
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    #[must_use]
    pub fn history_window(&self) -> usize {
        self.history_window
    }
}

/// Phase handler driven by an [`AgentProfile`].
pub struct Agent<P> {
    generator: Generator,
    _profile: PhantomData<fn() -> P>,
}

impl<P: AgentProfile> Agent<P> {
    #[must_use]
    pub fn new(generator: Generator) -> Self {
        Self {
            generator,
            _profile: PhantomData,
        }
    }
}

#[async_trait]
impl<P: AgentProfile> PhaseHandler for Agent<P> {
    fn id(&self) -> &str {
        P::ID
    }

    fn phase(&self) -> Phase {
        P::PHASE
    }

    fn system_prompt(&self) -> &str {
        P::SYSTEM_PROMPT
    }

    fn build_input(&self, state: &WorkflowState, user_message: Option<&str>) -> String {
        let history = render_history(state, self.generator.history_window);
        format!(
            "{}:\n{history}\n\n{}:\n{}",
            P::CONTEXT_HEADING,
            P::INPUT_HEADING,
            user_message.unwrap_or(P::DEFAULT_INPUT)
        )
    }

    fn parse_result(&self, raw: &str, _state: &WorkflowState) -> HandlerResult {
        let mut result = baseline_result(P::ID, P::PHASE, raw);
        P::refine(&mut result);
        result
    }

    async fn run(
        &self,
        state: &WorkflowState,
        user_message: Option<&str>,
    ) -> Result<HandlerResult, LlmError> {
        let input = self.build_input(state, user_message);
        debug!(
            handler = P::ID,
            workflow_id = %state.workflow_id,
            model = %self.generator.model,
            input_chars = input.len(),
            "Invoking generation backend"
        );

        let invocation = LlmInvocation::new(
            state.workflow_id.clone(),
            P::PHASE,
            self.generator.model.clone(),
            self.generator.timeout,
            vec![Message::system(P::SYSTEM_PROMPT), Message::user(input)],
        );

        let (text, info) = self.generator.backend.invoke(invocation).await?.into_parts();
        let mut result = self.parse_result(&text, state);
        result.llm_info = Some(info);
        Ok(result)
    }
}
