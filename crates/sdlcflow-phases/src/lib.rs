//! Concrete phase handlers for the SDLC pipeline
//!
//! Each phase has an [`AgentProfile`] carrying its identifier, system instruction and
//! input headings; [`Agent`] turns a profile into a [`PhaseHandler`].

mod agent;
mod profiles;

use std::sync::Arc;

use sdlcflow_config::Config;
use sdlcflow_llm::LlmBackend;
use sdlcflow_phase_api::{Phase, PhaseHandler};

pub use agent::{Agent, Generator};
pub use profiles::{
    AgentProfile, Deployment, Implementation, RequirementIntake, Retrospective, SolutionAnalysis,
    SolutionDesign, Testing, handler_id,
};

pub type RequirementIntakeAgent = Agent<RequirementIntake>;
pub type SolutionAnalysisAgent = Agent<SolutionAnalysis>;
pub type SolutionDesignAgent = Agent<SolutionDesign>;
pub type ImplementationAgent = Agent<Implementation>;
pub type TestingAgent = Agent<Testing>;
pub type DeploymentAgent = Agent<Deployment>;
pub type RetrospectiveAgent = Agent<Retrospective>;

/// Generator for `phase` using the model and timeout configured for it.
#[must_use]
pub fn generator_for(backend: &Arc<dyn LlmBackend>, config: &Config, phase: Phase) -> Generator {
    Generator::new(
        Arc::clone(backend),
        config.model_for_phase(phase),
        config.timeout_for_phase(phase),
        config.workflow.history_window,
    )
}

/// The default handler for every phase, in pipeline order.
#[must_use]
pub fn default_handlers(
    backend: Arc<dyn LlmBackend>,
    config: &Config,
) -> Vec<Arc<dyn PhaseHandler>> {
    Phase::ALL
        .into_iter()
        .map(|phase| default_handler(phase, generator_for(&backend, config, phase)))
        .collect()
}

/// The default handler for a single phase.
#[must_use]
pub fn default_handler(phase: Phase, generator: Generator) -> Arc<dyn PhaseHandler> {
    match phase {
        Phase::Intake => Arc::new(RequirementIntakeAgent::new(generator)),
        Phase::Analysis => Arc::new(SolutionAnalysisAgent::new(generator)),
        Phase::Design => Arc::new(SolutionDesignAgent::new(generator)),
        Phase::Implementation => Arc::new(ImplementationAgent::new(generator)),
        Phase::Testing => Arc::new(TestingAgent::new(generator)),
        Phase::Deployment => Arc::new(DeploymentAgent::new(generator)),
        Phase::Retrospective => Arc::new(RetrospectiveAgent::new(generator)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdlcflow_llm::{LlmError, LlmInvocation, LlmResult, StubBackend};
    use sdlcflow_phase_api::{AgentMessage, ArtifactMap, WorkflowState};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Records the messages of every invocation.
    #[derive(Default)]
    struct CapturingBackend {
        calls: Mutex<Vec<LlmInvocation>>,
    }

    #[async_trait::async_trait]
    impl LlmBackend for CapturingBackend {
        async fn invoke(&self, inv: LlmInvocation) -> Result<LlmResult, LlmError> {
            let model = inv.model.clone();
            self.calls.lock().unwrap().push(inv);
            Ok(LlmResult::new("captured", "capture", model).with_tokens(3, 4))
        }

        fn provider_name(&self) -> &str {
            "capture"
        }
    }

    struct FailingBackend;

    #[async_trait::async_trait]
    impl LlmBackend for FailingBackend {
        async fn invoke(&self, _inv: LlmInvocation) -> Result<LlmResult, LlmError> {
            Err(LlmError::ProviderOutage("503".to_string()))
        }

        fn provider_name(&self) -> &str {
            "failing"
        }
    }

    fn stub_generator() -> Generator {
        Generator::new(
            Arc::new(StubBackend::default()),
            "gpt-4o-mini",
            Duration::from_secs(5),
            5,
        )
    }

    #[test]
    fn test_default_handlers_cover_every_phase_in_order() {
        let handlers = default_handlers(Arc::new(StubBackend::default()), &Config::default());
        let phases: Vec<Phase> = handlers.iter().map(|h| h.phase()).collect();
        assert_eq!(phases, Phase::ALL.to_vec());
        for handler in &handlers {
            assert_eq!(handler.id(), handler_id(handler.phase()));
            assert!(!handler.system_prompt().is_empty());
        }
    }

    #[test]
    fn test_parse_result_suggests_next_phase_with_gate() {
        let state = WorkflowState::new("wf", None);
        for phase in Phase::ALL.into_iter().filter(|p| !p.is_last()) {
            let handler = default_handler(phase, stub_generator());
            let result = handler.parse_result("out", &state);
            assert_eq!(result.agent, handler_id(phase));
            assert_eq!(result.phase, phase);
            assert_eq!(result.suggested_next_phase, phase.next());
            assert!(result.requires_confirmation, "{phase} must gate");
            assert_eq!(result.artifacts["raw"], "out");
        }
    }

    #[test]
    fn test_retrospective_completes_without_gate() {
        let handler = RetrospectiveAgent::new(stub_generator());
        let result = handler.parse_result("lessons", &WorkflowState::new("wf", None));
        assert_eq!(result.suggested_next_phase, None);
        assert!(!result.requires_confirmation);
    }

    #[test]
    fn test_build_input_uses_headings_and_default() {
        let handler = RequirementIntakeAgent::new(stub_generator());
        let state = WorkflowState::new("wf", None);

        let input = handler.build_input(&state, None);
        assert_eq!(
            input,
            "Context so far:\n\nCurrent artifacts: {}\n\nNew stakeholder input:\nNo new message provided."
        );

        let input = handler.build_input(&state, Some("Build a todo app"));
        assert!(input.ends_with("New stakeholder input:\nBuild a todo app"));
    }

    #[test]
    fn test_build_input_respects_history_window() {
        let handler = SolutionDesignAgent::new(Generator::new(
            Arc::new(StubBackend::default()),
            "m",
            Duration::from_secs(1),
            1,
        ));
        let mut state = WorkflowState::new("wf", None);
        for (phase, sender, content) in [
            (Phase::Intake, "requirement_intake", "first"),
            (Phase::Analysis, "solution_analysis", "second"),
        ] {
            state.history.push(AgentMessage {
                sender: sender.to_string(),
                phase,
                content: content.to_string(),
                metadata: ArtifactMap::new(),
            });
        }

        let input = handler.build_input(&state, None);
        assert!(input.starts_with("Requirements and analysis summary:\n[analysis] solution_analysis: second"));
        assert!(!input.contains("first"));
        assert!(input.ends_with("Design considerations from user:\nNo additional design considerations."));
    }

    #[tokio::test]
    async fn test_run_sends_system_prompt_then_input() {
        let backend = Arc::new(CapturingBackend::default());
        let generator = Generator::new(backend.clone(), "gpt-4o", Duration::from_secs(9), 5);
        let handler = TestingAgent::new(generator);
        let state = WorkflowState::new("wf-7", None);

        let result = handler.run(&state, Some("no flaky tests")).await.unwrap();

        assert_eq!(result.output, "captured");
        let info = result.llm_info.unwrap();
        assert_eq!(info.model_used.as_deref(), Some("gpt-4o"));
        assert_eq!(info.tokens_output, Some(4));

        let calls = backend.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        let call = &calls[0];
        assert_eq!(call.workflow_id, "wf-7");
        assert_eq!(call.phase, Phase::Testing);
        assert_eq!(call.timeout, Duration::from_secs(9));
        assert_eq!(call.messages[0].content, Testing::SYSTEM_PROMPT);
        assert!(call.messages[1].content.ends_with("no flaky tests"));
    }

    #[tokio::test]
    async fn test_run_propagates_backend_error_unchanged() {
        let generator = Generator::new(Arc::new(FailingBackend), "m", Duration::from_secs(1), 5);
        let handler = DeploymentAgent::new(generator);
        let err = handler
            .run(&WorkflowState::new("wf", None), None)
            .await
            .unwrap_err();
        assert_eq!(err, LlmError::ProviderOutage("503".to_string()));
    }

    #[test]
    fn test_per_phase_model_override() {
        let config = Config::builder()
            .provider("stub")
            .phase_model(Phase::Design, "gpt-4o")
            .build()
            .unwrap();
        let backend: Arc<dyn LlmBackend> = Arc::new(StubBackend::default());
        assert_eq!(generator_for(&backend, &config, Phase::Design).model(), "gpt-4o");
        assert_eq!(
            generator_for(&backend, &config, Phase::Intake).model(),
            "gpt-4o-mini"
        );
    }
}
