//! End-to-end workflow behavior through the public API.
//!
//! Uses the real phase handlers over a deterministic backend, and fixed handlers
//! where a test needs a specific handler graph.

use std::sync::Arc;
use std::time::Duration;

use proptest::prelude::*;
use sdlcflow::{
    Config, LlmBackend, LlmError, Phase, StubBackend, WorkflowError, WorkflowOrchestrator,
    WorkflowRunner,
};
use sdlcflow_engine::test_support::{
    FixedHandler, ObservedEvent, RecordingObserver, ScriptedBackend, fixed_registry,
};

fn orchestrator_with(backend: Arc<dyn LlmBackend>) -> WorkflowOrchestrator {
    WorkflowOrchestrator::with_backend(&Config::default(), backend).unwrap()
}

fn stub_orchestrator() -> WorkflowOrchestrator {
    orchestrator_with(Arc::new(StubBackend::default()))
}

#[tokio::test]
async fn start_runs_intake_and_halts_before_analysis() {
    let orch = stub_orchestrator();

    let state = orch.start("Build a todo app").await.unwrap();

    assert_eq!(state.history.len(), 1);
    assert_eq!(state.history[0].phase, Phase::Intake);
    assert_eq!(state.history[0].sender, "requirement_intake");
    assert!(state.pending_confirmation);
    assert_eq!(state.phase, Some(Phase::Analysis));
    assert_eq!(state.user_message, None);
}

#[tokio::test]
async fn default_handlers_visit_every_phase_once_in_order() {
    let orch = stub_orchestrator();
    let mut state = orch.start("Build a todo app").await.unwrap();

    while state.pending_confirmation {
        state = orch
            .continue_with_confirmation(&state.workflow_id, None)
            .await
            .unwrap();
    }

    assert_eq!(state.history_phases(), Phase::ALL.to_vec());
    assert!(state.is_complete());
    let last = state.last_result.as_ref().unwrap();
    assert_eq!(last.phase, Phase::Retrospective);
    assert!(!last.requires_confirmation);
    assert_eq!(last.suggested_next_phase, None);
}

#[tokio::test]
async fn completed_workflow_cannot_be_confirmed() {
    let orch = stub_orchestrator();
    let mut state = orch.start("x").await.unwrap();
    while !state.is_complete() {
        state = orch
            .continue_with_confirmation(&state.workflow_id, None)
            .await
            .unwrap();
    }

    let before = orch.get_state(&state.workflow_id).unwrap();
    let err = orch
        .continue_with_confirmation(&state.workflow_id, Some("again".to_string()))
        .await
        .unwrap_err();

    assert!(matches!(err, WorkflowError::InvalidTransition { .. }));
    assert_eq!(err.http_status(), 409);
    let after = orch.get_state(&state.workflow_id).unwrap();
    assert_eq!(
        serde_json::to_vec(&before).unwrap(),
        serde_json::to_vec(&after).unwrap()
    );
}

#[tokio::test]
async fn confirm_while_not_pending_leaves_snapshot_identical() {
    let runner = WorkflowRunner::new(fixed_registry(), 10);
    let orch = WorkflowOrchestrator::new(runner);
    orch.override_handler(
        Phase::Intake,
        Arc::new(
            FixedHandler::advancing(Phase::Intake)
                .ungated()
                .suggesting(None),
        ),
    )
    .unwrap();
    let state = orch.start("x").await.unwrap();
    assert!(!state.pending_confirmation);

    let before = serde_json::to_vec(&orch.get_state(&state.workflow_id).unwrap()).unwrap();
    let err = orch
        .continue_with_confirmation(&state.workflow_id, None)
        .await
        .unwrap_err();
    let after = serde_json::to_vec(&orch.get_state(&state.workflow_id).unwrap()).unwrap();

    assert!(matches!(err, WorkflowError::InvalidTransition { .. }));
    assert_eq!(before, after);
}

#[tokio::test]
async fn get_state_is_stable_between_reads() {
    let orch = stub_orchestrator();
    let state = orch.start("x").await.unwrap();

    let first = orch.get_state(&state.workflow_id).unwrap();
    let second = orch.get_state(&state.workflow_id).unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn returned_state_does_not_alias_stored_state() {
    let orch = stub_orchestrator();
    let state = orch.start("x").await.unwrap();

    let mut copy = orch.get_state(&state.workflow_id).unwrap();
    copy.history.clear();
    copy.pending_confirmation = false;

    assert_eq!(orch.get_state(&state.workflow_id).unwrap(), state);
}

#[tokio::test]
async fn self_cycle_raises_iteration_limit() {
    let config = Config::builder().max_steps(6).build().unwrap();
    let runner = WorkflowRunner::from_config(fixed_registry(), &config);
    let orch = WorkflowOrchestrator::new(runner);
    for phase in Phase::ALL {
        orch.override_handler(phase, Arc::new(FixedHandler::self_cycle(phase)))
            .unwrap();
    }

    let err = tokio::time::timeout(Duration::from_secs(5), orch.start("x"))
        .await
        .expect("bounded loop must terminate")
        .unwrap_err();

    match err {
        WorkflowError::IterationLimitExceeded { phase, limit, .. } => {
            assert_eq!(phase, Phase::Intake);
            assert_eq!(limit, 6);
        }
        other => panic!("expected iteration limit, got {other:?}"),
    }
    assert_eq!(orch.session_count(), 0);
}

#[tokio::test]
async fn confirm_with_message_records_intake_and_analysis_artifacts() {
    let backend = Arc::new(ScriptedBackend::new([
        Ok("intake: goals and constraints".to_string()),
        Ok("analysis: React with a REST API".to_string()),
    ]));
    let orch = orchestrator_with(backend.clone());

    let state = orch.start("X").await.unwrap();
    let state = orch
        .continue_with_confirmation(&state.workflow_id, Some("use React".to_string()))
        .await
        .unwrap();

    assert_eq!(state.history_phases(), vec![Phase::Intake, Phase::Analysis]);
    assert_eq!(state.artifacts.len(), 2);
    assert_eq!(
        state.artifacts["requirement_intake"]["raw"],
        "intake: goals and constraints"
    );
    assert_eq!(
        state.artifacts["solution_analysis"]["raw"],
        "analysis: React with a REST API"
    );

    let invocations = backend.invocations();
    assert_eq!(invocations.len(), 2);
    let analysis_input = &invocations[1].messages.last().unwrap().content;
    assert!(analysis_input.contains("use React"));
    assert!(analysis_input.contains("[intake] requirement_intake: intake: goals and constraints"));
}

#[tokio::test]
async fn generation_failure_keeps_last_committed_state() {
    let backend = Arc::new(ScriptedBackend::new([
        Ok("intake".to_string()),
        Err(LlmError::ProviderOutage("503 Service Unavailable".to_string())),
        Ok("analysis retried".to_string()),
    ]));
    let orch = orchestrator_with(backend);

    let state = orch.start("x").await.unwrap();
    let err = orch
        .continue_with_confirmation(&state.workflow_id, Some("go".to_string()))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        WorkflowError::Generation(LlmError::ProviderOutage(_))
    ));
    assert_eq!(orch.get_state(&state.workflow_id).unwrap(), state);

    let state = orch
        .continue_with_confirmation(&state.workflow_id, Some("go".to_string()))
        .await
        .unwrap();
    assert_eq!(state.history[1].content, "analysis retried");
}

#[tokio::test]
async fn observer_end_fires_on_success_and_failure() {
    let observer = Arc::new(RecordingObserver::default());
    let runner = WorkflowRunner::new(fixed_registry(), 10).with_observer(observer.clone());
    let orch = WorkflowOrchestrator::new(runner);
    orch.override_handler(
        Phase::Analysis,
        Arc::new(FixedHandler::failing(
            Phase::Analysis,
            LlmError::Transport("connection reset".to_string()),
        )),
    )
    .unwrap();

    let state = orch.start("x").await.unwrap();
    let _ = orch
        .continue_with_confirmation(&state.workflow_id, None)
        .await
        .unwrap_err();

    assert_eq!(observer.begin_count(), 2);
    assert_eq!(observer.end_count(), 2);
    assert_eq!(
        observer.events()[0],
        ObservedEvent::Begin {
            step_name: "intake_agent".to_string(),
            workflow_id: state.workflow_id.clone(),
        }
    );
}

#[tokio::test]
async fn unknown_ids_are_not_found() {
    let orch = stub_orchestrator();

    assert!(matches!(
        orch.get_state("missing").unwrap_err(),
        WorkflowError::NotFound { .. }
    ));
    let err = orch
        .continue_with_confirmation("missing", None)
        .await
        .unwrap_err();
    assert_eq!(err.http_status(), 404);
    assert!(matches!(
        orch.update_user_message("missing", "x").await.unwrap_err(),
        WorkflowError::NotFound { .. }
    ));
}

#[tokio::test]
async fn update_user_message_feeds_next_step_without_running() {
    let backend = Arc::new(ScriptedBackend::default());
    let orch = orchestrator_with(backend.clone());
    let state = orch.start("x").await.unwrap();

    let updated = orch
        .update_user_message(&state.workflow_id, "prefer Postgres")
        .await
        .unwrap();
    assert_eq!(backend.invocations().len(), 1);
    assert_eq!(updated.history, state.history);
    assert_eq!(updated.phase, Some(Phase::Analysis));

    let staged = updated.user_message.clone();
    let next = orch
        .continue_with_confirmation(&state.workflow_id, staged)
        .await
        .unwrap();
    assert_eq!(next.user_message, None);
    let invocations = backend.invocations();
    let input = &invocations[1].messages.last().unwrap().content;
    assert!(input.ends_with("prefer Postgres"));
}

#[tokio::test]
async fn concurrent_confirms_on_one_workflow_are_serialized() {
    let runner = WorkflowRunner::new(fixed_registry(), 10);
    let orch = Arc::new(WorkflowOrchestrator::new(runner));
    let analysis = Arc::new(
        FixedHandler::advancing(Phase::Analysis).with_delay(Duration::from_millis(10)),
    );
    let design =
        Arc::new(FixedHandler::advancing(Phase::Design).with_delay(Duration::from_millis(10)));
    orch.override_handler(Phase::Analysis, analysis.clone()).unwrap();
    orch.override_handler(Phase::Design, design.clone()).unwrap();
    let id = orch.start("x").await.unwrap().workflow_id;

    let tasks: Vec<_> = (0..2)
        .map(|i| {
            let orch = Arc::clone(&orch);
            let id = id.clone();
            tokio::spawn(async move {
                orch.continue_with_confirmation(&id, Some(format!("confirm {i}")))
                    .await
            })
        })
        .collect();
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let state = orch.get_state(&id).unwrap();
    assert_eq!(
        state.history_phases(),
        vec![Phase::Intake, Phase::Analysis, Phase::Design]
    );
    assert_eq!(analysis.calls(), 1);
    assert_eq!(design.calls(), 1);
    assert_eq!(state.phase, Some(Phase::Implementation));
}

#[tokio::test]
async fn distinct_workflows_are_independent() {
    let orch = stub_orchestrator();
    let a = orch.start("a").await.unwrap();
    let b = orch.start("b").await.unwrap();

    orch.continue_with_confirmation(&a.workflow_id, None)
        .await
        .unwrap();

    assert_eq!(orch.get_state(&b.workflow_id).unwrap(), b);
    assert_eq!(orch.get_state(&a.workflow_id).unwrap().history.len(), 2);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn any_confirmation_messages_keep_phase_order(
        messages in proptest::collection::vec(proptest::option::of("[a-z ]{0,12}"), 6)
    ) {
        let rt = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
        let history = rt.block_on(async {
            let orch = stub_orchestrator();
            let mut state = orch.start("prop").await.unwrap();
            for message in messages {
                if !state.pending_confirmation {
                    break;
                }
                state = orch
                    .continue_with_confirmation(&state.workflow_id, message)
                    .await
                    .unwrap();
            }
            state.history_phases()
        });

        prop_assert_eq!(history, Phase::ALL.to_vec());
    }
}
