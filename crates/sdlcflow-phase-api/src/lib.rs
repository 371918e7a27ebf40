//! Phase handler contract and workflow data model
//!
//! This crate is the shared contract between the workflow engine and the phase
//! handler implementations. It defines the state snapshot the engine folds results
//! into, the result a handler produces, and the [`PhaseHandler`] trait itself.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub use sdlcflow_utils::error::LlmError;
pub use sdlcflow_utils::types::{LlmInfo, Phase};

/// Opaque artifact payload emitted by one handler.
pub type ArtifactMap = BTreeMap<String, serde_json::Value>;

/// Key under which the baseline parse stores the raw generation output.
pub const RAW_ARTIFACT_KEY: &str = "raw";

/// One entry of a workflow's history. Never mutated once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentMessage {
    /// Identifier of the handler that produced the message
    pub sender: String,
    pub phase: Phase,
    pub content: String,
    /// The artifacts the handler emitted alongside the message
    #[serde(default)]
    pub metadata: ArtifactMap,
}

/// Structured outcome of running a phase handler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandlerResult {
    /// Handler identifier
    pub agent: String,
    pub phase: Phase,
    pub output: String,
    #[serde(default)]
    pub artifacts: ArtifactMap,
    pub requires_confirmation: bool,
    /// Phase to execute next; `None` completes the workflow
    pub suggested_next_phase: Option<Phase>,
    /// Generation metadata, when a backend produced the output
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm_info: Option<LlmInfo>,
}

/// Snapshot of one workflow session.
///
/// Snapshots are values: the engine works on a copy and the session store only
/// replaces its stored snapshot once a step has fully succeeded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowState {
    pub workflow_id: String,
    /// Current phase; `None` once the workflow has completed
    pub phase: Option<Phase>,
    /// Append-only message log
    pub history: Vec<AgentMessage>,
    /// Last emitted payload per handler identifier
    pub artifacts: BTreeMap<String, ArtifactMap>,
    pub pending_confirmation: bool,
    pub last_result: Option<HandlerResult>,
    /// Input for the next step, consumed at most once
    pub user_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WorkflowState {
    /// Fresh snapshot positioned at the first phase with empty history and artifacts.
    #[must_use]
    pub fn new(workflow_id: impl Into<String>, user_message: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            workflow_id: workflow_id.into(),
            phase: Some(Phase::first()),
            history: Vec::new(),
            artifacts: BTreeMap::new(),
            pending_confirmation: false,
            last_result: None,
            user_message,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the workflow has run past its last phase.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.phase.is_none()
    }

    /// Phases in the order they appear in history.
    #[must_use]
    pub fn history_phases(&self) -> Vec<Phase> {
        self.history.iter().map(|m| m.phase).collect()
    }
}

/// Capability bound to exactly one phase.
///
/// A handler renders its input from the current snapshot, asks the generation
/// backend for output and converts that output into a [`HandlerResult`]. Failures of
/// the backend are returned unchanged; handlers never retry.
#[async_trait]
pub trait PhaseHandler: Send + Sync {
    /// Stable handler identifier, used as history sender and artifact key
    fn id(&self) -> &str;

    /// The phase this handler serves
    fn phase(&self) -> Phase;

    /// Fixed system instruction sent with every invocation
    fn system_prompt(&self) -> &str;

    /// Render the generation input. Must be a pure function of its arguments.
    fn build_input(&self, state: &WorkflowState, user_message: Option<&str>) -> String;

    /// Convert raw generation output into a result.
    fn parse_result(&self, raw: &str, state: &WorkflowState) -> HandlerResult;

    /// Build input, invoke the backend once and parse the output.
    async fn run(
        &self,
        state: &WorkflowState,
        user_message: Option<&str>,
    ) -> Result<HandlerResult, LlmError>;
}

/// Baseline parse shared by every phase: keep the raw text as the `raw` artifact and
/// stop at a confirmation gate. Phases refine `suggested_next_phase` (and the last
/// phase also drops the gate).
#[must_use]
pub fn baseline_result(agent: &str, phase: Phase, raw: &str) -> HandlerResult {
    let mut artifacts = ArtifactMap::new();
    artifacts.insert(
        RAW_ARTIFACT_KEY.to_string(),
        serde_json::Value::String(raw.to_string()),
    );

    HandlerResult {
        agent: agent.to_string(),
        phase,
        output: raw.to_string(),
        artifacts,
        requires_confirmation: true,
        suggested_next_phase: None,
        llm_info: None,
    }
}

/// Summarise the trailing `window` history messages as `[phase] sender: content`
/// lines, followed by the current artifacts as JSON.
#[must_use]
pub fn render_history(state: &WorkflowState, window: usize) -> String {
    let skip = state.history.len().saturating_sub(window);
    let lines: Vec<String> = state
        .history
        .iter()
        .skip(skip)
        .map(|m| format!("[{}] {}: {}", m.phase, m.sender, m.content))
        .collect();

    let artifacts =
        serde_json::to_string(&state.artifacts).unwrap_or_else(|_| "{}".to_string());

    format!("{}\nCurrent artifacts: {artifacts}", lines.join("\n"))
}
