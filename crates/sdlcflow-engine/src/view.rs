//! Consumer-facing state view
//!
//! The serialized shape returned by the control surface. It omits nothing a caller
//! needs to decide the next action and adds the derived `completed` flag.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use sdlcflow_phase_api::{AgentMessage, ArtifactMap, HandlerResult, Phase, WorkflowState};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowStateView {
    pub workflow_id: String,
    pub current_phase: Option<Phase>,
    pub pending_confirmation: bool,
    pub completed: bool,
    pub history: Vec<AgentMessage>,
    pub artifacts: BTreeMap<String, ArtifactMap>,
    pub last_result: Option<HandlerResult>,
    pub user_message: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl From<&WorkflowState> for WorkflowStateView {
    fn from(state: &WorkflowState) -> Self {
        Self {
            workflow_id: state.workflow_id.clone(),
            current_phase: state.phase,
            pending_confirmation: state.pending_confirmation,
            completed: state.is_complete(),
            history: state.history.clone(),
            artifacts: state.artifacts.clone(),
            last_result: state.last_result.clone(),
            user_message: state.user_message.clone(),
            updated_at: state.updated_at,
        }
    }
}

impl From<WorkflowState> for WorkflowStateView {
    fn from(state: WorkflowState) -> Self {
        Self::from(&state)
    }
}
