//! JSON emit functions for CLI output
//!
//! Every JSON document the CLI prints goes through JCS (RFC 8785) so output is
//! byte-stable across runs.

use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::{WorkflowState, WorkflowStateView, emit_jcs};

/// Emit a workflow state view as canonical JSON
pub fn emit_state_json(state: &WorkflowState) -> Result<String> {
    emit_jcs(&WorkflowStateView::from(state)).context("Failed to emit workflow state JSON")
}

/// One row of `sdlcflow phases --json`
#[derive(Debug, Serialize)]
pub struct PhaseRow {
    pub index: usize,
    pub phase: String,
    pub handler: String,
    pub model: String,
    pub timeout_secs: u64,
}

/// Emit the phase listing as canonical JSON
pub fn emit_phases_json(rows: &[PhaseRow]) -> Result<String> {
    emit_jcs(&rows).context("Failed to emit phases JSON")
}

/// Value and source of one configuration key
#[derive(Debug, Serialize)]
pub struct ConfigValue {
    pub value: String,
    pub source: String,
}

/// Emit the effective configuration as canonical JSON
pub fn emit_config_json(values: &BTreeMap<String, ConfigValue>) -> Result<String> {
    emit_jcs(values).context("Failed to emit config JSON")
}
