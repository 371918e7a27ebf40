//! Phases command implementation
//!
//! Handles `sdlcflow phases` and `sdlcflow phases --json`.

use anyhow::Result;

use super::json_emit::{PhaseRow, emit_phases_json};

use crate::phases::handler_id;
use crate::{Config, Phase};

pub(crate) fn phase_rows(config: &Config) -> Vec<PhaseRow> {
    Phase::ALL
        .into_iter()
        .map(|phase| PhaseRow {
            index: phase.index() + 1,
            phase: phase.to_string(),
            handler: handler_id(phase).to_string(),
            model: config.model_for_phase(phase),
            timeout_secs: config.timeout_for_phase(phase).as_secs(),
        })
        .collect()
}

/// Execute the phases command
pub fn execute_phases_command(json: bool, config: &Config) -> Result<()> {
    let rows = phase_rows(config);

    if json {
        println!("{}", emit_phases_json(&rows)?);
        return Ok(());
    }

    println!("Pipeline phases:");
    for row in &rows {
        println!(
            "  {}. {:<15} {:<20} model={} timeout={}s",
            row.index, row.phase, row.handler, row.model, row.timeout_secs
        );
    }
    Ok(())
}
