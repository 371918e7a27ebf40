//! CLI command implementations (facade).
//!
//! This module re-exports the command surface used by `run.rs` and CLI tests.
//! Implementations live in `commands/*`.

mod config;
mod json_emit;
mod phases;
mod workflow;

pub use config::execute_config_command;
pub use phases::execute_phases_command;
pub use workflow::execute_run_command;

#[cfg(test)]
pub(crate) use phases::phase_rows;

#[cfg(test)]
pub(crate) use workflow::{DriveOptions, GateInput, drive_workflow, parse_gate_input};
