//! Run command implementation
//!
//! Handles `sdlcflow run <prompt>`: starts a workflow and drives it gate by gate,
//! either from stdin or with `--auto-confirm`.

use anyhow::{Context, Result};
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use super::json_emit::emit_state_json;

use crate::{Config, SdlcError, WorkflowOrchestrator, WorkflowState};

/// How the driver reacts at confirmation gates and prints state.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct DriveOptions {
    pub auto_confirm: bool,
    pub json: bool,
}

/// One line of input at a confirmation gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum GateInput {
    Confirm(Option<String>),
    Edit(String),
    Show,
    Quit,
    Unknown(String),
}

/// Interpret a gate input line. An empty line confirms with the `staged` message.
pub(crate) fn parse_gate_input(line: &str, staged: Option<&str>) -> GateInput {
    let line = line.trim();

    if line.is_empty() {
        return GateInput::Confirm(staged.map(str::to_string));
    }

    match line {
        ":quit" | ":q" => return GateInput::Quit,
        ":show" => return GateInput::Show,
        _ => {}
    }

    if let Some(rest) = line.strip_prefix(":edit") {
        let text = rest.trim();
        if rest.starts_with(char::is_whitespace) && !text.is_empty() {
            return GateInput::Edit(text.to_string());
        }
    }

    if line.starts_with(':') {
        return GateInput::Unknown(line.to_string());
    }

    GateInput::Confirm(Some(line.to_string()))
}

/// Execute the run command against stdin and stdout
pub async fn execute_run_command(
    prompt: &str,
    auto_confirm: bool,
    json: bool,
    config: &Config,
) -> Result<()> {
    let (orchestrator, fallback) = WorkflowOrchestrator::from_config(config)?;
    if let Some(info) = fallback
        && !json
    {
        eprintln!(
            "ℹ Using the {} backend: {}",
            info.selected_provider, info.reason
        );
    }

    let mut input = BufReader::new(tokio::io::stdin());
    let mut out = std::io::stdout().lock();
    drive_workflow(
        &orchestrator,
        prompt,
        DriveOptions { auto_confirm, json },
        &mut input,
        &mut out,
    )
    .await?;
    Ok(())
}

/// Start a workflow and drive it until it completes, the user quits, or input ends.
///
/// Returns the last committed state.
pub(crate) async fn drive_workflow<R, W>(
    orchestrator: &WorkflowOrchestrator,
    prompt: &str,
    options: DriveOptions,
    input: &mut R,
    out: &mut W,
) -> Result<WorkflowState>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut state = orchestrator.start(prompt).await.map_err(SdlcError::from)?;
    let mut printed = print_progress(&state, 0, options, out)?;

    loop {
        if state.is_complete() {
            if !options.json {
                writeln!(
                    out,
                    "✓ Workflow {} completed after {} phases",
                    state.workflow_id,
                    state.history.len()
                )?;
            }
            return Ok(state);
        }

        let gate_input = if options.auto_confirm {
            GateInput::Confirm(state.user_message.clone())
        } else {
            prompt_gate(&state)?;
            match read_gate_line(input).await? {
                Some(line) => parse_gate_input(&line, state.user_message.as_deref()),
                None => GateInput::Quit,
            }
        };

        match gate_input {
            GateInput::Confirm(message) => {
                state = orchestrator
                    .continue_with_confirmation(&state.workflow_id, message)
                    .await
                    .map_err(SdlcError::from)?;
                printed = print_progress(&state, printed, options, out)?;
            }
            GateInput::Edit(message) => {
                state = orchestrator
                    .update_user_message(&state.workflow_id, message)
                    .await
                    .map_err(SdlcError::from)?;
                if options.json {
                    writeln!(out, "{}", emit_state_json(&state)?)?;
                } else {
                    eprintln!("Staged message for the next phase.");
                }
            }
            GateInput::Show => {
                let current = orchestrator
                    .get_state(&state.workflow_id)
                    .map_err(SdlcError::from)?;
                writeln!(out, "{}", emit_state_json(&current)?)?;
            }
            GateInput::Quit => {
                if !options.json {
                    let phase = state.phase.map_or("completed", |p| p.as_str());
                    writeln!(
                        out,
                        "Workflow {} paused before {phase}",
                        state.workflow_id
                    )?;
                }
                return Ok(state);
            }
            GateInput::Unknown(command) => {
                eprintln!("Unknown command '{command}'. Use :edit <text>, :show or :quit.");
            }
        }
    }
}

/// Print history entries after `printed` and return the new count.
fn print_progress<W: Write>(
    state: &WorkflowState,
    printed: usize,
    options: DriveOptions,
    out: &mut W,
) -> Result<usize> {
    if options.json {
        writeln!(out, "{}", emit_state_json(state)?)?;
        return Ok(state.history.len());
    }

    for message in state.history.iter().skip(printed) {
        writeln!(out, "── {} · {} ──", message.phase, message.sender)?;
        writeln!(out, "{}", message.content.trim_end())?;
        writeln!(out)?;
    }
    Ok(state.history.len())
}

fn prompt_gate(state: &WorkflowState) -> Result<()> {
    let next = state.phase.map_or("completion", |p| p.as_str());
    eprint!("[{next}] Enter to confirm, or type input / :edit <text> / :show / :quit > ");
    std::io::stderr().flush().context("Failed to flush prompt")
}

async fn read_gate_line<R: AsyncBufRead + Unpin>(input: &mut R) -> Result<Option<String>> {
    let mut line = String::new();
    let read = input
        .read_line(&mut line)
        .await
        .context("Failed to read confirmation input")?;
    Ok((read > 0).then_some(line))
}
