//! Config command implementation
//!
//! Handles `sdlcflow config` and `sdlcflow config --json`.

use anyhow::Result;
use std::collections::BTreeMap;

use super::json_emit::{ConfigValue, emit_config_json};

use crate::Config;

/// Execute the config command
pub fn execute_config_command(json: bool, config: &Config) -> Result<()> {
    let effective = config.effective_config();

    if json {
        let values: BTreeMap<String, ConfigValue> = effective
            .into_iter()
            .map(|(key, (value, source))| (key, ConfigValue { value, source }))
            .collect();
        println!("{}", emit_config_json(&values)?);
        return Ok(());
    }

    println!("Effective configuration:");
    let width = effective.keys().map(String::len).max().unwrap_or(0);
    for (key, (value, source)) in &effective {
        println!("  {key:<width$} = {value}  ({source})");
    }
    Ok(())
}
