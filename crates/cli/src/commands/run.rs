//! `run` handler.

use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use colored::*;
use ol_core::config::{load_definition, AppConfig};
use ol_core::store::{InMemoryStore, RunStore};
use ol_protocol::RunStatus;
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;

use super::build_engine;

pub async fn handle_run(
    file: &str,
    input: Option<&str>,
    trace_id: Option<String>,
    config: &AppConfig,
) -> Result<()> {
    let definition = load_definition(Path::new(file))?;

    let mut context = config.settings.context();
    if let Some(input) = input {
        let input: Value = serde_json::from_str(input).wrap_err("--input is not valid JSON")?;
        context = context.with_input(input);
    }
    if let Some(trace_id) = trace_id {
        context = context.with_trace_id(trace_id);
    }

    let store = Arc::new(InMemoryStore::new());
    let engine = build_engine(config, store.clone());
    let run = engine.execute(&definition, context).await?;
    let stages = store.list_stages(run.id, None).await?;

    println!(
        "{}",
        serde_json::to_string_pretty(&json!({ "run": run, "stages": stages }))?
    );

    match run.status {
        RunStatus::Succeeded => {
            eprintln!("{} run {} succeeded", "✓".green().bold(), run.id);
            Ok(())
        }
        _ => Err(eyre!(
            "run {} {}: {}",
            run.id,
            run.status,
            run.last_error.unwrap_or_default()
        )),
    }
}
