//! `validate` and `list` handlers.

use color_eyre::eyre::eyre;
use color_eyre::Result;
use colored::*;
use ol_core::config::{load_definition, AppConfig};
use ol_core::store::InMemoryStore;
use ol_core::EngineError;
use ol_protocol::PipelineDefinition;
use std::path::Path;
use std::sync::Arc;

use super::build_engine;

pub fn handle_validate(file: &str, config: &AppConfig) -> Result<()> {
    let definition = load_definition(Path::new(file))?;
    check(&definition, config)?;
    println!(
        "{} '{}' v{} is valid ({} nodes)",
        "✓".green().bold(),
        definition.name,
        definition.version,
        definition.nodes.len()
    );
    Ok(())
}

pub fn handle_list(config: &AppConfig) -> Result<()> {
    if config.pipelines.is_empty() {
        println!("{}", "No pipelines found in .opsline/pipelines/".yellow());
        return Ok(());
    }

    for definition in &config.pipelines {
        let status = match check(definition, config) {
            Ok(()) => "valid".green(),
            Err(_) => "invalid".red(),
        };
        println!(
            "{:<32} v{:<4} {:>3} nodes  {}",
            definition.name.bold(),
            definition.version,
            definition.nodes.len(),
            status
        );
    }
    Ok(())
}

fn check(definition: &PipelineDefinition, config: &AppConfig) -> Result<()> {
    let engine = build_engine(config, Arc::new(InMemoryStore::new()));
    match engine.validate(definition) {
        Ok(()) => Ok(()),
        Err(EngineError::Configuration { pipeline, issues }) => {
            eprintln!("{} '{}' is invalid:", "✗".red().bold(), pipeline);
            for issue in &issues {
                eprintln!("  - {issue}");
            }
            Err(eyre!("{} configuration issue(s) in '{pipeline}'", issues.len()))
        }
        Err(e) => Err(e.into()),
    }
}
