//! Commands module
//!
//! Defines the CLI commands and their handlers.

mod run;
mod validate;

use clap::Subcommand;
use color_eyre::Result;
use ol_core::audit::AuditRecorder;
use ol_core::collaborators::LogChannel;
use ol_core::config::{load_config, AppConfig};
use ol_core::nodes::{Collaborators, NodeRegistry};
use ol_core::store::InMemoryStore;
use ol_core::PipelineEngine;
use std::path::Path;
use std::sync::Arc;

/// Name of the notification channel available to command-line runs.
pub const LOG_CHANNEL: &str = "log";

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Check a definition file without running it
    Validate {
        /// Definition file (.yaml, .yml or .json)
        file: String,
    },
    /// Execute a definition file and print the run with its stages as JSON
    Run {
        /// Definition file (.yaml, .yml or .json)
        file: String,

        /// Trigger input as a JSON document
        #[arg(long)]
        input: Option<String>,

        /// Trace id to correlate the run with
        #[arg(long)]
        trace_id: Option<String>,
    },
    /// List definitions under `.opsline/pipelines/`
    List,
}

/// Handle a CLI command
///
/// # Arguments
/// * `command` - The command to execute
/// * `root` - Project root holding the `.opsline/` directory
pub async fn handle_command(command: Commands, root: &str) -> Result<()> {
    let config = load_config(Path::new(root)).await?;
    match command {
        Commands::Validate { file } => validate::handle_validate(&file, &config),
        Commands::Run {
            file,
            input,
            trace_id,
        } => run::handle_run(&file, input.as_deref(), trace_id, &config).await,
        Commands::List => validate::handle_list(&config),
    }
}

/// Engine over an in-memory store with a log-only notification channel.
pub(crate) fn build_engine(config: &AppConfig, store: Arc<InMemoryStore>) -> PipelineEngine {
    let sensitive = config.settings.extra_sensitive_keys.clone();
    let audit = AuditRecorder::new(store.clone()).with_sensitive_keys(sensitive.clone());
    let collaborators =
        Collaborators::new(audit).with_channel(Arc::new(LogChannel::new(LOG_CHANNEL)));

    let mut engine = PipelineEngine::new(NodeRegistry::builtin(collaborators), store)
        .with_sensitive_keys(sensitive);
    if let Some(timeout) = config.settings.default_timeout() {
        engine = engine.with_default_timeout(timeout);
    }
    engine
}
