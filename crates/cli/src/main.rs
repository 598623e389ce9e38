//! opsline CLI
//!
//! Validates and runs pipeline definitions from the command line.

mod commands;

use clap::Parser;
use commands::{handle_command, Commands};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "opsline")]
#[command(about = "Run opsline monitoring pipelines", long_about = None)]
struct Cli {
    /// Project root holding the `.opsline/` directory
    #[arg(long, global = true, default_value = ".")]
    root: String,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    // Logs go to stderr so stdout stays machine-readable.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    handle_command(cli.command, &cli.root).await
}
