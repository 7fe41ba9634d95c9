// mend - autonomous test-repair agent
// Main entry point

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use mend::config::load_config;
use mend::oracle::HttpOracle;
use mend::repair::{RepairLoop, RunOutcome};

#[derive(Parser, Debug)]
#[command(name = "mend", about = "Runs a project's tests and repairs it until they pass")]
struct Cli {
    /// Path to the agent configuration file
    #[arg(short, long, default_value = "agent.toml")]
    config: PathBuf,

    /// Override the project base path from the configuration
    #[arg(short, long)]
    base_path: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = load_config(&cli.config)?;
    if let Some(base_path) = cli.base_path {
        config.project.base_path = base_path;
    }

    let oracle = HttpOracle::new(
        config.oracle.base_url.clone(),
        config.oracle.api_key.clone(),
        config.oracle.model.clone(),
    )?;

    let repair = RepairLoop::new(&config, &oracle);
    // every outcome exits cleanly; the status line is the report
    match repair.run().await? {
        RunOutcome::Success { iterations } => {
            println!("All tests passed after {} iteration(s)", iterations);
        }
        RunOutcome::NoTestCommand => {
            println!("Aborted: no usable test command was found");
        }
        RunOutcome::IterationCap => {
            println!("Stopped: iteration cap reached with errors remaining");
        }
    }

    Ok(())
}
