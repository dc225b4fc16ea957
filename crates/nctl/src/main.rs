#![recursion_limit = "256"]

use std::process::ExitCode;

use clap::{Parser, Subcommand};

use nctl::orchestrator::RunError;
use nctl::start::StartArgs;
use nctl::update::UpdateArgs;
use nctl_core::ProcessLabel;

/// Expose a local port through ngrok and point a CloudFront distribution at it.
#[derive(Debug, Parser)]
#[command(name = "nctl", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Start the tunnel and update the distribution
    #[command(alias = "run")]
    Start(StartArgs),
    /// Update the distribution for a tunnel that is already running
    Update(UpdateArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let (label, result) = match cli.command {
        Commands::Start(args) => (ProcessLabel::Main, nctl::start::run(args).await),
        Commands::Update(args) => (ProcessLabel::CloudFront, nctl::update::run(args).await),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            label.span().in_scope(|| tracing::error!("{err:#}"));
            let code = err.downcast_ref::<RunError>().map_or(1, RunError::exit_code);
            ExitCode::from(code)
        }
    }
}
