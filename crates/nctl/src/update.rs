//! `nctl update`: point the distribution at an already running tunnel.
//!
//! This is also the entry point of the worker process started by
//! `nctl start --worker`. The resulting distribution is printed to stdout
//! as a single JSON line.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tracing::Instrument;

use nctl_core::{LogConfig, ProcessLabel, load_env, tracing_init::init_tracing};

use crate::cloudfront::{CloudFrontClient, CloudFrontUpdater, WaitPolicy};
use crate::orchestrator::{DistributionUpdater, RunError};
use crate::tunnel::PublicUrl;

/// Options shared by `start` and `update`.
#[derive(Debug, Clone, Args)]
pub struct DistributionArgs {
    /// Environment file (.env, .json, .toml or .yaml). Defaults to ./.env when present
    #[arg(short = 'E', long = "env")]
    pub env: Option<PathBuf>,

    /// Wait until the distribution reports Deployed
    #[arg(long)]
    pub wait_deployed: bool,

    /// Store a JSON snapshot of the distribution here before changing it
    #[arg(long)]
    pub snapshot_dir: Option<PathBuf>,
}

impl DistributionArgs {
    pub fn wait_policy(&self) -> Option<WaitPolicy> {
        self.wait_deployed.then(WaitPolicy::default)
    }
}

/// Arguments for the `update` subcommand.
#[derive(Debug, Args)]
pub struct UpdateArgs {
    /// Public URL of the running tunnel
    #[arg(long)]
    pub public_url: PublicUrl,

    #[command(flatten)]
    pub common: DistributionArgs,
}

/// Run the update and print the distribution as JSON.
pub async fn run(args: UpdateArgs) -> Result<()> {
    let env = match load_env(args.common.env.as_deref()) {
        Ok(env) => env,
        Err(e) => {
            init_tracing(&LogConfig::new(false, false, ProcessLabel::CloudFront));
            return Err(RunError::from(e).into());
        }
    };
    init_tracing(&LogConfig::new(
        env.debug,
        env.log_json,
        ProcessLabel::CloudFront,
    ));

    async move {
        let client = CloudFrontClient::from_env(&env.aws).await;
        let updater = CloudFrontUpdater::new(client, env.distribution.clone())
            .wait_deployed(args.common.wait_policy())
            .snapshot_dir(args.common.snapshot_dir.clone());

        let info = updater
            .update(&args.public_url)
            .await
            .map_err(|source| RunError::Cdn {
                public_url: args.public_url.clone(),
                source,
            })?;

        let json = serde_json::to_string(&info).context("Failed to serialize distribution")?;
        emit(&json);
        anyhow::Ok(())
    }
    .instrument(ProcessLabel::CloudFront.span())
    .await
}

/// stdout carries only the result; logs go to stderr.
#[allow(clippy::print_stdout)]
fn emit(json: &str) {
    println!("{json}");
}
