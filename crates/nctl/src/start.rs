//! `nctl start`: open the tunnel and point the distribution at it.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use tracing::{Instrument, info};

use nctl_core::config::EnvConfig;
use nctl_core::{LogConfig, ProcessLabel, collect_vars, tracing_init::init_tracing};

use crate::cloudfront::{CloudFrontClient, CloudFrontUpdater};
use crate::orchestrator::{
    DistributionUpdater, Orchestrator, RunError, RunReport, RunState, StateMachine,
};
use crate::shutdown;
use crate::tunnel::{NgrokConfig, NgrokTunnel, TunnelProvider};
use crate::update::DistributionArgs;
use crate::worker::WorkerProcessUpdater;

/// Arguments for the `start` subcommand.
#[derive(Debug, Args)]
pub struct StartArgs {
    #[command(flatten)]
    pub common: DistributionArgs,

    /// Run the CloudFront update in a separate `nctl update` process
    #[arg(long)]
    pub worker: bool,

    /// Path to the ngrok binary
    #[arg(long, default_value = "ngrok")]
    pub ngrok_bin: PathBuf,
}

/// Collect and validate the configuration, recording progress in `state`.
fn load(state: &StateMachine, env_file: Option<&Path>) -> Result<EnvConfig, RunError> {
    let vars = collect_vars(env_file)?;
    state.advance(RunState::Validating)?;
    Ok(EnvConfig::from_vars(&vars)?)
}

/// Run the tunnel and the distribution update until the tunnel ends.
pub async fn run(args: StartArgs) -> Result<()> {
    let state = StateMachine::new();
    let env = match load(&state, args.common.env.as_deref()) {
        Ok(env) => env,
        Err(e) => {
            state.fail();
            init_tracing(&LogConfig::new(false, false, ProcessLabel::Main));
            return Err(e.into());
        }
    };
    init_tracing(&LogConfig::new(env.debug, env.log_json, ProcessLabel::Main));

    async move {
        info!(
            upstream = %env.upstream(),
            distribution = env.distribution_id().unwrap_or("<new>"),
            worker = args.worker,
            "Configuration loaded"
        );
        let tunnel = NgrokTunnel::new(NgrokConfig::from_env(&env, args.ngrok_bin.clone()));

        if args.worker {
            let exe = std::env::current_exe().context("Failed to locate the nctl executable")?;
            let updater = WorkerProcessUpdater::new(exe, args.common.env.clone())
                .wait_deployed(args.common.wait_deployed)
                .snapshot_dir(args.common.snapshot_dir.clone());
            drive(tunnel, updater, state).await
        } else {
            let client = CloudFrontClient::from_env(&env.aws).await;
            let updater = CloudFrontUpdater::new(client, env.distribution.clone())
                .wait_deployed(args.common.wait_policy())
                .snapshot_dir(args.common.snapshot_dir.clone());
            drive(tunnel, updater, state).await
        }
    }
    .instrument(ProcessLabel::Main.span())
    .await
}

async fn drive<T, U>(tunnel: T, updater: U, state: StateMachine) -> Result<()>
where
    T: TunnelProvider,
    U: DistributionUpdater,
{
    let RunReport {
        public_url,
        distribution,
    } = Orchestrator::new(tunnel, updater, state)
        .with_shutdown(shutdown::on_signal())
        .run()
        .await?;
    info!(
        url = %public_url,
        distribution = %distribution.id,
        domain = %distribution.domain_name,
        "Tunnel closed"
    );
    Ok(())
}
