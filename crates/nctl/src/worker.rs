//! Distribution update in a separate process.
//!
//! The parent re-executes its own binary as `nctl update --public-url <url>`.
//! The worker logs to the shared stderr under the `cloudfront` label and
//! prints the resulting [`DistributionInfo`] as one JSON line on stdout.

use std::ffi::OsString;
use std::path::PathBuf;

use tracing::info;

use crate::cloudfront::{CdnError, DistributionInfo};
use crate::cmd::run_capture;
use crate::orchestrator::DistributionUpdater;
use crate::tunnel::PublicUrl;

#[derive(Debug, Clone)]
pub struct WorkerProcessUpdater {
    exe: PathBuf,
    env_file: Option<PathBuf>,
    wait_deployed: bool,
    snapshot_dir: Option<PathBuf>,
}

impl WorkerProcessUpdater {
    pub const fn new(exe: PathBuf, env_file: Option<PathBuf>) -> Self {
        Self {
            exe,
            env_file,
            wait_deployed: false,
            snapshot_dir: None,
        }
    }

    #[must_use]
    pub const fn wait_deployed(mut self, wait: bool) -> Self {
        self.wait_deployed = wait;
        self
    }

    #[must_use]
    pub fn snapshot_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.snapshot_dir = dir;
        self
    }

    /// Arguments for the worker invocation.
    pub fn args(&self, url: &PublicUrl) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["update".into(), "--public-url".into(), url.as_str().into()];
        if let Some(env_file) = &self.env_file {
            args.push("--env".into());
            args.push(env_file.into());
        }
        if self.wait_deployed {
            args.push("--wait-deployed".into());
        }
        if let Some(dir) = &self.snapshot_dir {
            args.push("--snapshot-dir".into());
            args.push(dir.into());
        }
        args
    }
}

impl DistributionUpdater for WorkerProcessUpdater {
    async fn update(&self, url: &PublicUrl) -> Result<DistributionInfo, CdnError> {
        info!(exe = %self.exe.display(), "Starting distribution worker");
        let output = run_capture(&self.exe, &self.args(url))
            .await
            .map_err(|e| CdnError::Worker(format!("failed to launch {}: {e}", self.exe.display())))?;
        if !output.status.success() {
            return Err(CdnError::Worker(format!("exited with {}", output.status)));
        }
        parse_worker_output(&output.stdout)
    }
}

/// Read the distribution from the worker's stdout. Only the last non-empty
/// line is considered.
pub fn parse_worker_output(stdout: &str) -> Result<DistributionInfo, CdnError> {
    let line = stdout
        .lines()
        .map(str::trim)
        .rfind(|line| !line.is_empty())
        .ok_or_else(|| CdnError::Worker("no output".into()))?;
    serde_json::from_str(line).map_err(|e| CdnError::Worker(format!("unreadable output: {e}")))
}
