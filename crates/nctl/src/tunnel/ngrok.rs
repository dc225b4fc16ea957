//! Tunnel runner backed by the ngrok agent CLI.

use std::path::PathBuf;
use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::{oneshot, watch};
use tracing::{Instrument, debug, error, info, warn};

use nctl_core::config::{EnvConfig, SecretString};

use super::frame::{FrameLevel, LogFrame};
use super::{PublicUrl, TunnelError, TunnelProvider};
use crate::cmd::command_exists;
use crate::shutdown::interrupted;

/// Environment variable the agent reads its auth token from.
const AUTHTOKEN_ENV: &str = "NGROK_AUTHTOKEN";

/// How to launch the ngrok agent.
#[derive(Debug, Clone)]
pub struct NgrokConfig {
    /// Path or name of the `ngrok` binary.
    pub binary: PathBuf,
    /// Local `host:port` the tunnel forwards to.
    pub upstream: String,
    pub auth_token: SecretString,
    /// Agent config file passed through `--config`.
    pub config_file: Option<PathBuf>,
}

impl NgrokConfig {
    pub fn from_env(env: &EnvConfig, binary: PathBuf) -> Self {
        Self {
            binary,
            upstream: env.upstream(),
            auth_token: env.ngrok_auth.clone(),
            config_file: env.ngrok_config.clone(),
        }
    }

    /// Command-line arguments for `ngrok`. The auth token is passed through
    /// the environment so it never shows up in a process listing.
    pub fn args(&self) -> Vec<String> {
        let mut args = vec![
            "http".to_string(),
            self.upstream.clone(),
            "--log".to_string(),
            "stdout".to_string(),
            "--log-format".to_string(),
            "logfmt".to_string(),
        ];
        if let Some(path) = &self.config_file {
            args.push("--config".to_string());
            args.push(path.display().to_string());
        }
        args
    }
}

/// Runs `ngrok http` as a child process and follows its log output.
#[derive(Debug, Clone)]
pub struct NgrokTunnel {
    config: NgrokConfig,
}

impl NgrokTunnel {
    pub const fn new(config: NgrokConfig) -> Self {
        Self { config }
    }
}

/// What a single agent line meant for the run.
#[derive(Debug, PartialEq, Eq)]
enum LineEffect {
    Nothing,
    Ready(PublicUrl),
    Failed(String),
}

/// Re-emit an agent line through tracing and work out what it means.
fn handle_line(line: &str) -> LineEffect {
    let Some(frame) = LogFrame::parse(line) else {
        if !line.trim().is_empty() {
            info!("{}", line.trim());
        }
        return LineEffect::Nothing;
    };

    let description = frame.describe();
    match frame.level() {
        FrameLevel::Debug => debug!("{description}"),
        FrameLevel::Info => info!("{description}"),
        FrameLevel::Warn => warn!("{description}"),
        FrameLevel::Error => error!("{description}"),
        FrameLevel::Other => return LineEffect::Nothing,
    }

    if let Some(url) = frame.public_url() {
        return match PublicUrl::parse(url) {
            Ok(url) => LineEffect::Ready(url),
            Err(e) => LineEffect::Failed(e.to_string()),
        };
    }
    if frame.level() == FrameLevel::Error {
        return LineEffect::Failed(frame.error().unwrap_or(frame.message()).to_string());
    }
    LineEffect::Nothing
}

impl TunnelProvider for NgrokTunnel {
    async fn run(
        &self,
        ready: oneshot::Sender<PublicUrl>,
        shutdown: watch::Receiver<bool>,
    ) -> Result<(), TunnelError> {
        let binary = self.config.binary.display().to_string();
        if !command_exists(&self.config.binary) {
            return Err(TunnelError::BinaryNotFound { binary });
        }
        if let Some(path) = &self.config.config_file {
            info!(path = %path.display(), "Using ngrok config file");
        }

        let args = self.config.args();
        info!(upstream = %self.config.upstream, "Starting ngrok tunnel");
        debug!("exec: {binary} {}", args.join(" "));

        let mut child = Command::new(&self.config.binary)
            .args(&args)
            .env(AUTHTOKEN_ENV, self.config.auth_token.expose())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(TunnelError::Spawn)?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| TunnelError::Spawn(std::io::Error::other("failed to capture stdout")))?;

        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(
                async move {
                    let mut lines = BufReader::new(stderr).lines();
                    while let Ok(Some(line)) = lines.next_line().await {
                        warn!("stderr: {line}");
                    }
                }
                .in_current_span(),
            );
        }

        let mut lines = BufReader::new(stdout).lines();
        let mut ready = Some(ready);
        let mut last_error: Option<String> = None;
        let stop = interrupted(shutdown);
        tokio::pin!(stop);

        loop {
            tokio::select! {
                line = lines.next_line() => match line {
                    Ok(Some(line)) => match handle_line(&line) {
                        LineEffect::Ready(url) => {
                            if let Some(tx) = ready.take() {
                                info!(
                                    "Tunneling http://{} through the public URL: {url}",
                                    self.config.upstream
                                );
                                if tx.send(url).is_err() {
                                    debug!("nobody is waiting for the public URL");
                                }
                            }
                        }
                        LineEffect::Failed(detail) => last_error = Some(detail),
                        LineEffect::Nothing => {}
                    },
                    Ok(None) => break,
                    Err(e) => {
                        warn!(error = %e, "Failed to read ngrok output");
                        break;
                    }
                },
                () = &mut stop => {
                    warn!("Tunneling interrupted");
                    child.kill().await.ok();
                    warn!("Connection closed");
                    return if ready.is_some() {
                        Err(TunnelError::NotReady)
                    } else {
                        Ok(())
                    };
                }
            }
        }

        let status = child.wait().await?;
        warn!(%status, "Connection closed");

        if ready.is_some() || !status.success() {
            return Err(last_error.map_or_else(
                || TunnelError::Exited {
                    status: status.to_string(),
                },
                |detail| TunnelError::from_agent(&detail),
            ));
        }
        Ok(())
    }
}
