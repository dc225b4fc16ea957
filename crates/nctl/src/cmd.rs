use std::ffi::{OsStr, OsString};
use std::path::Path;
use std::process::{ExitStatus, Stdio};

use tokio::process::Command;

/// Check whether a program exists on PATH (or at the given path).
pub fn command_exists(program: impl AsRef<OsStr>) -> bool {
    std::process::Command::new("which")
        .arg(program)
        .output()
        .is_ok_and(|o| o.status.success())
}

/// Result of [`run_capture`].
#[derive(Debug)]
pub struct CapturedOutput {
    pub status: ExitStatus,
    pub stdout: String,
}

/// Execute a command, capturing stdout and letting stderr through to ours.
///
/// The child is killed if the returned future is dropped.
pub async fn run_capture(program: &Path, args: &[OsString]) -> std::io::Result<CapturedOutput> {
    let cmd_line = format!(
        "{} {}",
        program.display(),
        args.iter()
            .map(|a| a.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ")
    );
    tracing::debug!("exec (capture): {cmd_line}");

    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .kill_on_drop(true)
        .output()
        .await?;

    Ok(CapturedOutput {
        status: output.status,
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
    })
}
