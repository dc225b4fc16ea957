//! Process-wide shutdown signal shared by the tunnel and the updater.

use tokio::sync::watch;
use tracing::{info, warn};

/// Exit code reported when a run is interrupted.
pub const INTERRUPTED_EXIT_CODE: u8 = 130;

/// Receiver that never fires; its sender is already gone.
pub fn never() -> watch::Receiver<bool> {
    watch::channel(false).1
}

/// Flip the returned receiver to `true` on Ctrl+C or SIGTERM.
///
/// The handler stays installed after the first signal, so the run keeps
/// reacting to repeated interrupts; a second one ends the process at once.
pub fn on_signal() -> watch::Receiver<bool> {
    let (tx, rx) = watch::channel(false);
    tokio::spawn(async move {
        #[cfg(unix)]
        let mut sigterm =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(sigterm) => Some(sigterm),
                Err(e) => {
                    warn!(error = %e, "Failed to install SIGTERM handler");
                    None
                }
            };

        loop {
            #[cfg(unix)]
            let sigterm_future = async {
                match sigterm.as_mut() {
                    Some(sigterm) => sigterm.recv().await,
                    None => std::future::pending().await,
                }
            };
            #[cfg(not(unix))]
            let sigterm_future = std::future::pending::<Option<()>>();

            tokio::select! {
                result = tokio::signal::ctrl_c() => {
                    if let Err(e) = result {
                        warn!(error = %e, "Failed to listen for Ctrl+C");
                        return;
                    }
                    info!("Received Ctrl+C shutdown signal");
                }
                _ = sigterm_future => info!("Received SIGTERM shutdown signal"),
            }

            if tx.send_replace(true) {
                warn!("Interrupted again, exiting");
                std::process::exit(i32::from(INTERRUPTED_EXIT_CODE));
            }
        }
    });
    rx
}

/// Resolve once `shutdown` turns `true`. Never resolves if the sender is
/// dropped without signalling.
pub async fn interrupted(mut shutdown: watch::Receiver<bool>) {
    if shutdown.wait_for(|stop| *stop).await.is_err() {
        std::future::pending::<()>().await;
    }
}
