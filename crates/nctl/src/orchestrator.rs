//! Run orchestration: tunnel first, then the distribution update.
//!
//! The tunnel and the updater run as two futures joined on one task. The
//! only thing crossing between them is the public URL, delivered once over
//! a oneshot channel. The move to `DistributionUpdating` happens when that
//! URL arrives; nothing is polled. A shutdown signal reaches both futures,
//! so an interrupt ends the run even while an update is in flight.

use std::fmt;
use std::future::Future;

use tokio::sync::{oneshot, watch};
use tracing::{Instrument, debug, error, info, warn};

use nctl_core::{ConfigError, ProcessLabel};

use crate::cloudfront::{CdnError, DistributionInfo};
use crate::shutdown::{INTERRUPTED_EXIT_CODE, interrupted, never};
use crate::tunnel::{PublicUrl, TunnelError, TunnelProvider};

/// Lifecycle of a single `nctl start` run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunState {
    /// Reading the environment file and process variables.
    Loading,
    /// Checking the collected values.
    Validating,
    /// Tunnel agent launched, no public URL yet.
    TunnelStarting,
    /// Public URL assigned.
    TunnelActive,
    /// Pointing the distribution at the public URL.
    DistributionUpdating,
    Done,
    Failed,
}

impl RunState {
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    pub const fn can_transition_to(self, next: Self) -> bool {
        match (self, next) {
            (Self::Loading, Self::Validating)
            | (Self::Validating, Self::TunnelStarting)
            | (Self::TunnelStarting, Self::TunnelActive)
            | (Self::TunnelActive, Self::DistributionUpdating)
            | (Self::DistributionUpdating, Self::Done) => true,
            (from, Self::Failed) => !from.is_terminal(),
            _ => false,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Loading => "loading",
            Self::Validating => "validating",
            Self::TunnelStarting => "tunnel_starting",
            Self::TunnelActive => "tunnel_active",
            Self::DistributionUpdating => "distribution_updating",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current [`RunState`], observable through a watch channel.
#[derive(Debug)]
pub struct StateMachine {
    tx: watch::Sender<RunState>,
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl StateMachine {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(RunState::Loading);
        Self { tx }
    }

    pub fn current(&self) -> RunState {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<RunState> {
        self.tx.subscribe()
    }

    /// Move to `next`, rejecting transitions the lifecycle does not allow.
    pub fn advance(&self, next: RunState) -> Result<(), RunError> {
        let from = self.current();
        if !from.can_transition_to(next) {
            return Err(RunError::IllegalTransition { from, to: next });
        }
        debug!(%from, to = %next, "state transition");
        self.tx.send_replace(next);
        Ok(())
    }

    /// Move to `Failed` unless the run already finished.
    pub fn fail(&self) {
        let from = self.current();
        if from.can_transition_to(RunState::Failed) {
            debug!(%from, to = %RunState::Failed, "state transition");
            self.tx.send_replace(RunState::Failed);
        }
    }
}

/// Points a distribution at a public URL.
pub trait DistributionUpdater {
    fn update(
        &self,
        url: &PublicUrl,
    ) -> impl Future<Output = Result<DistributionInfo, CdnError>>;
}

/// Outcome of a successful run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub public_url: PublicUrl,
    pub distribution: DistributionInfo,
}

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Tunnel(#[from] TunnelError),

    #[error("{source}; the tunnel was served at {public_url}")]
    Cdn {
        public_url: PublicUrl,
        #[source]
        source: CdnError,
    },

    #[error("Interrupted while updating the distribution for {public_url}")]
    Interrupted { public_url: PublicUrl },

    #[error("Illegal state transition {from} -> {to}")]
    IllegalTransition { from: RunState, to: RunState },
}

impl RunError {
    /// Process exit code for this failure.
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::IllegalTransition { .. } => 1,
            Self::Config(_) => 2,
            Self::Tunnel(_) => 3,
            Self::Cdn { .. } => 4,
            Self::Interrupted { .. } => INTERRUPTED_EXIT_CODE,
        }
    }

    /// Public URL of a tunnel that came up before the run failed.
    pub const fn public_url(&self) -> Option<&PublicUrl> {
        match self {
            Self::Cdn { public_url, .. } | Self::Interrupted { public_url } => Some(public_url),
            _ => None,
        }
    }
}

/// Drives one tunnel session and the distribution update that follows it.
#[derive(Debug)]
pub struct Orchestrator<T, U> {
    tunnel: T,
    updater: U,
    state: StateMachine,
    shutdown: watch::Receiver<bool>,
}

impl<T: TunnelProvider, U: DistributionUpdater> Orchestrator<T, U> {
    /// `state` must already be `Validating`.
    pub fn new(tunnel: T, updater: U, state: StateMachine) -> Self {
        Self {
            tunnel,
            updater,
            state,
            shutdown: never(),
        }
    }

    /// Stop the tunnel and abandon a pending update once `shutdown` fires.
    #[must_use]
    pub fn with_shutdown(mut self, shutdown: watch::Receiver<bool>) -> Self {
        self.shutdown = shutdown;
        self
    }

    pub const fn state(&self) -> &StateMachine {
        &self.state
    }

    pub const fn updater(&self) -> &U {
        &self.updater
    }

    /// Run until the tunnel ends.
    ///
    /// A failed update does not stop the tunnel; it is reported once the
    /// tunnel has terminated.
    pub async fn run(&self) -> Result<RunReport, RunError> {
        self.state.advance(RunState::TunnelStarting)?;
        let (ready_tx, ready_rx) = oneshot::channel();

        let tunnel = async {
            let result = self.tunnel.run(ready_tx, self.shutdown.clone()).await;
            if let Err(e) = &result {
                error!(error = %e, "Tunnel failed");
            }
            result
        }
        .instrument(ProcessLabel::Tunnel.span());

        let (tunnel_result, update_result) = tokio::join!(tunnel, self.dispatch_update(ready_rx));

        match (update_result, tunnel_result) {
            (Err(e), tunnel_result) => {
                if let Err(tunnel_err) = tunnel_result {
                    warn!(error = %tunnel_err, "Tunnel also failed");
                }
                Err(e)
            }
            (Ok(Some(report)), Ok(())) => Ok(report),
            (Ok(_), Err(e)) => {
                self.state.fail();
                Err(e.into())
            }
            (Ok(None), Ok(())) => {
                self.state.fail();
                Err(TunnelError::NotReady.into())
            }
        }
    }

    /// Wait for the public URL and point the distribution at it.
    ///
    /// Returns `Ok(None)` when the tunnel ended without becoming ready.
    async fn dispatch_update(
        &self,
        ready: oneshot::Receiver<PublicUrl>,
    ) -> Result<Option<RunReport>, RunError> {
        let Ok(public_url) = ready.await else {
            return Ok(None);
        };
        self.state.advance(RunState::TunnelActive)?;
        info!(url = %public_url, "Public URL: {public_url}");

        self.state.advance(RunState::DistributionUpdating)?;
        let update = async {
            tokio::select! {
                result = self.updater.update(&public_url) => {
                    if let Err(e) = &result {
                        error!(error = %e, "Distribution update failed");
                    }
                    Some(result)
                }
                () = interrupted(self.shutdown.clone()) => {
                    warn!("Cloudfront status check suspended");
                    None
                }
            }
        }
        .instrument(ProcessLabel::CloudFront.span())
        .await;

        match update {
            None => {
                self.state.fail();
                Err(RunError::Interrupted { public_url })
            }
            Some(Ok(distribution)) => {
                self.state.advance(RunState::Done)?;
                Ok(Some(RunReport {
                    public_url,
                    distribution,
                }))
            }
            Some(Err(source)) => {
                self.state.fail();
                Err(RunError::Cdn { public_url, source })
            }
        }
    }
}
