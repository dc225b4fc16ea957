//! Tunnel runner.
//!
//! A [`TunnelProvider`] owns a blocking tunnel session. It signals the
//! assigned public URL exactly once through a oneshot channel and returns
//! only when the session ends or the shutdown signal fires.

mod error;
pub mod frame;
mod ngrok;
mod url;

use std::future::Future;

use tokio::sync::{oneshot, watch};

pub use error::TunnelError;
pub use ngrok::{NgrokConfig, NgrokTunnel};
pub use url::PublicUrl;

/// Something that can expose a local port under a public URL.
pub trait TunnelProvider {
    /// Run the tunnel until it terminates.
    ///
    /// `ready` is consumed by the first successful establishment, so the
    /// public URL is delivered at most once. Dropping it without sending
    /// tells the waiting side that the tunnel never came up. The session is
    /// torn down once `shutdown` turns `true`.
    fn run(
        &self,
        ready: oneshot::Sender<PublicUrl>,
        shutdown: watch::Receiver<bool>,
    ) -> impl Future<Output = Result<(), TunnelError>>;
}
