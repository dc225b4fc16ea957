//! Tunnel runner error types.

/// Errors that end a tunnel run. None of them are retried.
#[derive(Debug, thiserror::Error)]
pub enum TunnelError {
    #[error(
        "ngrok CLI not found ({binary}). To proceed, install it from https://ngrok.com/download"
    )]
    BinaryNotFound { binary: String },

    #[error("Failed to spawn ngrok: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("Tunnel authentication failed: {0}")]
    Auth(String),

    #[error("Port already in use: {0}")]
    PortInUse(String),

    #[error("Tunnel provider error: {0}")]
    Provider(String),

    #[error("ngrok exited before the tunnel became ready ({status})")]
    Exited { status: String },

    #[error("Tunnel closed before it became ready")]
    NotReady,

    #[error("Invalid public URL reported by the tunnel: {0:?}")]
    InvalidUrl(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TunnelError {
    /// Classify an error reported by the agent.
    pub fn from_agent(detail: &str) -> Self {
        let lowered = detail.to_ascii_lowercase();
        if lowered.contains("authentication failed")
            || lowered.contains("authtoken")
            || lowered.contains("err_ngrok_105")
            || lowered.contains("err_ngrok_107")
        {
            Self::Auth(detail.to_string())
        } else if lowered.contains("address already in use") {
            Self::PortInUse(detail.to_string())
        } else {
            Self::Provider(detail.to_string())
        }
    }
}
