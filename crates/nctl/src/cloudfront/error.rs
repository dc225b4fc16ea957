//! CloudFront error types.

use std::path::PathBuf;

/// Errors from distribution lookup, creation and update.
///
/// None of these tear down an active tunnel.
#[derive(Debug, thiserror::Error)]
pub enum CdnError {
    #[error("CloudFront distribution not found: {id}")]
    NotFound { id: String },

    #[error("Distribution {id} has no origin to point at the tunnel")]
    MissingOrigin { id: String },

    #[error("Distribution {id} has no default cache behavior")]
    MissingCacheBehavior { id: String },

    #[error("Distribution {id} changed while it was being updated (ETag mismatch)")]
    PreconditionFailed { id: String },

    #[error("{operation} returned no distribution")]
    EmptyResponse { operation: &'static str },

    #[error("Invalid distribution config {}: {reason}", path.display())]
    Template { path: PathBuf, reason: String },

    #[error("Invalid distribution config: {0}")]
    InvalidConfig(String),

    #[error("{operation} failed: {message}")]
    Provider {
        operation: &'static str,
        message: String,
    },

    #[error("Distribution worker failed: {0}")]
    Worker(String),
}

impl CdnError {
    pub fn provider(operation: &'static str, err: impl std::error::Error) -> Self {
        Self::Provider {
            operation,
            message: aws_sdk_cloudfront::error::DisplayErrorContext(err).to_string(),
        }
    }
}
