//! CloudFront distribution management.
//!
//! [`CloudFrontUpdater`] decides between updating an existing distribution
//! and creating one from a template. It talks to AWS through the
//! [`DistributionApi`] seam, implemented by [`CloudFrontClient`].

mod client;
mod error;
mod model;
mod origin;
mod snapshot;
mod template;
mod updater;

pub use client::{CloudFrontClient, DistributionApi};
pub use error::CdnError;
pub use model::{DEPLOYED, DistributionInfo, OriginRecord};
pub use origin::rewrite_origin;
pub use snapshot::{DEFAULT_SNAPSHOT_DIR, store_snapshot};
pub use template::{CacheBehaviorTemplate, DistributionTemplate, OriginTemplate};
pub use updater::{CloudFrontUpdater, WaitPolicy, wait_deployed};
