use std::io;
use std::path::{Path, PathBuf};

use super::model::DistributionInfo;

/// Default directory for snapshots, relative to the working directory.
pub const DEFAULT_SNAPSHOT_DIR: &str = "cloudfront_config";

/// Write `info` to `<dir>/config_<id>_<MMDDYY>.json` and return the path.
///
/// Called with the distribution as it was before an update. The file is the
/// [`DistributionInfo`] summary (ids, status, ETag, origin domains), which
/// records the previous origin domain; it is not a full `DistributionConfig`
/// and cannot be applied back to CloudFront as is.
pub fn store_snapshot(dir: &Path, info: &DistributionInfo) -> io::Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let stamp = chrono::Local::now().format("%m%d%y");
    let path = dir.join(format!("config_{}_{stamp}.json", info.id));
    let json = serde_json::to_string_pretty(info).map_err(io::Error::other)?;
    std::fs::write(&path, json)?;
    tracing::info!(path = %path.display(), "Stored distribution snapshot");
    Ok(path)
}
