//! Conversions from SDK types and the origin rewrite applied on update.

use aws_sdk_cloudfront::types::{Distribution, DistributionConfig, Origin};
use tracing::info;

use super::error::CdnError;
use super::model::{DistributionInfo, OriginRecord, target_index};

impl From<&Origin> for OriginRecord {
    fn from(origin: &Origin) -> Self {
        Self {
            id: origin.id().to_string(),
            domain_name: origin.domain_name().to_string(),
        }
    }
}

/// Origins and default target origin id of a config.
pub fn origin_records(config: Option<&DistributionConfig>) -> (Vec<OriginRecord>, Option<String>) {
    let origins = config
        .and_then(DistributionConfig::origins)
        .map(|o| o.items().iter().map(OriginRecord::from).collect())
        .unwrap_or_default();
    let target = config
        .and_then(DistributionConfig::default_cache_behavior)
        .map(|b| b.target_origin_id().to_string());
    (origins, target)
}

/// Build a [`DistributionInfo`] from an SDK distribution and its ETag.
pub fn distribution_info(distribution: &Distribution, e_tag: Option<&str>) -> DistributionInfo {
    let (origins, target_origin_id) = origin_records(distribution.distribution_config());
    DistributionInfo {
        id: distribution.id().to_string(),
        domain_name: distribution.domain_name().to_string(),
        status: distribution.status().to_string(),
        e_tag: e_tag.map(str::to_string),
        origins,
        target_origin_id,
    }
}

/// Point the distribution's default origin at `host`.
///
/// Only the domain changes. The origin id is left alone so every cache
/// behavior keeps referencing a valid origin. Returns the previous domain.
pub fn rewrite_origin(
    id: &str,
    config: &mut DistributionConfig,
    host: &str,
) -> Result<String, CdnError> {
    let target = config
        .default_cache_behavior
        .as_ref()
        .ok_or_else(|| CdnError::MissingCacheBehavior { id: id.to_string() })?
        .target_origin_id
        .clone();
    let origins = config
        .origins
        .as_mut()
        .ok_or_else(|| CdnError::MissingOrigin { id: id.to_string() })?;
    let index = target_index(origins.items.iter().map(|o| o.id.as_str()), Some(target.as_str()))
        .ok_or_else(|| CdnError::MissingOrigin { id: id.to_string() })?;
    let origin = &mut origins.items[index];

    info!("DomainName::{} -> {host}", origin.domain_name);
    let previous = std::mem::replace(&mut origin.domain_name, host.to_string());
    Ok(previous)
}
