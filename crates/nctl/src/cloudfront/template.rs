//! Distribution templates used to create a new distribution.
//!
//! A template is a JSON, TOML or YAML file describing the parts of a
//! `DistributionConfig` nctl needs. The tunnel host is filled into the
//! default origin before the distribution is created.

use std::path::Path;

use aws_sdk_cloudfront::error::BuildError;
use aws_sdk_cloudfront::types::{
    CustomOriginConfig, DefaultCacheBehavior, DistributionConfig, Origin, OriginProtocolPolicy,
    Origins, ViewerProtocolPolicy,
};
use serde::Deserialize;

use super::error::CdnError;
use super::model::target_index;

/// AWS managed `CachingDisabled` cache policy. Tunnel backends are live
/// services, so nothing is cached unless the template says otherwise.
pub const CACHING_DISABLED_POLICY_ID: &str = "4135ea2d-6df8-44a3-9df3-4b5a84be39ad";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DistributionTemplate {
    /// Unique creation token. A random one is generated when omitted.
    #[serde(default)]
    pub caller_reference: Option<String>,
    #[serde(default)]
    pub comment: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    pub origins: Vec<OriginTemplate>,
    pub default_cache_behavior: CacheBehaviorTemplate,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OriginTemplate {
    pub id: String,
    /// Placeholder for the tunnel origin; replaced before creation.
    #[serde(default)]
    pub domain_name: String,
    #[serde(default)]
    pub origin_path: Option<String>,
    #[serde(default = "default_http_port")]
    pub http_port: i32,
    #[serde(default = "default_https_port")]
    pub https_port: i32,
    #[serde(default = "default_protocol_policy")]
    pub protocol_policy: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CacheBehaviorTemplate {
    pub target_origin_id: String,
    #[serde(default = "default_viewer_protocol_policy")]
    pub viewer_protocol_policy: String,
    #[serde(default = "default_cache_policy_id")]
    pub cache_policy_id: String,
}

const fn default_enabled() -> bool {
    true
}

const fn default_http_port() -> i32 {
    80
}

const fn default_https_port() -> i32 {
    443
}

fn default_protocol_policy() -> String {
    "https-only".to_string()
}

fn default_viewer_protocol_policy() -> String {
    "redirect-to-https".to_string()
}

fn default_cache_policy_id() -> String {
    CACHING_DISABLED_POLICY_ID.to_string()
}

impl DistributionTemplate {
    /// Load a template from a `.json`, `.toml`, `.yaml` or `.yml` file.
    pub fn load(path: &Path) -> Result<Self, CdnError> {
        let template_err = |reason: String| CdnError::Template {
            path: path.to_path_buf(),
            reason,
        };
        let content = std::fs::read_to_string(path).map_err(|e| template_err(e.to_string()))?;
        let ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        let template: Self = match ext.as_deref() {
            Some("json") => serde_json::from_str(&content).map_err(|e| template_err(e.to_string()))?,
            Some("toml") => toml::from_str(&content).map_err(|e| template_err(e.to_string()))?,
            Some("yaml" | "yml") => ::config::Config::builder()
                .add_source(::config::File::from_str(&content, ::config::FileFormat::Yaml))
                .build()
                .and_then(::config::Config::try_deserialize)
                .map_err(|e| template_err(e.to_string()))?,
            _ => return Err(template_err("config file can only be JSON, TOML or YAML".into())),
        };
        template
            .validate()
            .map_err(|e| template_err(e.to_string()))?;
        Ok(template)
    }

    fn validate(&self) -> Result<(), CdnError> {
        if self.origins.is_empty() {
            return Err(CdnError::InvalidConfig("at least one origin is required".into()));
        }
        for origin in &self.origins {
            if !OriginProtocolPolicy::values()
                .iter()
                .any(|v| *v == origin.protocol_policy)
            {
                return Err(CdnError::InvalidConfig(format!(
                    "unknown protocol_policy {:?} for origin {:?}",
                    origin.protocol_policy, origin.id
                )));
            }
        }
        let viewer = self.default_cache_behavior.viewer_protocol_policy.as_str();
        if !ViewerProtocolPolicy::values().iter().any(|v| *v == viewer) {
            return Err(CdnError::InvalidConfig(format!(
                "unknown viewer_protocol_policy {viewer:?}"
            )));
        }
        Ok(())
    }

    /// Fill the tunnel host into the default origin.
    pub fn with_origin(mut self, host: &str) -> Result<Self, CdnError> {
        let index = target_index(
            self.origins.iter().map(|o| o.id.as_str()),
            Some(self.default_cache_behavior.target_origin_id.as_str()),
        )
        .ok_or_else(|| {
            CdnError::InvalidConfig(format!(
                "default_cache_behavior.target_origin_id {:?} matches no origin",
                self.default_cache_behavior.target_origin_id
            ))
        })?;
        self.origins[index].domain_name = host.to_string();
        Ok(self)
    }

    /// Build the SDK config sent with `CreateDistribution`.
    pub fn to_sdk(&self) -> Result<DistributionConfig, CdnError> {
        let items = self
            .origins
            .iter()
            .map(OriginTemplate::to_sdk)
            .collect::<Result<Vec<_>, _>>()?;
        let quantity = i32::try_from(items.len())
            .map_err(|_| CdnError::InvalidConfig("too many origins".into()))?;
        let origins = Origins::builder()
            .quantity(quantity)
            .set_items(Some(items))
            .build()
            .map_err(build_err)?;

        let behavior = &self.default_cache_behavior;
        let default_cache_behavior = DefaultCacheBehavior::builder()
            .target_origin_id(&behavior.target_origin_id)
            .viewer_protocol_policy(ViewerProtocolPolicy::from(
                behavior.viewer_protocol_policy.as_str(),
            ))
            .cache_policy_id(&behavior.cache_policy_id)
            .build()
            .map_err(build_err)?;

        let caller_reference = self
            .caller_reference
            .clone()
            .unwrap_or_else(|| format!("nctl-{}", uuid::Uuid::new_v4()));

        DistributionConfig::builder()
            .caller_reference(caller_reference)
            .comment(&self.comment)
            .enabled(self.enabled)
            .origins(origins)
            .default_cache_behavior(default_cache_behavior)
            .build()
            .map_err(build_err)
    }
}

impl OriginTemplate {
    fn to_sdk(&self) -> Result<Origin, CdnError> {
        let custom = CustomOriginConfig::builder()
            .http_port(self.http_port)
            .https_port(self.https_port)
            .origin_protocol_policy(OriginProtocolPolicy::from(self.protocol_policy.as_str()))
            .build()
            .map_err(build_err)?;
        Origin::builder()
            .id(&self.id)
            .domain_name(&self.domain_name)
            .set_origin_path(self.origin_path.clone())
            .custom_origin_config(custom)
            .build()
            .map_err(build_err)
    }
}

fn build_err(err: BuildError) -> CdnError {
    CdnError::InvalidConfig(err.to_string())
}
