//! CloudFront API access.

use std::future::Future;

use aws_config::BehaviorVersion;
use aws_config::meta::region::RegionProviderChain;
use aws_sdk_cloudfront::Client;
use aws_sdk_cloudfront::config::{Credentials, Region};
use tracing::{debug, info};

use nctl_core::config::{AwsAuth, AwsSettings};

use super::error::CdnError;
use super::model::DistributionInfo;
use super::origin::{distribution_info, rewrite_origin};
use super::template::DistributionTemplate;

/// CloudFront is a global service; its API lives in us-east-1.
const FALLBACK_REGION: &str = "us-east-1";

/// Distribution operations nctl needs.
pub trait DistributionApi {
    fn get_distribution(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<DistributionInfo, CdnError>>;

    /// Create a distribution from `template` with its default origin set to
    /// `origin`.
    fn create_distribution(
        &self,
        template: &DistributionTemplate,
        origin: &str,
    ) -> impl Future<Output = Result<DistributionInfo, CdnError>>;

    /// Point the default origin of distribution `id` at `origin`.
    fn update_distribution(
        &self,
        id: &str,
        origin: &str,
    ) -> impl Future<Output = Result<DistributionInfo, CdnError>>;
}

/// [`DistributionApi`] backed by `aws-sdk-cloudfront`.
#[derive(Debug, Clone)]
pub struct CloudFrontClient {
    client: Client,
}

impl CloudFrontClient {
    pub const fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build a client from the AWS settings in the environment config.
    ///
    /// Explicit keys win over a named profile; with neither, the default
    /// credential chain is used.
    pub async fn from_env(settings: &AwsSettings) -> Self {
        let region = RegionProviderChain::first_try(settings.region.clone().map(Region::new))
            .or_default_provider()
            .or_else(Region::new(FALLBACK_REGION));
        let mut loader = aws_config::defaults(BehaviorVersion::latest()).region(region);

        match &settings.auth {
            AwsAuth::Keys {
                access_key_id,
                secret_access_key,
            } => {
                debug!("Using AWS credentials from the environment file");
                let credentials = Credentials::new(
                    access_key_id,
                    secret_access_key.expose(),
                    None,
                    None,
                    "nctl-env",
                );
                loader = loader.credentials_provider(credentials);
            }
            AwsAuth::Profile(profile) => {
                debug!(profile = %profile, "Using AWS profile");
                loader = loader.profile_name(profile);
            }
            AwsAuth::DefaultChain => debug!("Using the default AWS credential chain"),
        }

        let config = loader.load().await;
        Self::new(Client::new(&config))
    }
}

impl DistributionApi for CloudFrontClient {
    async fn get_distribution(&self, id: &str) -> Result<DistributionInfo, CdnError> {
        let output = self
            .client
            .get_distribution()
            .id(id)
            .send()
            .await
            .map_err(|err| {
                if err
                    .as_service_error()
                    .is_some_and(|e| e.is_no_such_distribution())
                {
                    CdnError::NotFound { id: id.to_string() }
                } else {
                    CdnError::provider("GetDistribution", err)
                }
            })?;
        let distribution = output.distribution().ok_or(CdnError::EmptyResponse {
            operation: "GetDistribution",
        })?;
        Ok(distribution_info(distribution, output.e_tag()))
    }

    async fn create_distribution(
        &self,
        template: &DistributionTemplate,
        origin: &str,
    ) -> Result<DistributionInfo, CdnError> {
        let config = template.clone().with_origin(origin)?.to_sdk()?;
        info!(caller_reference = %config.caller_reference(), "Creating distribution");

        let output = self
            .client
            .create_distribution()
            .distribution_config(config)
            .send()
            .await
            .map_err(|err| CdnError::provider("CreateDistribution", err))?;
        let distribution = output.distribution().ok_or(CdnError::EmptyResponse {
            operation: "CreateDistribution",
        })?;
        Ok(distribution_info(distribution, output.e_tag()))
    }

    async fn update_distribution(
        &self,
        id: &str,
        origin: &str,
    ) -> Result<DistributionInfo, CdnError> {
        let current = self
            .client
            .get_distribution_config()
            .id(id)
            .send()
            .await
            .map_err(|err| {
                if err
                    .as_service_error()
                    .is_some_and(|e| e.is_no_such_distribution())
                {
                    CdnError::NotFound { id: id.to_string() }
                } else {
                    CdnError::provider("GetDistributionConfig", err)
                }
            })?;
        let e_tag = current.e_tag().map(str::to_string);
        let mut config = current
            .distribution_config()
            .cloned()
            .ok_or(CdnError::EmptyResponse {
                operation: "GetDistributionConfig",
            })?;

        rewrite_origin(id, &mut config, origin)?;
        if let Some(behavior) = config.default_cache_behavior() {
            info!("TargetOriginId::{}", behavior.target_origin_id());
        }

        let output = self
            .client
            .update_distribution()
            .id(id)
            .set_if_match(e_tag)
            .distribution_config(config)
            .send()
            .await
            .map_err(|err| match err.as_service_error() {
                Some(e) if e.is_no_such_distribution() => CdnError::NotFound { id: id.to_string() },
                Some(e) if e.is_precondition_failed() || e.is_invalid_if_match_version() => {
                    CdnError::PreconditionFailed { id: id.to_string() }
                }
                _ => CdnError::provider("UpdateDistribution", err),
            })?;
        let distribution = output.distribution().ok_or(CdnError::EmptyResponse {
            operation: "UpdateDistribution",
        })?;
        Ok(distribution_info(distribution, output.e_tag()))
    }
}
