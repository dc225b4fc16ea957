//! The create-or-update decision for the tunnel's distribution.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{info, warn};

use nctl_core::config::DistributionTarget;

use super::client::DistributionApi;
use super::error::CdnError;
use super::model::DistributionInfo;
use super::snapshot::store_snapshot;
use super::template::DistributionTemplate;
use crate::orchestrator::DistributionUpdater;
use crate::tunnel::PublicUrl;

/// How long to wait for a distribution to reach `Deployed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
            max_attempts: 35,
        }
    }
}

/// Points a distribution at the tunnel, creating it when no id is known.
#[derive(Debug)]
pub struct CloudFrontUpdater<C> {
    client: C,
    target: DistributionTarget,
    wait: Option<WaitPolicy>,
    snapshot_dir: Option<PathBuf>,
}

impl<C: DistributionApi> CloudFrontUpdater<C> {
    pub const fn new(client: C, target: DistributionTarget) -> Self {
        Self {
            client,
            target,
            wait: None,
            snapshot_dir: None,
        }
    }

    #[must_use]
    pub const fn wait_deployed(mut self, policy: Option<WaitPolicy>) -> Self {
        self.wait = policy;
        self
    }

    #[must_use]
    pub fn snapshot_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.snapshot_dir = dir;
        self
    }

    pub const fn client(&self) -> &C {
        &self.client
    }

    async fn update_existing(&self, id: &str, host: &str) -> Result<DistributionInfo, CdnError> {
        let current = self.client.get_distribution(id).await?;
        info!(
            id = %current.id,
            domain = %current.domain_name,
            status = %current.status,
            "Found distribution"
        );

        if let Some(dir) = &self.snapshot_dir {
            if let Err(e) = store_snapshot(dir, &current) {
                warn!(error = %e, "Failed to store distribution snapshot");
            }
        }

        if current.points_at(host) {
            info!(origin = %host, "Distribution already points at the tunnel");
            return Ok(current);
        }

        let updated = self.client.update_distribution(id, host).await?;
        info!(id = %updated.id, status = %updated.status, "Distribution updated");
        Ok(updated)
    }

    async fn create(&self, template_path: &Path, host: &str) -> Result<DistributionInfo, CdnError> {
        let template = DistributionTemplate::load(template_path)?;
        let created = self.client.create_distribution(&template, host).await?;
        info!(
            id = %created.id,
            domain = %created.domain_name,
            "Distribution created. Set DISTRIBUTION_ID={} to reuse it on the next run",
            created.id
        );
        Ok(created)
    }
}

impl<C: DistributionApi> DistributionUpdater for CloudFrontUpdater<C> {
    async fn update(&self, url: &PublicUrl) -> Result<DistributionInfo, CdnError> {
        let host = url.host();
        let info = match &self.target {
            DistributionTarget::Existing { id, ignored_config } => {
                if let Some(path) = ignored_config {
                    warn!(
                        config = %path.display(),
                        "DISTRIBUTION_ID is set, ignoring DISTRIBUTION_CONFIG"
                    );
                }
                self.update_existing(id, host).await?
            }
            DistributionTarget::Create { config } => self.create(config, host).await?,
        };

        match &self.wait {
            Some(policy) => wait_deployed(&self.client, &info.id, policy).await,
            None => Ok(info),
        }
    }
}

/// Poll until the distribution reports `Deployed`.
///
/// Running out of attempts is not an error: the change is still
/// propagating, so the latest state is returned with a warning.
pub async fn wait_deployed<C: DistributionApi>(
    client: &C,
    id: &str,
    policy: &WaitPolicy,
) -> Result<DistributionInfo, CdnError> {
    info!(id, "Waiting for the distribution to deploy");
    let mut latest = client.get_distribution(id).await?;
    let mut attempts = 0;
    while !latest.is_deployed() {
        if attempts >= policy.max_attempts {
            warn!(id, status = %latest.status, "Gave up waiting for the distribution to deploy");
            return Ok(latest);
        }
        attempts += 1;
        tokio::time::sleep(policy.interval).await;
        latest = client.get_distribution(id).await?;
    }
    info!(id, "Distribution deployed");
    Ok(latest)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::cloudfront::model::{DEPLOYED, OriginRecord};

    #[derive(Default)]
    struct Calls {
        get: usize,
        create: usize,
        update: Vec<String>,
    }

    struct FakeApi {
        info: Mutex<DistributionInfo>,
        calls: Mutex<Calls>,
        deployed_after: usize,
    }

    impl FakeApi {
        fn new(domain: &str) -> Self {
            Self {
                info: Mutex::new(DistributionInfo {
                    id: "E123".into(),
                    domain_name: "d111.cloudfront.net".into(),
                    status: DEPLOYED.into(),
                    e_tag: Some("ETAG1".into()),
                    origins: vec![OriginRecord {
                        id: "tunnel".into(),
                        domain_name: domain.into(),
                    }],
                    target_origin_id: Some("tunnel".into()),
                }),
                calls: Mutex::new(Calls::default()),
                deployed_after: 0,
            }
        }
    }

    impl DistributionApi for FakeApi {
        async fn get_distribution(&self, id: &str) -> Result<DistributionInfo, CdnError> {
            let mut calls = self.calls.lock().unwrap();
            calls.get += 1;
            if id != "E123" {
                return Err(CdnError::NotFound { id: id.into() });
            }
            let mut info = self.info.lock().unwrap();
            if calls.get > self.deployed_after {
                info.status = DEPLOYED.into();
            }
            Ok(info.clone())
        }

        async fn create_distribution(
            &self,
            template: &DistributionTemplate,
            origin: &str,
        ) -> Result<DistributionInfo, CdnError> {
            self.calls.lock().unwrap().create += 1;
            let template = template.clone().with_origin(origin)?;
            let mut info = self.info.lock().unwrap().clone();
            info.id = "ENEW".into();
            info.origins = template
                .origins
                .iter()
                .map(|o| OriginRecord {
                    id: o.id.clone(),
                    domain_name: o.domain_name.clone(),
                })
                .collect();
            Ok(info)
        }

        async fn update_distribution(
            &self,
            id: &str,
            origin: &str,
        ) -> Result<DistributionInfo, CdnError> {
            self.calls.lock().unwrap().update.push(origin.to_string());
            if id != "E123" {
                return Err(CdnError::NotFound { id: id.into() });
            }
            let mut info = self.info.lock().unwrap();
            info.origins[0].domain_name = origin.to_string();
            info.status = "InProgress".into();
            Ok(info.clone())
        }
    }

    fn existing(id: &str) -> DistributionTarget {
        DistributionTarget::Existing {
            id: id.into(),
            ignored_config: None,
        }
    }

    fn url(raw: &str) -> PublicUrl {
        PublicUrl::parse(raw).unwrap()
    }

    #[tokio::test]
    async fn existing_distribution_is_updated_with_the_host() {
        let updater = CloudFrontUpdater::new(FakeApi::new("old.ngrok.app"), existing("E123"));
        let info = updater
            .update(&url("https://abc123.tunnel.example"))
            .await
            .unwrap();

        assert!(info.points_at("abc123.tunnel.example"));
        let calls = updater.client().calls.lock().unwrap();
        assert_eq!(calls.update, vec!["abc123.tunnel.example"]);
        assert_eq!(calls.create, 0);
    }

    #[tokio::test]
    async fn rerun_with_same_host_skips_the_update() {
        let updater = CloudFrontUpdater::new(FakeApi::new("old.ngrok.app"), existing("E123"));
        let public = url("https://abc123.tunnel.example");
        updater.update(&public).await.unwrap();
        updater.update(&public).await.unwrap();

        let calls = updater.client().calls.lock().unwrap();
        assert_eq!(calls.update.len(), 1);
        assert_eq!(calls.create, 0);
    }

    #[tokio::test]
    async fn unknown_distribution_is_not_found() {
        let updater = CloudFrontUpdater::new(FakeApi::new("old.ngrok.app"), existing("E404"));
        let err = updater
            .update(&url("https://abc123.tunnel.example"))
            .await
            .unwrap_err();
        assert!(matches!(err, CdnError::NotFound { id } if id == "E404"));
        assert!(updater.client().calls.lock().unwrap().update.is_empty());
    }

    #[tokio::test]
    async fn missing_id_creates_from_template() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = dir.path().join("dist.json");
        std::fs::write(
            &config,
            r#"{"origins":[{"id":"tunnel"}],"default_cache_behavior":{"target_origin_id":"tunnel"}}"#,
        )
        .unwrap();

        let updater = CloudFrontUpdater::new(
            FakeApi::new("unused"),
            DistributionTarget::Create { config },
        );
        let info = updater
            .update(&url("https://abc123.tunnel.example"))
            .await
            .unwrap();

        assert_eq!(info.id, "ENEW");
        assert!(info.points_at("abc123.tunnel.example"));
        assert_eq!(updater.client().calls.lock().unwrap().create, 1);
    }

    #[tokio::test]
    async fn snapshot_is_taken_before_updating() {
        let dir = tempfile::TempDir::new().unwrap();
        let updater = CloudFrontUpdater::new(FakeApi::new("old.ngrok.app"), existing("E123"))
            .snapshot_dir(Some(dir.path().to_path_buf()));
        updater
            .update(&url("https://abc123.tunnel.example"))
            .await
            .unwrap();

        let entry = std::fs::read_dir(dir.path()).unwrap().next().unwrap().unwrap();
        let stored: DistributionInfo =
            serde_json::from_str(&std::fs::read_to_string(entry.path()).unwrap()).unwrap();
        assert!(stored.points_at("old.ngrok.app"));
    }

    #[tokio::test(start_paused = true)]
    async fn waits_until_deployed() {
        let mut api = FakeApi::new("old.ngrok.app");
        api.deployed_after = 3;
        let updater = CloudFrontUpdater::new(api, existing("E123")).wait_deployed(Some(WaitPolicy {
            interval: Duration::from_secs(5),
            max_attempts: 10,
        }));

        let info = updater
            .update(&url("https://abc123.tunnel.example"))
            .await
            .unwrap();
        assert!(info.is_deployed());
        // One lookup before the update, then polls until the fourth get.
        assert_eq!(updater.client().calls.lock().unwrap().get, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn wait_gives_up_without_failing() {
        let mut api = FakeApi::new("old.ngrok.app");
        api.deployed_after = usize::MAX;
        let updater = CloudFrontUpdater::new(api, existing("E123")).wait_deployed(Some(WaitPolicy {
            interval: Duration::from_secs(5),
            max_attempts: 2,
        }));

        let info = updater
            .update(&url("https://abc123.tunnel.example"))
            .await
            .unwrap();
        assert_eq!(info.status, "InProgress");
    }
}
