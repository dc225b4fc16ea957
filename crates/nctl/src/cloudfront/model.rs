use serde::{Deserialize, Serialize};

/// Status CloudFront reports once a change has propagated.
pub const DEPLOYED: &str = "Deployed";

/// One origin of a distribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OriginRecord {
    pub id: String,
    pub domain_name: String,
}

/// Distribution handle: id, ETag and the origin record the tunnel replaces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionInfo {
    pub id: String,
    /// CloudFront domain, e.g. `d111111abcdef8.cloudfront.net`.
    pub domain_name: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub e_tag: Option<String>,
    pub origins: Vec<OriginRecord>,
    /// Origin the default cache behavior routes to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_origin_id: Option<String>,
}

impl DistributionInfo {
    pub fn is_deployed(&self) -> bool {
        self.status == DEPLOYED
    }

    /// The origin traffic is routed to by default.
    pub fn target_origin(&self) -> Option<&OriginRecord> {
        let index = target_index(
            self.origins.iter().map(|o| o.id.as_str()),
            self.target_origin_id.as_deref(),
        )?;
        self.origins.get(index)
    }

    /// Whether the default origin already points at `host`.
    pub fn points_at(&self, host: &str) -> bool {
        self.target_origin()
            .is_some_and(|o| o.domain_name.eq_ignore_ascii_case(host))
    }
}

/// Pick the origin the tunnel replaces: the one the default cache behavior
/// targets, or the only origin when there is exactly one.
pub fn target_index<'a>(
    mut ids: impl ExactSizeIterator<Item = &'a str>,
    target_origin_id: Option<&str>,
) -> Option<usize> {
    let count = ids.len();
    if let Some(target) = target_origin_id {
        if let Some(index) = ids.position(|id| id == target) {
            return Some(index);
        }
    }
    (count == 1).then_some(0)
}
