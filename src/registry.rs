//! Package-registry URL normalization.
//!
//! Some listings point at a nuget.org package page instead of the source
//! repository. The normalizer follows the package page and extracts the
//! maintainer-declared project link so the record can be linked to a repo.

use crate::error::HostError;
use async_trait::async_trait;
use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

#[async_trait]
pub trait UrlNormalizer: Send + Sync {
    /// Resolves a package-registry URL to the project's canonical URL.
    ///
    /// Falls back to the input URL when it is not a registry URL or the
    /// registry page does not declare a project link; some packages simply
    /// omit that information.
    async fn resolve_canonical_project_url(&self, url: &str) -> Result<String, HostError>;
}

/// Extracts the outbound project link from a nuget.org package page.
pub struct NugetNormalizer {
    client: reqwest::Client,
}

fn outbound_link_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"<a[^>]*data-track="outbound-project-url"[^>]*href="([^"]+)""#)
            .expect("outbound link pattern is valid")
    })
}

impl NugetNormalizer {
    pub fn new() -> Result<Self, HostError> {
        let client = reqwest::Client::builder()
            .user_agent(format!("cake-addin-audit/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(HostError::from)?;
        Ok(Self { client })
    }
}

#[async_trait]
impl UrlNormalizer for NugetNormalizer {
    async fn resolve_canonical_project_url(&self, url: &str) -> Result<String, HostError> {
        if !url.contains("nuget.org") {
            return Ok(url.to_string());
        }

        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(HostError::Api {
                status: response.status().as_u16(),
                message: format!("registry page fetch failed for {url}"),
            });
        }

        let page = response.text().await?;
        match outbound_link_pattern()
            .captures(&page)
            .and_then(|c| c.get(1))
        {
            Some(link) => Ok(link.as_str().to_string()),
            None => {
                debug!(url, "registry page declares no project link");
                Ok(url.to_string())
            }
        }
    }
}

/// Test normalizer resolving from a fixed table; unknown URLs pass through.
pub struct StaticNormalizer {
    mappings: Vec<(String, String)>,
}

impl StaticNormalizer {
    pub fn new(mappings: Vec<(String, String)>) -> Self {
        Self { mappings }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }
}

#[async_trait]
impl UrlNormalizer for StaticNormalizer {
    async fn resolve_canonical_project_url(&self, url: &str) -> Result<String, HostError> {
        Ok(self
            .mappings
            .iter()
            .find(|(from, _)| from == url)
            .map(|(_, to)| to.clone())
            .unwrap_or_else(|| url.to_string()))
    }
}
