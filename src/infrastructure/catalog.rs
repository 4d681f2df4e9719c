//! Remote release catalog client.
//!
//! Fetches the release list from the GitHub API. The catalog is a pure
//! read: nothing is cached locally and an unreachable catalog degrades to
//! an empty list rather than an error.

use crate::domain::{AppError, CatalogConfig, ReleaseEntry, Result};

const GITHUB_API_BASE: &str = "https://api.github.com";

/// GitHub releases catalog client.
pub struct GithubCatalog {
    client: reqwest::Client,
    owner: String,
    repo: String,
    limit: u32,
}

impl GithubCatalog {
    /// Create a client for the configured repository.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built.
    pub fn new(config: &CatalogConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("rcm-manager/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::Config {
                message: format!("Failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            owner: config.owner.clone(),
            repo: config.repo.clone(),
            limit: config.limit,
        })
    }

    /// Fetch the most recent releases, newest first.
    ///
    /// A failed fetch is logged and yields an empty list; callers degrade
    /// to "no releases found".
    pub async fn fetch_releases(&self) -> Vec<ReleaseEntry> {
        match self.try_fetch().await {
            Ok(releases) => {
                tracing::debug!(
                    count = releases.len(),
                    repo = format!("{}/{}", self.owner, self.repo),
                    "fetched release catalog"
                );
                releases
            }
            Err(e) => {
                tracing::warn!(error = %e, "release catalog unavailable");
                Vec::new()
            }
        }
    }

    async fn try_fetch(&self) -> Result<Vec<ReleaseEntry>> {
        let url = format!(
            "{GITHUB_API_BASE}/repos/{}/{}/releases",
            self.owner, self.repo
        );

        let response = self
            .client
            .get(&url)
            .query(&[("per_page", self.limit)])
            .send()
            .await
            .map_err(|e| AppError::CatalogUnavailable {
                message: e.to_string(),
            })?
            .error_for_status()
            .map_err(|e| AppError::CatalogUnavailable {
                message: e.to_string(),
            })?;

        response
            .json::<Vec<ReleaseEntry>>()
            .await
            .map_err(|e| AppError::CatalogUnavailable {
                message: format!("malformed release list: {e}"),
            })
    }
}
