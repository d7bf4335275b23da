use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use branchbuild_core::{ArtifactProbe, Coordinate};
use tracing::debug;

const PROBE_TIMEOUT: Duration = Duration::from_secs(20);

/// `<group as path>/<artifact>/<version>/<artifact>-<version>.pom`
pub fn pom_path(coordinate: &Coordinate) -> String {
    format!(
        "{}/{artifact}/{version}/{artifact}-{version}.pom",
        coordinate.group.replace('.', "/"),
        artifact = coordinate.artifact,
        version = coordinate.version,
    )
}

/// Looks for the pom of a coordinate in Maven layout repositories, over HTTP(S) with a HEAD
/// request or directly on disk for `file://` repositories.
pub struct MavenRepositoryProbe {
    repositories: Vec<String>,
    token: Option<String>,
    http_client: reqwest::Client,
}

impl MavenRepositoryProbe {
    /// # Errors
    /// Returns error if the HTTP client cannot be created.
    pub fn new(repositories: &[String], token: Option<String>) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("branchbuild/", env!("CARGO_PKG_VERSION")))
            .timeout(PROBE_TIMEOUT)
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            repositories: repositories.to_vec(),
            token,
            http_client,
        })
    }

    async fn exists_in(&self, repository: &str, coordinate: &Coordinate) -> Result<bool> {
        let url = format!(
            "{}/{}",
            repository.trim_end_matches('/'),
            pom_path(coordinate)
        );
        if let Some(path) = url.strip_prefix("file://") {
            return Ok(tokio::fs::try_exists(path).await?);
        }
        let mut request = self.http_client.head(&url);
        if let Some(token) = &self.token {
            request = request.basic_auth("", Some(token));
        }
        let response = request.send().await.context(format!("HEAD {url}"))?;
        debug!(url = %url, status = %response.status(), "probed");
        Ok(response.status().is_success())
    }
}

#[async_trait]
impl ArtifactProbe for MavenRepositoryProbe {
    /// Present in any repository. Fails only when no repository could be asked at all.
    async fn exists(&self, coordinate: &Coordinate) -> Result<bool> {
        let mut last_error = None;
        for repository in &self.repositories {
            match self.exists_in(repository, coordinate).await {
                Ok(true) => return Ok(true),
                Ok(false) => {}
                Err(e) => {
                    debug!(repository = %repository, "probe failed: {e:#}");
                    last_error = Some(e);
                }
            }
        }
        match last_error {
            Some(e) if self.repositories.len() == 1 => Err(e),
            _ => Ok(false),
        }
    }
}
