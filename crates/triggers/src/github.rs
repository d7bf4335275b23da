use std::time::Duration;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use branchbuild_core::WorkflowDispatcher;
use tracing::debug;

pub const GITHUB_API_URL: &str = "https://api.github.com";
const ACCEPT: &str = "application/vnd.github.v3+json";
const DISPATCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Dispatches workflows of the repositories of one GitHub owner through the REST API.
pub struct GithubDispatcher {
    api_url: String,
    owner: String,
    token: String,
    http_client: reqwest::Client,
}

impl GithubDispatcher {
    /// # Errors
    /// Returns error if the HTTP client cannot be created.
    pub fn new(owner: &str, token: &str) -> Result<Self> {
        Self::with_api_url(GITHUB_API_URL, owner, token)
    }

    pub fn with_api_url(api_url: &str, owner: &str, token: &str) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("branchbuild/", env!("CARGO_PKG_VERSION")))
            .timeout(DISPATCH_TIMEOUT)
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            owner: owner.to_string(),
            token: token.to_string(),
            http_client,
        })
    }

    pub fn dispatch_url(&self, repo: &str, workflow: &str) -> String {
        format!(
            "{}/repos/{}/{repo}/actions/workflows/{workflow}/dispatches",
            self.api_url, self.owner
        )
    }
}

#[async_trait]
impl WorkflowDispatcher for GithubDispatcher {
    async fn dispatch(&self, repo: &str, workflow: &str, branch: &str) -> Result<()> {
        let url = self.dispatch_url(repo, workflow);
        let response = self
            .http_client
            .post(&url)
            .header("Authorization", format!("token {}", self.token))
            .header("Accept", ACCEPT)
            .json(&serde_json::json!({ "ref": branch }))
            .send()
            .await
            .context(format!("POST {url}"))?;
        let status = response.status();
        debug!(url = %url, status = %status, "dispatched");
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("workflow dispatch {repo}/{workflow} on {branch} failed ({status}): {body}");
        }
        Ok(())
    }
}
