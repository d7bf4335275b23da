use anyhow::Result;
use async_trait::async_trait;

/// Requests a CI workflow run of another repository.
#[async_trait]
pub trait WorkflowDispatcher: Send + Sync {
    async fn dispatch(&self, repo: &str, workflow: &str, branch: &str) -> Result<()>;
}
