use std::{
    path::{Path, PathBuf},
    sync::Mutex,
};

use anyhow::Result;
use async_trait::async_trait;
use branchbuild_core::{VcsGateway, VcsStatus};

/// In-memory version control: fixed tags, a settable status, recorded commits and tags
pub struct FakeVcs {
    pub root: PathBuf,
    pub tags: Vec<String>,
    pub status: Mutex<VcsStatus>,
    pub commits: Mutex<Vec<String>>,
    pub tagged: Mutex<Vec<String>>,
}

impl FakeVcs {
    pub fn with_tags(root: &Path, tags: &[&str]) -> Self {
        Self {
            root: root.to_path_buf(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            status: Mutex::new(VcsStatus::default()),
            commits: Mutex::new(Vec::new()),
            tagged: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl VcsGateway for FakeVcs {
    fn root(&self) -> &Path {
        &self.root
    }

    fn branch(&self) -> Result<Option<String>> {
        Ok(Some("feature/x".to_string()))
    }

    fn tags(&self) -> Result<Vec<String>> {
        Ok(self.tags.clone())
    }

    async fn status(&self) -> Result<VcsStatus> {
        Ok(self.status.lock().unwrap().clone())
    }

    async fn stage_commit_push(&self, message: &str) -> Result<bool> {
        let mut status = self.status.lock().unwrap();
        if status.is_clean() {
            return Ok(false);
        }
        *status = VcsStatus::default();
        self.commits.lock().unwrap().push(message.to_string());
        Ok(true)
    }

    async fn tag(&self, tag: &str) -> Result<()> {
        self.tagged.lock().unwrap().push(tag.to_string());
        Ok(())
    }

    async fn diff(&self, path: &Path) -> Result<String> {
        Ok(format!("--- a/{0}\n+++ b/{0}\n", path.display()))
    }
}
