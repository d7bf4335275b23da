use std::{
    collections::BTreeSet,
    path::{Path, PathBuf},
};

use anyhow::Result;
use async_trait::async_trait;

/// Working tree status as seen by version control, repository relative.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VcsStatus {
    pub modified: BTreeSet<PathBuf>,
    pub untracked: BTreeSet<PathBuf>,
    pub missing: BTreeSet<PathBuf>,
}

impl VcsStatus {
    pub fn is_clean(&self) -> bool {
        self.modified.is_empty() && self.untracked.is_empty() && self.missing.is_empty()
    }

    /// Every path that differs from the committed state
    pub fn all_changed(&self) -> BTreeSet<PathBuf> {
        self.modified
            .iter()
            .chain(self.untracked.iter())
            .chain(self.missing.iter())
            .cloned()
            .collect()
    }
}

/// The narrow version-control surface the build needs.
#[async_trait]
pub trait VcsGateway: Send + Sync {
    fn root(&self) -> &Path;

    /// The checked out branch, `None` when detached
    fn branch(&self) -> Result<Option<String>>;

    fn tags(&self) -> Result<Vec<String>>;

    async fn status(&self) -> Result<VcsStatus>;

    /// Stage every modification, creation and deletion, commit and push.
    /// The whole working tree is staged, not only the files a correction run verified.
    /// Returns `false` when there was nothing to commit.
    async fn stage_commit_push(&self, message: &str) -> Result<bool>;

    /// Tag the current commit (replacing an existing tag) and push tags
    async fn tag(&self, tag: &str) -> Result<()>;

    async fn diff(&self, path: &Path) -> Result<String>;
}
