use std::{
    collections::BTreeSet,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use branchbuild_core::TriggerRecord;
use branchbuild_utils::{DotProperties, ExclusionSet, walk_files};
use tracing::{debug, info};

pub const TRIGGER_EXT: &str = ".trigger";
pub const WORKFLOWS_KEY: &str = "WORKFLOWS";

/// Trigger records laid out in a directory: `<package as dirs>/<repo>.trigger`, each holding
/// the `/` separated workflow file names of the consuming repository.
pub struct TriggerStore {
    root: PathBuf,
}

impl TriggerStore {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn package_dir(&self, package: &str) -> PathBuf {
        package
            .split('.')
            .fold(self.root.clone(), |dir, part| dir.join(part))
    }

    /// Replace every record of `producing_repo` with one record per consumed package.
    ///
    /// # Errors
    /// Returns error if an old record cannot be removed or a new one cannot be written.
    pub async fn save(
        &self,
        producing_repo: &str,
        packages: &BTreeSet<String>,
        workflows: &BTreeSet<String>,
    ) -> Result<()> {
        let file_name = format!("{producing_repo}{TRIGGER_EXT}");
        let stale = walk_files(&self.root, &ExclusionSet::default())
            .into_iter()
            .filter(|path| path.file_name().is_some_and(|name| name == file_name.as_str()));
        for path in stale {
            debug!(path = %path.display(), "removing trigger");
            tokio::fs::remove_file(&path)
                .await
                .context(format!("Failed to remove trigger {}", path.display()))?;
        }

        let content = format!(
            "{WORKFLOWS_KEY}={}\n",
            workflows.iter().cloned().collect::<Vec<_>>().join("/")
        );
        for package in packages {
            let dir = self.package_dir(package);
            tokio::fs::create_dir_all(&dir).await?;
            let path = dir.join(&file_name);
            tokio::fs::write(&path, &content)
                .await
                .context(format!("Failed to write trigger {}", path.display()))?;
        }
        info!(
            repo = producing_repo,
            packages = packages.len(),
            workflows = workflows.len(),
            "saved triggers"
        );
        Ok(())
    }

    /// All records that name one of `packages`, without duplicates.
    ///
    /// # Errors
    /// Returns error if a package directory exists but cannot be listed or a record is unreadable.
    pub fn records_for(&self, packages: &BTreeSet<String>) -> Result<BTreeSet<TriggerRecord>> {
        let mut records = BTreeSet::new();
        for package in packages {
            let dir = self.package_dir(package);
            if !dir.is_dir() {
                continue;
            }
            let entries = std::fs::read_dir(&dir)
                .context(format!("Failed to list {}", dir.display()))?;
            for entry in entries {
                let path = entry?.path();
                let Some(repo) = path
                    .file_name()
                    .and_then(|name| name.to_str())
                    .and_then(|name| name.strip_suffix(TRIGGER_EXT))
                else {
                    continue;
                };
                if !path.is_file() {
                    continue;
                }
                let properties = DotProperties::load(&path)?;
                let workflow_file_names = properties
                    .get(WORKFLOWS_KEY)
                    .unwrap_or_default()
                    .split('/')
                    .filter(|w| !w.is_empty())
                    .map(String::from)
                    .collect();
                records.insert(TriggerRecord {
                    producing_repo: repo.to_string(),
                    consuming_package: package.clone(),
                    workflow_file_names,
                });
            }
        }
        Ok(records)
    }
}
