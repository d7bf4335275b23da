use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use branchbuild_core::{
    BuildContext, Environment, VcsGateway, branch_context::DEFAULT_BRANCH,
};
use branchbuild_utils::{
    DotProperties, GitGateway, env_or_prop, find_current_git_repo, get_branchbuild_config,
    user_home_properties_path,
};
use tracing::{info, warn};

/// What every command needs: the build context derived once from the repository, its
/// configuration and environment, plus version control of the repository.
pub struct CommandContext {
    pub build: Arc<BuildContext>,
    pub vcs: Arc<GitGateway>,
}

impl CommandContext {
    /// # Errors
    /// Returns error if the current directory is not inside a git repository or the
    /// configuration or properties file cannot be read.
    pub async fn new() -> Result<Self> {
        let current_dir = Self::current_dir()?;
        let repo = find_current_git_repo(&current_dir)?;
        let root = repo
            .work_dir()
            .context("Not a git working directory. Ensure you are inside a git repository.")?
            .to_path_buf();
        let config = get_branchbuild_config(&root).await?;

        let mut properties = DotProperties::load(&root.join(&config.properties_file))?;
        if let Some(home_properties) = user_home_properties_path() {
            properties = properties.with_parent(DotProperties::load(&home_properties)?);
        }
        let environment = Environment::from_lookup(|name| env_or_prop(&properties, name));

        let vcs = GitGateway::open(&root, environment.is_dry_run())?;
        let branch = vcs.branch()?.unwrap_or_else(|| {
            warn!("could not determine git branch, assuming branch '{DEFAULT_BRANCH}'");
            DEFAULT_BRANCH.to_string()
        });
        info!(
            root = %root.display(),
            branch = %branch,
            ci = environment.ci,
            testing = environment.testing,
            "build context"
        );
        Ok(Self {
            build: Arc::new(BuildContext::new(&root, &branch, environment, config)),
            vcs: Arc::new(vcs),
        })
    }

    /// # Errors
    /// Returns error if retrieving the current directory fails.
    pub fn current_dir() -> Result<PathBuf> {
        Ok(std::env::current_dir()?)
    }

    pub fn vcs(&self) -> Arc<dyn VcsGateway> {
        self.vcs.clone()
    }
}
