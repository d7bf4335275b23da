use std::{collections::BTreeSet, path::Path};

use branchbuild_core::{BranchContext, BuildModel, Config, PublishRepository};
use tracing::{info, warn};

use crate::{CoordinateRewriter, snapshot_repository};

pub const RELEASE_REPOSITORY_NAME: &str = "MvgMaven";
pub const SNAPSHOT_REPOSITORY_NAME: &str = "MvgMavenSnapshots";
pub const LOCAL_REPOSITORY_NAME: &str = "mavenLocal";

/// Where publications of this build go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepositoryTarget {
    /// trunk under CI/testing
    Release,
    /// any other branch under CI/testing
    Snapshot,
    /// local builds
    Local,
}

/// Points publications at the repository matching the branch state, rewriting their
/// coordinates into the branch snapshot namespace unless this is a release build.
pub struct PublicationRetargeter<'a> {
    rewriter: &'a CoordinateRewriter,
    branch: &'a BranchContext,
    release_url: String,
    local_url: String,
}

impl<'a> PublicationRetargeter<'a> {
    pub fn new(
        rewriter: &'a CoordinateRewriter,
        branch: &'a BranchContext,
        config: &Config,
        home: &Path,
    ) -> Self {
        let local = home.join(".m2").join("repository");
        Self {
            rewriter,
            branch,
            release_url: config.release_repository_url.clone(),
            local_url: format!("file://{}", local.display()),
        }
    }

    pub fn target(&self) -> RepositoryTarget {
        match (self.branch.ci_or_testing(), self.branch.is_master) {
            (true, true) => RepositoryTarget::Release,
            (true, false) => RepositoryTarget::Snapshot,
            (false, _) => RepositoryTarget::Local,
        }
    }

    pub fn repository(&self) -> PublishRepository {
        let (name, url) = match self.target() {
            RepositoryTarget::Release => (RELEASE_REPOSITORY_NAME, self.release_url.clone()),
            RepositoryTarget::Snapshot => (
                SNAPSHOT_REPOSITORY_NAME,
                snapshot_repository(&self.release_url),
            ),
            RepositoryTarget::Local => (LOCAL_REPOSITORY_NAME, self.local_url.clone()),
        };
        PublishRepository {
            name: name.to_string(),
            url,
        }
    }

    /// Retarget every module's publications in place; returns the `group.artifact` packages
    /// published.
    pub fn retarget_model(&self, model: &mut BuildModel) -> BTreeSet<String> {
        let rewrite = self.target() != RepositoryTarget::Release;
        let repository = self.repository();
        let mut published = BTreeSet::new();

        for module in model.modules.iter_mut() {
            for publication in module.publications.iter_mut() {
                published.insert(publication.coordinate.package());
                if rewrite {
                    let rewritten = self
                        .rewriter
                        .rewrite(&publication.coordinate, &self.branch.branch_name);
                    if rewritten != publication.coordinate {
                        info!(
                            module = %module.name,
                            publication = %publication.name,
                            "changed publication: '{}' => '{rewritten}'",
                            publication.coordinate
                        );
                        publication.coordinate = rewritten;
                    }
                }
            }

            if module.publications.is_empty() {
                continue;
            }
            if module.repositories.is_empty() {
                info!(module = %module.name, repository = %repository.url, "adding {} publishing repository", repository.name);
                module.repositories.push(repository.clone());
            } else {
                warn!(
                    module = %module.name,
                    "the repository set is not empty; not setting the branch based publish repository. Make it empty to activate branch based publishing."
                );
            }
        }
        published
    }
}
