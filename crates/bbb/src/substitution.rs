use std::collections::BTreeSet;

use branchbuild_core::{ArtifactProbe, BranchContext, BuildModel, Config, Coordinate};
use tracing::{debug, info, warn};

use crate::{BRANCH_INDICATOR, CoordinateRewriter};

/// What became of one declared dependency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubstitutionOutcome {
    /// The version does not carry the branch indicator; nothing to do
    NotBranched,
    /// Replaced by `coordinate`, published from `branch`
    Substituted { coordinate: Coordinate, branch: String },
    /// No candidate branch has the artifact; the dependency stays as declared
    Unresolved,
}

/// Replaces `-BRANCHED` dependencies by the artifact of the closest branch that has one:
/// the current branch, then the integration branch, then trunk.
pub struct BranchSubstitutionEngine<'a> {
    rewriter: &'a CoordinateRewriter,
    probe: &'a dyn ArtifactProbe,
    candidates: Vec<String>,
    trunk_branch: String,
}

impl<'a> BranchSubstitutionEngine<'a> {
    pub fn new(
        rewriter: &'a CoordinateRewriter,
        probe: &'a dyn ArtifactProbe,
        branch: &BranchContext,
        config: &Config,
    ) -> Self {
        let candidates = if branch.is_master {
            vec![config.trunk_branch.clone()]
        } else if branch.is_develop {
            vec![
                config.integration_branch.clone(),
                config.trunk_branch.clone(),
            ]
        } else {
            vec![
                branch.branch_name.clone(),
                config.integration_branch.clone(),
                config.trunk_branch.clone(),
            ]
        };
        Self {
            rewriter,
            probe,
            candidates,
            trunk_branch: config.trunk_branch.clone(),
        }
    }

    /// Candidate branches in priority order
    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    pub async fn substitute(&self, coordinate: &Coordinate) -> SubstitutionOutcome {
        let Some(version) = coordinate.version.strip_suffix(BRANCH_INDICATOR) else {
            debug!(dependency = %coordinate, "dependency NOT replaced");
            return SubstitutionOutcome::NotBranched;
        };
        let released = coordinate.with_version(version);

        for candidate in &self.candidates {
            if *candidate == self.trunk_branch {
                return SubstitutionOutcome::Substituted {
                    coordinate: released,
                    branch: candidate.clone(),
                };
            }
            let rewritten = self.rewriter.rewrite(&released, candidate);
            match self.probe.exists(&rewritten).await {
                Ok(true) => {
                    return SubstitutionOutcome::Substituted {
                        coordinate: rewritten,
                        branch: candidate.clone(),
                    };
                }
                Ok(false) => debug!(candidate = %rewritten, "not available"),
                Err(e) => warn!(candidate = %rewritten, "probe failed, treated as not available: {e:#}"),
            }
        }
        warn!(dependency = %coordinate, candidates = ?self.candidates, "dependency not found in any branch");
        SubstitutionOutcome::Unresolved
    }

    /// Substitute the dependencies of every module in place; returns the `group.artifact`
    /// packages that were substituted.
    pub async fn substitute_model(&self, model: &mut BuildModel) -> BTreeSet<String> {
        let mut used = BTreeSet::new();
        for module in model.modules.iter_mut() {
            for dependency in module.dependencies.iter_mut() {
                if let SubstitutionOutcome::Substituted { coordinate, branch } =
                    self.substitute(dependency).await
                {
                    info!(
                        module = %module.name,
                        branch = %branch,
                        "dependency replaced: {dependency} => {coordinate}"
                    );
                    used.insert(dependency.package());
                    *dependency = coordinate;
                }
            }
        }
        used
    }
}
