use std::{collections::BTreeSet, path::PathBuf};

use anyhow::Result;
use branchbuild_core::{BuildContext, BuildError, VcsGateway};
use branchbuild_corrector::{CorrectionPipeline, verify};
use branchbuild_triggers::check_workflow_guards;
use clap::Args;
use colored::Colorize;
use tracing::{info, warn};

use crate::{CommandContext, options::FormatOptions};

pub const CORRECTION_COMMIT_MESSAGE: &str = "[no-ci] updated by branchbuild";

#[derive(Args, Debug)]
#[command(about = "Correct headers, line endings and generated files, then commit the corrections")]
pub struct CorrectArgs {
    #[arg(long, default_value = "stdout")]
    format: FormatOptions,
}

/// What happened to the verified corrections
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    /// Nothing was really changed
    Clean,
    Pushed,
    /// Not allowed to push; the corrections stay in the working tree
    Left,
}

impl Settlement {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Clean => "clean",
            Self::Pushed => "pushed",
            Self::Left => "left",
        }
    }
}

/// Decide what to do with the verified corrections.
///
/// # Errors
/// Returns [`BuildError::TrunkDirty`] for corrections on trunk under CI, or an error when pushing
/// fails.
pub async fn settle(
    ctx: &BuildContext,
    vcs: &dyn VcsGateway,
    changed: &BTreeSet<PathBuf>,
) -> Result<Settlement> {
    let Some(first) = changed.iter().next() else {
        info!("no corrections needed");
        return Ok(Settlement::Clean);
    };
    let branch = &ctx.branch;
    if branch.is_master && branch.is_ci && !branch.is_testing {
        let diff = vcs
            .diff(first)
            .await
            .unwrap_or_else(|e| format!("<no diff available: {e:#}>"));
        return Err(BuildError::TrunkDirty {
            branch: branch.branch_name.clone(),
            file: first.clone(),
            diff,
        }
        .into());
    }
    if ctx.may_push() {
        info!(files = changed.len(), "pushing corrections");
        vcs.stage_commit_push(CORRECTION_COMMIT_MESSAGE).await?;
        return Ok(Settlement::Pushed);
    }
    warn!(
        files = changed.len(),
        "corrections not pushed (only under CI or testing with a token); they are left in the working tree"
    );
    Ok(Settlement::Left)
}

/// Run the corrections and settle them
pub async fn handle_correct(args: &CorrectArgs) -> Result<()> {
    let ctx = CommandContext::new().await?;
    check_workflow_guards(&ctx.build.workflows_dir())?;

    let pipeline = CorrectionPipeline::standard(ctx.build.clone(), ctx.vcs())?;
    let results = pipeline.run().await?;
    let verified = verify(&CorrectionPipeline::reported(&results), ctx.vcs.as_ref()).await?;
    let settlement = settle(&ctx.build, ctx.vcs.as_ref(), &verified).await?;

    let mut summary = vec![];
    for result in &results {
        let name = format!("{:>10}", result.corrector_name).bright_blue().bold();
        if result.is_empty() {
            summary.push(format!("{name}: {}", "nothing to correct".dimmed()));
        }
        for file in &result.changed_files {
            let marker = if verified.contains(file) {
                "corrected".green()
            } else {
                "unchanged".yellow()
            };
            summary.push(format!("{name}: {marker} {}", file.display()));
        }
    }
    summary.push(format!(
        "{} file(s) corrected, {}",
        verified.len(),
        settlement.as_str().bright_white().bold()
    ));

    let passes = results
        .iter()
        .map(|r| (r.corrector_name.clone(), serde_json::json!(r.changed_files)))
        .collect::<serde_json::Map<_, _>>();
    let json = serde_json::json!({
        "passes": passes,
        "verified": verified,
        "settlement": settlement.as_str(),
    });
    args.format.print(&summary.join("\n"), &json);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use branchbuild_core::{Config, Environment, VcsStatus};
    use std::{path::Path, sync::Mutex};

    struct FakeVcs {
        root: PathBuf,
        commits: Mutex<Vec<String>>,
    }

    #[async_trait::async_trait]
    impl VcsGateway for FakeVcs {
        fn root(&self) -> &Path {
            &self.root
        }
        fn branch(&self) -> Result<Option<String>> {
            Ok(Some("master".to_string()))
        }
        fn tags(&self) -> Result<Vec<String>> {
            Ok(vec![])
        }
        async fn status(&self) -> Result<VcsStatus> {
            Ok(VcsStatus::default())
        }
        async fn stage_commit_push(&self, message: &str) -> Result<bool> {
            self.commits.lock().unwrap().push(message.to_string());
            Ok(true)
        }
        async fn tag(&self, _tag: &str) -> Result<()> {
            Ok(())
        }
        async fn diff(&self, path: &Path) -> Result<String> {
            Ok(format!("--- a/{0}\n+++ b/{0}\n+corrected", path.display()))
        }
    }

    fn context(branch: &str, ci: bool, testing: bool, token: Option<&str>) -> BuildContext {
        let environment = Environment {
            ci,
            testing,
            token: token.map(String::from),
            workflow: None,
        };
        BuildContext::new(Path::new("/repo"), branch, environment, Config::default())
    }

    fn fake() -> FakeVcs {
        FakeVcs {
            root: PathBuf::from("/repo"),
            commits: Default::default(),
        }
    }

    fn changed() -> BTreeSet<PathBuf> {
        BTreeSet::from([PathBuf::from("src/A.java"), PathBuf::from("b.sh")])
    }

    #[tokio::test]
    async fn test_nothing_changed_is_clean() {
        let vcs = fake();
        let ctx = context("master", true, false, Some("t0ken-value"));
        let settlement = settle(&ctx, &vcs, &BTreeSet::new()).await.unwrap();
        assert_eq!(settlement, Settlement::Clean);
        assert!(vcs.commits.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_trunk_under_ci_fails_with_diff() {
        let vcs = fake();
        let ctx = context("master", true, false, Some("t0ken-value"));
        let err = settle(&ctx, &vcs, &changed()).await.unwrap_err();
        match err.downcast_ref::<BuildError>() {
            Some(BuildError::TrunkDirty { file, diff, .. }) => {
                assert_eq!(file, Path::new("b.sh"));
                assert!(diff.contains("+corrected"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(vcs.commits.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_trunk_while_testing_pushes() {
        let vcs = fake();
        let ctx = context("master", true, true, Some("t0ken-value"));
        assert_eq!(
            settle(&ctx, &vcs, &changed()).await.unwrap(),
            Settlement::Pushed
        );
        assert_eq!(
            vcs.commits.lock().unwrap().as_slice(),
            [CORRECTION_COMMIT_MESSAGE.to_string()]
        );
    }

    #[tokio::test]
    async fn test_branch_under_ci_pushes() {
        let vcs = fake();
        let ctx = context("feature/x", true, false, Some("t0ken-value"));
        assert_eq!(
            settle(&ctx, &vcs, &changed()).await.unwrap(),
            Settlement::Pushed
        );
    }

    #[tokio::test]
    async fn test_without_token_changes_are_left() {
        let vcs = fake();
        let ctx = context("feature/x", true, false, None);
        assert_eq!(settle(&ctx, &vcs, &changed()).await.unwrap(), Settlement::Left);
        assert!(vcs.commits.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_local_build_on_trunk_leaves_changes() {
        let vcs = fake();
        let ctx = context("master", false, false, None);
        assert_eq!(settle(&ctx, &vcs, &changed()).await.unwrap(), Settlement::Left);
    }
}
