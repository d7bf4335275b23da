use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use branchbuild_core::ResolveReport;
use branchbuild_triggers::{DependencyTriggerManager, GithubDispatcher, is_active};
use branchbuild_utils::repo_name_from_url;
use clap::Args;
use tracing::{info, warn};

use crate::CommandContext;

#[derive(Args, Debug)]
#[command(about = "Record the consumed packages and re-run the builds of dependent repositories")]
pub struct TriggersArgs {
    /// Report written by `resolve`
    report: PathBuf,
}

/// Save the used packages of this repository, then dispatch the dependents of the published ones
///
/// # Errors
/// Returns error if the report cannot be read or the records cannot be written or pushed.
pub async fn handle_triggers(args: &TriggersArgs) -> Result<()> {
    let ctx = CommandContext::new().await?;
    let content = tokio::fs::read_to_string(&args.report)
        .await
        .context(format!("Failed to read report {}", args.report.display()))?;
    let report: ResolveReport = serde_json::from_str(&content)
        .context(format!("Invalid report in {}", args.report.display()))?;

    if !is_active(&ctx.build) {
        println!(
            "Dependency triggers are only active for branch builds under CI or testing (branch {})",
            ctx.build.branch.branch_name
        );
        return Ok(());
    }
    let token = ctx.build.environment.token.clone().unwrap_or_default();
    if token.is_empty() {
        warn!("no token, dispatches will be refused");
    }
    let dispatcher = GithubDispatcher::new(&ctx.build.config.github_owner, &token)?;
    let manager = DependencyTriggerManager::open(&ctx.build, Arc::new(dispatcher)).await;

    match ctx.vcs.origin_url().await {
        Ok(url) => {
            let repo = repo_name_from_url(&url);
            let pushed = manager.save(&repo, &report.used_packages).await?;
            info!(repo = %repo, pushed, "dependencies saved");
        }
        Err(e) => info!("dependencies not saved, no origin to name this repository: {e:#}"),
    }
    let dispatched = manager.trigger(&report.published_packages).await?;
    println!("Triggered {dispatched} dependent workflow(s)");
    Ok(())
}
